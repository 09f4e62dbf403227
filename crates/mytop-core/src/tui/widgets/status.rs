//! Server status panel and rate graphs.

use ratatui::text::{Line, Span};

use crate::fmt::{format_count, format_picos, format_rate, format_uptime};
use crate::models::{RateFrame, Sample};
use crate::tui::screen::{BarValue, Panel};
use crate::tui::style::{Styles, Theme};

fn field(label: &'static str, value: String) -> [Span<'static>; 2] {
    [Span::styled(label, Styles::label()), Span::raw(value)]
}

/// Gauges of the latest sample; rates once a baseline exists.
pub fn status(sample: &Sample, rates: Option<&RateFrame>) -> Panel {
    let status = &sample.status;
    let qps = rates.map_or_else(|| "--".to_string(), |r| format_rate(r.queries));
    let longest = sample
        .sessions
        .iter()
        .map(|s| s.sort_key)
        .max()
        .unwrap_or(0);

    let mut lines = vec![
        Line::from_iter(
            field("Uptime: ", format_uptime(status.uptime_secs))
                .into_iter()
                .chain(field("   Sampled: ", sample.collected_at.format("%H:%M:%S").to_string())),
        ),
        Line::from_iter(
            field("QPS: ", qps)
                .into_iter()
                .chain(field("   Queries: ", format_count(status.counters.queries))),
        ),
        Line::from_iter(
            field("Threads: ", format!("{} connected", status.threads_connected))
                .into_iter()
                .chain([Span::raw(format!(", {} running", status.threads_running))]),
        ),
        Line::from_iter(field("Slow queries: ", format_count(status.slow_queries))),
        Line::from_iter(field("Longest statement: ", format_picos(longest))),
    ];
    if let Some(r) = rates {
        let mix = r
            .statement_mix()
            .iter()
            .map(|(name, v)| format!("{name} {}", format_rate(*v)))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(Line::from_iter(field("Per second: ", mix)));
    }
    Panel::Text(lines)
}

/// Sel/Ins/Upd/Del bars, rounded to whole statements per second.
pub fn rate_bars(rates: &RateFrame) -> Panel {
    let colors = [
        Theme::SELECT_BAR,
        Theme::INSERT_BAR,
        Theme::UPDATE_BAR,
        Theme::DELETE_BAR,
    ];
    Panel::Bars(
        rates
            .statement_mix()
            .into_iter()
            .zip(colors)
            .map(|((label, v), color)| BarValue {
                label,
                value: v.round() as u64,
                color,
            })
            .collect(),
    )
}

/// Sparkline point for one frame.
pub fn qps_point(rates: &RateFrame) -> u64 {
    rates.queries.round() as u64
}
