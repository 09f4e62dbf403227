//! Session list for the main panel.

use ratatui::text::Line;

use crate::config::LatencyBands;
use crate::models::SessionRow;
use crate::simple::{header_line, session_line};
use crate::tui::screen::Panel;
use crate::tui::style::Styles;

/// Title of the main panel while the session list is shown.
pub const TITLE: &str = "Processlist (ESC to quit, ? to help)";

/// Placeholder until the first sample after (re)entering the list.
pub const PLEASE_WAIT: &str = "... please wait...";

/// Column header plus one line per session, coloured by statement latency.
pub fn processlist(rows: &[SessionRow], bands: &LatencyBands) -> Panel {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(Line::styled(header_line(), Styles::table_header()));
    lines.extend(rows.iter().map(|row| {
        Line::styled(
            session_line(row),
            Styles::latency(bands.classify(row.sort_key)),
        )
    }));
    Panel::Text(lines)
}
