//! Retained screen model and the sink that draws it.
//!
//! The controller writes panels into named regions; a [`RenderSink`] turns
//! the whole model into a frame. Writes to regions missing from the current
//! layout are ignored.

use std::collections::{HashMap, VecDeque};
use std::io;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Sparkline};

use super::layout::{LayoutKind, Region};
use super::style::{Styles, Theme};

/// Draws a [`Screen`] somewhere.
pub trait RenderSink {
    fn draw(&mut self, screen: &Screen) -> io::Result<()>;
}

/// One bar of the rate chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarValue {
    pub label: &'static str,
    pub value: u64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Text(Vec<Line<'static>>),
    Bars(Vec<BarValue>),
    Input { label: String, value: String },
}

impl Panel {
    pub fn plain(text: impl Into<String>) -> Self {
        Panel::Text(text.into().lines().map(|l| Line::from(l.to_string())).collect())
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        Panel::Text(vec![Line::styled(text.into(), style)])
    }
}

#[derive(Debug, Clone)]
pub struct Screen {
    layout: LayoutKind,
    panels: HashMap<Region, Panel>,
    titles: HashMap<Region, String>,
    focus: Region,
    spark: VecDeque<u64>,
    spark_capacity: usize,
    scroll: u16,
}

impl Screen {
    pub fn new(spark_capacity: usize) -> Self {
        Self {
            layout: LayoutKind::Dashboard,
            panels: HashMap::new(),
            titles: HashMap::new(),
            focus: Region::Main,
            spark: VecDeque::with_capacity(spark_capacity),
            spark_capacity,
            scroll: 0,
        }
    }

    pub fn layout(&self) -> LayoutKind {
        self.layout
    }

    /// Switches layout. Every region but the header is emptied and the
    /// main panel scroll resets; the QPS history survives.
    pub fn set_layout(&mut self, layout: LayoutKind) {
        self.layout = layout;
        self.panels.retain(|region, _| *region == Region::Header);
        self.titles.clear();
        self.focus = Region::Main;
        self.scroll = 0;
    }

    /// Stores `panel` in `region`; returns false if the layout lacks it.
    pub fn write(&mut self, region: Region, panel: Panel) -> bool {
        if !self.layout.contains(region) {
            return false;
        }
        self.panels.insert(region, panel);
        true
    }

    pub fn clear(&mut self, region: Region) {
        self.panels.remove(&region);
    }

    pub fn set_title(&mut self, region: Region, title: impl Into<String>) {
        self.titles.insert(region, title.into());
    }

    pub fn title(&self, region: Region) -> Option<&str> {
        self.titles.get(&region).map(String::as_str)
    }

    pub fn focus(&mut self, region: Region) {
        self.focus = region;
    }

    pub fn focused(&self) -> Region {
        self.focus
    }

    pub fn push_spark(&mut self, qps: u64) {
        if self.spark_capacity == 0 {
            return;
        }
        if self.spark.len() == self.spark_capacity {
            self.spark.pop_front();
        }
        self.spark.push_back(qps);
    }

    pub fn spark(&self) -> impl Iterator<Item = u64> + '_ {
        self.spark.iter().copied()
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let max = match self.panels.get(&Region::Main) {
            Some(Panel::Text(lines)) => lines.len().saturating_sub(1),
            _ => 0,
        };
        let next = (self.scroll as i64 + delta as i64).clamp(0, max as i64);
        self.scroll = u16::try_from(next).unwrap_or(u16::MAX);
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Plain text of a region, lines joined with `\n`.
    pub fn text(&self, region: Region) -> String {
        match self.panels.get(&region) {
            Some(Panel::Text(lines)) => lines
                .iter()
                .map(|line| {
                    line.spans
                        .iter()
                        .map(|s| s.content.as_ref())
                        .collect::<String>()
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Some(Panel::Input { label, value }) => format!("{label}{value}"),
            Some(Panel::Bars(bars)) => bars
                .iter()
                .map(|b| format!("{} {}", b.label, b.value))
                .collect::<Vec<_>>()
                .join(" "),
            None => String::new(),
        }
    }

    /// Renders every region of the current layout.
    pub fn render(&self, frame: &mut Frame) {
        for (region, area) in self.layout.resolve(frame.area()) {
            match region {
                Region::Header => self.render_header(frame, area),
                Region::Bottom => self.render_bottom(frame, area),
                Region::RateBars => self.render_bars(frame, area),
                Region::QpsTrend => self.render_spark(frame, area),
                Region::Status | Region::Main => self.render_text(frame, region, area),
            }
        }
    }

    fn block(&self, region: Region) -> Block<'static> {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Styles::border(self.focus == region));
        if let Some(title) = self.titles.get(&region) {
            block = block.title(format!(" {title} "));
        }
        block
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let lines = match self.panels.get(&Region::Header) {
            Some(Panel::Text(lines)) => lines.clone(),
            _ => Vec::new(),
        };
        frame.render_widget(Paragraph::new(lines).style(Styles::header()), area);
    }

    fn render_bottom(&self, frame: &mut Frame, area: Rect) {
        let line = match self.panels.get(&Region::Bottom) {
            Some(Panel::Input { label, value }) => Line::from(vec![
                Span::styled(label.clone(), Styles::label()),
                Span::raw(value.clone()),
                Span::styled("_", Styles::dim()),
            ]),
            Some(Panel::Text(lines)) => lines.first().cloned().unwrap_or_default(),
            _ => Line::default(),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_text(&self, frame: &mut Frame, region: Region, area: Rect) {
        let lines = match self.panels.get(&region) {
            Some(Panel::Text(lines)) => lines.clone(),
            _ => Vec::new(),
        };
        let scroll = if region == Region::Main { self.scroll } else { 0 };
        let paragraph = Paragraph::new(lines)
            .block(self.block(region))
            .style(Styles::default())
            .scroll((scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn render_bars(&self, frame: &mut Frame, area: Rect) {
        let bars: Vec<Bar> = match self.panels.get(&Region::RateBars) {
            Some(Panel::Bars(values)) => values
                .iter()
                .map(|b| {
                    Bar::default()
                        .label(Line::from(b.label))
                        .value(b.value)
                        .style(Style::default().fg(b.color))
                })
                .collect(),
            _ => Vec::new(),
        };
        let chart = BarChart::default()
            .block(self.block(Region::RateBars))
            .data(BarGroup::default().bars(&bars))
            .bar_width(3)
            .bar_gap(1)
            .value_style(Style::default().fg(Theme::FG));
        frame.render_widget(chart, area);
    }

    fn render_spark(&self, frame: &mut Frame, area: Rect) {
        let data: Vec<u64> = self.spark().collect();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Styles::border(false))
            .title(" QPS ");
        let inner = block.inner(area);
        frame.render_widget(block, area);
        // Newest points on the right when history is wider than the panel.
        let visible = data.len().saturating_sub(inner.width as usize);
        let sparkline = Sparkline::default()
            .data(&data[visible..])
            .style(Style::default().fg(Theme::SPARKLINE));
        frame.render_widget(sparkline, inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn writes_outside_layout_are_ignored() {
        let mut screen = Screen::new(4);
        screen.set_layout(LayoutKind::FullScreen);
        assert!(!screen.write(Region::RateBars, Panel::Bars(Vec::new())));
        assert!(screen.write(Region::Main, Panel::plain("help")));
        assert_eq!(screen.text(Region::Main), "help");
    }

    #[test]
    fn layout_change_clears_content_but_keeps_header_and_history() {
        let mut screen = Screen::new(4);
        screen.write(Region::Header, Panel::plain("mytop"));
        screen.write(Region::Main, Panel::plain("a\nb\nc"));
        screen.write(Region::Bottom, Panel::plain("oops"));
        screen.set_title(Region::Main, "Processlist");
        screen.push_spark(7);
        screen.scroll_by(2);
        assert_eq!(screen.scroll(), 2);

        screen.set_layout(LayoutKind::Drilldown);
        assert_eq!(screen.text(Region::Header), "mytop");
        assert_eq!(screen.text(Region::Main), "");
        assert_eq!(screen.text(Region::Bottom), "");
        assert_eq!(screen.title(Region::Main), None);
        assert_eq!(screen.scroll(), 0);
        assert_eq!(screen.spark().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn spark_history_is_bounded() {
        let mut screen = Screen::new(3);
        for v in 1..=5 {
            screen.push_spark(v);
        }
        assert_eq!(screen.spark().collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let mut screen = Screen::new(1);
        screen.write(Region::Main, Panel::plain("1\n2\n3"));
        screen.scroll_by(10);
        assert_eq!(screen.scroll(), 2);
        screen.scroll_by(-10);
        assert_eq!(screen.scroll(), 0);
    }

    #[test]
    fn renders_every_dashboard_region() {
        let mut screen = Screen::new(8);
        screen.write(Region::Header, Panel::plain("mytop 0.1.0"));
        screen.write(Region::Main, Panel::plain("Query   42"));
        screen.set_title(Region::Main, "Processlist");
        screen.write(
            Region::RateBars,
            Panel::Bars(vec![BarValue {
                label: "Sel",
                value: 5,
                color: Color::Green,
            }]),
        );
        screen.write(
            Region::Bottom,
            Panel::Input {
                label: "Thread Id: ".into(),
                value: "42".into(),
            },
        );
        screen.push_spark(3);

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| screen.render(f)).unwrap();
        let buffer = terminal.backend().buffer();
        let row = |y: u16| -> String {
            (0..buffer.area.width)
                .map(|x| buffer[(x, y)].symbol())
                .collect()
        };
        assert!(row(0).starts_with("mytop 0.1.0"));
        assert!(row(9).contains("Processlist"));
        assert!(row(10).contains("Query   42"));
        assert!(row(23).starts_with("Thread Id: 42_"));
    }
}
