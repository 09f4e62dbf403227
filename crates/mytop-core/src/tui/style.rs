//! Color scheme and styles.

use ratatui::style::{Color, Modifier, Style};

use crate::config::LatencyBand;

/// Console color palette.
pub struct Theme;

impl Theme {
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;
    pub const HEADER_BG: Color = Color::Blue;
    pub const HEADER_FG: Color = Color::White;
    pub const BORDER: Color = Color::Cyan;
    pub const ERROR: Color = Color::Red;
    pub const ORANGE: Color = Color::Indexed(172);
    pub const STEEL: Color = Color::Indexed(31);

    // Graphs
    pub const SELECT_BAR: Color = Color::Green;
    pub const INSERT_BAR: Color = Self::STEEL;
    pub const UPDATE_BAR: Color = Self::ORANGE;
    pub const DELETE_BAR: Color = Color::Red;
    pub const SPARKLINE: Color = Color::Blue;
}

/// Pre-defined styles.
pub struct Styles;

impl Styles {
    /// Default text style.
    pub fn default() -> Style {
        Style::default().fg(Theme::FG)
    }

    /// Header bar style.
    pub fn header() -> Style {
        Style::default()
            .fg(Theme::HEADER_FG)
            .bg(Theme::HEADER_BG)
            .add_modifier(Modifier::BOLD)
    }

    pub fn table_header() -> Style {
        Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD)
    }

    pub fn border(focused: bool) -> Style {
        if focused {
            Style::default().fg(Theme::BORDER)
        } else {
            Style::default().fg(Theme::FG_DIM)
        }
    }

    pub fn label() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn dim() -> Style {
        Style::default().fg(Theme::FG_DIM)
    }

    pub fn error() -> Style {
        Style::default().fg(Theme::ERROR).add_modifier(Modifier::BOLD)
    }

    /// Session row color by statement latency.
    pub fn latency(band: LatencyBand) -> Style {
        let fg = match band {
            LatencyBand::Critical => Color::Red,
            LatencyBand::Warning => Theme::ORANGE,
            LatencyBand::Notice => Color::Green,
            LatencyBand::Info => Color::Cyan,
            LatencyBand::Normal => Theme::FG,
        };
        Style::default().fg(fg)
    }
}
