//! Static key reference shown full-screen with `?`.

use ratatui::text::{Line, Span};

use crate::tui::screen::Panel;
use crate::tui::style::Styles;

pub const TITLE: &str = "Help (<-- <Backspace> to return)";

const KEYS: &[(&str, &str)] = &[
    ("?", "this help"),
    ("Esc, Ctrl-C", "quit"),
    ("Backspace", "back to the process list"),
    ("Space", "refresh now / change EXPLAIN format"),
    ("d, D", "thread detail for a thread id"),
    ("e", "EXPLAIN the statement of a thread id"),
    ("a", "EXPLAIN ANALYZE, aborted after the fetch timeout"),
    ("A", "EXPLAIN ANALYZE without timeout"),
    ("l, L", "data locks and lock waits of a thread id"),
    ("k, K", "kill the connection of a thread id"),
    ("m, M", "memory usage"),
    ("r, R", "replication status"),
    ("i, I", "InnoDB engine status"),
    ("E", "server error log"),
    ("Up/Down, PgUp/PgDn", "scroll"),
];

const COLORS: &[(&str, &str)] = &[
    ("red", "statement running for more than 60s"),
    ("orange", "more than 30s"),
    ("green", "more than 10s"),
    ("cyan", "more than 5s"),
];

pub fn help() -> Panel {
    let mut lines = vec![Line::styled("Keys:", Styles::label()), Line::from("")];
    lines.extend(KEYS.iter().map(|(key, what)| {
        Line::from(vec![Span::styled(format!("  {key:<20}"), Styles::label()), Span::raw(*what)])
    }));
    lines.push(Line::from(""));
    lines.push(Line::styled("Row colors:", Styles::label()));
    lines.extend(
        COLORS
            .iter()
            .map(|(color, what)| Line::from(format!("  {color:<20}{what}"))),
    );
    lines.push(Line::from(""));
    lines.push(Line::styled(
        "Thread ids are performance_schema THREAD_ID values (column Thd).",
        Styles::dim(),
    ));
    Panel::Text(lines)
}
