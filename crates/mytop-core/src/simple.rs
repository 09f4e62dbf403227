//! Plain-text processlist: one fetch, printed once.
//!
//! The same line layout is used by the live main view.

use std::io::Write;

use crate::error::ConsoleError;
use crate::fmt::{cell_left, cell_right};
use crate::models::SessionRow;
use crate::source::DataSource;

/// Column titles of the session list.
pub const HEADERS: [&str; 10] = [
    "Cmd",
    "Thd",
    "Conn",
    "Pid",
    "State",
    "User",
    "Db",
    "Time",
    "Lock Time",
    "Query",
];

const WIDTHS: [usize; 9] = [7, 5, 5, 7, 25, 20, 12, 10, 10];

fn layout(cells: [&str; 10]) -> String {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(WIDTHS).enumerate() {
        // Latency columns are right-aligned.
        let text = if i >= 7 {
            cell_right(cell, width)
        } else {
            cell_left(cell, width)
        };
        line.push_str(&text);
        line.push(' ');
    }
    line.push_str(cells[9]);
    line
}

pub fn header_line() -> String {
    layout(HEADERS)
}

pub fn session_line(row: &SessionRow) -> String {
    layout([
        &row.command,
        &row.thread_id,
        &row.conn_id,
        &row.pid,
        &row.state,
        &row.user,
        &row.db,
        &row.statement_latency,
        &row.lock_latency,
        &row.statement,
    ])
}

/// Fetches the session list once and writes it to `out`.
pub fn print_processlist<S, W>(source: &S, out: &mut W) -> Result<usize, ConsoleError>
where
    S: DataSource + ?Sized,
    W: Write,
{
    let rows = SessionRow::from_table(&source.fetch_session_list()?);
    writeln!(out, "{}", header_line())?;
    for row in &rows {
        writeln!(out, "{}", session_line(row))?;
    }
    out.flush()?;
    Ok(rows.len())
}
