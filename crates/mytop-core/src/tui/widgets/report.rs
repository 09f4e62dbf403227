//! Drill-down content: tables, key/value records, raw text and plans.

use ratatui::text::Line;

use crate::fmt::chunk;
use crate::models::{Explain, Report, Table};
use crate::tui::screen::Panel;
use crate::tui::style::Styles;

/// Widest a table column is allowed to grow.
const MAX_CELL: usize = 60;

/// Title of the explain views.
pub const EXPLAIN_TITLE: &str =
    "EXPLAIN (<-- <Backspace> to return  -  <Space> to change EXPLAIN FORMAT)";

fn columnar(table: &Table, lines: &mut Vec<Line<'static>>) {
    // Single text column (tree/json plans, engine output): print as is.
    if table.columns.len() == 1 {
        lines.extend(
            table
                .rows
                .iter()
                .flat_map(|row| row.iter().flat_map(|cell| cell.lines()))
                .map(|l| Line::from(l.to_string())),
        );
        return;
    }

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            table
                .rows
                .iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain([name.chars().count()])
                .max()
                .unwrap_or(0)
                .min(MAX_CELL)
        })
        .collect();
    let render = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{:<w$}", chunk(c, w)))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };
    lines.push(Line::styled(render(table.columns.as_slice()), Styles::table_header()));
    lines.extend(table.rows.iter().map(|r| Line::from(render(r.as_slice()))));
}

fn table_lines(table: &Table, lines: &mut Vec<Line<'static>>) {
    if table.is_empty() {
        lines.push(Line::styled("(no rows)", Styles::dim()));
    } else {
        columnar(table, lines);
    }
}

/// Rows as columns with a header line.
pub fn table(table: &Table) -> Panel {
    let mut lines = Vec::new();
    table_lines(table, &mut lines);
    Panel::Text(lines)
}

/// One `column: value` line per field, records separated by a rule.
pub fn vertical(table: &Table) -> Panel {
    let width = table.columns.iter().map(|c| c.chars().count()).max().unwrap_or(0);
    let mut lines = Vec::new();
    for (n, row) in table.rows.iter().enumerate() {
        lines.push(Line::styled(
            format!("*************************** {}. row ***************************", n + 1),
            Styles::dim(),
        ));
        for (name, value) in table.columns.iter().zip(row) {
            lines.push(Line::from(format!("{name:>width$}: {value}")));
        }
    }
    if lines.is_empty() {
        lines.push(Line::styled("(no rows)", Styles::dim()));
    }
    Panel::Text(lines)
}

pub fn report(report: &Report) -> Panel {
    let mut lines = Vec::new();
    for section in &report.sections {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::styled(section.title.clone(), Styles::label()));
        table_lines(&section.table, &mut lines);
    }
    Panel::Text(lines)
}

pub fn text(body: &str) -> Panel {
    Panel::plain(body)
}

/// Statement, schema and plan.
pub fn explain(explain: &Explain) -> Panel {
    let mut lines = vec![
        Line::styled(
            format!("EXPLAIN {}", explain.format.clause()).trim_end().to_string(),
            Styles::label(),
        ),
        Line::from(format!(
            "Schema: {}",
            explain.schema.as_deref().unwrap_or("(none)")
        )),
    ];
    lines.extend(explain.statement.lines().map(|l| Line::from(l.to_string())));
    lines.push(Line::from(""));
    table_lines(&explain.plan, &mut lines);
    Panel::Text(lines)
}
