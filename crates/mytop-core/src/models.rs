//! Data models shared by the sampler, the data source and the views.

use std::time::Instant;

use chrono::{DateTime, Local};

/// Literal used for SQL NULL in decoded rows.
pub const NULL: &str = "NULL";

/// Column-oriented result of a query, every value decoded to text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<C: Into<String>>(columns: impl IntoIterator<Item = C>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builder-style row append, used by the mock source and tests.
    pub fn with_row<V: Into<String>>(mut self, row: impl IntoIterator<Item = V>) -> Self {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Value of `column` in row `row`, if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }
}

/// A titled table inside a multi-part report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub table: Table,
}

/// Multi-part drill-down result (locks, memory).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub sections: Vec<Section>,
}

impl Report {
    pub fn section(mut self, title: impl Into<String>, table: Table) -> Self {
        self.sections.push(Section {
            title: title.into(),
            table,
        });
        self
    }
}

/// Variant of `EXPLAIN` requested for a session's current statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExplainFormat {
    Normal,
    Tree,
    Json,
    /// `EXPLAIN ANALYZE` under the drill-down deadline.
    Analyze,
    /// `EXPLAIN ANALYZE` with no deadline.
    AnalyzeNoTimeout,
}

impl ExplainFormat {
    /// Text inserted between `EXPLAIN` and the statement.
    pub fn clause(self) -> &'static str {
        match self {
            ExplainFormat::Normal => "",
            ExplainFormat::Tree => "FORMAT=TREE",
            ExplainFormat::Json => "FORMAT=JSON",
            ExplainFormat::Analyze => "ANALYZE",
            ExplainFormat::AnalyzeNoTimeout => "ANALYZE /*NO_TIMEOUT*/",
        }
    }

    /// Whether the fetch runs under the drill-down deadline.
    pub fn is_bounded(self) -> bool {
        !matches!(self, ExplainFormat::AnalyzeNoTimeout)
    }

    /// Format shown after pressing space: normal → tree → json → normal.
    pub const fn cycle(self) -> ExplainFormat {
        match self {
            ExplainFormat::Normal => ExplainFormat::Tree,
            ExplainFormat::Tree => ExplainFormat::Json,
            _ => ExplainFormat::Normal,
        }
    }
}

/// Plan for the statement a session is currently running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explain {
    pub statement: String,
    pub schema: Option<String>,
    pub format: ExplainFormat,
    pub plan: Table,
}

/// Monotonic statement counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub selects: u64,
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    pub queries: u64,
}

/// Global status variables read on every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStatus {
    pub counters: Counters,
    pub uptime_secs: u64,
    pub threads_connected: u64,
    pub threads_running: u64,
    pub slow_queries: u64,
}

impl ServerStatus {
    /// Variable names read from `global_status`.
    pub const VARIABLES: [&'static str; 9] = [
        "Com_select",
        "Com_insert",
        "Com_update",
        "Com_delete",
        "Queries",
        "Uptime",
        "Threads_connected",
        "Threads_running",
        "Slow_queries",
    ];

    /// Records one `VARIABLE_NAME`/`VARIABLE_VALUE` pair. Unknown names and
    /// unparsable values are ignored.
    pub fn apply(&mut self, name: &str, value: &str) {
        let Ok(v) = value.trim().parse::<u64>() else {
            return;
        };
        match name.to_ascii_lowercase().as_str() {
            "com_select" => self.counters.selects = v,
            "com_insert" => self.counters.inserts = v,
            "com_update" => self.counters.updates = v,
            "com_delete" => self.counters.deletes = v,
            "queries" => self.counters.queries = v,
            "uptime" => self.uptime_secs = v,
            "threads_connected" => self.threads_connected = v,
            "threads_running" => self.threads_running = v,
            "slow_queries" => self.slow_queries = v,
            _ => {}
        }
    }

    /// Builds status from a two-column name/value table.
    pub fn from_table(table: &Table) -> Self {
        let mut status = ServerStatus::default();
        for row in &table.rows {
            if let [name, value, ..] = row.as_slice() {
                status.apply(name, value);
            }
        }
        status
    }
}

/// One row of the session list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRow {
    pub command: String,
    pub thread_id: String,
    pub conn_id: String,
    pub pid: String,
    pub state: String,
    pub user: String,
    pub db: String,
    pub statement: String,
    pub statement_latency: String,
    pub lock_latency: String,
    /// Running statement latency in picoseconds, 0 when idle.
    pub sort_key: u64,
}

impl SessionRow {
    /// Decodes a session list record in query column order:
    /// command, thd_id, conn_id, pid, state, user, db, current_statement,
    /// statement_latency, lock_latency, sort_time. Missing cells are empty.
    pub fn from_record(record: &[String]) -> Self {
        let cell = |i: usize| record.get(i).cloned().unwrap_or_default();
        Self {
            command: cell(0),
            thread_id: cell(1),
            conn_id: cell(2),
            pid: cell(3),
            state: cell(4),
            user: cell(5),
            db: cell(6),
            statement: cell(7),
            statement_latency: cell(8),
            lock_latency: cell(9),
            sort_key: record
                .get(10)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(0),
        }
    }

    /// Decodes all records, ordered by descending sort key (stable).
    pub fn from_table(table: &Table) -> Vec<SessionRow> {
        let mut rows: Vec<SessionRow> = table.rows.iter().map(|r| Self::from_record(r)).collect();
        rows.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
        rows
    }
}

/// Timestamped snapshot produced by one sampler tick.
#[derive(Debug, Clone)]
pub struct Sample {
    pub taken_at: Instant,
    pub collected_at: DateTime<Local>,
    pub status: ServerStatus,
    pub sessions: Vec<SessionRow>,
}

impl Sample {
    pub fn new(status: ServerStatus, sessions: Vec<SessionRow>) -> Self {
        Self {
            taken_at: Instant::now(),
            collected_at: Local::now(),
            status,
            sessions,
        }
    }
}

/// Per-second counter rates between two samples.
#[derive(Debug, Clone)]
pub struct RateFrame {
    pub elapsed_secs: f64,
    pub selects: f64,
    pub inserts: f64,
    pub updates: f64,
    pub deletes: f64,
    pub queries: f64,
    /// Baseline the rates were computed against.
    pub previous: Sample,
}

impl RateFrame {
    /// Statement mix in bar chart order.
    pub fn statement_mix(&self) -> [(&'static str, f64); 4] {
        [
            ("Sel", self.selects),
            ("Ins", self.inserts),
            ("Upd", self.updates),
            ("Del", self.deletes),
        ]
    }
}

/// Identity of the monitored server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInfo {
    pub brand: String,
    pub version: String,
    pub hostname: String,
    pub port: String,
}

impl ServerInfo {
    /// Only MySQL 8.x exposes the performance_schema tables the console reads.
    pub fn is_supported(&self) -> bool {
        self.version.starts_with('8')
    }
}
