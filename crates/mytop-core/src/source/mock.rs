//! Scripted in-memory data source for testing the sampler and the console
//! without a server.
//!
//! Every call is recorded. Failures, delays and a cancellation trigger can
//! be attached per call kind.

use std::collections::{HashMap, VecDeque};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use super::DataSource;
use crate::cancel::CancelToken;
use crate::error::SourceError;
use crate::models::{
    Counters, Explain, ExplainFormat, Report, ServerInfo, ServerStatus, Table,
};

/// One recorded data source call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SessionList,
    ServerStatus,
    SessionDetail(String),
    Locks(String),
    EngineStatus,
    MemoryStatus,
    Replication,
    ErrorLog,
    Explain(String, ExplainFormat),
    Kill(String),
    ServerInfo,
}

impl Call {
    /// Stable name used to attach failures and delays.
    pub fn kind(&self) -> &'static str {
        match self {
            Call::SessionList => "session_list",
            Call::ServerStatus => "server_status",
            Call::SessionDetail(_) => "session_detail",
            Call::Locks(_) => "locks",
            Call::EngineStatus => "engine_status",
            Call::MemoryStatus => "memory_status",
            Call::Replication => "replication",
            Call::ErrorLog => "error_log",
            Call::Explain(..) => "explain",
            Call::Kill(_) => "kill",
            Call::ServerInfo => "server_info",
        }
    }

    /// Thread id argument, for drill-down calls.
    pub fn thread_id(&self) -> Option<&str> {
        match self {
            Call::SessionDetail(id) | Call::Locks(id) | Call::Explain(id, _) | Call::Kill(id) => {
                Some(id.as_str())
            }
            _ => None,
        }
    }
}

#[derive(Default)]
struct Script {
    calls: Vec<Call>,
    sessions: Table,
    statuses: VecDeque<ServerStatus>,
    last_status: ServerStatus,
    info: ServerInfo,
    failures: HashMap<&'static str, SourceError>,
    delays: HashMap<&'static str, Duration>,
    cancel_on: Option<(&'static str, CancelToken)>,
}

/// Data source answering from a script.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<Script>,
}

/// Column names of the session list, in query order.
pub const SESSION_COLUMNS: [&str; 11] = [
    "command",
    "thd_id",
    "conn_id",
    "pid",
    "state",
    "user",
    "db",
    "current_statement",
    "statement_latency",
    "lock_latency",
    "sort_time",
];

impl ScriptedSource {
    /// Creates an empty source: no sessions, zeroed counters, MySQL 8 identity.
    pub fn new() -> Self {
        let source = Self::default();
        source.script.lock().info = ServerInfo {
            brand: "MySQL Community Server - GPL".into(),
            version: "8.0.36".into(),
            hostname: "db1".into(),
            port: "3306".into(),
        };
        source.script.lock().sessions = Table::new(SESSION_COLUMNS);
        source
    }

    /// A busy server with three sessions, one of them running for 42s.
    /// Its counters stay constant unless statuses are queued.
    pub fn typical() -> Self {
        let source = Self::new();
        source.set_sessions(
            Table::new(SESSION_COLUMNS)
                .with_row([
                    "Query",
                    "42",
                    "17",
                    "3101",
                    "executing",
                    "app@10.0.0.5",
                    "shop",
                    "SELECT * FROM orders WHERE status = 'open'",
                    "42.00 s",
                    "1.20 ms",
                    "42000000000000",
                ])
                .with_row([
                    "Query",
                    "57",
                    "31",
                    "NULL",
                    "updating",
                    "batch@10.0.0.9",
                    "shop",
                    "UPDATE stock SET qty = qty - 1",
                    "6.10 s",
                    "5.00 s",
                    "6100000000000",
                ])
                .with_row([
                    "Sleep", "63", "38", "NULL", "NULL", "root@localhost", "NULL", "NULL",
                    "NULL", "NULL", "0",
                ]),
        );
        source.script.lock().last_status = ServerStatus {
            counters: Counters {
                selects: 1_000,
                inserts: 100,
                updates: 50,
                deletes: 5,
                queries: 2_000,
            },
            uptime_secs: 86_400,
            threads_connected: 3,
            threads_running: 2,
            slow_queries: 1,
        };
        source
    }

    pub fn set_sessions(&self, table: Table) {
        self.script.lock().sessions = table;
    }

    pub fn set_server_info(&self, info: ServerInfo) {
        self.script.lock().info = info;
    }

    /// Queues a status for the next `fetch_server_status`. When the queue is
    /// empty the last returned status repeats.
    pub fn push_status(&self, status: ServerStatus) {
        self.script.lock().statuses.push_back(status);
    }

    /// Makes every call of `kind` fail with `err` until cleared.
    pub fn fail(&self, kind: &'static str, err: SourceError) {
        self.script.lock().failures.insert(kind, err);
    }

    pub fn clear_failure(&self, kind: &'static str) {
        self.script.lock().failures.remove(kind);
    }

    /// Makes every call of `kind` sleep before answering.
    pub fn delay(&self, kind: &'static str, delay: Duration) {
        self.script.lock().delays.insert(kind, delay);
    }

    /// Cancels `token` from inside the next call of `kind`.
    pub fn cancel_on(&self, kind: &'static str, token: CancelToken) {
        self.script.lock().cancel_on = Some((kind, token));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().calls.clone()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.script
            .lock()
            .calls
            .iter()
            .filter(|c| c.kind() == kind)
            .count()
    }

    /// Calls that carried a thread id.
    pub fn drilldown_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.thread_id().is_some())
            .collect()
    }

    fn record(&self, call: Call) -> Result<(), SourceError> {
        let kind = call.kind();
        let (delay, failure, trigger) = {
            let mut script = self.script.lock();
            script.calls.push(call);
            let fires = matches!(&script.cancel_on, Some((k, _)) if *k == kind);
            let trigger = if fires {
                script.cancel_on.take().map(|(_, t)| t)
            } else {
                None
            };
            (
                script.delays.get(kind).copied(),
                script.failures.get(kind).cloned(),
                trigger,
            )
        };
        if let Some(token) = trigger {
            token.cancel();
        }
        if let Some(d) = delay {
            thread::sleep(d);
        }
        failure.map_or(Ok(()), Err)
    }
}

impl DataSource for ScriptedSource {
    fn fetch_session_list(&self) -> Result<Table, SourceError> {
        self.record(Call::SessionList)?;
        Ok(self.script.lock().sessions.clone())
    }

    fn fetch_server_status(&self) -> Result<ServerStatus, SourceError> {
        self.record(Call::ServerStatus)?;
        let mut script = self.script.lock();
        if let Some(next) = script.statuses.pop_front() {
            script.last_status = next;
        }
        Ok(script.last_status)
    }

    fn fetch_session_detail(&self, thread_id: &str) -> Result<Table, SourceError> {
        self.record(Call::SessionDetail(thread_id.to_string()))?;
        Ok(Table::new(["thd_id", "conn_id", "user", "command", "state"])
            .with_row([thread_id, "17", "app@10.0.0.5", "Query", "executing"]))
    }

    fn fetch_locks(&self, thread_id: &str) -> Result<Report, SourceError> {
        self.record(Call::Locks(thread_id.to_string()))?;
        Ok(Report::default()
            .section(
                "Data locks",
                Table::new(["object_name", "lock_type", "lock_mode", "lock_status"])
                    .with_row(["orders", "RECORD", "X", "GRANTED"]),
            )
            .section(
                "Lock waits",
                Table::new(["waiting_pid", "blocking_pid", "wait_age"]),
            ))
    }

    fn fetch_engine_status(&self) -> Result<String, SourceError> {
        self.record(Call::EngineStatus)?;
        Ok("=====================================\nINNODB MONITOR OUTPUT\n".to_string())
    }

    fn fetch_memory_status(&self) -> Result<Report, SourceError> {
        self.record(Call::MemoryStatus)?;
        Ok(Report::default().section(
            "Total allocated",
            Table::new(["total_allocated"]).with_row(["1.21 GiB"]),
        ))
    }

    fn fetch_replication_status(&self) -> Result<Table, SourceError> {
        self.record(Call::Replication)?;
        Ok(Table::new(["Replica_IO_Running", "Replica_SQL_Running"]).with_row(["Yes", "Yes"]))
    }

    fn fetch_error_log(&self) -> Result<Table, SourceError> {
        self.record(Call::ErrorLog)?;
        Ok(Table::new(["LOGGED", "PRIO", "DATA"]).with_row([
            "2026-10-17 09:00:00",
            "System",
            "ready for connections",
        ]))
    }

    fn fetch_explain(
        &self,
        thread_id: &str,
        format: ExplainFormat,
    ) -> Result<Explain, SourceError> {
        self.record(Call::Explain(thread_id.to_string(), format))?;
        let plan = match format {
            ExplainFormat::Normal => Table::new(["id", "select_type", "table", "type", "rows"])
                .with_row(["1", "SIMPLE", "orders", "ALL", "1000"]),
            other => Table::new(["EXPLAIN"]).with_row([format!("-> {} plan", other.clause())]),
        };
        Ok(Explain {
            statement: "SELECT * FROM orders WHERE status = 'open'".into(),
            schema: Some("shop".into()),
            format,
            plan,
        })
    }

    fn kill_session(&self, thread_id: &str) -> Result<(), SourceError> {
        self.record(Call::Kill(thread_id.to_string()))
    }

    fn server_info(&self) -> Result<ServerInfo, SourceError> {
        self.record(Call::ServerInfo)?;
        Ok(self.script.lock().info.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_in_order() {
        let source = ScriptedSource::typical();
        source.fetch_session_list().unwrap();
        source.fetch_locks("42").unwrap();
        source.kill_session("7").unwrap();
        assert_eq!(
            source.calls(),
            vec![
                Call::SessionList,
                Call::Locks("42".into()),
                Call::Kill("7".into())
            ]
        );
        assert_eq!(source.drilldown_calls().len(), 2);
    }

    #[test]
    fn statuses_are_consumed_then_repeat() {
        let source = ScriptedSource::new();
        let mut s = ServerStatus::default();
        s.counters.queries = 10;
        source.push_status(s);
        s.counters.queries = 20;
        source.push_status(s);
        assert_eq!(source.fetch_server_status().unwrap().counters.queries, 10);
        assert_eq!(source.fetch_server_status().unwrap().counters.queries, 20);
        assert_eq!(source.fetch_server_status().unwrap().counters.queries, 20);
    }

    #[test]
    fn failures_apply_per_kind() {
        let source = ScriptedSource::typical();
        source.fail("locks", SourceError::Query("deadlock".into()));
        assert!(source.fetch_locks("1").is_err());
        assert!(source.fetch_session_list().is_ok());
        source.clear_failure("locks");
        assert!(source.fetch_locks("1").is_ok());
        assert_eq!(source.count("locks"), 2);
    }

    #[test]
    fn cancel_trigger_fires_once() {
        let source = ScriptedSource::typical();
        let token = CancelToken::new();
        source.cancel_on("session_list", token.clone());
        source.fetch_server_status().unwrap();
        assert!(!token.is_cancelled());
        source.fetch_session_list().unwrap();
        assert!(token.is_cancelled());
    }
}
