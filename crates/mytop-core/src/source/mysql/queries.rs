//! SQL for the performance_schema and sys views the console reads.

use crate::models::{ExplainFormat, ServerStatus};

/// Active sessions, longest running statement first.
///
/// Columns: command, thd_id, conn_id, pid, state, user, db,
/// current_statement, statement_latency, lock_latency, sort_time.
pub(super) const SESSION_LIST: &str = r#"
    SELECT pps.PROCESSLIST_COMMAND AS command,
           pps.THREAD_ID AS thd_id,
           pps.PROCESSLIST_ID AS conn_id,
           conattr_pid.ATTR_VALUE AS pid,
           pps.PROCESSLIST_STATE AS state,
           IF(pps.NAME IN ('thread/sql/one_connection', 'thread/thread_pool/tp_one_connection'),
              CONCAT(pps.PROCESSLIST_USER, '@', pps.PROCESSLIST_HOST),
              REPLACE(pps.NAME, 'thread/', '')) AS user,
           pps.PROCESSLIST_DB AS db,
           sys.format_statement(pps.PROCESSLIST_INFO) AS current_statement,
           IF(ISNULL(esc.END_EVENT_ID), format_pico_time(esc.TIMER_WAIT), NULL) AS statement_latency,
           format_pico_time(esc.LOCK_TIME) AS lock_latency,
           IF(ISNULL(esc.END_EVENT_ID), esc.TIMER_WAIT, 0) AS sort_time
    FROM performance_schema.threads pps
    LEFT JOIN performance_schema.events_statements_current esc
           ON pps.THREAD_ID = esc.THREAD_ID
    LEFT JOIN performance_schema.session_connect_attrs conattr_pid
           ON conattr_pid.PROCESSLIST_ID = pps.PROCESSLIST_ID
          AND conattr_pid.ATTR_NAME = '_pid'
    WHERE pps.PROCESSLIST_ID IS NOT NULL
      AND pps.PROCESSLIST_COMMAND <> 'Daemon'
    ORDER BY sort_time DESC
"#;

pub(super) const SERVER_INFO: &str = "SELECT @@version_comment, @@version, @@hostname, @@port";

/// One `sys.processlist` row for a performance_schema thread id.
pub(super) const SESSION_DETAIL: &str = "SELECT * FROM sys.processlist WHERE thd_id = ?";

pub(super) const DATA_LOCKS: &str = r#"
    SELECT OBJECT_SCHEMA, OBJECT_NAME, INDEX_NAME, LOCK_TYPE, LOCK_MODE, LOCK_STATUS, LOCK_DATA
    FROM performance_schema.data_locks
    WHERE THREAD_ID = ?
    ORDER BY OBJECT_SCHEMA, OBJECT_NAME
"#;

/// Lock waits where the thread is either side. Binds the thread id twice.
pub(super) const LOCK_WAITS: &str = r#"
    SELECT wait_started, wait_age, locked_table, locked_index, locked_type,
           waiting_pid, waiting_query, blocking_pid, blocking_query
    FROM sys.innodb_lock_waits
    WHERE waiting_pid = (SELECT PROCESSLIST_ID FROM performance_schema.threads WHERE THREAD_ID = ?)
       OR blocking_pid = (SELECT PROCESSLIST_ID FROM performance_schema.threads WHERE THREAD_ID = ?)
"#;

/// Statement text and default schema of the thread's current statement.
pub(super) const CURRENT_STATEMENT: &str = r#"
    SELECT SQL_TEXT, CURRENT_SCHEMA
    FROM performance_schema.events_statements_current
    WHERE THREAD_ID = ?
"#;

pub(super) const PROCESSLIST_ID: &str =
    "SELECT PROCESSLIST_ID FROM performance_schema.threads WHERE THREAD_ID = ?";

pub(super) const ENGINE_STATUS: &str = "SHOW ENGINE INNODB STATUS";

pub(super) const REPLICA_STATUS: &str = "SHOW REPLICA STATUS";

/// Pre-8.0.22 spelling.
pub(super) const REPLICA_STATUS_LEGACY: &str = "SHOW SLAVE STATUS";

pub(super) const ERROR_LOG: &str = r#"
    SELECT LOGGED, PRIO, ERROR_CODE, SUBSYSTEM, DATA
    FROM performance_schema.error_log
    ORDER BY LOGGED DESC
    LIMIT 100
"#;

pub(super) const MEMORY_TOTAL: &str = "SELECT total_allocated FROM sys.memory_global_total";

pub(super) const MEMORY_BY_EVENT: &str = r#"
    SELECT event_name, current_count, current_alloc, current_avg_alloc, high_alloc
    FROM sys.memory_global_by_current_bytes
    LIMIT 20
"#;

pub(super) const MEMORY_BY_THREAD: &str = r#"
    SELECT thread_id, user, current_count_used, current_allocated, total_allocated
    FROM sys.memory_by_thread_by_current_bytes
    LIMIT 10
"#;

/// Builds the `global_status` query for the variables the sampler reads.
pub(super) fn build_server_status_query() -> String {
    let names = ServerStatus::VARIABLES
        .iter()
        .map(|v| format!("'{v}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT VARIABLE_NAME, VARIABLE_VALUE FROM performance_schema.global_status \
         WHERE VARIABLE_NAME IN ({names})"
    )
}

/// Builds `EXPLAIN [clause] <statement>`.
pub(super) fn build_explain(format: ExplainFormat, statement: &str) -> String {
    let statement = statement.trim().trim_end_matches(';').trim_end();
    match format.clause() {
        "" => format!("EXPLAIN {statement}"),
        clause => format!("EXPLAIN {clause} {statement}"),
    }
}

/// `KILL` does not accept placeholders; the id comes from the server.
pub(super) fn build_kill(processlist_id: u64) -> String {
    format!("KILL {processlist_id}")
}

/// Quotes a schema name for `USE`.
pub(super) fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
