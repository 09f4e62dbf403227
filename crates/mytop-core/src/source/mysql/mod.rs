//! MySQL 8 data source.
//!
//! Reads `performance_schema` and the `sys` schema through a small
//! connection pool. Its connections carry read/write timeouts so a fetch
//! abandoned by the console (deadline or cancel) still finishes.
//! `EXPLAIN ANALYZE` without deadline runs on a second, single-connection
//! pool with no read timeout.

mod queries;

use std::io;
use std::time::Duration;

use mysql::prelude::{Protocol, Queryable};
use mysql::{
    DriverError, Error as MysqlError, OptsBuilder, Pool, PoolConstraints, PoolOpts, PooledConn,
    QueryResult, Row, Value,
};
use tracing::{debug, info};

use super::DataSource;
use crate::error::SourceError;
use crate::models::{Explain, ExplainFormat, NULL, Report, ServerInfo, ServerStatus, Table};

/// Connection settings.
#[derive(Debug, Clone)]
pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Unix socket path; preferred over TCP when set.
    pub socket: Option<String>,
    pub database: Option<String>,
    /// Connect, read and write timeout of pooled connections. Unbounded
    /// `EXPLAIN ANALYZE` keeps the connect and write timeouts only.
    pub io_timeout: Duration,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3306,
            user: None,
            password: None,
            socket: None,
            database: None,
            io_timeout: crate::config::DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Live data source backed by a connection pool.
pub struct MysqlSource {
    pool: Pool,
    /// Lazily opened connection without read timeout.
    unbounded: Pool,
}

/// Driver options for `config`. `read_timeout: None` lets a statement run
/// as long as the server takes.
fn opts(config: &MysqlConfig, read_timeout: Option<Duration>, pool: PoolOpts) -> OptsBuilder {
    OptsBuilder::new()
        .ip_or_hostname(Some(config.host.clone()))
        .tcp_port(config.port)
        .socket(config.socket.clone())
        .user(config.user.clone())
        .pass(config.password.clone())
        .db_name(config.database.clone())
        .tcp_connect_timeout(Some(config.io_timeout))
        .read_timeout(read_timeout)
        .write_timeout(Some(config.io_timeout))
        .pool_opts(pool)
}

impl MysqlSource {
    /// Creates the pools and opens one connection to fail fast on bad
    /// credentials or an unreachable server.
    pub fn connect(config: &MysqlConfig) -> Result<Self, SourceError> {
        let bounded = PoolOpts::default().with_constraints(PoolConstraints::new_const::<1, 4>());
        let pool = Pool::new(opts(config, Some(config.io_timeout), bounded)).map_err(map_error)?;
        drop(pool.get_conn().map_err(map_error)?);

        let single = PoolOpts::default().with_constraints(PoolConstraints::new_const::<0, 1>());
        let unbounded = Pool::new(opts(config, None, single)).map_err(map_error)?;
        info!(
            host = %config.host,
            port = config.port,
            socket = config.socket.as_deref().unwrap_or("-"),
            "connected to MySQL"
        );
        Ok(Self { pool, unbounded })
    }

    fn conn(&self) -> Result<PooledConn, SourceError> {
        self.pool.get_conn().map_err(map_error)
    }

    fn explain_conn(&self, format: ExplainFormat) -> Result<PooledConn, SourceError> {
        if format.is_bounded() {
            self.conn()
        } else {
            self.unbounded.get_conn().map_err(map_error)
        }
    }

    fn query_table(&self, sql: &str) -> Result<Table, SourceError> {
        let mut conn = self.conn()?;
        let result = conn.query_iter(sql).map_err(map_error)?;
        decode(result)
    }

    fn exec_table<P>(&self, sql: &str, params: P) -> Result<Table, SourceError>
    where
        P: Into<mysql::Params>,
    {
        let mut conn = self.conn()?;
        let result = conn.exec_iter(sql, params).map_err(map_error)?;
        decode(result)
    }

    /// Resolves a performance_schema thread id to the connection id `KILL`
    /// expects.
    fn processlist_id(&self, conn: &mut PooledConn, thread_id: &str) -> Result<u64, SourceError> {
        let id: Option<Option<u64>> = conn
            .exec_first(queries::PROCESSLIST_ID, (thread_id,))
            .map_err(map_error)?;
        id.flatten()
            .ok_or_else(|| SourceError::NotFound(format!("thread {thread_id}")))
    }
}

impl DataSource for MysqlSource {
    fn fetch_session_list(&self) -> Result<Table, SourceError> {
        self.query_table(queries::SESSION_LIST)
    }

    fn fetch_server_status(&self) -> Result<ServerStatus, SourceError> {
        let table = self.query_table(&queries::build_server_status_query())?;
        Ok(ServerStatus::from_table(&table))
    }

    fn fetch_session_detail(&self, thread_id: &str) -> Result<Table, SourceError> {
        let table = self.exec_table(queries::SESSION_DETAIL, (thread_id,))?;
        if table.is_empty() {
            return Err(SourceError::NotFound(format!("thread {thread_id}")));
        }
        Ok(table)
    }

    fn fetch_locks(&self, thread_id: &str) -> Result<Report, SourceError> {
        let locks = self.exec_table(queries::DATA_LOCKS, (thread_id,))?;
        let waits = self.exec_table(queries::LOCK_WAITS, (thread_id, thread_id))?;
        Ok(Report::default()
            .section("Data locks", locks)
            .section("Lock waits", waits))
    }

    fn fetch_engine_status(&self) -> Result<String, SourceError> {
        let table = self.query_table(queries::ENGINE_STATUS)?;
        table
            .get(0, "Status")
            .map(str::to_string)
            .ok_or_else(|| SourceError::Query("empty InnoDB status".into()))
    }

    fn fetch_memory_status(&self) -> Result<Report, SourceError> {
        Ok(Report::default()
            .section("Total allocated", self.query_table(queries::MEMORY_TOTAL)?)
            .section("Top allocations by event", self.query_table(queries::MEMORY_BY_EVENT)?)
            .section("Top threads", self.query_table(queries::MEMORY_BY_THREAD)?))
    }

    fn fetch_replication_status(&self) -> Result<Table, SourceError> {
        match self.query_table(queries::REPLICA_STATUS) {
            Err(SourceError::Query(msg)) => {
                debug!(error = %msg, "SHOW REPLICA STATUS failed, retrying legacy syntax");
                self.query_table(queries::REPLICA_STATUS_LEGACY)
            }
            other => other,
        }
    }

    fn fetch_error_log(&self) -> Result<Table, SourceError> {
        self.query_table(queries::ERROR_LOG)
    }

    fn fetch_explain(
        &self,
        thread_id: &str,
        format: ExplainFormat,
    ) -> Result<Explain, SourceError> {
        let mut conn = self.explain_conn(format)?;
        let current: Option<(Option<String>, Option<String>)> = conn
            .exec_first(queries::CURRENT_STATEMENT, (thread_id,))
            .map_err(map_error)?;
        let Some((Some(statement), schema)) = current else {
            return Err(SourceError::NotFound(format!(
                "statement of thread {thread_id}"
            )));
        };

        if let Some(schema) = schema.as_deref() {
            conn.query_drop(format!("USE {}", queries::quote_ident(schema)))
                .map_err(map_error)?;
        }
        let sql = queries::build_explain(format, &statement);
        debug!(thread_id, ?format, "running explain");
        let plan = decode(conn.query_iter(sql).map_err(map_error)?)?;

        Ok(Explain {
            statement,
            schema,
            format,
            plan,
        })
    }

    fn kill_session(&self, thread_id: &str) -> Result<(), SourceError> {
        let mut conn = self.conn()?;
        let id = self.processlist_id(&mut conn, thread_id)?;
        info!(thread_id, processlist_id = id, "killing connection");
        conn.query_drop(queries::build_kill(id)).map_err(map_error)
    }

    fn server_info(&self) -> Result<ServerInfo, SourceError> {
        let table = self.query_table(queries::SERVER_INFO)?;
        let row = table
            .rows
            .first()
            .ok_or_else(|| SourceError::Query("empty server info".into()))?;
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        Ok(ServerInfo {
            brand: cell(0),
            version: cell(1),
            hostname: cell(2),
            port: cell(3),
        })
    }
}

/// Drains the first result set into a text table.
fn decode<P: Protocol>(mut result: QueryResult<'_, '_, '_, P>) -> Result<Table, SourceError> {
    let columns: Vec<String> = result
        .columns()
        .as_ref()
        .iter()
        .map(|c| c.name_str().into_owned())
        .collect();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for row in result.by_ref() {
        let row: Row = row.map_err(map_error)?;
        rows.push(
            (0..row.len())
                .map(|i| row.as_ref(i).map_or_else(|| NULL.to_string(), value_to_string))
                .collect(),
        );
    }
    Ok(Table { columns, rows })
}

/// Renders a column value the way the server would print it.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::NULL => NULL.to_string(),
        Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        Value::Int(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Date(y, mo, d, h, mi, s, us) => {
            if *us > 0 {
                format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}.{us:06}")
            } else {
                format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}")
            }
        }
        Value::Time(neg, days, h, mi, s, us) => {
            let sign = if *neg { "-" } else { "" };
            let hours = u64::from(*days) * 24 + u64::from(*h);
            if *us > 0 {
                format!("{sign}{hours:02}:{mi:02}:{s:02}.{us:06}")
            } else {
                format!("{sign}{hours:02}:{mi:02}:{s:02}")
            }
        }
    }
}

/// Splits driver errors into "server unreachable", "statement too slow"
/// and "statement failed".
fn map_error(err: MysqlError) -> SourceError {
    match err {
        MysqlError::IoError(e)
            if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) =>
        {
            SourceError::Timeout(e.to_string())
        }
        MysqlError::IoError(e) => SourceError::Connection(e.to_string()),
        MysqlError::UrlError(e) => SourceError::Connection(e.to_string()),
        MysqlError::DriverError(
            e @ (DriverError::ConnectTimeout | DriverError::CouldNotConnect(_)),
        ) => SourceError::Connection(e.to_string()),
        MysqlError::MySqlError(e) => SourceError::Query(e.to_string()),
        other => SourceError::Query(other.to_string()),
    }
}
