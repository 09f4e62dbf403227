//! Data source abstraction.
//!
//! The console only talks to the server through [`DataSource`]. Every
//! method is a single round trip of the fixed query set; ids are the
//! validated digit strings typed by the operator, passed through unchanged.
//!
//! - `mysql` - live implementation over a connection pool (feature `mysql`)
//! - `mock` - scripted in-memory implementation for tests

pub mod mock;
#[cfg(feature = "mysql")]
pub mod mysql;

use crate::error::{ConsoleError, SourceError};
use crate::models::{Explain, ExplainFormat, Report, ServerInfo, ServerStatus, Table};

/// Fixed query set used by the sampler and the drill-down views.
///
/// Implementations must be callable from several threads at once: the
/// sampler thread and drill-down fetch workers run concurrently.
pub trait DataSource: Send + Sync {
    /// Session list in display column order, most expensive first.
    fn fetch_session_list(&self) -> Result<Table, SourceError>;

    /// Monotonic counters and gauges.
    fn fetch_server_status(&self) -> Result<ServerStatus, SourceError>;

    /// Full detail of one thread as a single-row table.
    fn fetch_session_detail(&self, thread_id: &str) -> Result<Table, SourceError>;

    /// Locks held or awaited by one thread.
    fn fetch_locks(&self, thread_id: &str) -> Result<Report, SourceError>;

    /// Raw `SHOW ENGINE INNODB STATUS` text.
    fn fetch_engine_status(&self) -> Result<String, SourceError>;

    fn fetch_memory_status(&self) -> Result<Report, SourceError>;

    fn fetch_replication_status(&self) -> Result<Table, SourceError>;

    fn fetch_error_log(&self) -> Result<Table, SourceError>;

    /// Plan of the statement `thread_id` is running. The caller applies the
    /// deadline; see [`ExplainFormat::is_bounded`].
    fn fetch_explain(&self, thread_id: &str, format: ExplainFormat)
    -> Result<Explain, SourceError>;

    fn kill_session(&self, thread_id: &str) -> Result<(), SourceError>;

    fn server_info(&self) -> Result<ServerInfo, SourceError>;
}

/// Reads the server identity and rejects servers other than MySQL 8.
pub fn check_server<S: DataSource + ?Sized>(source: &S) -> Result<ServerInfo, ConsoleError> {
    let info = source.server_info()?;
    if !info.is_supported() {
        return Err(ConsoleError::Unsupported {
            brand: info.brand,
            version: info.version,
        });
    }
    Ok(info)
}
