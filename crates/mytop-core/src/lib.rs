//! mytop-core - live MySQL monitoring console.
//!
//! Provides:
//! - `source` - data source abstraction, MySQL implementation, scripted mock
//! - `sampler` - periodic sampling thread and rate computation (`rates`)
//! - `cancel` - console-wide cancellation and deadline-bounded fetches
//! - `models` - tables, samples, sessions, server identity
//! - `config` - console settings and latency colour bands
//! - `fmt` - shared formatting helpers (rates, counts, uptime, timers)
//! - `simple` - one-shot plain-text processlist
//!
//! With `tui` feature (default):
//! - `tui` - the interactive console (ratatui/crossterm)
//!
//! With `mysql` feature (default):
//! - `source::mysql` - connection pool and the fixed query set

pub mod cancel;
pub mod config;
pub mod error;
pub mod fmt;
pub mod models;
pub mod rates;
pub mod sampler;
pub mod simple;
pub mod source;

#[cfg(feature = "tui")]
pub mod tui;
