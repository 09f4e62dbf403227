//! Live console bootstrap: terminal, sampler, key reader, dispatch loop.

use std::sync::Arc;

use crossbeam_channel::bounded;
use tracing::{debug, info};

use super::controller::ViewController;
use super::event::spawn_key_reader;
use super::screen::RenderSink;
use super::terminal::TerminalSink;
use crate::cancel::CancelToken;
use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::models::ServerInfo;
use crate::sampler::spawn_sampler;
use crate::source::{DataSource, check_server};

/// The interactive console.
pub struct Console<S: DataSource + ?Sized + 'static> {
    source: Arc<S>,
    config: ConsoleConfig,
    cancel: CancelToken,
}

impl<S: DataSource + ?Sized + 'static> Console<S> {
    pub fn new(source: Arc<S>, config: ConsoleConfig, cancel: CancelToken) -> Self {
        Self {
            source,
            config,
            cancel,
        }
    }

    /// Checks the server version, then runs on the real terminal until
    /// the operator quits or a fatal error occurs. The terminal is restored
    /// before this returns.
    pub fn run(self) -> Result<(), ConsoleError> {
        let info = check_server(&*self.source)?;
        info!(
            brand = %info.brand,
            version = %info.version,
            host = %info.hostname,
            "console starting"
        );
        let sink = TerminalSink::enter()?;
        self.run_with(sink, &info)
    }

    /// Runs the console on any sink.
    ///
    /// Shutdown order: cancel, stop the dispatch loop and drop the sink,
    /// then join the sampler. A sampler error outranks a clean loop exit.
    pub fn run_with<R: RenderSink>(self, sink: R, info: &ServerInfo) -> Result<(), ConsoleError> {
        let (updates_tx, updates) = bounded(0);
        let sampler = spawn_sampler(
            Arc::clone(&self.source),
            self.config.tick_interval,
            self.cancel.clone(),
            updates_tx,
        )?;
        let (keys, key_reader) = match spawn_key_reader(self.cancel.clone(), self.config.key_poll) {
            Ok(spawned) => spawned,
            Err(e) => {
                self.cancel.cancel();
                let _ = sampler.join();
                return Err(e);
            }
        };

        let mut controller = ViewController::new(
            Arc::clone(&self.source),
            sink,
            self.config.clone(),
            self.cancel.clone(),
            info,
        );
        let loop_result = controller.run(&keys, &updates);
        self.cancel.cancel();
        drop(controller);
        drop(updates);

        let sampler_result = sampler
            .join()
            .unwrap_or_else(|_| Err(ConsoleError::Query("sampler thread panicked".into())));
        let _ = key_reader.join();

        match sampler_result {
            Ok(stats) => {
                debug!(
                    ticks = stats.ticks,
                    delivered = stats.delivered,
                    dropped = stats.dropped,
                    "console stopped"
                );
                loop_result
            }
            Err(e) if e.is_cancelled() => loop_result,
            Err(e) => Err(e),
        }
    }
}
