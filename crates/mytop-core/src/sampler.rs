//! Periodic sampling of the session list and server counters.
//!
//! The sampler runs on its own thread and hands every update to the
//! dispatch loop over a rendezvous channel. An update the loop is not ready
//! to take (it is redrawing or running a drill-down) is dropped, so the
//! console never works through a backlog of stale ticks. Only the dispatch
//! thread draws, and the rendezvous send is what keeps at most one redraw
//! of the main view in flight.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError, select, tick};
use tracing::{debug, error, info, trace};

use crate::cancel::CancelToken;
use crate::error::ConsoleError;
use crate::models::{RateFrame, Sample, SessionRow};
use crate::rates;
use crate::source::DataSource;

/// One sampler tick as delivered to the dispatch loop.
#[derive(Debug, Clone)]
pub struct SamplerUpdate {
    pub sample: Sample,
    /// Absent on the first tick.
    pub rates: Option<RateFrame>,
}

/// Delivery counters, returned when the sampler thread exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerStats {
    pub ticks: u64,
    pub delivered: u64,
    /// Updates dropped because the dispatch loop was busy.
    pub dropped: u64,
}

/// Computes samples and rates; keeps the previous sample as baseline.
pub struct Sampler<S: DataSource + ?Sized> {
    source: Arc<S>,
    cancel: CancelToken,
    previous: Option<Sample>,
}

impl<S: DataSource + ?Sized> Sampler<S> {
    pub fn new(source: Arc<S>, cancel: CancelToken) -> Self {
        Self {
            source,
            cancel,
            previous: None,
        }
    }

    /// Fetches a new sample and its rates against the previous one.
    ///
    /// Cancellation is checked before each fetch, so a cancelled token
    /// stops the tick between the session list and the counters.
    pub fn tick(&mut self) -> Result<(Sample, Option<RateFrame>), ConsoleError> {
        self.cancel.check()?;
        let sessions = SessionRow::from_table(&self.source.fetch_session_list()?);
        self.cancel.check()?;
        let status = self.source.fetch_server_status()?;

        let sample = Sample::new(status, sessions);
        let frame = self
            .previous
            .as_ref()
            .map(|prev| rates::compute(prev, &sample));
        self.previous = Some(sample.clone());
        Ok((sample, frame))
    }

    pub fn previous(&self) -> Option<&Sample> {
        self.previous.as_ref()
    }
}

/// Starts the sampler thread.
///
/// The first tick runs immediately, then every `interval`. A fetch error
/// cancels the whole console and is returned from the join handle.
pub fn spawn_sampler<S>(
    source: Arc<S>,
    interval: Duration,
    cancel: CancelToken,
    updates: Sender<SamplerUpdate>,
) -> Result<JoinHandle<Result<SamplerStats, ConsoleError>>, ConsoleError>
where
    S: DataSource + ?Sized + 'static,
{
    thread::Builder::new()
        .name("mytop-sampler".into())
        .spawn(move || run_sampler(Sampler::new(source, cancel.clone()), interval, cancel, updates))
        .map_err(|source| ConsoleError::Spawn {
            name: "sampler",
            source,
        })
}

fn run_sampler<S: DataSource + ?Sized>(
    mut sampler: Sampler<S>,
    interval: Duration,
    cancel: CancelToken,
    updates: Sender<SamplerUpdate>,
) -> Result<SamplerStats, ConsoleError> {
    let ticker = tick(interval);
    let done = cancel.done();
    let mut stats = SamplerStats::default();
    info!(interval_ms = interval.as_millis() as u64, "sampler started");

    loop {
        match sampler.tick() {
            Ok((sample, rates)) => {
                stats.ticks += 1;
                trace!(
                    sessions = sample.sessions.len(),
                    queries = sample.status.counters.queries,
                    "sample taken"
                );
                match updates.try_send(SamplerUpdate { sample, rates }) {
                    Ok(()) => stats.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        stats.dropped += 1;
                        trace!("dispatch loop busy, update dropped");
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            Err(ConsoleError::Cancelled) => break,
            Err(e) => {
                error!(error = %e, "sampling failed, shutting down");
                cancel.cancel();
                return Err(e);
            }
        }

        select! {
            recv(done) -> _ => break,
            recv(ticker) -> _ => {}
        }
    }

    debug!(
        ticks = stats.ticks,
        delivered = stats.delivered,
        dropped = stats.dropped,
        "sampler stopped"
    );
    Ok(stats)
}
