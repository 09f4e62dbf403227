//! Console-wide cancellation and deadline-bounded fetches.
//!
//! One [`CancelToken`] is created per console run and cloned into every
//! thread. Cancelling is terminal and idempotent. Blocking waits select on
//! [`CancelToken::done`], which disconnects the moment the token is cancelled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, after, bounded, never, select};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{ConsoleError, SourceError};

struct Inner {
    cancelled: AtomicBool,
    /// Dropped on cancel, which disconnects every `done` receiver.
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

/// Shared, clonable cancellation signal.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(tx)),
                done: rx,
            }),
        }
    }

    /// Signals cancellation. Later calls are no-ops.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.trigger.lock().take();
            debug!("cancellation signalled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with [`ConsoleError::Cancelled`] once the token is cancelled.
    pub fn check(&self) -> Result<(), ConsoleError> {
        if self.is_cancelled() {
            Err(ConsoleError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Receiver that never yields a value and disconnects on cancel.
    /// Use it as a `select!` arm.
    pub fn done(&self) -> Receiver<()> {
        self.inner.done.clone()
    }
}

/// Runs `fetch` on a worker thread and waits for it, the deadline, or
/// cancellation, whichever comes first.
///
/// `deadline = None` waits without a time bound (still interruptible by the
/// token). On timeout or cancel the worker is abandoned; its driver call is
/// bounded by the connection's own read timeout.
pub fn run_bounded<T, F>(
    cancel: &CancelToken,
    deadline: Option<Duration>,
    fetch: F,
) -> Result<T, ConsoleError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SourceError> + Send + 'static,
{
    cancel.check()?;

    let (tx, rx) = bounded(1);
    thread::Builder::new()
        .name("mytop-fetch".into())
        .spawn(move || {
            // The receiver is gone when the caller timed out; nothing to do.
            let _ = tx.send(fetch());
        })
        .map_err(|source| ConsoleError::Spawn {
            name: "fetch",
            source,
        })?;

    let done = cancel.done();
    let timer = match deadline {
        Some(d) => after(d),
        None => never(),
    };

    select! {
        recv(rx) -> res => match res {
            Ok(result) => result.map_err(ConsoleError::from),
            Err(_) => Err(ConsoleError::Query("fetch worker exited without a result".into())),
        },
        recv(done) -> _ => Err(ConsoleError::Cancelled),
        recv(timer) -> _ => {
            let limit = deadline.unwrap_or_default();
            debug!(timeout_secs = limit.as_secs(), "fetch deadline exceeded");
            Err(ConsoleError::Timeout(limit))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn cancel_is_idempotent_and_visible_to_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(clone.check().is_ok());
        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
        assert!(matches!(clone.check(), Err(ConsoleError::Cancelled)));
    }

    #[test]
    fn done_disconnects_on_cancel() {
        let token = CancelToken::new();
        let done = token.done();
        assert!(done.try_recv().is_err());
        token.cancel();
        assert!(done.recv().is_err());
    }

    #[test]
    fn bounded_fetch_returns_value() {
        let token = CancelToken::new();
        let v = run_bounded(&token, Some(Duration::from_secs(5)), || Ok(7)).unwrap();
        assert_eq!(v, 7);
    }

    #[test]
    fn bounded_fetch_maps_source_error() {
        let token = CancelToken::new();
        let err = run_bounded::<(), _>(&token, Some(Duration::from_secs(5)), || {
            Err(SourceError::Query("boom".into()))
        })
        .unwrap_err();
        assert!(matches!(err, ConsoleError::Query(msg) if msg == "boom"));
    }

    #[test]
    fn slow_fetch_times_out() {
        let token = CancelToken::new();
        let start = Instant::now();
        let err = run_bounded(&token, Some(Duration::from_millis(30)), || {
            thread::sleep(Duration::from_millis(500));
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, ConsoleError::Timeout(_)));
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn unbounded_fetch_is_released_by_cancel() {
        let token = CancelToken::new();
        let canceller = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            canceller.cancel();
        });
        let start = Instant::now();
        let err = run_bounded(&token, None, || {
            thread::sleep(Duration::from_secs(2));
            Ok(())
        })
        .unwrap_err();
        assert!(err.is_cancelled());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn no_fetch_after_cancel() {
        let token = CancelToken::new();
        token.cancel();
        let err = run_bounded::<(), _>(&token, None, || panic!("must not run")).unwrap_err();
        assert!(err.is_cancelled());
    }
}
