//! Cancellable one-shot timer for debounced work.
//!
//! `DebounceTimer::schedule` runs a future after a delay. Scheduling again
//! before the delay elapses cancels the earlier run, so only the latest
//! scheduling fires. Once the delay has elapsed the scheduled work runs to
//! completion; cancellation only reaches a run that is still waiting.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

struct Scheduled {
    cancel: CancellationToken,
    fired: Arc<AtomicBool>,
}

/// Schedule/cancel handle for one debounced action.
///
/// Must be used from within a tokio runtime.
pub struct DebounceTimer {
    name: &'static str,
    slot: Mutex<Option<Scheduled>>,
}

impl DebounceTimer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Mutex::new(None),
        }
    }

    /// Run `work` after `delay`, cancelling any run still waiting.
    pub fn schedule<F>(&self, delay: Duration, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let fired = Arc::new(AtomicBool::new(false));
        let waiter = cancel.clone();
        let started = fired.clone();
        let name = self.name;

        let mut slot = self.lock();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = waiter.cancelled() => {
                    tracing::trace!(timer = name, "debounce cancelled");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            started.store(true, Ordering::SeqCst);
            work.await;
        });

        let previous = slot.replace(Scheduled { cancel, fired });
        drop(slot);
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
    }

    /// Cancel a run that has not fired yet. Returns whether one was waiting.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(scheduled) => {
                let waiting = Self::is_waiting(&scheduled);
                scheduled.cancel.cancel();
                waiting
            }
            None => false,
        }
    }

    /// Whether a scheduled run is still waiting for its delay.
    pub fn is_pending(&self) -> bool {
        self.lock().as_ref().is_some_and(Self::is_waiting)
    }

    fn is_waiting(scheduled: &Scheduled) -> bool {
        !scheduled.cancel.is_cancelled() && !scheduled.fired.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Scheduled>> {
        self.slot.lock().expect("debounce timer lock poisoned")
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        if let Ok(slot) = self.slot.get_mut() {
            if let Some(scheduled) = slot.take() {
                scheduled.cancel.cancel();
            }
        }
    }
}

impl std::fmt::Debug for DebounceTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebounceTimer")
            .field("name", &self.name)
            .field("pending", &self.is_pending())
            .finish()
    }
}
