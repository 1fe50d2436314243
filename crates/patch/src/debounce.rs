//! Trailing-edge debounce on a tokio runtime.

use core::future::Future;
use core::time::Duration;
use log::{trace, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Runs a job once no new request has arrived for `delay`.
///
/// Each [`Debouncer::schedule`] call cancels the pending timer and starts a new one. When a
/// timer fires, the job's future is spawned as its own task, so a later `schedule` or
/// `cancel` never interrupts a job that already started. [`Debouncer::join_started`] waits
/// for one.
#[derive(Debug)]
pub struct Debouncer {
    handle: Handle,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
    started: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Debouncer {
    pub fn new(handle: Handle, delay: Duration) -> Self {
        Self {
            handle,
            delay,
            pending: None,
            started: Arc::new(Mutex::new(None)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)arm the timer. `job` is called when the timer fires, not now.
    pub fn schedule<F, Fut>(&mut self, job: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.cancel() {
            trace!("debounce timer re-armed");
        }
        let delay = self.delay;
        let handle = self.handle.clone();
        let started = Arc::clone(&self.started);
        self.pending = Some(self.handle.spawn(async move {
            sleep(delay).await;
            *started.lock() = Some(handle.spawn(job()));
        }));
    }

    /// Cancel the pending timer. Returns true if one was still waiting.
    pub fn cancel(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        let waiting = !pending.is_finished();
        pending.abort();
        waiting
    }

    /// Wait for the most recently started job, if it has not been waited on yet. Returns true
    /// if there was one.
    pub async fn join_started(&self) -> bool {
        let started = self.started.lock().take();
        let Some(job) = started else {
            return false;
        };
        if let Err(err) = job.await {
            warn!("debounced job did not complete: {err}");
        }
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }
}
