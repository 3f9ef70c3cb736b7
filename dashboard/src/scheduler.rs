use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Spawns recurring polls and tracks how many are still armed.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    armed: Arc<AtomicUsize>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `tick` now and then every `period` until the returned handle is
    /// cancelled or dropped. A tick that overruns delays the next one instead
    /// of bursting.
    ///
    /// Must be called from within a tokio runtime.
    pub fn every<F, Fut>(&self, period: Duration, mut tick: F) -> PollHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick().await;
            }
        });
        self.armed.fetch_add(1, Ordering::AcqRel);
        PollHandle {
            task: Some(task),
            armed: Arc::clone(&self.armed),
        }
    }

    /// Number of recurring polls that have not been cancelled.
    pub fn active(&self) -> usize {
        self.armed.load(Ordering::Acquire)
    }
}

/// Owner of one recurring poll. Dropping it cancels the poll.
#[derive(Debug)]
pub struct PollHandle {
    task: Option<JoinHandle<()>>,
    armed: Arc<AtomicUsize>,
}

impl PollHandle {
    /// Stop the poll. The task is never polled again after this returns;
    /// calling it again is a no-op.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.armed.fetch_sub(1, Ordering::AcqRel);
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
