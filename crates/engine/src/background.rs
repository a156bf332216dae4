//! Fire-and-forget background task submission.
//!
//! The engine hands its asynchronous side effects (stock reservation,
//! timeout-task bookkeeping) to a [`TaskSpawner`] and moves on; submission
//! returns immediately and a failing task is logged by the task itself,
//! never surfaced to the caller. Tests swap in [`QueuedSpawner`] to run
//! submissions deterministically.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tracing::Instrument;

/// A boxed unit of background work.
pub type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Submission seam for fire-and-forget work.
pub trait TaskSpawner: Send + Sync {
    /// Submits a task for eventual execution and returns immediately.
    fn spawn(&self, label: &'static str, task: BoxedTask);
}

/// Production spawner backed by the tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct TokioSpawner;

impl TokioSpawner {
    pub fn new() -> Self {
        Self
    }
}

impl TaskSpawner for TokioSpawner {
    fn spawn(&self, label: &'static str, task: BoxedTask) {
        let span = tracing::info_span!("background_task", task = label);
        tokio::spawn(task.instrument(span));
    }
}

/// Test spawner that queues submissions until [`QueuedSpawner::drain`] runs
/// them, making background effects observable and ordered.
#[derive(Clone, Default)]
pub struct QueuedSpawner {
    queue: Arc<Mutex<Vec<(&'static str, BoxedTask)>>>,
}

impl QueuedSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many submissions are waiting.
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Runs every queued task to completion, including tasks queued by the
    /// tasks themselves; returns how many ran.
    pub async fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            let batch: Vec<(&'static str, BoxedTask)> =
                std::mem::take(&mut *self.queue.lock().unwrap());
            if batch.is_empty() {
                return ran;
            }
            for (label, task) in batch {
                tracing::debug!(task = label, "running queued background task");
                task.await;
                ran += 1;
            }
        }
    }
}

impl TaskSpawner for QueuedSpawner {
    fn spawn(&self, label: &'static str, task: BoxedTask) {
        self.queue.lock().unwrap().push((label, task));
    }
}
