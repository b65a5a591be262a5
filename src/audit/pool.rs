//! Bounded-concurrency executor
//!
//! A [`WorkerPool`] runs one async task per input item with at most `limit`
//! of them in flight. Each task's outcome is captured on its own: a panic or
//! a cancellation in one task never disturbs its siblings.

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Why a pooled task produced no value
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task cancelled")]
    Cancelled,

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// The result of one pooled task, paired with its input
#[derive(Debug)]
pub struct TaskOutcome<I, T> {
    pub item: I,
    pub result: Result<T, TaskError>,
}

/// Worker pool with a fixed concurrency limit
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    limit: usize,
    cancel: CancellationToken,
}

impl WorkerPool {
    /// Creates a pool allowing `limit` simultaneous tasks (at least one)
    pub fn new(limit: usize) -> Self {
        Self::with_cancellation(limit, CancellationToken::new())
    }

    /// Creates a pool whose queued and running tasks stop when `cancel` fires
    pub fn with_cancellation(limit: usize, cancel: CancellationToken) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            cancel,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Runs `task` for every item and waits for all of them
    ///
    /// Outcomes are returned in input order regardless of completion order.
    /// After cancellation, tasks still waiting for a permit never start and
    /// running tasks are dropped at their next await point; both report
    /// [`TaskError::Cancelled`].
    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, task: F) -> Vec<TaskOutcome<I, T>>
    where
        I: Clone + Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut handles = Vec::with_capacity(items.len());

        for item in items {
            let semaphore = Arc::clone(&self.semaphore);
            let cancel = self.cancel.clone();
            let work = task(item.clone());

            let handle = tokio::spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return None,
                    permit = semaphore.acquire_owned() => permit.ok()?,
                };

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    value = work => Some(value),
                }
            });

            handles.push((item, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (item, handle) in handles {
            let result = match handle.await {
                Ok(Some(value)) => Ok(value),
                Ok(None) => Err(TaskError::Cancelled),
                Err(e) if e.is_panic() => {
                    tracing::error!("Pooled task panicked: {}", e);
                    Err(TaskError::Panicked(e.to_string()))
                }
                Err(_) => Err(TaskError::Cancelled),
            };
            outcomes.push(TaskOutcome { item, result });
        }

        outcomes
    }
}
