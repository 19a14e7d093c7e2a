//! Worker pool draining a shared work queue
//!
//! This module handles:
//! - The one-shot seeded FIFO queue of work items
//! - Spawning a fixed number of workers, each owning one page session
//! - Per-worker throttling between items
//! - Joining all workers and surfacing the first worker error

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::processor::{ItemOutcome, ItemProcessor};
use super::renderer::{RenderError, Renderer};
use crate::storage::FailureRecord;

/// A site path waiting to be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Site-relative document path; the item's identity
    pub path: String,

    /// Failure recorded for this path by an earlier run
    pub prior_attempt: Option<FailureRecord>,
}

impl WorkItem {
    /// Item discovered by a fresh run
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            prior_attempt: None,
        }
    }

    /// Item seeded from a ledger record
    pub fn resumed(record: FailureRecord) -> Self {
        Self {
            path: record.path.clone(),
            prior_attempt: Some(record),
        }
    }
}

/// FIFO queue filled once before the pool starts
///
/// Pops are serialized, so each item is handed to exactly one worker.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Mutex<VecDeque<WorkItem>>,
}

impl WorkQueue {
    pub fn new(items: impl IntoIterator<Item = WorkItem>) -> Self {
        Self {
            items: Mutex::new(items.into_iter().collect()),
        }
    }

    /// Takes the next item, or `None` once the queue is drained
    pub fn pop(&self) -> Option<WorkItem> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<WorkItem>> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Errors that end a worker's loop
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Worker {worker} could not open a page session: {source}")]
    Session { worker: usize, source: RenderError },

    #[error("Worker {worker} panicked: {message}")]
    Panicked { worker: usize, message: String },
}

/// Pool settings
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of workers; capped at the queue length
    pub concurrency: usize,

    /// Pause each worker takes after finishing an item
    pub item_delay: Duration,
}

/// What the pool did once every worker has returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolReport {
    pub workers: usize,
    pub processed: usize,
}

/// Runs workers until the queue is drained or the run is cancelled
///
/// Every worker is joined before this returns, even when some of them fail.
///
/// # Returns
///
/// * `Ok(PoolReport)` - All workers finished cleanly
/// * `Err(WorkerError)` - The first worker error; other workers still ran to completion
pub async fn run_pool(
    queue: Arc<WorkQueue>,
    renderer: Arc<dyn Renderer>,
    processor: Arc<ItemProcessor>,
    config: PoolConfig,
    cancel: CancellationToken,
) -> Result<PoolReport, WorkerError> {
    let workers = config.concurrency.min(queue.len());
    tracing::info!("Starting {} workers for {} items", workers, queue.len());

    let handles: Vec<_> = (0..workers)
        .map(|id| {
            let queue = queue.clone();
            let renderer = renderer.clone();
            let processor = processor.clone();
            let cancel = cancel.clone();
            let item_delay = config.item_delay;
            tokio::spawn(async move {
                run_worker(id, queue, renderer, processor, item_delay, cancel).await
            })
        })
        .collect();

    let mut processed = 0;
    let mut first_error = None;
    for (id, handle) in handles.into_iter().enumerate() {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(WorkerError::Panicked {
                worker: id,
                message: e.to_string(),
            }),
        };

        match result {
            Ok(count) => processed += count,
            Err(e) => {
                tracing::error!("{}", e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(PoolReport { workers, processed }),
    }
}

/// One worker: open a session, drain items, close the session
async fn run_worker(
    id: usize,
    queue: Arc<WorkQueue>,
    renderer: Arc<dyn Renderer>,
    processor: Arc<ItemProcessor>,
    item_delay: Duration,
    cancel: CancellationToken,
) -> Result<usize, WorkerError> {
    let mut page = renderer
        .open_page()
        .await
        .map_err(|source| WorkerError::Session { worker: id, source })?;
    tracing::debug!(worker = id, "Worker started");

    let mut processed = 0;
    while !cancel.is_cancelled() {
        let Some(item) = queue.pop() else {
            break;
        };

        let outcome = processor.process(page.as_mut(), &item, id).await;
        if outcome == ItemOutcome::Abandoned {
            break;
        }
        processed += 1;

        if !item_delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(item_delay) => {}
            }
        }
    }

    page.close().await;
    tracing::debug!(worker = id, processed, "Worker finished");
    Ok(processed)
}
