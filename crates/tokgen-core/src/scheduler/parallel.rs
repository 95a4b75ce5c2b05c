//! Run a batch of work items through a bounded pool of fetch workers.
//!
//! Keeps up to `concurrency` workers in flight at once; when one finishes,
//! its outcome is recorded and the next item is started until the batch is
//! drained.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;

use crate::batch::{BatchResult, Outcome, WorkItem};
use crate::control::CancelToken;
use crate::fetch::{FetchWorker, TokenEndpoint};
use crate::retry::ErrorKind;

use super::progress::ProgressStats;

/// Default number of workers in flight.
pub const DEFAULT_CONCURRENCY: usize = 5;
/// Default number of completions between progress summaries.
pub const DEFAULT_PROGRESS_EVERY: usize = 5;

/// Fans a batch out to fetch workers and collects their outcomes.
pub struct Dispatcher<E> {
    worker: FetchWorker<E>,
    concurrency: usize,
    progress_every: usize,
    progress_tx: Option<mpsc::Sender<ProgressStats>>,
}

impl<E: TokenEndpoint> Dispatcher<E> {
    /// `concurrency` is clamped to at least 1.
    pub fn new(worker: FetchWorker<E>, concurrency: usize) -> Self {
        Self {
            worker,
            concurrency: concurrency.max(1),
            progress_every: DEFAULT_PROGRESS_EVERY,
            progress_tx: None,
        }
    }

    /// Emit a progress summary every `n` completions (0 disables).
    pub fn with_progress_every(mut self, n: usize) -> Self {
        self.progress_every = n;
        self
    }

    /// Also send each progress summary on `tx` (dropped if the channel is full).
    pub fn with_progress_channel(mut self, tx: mpsc::Sender<ProgressStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn cancel_token(&self) -> &CancelToken {
        self.worker.cancel_token()
    }

    /// Process every item and return once each has exactly one outcome.
    ///
    /// Outcomes are recorded in completion order. Items not yet started when
    /// the worker's cancel token fires are recorded as `Cancelled`.
    pub async fn run(&self, items: Vec<WorkItem>, label: &str) -> BatchResult {
        let total = items.len();
        let started = Instant::now();
        let cancel = self.worker.cancel_token().clone();
        let mut result = BatchResult::new(total);
        let mut pending = items.into_iter();
        // Multiset of ids currently owned by a task; whatever is left after a
        // lost task is reported as failed so every item still gets one outcome.
        let mut in_flight: HashMap<String, usize> = HashMap::new();
        let mut join_set = JoinSet::new();

        tracing::info!(region = label, total, concurrency = self.concurrency, "batch started");

        loop {
            while join_set.len() < self.concurrency {
                let Some(item) = pending.next() else {
                    break;
                };
                if cancel.is_cancelled() {
                    let outcome =
                        Outcome::failure(item.id, ErrorKind::Cancelled, Some("not started".into()));
                    self.record(&mut result, outcome, label, started);
                    continue;
                }
                *in_flight.entry(item.id.clone()).or_insert(0) += 1;
                let worker = self.worker.clone();
                join_set.spawn(async move {
                    let id = item.id.clone();
                    // Inner task isolates worker panics so the id is never lost; the
                    // guard aborts it if this supervisor is aborted first.
                    let task = tokio::spawn(async move { worker.process(item).await });
                    let mut guard = AbortOnDrop(task);
                    match (&mut guard.0).await {
                        Ok(outcome) => outcome,
                        Err(e) => Outcome::failure(
                            id,
                            ErrorKind::UnknownError,
                            Some(format!("worker task failed: {}", e)),
                        ),
                    }
                });
            }

            if join_set.is_empty() {
                break;
            }

            let Some(res) = join_set.join_next().await else {
                break;
            };
            match res {
                Ok(outcome) => {
                    release(&mut in_flight, outcome.id());
                    self.record(&mut result, outcome, label, started);
                }
                Err(e) => {
                    tracing::error!(region = label, error = %e, "worker supervisor task failed")
                }
            }
        }

        for (id, count) in in_flight {
            for _ in 0..count {
                let detail = Some("worker lost".to_string());
                let outcome = Outcome::failure(id.clone(), ErrorKind::UnknownError, detail);
                self.record(&mut result, outcome, label, started);
            }
        }

        debug_assert!(result.is_complete());
        tracing::info!(
            region = label,
            total,
            successes = result.successes.len(),
            failures = result.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch finished"
        );
        result
    }

    fn record(&self, result: &mut BatchResult, outcome: Outcome, label: &str, started: Instant) {
        match &outcome {
            Outcome::Success(s) => tracing::info!(
                region = label,
                id = %s.id,
                done = result.successes.len() + 1,
                total = result.total_submitted,
                "success"
            ),
            Outcome::Failure(f) => tracing::warn!(
                region = label,
                id = %f.id,
                kind = %f.reason,
                detail = f.detail.as_deref().unwrap_or(""),
                "failed"
            ),
        }
        result.push(outcome);

        let completed = result.completed();
        if self.progress_every == 0 || completed % self.progress_every != 0 {
            return;
        }
        let stats = ProgressStats {
            completed,
            total: result.total_submitted,
            successes: result.successes.len(),
            elapsed_secs: started.elapsed().as_secs_f64(),
        };
        tracing::info!(
            region = label,
            completed,
            total = stats.total,
            success_rate = %format!("{:.1}", stats.success_rate()),
            "progress"
        );
        if let Some(ref tx) = self.progress_tx {
            let _ = tx.try_send(stats);
        }
    }
}

/// Aborts the wrapped task when dropped. Dropping `run` aborts the `JoinSet`
/// supervisors, which in turn stops every worker they own.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn release(in_flight: &mut HashMap<String, usize>, id: &str) {
    if let Some(count) = in_flight.get_mut(id) {
        *count -= 1;
        if *count == 0 {
            in_flight.remove(id);
        }
    }
}
