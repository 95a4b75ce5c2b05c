//! Progress reporting for a running batch (completed, total, success rate).
//!
//! Emitted by the dispatcher every N completions; consumers can render
//! throughput as completed / elapsed_secs.

use std::fmt;

/// Snapshot of batch progress (CLI-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    /// Items that produced an outcome so far.
    pub completed: usize,
    /// Items submitted to the batch.
    pub total: usize,
    /// Completed items that produced a token.
    pub successes: usize,
    /// Elapsed time since the batch started (seconds).
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Running success rate over completed items, in percent (0 if none completed).
    pub fn success_rate(&self) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        self.successes as f64 / self.completed as f64 * 100.0
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }

    /// Completed items per second (0 if elapsed is 0).
    pub fn items_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.completed as f64 / self.elapsed_secs
    }
}

impl fmt::Display for ProgressStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} processed ({:.0}%), {:.1}% success rate, {:.2} accounts/s",
            self.completed,
            self.total,
            self.fraction() * 100.0,
            self.success_rate(),
            self.items_per_sec()
        )
    }
}
