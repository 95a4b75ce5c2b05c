//! Batch dispatcher.
//!
//! Bounds how many fetch workers run at once, records each outcome as it
//! completes, and reports progress along the way.

mod parallel;
mod progress;

pub use parallel::{Dispatcher, DEFAULT_CONCURRENCY, DEFAULT_PROGRESS_EVERY};
pub use progress::ProgressStats;
