//! Batch summary: success rate and a bounded failure listing.

use std::fmt;

use crate::batch::{BatchResult, Failure};

/// Maximum number of failures listed individually in a report.
pub const MAX_LISTED_FAILURES: usize = 20;

/// Final summary of one region's batch. Rendering is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub region: String,
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    /// Percentage of submitted items that produced a token.
    pub success_rate: f64,
    /// First `MAX_LISTED_FAILURES` failures, in completion order.
    pub listed_failures: Vec<Failure>,
    /// Failures not listed.
    pub omitted_failures: usize,
}

/// `part / total * 100`, or 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

pub fn summarize(result: &BatchResult, region: &str) -> Report {
    let listed_failures: Vec<Failure> = result
        .failures
        .iter()
        .take(MAX_LISTED_FAILURES)
        .cloned()
        .collect();
    Report {
        region: region.to_string(),
        total: result.total_submitted,
        successes: result.successes.len(),
        failures: result.failures.len(),
        success_rate: percent(result.successes.len(), result.total_submitted),
        omitted_failures: result.failures.len() - listed_failures.len(),
        listed_failures,
    }
}

impl Report {
    pub fn failure_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        100.0 - self.success_rate
    }

    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} FINAL SUMMARY ===", self.region)?;
        writeln!(f, "Total processed: {}", self.total)?;
        writeln!(f, "Successful: {} ({:.1}%)", self.successes, self.success_rate)?;
        write!(f, "Failed: {} ({:.1}%)", self.failures, self.failure_rate())?;
        if self.listed_failures.is_empty() {
            return Ok(());
        }
        write!(f, "\n\nFailed UIDs for {}:", self.region)?;
        for (i, failure) in self.listed_failures.iter().enumerate() {
            write!(f, "\n  {}. UID {}: {}", i + 1, failure.id, failure.reason)?;
            if let Some(detail) = &failure.detail {
                write!(f, " ({})", detail)?;
            }
        }
        if self.omitted_failures > 0 {
            write!(f, "\n  ... and {} more failed UIDs", self.omitted_failures)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Outcome;
    use crate::retry::ErrorKind;

    fn batch(successes: usize, failures: usize) -> BatchResult {
        let mut r = BatchResult::new(successes + failures);
        for i in 0..failures {
            r.push(Outcome::failure(format!("f{}", i), ErrorKind::Timeout, None));
        }
        for i in 0..successes {
            r.push(Outcome::success(format!("s{}", i), "tok"));
        }
        r
    }

    #[test]
    fn eighty_percent() {
        let report = summarize(&batch(8, 2), "BD");
        assert!((report.success_rate - 80.0).abs() < 1e-9);
        assert!((report.failure_rate() - 20.0).abs() < 1e-9);
        assert_eq!(report.failures, 2);
        assert_eq!(report.omitted_failures, 0);
    }

    #[test]
    fn empty_batch_has_zero_rate() {
        let report = summarize(&BatchResult::new(0), "BD");
        assert_eq!(report.success_rate, 0.0);
        assert_eq!(report.failure_rate(), 0.0);
        assert!(report.is_clean());
    }

    #[test]
    fn failure_listing_is_truncated() {
        let report = summarize(&batch(0, 25), "IND");
        assert_eq!(report.listed_failures.len(), 20);
        assert_eq!(report.omitted_failures, 5);
        assert_eq!(report.listed_failures[0].id, "f0");
        assert_eq!(report.listed_failures[19].id, "f19");

        let text = report.to_string();
        assert!(text.contains("  20. UID f19: timeout"));
        assert!(!text.contains("UID f20"));
        assert!(text.ends_with("... and 5 more failed UIDs"));
    }

    #[test]
    fn exactly_twenty_has_no_omission_note() {
        let text = summarize(&batch(1, 20), "BR").to_string();
        assert!(!text.contains("more failed"));
    }

    #[test]
    fn rendering_includes_detail() {
        let mut r = BatchResult::new(1);
        r.push(Outcome::failure("7", ErrorKind::ServerError, Some("HTTP 502".into())));
        let text = summarize(&r, "BR").to_string();
        assert!(text.starts_with("=== BR FINAL SUMMARY ==="));
        assert!(text.contains("Successful: 0 (0.0%)"));
        assert!(text.contains("1. UID 7: server error (HTTP 502)"));
    }
}
