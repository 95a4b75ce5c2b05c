use std::fmt;
use std::time::Duration;

/// Classification of a failed attempt (or a terminal item failure).
///
/// Every fetch error is mapped into one of these so callers can branch on
/// kind instead of matching message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Endpoint answered 429.
    RateLimited,
    /// Endpoint answered 5xx.
    ServerError,
    /// Request exceeded the per-request timeout.
    Timeout,
    /// Transport failure (DNS, connect, reset) or other non-2xx status.
    NetworkError,
    /// 2xx response without a usable token.
    EmptyResult,
    /// Anything not covered above (undecodable body, worker panic).
    UnknownError,
    /// Attempt budget ran out without a classified terminal failure.
    MaxRetriesExceeded,
    /// Stopped by a cancel request.
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::RateLimited => "rate limited",
            ErrorKind::ServerError => "server error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::NetworkError => "network error",
            ErrorKind::EmptyResult => "no token",
            ErrorKind::UnknownError => "unknown error",
            ErrorKind::MaxRetriesExceeded => "max retries exceeded",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Decision returned by the backoff policy for one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub should_retry: bool,
    /// Extra wait before the next attempt (on top of baseline pacing).
    pub wait: Duration,
}

impl RetryDecision {
    pub const STOP: RetryDecision = RetryDecision {
        should_retry: false,
        wait: Duration::ZERO,
    };
}

/// Per-kind backoff with a fixed attempt budget and baseline pacing.
///
/// All waits are expressed in multiples of `unit` (one second in production),
/// so the whole schedule can be scaled down uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Maximum number of attempts per item (including the first).
    pub max_attempts: u32,
    /// Flat delay before every network call, in units.
    pub pacing_units: u32,
    /// Length of one time unit.
    pub unit: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            pacing_units: 2,
            unit: Duration::from_secs(1),
        }
    }
}

impl BackoffPolicy {
    /// Baseline delay applied before each attempt, regardless of outcome.
    pub fn pacing(&self) -> Duration {
        self.unit.saturating_mul(self.pacing_units)
    }

    /// Decide whether attempt `attempt` (0-based) that failed with `kind`
    /// gets another try, and how long to wait first.
    pub fn decide(&self, kind: ErrorKind, attempt: u32) -> RetryDecision {
        if attempt.saturating_add(1) >= self.max_attempts {
            return RetryDecision::STOP;
        }

        let step = attempt.saturating_add(1);
        let units = match kind {
            // 5, 10, 20, 40, ...
            ErrorKind::RateLimited => {
                let doubling = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                5u32.saturating_mul(doubling)
            }
            ErrorKind::ServerError => 3u32.saturating_mul(step),
            ErrorKind::Timeout => 5u32.saturating_mul(step),
            ErrorKind::NetworkError | ErrorKind::UnknownError => 2u32.saturating_mul(step),
            ErrorKind::EmptyResult => 0,
            ErrorKind::MaxRetriesExceeded | ErrorKind::Cancelled => return RetryDecision::STOP,
        };

        RetryDecision {
            should_retry: true,
            wait: self.unit.saturating_mul(units),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roomy() -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: 10,
            ..BackoffPolicy::default()
        }
    }

    fn wait_secs(p: &BackoffPolicy, kind: ErrorKind, attempt: u32) -> u64 {
        let d = p.decide(kind, attempt);
        assert!(d.should_retry, "expected retry for {kind:?} at {attempt}");
        d.wait.as_secs()
    }

    #[test]
    fn rate_limited_is_exponential() {
        let p = roomy();
        let waits: Vec<u64> = (0..4).map(|a| wait_secs(&p, ErrorKind::RateLimited, a)).collect();
        assert_eq!(waits, vec![5, 10, 20, 40]);
    }

    #[test]
    fn linear_kinds() {
        let p = roomy();
        assert_eq!(wait_secs(&p, ErrorKind::ServerError, 0), 3);
        assert_eq!(wait_secs(&p, ErrorKind::ServerError, 2), 9);
        assert_eq!(wait_secs(&p, ErrorKind::Timeout, 1), 10);
        assert_eq!(wait_secs(&p, ErrorKind::NetworkError, 0), 2);
        assert_eq!(wait_secs(&p, ErrorKind::UnknownError, 3), 8);
    }

    #[test]
    fn empty_result_retries_immediately() {
        let p = roomy();
        let d = p.decide(ErrorKind::EmptyResult, 0);
        assert!(d.should_retry);
        assert_eq!(d.wait, Duration::ZERO);
    }

    #[test]
    fn respects_max_attempts() {
        let p = BackoffPolicy::default();
        assert!(p.decide(ErrorKind::Timeout, 0).should_retry);
        assert_eq!(p.decide(ErrorKind::Timeout, 1), RetryDecision::STOP);
        assert_eq!(p.decide(ErrorKind::RateLimited, 5), RetryDecision::STOP);
    }

    #[test]
    fn terminal_kinds_never_retry() {
        let p = roomy();
        assert_eq!(p.decide(ErrorKind::Cancelled, 0), RetryDecision::STOP);
        assert_eq!(p.decide(ErrorKind::MaxRetriesExceeded, 0), RetryDecision::STOP);
    }

    #[test]
    fn huge_attempt_saturates() {
        let p = BackoffPolicy {
            max_attempts: u32::MAX,
            ..BackoffPolicy::default()
        };
        let d = p.decide(ErrorKind::RateLimited, 40);
        assert!(d.should_retry);
        assert!(d.wait >= Duration::from_secs(u32::MAX as u64));
    }

    #[test]
    fn unit_scales_everything() {
        let p = BackoffPolicy {
            unit: Duration::from_millis(10),
            ..BackoffPolicy::default()
        };
        assert_eq!(p.pacing(), Duration::from_millis(20));
        assert_eq!(p.decide(ErrorKind::RateLimited, 0).wait, Duration::from_millis(50));
    }

    #[test]
    fn kinds_render_for_reports() {
        assert_eq!(ErrorKind::RateLimited.to_string(), "rate limited");
        assert_eq!(ErrorKind::EmptyResult.to_string(), "no token");
        assert_eq!(ErrorKind::Cancelled.to_string(), "cancelled");
    }
}
