use crate::ai::RemoteError;
use std::time::Duration;

/// Policy parameters for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts for one request, the first one included.
    pub max_attempts: u32,
    /// Delay between two attempts.
    pub retry_delay: Duration,
    /// Additional delay after a quota exhaustion error.
    pub quota_delay: Duration,
}

impl RetryPolicy {
    /// Creates a new [`RetryPolicy`].
    pub const fn new(max_attempts: u32, retry_delay: Duration, quota_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay,
            quota_delay,
        }
    }
}

/// Decision made by the retry policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub should_retry: bool,
    /// Quota backoff to sleep first. Applies even when no retry follows.
    pub quota_backoff: Option<Duration>,
    /// Regular delay before the next attempt; zero when giving up.
    pub delay: Duration,
}

impl RetryDecision {
    const fn give_up(quota_backoff: Option<Duration>) -> Self {
        Self {
            should_retry: false,
            quota_backoff,
            delay: Duration::ZERO,
        }
    }
}

/// Calculates what to do after attempt number `attempts_made` (1-based) failed
/// with `error`.
///
/// A quota error compounds: the quota backoff is followed by the regular retry
/// delay.
pub fn evaluate_retry(error: &RemoteError, policy: RetryPolicy, attempts_made: u32) -> RetryDecision {
    if error.is_fatal() {
        return RetryDecision::give_up(None);
    }

    let quota_backoff = error.is_quota_exhausted().then_some(policy.quota_delay);

    if attempts_made >= policy.max_attempts {
        return RetryDecision::give_up(quota_backoff);
    }

    RetryDecision {
        should_retry: true,
        quota_backoff,
        delay: policy.retry_delay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: RetryPolicy = RetryPolicy {
        max_attempts: 10,
        retry_delay: Duration::from_secs(1),
        quota_delay: Duration::from_secs(10),
    };

    fn network() -> RemoteError {
        RemoteError::Network("connection reset".into())
    }

    fn quota() -> RemoteError {
        RemoteError::Http {
            status: 429,
            message: "Resource has been exhausted (e.g. check quota).".into(),
            quota_failure: true,
        }
    }

    #[test]
    fn transient_error_uses_fixed_delay() {
        let first = evaluate_retry(&network(), POLICY, 1);
        let ninth = evaluate_retry(&network(), POLICY, 9);

        assert!(first.should_retry);
        assert_eq!(first.delay, Duration::from_secs(1));
        assert_eq!(first.quota_backoff, None);
        assert_eq!(ninth.delay, Duration::from_secs(1));
    }

    #[test]
    fn quota_error_adds_backoff_on_top_of_delay() {
        let decision = evaluate_retry(&quota(), POLICY, 1);

        assert!(decision.should_retry);
        assert_eq!(decision.quota_backoff, Some(Duration::from_secs(10)));
        assert_eq!(decision.delay, Duration::from_secs(1));
    }

    #[test]
    fn gives_up_after_last_attempt() {
        let decision = evaluate_retry(&network(), POLICY, 10);
        assert!(!decision.should_retry);
        assert_eq!(decision.delay, Duration::ZERO);
    }

    #[test]
    fn quota_backoff_still_applies_on_last_attempt() {
        let decision = evaluate_retry(&quota(), POLICY, 10);
        assert!(!decision.should_retry);
        assert_eq!(decision.quota_backoff, Some(Duration::from_secs(10)));
    }

    #[test]
    fn fatal_errors_fail_fast() {
        let decision = evaluate_retry(&RemoteError::MissingApiKey, POLICY, 1);
        assert_eq!(decision, RetryDecision::give_up(None));
    }
}
