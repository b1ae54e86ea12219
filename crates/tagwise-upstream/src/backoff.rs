//! Retry delay policy for upstream failures

use crate::error::{classify, ErrorKind, UpstreamError};
use std::time::Duration;

/// Attempt numbers above this are treated as this
pub const MAX_ATTEMPT: u32 = 20;

/// Largest exponent applied to a tier's base delay
pub const MAX_SHIFT: u32 = 10;

/// Exponential delay `base * 2^attempt`, capped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffTier {
    pub base: Duration,
    pub cap: Duration,
}

impl BackoffTier {
    pub const fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.min(MAX_ATTEMPT).min(MAX_SHIFT);
        self.base.saturating_mul(1u32 << shift).min(self.cap)
    }
}

/// Minimum wait before retrying an upstream call.
///
/// Pure: it never sleeps. The caller owns the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub rate_limit: BackoffTier,
    pub quota: BackoffTier,
    pub other: BackoffTier,
}

impl BackoffPolicy {
    pub fn new() -> Self {
        Self {
            rate_limit: BackoffTier::new(Duration::from_secs(60), Duration::from_secs(15 * 60)),
            quota: BackoffTier::new(
                Duration::from_secs(60 * 60),
                Duration::from_secs(24 * 60 * 60),
            ),
            other: BackoffTier::new(Duration::from_secs(5), Duration::from_secs(5 * 60)),
        }
    }

    /// Delay before attempt `attempt + 1`, given the error of attempt `attempt`
    pub fn delay(&self, err: &UpstreamError, attempt: u32) -> Duration {
        self.delay_for(classify(err), attempt, err.retry_after())
    }

    /// Delay for an already classified error. A rate-limit hint longer than the
    /// computed delay wins.
    pub fn delay_for(
        &self,
        kind: ErrorKind,
        attempt: u32,
        retry_after: Option<Duration>,
    ) -> Duration {
        match kind {
            ErrorKind::PermanentQuota => self.quota.delay(attempt),
            ErrorKind::TransientRateLimit => {
                let computed = self.rate_limit.delay(attempt);
                retry_after.map_or(computed, |hint| hint.max(computed))
            }
            ErrorKind::Other => self.other.delay(attempt),
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new()
    }
}
