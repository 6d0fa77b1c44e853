//! Refresh cadence configuration
//!
//! Bounds are fixed: out-of-range intervals fail construction instead of
//! being clamped.

use std::time::Duration;

use crate::error::{Error, Result};

/// Normal cadence when the last cycle succeeded.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Cadence after a failed fetch or callback.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Window before expiry in which a new token is fetched. The platform issues
/// a new token once fewer than 10 minutes remain and keeps the old one valid
/// until its own expiry, so fetching early never invalidates a token in use.
pub const GUARD_BAND: Duration = Duration::from_secs(10 * 60);

const MIN_UPDATE_INTERVAL: Duration = Duration::from_secs(60);
const MAX_UPDATE_INTERVAL: Duration = Duration::from_secs(10 * 60);
const MIN_RETRY_INTERVAL: Duration = Duration::from_secs(1);
const MAX_RETRY_INTERVAL: Duration = Duration::from_secs(60);

/// Validated update/retry intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshConfig {
    update_interval: Duration,
    retry_interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl RefreshConfig {
    /// Build a config, rejecting intervals outside
    /// `update ∈ [1min, 10min]` and `retry ∈ [1s, 1min]`.
    pub fn new(update_interval: Duration, retry_interval: Duration) -> Result<Self> {
        Self::default()
            .with_update_interval(update_interval)?
            .with_retry_interval(retry_interval)
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Result<Self> {
        if interval < MIN_UPDATE_INTERVAL {
            return Err(Error::ConfigInvalid(format!(
                "update interval must be at least 1 minute, got {interval:?}"
            )));
        }
        if interval > MAX_UPDATE_INTERVAL {
            return Err(Error::ConfigInvalid(format!(
                "update interval must be at most 10 minutes, got {interval:?}"
            )));
        }
        self.update_interval = interval;
        Ok(self)
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Result<Self> {
        if interval < MIN_RETRY_INTERVAL {
            return Err(Error::ConfigInvalid(format!(
                "retry interval must be at least 1 second, got {interval:?}"
            )));
        }
        if interval > MAX_RETRY_INTERVAL {
            return Err(Error::ConfigInvalid(format!(
                "retry interval must be at most 1 minute, got {interval:?}"
            )));
        }
        self.retry_interval = interval;
        Ok(self)
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }
}
