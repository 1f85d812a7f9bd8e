use std::time::Duration;

use crate::sync::SyncError;

/// Timing knobs of the adaptive scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Poll interval while the user is active
    pub active_interval: Duration,
    /// Poll interval once idle
    pub idle_interval: Duration,
    /// Inactivity after which the session counts as idle
    pub idle_timeout: Duration,
    /// Upper bound of the error backoff
    pub max_backoff_interval: Duration,
    pub pause_when_hidden: bool,
    /// A disabled scheduler never polls on its own
    pub enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            active_interval: Duration::from_secs(2),
            idle_interval: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(30),
            max_backoff_interval: Duration::from_secs(60),
            pause_when_hidden: true,
            enabled: true,
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), SyncError> {
        for (name, value) in [
            ("active_interval", self.active_interval),
            ("idle_interval", self.idle_interval),
            ("idle_timeout", self.idle_timeout),
            ("max_backoff_interval", self.max_backoff_interval),
        ] {
            if value.is_zero() {
                return Err(SyncError::InvalidConfig(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        if self.active_interval > self.idle_interval {
            return Err(SyncError::InvalidConfig(format!(
                "active_interval ({:?}) must not exceed idle_interval ({:?})",
                self.active_interval, self.idle_interval
            )));
        }

        if self.active_interval > self.max_backoff_interval {
            return Err(SyncError::InvalidConfig(format!(
                "active_interval ({:?}) must not exceed max_backoff_interval ({:?})",
                self.active_interval, self.max_backoff_interval
            )));
        }

        Ok(())
    }
}
