use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use serde::Serialize;

use crate::sync::SyncConfig;

/// Inputs that move the scheduler between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    MarkActive,
    IdleTimeout,
    Pause,
    Resume,
    Hidden,
    Visible,
    FetchStarted,
    FetchSucceeded,
    FetchFailed,
}

/// Observable scheduler state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub is_idle: bool,
    pub is_paused: bool,
    pub is_fetching: bool,
    pub error_count: u32,
    pub last_sync_time: Option<Timestamp>,
    pub next_sync_time: Option<Timestamp>,
    /// `None` while no automatic polling is scheduled
    pub current_interval: Option<Duration>,
}

/// What the driver has to do after an event was applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effects {
    /// Re-arm the poll timer from `current_interval`
    pub rearm_tick: bool,
    /// Restart the inactivity countdown
    pub reset_idle: bool,
}

/// `base * 2^error_count`, capped at `max`.
pub fn backoff_interval(base: Duration, max: Duration, error_count: u32) -> Duration {
    2u32.checked_pow(error_count)
        .and_then(|factor| base.checked_mul(factor))
        .map_or(max, |interval| interval.min(max))
}

/// Pure state machine behind [`crate::sync::AdaptiveSync`]. Holds no timers;
/// the caller supplies the clock and acts on the returned [`Effects`].
#[derive(Debug, Clone)]
pub struct SyncMachine {
    config: SyncConfig,
    status: SyncStatus,
}

impl SyncMachine {
    pub fn new(config: SyncConfig, now: Timestamp) -> Self {
        let mut machine = Self {
            config,
            status: SyncStatus::default(),
        };
        machine.status.current_interval = machine.interval();
        // first poll is due immediately
        machine.status.next_sync_time = machine.status.current_interval.map(|_| now);
        machine
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Whether the scheduler should poll on its own right now
    pub fn polling(&self) -> bool {
        self.status.current_interval.is_some()
    }

    fn interval(&self) -> Option<Duration> {
        if !self.config.enabled || self.status.is_paused {
            return None;
        }

        if self.status.error_count > 0 {
            return Some(backoff_interval(
                self.config.active_interval,
                self.config.max_backoff_interval,
                self.status.error_count,
            ));
        }

        if self.status.is_idle {
            Some(self.config.idle_interval)
        } else {
            Some(self.config.active_interval)
        }
    }

    pub fn apply(&mut self, event: SyncEvent, now: Timestamp) -> Effects {
        let before = self.status.current_interval;
        let mut effects = Effects::default();
        let mut fetch_event = false;

        match event {
            SyncEvent::MarkActive => {
                self.status.is_idle = false;
                effects.reset_idle = true;
            }
            SyncEvent::IdleTimeout => self.status.is_idle = true,
            SyncEvent::Pause => self.status.is_paused = true,
            SyncEvent::Resume => {
                self.status.is_paused = false;
                self.status.is_idle = false;
                effects.reset_idle = true;
            }
            SyncEvent::Hidden => {
                if self.config.pause_when_hidden {
                    self.status.is_paused = true;
                }
            }
            SyncEvent::Visible => {
                if self.config.pause_when_hidden {
                    self.status.is_paused = false;
                    self.status.is_idle = false;
                    effects.reset_idle = true;
                }
            }
            SyncEvent::FetchStarted => {
                self.status.is_fetching = true;
                fetch_event = true;
            }
            SyncEvent::FetchSucceeded => {
                self.status.is_fetching = false;
                self.status.error_count = 0;
                self.status.last_sync_time = Some(now);
                fetch_event = true;
            }
            SyncEvent::FetchFailed => {
                self.status.is_fetching = false;
                self.status.error_count = self.status.error_count.saturating_add(1);
                fetch_event = true;
            }
        }

        let after = self.interval();
        self.status.current_interval = after;

        if fetch_event || before != after {
            effects.rearm_tick = true;
            self.status.next_sync_time = after
                .and_then(|interval| SignedDuration::try_from(interval).ok())
                .and_then(|interval| now.checked_add(interval).ok());
        }

        effects
    }
}
