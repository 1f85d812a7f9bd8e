//! Adaptive sync scheduler
//!
//! Periodically refreshes data from a [`SyncSource`], polling fast while the
//! user is active, slower when idle, backing off exponentially on errors and
//! stopping entirely while paused or hidden.

mod config;
mod error;
mod machine;
mod runtime;

pub use config::SyncConfig;
pub use error::SyncError;
pub use machine::{Effects, SyncEvent, SyncMachine, SyncStatus, backoff_interval};
pub use runtime::{AdaptiveSync, SyncSource, VisibilitySignal};
