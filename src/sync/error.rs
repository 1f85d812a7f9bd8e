use std::sync::Arc;

use thiserror::Error;

/// Errors surfaced by the sync scheduler. Cloneable so one fetch outcome can
/// be handed to every coalesced waiter.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("sync fetch failed: {0:#}")]
    Fetch(Arc<anyhow::Error>),

    /// The fetch task panicked or was cancelled before producing a result.
    #[error("sync fetch aborted before completing")]
    Aborted,

    /// The driver has shut down.
    #[error("sync scheduler is stopped")]
    Stopped,

    #[error("invalid sync configuration: {0}")]
    InvalidConfig(String),
}
