//! Configuration management for crewmatch
//!
//! Layered loading, lowest to highest priority:
//! 1. `default.toml`
//! 2. `{environment}.toml`
//! 3. `local.toml` (not committed)
//! 4. `CREWMATCH_*` environment variables

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use loader::ConfigLoader;
pub use settings::{
    ApiConfig, DatabaseConfig, DistanceBackend, JobsConfig, MatchingConfig, Settings,
    SyncSettings,
};
