//! crewmatch
//!
//! Proximity job alerts for tradespeople: a scheduled matcher that pairs new
//! job postings with nearby workers' alerts, the HTTP API serving the
//! resulting notifications, and an adaptive polling client for them.

use shadow_rs::shadow;
shadow!(build);

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod logger;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod server;
pub mod services;
pub mod state;
pub mod sync;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
