//! Configuration settings structures for crewmatch
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};
use crate::sync::SyncConfig;

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "crewmatch".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_keep_alive_timeout() -> u64 {
    75
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/crewmatch.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Keep-alive timeout in seconds
    #[serde(default = "default_keep_alive_timeout")]
    pub keep_alive_timeout: u64,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            keep_alive_timeout: default_keep_alive_timeout(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Diesel database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Run pending migrations when the server starts
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

/// Logger configuration as it appears in the config files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime `LoggerConfig`
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file = self.file.into_file_config()?;

        LoggerConfig::new(console, file, self.level).map_err(|e| ConfigError::ValidationError {
            field: "logger".to_string(),
            message: e.to_string(),
        })
    }
}

impl FileSettings {
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: e.to_string(),
            })?;

        FileConfig::new(self.enabled, PathBuf::from(self.path), self.append, format).map_err(
            |e| ConfigError::ValidationError {
                field: "logger.file".to_string(),
                message: e.to_string(),
            },
        )
    }
}

// ============================================================================
// Jobs Configuration
// ============================================================================

fn default_job_timeout() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    60
}

fn default_retry_backoff() -> f64 {
    2.0
}

/// In-process job scheduling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Whether the cron scheduler starts with the server
    #[serde(default)]
    pub enabled: bool,

    /// Job execution timeout in seconds
    #[serde(default = "default_job_timeout")]
    pub job_timeout: u64,

    /// Maximum number of retry attempts for retryable failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry delay in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,

    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_multiplier: f64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            job_timeout: default_job_timeout(),
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            retry_backoff_multiplier: default_retry_backoff(),
        }
    }
}

// ============================================================================
// Matching Configuration
// ============================================================================

/// Longest accepted lookback window, one week
pub const MAX_LOOKBACK_MINUTES: u64 = 7 * 24 * 60;

fn default_lookback_minutes() -> u64 {
    10
}

fn default_match_schedule() -> String {
    // sec min hour day month weekday
    "0 */5 * * * *".to_string()
}

/// How the matcher measures the distance between two points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceBackend {
    /// `ST_Distance` on geography values inside PostgreSQL
    #[default]
    Postgis,
    /// Great-circle distance computed in process
    Haversine,
}

/// Proximity matching configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Postings created within this many minutes are candidates
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: u64,

    /// Cron expression for the in-process scheduler
    #[serde(default = "default_match_schedule")]
    pub schedule: String,

    /// Bearer secret for the cron HTTP trigger. Empty rejects every call.
    #[serde(default)]
    pub cron_secret: String,

    #[serde(default)]
    pub distance_backend: DistanceBackend,
}

impl MatchingConfig {
    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_minutes.saturating_mul(60))
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            lookback_minutes: default_lookback_minutes(),
            schedule: default_match_schedule(),
            cron_secret: String::new(),
            distance_backend: DistanceBackend::default(),
        }
    }
}

// ============================================================================
// API Configuration
// ============================================================================

/// Service-to-service API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// Bearer token for the notification routes. Empty rejects every call.
    #[serde(default)]
    pub service_token: String,
}

// ============================================================================
// Sync Configuration
// ============================================================================

fn default_active_interval_ms() -> u64 {
    2_000
}

fn default_idle_interval_ms() -> u64 {
    10_000
}

fn default_idle_timeout_ms() -> u64 {
    30_000
}

fn default_max_backoff_interval_ms() -> u64 {
    60_000
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

/// Adaptive sync settings used by `crewmatch watch`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_active_interval_ms")]
    pub active_interval_ms: u64,

    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_max_backoff_interval_ms")]
    pub max_backoff_interval_ms: u64,

    #[serde(default = "default_true")]
    pub pause_when_hidden: bool,

    /// Server the watcher polls
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl SyncSettings {
    pub fn to_sync_config(&self) -> SyncConfig {
        SyncConfig {
            active_interval: Duration::from_millis(self.active_interval_ms),
            idle_interval: Duration::from_millis(self.idle_interval_ms),
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
            max_backoff_interval: Duration::from_millis(self.max_backoff_interval_ms),
            pause_when_hidden: self.pause_when_hidden,
            enabled: self.enabled,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            active_interval_ms: default_active_interval_ms(),
            idle_interval_ms: default_idle_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            max_backoff_interval_ms: default_max_backoff_interval_ms(),
            pause_when_hidden: default_true(),
            base_url: default_base_url(),
        }
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub jobs: JobsConfig,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub sync: SyncSettings,
}
