//! Configuration validation logic
//!
//! Each section validates its own ranges and formats; `Settings::validate`
//! runs them all and reports the first failure.

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseConfig, FileSettings, JobsConfig, LoggerSettings, MAX_LOOKBACK_MINUTES, MatchingConfig,
    ServerConfig, Settings, SyncSettings,
};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request and keep-alive timeouts must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if self.keep_alive_timeout == 0 {
            return Err(ConfigError::validation(
                "server.keep_alive_timeout",
                "Keep-alive timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// # Validation Rules
    /// - URL must be a PostgreSQL connection string
    /// - Min and max connections must be greater than 0, min <= max
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Please specify a valid database connection string.",
            ));
        }

        if !(self.url.starts_with("postgres://") || self.url.starts_with("postgresql://")) {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections == 0 {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Min connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()
    }
}

impl JobsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.job_timeout == 0 {
            return Err(ConfigError::validation(
                "jobs.job_timeout",
                "Job timeout must be greater than 0 seconds.",
            ));
        }

        if !self.retry_backoff_multiplier.is_finite() || self.retry_backoff_multiplier < 1.0 {
            return Err(ConfigError::validation(
                "jobs.retry_backoff_multiplier",
                "Retry backoff multiplier must be a finite number >= 1.0.",
            ));
        }

        Ok(())
    }
}

impl MatchingConfig {
    /// Validate matching configuration
    ///
    /// The cron secret is not required here: an empty secret makes the HTTP
    /// trigger reject every request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback_minutes == 0 {
            return Err(ConfigError::validation(
                "matching.lookback_minutes",
                "Lookback window must be at least one minute.",
            ));
        }
        if self.lookback_minutes > MAX_LOOKBACK_MINUTES {
            return Err(ConfigError::ValidationError {
                field: "matching.lookback_minutes".to_string(),
                message: format!(
                    "Lookback window must not exceed {} minutes, got {}.",
                    MAX_LOOKBACK_MINUTES, self.lookback_minutes
                ),
            });
        }

        let fields = self.schedule.split_whitespace().count();
        if !(6..=7).contains(&fields) {
            return Err(ConfigError::ValidationError {
                field: "matching.schedule".to_string(),
                message: format!(
                    "Cron expression '{}' must have 6 or 7 fields (seconds first), found {}.",
                    self.schedule, fields
                ),
            });
        }

        Ok(())
    }
}

impl SyncSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::validation(
                "sync.base_url",
                "Base URL must start with http:// or https://.",
            ));
        }

        self.to_sync_config()
            .validate()
            .map_err(|e| ConfigError::ValidationError {
                field: "sync".to_string(),
                message: e.to_string(),
            })
    }
}

impl Settings {
    /// Validate all configuration settings, returning the first failure
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logger.validate()?;
        self.jobs.validate()?;
        self.matching.validate()?;
        self.sync.validate()?;
        Ok(())
    }
}
