//! Configuration loader for crewmatch
//!
//! `ConfigLoader` assembles `Settings` from files and environment variables
//! with the precedence described in the module docs.

use std::path::{Path, PathBuf};

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "CREWMATCH_CONFIG_DIR";

const CONFIG_FILE_ENV: &str = "CREWMATCH_CONFIG_FILE";

const DEFAULT_CONFIG_DIR: &str = "config";

const ENV_PREFIX: &str = "CREWMATCH";

/// Separator for nested keys: `CREWMATCH_MATCHING__CRON_SECRET` -> `matching.cron_secret`
const ENV_SEPARATOR: &str = "__";

/// Configuration loader that handles layered configuration loading
#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// When set, layered loading is skipped and only this file is read
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a loader from `CREWMATCH_CONFIG_DIR`, `CREWMATCH_CONFIG_FILE`
    /// and `CREWMATCH_APP_ENV`.
    ///
    /// # Errors
    ///
    /// Returns an error if both the directory and the file variable are set.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));

        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_file.is_some() && std::env::var(CONFIG_DIR_ENV).is_ok() {
            return Err(ConfigError::mutual_exclusivity(
                "CREWMATCH_CONFIG_DIR and CREWMATCH_CONFIG_FILE cannot both be set. \
                 Use CREWMATCH_CONFIG_DIR for layered configuration or \
                 CREWMATCH_CONFIG_FILE for a single configuration file.",
            ));
        }

        Ok(Self {
            config_dir,
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Read exactly one file instead of the layered directory.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Override the environment detected from `CREWMATCH_APP_ENV`.
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load, deserialize and validate the settings.
    ///
    /// # Errors
    ///
    /// Fails when `default.toml` is missing in layered mode, when a source
    /// cannot be parsed, or when validation rejects a value.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let settings = self.load_unvalidated()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load without running `Settings::validate`, for callers that apply
    /// overrides first and validate the merged result.
    pub fn load_unvalidated(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = if let Some(ref config_file) = self.config_file {
            Self::add_file_source(builder, config_file, true)?
        } else {
            self.build_layered_config(builder)?
        };

        Self::add_env_source(builder)
            .build()
            .map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let default_path = self.config_dir.join("default.toml");
        let builder = Self::add_file_source(builder, &default_path, true)?;

        let env_path = self
            .config_dir
            .join(format!("{}.toml", self.environment.as_str()));
        let builder = Self::add_file_source(builder, &env_path, false)?;

        let local_path = self.config_dir.join("local.toml");
        Self::add_file_source(builder, &local_path, false)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        Ok(builder.add_source(
            File::new(path.to_str().unwrap_or_default(), FileFormat::Toml).required(required),
        ))
    }

    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: None,
            environment: AppEnvironment::default(),
        })
    }
}
