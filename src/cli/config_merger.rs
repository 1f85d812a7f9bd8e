//! Merges CLI overrides into file-based configuration.
//!
//! Precedence, highest first: command flags, global flags, environment
//! variables, configuration files.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Settings};

/// Holds the file/env configuration and applies CLI overrides on top of it
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration honoring `--config` and `--env`.
    ///
    /// The base is not validated here; [`Self::merge_cli_args`] validates
    /// the merged result so a CLI flag can fix an invalid file value.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;

        if let Some(path) = &cli.config {
            loader = loader.with_file(path);
        }
        if let Some(env) = cli.env {
            loader = loader.with_environment(env.into());
        }

        Ok(Self::new(loader.load_unvalidated()?))
    }

    /// Returns the base configuration with CLI overrides applied and validated.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        Self::apply_global_overrides(&mut config, cli);
        if let Some(command) = &cli.command {
            Self::apply_command_overrides(&mut config, command);
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_global_overrides(config: &mut Settings, cli: &Cli) {
        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }
    }

    fn apply_command_overrides(config: &mut Settings, command: &Commands) {
        match command {
            Commands::Serve {
                host,
                port,
                log_level,
                dry_run: _,
            } => {
                if let Some(host) = host {
                    config.server.host = host.clone();
                }
                if let Some(port) = port {
                    config.server.port = *port;
                }
                if let Some(level) = log_level {
                    config.logger.level = level.as_str().to_string();
                }
            }
            Commands::Watch {
                base_url: Some(base_url),
                ..
            } => {
                config.sync.base_url = base_url.clone();
            }
            Commands::Watch { base_url: None, .. }
            | Commands::Migrate { .. }
            | Commands::Match { .. } => {}
        }
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}
