//! Command-line interface
//!
//! - argument parsing with clap
//! - merging CLI overrides into file configuration
//! - dispatch to one handler per subcommand

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment, LogLevel};

use crate::config::Settings;
use crate::logger::{LogLevelHandle, init_logger};

/// Load configuration files/env honoring `--config` and `--env`, then apply
/// and validate CLI overrides.
///
/// # Errors
/// Returns an error if loading, merging, or validation fails.
pub fn load_and_merge_config(cli: &Cli) -> anyhow::Result<Settings> {
    let merger = ConfigurationMerger::from_cli(cli)
        .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;

    merger
        .merge_cli_args(cli)
        .map_err(|e| anyhow::anyhow!("Configuration merge error: {e}"))
}

/// Install the global tracing subscriber described by `settings.logger`.
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<LogLevelHandle> {
    let logger_config = settings
        .logger
        .clone()
        .into_logger_config()
        .map_err(|e| anyhow::anyhow!("Logger configuration error: {e}"))?;

    init_logger(logger_config).map_err(|e| anyhow::anyhow!("Logger initialization error: {e}"))
}
