//! Dispatches a parsed command to its handler.

use super::handlers::{
    MatchCommandHandler, MigrateCommandHandler, ServeCommandHandler, WatchCommandHandler,
};
use super::parser::{Cli, Commands};
use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::logger::LogLevelHandle;

/// Run the command selected by `cli`; no subcommand means `serve`.
///
/// `log_handle` lets long-running commands change the log level.
pub async fn execute_command(
    cli: &Cli,
    settings: Settings,
    log_handle: Option<LogLevelHandle>,
) -> anyhow::Result<()> {
    validate_command_args(cli)?;

    tracing::debug!(command = cli.command_name(), "Executing command");

    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings).execute(*dry_run).await
        }
        None => ServeCommandHandler::new(settings).execute(false).await,
        Some(Commands::Migrate { dry_run, rollback }) => {
            MigrateCommandHandler::new(settings)
                .execute(*dry_run, *rollback)
                .await?;
            Ok(())
        }
        Some(Commands::Match { at }) => {
            MatchCommandHandler::new(settings).execute(*at).await?;
            Ok(())
        }
        Some(Commands::Watch { user_id, .. }) => {
            WatchCommandHandler::new(settings, log_handle)
                .execute(*user_id)
                .await?;
            Ok(())
        }
    }
}

/// Reject argument combinations before any handler runs
fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    if let Some(Commands::Serve {
        host: Some(host),
        port: Some(port),
        ..
    }) = &cli.command
        && *port < 1024
        && host == "0.0.0.0"
    {
        tracing::warn!(port, "Binding to 0.0.0.0 on a privileged port usually requires root");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/crewmatch".to_string();
        config
    }

    #[tokio::test]
    async fn test_execute_serve_dry_run() {
        let cli = Cli::try_parse_from(["crewmatch", "serve", "--dry-run"]).unwrap();

        let result = execute_command(&cli, valid_config(), None).await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_command_args() {
        let cli = Cli::try_parse_from(["crewmatch", "serve", "--port", "8080"]).unwrap();
        assert!(validate_command_args(&cli).is_ok());
    }

    #[test]
    fn test_validate_conflicting_args() {
        let cli = Cli {
            command: Some(Commands::Migrate {
                dry_run: true,
                rollback: Some(5),
            }),
            config: None,
            env: None,
            verbose: false,
            quiet: false,
        };

        let err = validate_command_args(&cli).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "cli_arguments"));
    }

    #[tokio::test]
    async fn test_match_with_invalid_database_url_fails() {
        let cli = Cli::try_parse_from(["crewmatch", "match"]).unwrap();
        let mut config = valid_config();
        config.database.url = String::new();

        let result = execute_command(&cli, config, None).await;
        assert!(result.is_err());
    }
}
