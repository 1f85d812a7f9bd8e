use clap::Parser;

use crewmatch::cli::{Cli, execute_command, init_logger_from_settings, load_and_merge_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_and_merge_config(&cli)?;
    let log_handle = init_logger_from_settings(&settings)?;
    tracing::debug!(
        version = crewmatch::pkg_version(),
        command = cli.command_name(),
        "crewmatch starting"
    );

    if let Err(e) = execute_command(&cli, settings, Some(log_handle)).await {
        tracing::error!(error = %e, "Command failed");
        return Err(e);
    }

    Ok(())
}
