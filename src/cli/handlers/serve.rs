//! Serve command handler

use crate::config::Settings;
use crate::error::AppResult;
use crate::server::Server;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Run the server, or only validate the configuration when `dry_run`.
    pub async fn execute(self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            self.validate_only()?;
            return Ok(());
        }

        Server::new(self.config).run().await
    }

    /// Validate configuration without binding or connecting
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!("✓ Database URL is configured");
        if self.config.jobs.enabled {
            println!(
                "✓ Proximity alerts scheduled: {}",
                self.config.matching.schedule
            );
        } else {
            println!("✓ Job scheduler disabled");
        }
        if self.config.matching.cron_secret.is_empty() {
            println!("! matching.cron_secret is empty, the cron endpoint will reject every call");
        }
        if self.config.api.service_token.is_empty() {
            println!("! api.service_token is empty, the notification API will reject every call");
        }

        println!("Dry run completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
