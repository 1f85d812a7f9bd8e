//! Migrate command handler

use crate::config::Settings;
use crate::db::{pending_migrations, revert_migrations, run_pending_migrations};
use crate::error::AppResult;

/// Handler for the migrate command
pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Apply pending migrations, list them (`dry_run`), or revert `rollback` steps.
    ///
    /// # Errors
    /// - invalid database configuration
    /// - connection or migration failures
    /// - more rollback steps than applied migrations
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        self.config.database.validate()?;
        let url = self.config.database.url.as_str();

        if dry_run {
            let pending = pending_migrations(url).await?;
            if pending.is_empty() {
                println!("✓ No pending migrations, database is up to date");
            } else {
                println!("Found {} pending migration(s):", pending.len());
                for name in &pending {
                    println!("  - {name}");
                }
                println!("\nRun without --dry-run to apply them");
            }
            return Ok(());
        }

        if let Some(steps) = rollback {
            println!("Rolling back {steps} migration(s)...");
            let reverted = revert_migrations(url, steps).await?;
            for version in &reverted {
                println!("  - {version}");
            }
            println!("✓ Rolled back {} migration(s)", reverted.len());
            return Ok(());
        }

        println!("Running database migrations...");
        let applied = run_pending_migrations(url).await?;
        if applied.is_empty() {
            println!("✓ No migrations to apply, database is up to date");
        } else {
            println!("✓ Applied {} migration(s):", applied.len());
            for version in &applied {
                println!("  - {version}");
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
