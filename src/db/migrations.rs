//! Embedded migration runner.
//!
//! `MigrationHarness` only works on synchronous connections, so every
//! operation opens a dedicated `PgConnection` on the blocking pool.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::MigrationHarness;

use crate::db::MIGRATIONS;
use crate::error::{AppError, AppResult};

fn migration_error(operation: &str, e: impl std::fmt::Display) -> AppError {
    AppError::Database {
        operation: operation.to_string(),
        source: anyhow::anyhow!("{e}"),
    }
}

async fn with_connection<T, F>(database_url: &str, operation: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> AppResult<T> + Send + 'static,
{
    let database_url = database_url.to_string();

    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url)
            .map_err(|e| migration_error("establish migration connection", e))?;
        operation(&mut conn)
    })
    .await
    .map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })?
}

/// Names of migrations not yet applied
pub async fn pending_migrations(database_url: &str) -> AppResult<Vec<String>> {
    with_connection(database_url, |conn| {
        let pending = conn
            .pending_migrations(MIGRATIONS)
            .map_err(|e| migration_error("check pending migrations", e))?;
        Ok(pending.iter().map(|m| m.name().to_string()).collect())
    })
    .await
}

/// Apply every pending migration, returning the applied versions
pub async fn run_pending_migrations(database_url: &str) -> AppResult<Vec<String>> {
    with_connection(database_url, |conn| {
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| migration_error("run pending migrations", e))?;
        Ok(applied.iter().map(ToString::to_string).collect())
    })
    .await
}

/// Revert the `steps` most recent migrations, returning the reverted versions
pub async fn revert_migrations(database_url: &str, steps: u32) -> AppResult<Vec<String>> {
    if steps == 0 {
        return Err(AppError::Validation {
            field: "rollback_steps".to_string(),
            reason: "Number of rollback steps must be greater than 0".to_string(),
        });
    }

    with_connection(database_url, move |conn| {
        let applied = conn
            .applied_migrations()
            .map_err(|e| migration_error("list applied migrations", e))?;

        if applied.len() < steps as usize {
            return Err(AppError::Validation {
                field: "rollback_steps".to_string(),
                reason: format!(
                    "Cannot roll back {} migrations, only {} applied",
                    steps,
                    applied.len()
                ),
            });
        }

        (0..steps)
            .map(|_| {
                conn.revert_last_migration(MIGRATIONS)
                    .map(|version| version.to_string())
                    .map_err(|e| migration_error("revert migration", e))
            })
            .collect()
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_rollback_steps_rejected_before_connecting() {
        let err = revert_migrations("postgres://crewmatch@127.0.0.1:1/crewmatch", 0)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Validation { ref field, .. } if field == "rollback_steps"
        ));
    }

    #[tokio::test]
    async fn test_unreachable_database_is_a_database_error() {
        let err = pending_migrations("postgres://crewmatch@127.0.0.1:1/crewmatch")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database { .. }));
    }
}
