//! HTTP server lifecycle
//!
//! Startup wiring, the in-process job scheduler, and graceful shutdown.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;

use crate::api::routes::create_router;
use crate::config::Settings;
use crate::db::{establish_async_connection_pool, run_pending_migrations};
use crate::jobs::{JobDefinition, JobRegistry, JobScheduler, ProximityAlertTask};
use crate::state::AppState;

/// HTTP server manager
pub struct Server {
    settings: Settings,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Start the server and run until a shutdown signal arrives.
    ///
    /// # Errors
    /// - pool initialization or startup migration failures
    /// - an invalid cron schedule
    /// - address binding errors
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = &self.settings;

        tracing::info!(
            app_name = %settings.application.name,
            app_version = %settings.application.version,
            "Application starting"
        );
        tracing::info!(
            host = %settings.server.host,
            port = settings.server.port,
            request_timeout = settings.server.request_timeout,
            keep_alive_timeout = settings.server.keep_alive_timeout,
            "Server configuration loaded"
        );
        tracing::info!(
            max_connections = settings.database.max_connections,
            min_connections = settings.database.min_connections,
            connection_timeout = settings.database.connection_timeout,
            auto_migrate = settings.database.auto_migrate,
            "Database configuration loaded"
        );
        tracing::info!(
            schedule = %settings.matching.schedule,
            lookback_minutes = settings.matching.lookback_minutes,
            distance_backend = ?settings.matching.distance_backend,
            cron_secret_configured = !settings.matching.cron_secret.is_empty(),
            service_token_configured = !settings.api.service_token.is_empty(),
            "Matching configuration loaded"
        );
        if settings.matching.cron_secret.is_empty() {
            tracing::warn!("matching.cron_secret is empty, the cron endpoint will reject every call");
        }

        if settings.database.auto_migrate {
            let applied = run_pending_migrations(&settings.database.url).await?;
            tracing::info!(applied = applied.len(), "Startup migrations applied");
        }

        tracing::info!("Initializing database connection pool...");
        let pool = establish_async_connection_pool(&settings.database).await?;
        tracing::info!("Database connection pool initialized");

        let state = AppState::new(pool, settings);

        let scheduler = if settings.jobs.enabled {
            Some(self.start_scheduler(&state).await?)
        } else {
            tracing::info!("Job scheduler disabled");
            None
        };

        let router = create_router(state);

        let address = settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;
        tracing::info!(address = %address, "Server listening");

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(scheduler) = scheduler
            && let Err(e) = scheduler.stop().await
        {
            tracing::error!(error = %e, "Failed to stop job scheduler");
        }

        served?;
        tracing::info!("Server shutdown complete");
        Ok(())
    }

    async fn start_scheduler(&self, state: &AppState) -> anyhow::Result<JobScheduler> {
        let definition = JobDefinition::new(
            ProximityAlertTask::JOB_NAME,
            self.settings.matching.schedule.as_str(),
            &self.settings.jobs,
        );
        let task = ProximityAlertTask::new(state.services.matcher.clone());

        let mut registry = JobRegistry::new();
        registry.register(definition, Arc::new(task))?;

        let scheduler = JobScheduler::new(registry).await?;
        scheduler.start().await?;
        Ok(scheduler)
    }
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
