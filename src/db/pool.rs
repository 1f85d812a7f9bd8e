//! Async database connection pool.
//!
//! bb8 pool of `diesel_async` PostgreSQL connections.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_migrations::{EmbeddedMigrations, embed_migrations};

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Async connection pool type alias.
///
/// bb8::Pool is internally reference counted, so cloning it is cheap and
/// structures holding it can derive `Clone` directly.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// A connection checked out of [`AsyncDbPool`].
pub type PooledConn<'a> = PooledConnection<'a, AsyncPgConnection>;

/// Migrations compiled into the binary from `migrations/`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Creates an async connection pool sized from `config`.
///
/// # Errors
///
/// `AppError::ConnectionPool` when the initial connections cannot be opened.
pub async fn establish_async_connection_pool(config: &DatabaseConfig) -> AppResult<AsyncDbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.as_str());
    Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connection_timeout))
        .build(manager)
        .await
        .map_err(|e| AppError::ConnectionPool {
            source: anyhow::Error::from(e),
        })
}

/// Check a connection out of the pool, mapping failures to `ConnectionPool`.
pub async fn get_connection(pool: &AsyncDbPool) -> AppResult<PooledConn<'_>> {
    pool.get().await.map_err(|e| AppError::ConnectionPool {
        source: anyhow::Error::from(e),
    })
}
