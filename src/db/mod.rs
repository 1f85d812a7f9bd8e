//! Database connection pool and migrations.

mod migrations;
mod pool;

pub use migrations::{pending_migrations, revert_migrations, run_pending_migrations};
pub use pool::{
    AsyncDbPool, MIGRATIONS, PooledConn, establish_async_connection_pool, get_connection,
};
