//! Command handlers, one per subcommand.

pub mod migrate;
pub mod run_match;
pub mod serve;
pub mod watch;

pub use migrate::MigrateCommandHandler;
pub use run_match::MatchCommandHandler;
pub use serve::ServeCommandHandler;
pub use watch::{NotificationFeed, WatchCommandHandler};
