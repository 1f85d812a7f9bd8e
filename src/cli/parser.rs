//! CLI argument parsing with clap
//!
//! Commands, global flags and their help text.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use jiff::Timestamp;
use uuid::Uuid;

use super::validation;

/// Proximity job alerts and notification sync for crewmatch
#[derive(Parser, Debug)]
#[command(name = "crewmatch")]
#[command(about = "Proximity job alerts and notification sync for crewmatch")]
#[command(long_about = "
crewmatch matches newly posted jobs against workers' proximity alerts and
serves the resulting in-app notifications over HTTP.

EXAMPLES:
    # Start the server with default configuration
    crewmatch serve

    # Bind to all interfaces on a custom port
    crewmatch serve --host 0.0.0.0 --port 8080

    # Use a single configuration file
    crewmatch --config /etc/crewmatch/production.toml serve

    # Check configuration without starting the server
    crewmatch serve --dry-run

    # Apply or preview database migrations
    crewmatch migrate
    crewmatch migrate --dry-run

    # Run one proximity matching pass and print the report
    crewmatch match

    # Follow a user's unread notifications from a running server
    crewmatch watch --user-id 7f0c3a8e-2b1d-4f5e-9a6c-1d2e3f4a5b6c
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Read this single TOML file instead of the layered `config/` directory.
    /// Environment variables still apply on top of it.
    #[arg(short, long, value_name = "FILE", value_parser = validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which `config/{env}.toml` layer is loaded.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server and the in-process job scheduler (default)
    ///
    /// Examples:
    ///   crewmatch serve                           # Start with defaults
    ///   crewmatch serve --host 0.0.0.0 --port 80  # Bind to all interfaces on port 80
    ///   crewmatch serve --dry-run                 # Validate config without starting
    Serve {
        /// Host address to bind to
        #[arg(long, value_name = "ADDRESS", value_parser = validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long, value_name = "PORT", value_parser = validation::validate_port)]
        port: Option<u16>,

        /// Log level for this server instance, overrides --verbose/--quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },

    /// Database migration operations
    ///
    /// Examples:
    ///   crewmatch migrate                    # Apply all pending migrations
    ///   crewmatch migrate --dry-run          # Count pending migrations
    ///   crewmatch migrate --rollback 3       # Revert the last 3 migrations
    Migrate {
        /// Show pending migrations without applying
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Number of migrations to revert (1-100)
        #[arg(long, value_name = "STEPS", conflicts_with = "dry_run", value_parser = validation::validate_rollback_steps)]
        rollback: Option<u32>,
    },

    /// Run one proximity matching pass and print the report as JSON
    ///
    /// Examples:
    ///   crewmatch match
    ///   crewmatch match --at 2025-01-15T12:00:00Z
    Match {
        /// Treat this instant as "now" when selecting recent postings
        #[arg(long, value_name = "TIMESTAMP")]
        at: Option<Timestamp>,
    },

    /// Follow a user's unread notifications from a running server
    ///
    /// Polls adaptively: fast while you interact, slower when idle, backing
    /// off on errors. Type a line to interact:
    ///   <enter>  refetch now
    ///   p        pause polling
    ///   r        resume polling
    ///   v        toggle debug logging
    ///   other    mark the session active
    Watch {
        /// User whose notifications are followed
        #[arg(long, value_name = "UUID")]
        user_id: Uuid,

        /// Server to poll, overrides `sync.base_url`
        #[arg(long, value_name = "URL", value_parser = validation::validate_base_url)]
        base_url: Option<String>,
    },
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Cli {
    /// Checks argument combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        if let Some(Commands::Migrate {
            dry_run: true,
            rollback: Some(_),
        }) = self.command
        {
            return Err("Cannot use --dry-run and --rollback together".to_string());
        }

        Ok(())
    }

    /// Command that will run, with `serve` standing in for none
    pub fn command_name(&self) -> &'static str {
        match self.command {
            Some(Commands::Serve { .. }) | None => "serve",
            Some(Commands::Migrate { .. }) => "migrate",
            Some(Commands::Match { .. }) => "match",
            Some(Commands::Watch { .. }) => "watch",
        }
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_string()
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
