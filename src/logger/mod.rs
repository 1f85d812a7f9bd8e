//! Logger setup
//!
//! Built on `tracing-subscriber`:
//! - console output with color control
//! - optional file output in full, compact or JSON format
//! - a reload handle so the filter can be changed while running

pub mod config;
pub mod error;

pub use config::*;
pub use error::LoggerError;

use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::sync::Mutex;

use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

/// Handle for changing the active log filter at runtime.
#[derive(Clone)]
pub struct LogLevelHandle {
    inner: reload::Handle<EnvFilter, Registry>,
}

impl LogLevelHandle {
    /// Replace the active filter with a new level or directive string.
    pub fn set_level(&self, level: &str) -> Result<(), LoggerError> {
        let filter = EnvFilter::try_new(level)
            .map_err(|e| LoggerError::config(format!("invalid filter '{}': {}", level, e)))?;
        self.inner
            .reload(filter)
            .map_err(|e| LoggerError::reload(e.to_string()))?;
        tracing::info!(level = %level, "Log level changed");
        Ok(())
    }

    /// The filter currently in effect, rendered as a directive string.
    pub fn current(&self) -> Option<String> {
        self.inner.with_current(|f| f.to_string()).ok()
    }
}

/// Install the global subscriber described by `config`.
pub fn init_logger(config: LoggerConfig) -> anyhow::Result<LogLevelHandle> {
    config.validate()?;

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);
    let use_ansi = config.console.colored && std::io::stdout().is_terminal();

    let console = config.console.enabled;
    let registry = tracing_subscriber::registry().with(filter);

    // File layer goes before the console layer so ANSI escapes from span
    // formatting never end up in the file.
    if config.file.enabled {
        let writer = Mutex::new(open_log_file(&config.file)?);
        match config.file.format {
            LogFormat::Full => registry
                .with(fmt::layer().with_ansi(false).with_target(true).with_writer(writer))
                .with(console_layer(console, use_ansi))
                .try_init()?,
            LogFormat::Compact => registry
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(true)
                        .compact()
                        .with_writer(writer),
                )
                .with(console_layer(console, use_ansi))
                .try_init()?,
            LogFormat::Json => registry
                .with(fmt::layer().with_ansi(false).json().with_writer(writer))
                .with(console_layer(console, use_ansi))
                .try_init()?,
        }
    } else {
        registry.with(console_layer(console, use_ansi)).try_init()?;
    }

    Ok(LogLevelHandle { inner: handle })
}

/// Console output, built per subscriber stack since its type depends on the
/// layers beneath it.
fn console_layer<S>(enabled: bool, use_ansi: bool) -> Option<fmt::Layer<S>> {
    enabled.then(|| {
        fmt::layer()
            .with_ansi(use_ansi)
            .with_target(true)
            .with_level(true)
    })
}

fn open_log_file(config: &FileConfig) -> Result<File, LoggerError> {
    if let Some(parent) = config.path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(config.append)
        .truncate(!config.append)
        .open(&config.path)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_log_file_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/crewmatch.log");
        let config = FileConfig::new(true, path.clone(), true, LogFormat::Json).unwrap();

        open_log_file(&config).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_open_log_file_truncates_without_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crewmatch.log");
        std::fs::write(&path, "old contents").unwrap();

        let config = FileConfig::new(true, path.clone(), false, LogFormat::Full).unwrap();
        open_log_file(&config).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_console_layer_follows_enabled_flag() {
        assert!(console_layer::<Registry>(false, false).is_none());
        assert!(console_layer::<Registry>(true, true).is_some());
    }
}
