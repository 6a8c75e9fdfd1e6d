//! Logging configuration for Crux Vault.
//!
//! Structured logging via the `tracing` framework, with the same
//! output/format knobs regardless of which destination the embedding
//! application chooses.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output destination.
#[derive(Debug, Clone)]
pub enum LogOutput {
    /// Write to stdout.
    Stdout,
    /// Write to a daily-rotating file at this path.
    File(std::path::PathBuf),
    /// Write to both stdout and a daily-rotating file.
    Both(std::path::PathBuf),
}

/// Log line format.
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// Human-readable, multi-line.
    Pretty,
    /// Single-line, machine-friendlier.
    Compact,
}

/// Logging configuration, built with the usual consuming-builder
/// pattern and applied once via [`LogConfig::init`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub output: LogOutput,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: LogOutput::Stdout,
            format: LogFormat::Pretty,
        }
    }
}

impl LogConfig {
    /// `info`-level config writing to stdout.
    pub fn info() -> Self {
        Self {
            level: "info".to_string(),
            ..Default::default()
        }
    }

    /// `debug`-level config writing to stdout.
    pub fn debug() -> Self {
        Self {
            level: "debug".to_string(),
            ..Default::default()
        }
    }

    /// `warn`-level config writing to stdout.
    pub fn warn() -> Self {
        Self {
            level: "warn".to_string(),
            ..Default::default()
        }
    }

    /// Routes output to a daily-rotating file instead of stdout.
    pub fn with_file<P: Into<std::path::PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::File(path.into());
        self
    }

    /// Routes output to both stdout and a daily-rotating file.
    pub fn with_both<P: Into<std::path::PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::Both(path.into());
        self
    }

    /// Overrides the line format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Overrides the level filter (an `EnvFilter` directive string).
    pub fn with_level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = level.into();
        self
    }

    /// Installs this configuration as the global subscriber.
    ///
    /// Returns a guard that must be kept alive for file output to
    /// flush; dropping it shuts down the background writer thread.
    /// `RUST_LOG` overrides `level` when set.
    pub fn init(self) -> Option<WorkerGuard> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .expect("invalid log level directive");

        match self.output {
            LogOutput::Stdout => {
                match self.format {
                    LogFormat::Pretty => {
                        tracing_subscriber::registry()
                            .with(env_filter)
                            .with(fmt::layer().pretty())
                            .init();
                    }
                    LogFormat::Compact => {
                        tracing_subscriber::registry()
                            .with(env_filter)
                            .with(fmt::layer().compact())
                            .init();
                    }
                }
                None
            }
            LogOutput::File(path) => {
                let appender = tracing_appender::rolling::daily(
                    path.parent().unwrap_or_else(|| std::path::Path::new(".")),
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("cruxvault.log"),
                );
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                match self.format {
                    LogFormat::Pretty => {
                        tracing_subscriber::registry()
                            .with(env_filter)
                            .with(fmt::layer().with_writer(non_blocking).pretty())
                            .init();
                    }
                    LogFormat::Compact => {
                        tracing_subscriber::registry()
                            .with(env_filter)
                            .with(fmt::layer().with_writer(non_blocking).compact())
                            .init();
                    }
                }
                Some(guard)
            }
            LogOutput::Both(path) => {
                let appender = tracing_appender::rolling::daily(
                    path.parent().unwrap_or_else(|| std::path::Path::new(".")),
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("cruxvault.log"),
                );
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer())
                    .with(fmt::layer().with_writer(non_blocking))
                    .init();

                Some(guard)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_info_and_stdout() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(matches!(config.output, LogOutput::Stdout));
    }

    #[test]
    fn builder_chain_applies_in_order() {
        let config = LogConfig::debug()
            .with_file("/tmp/cruxvault-test.log")
            .with_format(LogFormat::Compact);
        assert_eq!(config.level, "debug");
        assert!(matches!(config.output, LogOutput::File(_)));
        assert!(matches!(config.format, LogFormat::Compact));
    }
}
