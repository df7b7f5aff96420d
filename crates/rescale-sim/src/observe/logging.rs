//! # Structured Logging
//!
//! `tracing` subscriber setup for sweeps and estimator diagnostics.
//!
//! The estimator emits `debug` events for residuals and mode reconciliation
//! and `warn` events for poor fits; the sweep runner adds `info` progress and
//! `warn` for failed sweep points. `RUST_LOG` overrides the configured level
//! unless an explicit filter is given.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rescale_sim::observe::{init_logging, LogConfig, LogFormat, LogLevel};
//!
//! let config = LogConfig {
//!     level: LogLevel::Debug,
//!     format: LogFormat::Json,
//!     ..Default::default()
//! };
//! init_logging(&config);
//!
//! tracing::info!(pairs = 100, "sweep started");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-line, human-readable
    #[default]
    Pretty,
    /// One line per event
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Include timestamps
    pub timestamps: bool,
    /// Include source file and line
    pub source_location: bool,
    /// Include thread names (useful with the `parallel` feature)
    pub thread_names: bool,
    /// Directive filter, e.g. "rescale_core=debug,rescale_sim=info"
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            timestamps: true,
            source_location: false,
            thread_names: false,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Estimator diagnostics visible, pretty output.
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            source_location: true,
            thread_names: true,
            ..Default::default()
        }
    }

    /// JSON lines for batch sweeps.
    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            ..Default::default()
        }
    }

    /// Errors only.
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            format: LogFormat::Compact,
            timestamps: false,
            ..Default::default()
        }
    }

    /// Filter directives this config resolves to.
    ///
    /// An explicit `filter` wins; otherwise `RUST_LOG`; otherwise `level`.
    /// An unparsable explicit filter falls back to `level`.
    pub fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.to_string());
        match &self.filter {
            Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }
}

macro_rules! finish_layer {
    ($layer:expr, $config:expr) => {{
        let layer = $layer
            .with_file($config.source_location)
            .with_line_number($config.source_location)
            .with_thread_names($config.thread_names);
        if $config.timestamps {
            layer.boxed()
        } else {
            layer.without_time().boxed()
        }
    }};
}

fn output_layer(config: &LogConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    match config.format {
        LogFormat::Json => finish_layer!(fmt::layer().json(), config),
        LogFormat::Pretty => finish_layer!(fmt::layer().pretty(), config),
        LogFormat::Compact => finish_layer!(fmt::layer().compact(), config),
    }
}

/// Install the global subscriber.
///
/// Returns `false` when a global subscriber was already set; the existing
/// one is kept.
pub fn init_logging(config: &LogConfig) -> bool {
    let subscriber = tracing_subscriber::registry()
        .with(output_layer(config))
        .with(config.env_filter());
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
