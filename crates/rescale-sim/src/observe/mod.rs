//! # Observability
//!
//! Structured logging for estimator diagnostics and sweep progress, built on
//! `tracing` and `tracing-subscriber`.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
