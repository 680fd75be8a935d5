//! Structured logging setup

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogGuard};
