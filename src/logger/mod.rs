//! Structured logging for pulseboard
//!
//! Tag-based logging with standard levels (Error/Warning/Info/Debug/Verbose),
//! colored console output, file persistence, and per-module debug control via
//! `--debug-<module>` command-line flags.
//!
//! ## Usage
//!
//! ```rust
//! use pulseboard::logger::{self, LogTag};
//!
//! logger::error(LogTag::Api, "Connection failed");
//! logger::warning(LogTag::Pulse, "Feed list empty");
//! logger::info(LogTag::Ingester, "Streaming");
//! logger::debug(LogTag::SwapSync, "Page 3 fetched"); // Only with --debug-swap-sync
//! ```
//!
//! Call `logger::init()` once at startup before any logging occurs.

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, set_logger_config, update_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Parses command-line arguments for `--debug-<module>` / `--verbose` flags
/// and sets up the file sink. Must be called once before logging.
pub fn init() {
    config::init_from_args();
    file::init_file_logging();
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues that need attention)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operational messages)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (gated by `--debug-<module>` for the tag)
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (gated by `--verbose`)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}
