/// Runtime logger configuration
///
/// Manages which log levels are shown, which modules have debug mode enabled
/// (from `--debug-<module>` flags), and output settings.

use super::levels::LogLevel;
use super::tags::LogTag;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

#[derive(Clone)]
pub struct LoggerConfig {
    /// Minimum log level to display
    pub min_level: LogLevel,

    /// Tags with debug mode enabled (from --debug-<key> flags)
    pub debug_tags: HashSet<&'static str>,

    /// Tags with verbose mode enabled (from --verbose-<key> flags)
    pub verbose_tags: HashSet<&'static str>,

    pub console_enabled: bool,
    pub file_enabled: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
            console_enabled: true,
            file_enabled: true,
        }
    }
}

static LOGGER_CONFIG: Lazy<Arc<RwLock<LoggerConfig>>> =
    Lazy::new(|| Arc::new(RwLock::new(LoggerConfig::default())));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

pub fn update_logger_config<F>(f: F)
where
    F: FnOnce(&mut LoggerConfig),
{
    let mut config = LOGGER_CONFIG.write().unwrap_or_else(|e| e.into_inner());
    f(&mut config);
}

/// Check whether debug logging is enabled for a tag
pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    let config = get_logger_config();
    config.min_level >= LogLevel::Debug || config.debug_tags.contains(tag.debug_key())
}

/// Check whether verbose logging is enabled for a tag
pub fn is_verbose_enabled_for_tag(tag: &LogTag) -> bool {
    let config = get_logger_config();
    config.min_level >= LogLevel::Verbose || config.verbose_tags.contains(tag.debug_key())
}

/// Initialize logger configuration from command-line arguments
///
/// Scans the raw argument list so new tags never require argument-parser
/// changes: `--debug-<key>` and `--verbose-<key>` match `LogTag::debug_key`.
pub fn init_from_args() {
    let mut config = LoggerConfig::default();

    for arg in std::env::args() {
        if arg == "--verbose" {
            config.min_level = LogLevel::Verbose;
            continue;
        }

        if let Some(key) = arg.strip_prefix("--debug-") {
            if let Some(tag) = LogTag::all().iter().find(|t| t.debug_key() == key) {
                config.debug_tags.insert(tag.debug_key());
            }
        } else if let Some(key) = arg.strip_prefix("--verbose-") {
            if let Some(tag) = LogTag::all().iter().find(|t| t.debug_key() == key) {
                config.verbose_tags.insert(tag.debug_key());
            }
        }
    }

    set_logger_config(config);
}
