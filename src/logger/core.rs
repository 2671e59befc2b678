/// Central logging logic: level/tag filtering and dispatch to the formatter

use super::config::{get_logger_config, is_debug_enabled_for_tag, is_verbose_enabled_for_tag};
use super::levels::LogLevel;
use super::tags::LogTag;

/// Check if a log message should be displayed
///
/// Rules:
/// 1. Errors are always shown
/// 2. Messages above the minimum level threshold are dropped
/// 3. Debug requires --debug-<module> for that tag
/// 4. Verbose requires --verbose or --verbose-<module> for that tag
pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    let config = get_logger_config();

    if level == LogLevel::Error {
        return true;
    }

    if level == LogLevel::Debug {
        return is_debug_enabled_for_tag(tag);
    }

    if level == LogLevel::Verbose {
        return is_verbose_enabled_for_tag(tag);
    }

    level <= config.min_level
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    super::format::format_and_log(tag, level.as_str(), message);
}
