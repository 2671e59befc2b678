//! Log formatting and output with ANSI colors
//!
//! Colorized console output with aligned tag/level prefix, plus dual output
//! to the file sink. Handles broken pipes gracefully for piped commands.

use super::file::write_to_file;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stdout, ErrorKind, Write};

/// Log format widths for alignment
const TAG_WIDTH: usize = 9;
const LEVEL_WIDTH: usize = 7;

/// Format and output a log message
pub fn format_and_log(tag: LogTag, level: &str, message: &str) {
    let now = Local::now();
    let time = now.format("%H:%M:%S").to_string();

    let config = super::config::get_logger_config();

    if config.console_enabled {
        let tag_str = format_tag(&tag);
        let level_str = format_level(level);
        let line = format!(
            "{} [{}] [{}] {}",
            time.as_str().dimmed(),
            tag_str,
            level_str,
            message
        );
        print_stdout_safe(&line);
    }

    if config.file_enabled {
        let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
        let file_line = format!(
            "{} [{:<tw$}] [{:<lw$}] {}",
            timestamp,
            tag.as_str(),
            level,
            message,
            tw = TAG_WIDTH,
            lw = LEVEL_WIDTH
        );
        write_to_file(&file_line);
    }
}

fn format_tag(tag: &LogTag) -> String {
    let padded = format!("{:<width$}", tag.as_str(), width = TAG_WIDTH);
    let padded = padded.as_str();
    match tag {
        LogTag::Api => padded.cyan().to_string(),
        LogTag::Db | LogTag::Cache => padded.blue().to_string(),
        LogTag::Ingester | LogTag::Pulse => padded.magenta().to_string(),
        LogTag::SwapSync | LogTag::Candles => padded.yellow().to_string(),
        LogTag::Hub | LogTag::Server => padded.green().to_string(),
        LogTag::SolPrice | LogTag::Dashboard => padded.bright_cyan().to_string(),
        LogTag::Images => padded.bright_magenta().to_string(),
        LogTag::System | LogTag::Config => padded.white().to_string(),
    }
}

fn format_level(level: &str) -> String {
    let padded = format!("{:<width$}", level, width = LEVEL_WIDTH);
    let padded = padded.as_str();
    match level {
        "ERROR" => padded.red().bold().to_string(),
        "WARNING" => padded.yellow().to_string(),
        "INFO" => padded.to_string(),
        _ => padded.dimmed().to_string(),
    }
}

/// Print to stdout, ignoring broken pipes (e.g. `pulseboard | head`)
fn print_stdout_safe(line: &str) {
    let mut out = stdout().lock();
    if let Err(e) = writeln!(out, "{}", line) {
        if e.kind() != ErrorKind::BrokenPipe {
            // Nothing sensible to do; stderr may be gone too
        }
    }
}
