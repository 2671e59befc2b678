//! File logging with per-run log files and retention cleanup
//!
//! Each process start gets its own timestamped file under the data log
//! directory, with a `latest.log` symlink for easy tailing. Old files are
//! cleaned up periodically based on a retention window.

use chrono::Local;
use once_cell::sync::Lazy;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

const LOG_RETENTION_HOURS: u64 = 24;
const CLEANUP_INTERVAL_WRITES: u64 = 1000;
const FILE_BUFFER_SIZE: usize = 4 * 1024;

struct FileLogger {
    writer: Option<BufWriter<File>>,
    log_dir: PathBuf,
    write_counter: u64,
}

impl FileLogger {
    fn new() -> Result<Self, std::io::Error> {
        let log_dir = log_directory();
        fs::create_dir_all(&log_dir)?;

        let now = Local::now();
        let file_name = format!("pulseboard_{}.log", now.format("%Y-%m-%d_%H-%M-%S"));
        let file_path = log_dir.join(&file_name);

        let file = OpenOptions::new().create(true).append(true).open(&file_path)?;

        // latest.log convenience link; failures are non-fatal
        let latest = log_dir.join("latest.log");
        let _ = fs::remove_file(&latest);
        #[cfg(unix)]
        {
            let _ = std::os::unix::fs::symlink(&file_path, &latest);
        }

        Ok(FileLogger {
            writer: Some(BufWriter::with_capacity(FILE_BUFFER_SIZE, file)),
            log_dir,
            write_counter: 0,
        })
    }

    fn write(&mut self, message: &str) {
        if let Some(ref mut writer) = self.writer {
            let _ = writeln!(writer, "{}", message);
            let _ = writer.flush();

            self.write_counter += 1;
            if self.write_counter % CLEANUP_INTERVAL_WRITES == 0 {
                self.cleanup_old_logs();
            }
        }
    }

    fn cleanup_old_logs(&self) {
        let cutoff = SystemTime::now() - Duration::from_secs(LOG_RETENTION_HOURS * 3600);

        let Ok(entries) = fs::read_dir(&self.log_dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let is_log = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("pulseboard_") && n.ends_with(".log"))
                .unwrap_or(false);
            if !is_log {
                continue;
            }

            if let Ok(meta) = entry.metadata() {
                if let Ok(modified) = meta.modified() {
                    if modified < cutoff {
                        let _ = fs::remove_file(&path);
                    }
                }
            }
        }
    }
}

static FILE_LOGGER: Lazy<Mutex<Option<FileLogger>>> = Lazy::new(|| Mutex::new(None));

fn log_directory() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pulseboard")
        .join("logs")
}

/// Initialize the file sink; on failure, file logging is silently disabled
pub fn init_file_logging() {
    let mut guard = FILE_LOGGER.lock().unwrap_or_else(|e| e.into_inner());
    match FileLogger::new() {
        Ok(logger) => *guard = Some(logger),
        Err(_) => *guard = None,
    }
}

/// Write a line to the current log file (no-op when uninitialized)
pub fn write_to_file(message: &str) {
    let mut guard = FILE_LOGGER.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(ref mut logger) = *guard {
        logger.write(message);
    }
}
