//! Append-only named log sink
//!
//! Records are written as `<timestamp> - <sink> - <LEVEL> - <message>` and
//! flushed as each one is written. Sinks are registered process-wide by
//! name: constructing a [`SimpleLogger`] twice with the same name reuses the
//! first file handle instead of attaching a second one.

use std::collections::HashMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

static SINKS: Lazy<Mutex<HashMap<String, Arc<Sink>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Severity of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Parse a level name, case-insensitively. Unknown names are Info.
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => LogLevel::Debug,
            "INFO" => LogLevel::Info,
            "WARNING" => LogLevel::Warning,
            "ERROR" => LogLevel::Error,
            "CRITICAL" => LogLevel::Critical,
            _ => LogLevel::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output handler: a file opened for append
struct Sink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl Sink {
    fn open(path: &Path) -> Self {
        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!("Cannot open log file {}: {}", path.display(), e);
                None
            }
        };

        Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        }
    }

    fn append(&self, line: &str) {
        let mut guard = self.file.lock();
        if let Some(file) = guard.as_mut() {
            if let Err(e) = writeln!(file, "{}", line).and_then(|_| file.flush()) {
                warn!("Failed to write to {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Leveled logger bound to a named sink
#[derive(Clone)]
pub struct SimpleLogger {
    name: String,
    sink: Arc<Sink>,
}

impl SimpleLogger {
    /// Attach to the sink called `name`, creating it on `logfile` if this is
    /// the first logger with that name in the process.
    pub fn new(logfile: impl AsRef<Path>, name: impl Into<String>) -> Self {
        let name = name.into();
        let sink = SINKS
            .lock()
            .entry(name.clone())
            .or_insert_with(|| Arc::new(Sink::open(logfile.as_ref())))
            .clone();

        Self { name, sink }
    }

    /// Write a record, resolving the level by name
    pub fn write_log(&self, level: &str, message: &str) {
        self.log(LogLevel::parse_lenient(level), message);
    }

    /// Write a record at a known level
    pub fn log(&self, level: LogLevel, message: &str) {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        self.sink
            .append(&format!("{} - {} - {} - {}", timestamp, self.name, level, message));

        match level {
            LogLevel::Debug => debug!(sink = %self.name, "{}", message),
            LogLevel::Info => info!(sink = %self.name, "{}", message),
            LogLevel::Warning => warn!(sink = %self.name, "{}", message),
            LogLevel::Error | LogLevel::Critical => {
                error!(sink = %self.name, severity = level.as_str(), "{}", message)
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the sink appends to
    pub fn path(&self) -> &Path {
        &self.sink.path
    }

    /// Whether two loggers write through the same handler
    pub fn shares_sink_with(&self, other: &SimpleLogger) -> bool {
        Arc::ptr_eq(&self.sink, &other.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(LogLevel::parse_lenient("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::parse_lenient("Warning"), LogLevel::Warning);
        assert_eq!(LogLevel::parse_lenient("CRITICAL"), LogLevel::Critical);
        assert_eq!(LogLevel::parse_lenient(""), LogLevel::Info);
        assert_eq!(LogLevel::parse_lenient("verbose"), LogLevel::Info);
    }

    #[test]
    fn test_record_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("format.log");
        let log = SimpleLogger::new(&path, "logger-format-test");

        log.write_log("error", "Title not found");

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" - logger-format-test - ERROR - Title not found"));
        // "2024-01-01 12:00:00,123" prefix
        assert_eq!(lines[0].find(" - "), Some(23));
    }

    #[test]
    fn test_unknown_level_written_as_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unknown.log");
        let log = SimpleLogger::new(&path, "logger-unknown-level-test");

        log.write_log("", "-----------------------");
        log.write_log("NOTICE", "still recorded");

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(" - INFO - -----------------------"));
        assert!(lines[1].contains(" - INFO - still recorded"));
    }

    #[test]
    fn test_repeated_construction_reuses_handler() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idempotent.log");
        let other = dir.path().join("ignored.log");

        let first = SimpleLogger::new(&path, "logger-idempotent-test");
        let second = SimpleLogger::new(&path, "logger-idempotent-test");
        let third = SimpleLogger::new(&other, "logger-idempotent-test");

        assert!(first.shares_sink_with(&second));
        assert!(first.shares_sink_with(&third));
        assert_eq!(third.path(), path.as_path());

        second.write_log("INFO", "once");
        third.write_log("INFO", "twice");

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert!(!other.exists());
    }

    #[test]
    fn test_records_append_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order.log");
        std::fs::write(&path, "existing line\n").unwrap();
        let log = SimpleLogger::new(&path, "logger-order-test");

        log.log(LogLevel::Debug, "one");
        log.log(LogLevel::Warning, "two");
        log.log(LogLevel::Critical, "three");

        let lines = read_lines(&path);
        assert_eq!(lines[0], "existing line");
        assert!(lines[1].ends_with("DEBUG - one"));
        assert!(lines[2].ends_with("WARNING - two"));
        assert!(lines[3].ends_with("CRITICAL - three"));
    }

    #[test]
    fn test_unwritable_path_does_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("dir").join("x.log");
        let log = SimpleLogger::new(&path, "logger-unwritable-test");

        log.write_log("INFO", "dropped");
        assert!(!path.exists());
    }
}
