//! Internal logging system for the CHC culling engine
//!
//! This module provides a flexible logging system with:
//! - Customizable logger via Logger trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default
//! - Thread-safe logging with RwLock
//! - File and line information for detailed ERROR logs

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Implement this trait to route engine messages elsewhere (file, test capture, etc.)
///
/// # Example
///
/// ```no_run
/// use chc_culling::chc::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::fs::File,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    ///
    /// # Arguments
    ///
    /// * `entry` - The log entry to process
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level (Trace, Debug, Info, Warn, Error)
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source component (e.g., "chc::Scheduler", "chc::HierarchyBuilder")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-frame traversal details (disabled unless explicitly enabled)
    Trace,

    /// Development/debugging information
    Debug,

    /// Important informational messages
    Info,

    /// Warning messages (potential issues)
    Warn,

    /// Error messages (with file:line details)
    Error,
}

impl LogSeverity {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            LogSeverity::Trace => 0,
            LogSeverity::Debug => 1,
            LogSeverity::Info => 2,
            LogSeverity::Warn => 3,
            LogSeverity::Error => 4,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LogSeverity::Trace,
            1 => LogSeverity::Debug,
            2 => LogSeverity::Info,
            3 => LogSeverity::Warn,
            _ => LogSeverity::Error,
        }
    }
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

impl LogSeverity {
    /// Fixed-width label printed by the console logger
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn colored_label(self) -> ColoredString {
        match self {
            LogSeverity::Trace => self.label().bright_black(),
            LogSeverity::Debug => self.label().cyan(),
            LogSeverity::Info => self.label().green(),
            LogSeverity::Warn => self.label().yellow(),
            LogSeverity::Error => self.label().red().bold(),
        }
    }
}

/// Default logger: colored console output
///
/// Format: `[timestamp] [SEVERITY] [source] message`, followed by
/// `(file:line)` when the entry carries a location.
/// Warnings and errors go to stderr, everything else to stdout.
pub struct DefaultLogger;

impl DefaultLogger {
    /// ` (file:line)` suffix, empty without a location
    fn location(entry: &LogEntry) -> String {
        match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(" ({}:{})", file, line),
            _ => String::new(),
        }
    }

    /// Render `entry` as one line without colors.
    pub fn format_plain(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        format!(
            "[{}] [{}] [{}] {}{}",
            datetime.format(TIMESTAMP_FORMAT),
            entry.severity.label(),
            entry.source,
            entry.message,
            Self::location(entry)
        )
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let line = format!(
            "[{}] [{}] [{}] {}{}",
            datetime.format(TIMESTAMP_FORMAT),
            entry.severity.colored_label(),
            entry.source.bright_blue(),
            entry.message,
            Self::location(entry)
        );

        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

/// Shared body of the logging macros. Formatting is skipped when the
/// severity is filtered out.
#[doc(hidden)]
#[macro_export]
macro_rules! __chc_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        if $crate::chc::Engine::is_enabled($crate::chc::log::LogSeverity::$severity) {
            $crate::chc::Engine::log(
                $crate::chc::log::LogSeverity::$severity,
                $source,
                format!($($arg)*),
            );
        }
    };
}

/// Log a TRACE message (per-frame detail)
///
/// # Example
///
/// ```no_run
/// # use chc_culling::chc_trace;
/// # let frame = 1;
/// chc_trace!("chc::Scheduler", "frame {} drained", frame);
/// ```
#[macro_export]
macro_rules! chc_trace {
    ($source:expr, $($arg:tt)*) => { $crate::__chc_log!(Trace, $source, $($arg)*) };
}

/// Log a DEBUG message
///
/// ```no_run
/// # use chc_culling::chc_debug;
/// # let count = 3;
/// chc_debug!("chc::Scheduler", "issued {} queries", count);
/// ```
#[macro_export]
macro_rules! chc_debug {
    ($source:expr, $($arg:tt)*) => { $crate::__chc_log!(Debug, $source, $($arg)*) };
}

/// Log an INFO message
#[macro_export]
macro_rules! chc_info {
    ($source:expr, $($arg:tt)*) => { $crate::__chc_log!(Info, $source, $($arg)*) };
}

/// Log a WARN message
#[macro_export]
macro_rules! chc_warn {
    ($source:expr, $($arg:tt)*) => { $crate::__chc_log!(Warn, $source, $($arg)*) };
}

/// Log an ERROR message with file:line information
///
/// # Example
///
/// ```no_run
/// # use chc_culling::chc_error;
/// chc_error!("chc::HierarchyBuilder", "Failed to build: {}", "empty grid");
/// ```
#[macro_export]
macro_rules! chc_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::chc::Engine::log_detailed(
            $crate::chc::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!(),
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
