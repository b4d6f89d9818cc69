//! Unit tests for the Engine logging facade
//!
//! IMPORTANT: the logger and the severity filter are process-wide.
//! All tests are marked with #[serial] to run sequentially.

use crate::chc::Engine;
use crate::chc::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Test logger that captures log entries for verification
///
/// Only `chc::tests` entries are kept: non-serial tests elsewhere in the
/// crate may log concurrently through the same global logger.
struct TestLogger {
    entries: Arc<Mutex<Vec<String>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source != "chc::tests" {
            return;
        }
        let mut entries = self.entries.lock().unwrap();
        let location = match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(" @{}:{}", file, line),
            _ => String::new(),
        };
        entries.push(format!("{:?}: {}{}", entry.severity, entry.message, location));
    }
}

// ============================================================================
// LOGGING API TESTS
// ============================================================================

#[test]
#[serial]
fn test_default_min_severity_is_info() {
    Engine::reset_logger();
    assert_eq!(Engine::min_severity(), LogSeverity::Info);
    assert!(!Engine::is_enabled(LogSeverity::Debug));
    assert!(Engine::is_enabled(LogSeverity::Warn));
}

#[test]
#[serial]
fn test_set_logger_routes_messages() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    Engine::log(LogSeverity::Info, "chc::tests", "hello".to_string());
    crate::chc_warn!("chc::tests", "warned {} times", 2);

    {
        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], "Info: hello");
        assert_eq!(entries[1], "Warn: warned 2 times");
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_min_severity_filters_messages() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    crate::chc_trace!("chc::tests", "dropped");
    crate::chc_debug!("chc::tests", "dropped too");
    Engine::set_min_severity(LogSeverity::Trace);
    crate::chc_trace!("chc::tests", "kept");

    {
        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], "Trace: kept");
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_error_macro_carries_location() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    crate::chc_error!("chc::tests", "boom");

    {
        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].starts_with("Error: boom @"));
        assert!(entries[0].contains("engine_tests.rs"));
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_reset_logger_restores_filter() {
    Engine::set_min_severity(LogSeverity::Error);
    Engine::reset_logger();
    assert_eq!(Engine::min_severity(), LogSeverity::Info);
}
