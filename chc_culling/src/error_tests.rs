//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_invalid_input_display() {
    let err = Error::InvalidInput("grid of 7 instances is not square".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid input"));
    assert!(display.contains("grid of 7 instances is not square"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("footprint not set".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Initialization failed"));
    assert!(display.contains("footprint not set"));
}

#[test]
fn test_invalid_config_display() {
    let err = Error::InvalidConfig("batch_size must be >= 1".to_string());
    let display = format!("{}", err);
    assert_eq!(display, "Invalid configuration: batch_size must be >= 1");
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::InvalidInput("x".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let debug = format!("{:?}", Error::InitializationFailed("test".to_string()));
    assert!(debug.contains("InitializationFailed"));
}

#[test]
fn test_error_clone_and_eq() {
    let err1 = Error::InvalidConfig("width".to_string());
    let err2 = err1.clone();
    assert_eq!(err1, err2);
    assert_ne!(err1, Error::InvalidInput("width".to_string()));
}

// ============================================================================
// RESULT ALIAS AND MACROS
// ============================================================================

fn bail_when_zero(n: usize) -> Result<usize> {
    if n == 0 {
        crate::chc_bail!("chc::tests", "got {} instances", n);
    }
    Ok(n)
}

#[test]
fn test_bail_returns_invalid_input() {
    match bail_when_zero(0) {
        Err(Error::InvalidInput(msg)) => assert_eq!(msg, "got 0 instances"),
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

#[test]
fn test_bail_passes_through_ok() {
    assert_eq!(bail_when_zero(4), Ok(4));
}

#[test]
fn test_err_macro_builds_invalid_input() {
    let err = crate::chc_err!("chc::tests", "bad footprint {:.1}", -1.0f32);
    assert_eq!(err, Error::InvalidInput("bad footprint -1.0".to_string()));
}
