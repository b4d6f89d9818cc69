//! Error types for the CHC culling engine
//!
//! This module defines the error types used throughout the crate,
//! including hierarchy construction and configuration validation.

use std::fmt;

/// Result type for culling engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Culling engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Degenerate or inconsistent input (empty grid, non-square grid, bad footprint)
    InvalidInput(String),

    /// A required input was never provided before construction
    InitializationFailed(String),

    /// Configuration value out of range
    InvalidConfig(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR (with file:line) and build an `Error::InvalidInput`
///
/// # Example
///
/// ```no_run
/// # use chc_culling::chc_err;
/// let err = chc_err!("chc::HierarchyBuilder", "grid has {} cells", 0);
/// ```
#[macro_export]
macro_rules! chc_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::chc_error!($source, "{}", message);
        $crate::chc::Error::InvalidInput(message)
    }};
}

/// Log an ERROR and return early with `Error::InvalidInput`
///
/// # Example
///
/// ```no_run
/// # use chc_culling::chc_bail;
/// fn check(n: usize) -> chc_culling::chc::Result<()> {
///     if n == 0 {
///         chc_bail!("chc::HierarchyBuilder", "no instances");
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! chc_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::chc_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
