//! Unified error type for the faultline crates
//!
//! [`ScError`] is the error returned at every public boundary of the
//! short-circuit engine. Module-specific error enums (fault catalog
//! validation, admittance assembly) convert into it so callers can use `?`
//! across the whole pipeline.
//!
//! # Example
//!
//! ```ignore
//! use faultline_core::{ScError, ScResult};
//!
//! fn run_study(path: &str) -> ScResult<()> {
//!     let network = load_case(path)?;
//!     solve_faults(&network)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Error type for all short-circuit operations.
///
/// Configuration errors are fatal for a run and always name the offending
/// equipment or fault. Numerical trouble at a single fault location is not an
/// error: it is reported on that fault's result instead.
#[derive(Error, Debug)]
pub enum ScError {
    /// I/O errors (case files, configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unsupported or inconsistent study configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network structure errors (unknown bus, dangling equipment)
    #[error("Network error: {0}")]
    Network(String),

    /// Linear algebra failures that affect the whole run
    #[error("Solver error: {0}")]
    Solver(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using ScError.
pub type ScResult<T> = Result<T, ScError>;

impl ScError {
    /// Build a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        ScError::Config(message.into())
    }

    /// True when the error aborts a run because of user-supplied configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, ScError::Config(_))
    }
}

impl From<anyhow::Error> for ScError {
    fn from(err: anyhow::Error) -> Self {
        ScError::Other(err.to_string())
    }
}

impl From<String> for ScError {
    fn from(s: String) -> Self {
        ScError::Other(s)
    }
}

impl From<&str> for ScError {
    fn from(s: &str) -> Self {
        ScError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for ScError {
    fn from(err: serde_json::Error) -> Self {
        ScError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScError::config("branch T1 has unsupported connections Y --- YG");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("T1"));
        assert!(err.is_config());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "case not found");
        let err: ScError = io_err.into();
        assert!(matches!(err, ScError::Io(_)));
        assert!(!err.is_config());
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ScError = parse.into();
        assert!(matches!(err, ScError::Parse(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> ScResult<()> {
            Err(ScError::Validation("bad bus".into()))
        }

        fn outer() -> ScResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
