/// Structured error types for postline-core.
///
/// The CLI wraps these in `anyhow`; the server maps them onto HTTP statuses.
use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for postline-core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Config file is not valid TOML or has the wrong shape
    #[error("Failed to parse config file {path:?}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Configuration value is missing or invalid
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Date arithmetic left the representable calendar
    #[error("date range out of bounds: {from} {days:+} days")]
    DateOutOfRange { from: NaiveDate, days: i64 },
}

/// Result type alias for postline-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::config("secret_key must not be empty");
        assert_eq!(
            err.to_string(),
            "Configuration error: secret_key must not be empty"
        );

        let err = CoreError::DateOutOfRange {
            from: NaiveDate::from_ymd_opt(2023, 8, 29).unwrap(),
            days: -5,
        };
        assert_eq!(err.to_string(), "date range out of bounds: 2023-08-29 -5 days");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();

        assert!(matches!(err, CoreError::Io { .. }));
    }
}
