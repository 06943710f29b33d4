//! Error types for the timeline engine, the remote service client and
//! the settings file.

use std::path::PathBuf;

use chrono::NaiveDate;

/// Errors raised by the timeline engine and the remote service client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A date range whose end lies before its start.
    #[error("invalid date range: end {end} is before start {start}")]
    InvalidRange {
        /// Requested first day.
        start: NaiveDate,
        /// Requested last day.
        end: NaiveDate,
    },

    /// The request never produced a response (connection, timeout, TLS).
    #[error("failed to fetch {operation}: {source}")]
    Fetch {
        /// Remote operation name, e.g. `list_resources`.
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{operation} failed with HTTP {status}: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// The response body did not match the expected JSON shape.
    #[error("could not decode {operation} response: {reason}")]
    Decode {
        operation: &'static str,
        reason: String,
    },

    /// A leveling preview, run, comparison or apply request failed.
    #[error("leveling request {operation} failed: {message}")]
    LevelingRequest {
        operation: &'static str,
        message: String,
    },

    /// Writing the utilization CSV failed.
    #[error("failed to export utilization to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The async runtime backing the API worker could not start.
    #[error("could not start request runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl Error {
    /// Re-labels a transport or status failure of a leveling endpoint so the
    /// caller always sees [`Error::LevelingRequest`].
    pub fn into_leveling(self) -> Self {
        match self {
            Error::LevelingRequest { .. } => self,
            Error::Fetch { operation, source } => Error::LevelingRequest {
                operation,
                message: source.to_string(),
            },
            Error::Status {
                operation,
                status,
                message,
            } => Error::LevelingRequest {
                operation,
                message: format!("HTTP {status}: {message}"),
            },
            Error::Decode { operation, reason } => Error::LevelingRequest {
                operation,
                message: reason,
            },
            other => other,
        }
    }
}

/// Errors that can occur while loading or saving [`crate::config::AppSettings`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings at {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings at {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("could not determine the configuration directory")]
    NoConfigDir,

    #[error("invalid setting `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// A specialized Result type for engine and client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_range_display_names_both_dates() {
        let err = Error::InvalidRange {
            start: NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "invalid date range: end 2026-02-02 is before start 2026-02-15"
        );
    }

    #[test]
    fn status_errors_become_leveling_errors() {
        let err = Error::Status {
            operation: "run_leveling",
            status: 500,
            message: "solver crashed".to_string(),
        }
        .into_leveling();
        match err {
            Error::LevelingRequest { operation, message } => {
                assert_eq!(operation, "run_leveling");
                assert_eq!(message, "HTTP 500: solver crashed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_value_display() {
        let err = ConfigError::InvalidValue {
            field: "api_base_url",
            reason: "must start with http:// or https://".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid setting `api_base_url`: must start with http:// or https://"
        );
    }
}
