//! Error types for the Olympics data API

use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OlympicsError>;

#[derive(Error, Debug)]
pub enum OlympicsError {
    #[error("Invalid parameter \"{field}\": {message}")]
    InvalidParameter { field: String, message: String },

    #[error("Data store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Table not found in data store: {table}")]
    TableMissing { table: String },

    #[error("Data store query failed: {0}")]
    UpstreamQuery(#[source] rusqlite::Error),

    #[error("Operation \"{operation}\" requires the data store, which is disabled in demo mode")]
    DemoModeRestricted { operation: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl OlympicsError {
    pub fn invalid_parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        OlympicsError::InvalidParameter {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn demo_mode_restricted(operation: impl Into<String>) -> Self {
        OlympicsError::DemoModeRestricted {
            operation: operation.into(),
        }
    }

    /// Whether the error is the caller's fault rather than the server's.
    pub fn is_client_error(&self) -> bool {
        matches!(self, OlympicsError::InvalidParameter { .. })
    }
}

/// Store errors are classified once, here, so callers never inspect driver messages.
impl From<rusqlite::Error> for OlympicsError {
    fn from(err: rusqlite::Error) -> Self {
        if let Some(table) = missing_table(&err) {
            return OlympicsError::TableMissing { table };
        }

        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if matches!(
                    failure.code,
                    ErrorCode::CannotOpen
                        | ErrorCode::NotADatabase
                        | ErrorCode::DatabaseCorrupt
                        | ErrorCode::SystemIoFailure
                ) =>
            {
                OlympicsError::StoreUnavailable(err.to_string())
            }
            _ => OlympicsError::UpstreamQuery(err),
        }
    }
}

impl From<tokio::task::JoinError> for OlympicsError {
    fn from(err: tokio::task::JoinError) -> Self {
        OlympicsError::Internal {
            message: err.to_string(),
        }
    }
}

fn missing_table(err: &rusqlite::Error) -> Option<String> {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message
            .strip_prefix("no such table: ")
            .map(|table| table.trim().trim_start_matches("main.").to_string()),
        _ => None,
    }
}
