//! Mapping of crate errors onto JSON error responses.

use crate::error::OlympicsError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// An error on its way to the client.
#[derive(Debug)]
pub struct ApiError {
    error: OlympicsError,
    expose_details: bool,
}

impl ApiError {
    pub fn new(error: OlympicsError, expose_details: bool) -> Self {
        Self {
            error,
            expose_details,
        }
    }

    pub fn status(&self) -> StatusCode {
        if self.error.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Stable machine-readable code for the `error` field.
    pub fn code(&self) -> &'static str {
        match &self.error {
            OlympicsError::InvalidParameter { field, .. } => match field.as_str() {
                "limit" => "INVALID_LIMIT",
                "offset" => "INVALID_OFFSET",
                _ => "INVALID_PARAMETER",
            },
            OlympicsError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = if self.error.is_client_error() {
            json!({
                "error": self.code(),
                "message": self.error.to_string(),
            })
        } else {
            tracing::error!(error = %self.error, "Request failed");
            json!({
                "error": self.code(),
                "message": "Internal server error",
            })
        };

        if self.expose_details && !self.error.is_client_error() {
            body["details"] = json!(self.error.to_string());
        }

        (status, Json(body)).into_response()
    }
}
