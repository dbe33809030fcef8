//! Simulator error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type for simulator operations.
pub type Result<T> = std::result::Result<T, SimulatorError>;

/// Errors surfaced by the simulator API.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// Remote mode requested without a remote webhook configured.
    #[error("remote webhook not configured: set LAMBDA_WEBHOOK_URL or --remote-url")]
    RemoteNotConfigured,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SimulatorError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SimulatorError::RemoteNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            SimulatorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SimulatorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));
        (status, body).into_response()
    }
}

impl From<serde_json::Error> for SimulatorError {
    fn from(err: serde_json::Error) -> Self {
        SimulatorError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulator_error_status_codes() {
        assert_eq!(
            SimulatorError::RemoteNotConfigured.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            SimulatorError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_simulator_error_display() {
        let err = SimulatorError::Internal("boom".into());
        assert_eq!(err.to_string(), "internal error: boom");
    }
}
