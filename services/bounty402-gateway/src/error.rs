//! The gateway's error envelope
//!
//! Every failure leaves as `{"error": {code, message, details?, requestId}}`
//! with a stable machine code; the orchestrator decides the code and
//! status, this module only shapes the body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use bounty402_orchestrator::OrchestratorError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
    pub request_id: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        let status =
            StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                code = self.code,
                message = %self.message,
                request_id = %self.request_id,
                "request failed"
            );
        }
        let mut error = json!({
            "code": self.code,
            "message": self.message,
            "requestId": self.request_id,
        });
        if let Some(details) = self.details {
            error["details"] = details;
        }
        (self.status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestrator_error_maps_code_and_status() {
        let err = ApiError::from(OrchestratorError::BountyNotFound(9));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "BOUNTY_NOT_FOUND");
        assert!(err.message.contains('9'));
    }

    #[test]
    fn test_agent_failure_is_bad_gateway() {
        let err = ApiError::from(OrchestratorError::AgentFailed("timeout".to_string()));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.code, "AGENT_FAILED");
    }
}
