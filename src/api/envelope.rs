//! Uniform JSON status envelope

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// `{success, code, message}` body used for every non-file response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub code: u16,
    pub message: String,
}

impl Envelope {
    /// Build an envelope for `status`; `success` is derived from the code
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: status.as_u16() < 400,
            code: status.as_u16(),
            message: message.into(),
        }
    }

    /// HTTP status carried by this envelope
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self) {
            Ok(body) => (
                self.status(),
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("Internal Error: {}", e),
            )
                .into_response(),
        }
    }
}

/// Shorthand for an envelope response
pub fn reply(status: StatusCode, message: impl Into<String>) -> Response {
    Envelope::new(status, message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_derived_from_code() {
        assert!(Envelope::new(StatusCode::OK, "ok").success);
        assert!(Envelope::new(StatusCode::ACCEPTED, "ok").success);
        assert!(!Envelope::new(StatusCode::BAD_REQUEST, "no").success);
        assert!(!Envelope::new(StatusCode::INSUFFICIENT_STORAGE, "full").success);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&Envelope::new(StatusCode::CREATED, "Data Written")).unwrap();
        assert_eq!(json, r#"{"success":true,"code":201,"message":"Data Written"}"#);
    }

    #[test]
    fn test_into_response() {
        let response = reply(StatusCode::CONFLICT, "exists");
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
