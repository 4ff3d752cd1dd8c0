//! Response envelope shared by every endpoint.
//!
//! ```json
//! { "success": true, "message": "Order created successfully", "data": { ... }, "errors": null }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// The JSON body of every response, success or failure.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub errors: Option<Vec<String>>,
}

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Envelope {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }

    pub fn failure(message: impl Into<String>, errors: Vec<String>) -> Self {
        Envelope {
            success: false,
            message: message.into(),
            data: None,
            errors: Some(errors),
        }
    }
}

/// A successful handler result: status code plus envelope.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    body: Envelope<T>,
}

impl<T> ApiResponse<T> {
    /// 200 OK.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            status: StatusCode::OK,
            body: Envelope::success(message, data),
        }
    }

    /// 201 Created.
    pub fn created(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            status: StatusCode::CREATED,
            body: Envelope::success(message, data),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_value(Envelope::success("done", 5)).unwrap();
        assert_eq!(
            ok,
            serde_json::json!({"success": true, "message": "done", "data": 5, "errors": null})
        );

        let failed: Envelope<()> = Envelope::failure("nope", vec!["bad".to_string()]);
        let failed = serde_json::to_value(failed).unwrap();
        assert_eq!(
            failed,
            serde_json::json!({"success": false, "message": "nope", "data": null, "errors": ["bad"]})
        );
    }
}
