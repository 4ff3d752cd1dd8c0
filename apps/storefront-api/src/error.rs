//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Storefront                             │
//! │                                                                         │
//! │  Handler: Result<ApiResponse<T>, ApiError>                              │
//! │         │                                                               │
//! │         ├── ValidationError ─────────────► Validation       400         │
//! │         ├── AccessError ─────────────────► Unauthorized     401         │
//! │         │                                  Forbidden        403         │
//! │         ├── CoreError::*NotFound ────────► NotFound         404         │
//! │         ├── DbError::UniqueViolation ────► Conflict         409         │
//! │         ├── CoreError::InsufficientStock ► BusinessRule     400         │
//! │         ├── DbError::Busy / pool / conn ─► StoreUnavailable 503         │
//! │         └── anything else ───────────────► Internal         500         │
//! │                                                                         │
//! │  Body: { "success": false, "message": "...", "data": null,              │
//! │          "errors": ["..."] }                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal failures are logged in full. Clients only see the detail when
//! the server runs with `APP_ENV=development`.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use storefront_core::{AccessError, CoreError, ValidationError};
use storefront_db::DbError;

use crate::response::Envelope;

static EXPOSE_INTERNAL_DETAIL: AtomicBool = AtomicBool::new(false);

/// Whether 500 responses carry the underlying error text.
pub fn expose_internal_detail(expose: bool) {
    EXPOSE_INTERNAL_DETAIL.store(expose, Ordering::Relaxed);
}

/// Error categories, one per HTTP status the API emits on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    BusinessRule,
    StoreUnavailable,
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::Validation | ErrorKind::BusinessRule => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error returned from handlers.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,

    /// Human-readable summary, sent as `message`.
    pub message: String,

    /// Individual problems, sent as `errors`.
    pub errors: Vec<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError {
            kind,
            errors: vec![message.clone()],
            message,
        }
    }

    /// Replaces the `errors` list.
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorKind::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorKind::Unauthorized, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorKind::Conflict, message)
    }

    pub fn unavailable() -> Self {
        ApiError::new(
            ErrorKind::StoreUnavailable,
            "Database connection failed. Please try again later.",
        )
    }

    /// Creates an internal error. `detail` is logged, and only shown to
    /// clients in development.
    pub fn internal(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        tracing::error!(error = %detail, "Internal error");
        ApiError {
            kind: ErrorKind::Internal,
            message: "Internal server error".to_string(),
            errors: vec![detail],
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::new(ErrorKind::Validation, "Validation failed").with_errors(vec![err.to_string()])
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        let kind = match err {
            AccessError::Unauthorized => ErrorKind::Unauthorized,
            AccessError::Forbidden => ErrorKind::Forbidden,
        };
        ApiError::new(kind, err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => v.into(),
            CoreError::ProductNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::UserNotFound(_) => ApiError::not_found(err.to_string()),
            CoreError::InsufficientStock { .. } | CoreError::EmptyCart => {
                ApiError::new(ErrorKind::BusinessRule, err.to_string())
            }
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Core(core) => core.into(),
            DbError::UniqueViolation { ref field, .. } => {
                let message = match field.as_str() {
                    "username" => "Username already exists".to_string(),
                    "email" => "Email already exists".to_string(),
                    other => format!("{other} already exists"),
                };
                ApiError::conflict(message)
            }
            DbError::ForeignKeyViolation { .. } => {
                ApiError::validation("Referenced record does not exist")
            }
            ref e if e.is_unavailable() => {
                tracing::warn!(error = %e, "Store unavailable");
                ApiError::unavailable()
            }
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(ErrorKind::Validation, "Invalid JSON body").with_errors(vec![rejection.body_text()])
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(ErrorKind::Validation, "Invalid query parameters")
            .with_errors(vec![rejection.body_text()])
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::new(ErrorKind::Validation, "Invalid path parameter")
            .with_errors(vec![rejection.body_text()])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errors = if self.kind == ErrorKind::Internal
            && !EXPOSE_INTERNAL_DETAIL.load(Ordering::Relaxed)
        {
            vec!["Internal server error".to_string()]
        } else {
            self.errors
        };

        let body: Envelope<()> = Envelope::failure(self.message, errors);
        (self.kind.status(), axum::Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
