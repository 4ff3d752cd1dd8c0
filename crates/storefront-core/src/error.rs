//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file + access.rs)                         │
//! │  ├── CoreError        - Business rule failures                          │
//! │  ├── ValidationError  - Input validation failures                       │
//! │  └── AccessError      - Missing / insufficient credentials              │
//! │                                                                         │
//! │  storefront-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  storefront-api errors                                                  │
//! │  └── ApiError         - What the HTTP client sees (status + envelope)   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations. The API layer maps the
/// not-found variants to 404 and everything else to 400.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product does not exist (or was soft-deleted).
    #[error("Product with ID {0} not found")]
    ProductNotFound(i64),

    /// Order does not exist or is not visible to the caller.
    #[error("Order with ID {0} not found")]
    OrderNotFound(i64),

    #[error("User with ID {0} not found")]
    UserNotFound(i64),

    /// Not enough stock to cover a cart line.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart line (qty: 3)
    ///      │
    ///      ▼
    /// Conditional decrement fails: available=2
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Widget", available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// Whole order rolled back, client sees 400
    /// ```
    #[error("Insufficient stock for product {name}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Cart submitted without lines.
    #[error("Cart must contain at least one item")]
    EmptyCart,

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Whether this error means "the thing you asked for is not there".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ProductNotFound(_) | CoreError::OrderNotFound(_) | CoreError::UserNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any write happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters long")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters long")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid email, too many decimals).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Arithmetic on the value would overflow.
    #[error("{field} is too large")]
    Overflow { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Name of the field that failed.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::Overflow { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product_id: 7,
            name: "Widget".to_string(),
            available: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product Widget. Available: 2, Requested: 3"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "email is required");
        assert_eq!(err.field(), "email");

        let err = ValidationError::TooShort {
            field: "name".to_string(),
            min: 3,
        };
        assert_eq!(err.to_string(), "name must be at least 3 characters long");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "price".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_not_found());
        assert!(CoreError::ProductNotFound(1).is_not_found());
        assert!(CoreError::UserNotFound(1).is_not_found());
    }
}
