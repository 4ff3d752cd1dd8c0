//! # Validation Module
//!
//! Field validation for Storefront.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP (axum extractors)                                        │
//! │  └── Type validation (JSON deserialization)                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── Shape / range rules per field, before any write                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── UNIQUE (username, email)                                           │
//! │  ├── CHECK (stock >= 0, price_cents > 0, quantity > 0)                  │
//! │  └── Foreign keys                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::{validate_email, validate_price_cents};
//!
//! assert!(validate_email("buyer@example.com").is_ok());
//! assert!(validate_price_cents(0).is_err());
//! ```

use serde::Serialize;

use crate::error::{CoreError, ValidationError};
use crate::types::{CartLine, NewProduct, ProductUpdate};
use crate::MAX_PRICE_CENTS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 100;
pub const PRODUCT_NAME_MIN: usize = 3;
pub const PRODUCT_NAME_MAX: usize = 100;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 2000;
pub const CATEGORY_MAX: usize = 50;
pub const ORDER_DESCRIPTION_MAX: usize = 500;

// =============================================================================
// Field Check
// =============================================================================

/// `{valid, message?}` view of a validation outcome, for callers that want
/// a value instead of a `Result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<ValidationResult<()>> for FieldCheck {
    fn from(result: ValidationResult<()>) -> Self {
        match result {
            Ok(()) => FieldCheck {
                valid: true,
                message: None,
            },
            Err(e) => FieldCheck {
                valid: false,
                message: Some(e.to_string()),
            },
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

// =============================================================================
// Account Validators
// =============================================================================

/// Validates an email address: `local@domain.tld`, no whitespace.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    // Domain needs a dot with something on both sides of it.
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

/// Validates a password.
///
/// ## Rules
/// - 8 to 100 characters
/// - At least one uppercase letter, one lowercase letter and one digit
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = char_len(password);
    if len < PASSWORD_MIN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: PASSWORD_MIN,
        });
    }
    if len > PASSWORD_MAX {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: PASSWORD_MAX,
        });
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_upper && has_lower && has_digit) {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: "must contain an uppercase letter, a lowercase letter and a digit"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a username: 3 to 50 ASCII letters or digits.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }
    if username.len() < USERNAME_MIN {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: USERNAME_MIN,
        });
    }
    if username.len() > USERNAME_MAX {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: USERNAME_MAX,
        });
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters and numbers".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a product name (3 to 100 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let len = char_len(name.trim());

    if len == 0 {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    if len < PRODUCT_NAME_MIN {
        return Err(ValidationError::TooShort {
            field: "name".to_string(),
            min: PRODUCT_NAME_MIN,
        });
    }
    if len > PRODUCT_NAME_MAX {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: PRODUCT_NAME_MAX,
        });
    }

    Ok(())
}

/// Validates a product description (at least 10 characters after trimming).
pub fn validate_product_description(description: &str) -> ValidationResult<()> {
    let len = char_len(description.trim());

    if len == 0 {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }
    if len < DESCRIPTION_MIN {
        return Err(ValidationError::TooShort {
            field: "description".to_string(),
            min: DESCRIPTION_MIN,
        });
    }
    if len > DESCRIPTION_MAX {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: DESCRIPTION_MAX,
        });
    }

    Ok(())
}

/// Validates a price in cents: strictly positive, at most 1,000,000.00.
///
/// ```rust
/// use storefront_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_err());
/// assert!(validate_price_cents(100_000_001).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: "cannot exceed 1,000,000".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level (non-negative; integrality is carried by the type).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional category label.
pub fn validate_category(category: Option<&str>) -> ValidationResult<()> {
    match category {
        Some(c) if c.trim().is_empty() => Err(ValidationError::Required {
            field: "category".to_string(),
        }),
        Some(c) if char_len(c.trim()) > CATEGORY_MAX => Err(ValidationError::TooLong {
            field: "category".to_string(),
            max: CATEGORY_MAX,
        }),
        _ => Ok(()),
    }
}

/// Validates every field of a product about to be created.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_product_description(&product.description)?;
    validate_price_cents(product.price_cents)?;
    validate_stock(product.stock)?;
    validate_category(product.category.as_deref())
}

/// Validates only the fields present in a partial update.
pub fn validate_product_update(update: &ProductUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_product_name(name)?;
    }
    if let Some(description) = &update.description {
        validate_product_description(description)?;
    }
    if let Some(price) = update.price_cents {
        validate_price_cents(price)?;
    }
    if let Some(stock) = update.stock {
        validate_stock(stock)?;
    }
    match &update.category {
        Some(category) => validate_category(category.as_deref()),
        None => Ok(()),
    }
}

// =============================================================================
// Order Validators
// =============================================================================

/// Validates a cart line quantity. The upper bound is the product's stock,
/// checked inside the order transaction.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional order description.
pub fn validate_order_description(description: Option<&str>) -> ValidationResult<()> {
    match description {
        Some(d) if char_len(d.trim()) > ORDER_DESCRIPTION_MAX => Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: ORDER_DESCRIPTION_MAX,
        }),
        _ => Ok(()),
    }
}

/// Validates a whole cart before the order transaction starts.
///
/// An empty cart is a business-rule failure; bad quantities are field
/// validation failures.
pub fn validate_cart(cart: &[CartLine]) -> Result<(), CoreError> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    for line in cart {
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("  buyer@example.com ").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a@.com").is_err());
        assert!(validate_email("a b@example.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Secret123").is_ok());

        assert!(validate_password("Sh0rt").is_err());
        assert!(validate_password("alllowercase1").is_err());
        assert!(validate_password("ALLUPPERCASE1").is_err());
        assert!(validate_password("NoDigitsHere").is_err());
        assert!(validate_password(&format!("Aa1{}", "x".repeat(100))).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice42").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("under_score").is_err());
        assert!(validate_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_product_fields() {
        assert!(validate_product_name("Widget").is_ok());
        assert!(validate_product_name("ab").is_err());
        assert!(validate_product_name(&"x".repeat(101)).is_err());

        assert!(validate_product_description("A simple widget for testing").is_ok());
        assert!(validate_product_description("too short").is_err());

        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());

        assert!(validate_price_cents(1).is_ok());
        assert!(validate_price_cents(100_000_000).is_ok());
        assert!(validate_price_cents(-5).is_err());

        assert!(validate_category(None).is_ok());
        assert!(validate_category(Some("tools")).is_ok());
        assert!(validate_category(Some("  ")).is_err());
    }

    #[test]
    fn test_validate_product_update_only_checks_supplied_fields() {
        let update = ProductUpdate {
            stock: Some(3),
            ..Default::default()
        };
        assert!(validate_product_update(&update).is_ok());

        let update = ProductUpdate {
            price_cents: Some(0),
            ..Default::default()
        };
        assert!(validate_product_update(&update).is_err());
    }

    #[test]
    fn test_validate_cart() {
        assert!(matches!(validate_cart(&[]), Err(CoreError::EmptyCart)));
        assert!(validate_cart(&[CartLine::new(1, 3)]).is_ok());
        assert!(matches!(
            validate_cart(&[CartLine::new(1, 0)]),
            Err(CoreError::Validation(_))
        ));

        assert!(validate_cart(&[CartLine::new(1, 1000)]).is_ok());

        let long: Vec<CartLine> = (1..=101).map(|i| CartLine::new(i, 1)).collect();
        assert!(validate_cart(&long).is_ok());
    }

    #[test]
    fn test_field_check_adapter() {
        let ok: FieldCheck = validate_stock(1).into();
        assert!(ok.valid);
        assert!(ok.message.is_none());

        let bad: FieldCheck = validate_stock(-1).into();
        assert!(!bad.valid);
        assert_eq!(bad.message.as_deref(), Some("stock cannot be negative"));
    }
}
