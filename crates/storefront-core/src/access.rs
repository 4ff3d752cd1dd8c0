//! # Access Control
//!
//! Maps a verified identity to the capability an operation requires.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request ──► Credential Service ──► Option<Identity>                    │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                        authorize(identity, capability)                  │
//! │                                          │                              │
//! │          ┌───────────────────────────────┼──────────────────────┐       │
//! │          ▼                               ▼                      ▼       │
//! │   None → Unauthorized      role < required → Forbidden      Ok(&id)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Operation                          | Capability      |
//! |------------------------------------|-----------------|
//! | create / update / delete product   | `Admin`         |
//! | place order, list / get own orders | `Authenticated` |
//!
//! Buyer ids are always taken from [`Identity::user_id`], never from a
//! request payload.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// Role
// =============================================================================

/// Role stored on a user record and carried in bearer tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(AccessError::Unauthorized),
        }
    }
}

// =============================================================================
// Identity
// =============================================================================

/// The authenticated principal behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: i64, role: Role) -> Self {
        Identity { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this identity holds the given capability.
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Authenticated => true,
            Capability::Admin => self.is_admin(),
        }
    }
}

// =============================================================================
// Capability
// =============================================================================

/// What an operation demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Any verified identity.
    Authenticated,
    /// A verified identity with `Role::Admin`.
    Admin,
}

/// Access failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// No credential, or one that failed verification.
    #[error("Authentication required. Please provide a valid authorization token.")]
    Unauthorized,

    /// Valid credential without the required role.
    #[error("You do not have permission to perform this action")]
    Forbidden,
}

/// Checks `identity` against `capability`.
///
/// ```rust
/// use storefront_core::access::{authorize, AccessError, Capability, Identity, Role};
///
/// let buyer = Identity::new(1, Role::User);
/// assert!(authorize(Some(&buyer), Capability::Authenticated).is_ok());
/// assert_eq!(authorize(Some(&buyer), Capability::Admin), Err(AccessError::Forbidden));
/// assert_eq!(authorize(None, Capability::Authenticated), Err(AccessError::Unauthorized));
/// ```
pub fn authorize(
    identity: Option<&Identity>,
    capability: Capability,
) -> Result<&Identity, AccessError> {
    let identity = identity.ok_or(AccessError::Unauthorized)?;
    if identity.has(capability) {
        Ok(identity)
    } else {
        Err(AccessError::Forbidden)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_every_capability() {
        let admin = Identity::new(1, Role::Admin);
        assert!(authorize(Some(&admin), Capability::Authenticated).is_ok());
        assert!(authorize(Some(&admin), Capability::Admin).is_ok());
    }

    #[test]
    fn test_missing_identity_is_unauthorized_for_both_levels() {
        assert_eq!(
            authorize(None, Capability::Admin),
            Err(AccessError::Unauthorized)
        );
        assert_eq!(
            authorize(None, Capability::Authenticated),
            Err(AccessError::Unauthorized)
        );
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("User".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}
