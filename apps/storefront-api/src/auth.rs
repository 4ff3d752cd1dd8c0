//! # Credential Service
//!
//! Password hashing (argon2id) and bearer tokens (HS256 JWT), plus the axum
//! extractors that turn an `Authorization` header into an [`Identity`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register ── hash() ───────────────► users.password_hash                │
//! │  login ───── verify() ── issue() ──► { token, user }                    │
//! │                                                                         │
//! │  Authorization: Bearer <jwt>                                            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  verify_token() ──► Identity { user_id, role }                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  authorize(identity, Authenticated | Admin)                             │
//! │        ├── Authenticated(identity)  extractor                           │
//! │        └── AdminOnly(identity)      extractor                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm as Argon2Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use storefront_core::{authorize, AccessError, Capability, Identity, Role};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// Hashes and checks passwords, issues and verifies bearer tokens.
#[derive(Clone)]
pub struct CredentialService {
    hasher: Argon2<'static>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in_secs: i64,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("expires_in_secs", &self.expires_in_secs)
            .finish_non_exhaustive()
    }
}

impl CredentialService {
    /// Create a credential service.
    ///
    /// `memory_kib` and `iterations` are the argon2id cost parameters.
    pub fn new(
        secret: &str,
        expires_in_secs: i64,
        memory_kib: u32,
        iterations: u32,
    ) -> Result<Self, ApiError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| ApiError::internal(format!("Invalid argon2 parameters: {e}")))?;

        Ok(CredentialService {
            hasher: Argon2::new(Argon2Algorithm::Argon2id, Version::V0x13, params),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in_secs,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.jwt_secret,
            config.jwt_expires_in_secs,
            config.argon2_memory_kib,
            config.argon2_iterations,
        )
    }

    /// Hashes a password into a PHC string. Runs off the async executor.
    pub async fn hash(&self, plaintext: &str) -> Result<String, ApiError> {
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            hasher
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|hash| hash.to_string())
        })
        .await
        .map_err(|e| ApiError::internal(format!("Hashing task failed: {e}")))?
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))
    }

    /// Checks a password against a stored PHC string.
    ///
    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
    pub async fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, ApiError> {
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&hash)?;
            match hasher.verify_password(plaintext.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(|e| ApiError::internal(format!("Verification task failed: {e}")))?
        .map_err(|e| ApiError::internal(format!("Stored password hash is invalid: {e}")))
    }

    /// Issues a bearer token for `identity`.
    pub fn issue(&self, identity: &Identity) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expires_in_secs);

        let claims = Claims {
            sub: identity.user_id.to_string(),
            role: identity.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("Failed to generate token: {e}")))
    }

    /// Validates a bearer token and returns the identity it carries.
    pub fn verify_token(&self, token: &str) -> Result<Identity, AccessError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                JwtErrorKind::ExpiredSignature => debug!("Rejected expired token"),
                other => warn!(reason = ?other, "Rejected invalid token"),
            }
            AccessError::Unauthorized
        })?;

        let user_id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AccessError::Unauthorized)?;

        Ok(Identity::new(user_id, data.claims.role))
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Identity behind the request's bearer token, if any.
fn identify(parts: &Parts, credentials: &CredentialService) -> Option<Identity> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = extract_bearer_token(header)?;
    credentials.verify_token(token).ok()
}

// =============================================================================
// Extractors
// =============================================================================

/// Any verified caller.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

/// A verified caller with the admin role.
#[derive(Debug, Clone)]
pub struct AdminOnly(pub Identity);

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let identity = identify(parts, &state.credentials);
        let identity = authorize(identity.as_ref(), Capability::Authenticated)?;
        Ok(Authenticated(identity.clone()))
    }
}

impl FromRequestParts<Arc<AppState>> for AdminOnly {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let identity = identify(parts, &state.credentials);
        let identity = authorize(identity.as_ref(), Capability::Admin).map_err(|e| {
            if e == AccessError::Forbidden {
                warn!(path = %parts.uri.path(), "Non-admin attempted admin operation");
            }
            e
        })?;
        Ok(AdminOnly(identity.clone()))
    }
}
