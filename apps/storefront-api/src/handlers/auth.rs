//! Registration and login.

use std::sync::Arc;

use axum::extract::State;
use storefront_core::validation::{validate_email, validate_password, validate_username};
use storefront_core::{Identity, NewUser};
use tracing::{info, warn};

use crate::dto::{LoginRequest, LoginView, RegisterRequest, UserView};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::AppState;

/// Emails are compared and stored trimmed and lower-cased.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid credentials").with_errors(vec!["Invalid email or password".to_string()])
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<ApiResponse<UserView>> {
    let errors: Vec<String> = [
        validate_username(&req.username),
        validate_email(&req.email),
        validate_password(&req.password),
    ]
    .into_iter()
    .filter_map(Result::err)
    .map(|e| e.to_string())
    .collect();

    if !errors.is_empty() {
        return Err(ApiError::validation("Validation failed").with_errors(errors));
    }

    let password_hash = state.credentials.hash(&req.password).await?;
    let user = state
        .db
        .users()
        .insert(&NewUser {
            username: req.username.trim().to_string(),
            email: normalize_email(&req.email),
            password_hash,
        })
        .await?;

    Ok(ApiResponse::created("User registered successfully", user.into()))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<ApiResponse<LoginView>> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }
    if validate_email(&req.email).is_err() {
        return Err(ApiError::validation("Invalid email format")
            .with_errors(vec!["Email must be a valid email address format".to_string()]));
    }

    let email = normalize_email(&req.email);
    let Some(user) = state.db.users().find_by_email(&email).await? else {
        warn!("Login rejected: unknown email");
        return Err(invalid_credentials());
    };

    if !state.credentials.verify(&req.password, &user.password_hash).await? {
        warn!(user_id = user.id, "Login rejected: wrong password");
        return Err(invalid_credentials());
    }

    let token = state.credentials.issue(&Identity::new(user.id, user.role))?;
    info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(ApiResponse::ok(
        "Login successful",
        LoginView {
            token,
            user: user.into(),
        },
    ))
}
