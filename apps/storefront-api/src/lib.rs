//! # Storefront API
//!
//! HTTP/JSON server over the catalog and order engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Storefront Routes                               │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────────┐  ┌────────────────────────┐ │
//! │  │  auth          │  │  products          │  │  orders                │ │
//! │  │                │  │                    │  │                        │ │
//! │  │ • register     │  │ • list / get       │  │ • place   (auth)       │ │
//! │  │ • login        │  │ • create  (admin)  │  │ • list    (auth)       │ │
//! │  │                │  │ • update  (admin)  │  │ • get     (auth)       │ │
//! │  │                │  │ • delete  (admin)  │  │                        │ │
//! │  └────────────────┘  └────────────────────┘  └────────────────────────┘ │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │                      Infrastructure                              │   │
//! │  │  SQLite (storefront-db) · CredentialService (argon2 + JWT)       │   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`].

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod response;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use storefront_db::Database;

// Re-exports
pub use auth::CredentialService;
pub use config::ApiConfig;
pub use error::{ApiError, ErrorKind};

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub db: Database,
    pub credentials: CredentialService,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Result<Self, ApiError> {
        let credentials = CredentialService::from_config(&config)?;
        Ok(AppState {
            db,
            credentials,
            config,
        })
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    use handlers::{auth, health, orders, products};

    error::expose_internal_detail(state.config.is_development());

    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/api/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route("/api/orders/{id}", get(orders::get_order))
        .fallback(|| async { ApiError::not_found("Route not found") })
        .with_state(state)
}
