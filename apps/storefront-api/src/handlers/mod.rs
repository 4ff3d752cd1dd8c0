//! HTTP handlers, one module per resource.

pub mod auth;
pub mod health;
pub mod orders;
pub mod products;
