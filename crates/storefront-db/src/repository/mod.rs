//! # Repository Module
//!
//! Database repository implementations for Storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  db.orders().place_order(buyer_id, &cart, None)                 │
//! │       ▼                                                                 │
//! │  OrderRepository ──── begin() ───► CatalogTransaction                   │
//! │       │                             └── take_stock(product, qty)        │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD, listing, stock decrement
//! - [`OrderRepository`](order::OrderRepository) - Order placement and buyer-scoped reads
//! - [`UserRepository`](user::UserRepository) - Accounts and roles

pub mod order;
pub mod product;
pub mod user;
