//! Fixtures shared by the repository tests.

use crate::pool::{Database, DbConfig};
use storefront_core::{NewProduct, NewUser, Role};

pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Inserts a buyer account and returns its id.
pub async fn seed_buyer(db: &Database, username: &str) -> i64 {
    db.users()
        .insert(&NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$stub".to_string(),
        })
        .await
        .unwrap()
        .id
}

/// Inserts an admin account and returns its id.
pub async fn seed_owner(db: &Database) -> i64 {
    let id = seed_buyer(db, "admin").await;
    db.users().set_role(id, Role::Admin).await.unwrap();
    id
}

pub fn new_product(name: &str, price_cents: i64, stock: i64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: format!("{name} for everyday testing"),
        price_cents,
        stock,
        category: None,
    }
}
