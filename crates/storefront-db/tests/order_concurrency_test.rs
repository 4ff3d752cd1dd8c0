//! Concurrent order placement against a file-backed database.
//!
//! Every task runs on its own pooled connection, so the only thing keeping
//! stock from going negative is the SQLite write lock plus the conditional
//! decrement.

use std::time::Duration;

use storefront_core::{CartLine, CoreError, NewProduct, NewUser, PageRequest, Role};
use storefront_db::{Database, DbConfig, DbError};

async fn file_db(dir: &tempfile::TempDir) -> Database {
    let config = DbConfig::new(dir.path().join("storefront.db"))
        .max_connections(8)
        .busy_timeout(Duration::from_secs(30));
    Database::new(config).await.unwrap()
}

async fn seed_user(db: &Database, username: &str, role: Role) -> i64 {
    let user = db
        .users()
        .insert(&NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$stub".to_string(),
        })
        .await
        .unwrap();
    if role == Role::Admin {
        db.users().set_role(user.id, role).await.unwrap();
    }
    user.id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_orders_never_oversell() {
    const STOCK: i64 = 5;
    const BUYERS: usize = 20;

    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;

    let owner = seed_user(&db, "owner", Role::Admin).await;
    let product = db
        .products()
        .create(
            owner,
            &NewProduct {
                name: "Limited Widget".to_string(),
                description: "Only a handful were made".to_string(),
                price_cents: 1000,
                stock: STOCK,
                category: None,
            },
        )
        .await
        .unwrap();

    let mut buyers = Vec::with_capacity(BUYERS);
    for i in 0..BUYERS {
        buyers.push(seed_user(&db, &format!("buyer{i}"), Role::User).await);
    }

    let product_id = product.id;
    let handles: Vec<_> = buyers
        .into_iter()
        .map(|buyer| {
            let db = db.clone();
            tokio::spawn(async move {
                db.orders()
                    .place_order(buyer, &[CartLine::new(product_id, 1)], None)
                    .await
            })
        })
        .collect();

    let mut placed = 0;
    let mut sold_out = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(DbError::Core(CoreError::InsufficientStock { available, .. })) => {
                assert_eq!(available, 0);
                sold_out += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(placed, STOCK as usize);
    assert_eq!(sold_out, BUYERS - STOCK as usize);
    assert_eq!(db.products().get_by_id(product.id).await.unwrap().stock, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_multi_line_orders_are_all_or_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;

    let owner = seed_user(&db, "owner", Role::Admin).await;
    let mut ids = Vec::new();
    for (name, stock) in [("Left Boot", 3), ("Right Boot", 3)] {
        let product = db
            .products()
            .create(
                owner,
                &NewProduct {
                    name: name.to_string(),
                    description: "One half of a pair of boots".to_string(),
                    price_cents: 4500,
                    stock,
                    category: Some("shoes".to_string()),
                },
            )
            .await
            .unwrap();
        ids.push(product.id);
    }
    let buyer = seed_user(&db, "walker", Role::User).await;

    // Alternate line order between tasks so lock acquisition is interleaved.
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let db = db.clone();
            let cart = if i % 2 == 0 {
                vec![CartLine::new(ids[0], 1), CartLine::new(ids[1], 1)]
            } else {
                vec![CartLine::new(ids[1], 1), CartLine::new(ids[0], 1)]
            };
            tokio::spawn(async move { db.orders().place_order(buyer, &cart, None).await })
        })
        .collect();

    let mut placed = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            placed += 1;
        }
    }

    assert_eq!(placed, 3);
    for id in ids {
        assert_eq!(db.products().get_by_id(id).await.unwrap().stock, 0);
    }

    let orders = db
        .orders()
        .list_for_buyer(buyer, None, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(orders.total, 3);
    assert!(orders.items.iter().all(|o| o.lines.len() == 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lock_timeout_aborts_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("storefront.db"))
        .max_connections(4)
        .busy_timeout(Duration::from_millis(200));
    let db = Database::new(config).await.unwrap();

    let owner = seed_user(&db, "owner", Role::Admin).await;
    let buyer = seed_user(&db, "buyer", Role::User).await;
    let product = db
        .products()
        .create(
            owner,
            &NewProduct {
                name: "Contested Widget".to_string(),
                description: "Everyone wants this one".to_string(),
                price_cents: 1000,
                stock: 10,
                category: None,
            },
        )
        .await
        .unwrap();

    // Another writer holds the lock for longer than the busy timeout.
    let mut holder = db.products().begin().await.unwrap();
    holder.take_stock(product.id, 1).await.unwrap();

    let err = db
        .orders()
        .place_order(buyer, &[CartLine::new(product.id, 2)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Busy), "unexpected error: {err}");
    assert!(err.is_unavailable());

    holder.rollback().await.unwrap();

    assert_eq!(db.products().get_by_id(product.id).await.unwrap().stock, 10);
    let orders = db
        .orders()
        .list_for_buyer(buyer, None, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(orders.total, 0);
}
