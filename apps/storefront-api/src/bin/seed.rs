//! # Seed Data Generator
//!
//! Creates an admin account and a small starter catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./storefront.db with the default admin
//! cargo run -p storefront-api --bin seed
//!
//! # Specify database path and admin credentials
//! cargo run -p storefront-api --bin seed -- --db ./data/shop.db \
//!     --admin-email owner@example.com --admin-password Owner1234
//! ```
//!
//! Running it twice is harmless: the admin is reused when the email
//! already exists, and products are only added to an empty catalog.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use storefront_api::CredentialService;
use storefront_core::{NewProduct, NewUser, PageRequest, ProductFilter, Role};
use storefront_db::{Database, DbConfig};

/// `(name, description, price_cents, stock, category)`
const PRODUCTS: &[(&str, &str, i64, i64, &str)] = &[
    ("Widget", "A simple widget for everyday use", 1000, 25, "gadgets"),
    ("Gizmo", "A gizmo with three useful settings", 2499, 10, "gadgets"),
    ("Desk Lamp", "Adjustable LED desk lamp with dimmer", 3450, 8, "home"),
    ("Coffee Mug", "Ceramic mug that holds 350 ml of coffee", 899, 40, "home"),
    ("Notebook", "A5 dotted notebook with 120 pages", 650, 60, "stationery"),
    ("Fountain Pen", "Steel nib fountain pen, medium point", 4200, 5, "stationery"),
];

struct Args {
    db: PathBuf,
    admin_username: String,
    admin_email: String,
    admin_password: String,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        db: PathBuf::from("storefront.db"),
        admin_username: "admin".to_string(),
        admin_email: "admin@example.com".to_string(),
        admin_password: "Admin1234".to_string(),
    };

    let mut iter = env::args().skip(1);
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .with_context(|| format!("missing value for {flag}"))?;
        match flag.as_str() {
            "--db" => args.db = PathBuf::from(value),
            "--admin-username" => args.admin_username = value,
            "--admin-email" => args.admin_email = value.trim().to_lowercase(),
            "--admin-password" => args.admin_password = value,
            other => bail!("unknown argument: {other}"),
        }
    }

    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;

    println!("Seeding database at {}", args.db.display());
    let db = Database::new(DbConfig::new(args.db.clone()))
        .await
        .context("failed to open database")?;

    let admin = match db.users().find_by_email(&args.admin_email).await? {
        Some(user) => {
            println!("Admin {} already exists", user.email);
            user
        }
        None => {
            let credentials = CredentialService::new("seed", 60, 19_456, 2)?;
            let password_hash = credentials.hash(&args.admin_password).await?;
            let user = db
                .users()
                .insert(&NewUser {
                    username: args.admin_username.clone(),
                    email: args.admin_email.clone(),
                    password_hash,
                })
                .await?;
            println!("Created admin {}", user.email);
            user
        }
    };
    let admin = db.users().set_role(admin.id, Role::Admin).await?;

    let existing = db
        .products()
        .list(&ProductFilter::default(), PageRequest::default())
        .await?;
    if existing.total > 0 {
        println!("Catalog already has {} products, skipping", existing.total);
    } else {
        for (name, description, price_cents, stock, category) in PRODUCTS {
            db.products()
                .create(
                    admin.id,
                    &NewProduct {
                        name: name.to_string(),
                        description: description.to_string(),
                        price_cents: *price_cents,
                        stock: *stock,
                        category: Some(category.to_string()),
                    },
                )
                .await?;
        }
        println!("Inserted {} products", PRODUCTS.len());
    }

    db.close().await;
    println!("Done.");
    Ok(())
}
