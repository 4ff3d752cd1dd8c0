//! # Product Repository
//!
//! Catalog storage: CRUD, filtered listing and the transactional stock
//! decrement the order engine is built on.
//!
//! ## Visibility
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  is_active = 1  →  listed, fetchable, orderable                         │
//! │  is_active = 0  →  invisible to the catalog, still referenced by        │
//! │                    historical order lines                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Decrement
//! ```text
//! UPDATE products
//!    SET stock = stock - :qty
//!  WHERE id = :id AND is_active = 1 AND stock >= :qty
//! RETURNING name, price_cents, stock
//!
//!   1 row  → stock taken, price/name captured for the snapshot
//!   0 rows → look the product up in the same transaction:
//!              missing/inactive → ProductNotFound
//!              otherwise        → InsufficientStock { available, requested }
//! ```
//! The statement is a write, so the enclosing transaction holds SQLite's
//! write lock from its first decrement until commit or rollback.

use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use storefront_core::validation::{validate_new_product, validate_product_update};
use storefront_core::{CoreError, NewProduct, Page, PageRequest, Product, ProductFilter, ProductUpdate};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets an active product by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Product> {
        let product: Option<Product> = sqlx::query_as(
            r#"
            SELECT id, name, description, price_cents, stock, category,
                   user_id, is_active, created_at, updated_at
            FROM products
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        product.ok_or_else(|| CoreError::ProductNotFound(id).into())
    }

    /// Lists active products, newest first.
    ///
    /// ## Filters
    /// - `category`: exact match
    /// - `search`: case-insensitive substring of the name; `%` and `_` in the
    ///   term match literally
    pub async fn list(&self, filter: &ProductFilter, page: PageRequest) -> DbResult<Page<Product>> {
        let category = filter.category.as_deref();
        let search = filter.search.as_deref().map(escape_like);

        debug!(?category, search = ?filter.search, page = page.page, "Listing products");

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE is_active = 1
              AND (?1 IS NULL OR category = ?1)
              AND (?2 IS NULL OR LOWER(name) LIKE '%' || LOWER(?2) || '%' ESCAPE '\')
            "#,
        )
        .bind(category)
        .bind(search.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let items: Vec<Product> = sqlx::query_as(
            r#"
            SELECT id, name, description, price_cents, stock, category,
                   user_id, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1
              AND (?1 IS NULL OR category = ?1)
              AND (?2 IS NULL OR LOWER(name) LIKE '%' || LOWER(?2) || '%' ESCAPE '\')
            ORDER BY id DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(category)
        .bind(search.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, page, total))
    }

    /// Creates a product owned by `owner_id`.
    pub async fn create(&self, owner_id: i64, product: &NewProduct) -> DbResult<Product> {
        validate_new_product(product).map_err(CoreError::from)?;

        let now = Utc::now();
        let category = product.category.as_deref().map(str::trim);

        let created: Product = sqlx::query_as(
            r#"
            INSERT INTO products (
                name, description, price_cents, stock, category,
                user_id, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            RETURNING id, name, description, price_cents, stock, category,
                      user_id, is_active, created_at, updated_at
            "#,
        )
        .bind(product.name.trim())
        .bind(product.description.trim())
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(category)
        .bind(owner_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(id = created.id, name = %created.name, owner_id, "Product created");
        Ok(created)
    }

    /// Applies a partial update. Only supplied fields are validated and
    /// written; `updated_at` is always bumped.
    pub async fn update(&self, id: i64, update: &ProductUpdate) -> DbResult<Product> {
        validate_product_update(update).map_err(CoreError::from)?;

        debug!(id, ?update, "Updating product");

        let updated: Option<Product> = sqlx::query_as(
            r#"
            UPDATE products SET
                name        = COALESCE(?1, name),
                description = COALESCE(?2, description),
                price_cents = COALESCE(?3, price_cents),
                stock       = COALESCE(?4, stock),
                category    = CASE WHEN ?5 THEN ?6 ELSE category END,
                updated_at  = ?7
            WHERE id = ?8 AND is_active = 1
            RETURNING id, name, description, price_cents, stock, category,
                      user_id, is_active, created_at, updated_at
            "#,
        )
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description.as_deref().map(str::trim))
        .bind(update.price_cents)
        .bind(update.stock)
        .bind(update.category.is_some())
        .bind(update.category.as_ref().and_then(|c| c.as_deref()).map(str::trim))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| CoreError::ProductNotFound(id).into())
    }

    /// Soft-deletes a product. Order lines keep pointing at it.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?1 WHERE id = ?2 AND is_active = 1",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id).into());
        }

        info!(id, "Product deactivated");
        Ok(())
    }

    /// Starts a catalog transaction.
    pub async fn begin(&self) -> DbResult<CatalogTransaction> {
        CatalogTransaction::begin(&self.pool).await
    }
}

// =============================================================================
// Catalog Transaction
// =============================================================================

/// Stock taken for one cart line.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StockTake {
    pub name: String,
    /// Current catalog price, captured inside the transaction.
    pub price_cents: i64,
    /// Stock left after the decrement.
    pub stock: i64,
}

#[derive(sqlx::FromRow)]
struct StockSnapshot {
    name: String,
    stock: i64,
    is_active: bool,
}

/// A scoped write transaction over the catalog.
///
/// ```text
/// begin() ──► take_stock() ... ──► (order inserts via connection()) ──► commit()
///                     │
///                     └── any error: drop the value, everything rolls back
/// ```
pub struct CatalogTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl CatalogTransaction {
    pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool.begin().await?;
        Ok(CatalogTransaction { tx })
    }

    /// Conditionally decrements `product_id` by `quantity`.
    ///
    /// Never leaves stock negative: if the product cannot cover the quantity
    /// nothing is written and the reason is returned.
    pub async fn take_stock(&mut self, product_id: i64, quantity: i64) -> DbResult<StockTake> {
        let taken: Option<StockTake> = sqlx::query_as(
            r#"
            UPDATE products
               SET stock = stock - ?1, updated_at = ?2
             WHERE id = ?3 AND is_active = 1 AND stock >= ?1
            RETURNING name, price_cents, stock
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        if let Some(taken) = taken {
            debug!(product_id, quantity, remaining = taken.stock, "Stock taken");
            return Ok(taken);
        }

        let snapshot: Option<StockSnapshot> =
            sqlx::query_as("SELECT name, stock, is_active FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut *self.tx)
                .await?;

        let err = match snapshot {
            Some(p) if p.is_active => CoreError::InsufficientStock {
                product_id,
                name: p.name,
                available: p.stock,
                requested: quantity,
            },
            _ => CoreError::ProductNotFound(product_id),
        };
        debug!(product_id, quantity, error = %err, "Stock not taken");
        Err(err.into())
    }

    /// The underlying connection, for writes that must share this transaction.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::Busy => DbError::Busy,
                other => DbError::TransactionFailed(other.to_string()),
            })
    }

    /// Explicit rollback. Dropping the transaction has the same effect.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Escapes LIKE wildcards so the term matches literally under `ESCAPE '\'`.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// =============================================================================
// Unit Tests
// =============================================================================
