//! # Order Repository
//!
//! The order engine: turns a cart into a committed order atomically.
//!
//! ## Placement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       place_order()                                     │
//! │                                                                         │
//! │  1. VALIDATE (no writes yet)                                            │
//! │     └── non-empty cart, every qty ≥ 1                                   │
//! │                                                                         │
//! │  2. BEGIN catalog transaction                                           │
//! │                                                                         │
//! │  3. FOR EACH LINE, in cart order                                        │
//! │     └── take_stock(product, qty)   ← conditional decrement              │
//! │         ├── ok   → snapshot name + current price, add to total          │
//! │         └── fail → return error, transaction dropped (rollback)         │
//! │                                                                         │
//! │  4. INSERT order (pending) + lines (with cart positions)                │
//! │                                                                         │
//! │  5. COMMIT                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repeated product ids in one cart are consecutive decrements against the
//! running balance, since every step sees the transaction's own writes.

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::error::DbResult;
use crate::repository::product::CatalogTransaction;
use storefront_core::validation::{validate_cart, validate_order_description};
use storefront_core::{
    CartLine, CoreError, Money, Order, OrderDetails, OrderLine, OrderStatus, Page, PageRequest,
    ValidationError,
};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

/// A cart line after its stock has been taken.
struct ResolvedLine {
    product_id: i64,
    name: String,
    unit_price: Money,
    quantity: i64,
    line_total: Money,
}

fn total_overflow() -> CoreError {
    ValidationError::Overflow {
        field: "total".to_string(),
    }
    .into()
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Places an order for `buyer_id`.
    ///
    /// Either every line's stock is decremented and the order with all its
    /// lines is stored, or nothing changes.
    ///
    /// ## Errors
    /// - `CoreError::EmptyCart` / `Validation` before any write
    /// - `ValidationError::Overflow` when a line or the total exceeds `i64` cents
    /// - `CoreError::ProductNotFound` for a missing or inactive product
    /// - `CoreError::InsufficientStock` for the first line that cannot be covered
    /// - `DbError::Busy` when the write lock was not obtained in time
    pub async fn place_order(
        &self,
        buyer_id: i64,
        cart: &[CartLine],
        description: Option<&str>,
    ) -> DbResult<OrderDetails> {
        validate_cart(cart)?;
        validate_order_description(description).map_err(CoreError::from)?;

        let description = description.map(str::trim).filter(|d| !d.is_empty());
        debug!(buyer_id, lines = cart.len(), "Placing order");

        let mut tx = CatalogTransaction::begin(&self.pool).await?;

        let mut resolved = Vec::with_capacity(cart.len());
        let mut total = Money::zero();
        for line in cart {
            let taken = match tx.take_stock(line.product_id, line.quantity).await {
                Ok(taken) => taken,
                Err(e) => {
                    warn!(buyer_id, product_id = line.product_id, error = %e, "Order rejected");
                    return Err(e);
                }
            };

            let unit_price = Money::from_cents(taken.price_cents);
            let line_total = unit_price
                .checked_multiply_quantity(line.quantity)
                .ok_or_else(total_overflow)?;
            total = total.checked_add(line_total).ok_or_else(total_overflow)?;
            resolved.push(ResolvedLine {
                product_id: line.product_id,
                name: taken.name,
                unit_price,
                quantity: line.quantity,
                line_total,
            });
        }

        let order: Order = sqlx::query_as(
            r#"
            INSERT INTO orders (user_id, description, total_cents, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, user_id, description, total_cents, status, created_at
            "#,
        )
        .bind(buyer_id)
        .bind(description)
        .bind(total.cents())
        .bind(OrderStatus::Pending)
        .bind(Utc::now())
        .fetch_one(tx.connection())
        .await?;

        let mut lines = Vec::with_capacity(resolved.len());
        for (position, line) in resolved.into_iter().enumerate() {
            let stored: OrderLine = sqlx::query_as(
                r#"
                INSERT INTO order_lines (
                    order_id, product_id, position, name_snapshot,
                    unit_price_cents, quantity, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                RETURNING id, order_id, product_id, position, name_snapshot,
                          unit_price_cents, quantity, line_total_cents
                "#,
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(position as i64)
            .bind(&line.name)
            .bind(line.unit_price.cents())
            .bind(line.quantity)
            .bind(line.line_total.cents())
            .fetch_one(tx.connection())
            .await?;
            lines.push(stored);
        }

        tx.commit().await?;

        info!(
            order_id = order.id,
            buyer_id,
            total = %order.total(),
            lines = lines.len(),
            "Order placed"
        );
        Ok(OrderDetails { order, lines })
    }

    /// Lists `buyer_id`'s orders, newest first, each with its lines.
    pub async fn list_for_buyer(
        &self,
        buyer_id: i64,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> DbResult<Page<OrderDetails>> {
        debug!(buyer_id, ?status, page = page.page, "Listing orders");

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)",
        )
        .bind(buyer_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let orders: Vec<Order> = sqlx::query_as(
            r#"
            SELECT id, user_id, description, total_cents, status, created_at
            FROM orders
            WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)
            ORDER BY id DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(buyer_id)
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let mut lines_by_order = self.lines_for(&orders).await?;
        let items = orders
            .into_iter()
            .map(|order| {
                let lines = lines_by_order.remove(&order.id).unwrap_or_default();
                OrderDetails { order, lines }
            })
            .collect();

        Ok(Page::new(items, page, total))
    }

    /// Fetches one of `buyer_id`'s orders. Someone else's order is reported
    /// exactly like a missing one.
    pub async fn get_for_buyer(&self, buyer_id: i64, order_id: i64) -> DbResult<OrderDetails> {
        let order: Option<Order> = sqlx::query_as(
            r#"
            SELECT id, user_id, description, total_cents, status, created_at
            FROM orders
            WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(order_id)
        .bind(buyer_id)
        .fetch_optional(&self.pool)
        .await?;

        let order = order.ok_or(CoreError::OrderNotFound(order_id))?;
        let lines = self
            .lines_for(std::slice::from_ref(&order))
            .await?
            .remove(&order.id)
            .unwrap_or_default();

        Ok(OrderDetails { order, lines })
    }

    /// Loads the lines of `orders`, grouped by order id and sorted by position.
    async fn lines_for(&self, orders: &[Order]) -> DbResult<HashMap<i64, Vec<OrderLine>>> {
        let mut grouped: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        if orders.is_empty() {
            return Ok(grouped);
        }

        let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            r#"
            SELECT id, order_id, product_id, position, name_snapshot,
                   unit_price_cents, quantity, line_total_cents
            FROM order_lines
            WHERE order_id IN ("#,
        );
        let mut ids = query.separated(", ");
        for order in orders {
            ids.push_bind(order.id);
        }
        ids.push_unseparated(") ORDER BY order_id, position");

        let lines: Vec<OrderLine> = query.build_query_as().fetch_all(&self.pool).await?;
        for line in lines {
            grouped.entry(line.order_id).or_default().push(line);
        }

        Ok(grouped)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
