//! Request and response bodies.
//!
//! Prices travel as decimal strings (`"10.00"`) next to their raw cent
//! values; incoming prices may be JSON numbers or strings and are parsed
//! into cents without going through floating point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::{
    CartLine, Money, NewProduct, Order, OrderDetails, OrderLine, OrderStatus, Product,
    ProductFilter, ProductUpdate, Role, User, ValidationError,
};
use storefront_core::types::present;

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginView {
    pub token: String,
    pub user: UserView,
}

// =============================================================================
// Products
// =============================================================================

/// A price as the client sent it: `10`, `10.5` or `"10.50"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(serde_json::Number),
    Text(String),
}

impl PriceInput {
    pub fn to_money(&self) -> Result<Money, ValidationError> {
        match self {
            PriceInput::Number(n) => Money::parse_decimal(&n.to_string()),
            PriceInput::Text(s) => Money::parse_decimal(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: PriceInput,
    pub stock: i64,
    pub category: Option<String>,
}

impl CreateProductRequest {
    pub fn into_new_product(self) -> Result<NewProduct, ValidationError> {
        Ok(NewProduct {
            price_cents: self.price.to_money()?.cents(),
            name: self.name,
            description: self.description,
            stock: self.stock,
            category: self.category,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<PriceInput>,
    pub stock: Option<i64>,
    /// `null` clears the category; omitting it keeps the current one.
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
}

impl UpdateProductRequest {
    pub fn into_update(self) -> Result<ProductUpdate, ValidationError> {
        let price_cents = match &self.price {
            Some(price) => Some(price.to_money()?.cents()),
            None => None,
        };
        Ok(ProductUpdate {
            name: self.name,
            description: self.description,
            price_cents,
            stock: self.stock,
            category: self.category,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    #[serde(alias = "limit")]
    pub page_size: Option<u32>,
}

impl ListProductsQuery {
    /// Blank filter values are treated as absent.
    pub fn filter(&self) -> ProductFilter {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        ProductFilter {
            category: non_blank(&self.category),
            search: non_blank(&self.search),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: String,
    pub price_cents: i64,
    pub stock: i64,
    pub category: Option<String>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductView {
    fn from(p: Product) -> Self {
        ProductView {
            price: p.price().to_string(),
            id: p.id,
            name: p.name,
            description: p.description,
            price_cents: p.price_cents,
            stock: p.stock,
            category: p.category,
            user_id: p.user_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub description: Option<String>,
    #[serde(alias = "items")]
    pub products: Vec<CartLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    #[serde(alias = "limit")]
    pub page_size: Option<u32>,
}

impl ListOrdersQuery {
    pub fn status(&self) -> Result<Option<OrderStatus>, ValidationError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    pub id: i64,
    pub product_id: i64,
    pub position: i64,
    pub name: String,
    pub unit_price: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub line_total: String,
    pub line_total_cents: i64,
}

impl From<OrderLine> for OrderLineView {
    fn from(line: OrderLine) -> Self {
        OrderLineView {
            unit_price: Money::from_cents(line.unit_price_cents).to_string(),
            line_total: line.line_total().to_string(),
            id: line.id,
            product_id: line.product_id,
            position: line.position,
            name: line.name_snapshot,
            unit_price_cents: line.unit_price_cents,
            quantity: line.quantity,
            line_total_cents: line.line_total_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: i64,
    pub user_id: i64,
    pub description: Option<String>,
    pub total_price: String,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
}

impl From<OrderDetails> for OrderView {
    fn from(details: OrderDetails) -> Self {
        let OrderDetails { order, lines } = details;
        let Order {
            id,
            user_id,
            description,
            total_cents,
            status,
            created_at,
        } = order;

        OrderView {
            id,
            user_id,
            description,
            total_price: Money::from_cents(total_cents).to_string(),
            total_cents,
            status,
            created_at,
            lines: lines.into_iter().map(OrderLineView::from).collect(),
        }
    }
}
