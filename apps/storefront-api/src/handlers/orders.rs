//! Order endpoints. The buyer is always the token's user; any `userId` in
//! the body or query string is ignored.

use std::sync::Arc;

use axum::extract::State;
use storefront_core::{Page, PageRequest};

use crate::auth::Authenticated;
use crate::dto::{CreateOrderRequest, ListOrdersQuery, OrderView};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::response::ApiResponse;
use crate::AppState;

/// `POST /api/orders`
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Authenticated(buyer): Authenticated,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> ApiResult<ApiResponse<OrderView>> {
    let order = state
        .db
        .orders()
        .place_order(buyer.user_id, &req.products, req.description.as_deref())
        .await?;

    Ok(ApiResponse::created("Order created successfully", order.into()))
}

/// `GET /api/orders?status&page&pageSize`
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Authenticated(buyer): Authenticated,
    ApiQuery(query): ApiQuery<ListOrdersQuery>,
) -> ApiResult<ApiResponse<Page<OrderView>>> {
    let status = query.status()?;
    let page = PageRequest::new(query.page, query.page_size)?;
    let orders = state
        .db
        .orders()
        .list_for_buyer(buyer.user_id, status, page)
        .await?;

    Ok(ApiResponse::ok(
        "Orders retrieved successfully",
        orders.map(OrderView::from),
    ))
}

/// `GET /api/orders/{id}`
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Authenticated(buyer): Authenticated,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<ApiResponse<OrderView>> {
    let order = state.db.orders().get_for_buyer(buyer.user_id, id).await?;
    Ok(ApiResponse::ok("Order retrieved successfully", order.into()))
}
