//! Catalog endpoints. Reads are public; writes need an admin token.

use std::sync::Arc;

use axum::extract::State;
use storefront_core::{Page, PageRequest};

use crate::auth::AdminOnly;
use crate::dto::{CreateProductRequest, ListProductsQuery, ProductView, UpdateProductRequest};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::response::ApiResponse;
use crate::AppState;

/// `GET /api/products?category&search&page&pageSize`
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListProductsQuery>,
) -> ApiResult<ApiResponse<Page<ProductView>>> {
    let page = PageRequest::new(query.page, query.page_size)?;
    let products = state.db.products().list(&query.filter(), page).await?;

    Ok(ApiResponse::ok(
        "Products retrieved successfully",
        products.map(ProductView::from),
    ))
}

/// `GET /api/products/{id}`
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<ApiResponse<ProductView>> {
    let product = state.db.products().get_by_id(id).await?;
    Ok(ApiResponse::ok("Product retrieved successfully", product.into()))
}

/// `POST /api/products` (admin)
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    AdminOnly(admin): AdminOnly,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> ApiResult<ApiResponse<ProductView>> {
    let new_product = req.into_new_product()?;
    let product = state.db.products().create(admin.user_id, &new_product).await?;

    Ok(ApiResponse::created("Product created successfully", product.into()))
}

/// `PUT /api/products/{id}` (admin)
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    AdminOnly(_admin): AdminOnly,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> ApiResult<ApiResponse<ProductView>> {
    let update = req.into_update()?;
    let product = state.db.products().update(id, &update).await?;

    Ok(ApiResponse::ok("Product updated successfully", product.into()))
}

/// `DELETE /api/products/{id}` (admin)
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    AdminOnly(_admin): AdminOnly,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<ApiResponse<()>> {
    state.db.products().soft_delete(id).await?;
    Ok(ApiResponse::ok("Product deleted successfully", ()))
}
