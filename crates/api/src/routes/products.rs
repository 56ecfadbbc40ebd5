//! Product listing endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use common::{Money, ProductId};
use domain::{NewProduct, ProductView};
use serde::Deserialize;
use store::{MarketStore, Product, ProductCondition, ProductPatch, ProductQuery};

use super::auth::CurrentUser;
use super::page_from;
use crate::error::ApiError;
use crate::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    #[serde(default)]
    pub condition: ProductCondition,
    #[serde(default)]
    pub images: Vec<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub condition: Option<ProductCondition>,
    pub location: Option<String>,
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

fn validate_listing(req: &CreateProductRequest) -> Result<(), ApiError> {
    if req.title.is_empty() || req.title.len() > 200 {
        return Err(ApiError::BadRequest(
            "title must be between 1 and 200 characters".to_string(),
        ));
    }
    if req.description.is_empty() || req.description.len() > 2000 {
        return Err(ApiError::BadRequest(
            "description must be between 1 and 2000 characters".to_string(),
        ));
    }
    if !req.price.is_positive() {
        return Err(ApiError::BadRequest("price must be positive".to_string()));
    }
    if req.category.is_empty() || req.category.len() > 50 {
        return Err(ApiError::BadRequest(
            "category must be between 1 and 50 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_patch(patch: &ProductPatch) -> Result<(), ApiError> {
    if let Some(title) = &patch.title
        && (title.is_empty() || title.len() > 200)
    {
        return Err(ApiError::BadRequest(
            "title must be between 1 and 200 characters".to_string(),
        ));
    }
    if let Some(price) = patch.price
        && !price.is_positive()
    {
        return Err(ApiError::BadRequest("price must be positive".to_string()));
    }
    Ok(())
}

// -- Handlers --

/// POST /api/v1/products — create a listing owned by the caller.
#[tracing::instrument(skip(state, user, req))]
pub async fn create<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductView>), ApiError> {
    validate_listing(&req)?;

    let product = state
        .catalog
        .create(
            NewProduct {
                title: req.title,
                description: req.description,
                price: req.price,
                category: req.category,
                condition: req.condition,
                images: req.images,
                location: req.location,
                tags: req.tags,
            },
            user.id,
        )
        .await?;

    let view = state.composer.product_view(product).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/products — filtered public listing of active products.
#[tracing::instrument(skip(state, params))]
pub async fn list<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    let page = page_from(params.skip, params.limit)?;
    let query = ProductQuery {
        category: params.category,
        min_price: params.min_price,
        max_price: params.max_price,
        condition: params.condition,
        location: params.location,
        search: params.search,
    };

    let products = state.catalog.list(&query, page).await?;
    let mut views = Vec::with_capacity(products.len());
    for product in products {
        views.push(state.composer.product_view(product).await?);
    }
    Ok(Json(views))
}

/// GET /api/v1/products/my-products — the caller's own listings.
#[tracing::instrument(skip(state, user, params))]
pub async fn my_products<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let page = page_from(params.skip, params.limit)?;
    let products = state.catalog.list_by_seller(user.id, page).await?;
    Ok(Json(products))
}

/// GET /api/v1/products/{id} — public read; counts a view.
///
/// The response carries the pre-increment view count.
#[tracing::instrument(skip(state))]
pub async fn get<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>, ApiError> {
    let product = state
        .catalog
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;
    let view = state.composer.product_view(product).await?;
    Ok(Json(view))
}

/// PUT /api/v1/products/{id} — owner-scoped partial update.
#[tracing::instrument(skip(state, user, patch))]
pub async fn update<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ProductId>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<ProductView>, ApiError> {
    validate_patch(&patch)?;

    let product = state
        .catalog
        .update(id, &patch, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found or not authorized".to_string()))?;
    let view = state.composer.product_view(product).await?;
    Ok(Json(view))
}

/// DELETE /api/v1/products/{id} — owner-scoped delete.
#[tracing::instrument(skip(state, user))]
pub async fn remove<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ProductId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state.catalog.delete(id, user.id).await?;
    if !deleted {
        return Err(ApiError::NotFound(
            "Product not found or not authorized".to_string(),
        ));
    }
    Ok(Json(
        serde_json::json!({ "message": "Product deleted successfully" }),
    ))
}
