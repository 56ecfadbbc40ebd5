//! Order endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use common::{OrderId, ProductId};
use domain::{NewOrder, OrderFilter, OrderView};
use serde::Deserialize;
use store::{MarketStore, Order, OrderPatch, OrderStatus, PaymentStatus};

use super::auth::CurrentUser;
use super::page_from;
use crate::error::ApiError;
use crate::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub shipping_address: String,
    pub buyer_notes: Option<String>,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

fn validate_order(req: &CreateOrderRequest) -> Result<(), ApiError> {
    if req.quantity < 1 {
        return Err(ApiError::BadRequest(
            "quantity must be at least 1".to_string(),
        ));
    }
    if req.shipping_address.is_empty() {
        return Err(ApiError::BadRequest(
            "shipping address is required".to_string(),
        ));
    }
    Ok(())
}

async fn compose_all<S: MarketStore + Clone>(
    state: &AppState<S>,
    orders: Vec<Order>,
) -> Result<Vec<OrderView>, ApiError> {
    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        views.push(state.composer.order_view(order).await?);
    }
    Ok(views)
}

// -- Handlers --

/// POST /api/v1/orders — place an order as the caller.
#[tracing::instrument(skip(state, user, req))]
pub async fn create<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    validate_order(&req)?;

    let order = state
        .ledger
        .create(
            NewOrder {
                product_id: req.product_id,
                quantity: req.quantity,
                shipping_address: req.shipping_address,
                buyer_notes: req.buyer_notes,
            },
            user.id,
        )
        .await?;

    let view = state.composer.order_view(order).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/orders — the caller's orders as buyer.
#[tracing::instrument(skip(state, user, params))]
pub async fn purchases<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let page = page_from(params.skip, params.limit)?;
    let filter = OrderFilter {
        status: params.status,
        payment_status: params.payment_status,
    };
    let orders = state.ledger.list_for_user(user.id, &filter, page, true).await?;
    Ok(Json(compose_all(&state, orders).await?))
}

/// GET /api/v1/orders/sales — the caller's orders as seller.
#[tracing::instrument(skip(state, user, params))]
pub async fn sales<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let page = page_from(params.skip, params.limit)?;
    let filter = OrderFilter {
        status: params.status,
        payment_status: params.payment_status,
    };
    let orders = state
        .ledger
        .list_for_user(user.id, &filter, page, false)
        .await?;
    Ok(Json(compose_all(&state, orders).await?))
}

/// GET /api/v1/orders/{id} — an order the caller is involved in.
#[tracing::instrument(skip(state, user))]
pub async fn get<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>, ApiError> {
    let order = state
        .ledger
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    if order.buyer_id != user.id && order.seller_id != user.id {
        return Err(ApiError::Forbidden(
            "Not authorized to view this order".to_string(),
        ));
    }

    let view = state.composer.order_view(order).await?;
    Ok(Json(view))
}

/// PUT /api/v1/orders/{id} — seller-scoped update of status fields.
#[tracing::instrument(skip(state, user, patch))]
pub async fn update<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<OrderId>,
    Json(patch): Json<OrderPatch>,
) -> Result<Json<OrderView>, ApiError> {
    let order = state
        .ledger
        .update(id, &patch, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found or not authorized".to_string()))?;

    let view = state.composer.order_view(order).await?;
    Ok(Json(view))
}
