//! Order entry endpoints used by the Vue form demo

use super::AppState;
use crate::{
    core::{
        order::{self, ItemRequest, OrderDetail, OrderRequest, SelectionRequest},
        product::Extra,
    },
    entities::order_item,
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use tracing::instrument;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders/", post(create_order))
        .route("/api/orders/:id", get(get_order).delete(delete_order))
        .route("/api/orders/:id/items", post(add_item))
        .route(
            "/api/orders/:id/items/:item_id",
            patch(update_item).delete(delete_item),
        )
        .route(
            "/api/orders/:id/items/:item_id/selections",
            post(add_selection),
        )
        .route(
            "/api/orders/:id/items/:item_id/selections/:extra/:selection_id",
            delete(remove_selection),
        )
}

#[derive(Debug, Deserialize)]
struct QuantityUpdate {
    quantity: i32,
}

#[derive(Debug, Deserialize)]
struct NewSelection {
    extra: Extra,
    option_id: i64,
    #[serde(default)]
    quantity: Option<i32>,
    #[serde(default)]
    choice_id: Option<i64>,
}

#[instrument(skip(state, request))]
async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    let detail = order::place_order(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[instrument(skip(state))]
async fn get_order(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<OrderDetail>> {
    Ok(Json(order::get_order_details(&state.db, id).await?))
}

#[instrument(skip(state))]
async fn delete_order(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    order::delete_order(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, request))]
async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ItemRequest>,
) -> Result<(StatusCode, Json<order_item::Model>)> {
    let item = order::add_item(&state.db, id, &request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state))]
async fn update_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(i64, i64)>,
    Json(update): Json<QuantityUpdate>,
) -> Result<Json<order_item::Model>> {
    let item = order::update_item_quantity(&state.db, id, item_id, update.quantity).await?;
    Ok(Json(item))
}

#[instrument(skip(state))]
async fn delete_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(i64, i64)>,
) -> Result<StatusCode> {
    order::delete_item(&state.db, id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
async fn add_selection(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(i64, i64)>,
    Json(selection): Json<NewSelection>,
) -> Result<(StatusCode, Json<order_item::Model>)> {
    let request = SelectionRequest {
        option_id: selection.option_id,
        quantity: selection.quantity.unwrap_or(1),
        choice_id: selection.choice_id,
    };
    let item = order::add_selection(&state.db, id, item_id, selection.extra, &request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state))]
async fn remove_selection(
    State(state): State<AppState>,
    Path((id, item_id, extra, selection_id)): Path<(i64, i64, Extra, i64)>,
) -> Result<Json<order_item::Model>> {
    let item = order::remove_selection(&state.db, id, item_id, extra, selection_id).await?;
    Ok(Json(item))
}
