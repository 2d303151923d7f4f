//! Order read and status update.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::OrderStatus;

use super::auth::AdminUser;
use super::error::ApiError;
use super::responses::ok;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: String,
}

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.store.list_orders().await?))
}

pub async fn get(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .store
        .order(id)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    Ok(ok(order))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status: OrderStatus = req.status.parse().map_err(|_| {
        let allowed: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
        ApiError::Validation(format!(
            "Invalid status. Must be one of: {}",
            allowed.join(", ")
        ))
    })?;

    let order = state
        .store
        .update_order_status(id, status)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    Ok(ok(order))
}
