//! Catalog CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::store::{NewProduct, ProductFilter, ProductPatch};

use super::auth::{validation_message, AdminUser};
use super::error::ApiError;
use super::responses::{ok, ok_with_message};
use super::state::AppState;

const DEFAULT_IMAGE: &str = "📦";

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub stock: i32,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub description: Option<String>,
}

fn check_price(price: Decimal) -> Result<(), ApiError> {
    if price <= Decimal::ZERO {
        return Err(ApiError::Validation("Price must be a positive number".into()));
    }
    Ok(())
}

fn check_stock(stock: i32) -> Result<(), ApiError> {
    if stock < 0 {
        return Err(ApiError::Validation("Stock must be a non-negative number".into()));
    }
    Ok(())
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = ProductFilter { category: params.category, search: params.search };
    let products = state.store.list_products(&filter).await?;
    Ok(ok(products))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .store
        .product(id)
        .await?
        .ok_or(ApiError::NotFound("Product"))?;
    Ok(ok(product))
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(validation_message)?;
    check_price(req.price)?;
    check_stock(req.stock)?;

    let product = state
        .store
        .create_product(NewProduct {
            name: req.name,
            price: req.price,
            image: req.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            stock: req.stock,
            category: req.category,
            description: req.description,
        })
        .await?;
    Ok((StatusCode::CREATED, ok(product)))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(price) = req.price {
        check_price(price)?;
    }
    if let Some(stock) = req.stock {
        check_stock(stock)?;
    }

    let patch = ProductPatch {
        name: req.name,
        price: req.price,
        image: req.image,
        stock: req.stock,
        category: req.category,
        description: req.description.map(Some),
    };
    let product = state
        .store
        .update_product(id, patch)
        .await?
        .ok_or(ApiError::NotFound("Product"))?;
    Ok(ok(product))
}

pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.store.delete_product(id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Product"));
    }
    Ok(ok_with_message((), "Product deleted successfully"))
}
