//! Persistence seam.
//!
//! Handlers talk to a narrow [`Store`] trait; the Postgres implementation
//! lives in [`postgres`], and the HTTP test suite runs against an in-memory
//! double.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Order, OrderStatus, OrderWithItems, PendingPayment, Product, User,
};

pub mod postgres;

#[cfg(test)]
pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("cannot delete product that is part of existing orders")]
    ProductReferenced,
    #[error("insufficient stock for product {0}")]
    InsufficientStock(Uuid),
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub stock: i32,
    pub category: String,
    pub description: Option<String>,
}

/// Partial product update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Exact category match; "All" and `None` both mean no filter.
    pub category: Option<String>,
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer: String,
    pub email: String,
    pub total: Decimal,
    pub items: Vec<OrderItemDraft>,
}

#[derive(Debug, Clone)]
pub struct OrderItemDraft {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError>;
    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;
    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError>;
    async fn update_product(
        &self,
        id: Uuid,
        patch: ProductPatch,
    ) -> Result<Option<Product>, StoreError>;
    /// Returns `false` when the product does not exist; fails with
    /// [`StoreError::ProductReferenced`] when order items still point at it.
    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list_orders(&self) -> Result<Vec<OrderWithItems>, StoreError>;
    async fn order(&self, id: Uuid) -> Result<Option<OrderWithItems>, StoreError>;
    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<OrderWithItems>, StoreError>;

    /// Creates the order, its items, and decrements stock as one atomic
    /// unit. Any line that would push stock below zero aborts the whole
    /// order with [`StoreError::InsufficientStock`].
    async fn finalize_order(&self, draft: OrderDraft) -> Result<Order, StoreError>;

    async fn put_pending_payment(&self, pending: PendingPayment) -> Result<(), StoreError>;
    /// Removes and returns the pending payment, if present and not expired.
    async fn take_pending_payment(
        &self,
        payment_id: &str,
    ) -> Result<Option<PendingPayment>, StoreError>;
    async fn purge_expired_payments(&self) -> Result<u64, StoreError>;
}
