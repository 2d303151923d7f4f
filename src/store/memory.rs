//! In-memory [`Store`] used by the HTTP test suite.
//!
//! Mirrors the Postgres implementation's observable behavior, including the
//! atomicity of `finalize_order` and pending-payment expiry.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    Order, OrderItem, OrderItemWithProduct, OrderStatus, OrderWithItems, PendingPayment,
    Product, User,
};

use super::{NewProduct, NewUser, OrderDraft, ProductFilter, ProductPatch, Store, StoreError};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    products: Vec<Product>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    pending: HashMap<String, PendingPayment>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn expand(inner: &Inner, order: &Order) -> OrderWithItems {
        let order_items = inner
            .order_items
            .iter()
            .filter(|i| i.order_id == order.id)
            .map(|item| OrderItemWithProduct {
                item: item.clone(),
                product: inner.products.iter().find(|p| p.id == item.product_id).cloned(),
            })
            .collect();
        OrderWithItems { order: order.clone(), order_items }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::now_v7(),
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            role: new.role,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut products: Vec<Product> = inner
            .products
            .iter()
            .filter(|p| match filter.category.as_deref() {
                Some("All") | None => true,
                Some(category) => p.category == category,
            })
            .filter(|p| match filter.search.as_deref() {
                Some(search) if !search.is_empty() => {
                    p.name.to_lowercase().contains(&search.to_lowercase())
                }
                _ => true,
            })
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.products.iter().find(|p| p.id == id).cloned())
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let product = Product {
            id: Uuid::now_v7(),
            name: new.name,
            price: new.price,
            image: new.image,
            stock: new.stock,
            category: new.category,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        inner.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: Uuid,
        patch: ProductPatch,
    ) -> Result<Option<Product>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(product) = inner.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(image) = patch.image {
            product.image = image;
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
        }
        if let Some(category) = patch.category {
            product.category = category;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.order_items.iter().any(|i| i.product_id == id) {
            return Err(StoreError::ProductReferenced);
        }
        let before = inner.products.len();
        inner.products.retain(|p| p.id != id);
        Ok(inner.products.len() != before)
    }

    async fn list_orders(&self) -> Result<Vec<OrderWithItems>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut orders = inner.orders.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders.iter().map(|o| Self::expand(&inner, o)).collect())
    }

    async fn order(&self, id: Uuid) -> Result<Option<OrderWithItems>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .orders
            .iter()
            .find(|o| o.id == id)
            .map(|o| Self::expand(&inner, o)))
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<OrderWithItems>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(order) = inner.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        order.status = status.as_str().to_string();
        order.updated_at = Utc::now();
        let order = order.clone();
        Ok(Some(Self::expand(&inner, &order)))
    }

    async fn finalize_order(&self, draft: OrderDraft) -> Result<Order, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        // Validate every decrement before mutating anything, so a failed
        // order leaves stock untouched.
        for item in &draft.items {
            let in_stock = inner
                .products
                .iter()
                .find(|p| p.id == item.product_id)
                .map(|p| p.stock >= item.quantity)
                .unwrap_or(false);
            if !in_stock {
                return Err(StoreError::InsufficientStock(item.product_id));
            }
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::now_v7(),
            customer: draft.customer,
            email: draft.email,
            total: draft.total,
            status: OrderStatus::Processing.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        for item in &draft.items {
            let product = inner
                .products
                .iter_mut()
                .find(|p| p.id == item.product_id)
                .expect("validated above");
            product.stock -= item.quantity;
            let order_item = OrderItem {
                id: Uuid::now_v7(),
                order_id: order.id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
            };
            inner.order_items.push(order_item);
        }
        inner.orders.push(order.clone());
        Ok(order)
    }

    async fn put_pending_payment(&self, pending: PendingPayment) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.pending.insert(pending.payment_id.clone(), pending);
        Ok(())
    }

    async fn take_pending_payment(
        &self,
        payment_id: &str,
    ) -> Result<Option<PendingPayment>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner
            .pending
            .remove(payment_id)
            .filter(|p| p.expires_at > Utc::now()))
    }

    async fn purge_expired_payments(&self) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.pending.len();
        let now = Utc::now();
        inner.pending.retain(|_, p| p.expires_at > now);
        Ok((before - inner.pending.len()) as u64)
    }
}
