//! Postgres-backed [`Store`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::models::{
    CartLine, Order, OrderItem, OrderItemWithProduct, OrderStatus, OrderWithItems,
    PendingPayment, Product, User,
};

use super::{NewProduct, NewUser, OrderDraft, ProductFilter, ProductPatch, Store, StoreError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn expand_orders(
        &self,
        orders: Vec<Order>,
    ) -> Result<Vec<OrderWithItems>, StoreError> {
        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ANY($1)",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ANY($1)",
        )
        .bind(&product_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let order_items = items
                    .iter()
                    .filter(|i| i.order_id == order.id)
                    .map(|item| OrderItemWithProduct {
                        item: item.clone(),
                        product: products.iter().find(|p| p.id == item.product_id).cloned(),
                    })
                    .collect();
                OrderWithItems { order, order_items }
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct PendingPaymentRow {
    payment_id: String,
    cart_items: serde_json::Value,
    customer_email: String,
    customer_name: String,
    amount: Decimal,
    expires_at: DateTime<Utc>,
}

impl PendingPaymentRow {
    fn into_pending(self) -> Result<PendingPayment, StoreError> {
        let cart_items: Vec<CartLine> =
            serde_json::from_value(self.cart_items).map_err(|e| {
                StoreError::Database(sqlx::Error::Decode(Box::new(e)))
            })?;
        Ok(PendingPayment {
            payment_id: self.payment_id,
            cart_items,
            customer_email: self.customer_email,
            customer_name: self.customer_name,
            amount: self.amount,
            expires_at: self.expires_at,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash, name, role, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.name)
        .bind(&new.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            _ => StoreError::Database(e),
        })
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let mut qb = QueryBuilder::new("SELECT * FROM products WHERE TRUE");
        if let Some(category) = filter.category.as_deref().filter(|c| *c != "All") {
            qb.push(" AND category = ").push_bind(category.to_string());
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND name ILIKE ").push_bind(format!("%{search}%"));
        }
        qb.push(" ORDER BY created_at DESC");
        Ok(qb.build_query_as::<Product>().fetch_all(&self.pool).await?)
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        Ok(sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, name, price, image, stock, category, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&new.name)
        .bind(new.price)
        .bind(&new.image)
        .bind(new.stock)
        .bind(&new.category)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_product(
        &self,
        id: Uuid,
        patch: ProductPatch,
    ) -> Result<Option<Product>, StoreError> {
        Ok(sqlx::query_as::<_, Product>(
            "UPDATE products SET \
               name = COALESCE($2, name), \
               price = COALESCE($3, price), \
               image = COALESCE($4, image), \
               stock = COALESCE($5, stock), \
               category = COALESCE($6, category), \
               description = CASE WHEN $7 THEN $8 ELSE description END, \
               updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.price)
        .bind(patch.image)
        .bind(patch.stock)
        .bind(patch.category)
        .bind(patch.description.is_some())
        .bind(patch.description.flatten())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let referenced: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM order_items WHERE product_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if referenced.0 > 0 {
            return Err(StoreError::ProductReferenced);
        }
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_orders(&self) -> Result<Vec<OrderWithItems>, StoreError> {
        let orders =
            sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        self.expand_orders(orders).await
    }

    async fn order(&self, id: Uuid) -> Result<Option<OrderWithItems>, StoreError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match order {
            Some(order) => Ok(self.expand_orders(vec![order]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<OrderWithItems>, StoreError> {
        let order = sqlx::query_as::<_, Order>(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        match order {
            Some(order) => Ok(self.expand_orders(vec![order]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn finalize_order(&self, draft: OrderDraft) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (id, customer, email, total, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&draft.customer)
        .bind(&draft.email)
        .bind(draft.total)
        .bind(OrderStatus::Processing.as_str())
        .fetch_one(&mut *tx)
        .await?;

        for item in &draft.items {
            // Guarded decrement: refuses to take stock below zero, which
            // aborts the whole transaction.
            let decremented = sqlx::query(
                "UPDATE products SET stock = stock - $2, updated_at = NOW() \
                 WHERE id = $1 AND stock >= $2",
            )
            .bind(item.product_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
            if decremented.rows_affected() == 0 {
                return Err(StoreError::InsufficientStock(item.product_id));
            }

            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, quantity, price) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::now_v7())
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order)
    }

    async fn put_pending_payment(&self, pending: PendingPayment) -> Result<(), StoreError> {
        let cart_items = serde_json::to_value(&pending.cart_items)
            .map_err(|e| StoreError::Database(sqlx::Error::Encode(Box::new(e))))?;
        sqlx::query(
            "INSERT INTO pending_payments \
               (payment_id, cart_items, customer_email, customer_name, amount, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), $6) \
             ON CONFLICT (payment_id) DO UPDATE SET \
               cart_items = EXCLUDED.cart_items, \
               customer_email = EXCLUDED.customer_email, \
               customer_name = EXCLUDED.customer_name, \
               amount = EXCLUDED.amount, \
               expires_at = EXCLUDED.expires_at",
        )
        .bind(&pending.payment_id)
        .bind(cart_items)
        .bind(&pending.customer_email)
        .bind(&pending.customer_name)
        .bind(pending.amount)
        .bind(pending.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn take_pending_payment(
        &self,
        payment_id: &str,
    ) -> Result<Option<PendingPayment>, StoreError> {
        let row = sqlx::query_as::<_, PendingPaymentRow>(
            "DELETE FROM pending_payments WHERE payment_id = $1 RETURNING *",
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) if row.expires_at > Utc::now() => Ok(Some(row.into_pending()?)),
            _ => Ok(None),
        }
    }

    async fn purge_expired_payments(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM pending_payments WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
