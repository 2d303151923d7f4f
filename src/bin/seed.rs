//! Idempotent development seed: demo users, catalog, and a couple of
//! historical orders.
//!
//! Credentials after seeding:
//!   admin@example.com / admin123
//!   customer@example.com / customer123

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::auth::hash_password;
use storefront::models::{OrderStatus, Role, User};
use storefront::store::postgres::PgStore;
use storefront::store::{NewProduct, NewUser, OrderDraft, OrderItemDraft, Store, StoreError};

const PRODUCTS: &[(&str, i64, &str, i32, &str, &str)] = &[
    ("Wireless Headphones", 7999, "🎧", 15, "Electronics", "High-quality wireless headphones with noise cancellation"),
    ("Smart Watch", 19999, "⌚", 8, "Electronics", "Feature-rich smartwatch with fitness tracking"),
    ("Laptop Sleeve", 2999, "💼", 25, "Accessories", "Protective sleeve for 13-15 inch laptops"),
    ("USB-C Cable", 1299, "🔌", 50, "Accessories", "Durable USB-C charging and data cable"),
    ("Bluetooth Speaker", 4999, "🔊", 12, "Electronics", "Portable Bluetooth speaker with powerful bass"),
    ("Phone Case", 1999, "📱", 30, "Accessories", "Protective phone case with premium finish"),
    ("Wireless Mouse", 3499, "🖱️", 20, "Electronics", "Ergonomic wireless mouse for productivity"),
    ("Mechanical Keyboard", 8999, "⌨️", 10, "Electronics", "RGB mechanical keyboard with tactile switches"),
    ("Laptop Stand", 3999, "💻", 18, "Accessories", "Adjustable aluminum laptop stand"),
    ("Webcam HD", 5999, "🎥", 14, "Electronics", "1080p HD webcam with auto-focus"),
];

async fn ensure_user(
    store: &PgStore,
    email: &str,
    password: &str,
    name: &str,
    role: Role,
) -> Result<User> {
    if let Some(existing) = store.user_by_email(email).await? {
        return Ok(existing);
    }
    let user = store
        .create_user(NewUser {
            email: email.to_string(),
            password_hash: hash_password(password)?,
            name: name.to_string(),
            role: role.as_str().to_string(),
        })
        .await;
    match user {
        Ok(user) => Ok(user),
        // Lost a race with another seed run; the row is there now.
        Err(StoreError::DuplicateEmail) => store
            .user_by_email(email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user {email} missing after duplicate-email error")),
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")?;
    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let store = PgStore::new(db);

    let _admin = ensure_user(&store, "admin@example.com", "admin123", "Admin User", Role::Admin)
        .await?;
    tracing::info!("admin user ready");
    let customer = ensure_user(
        &store,
        "customer@example.com",
        "customer123",
        "John Doe",
        Role::Customer,
    )
    .await?;
    tracing::info!("customer user ready");

    let existing = store.list_products(&Default::default()).await?;
    if existing.is_empty() {
        for (name, cents, image, stock, category, description) in PRODUCTS {
            store
                .create_product(NewProduct {
                    name: name.to_string(),
                    price: Decimal::new(*cents, 2),
                    image: image.to_string(),
                    stock: *stock,
                    category: category.to_string(),
                    description: Some(description.to_string()),
                })
                .await?;
        }
        tracing::info!(count = PRODUCTS.len(), "products created");
    } else {
        tracing::info!(count = existing.len(), "products already present, skipping");
    }

    if store.list_orders().await?.is_empty() {
        let products = store.list_products(&Default::default()).await?;
        if products.len() >= 3 {
            let order = store
                .finalize_order(OrderDraft {
                    customer: customer.name.clone(),
                    email: customer.email.clone(),
                    total: products[0].price,
                    items: vec![OrderItemDraft {
                        product_id: products[0].id,
                        quantity: 1,
                        price: products[0].price,
                    }],
                })
                .await?;
            store
                .update_order_status(order.id, OrderStatus::Completed)
                .await?;

            store
                .finalize_order(OrderDraft {
                    customer: customer.name.clone(),
                    email: customer.email.clone(),
                    total: products[1].price + products[2].price,
                    items: vec![
                        OrderItemDraft {
                            product_id: products[1].id,
                            quantity: 1,
                            price: products[1].price,
                        },
                        OrderItemDraft {
                            product_id: products[2].id,
                            quantity: 1,
                            price: products[2].price,
                        },
                    ],
                })
                .await?;
            tracing::info!("sample orders created");
        }
    }

    tracing::info!("seeding complete");
    Ok(())
}
