//! HTTP layer: Axum router, handlers, and the JSON response envelope.

use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod checkout;
mod error;
mod orders;
mod pages;
mod products;
mod responses;
mod state;
mod webhooks;


pub use error::ApiError;
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async {
                Json(serde_json::json!({"status": "healthy", "service": "storefront"}))
            }),
        )
        .route("/", get(pages::index))
        .route("/checkout/success", get(pages::checkout_success))
        .route("/checkout/cancel", get(pages::checkout_cancel))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/me", get(auth::me))
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/:id",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/api/orders", get(orders::list))
        .route("/api/orders/:id", get(orders::get).put(orders::update))
        .route("/api/checkout/sessions", post(checkout::card_checkout))
        .route("/api/wallet/checkout", post(checkout::wallet_checkout))
        .route("/api/wallet/callback", get(checkout::wallet_callback))
        .route("/api/webhooks/card", post(webhooks::card_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
