//! Checkout orchestration for both payment providers.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect};
use axum::Json;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::models::{CartLine, PendingPayment};
use crate::payment::card::{
    to_minor_units, CheckoutSessionRequest, SessionLineItem, METADATA_CART_ITEMS,
    METADATA_CUSTOMER_NAME,
};
use crate::payment::wallet::WalletPaymentRequest;
use crate::store::{OrderDraft, OrderItemDraft};

use super::error::ApiError;
use super::state::AppState;

pub const SUCCESS_PATH: &str = "/checkout/success";
pub const CANCEL_PATH: &str = "/checkout/cancel";

#[derive(Debug, Deserialize)]
pub struct CardCheckoutRequest {
    pub cart_items: Vec<CartLine>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
}

/// POST /api/checkout/sessions — build a hosted checkout session and hand
/// the client the provider's redirect URL.
pub async fn card_checkout(
    State(state): State<AppState>,
    Json(req): Json<CardCheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.cart_items.is_empty() {
        return Err(ApiError::Validation("Cart items are required".into()));
    }

    let mut line_items = Vec::with_capacity(req.cart_items.len());
    for item in &req.cart_items {
        let unit_amount = to_minor_units(item.price)
            .filter(|amount| *amount > 0)
            .ok_or_else(|| ApiError::Validation("Invalid item price".into()))?;
        line_items.push(SessionLineItem {
            name: item.name.clone(),
            description: item.category.clone(),
            unit_amount,
            quantity: item.quantity,
        });
    }

    let cart_json = serde_json::to_string(&req.cart_items)
        .map_err(|_| ApiError::Validation("Invalid cart items".into()))?;
    let session = state
        .card
        .create_checkout_session(&CheckoutSessionRequest {
            line_items,
            customer_email: req.customer_email,
            metadata: vec![
                (
                    METADATA_CUSTOMER_NAME.to_string(),
                    req.customer_name.unwrap_or_else(|| "Guest".to_string()),
                ),
                (METADATA_CART_ITEMS.to_string(), cart_json),
            ],
            // The provider substitutes the session id into the placeholder.
            success_url: format!(
                "{}{SUCCESS_PATH}?session_id={{CHECKOUT_SESSION_ID}}",
                state.public_base_url
            ),
            cancel_url: format!("{}{CANCEL_PATH}", state.public_base_url),
        })
        .await?;

    info!(session_id = %session.id, "card checkout session created");
    Ok(Json(json!({
        "success": true,
        "session_id": session.id,
        "url": session.url,
    })))
}

#[derive(Debug, Deserialize)]
pub struct WalletCheckoutRequest {
    pub amount: Decimal,
    pub cart_items: Vec<CartLine>,
    pub customer_email: String,
    pub customer_name: String,
}

/// POST /api/wallet/checkout — run the grant/create handshake and persist
/// the pending payment keyed by the provider payment id.
pub async fn wallet_checkout(
    State(state): State<AppState>,
    Json(req): Json<WalletCheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.cart_items.is_empty() {
        return Err(ApiError::Validation("Cart items are required".into()));
    }
    if req.amount <= Decimal::ZERO {
        return Err(ApiError::Validation("Amount must be a positive number".into()));
    }

    let invoice_number = format!("INV-{:08}", rand::random::<u32>() % 100_000_000);
    let payment = state
        .wallet
        .create_payment(&WalletPaymentRequest {
            amount: req.amount.to_string(),
            invoice_number,
            callback_url: format!("{}/api/wallet/callback", state.public_base_url),
        })
        .await?;

    state
        .store
        .put_pending_payment(PendingPayment {
            payment_id: payment.payment_id.clone(),
            cart_items: req.cart_items,
            customer_email: req.customer_email,
            customer_name: req.customer_name,
            amount: req.amount,
            expires_at: Utc::now() + Duration::seconds(state.pending_payment_ttl_secs),
        })
        .await?;

    info!(payment_id = %payment.payment_id, "wallet payment created");
    Ok(Json(json!({
        "success": true,
        "bkash_url": payment.redirect_url,
        "payment_id": payment.payment_id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct WalletCallbackParams {
    #[serde(rename = "paymentID")]
    pub payment_id: String,
    pub status: Option<String>,
}

/// GET /api/wallet/callback — provider redirects the shopper back here;
/// execute the payment and finalize the order on a confirmed completion.
pub async fn wallet_callback(
    State(state): State<AppState>,
    Query(params): Query<WalletCallbackParams>,
) -> Redirect {
    if matches!(params.status.as_deref(), Some("cancel") | Some("failure")) {
        return Redirect::to(CANCEL_PATH);
    }

    let execution = match state.wallet.execute_payment(&params.payment_id).await {
        Ok(execution) => execution,
        Err(e) => {
            warn!(payment_id = %params.payment_id, error = %e, "wallet execute failed");
            return Redirect::to(CANCEL_PATH);
        }
    };
    if !execution.is_completed() {
        info!(
            payment_id = %params.payment_id,
            status = %execution.transaction_status,
            "wallet payment not completed"
        );
        return Redirect::to(CANCEL_PATH);
    }

    match state.store.take_pending_payment(&params.payment_id).await {
        Ok(Some(pending)) => {
            let draft = OrderDraft {
                customer: pending.customer_name,
                email: pending.customer_email,
                total: pending.amount,
                items: pending
                    .cart_items
                    .iter()
                    .map(|line| OrderItemDraft {
                        product_id: line.id,
                        quantity: line.quantity as i32,
                        price: line.price,
                    })
                    .collect(),
            };
            match state.store.finalize_order(draft).await {
                Ok(order) => info!(order_id = %order.id, "order created from wallet payment"),
                Err(e) => {
                    error!(payment_id = %params.payment_id, error = %e, "order finalization failed");
                    return Redirect::to(CANCEL_PATH);
                }
            }
        }
        Ok(None) => {
            // Expired or restarted-away pending state: payment went through
            // but there is no cart to fulfill.
            warn!(payment_id = %params.payment_id, "no pending payment for completed transaction");
        }
        Err(e) => {
            error!(payment_id = %params.payment_id, error = %e, "pending payment lookup failed");
            return Redirect::to(CANCEL_PATH);
        }
    }

    Redirect::to(&format!(
        "{SUCCESS_PATH}?session_id={}",
        execution.payment_id
    ))
}
