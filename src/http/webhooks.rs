//! Card-provider webhook: verify the signed event and finalize the order.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, warn};

use crate::models::CartLine;
use crate::payment::card::{
    verify_webhook_signature, WebhookEvent, CHECKOUT_COMPLETED, METADATA_CART_ITEMS,
    METADATA_CUSTOMER_NAME,
};
use crate::store::{OrderDraft, OrderItemDraft};

use super::error::ApiError;
use super::state::AppState;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// POST /api/webhooks/card. Needs the raw body: the signature covers the
/// exact bytes the provider sent.
pub async fn card_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Validation("Missing stripe-signature header".into()))?;
    verify_webhook_signature(
        &body,
        signature,
        &state.webhook_secret,
        SIGNATURE_TOLERANCE_SECS,
    )
    .map_err(|e| ApiError::Validation(format!("Webhook Error: {e}")))?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Webhook Error: {e}")))?;

    if event.kind == CHECKOUT_COMPLETED {
        let session = event.data.object;
        info!(session_id = %session.id, "payment completed");

        let customer_name = session
            .metadata
            .get(METADATA_CUSTOMER_NAME)
            .cloned()
            .unwrap_or_else(|| "Guest".to_string());
        let customer_email = session.email().unwrap_or_default().to_string();
        // Prices come from the metadata captured at checkout time, not the
        // current catalog rows.
        let cart_items: Vec<CartLine> = session
            .metadata
            .get(METADATA_CART_ITEMS)
            .and_then(|raw| {
                serde_json::from_str(raw)
                    .map_err(|e| warn!(session_id = %session.id, error = %e, "unparseable cart metadata"))
                    .ok()
            })
            .unwrap_or_default();
        let total = session
            .amount_total
            .map(|cents| Decimal::new(cents, 2))
            .unwrap_or_default();

        let draft = OrderDraft {
            customer: customer_name,
            email: customer_email,
            total,
            items: cart_items
                .iter()
                .map(|line| OrderItemDraft {
                    product_id: line.id,
                    quantity: line.quantity as i32,
                    price: line.price,
                })
                .collect(),
        };
        let order = state.store.finalize_order(draft).await?;
        info!(order_id = %order.id, session_id = %session.id, "order created from webhook");
    } else {
        info!(kind = %event.kind, "ignoring webhook event");
    }

    Ok(Json(json!({ "success": true, "received": true })))
}
