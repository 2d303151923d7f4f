use std::sync::Arc;

use crate::payment::card::CardGateway;
use crate::payment::wallet::WalletGateway;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub card: Arc<dyn CardGateway>,
    pub wallet: Arc<dyn WalletGateway>,
    pub session_secret: String,
    pub webhook_secret: String,
    /// Origin used for provider success/cancel/callback URLs.
    pub public_base_url: String,
    pub pending_payment_ttl_secs: i64,
}
