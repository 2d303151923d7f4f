//! Mobile-wallet provider: tokenized checkout handshake.
//!
//! The provider contract is three calls: grant an auth token from app
//! credentials, create a payment session, and execute the payment after the
//! shopper returns through the callback URL.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::PaymentError;
use crate::config::WalletConfig;

pub const TRANSACTION_COMPLETED: &str = "Completed";

/// Sandbox payer reference required by the tokenized checkout API.
const PAYER_REFERENCE: &str = "01770618576";

#[derive(Debug, Clone)]
pub struct WalletPaymentRequest {
    /// Amount as a decimal string, the way the provider expects it.
    pub amount: String,
    pub invoice_number: String,
    pub callback_url: String,
}

#[derive(Debug, Clone)]
pub struct WalletPayment {
    pub payment_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone)]
pub struct WalletExecution {
    pub payment_id: String,
    pub transaction_status: String,
}

impl WalletExecution {
    pub fn is_completed(&self) -> bool {
        self.transaction_status == TRANSACTION_COMPLETED
    }
}

#[async_trait]
pub trait WalletGateway: Send + Sync + 'static {
    async fn create_payment(
        &self,
        req: &WalletPaymentRequest,
    ) -> Result<WalletPayment, PaymentError>;
    async fn execute_payment(&self, payment_id: &str) -> Result<WalletExecution, PaymentError>;
}

pub struct WalletClient {
    http: reqwest::Client,
    config: WalletConfig,
}

#[derive(Debug, Deserialize)]
struct GrantTokenResponse {
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatePaymentResponse {
    #[serde(rename = "paymentID", default)]
    payment_id: Option<String>,
    #[serde(rename = "bkashURL", default)]
    redirect_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExecutePaymentResponse {
    #[serde(rename = "paymentID", default)]
    payment_id: Option<String>,
    #[serde(rename = "transactionStatus", default)]
    transaction_status: Option<String>,
}

impl WalletClient {
    pub fn new(config: WalletConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    async fn grant_token(&self) -> Result<String, PaymentError> {
        let response: GrantTokenResponse = self
            .http
            .post(format!("{}/token/grant", self.config.base_url))
            .header("Accept", "application/json")
            .header("username", &self.config.username)
            .header("password", &self.config.password)
            .json(&json!({
                "app_key": self.config.app_key,
                "app_secret": self.config.app_secret,
            }))
            .send()
            .await?
            .json()
            .await?;
        response
            .id_token
            .ok_or_else(|| PaymentError::Provider("Failed to get token".into()))
    }
}

#[async_trait]
impl WalletGateway for WalletClient {
    async fn create_payment(
        &self,
        req: &WalletPaymentRequest,
    ) -> Result<WalletPayment, PaymentError> {
        let token = self.grant_token().await?;
        let response: CreatePaymentResponse = self
            .http
            .post(format!("{}/create", self.config.base_url))
            .header("Accept", "application/json")
            .header("Authorization", &token)
            .header("X-App-Key", &self.config.app_key)
            .json(&json!({
                "mode": "0011",
                "payerReference": PAYER_REFERENCE,
                "callbackURL": req.callback_url,
                "amount": req.amount,
                "currency": "BDT",
                "intent": "sale",
                "merchantInvoiceNumber": req.invoice_number,
            }))
            .send()
            .await?
            .json()
            .await?;
        match (response.payment_id, response.redirect_url) {
            (Some(payment_id), Some(redirect_url)) => {
                Ok(WalletPayment { payment_id, redirect_url })
            }
            _ => Err(PaymentError::Provider("Failed to create payment".into())),
        }
    }

    async fn execute_payment(&self, payment_id: &str) -> Result<WalletExecution, PaymentError> {
        let token = self.grant_token().await?;
        let response: ExecutePaymentResponse = self
            .http
            .post(format!("{}/execute", self.config.base_url))
            .header("Accept", "application/json")
            .header("Authorization", &token)
            .header("X-App-Key", &self.config.app_key)
            .json(&json!({ "paymentID": payment_id }))
            .send()
            .await?
            .json()
            .await?;
        Ok(WalletExecution {
            payment_id: response.payment_id.unwrap_or_else(|| payment_id.to_string()),
            transaction_status: response.transaction_status.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_literal_completed_counts() {
        let exec = |status: &str| WalletExecution {
            payment_id: "TR01".into(),
            transaction_status: status.into(),
        };
        assert!(exec("Completed").is_completed());
        assert!(!exec("completed").is_completed());
        assert!(!exec("Initiated").is_completed());
        assert!(!exec("").is_completed());
    }

    #[test]
    fn provider_responses_tolerate_missing_fields() {
        let grant: GrantTokenResponse = serde_json::from_str("{}").unwrap();
        assert!(grant.id_token.is_none());
        let create: CreatePaymentResponse =
            serde_json::from_str(r#"{"statusMessage":"Invalid"}"#).unwrap();
        assert!(create.payment_id.is_none());
    }
}
