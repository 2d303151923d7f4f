//! Environment-sourced configuration.
//!
//! Secrets have no fallback values: a deployment that forgets to set one
//! fails at startup instead of running with a known key.

use std::env;
use thiserror::Error;

pub const DEFAULT_WALLET_BASE_URL: &str =
    "https://tokenized.sandbox.bka.sh/v1.2.0-beta/tokenized/checkout";
pub const DEFAULT_CARD_API_BASE_URL: &str = "https://api.stripe.com/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Origin used to build provider success/cancel/callback URLs.
    pub public_base_url: String,
    /// HS256 key for session tokens.
    pub session_secret: String,
    pub card: CardConfig,
    pub wallet: WalletConfig,
    /// Seconds before an unconfirmed pending payment is dropped.
    pub pending_payment_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct CardConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base_url: String,
}

#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub username: String,
    pub password: String,
    pub app_key: String,
    pub app_secret: String,
    pub base_url: String,
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => 8080,
        };
        let pending_payment_ttl_secs = match env::var("PENDING_PAYMENT_TTL_SECS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("PENDING_PAYMENT_TTL_SECS", raw))?,
            Err(_) => 1800,
        };
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            port,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
            session_secret: required("SESSION_SECRET")?,
            card: CardConfig {
                secret_key: required("CARD_SECRET_KEY")?,
                webhook_secret: required("CARD_WEBHOOK_SECRET")?,
                api_base_url: env::var("CARD_API_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_CARD_API_BASE_URL.to_string()),
            },
            wallet: WalletConfig {
                username: required("WALLET_USERNAME")?,
                password: required("WALLET_PASSWORD")?,
                app_key: required("WALLET_APP_KEY")?,
                app_secret: required("WALLET_APP_SECRET")?,
                base_url: env::var("WALLET_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_WALLET_BASE_URL.to_string()),
            },
            pending_payment_ttl_secs,
        })
    }
}
