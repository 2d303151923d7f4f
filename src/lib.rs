//! Storefront - self-hosted e-commerce service
//!
//! Product catalog, order management, and checkout through two payment
//! providers: a card provider with hosted sessions and signed webhooks, and
//! a mobile-wallet provider with a grant/create/execute handshake.

pub mod auth;
pub mod config;
pub mod http;
pub mod models;
pub mod payment;
pub mod store;
