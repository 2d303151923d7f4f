//! Payment provider gateways.
//!
//! Both providers sit behind narrow traits so handlers never see provider
//! internals and tests can substitute stubs.

use thiserror::Error;

pub mod card;
pub mod wallet;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Provider(String),
}
