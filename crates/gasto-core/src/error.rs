//! Error types for Gasto

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Provider(#[from] crate::ai::ProviderError),

    #[error(transparent)]
    Extract(#[from] crate::ai::ExtractError),

    #[error(transparent)]
    Billing(#[from] crate::billing::BillingError),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
