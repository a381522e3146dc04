//! Error types for tqmweb-market

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Marketplace API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("Unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Fixture error: {message}")]
    Fixture { message: String },

    #[error("IO error")]
    IoError(#[from] std::io::Error),
}

impl MarketError {
    /// Whether the failure came from the network or gateway rather than the payload
    pub fn is_transport(&self) -> bool {
        matches!(self, MarketError::Http(_))
    }
}
