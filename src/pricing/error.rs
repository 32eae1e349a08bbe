//! Error types for price lookups

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PriceError {
    /// The local rate limiter refused an outbound call
    #[error("Rate limit exceeded, retry in {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// The pricing API has no USD quote for the coin
    #[error("No price found for '{coin}'")]
    NotFound { coin: String },

    /// Non-2xx response from the pricing API
    #[error("Pricing API returned status {status}")]
    Http { status: u16 },

    #[error("Malformed pricing response: {message}")]
    InvalidResponse { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Pricing request timed out")]
    Timeout,
}

impl PriceError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PriceError::RateLimited { .. })
    }

    /// True when the coin could not be priced (as opposed to a transport issue)
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            PriceError::NotFound { .. } | PriceError::Http { .. } | PriceError::InvalidResponse { .. }
        )
    }

    pub fn not_found(coin: impl Into<String>) -> Self {
        Self::NotFound { coin: coin.into() }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for PriceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
            }
        } else {
            Self::Network {
                message: err.to_string(),
            }
        }
    }
}
