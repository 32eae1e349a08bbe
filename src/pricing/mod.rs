//! Cryptocurrency price lookups
//!
//! [`PriceFetcher`] is the entry point: it answers from [`PriceCache`] when it
//! can, and otherwise spends a [`RateLimiter`] slot on a call to the
//! configured [`PriceSource`].

use async_trait::async_trait;

pub mod cache;
pub mod coingecko;
pub mod error;
pub mod fetcher;
pub mod rate_limiter;

pub use cache::PriceCache;
pub use coingecko::CoinGeckoSource;
pub use error::PriceError;
pub use fetcher::PriceFetcher;
pub use rate_limiter::RateLimiter;

/// An outbound pricing API
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current USD price for a CoinGecko-style coin id
    async fn usd_price(&self, coin_id: &str) -> Result<f64, PriceError>;

    /// Source name, used for logging
    fn name(&self) -> &'static str;
}

/// Normalizes user or model supplied coin names to CoinGecko ids
///
/// Tickers for common assets map to their id; anything else is lowercased
/// with inner whitespace turned into dashes (`"usd coin"` -> `"usd-coin"`).
pub fn resolve_coin_id(coin: &str) -> String {
    let trimmed = coin.trim();
    let mapped = match trimmed.to_ascii_uppercase().as_str() {
        "BTC" => Some("bitcoin"),
        "ETH" => Some("ethereum"),
        "SOL" => Some("solana"),
        "USDT" => Some("tether"),
        "USDC" => Some("usd-coin"),
        "DAI" => Some("dai"),
        "PAXG" => Some("pax-gold"),
        "BNB" => Some("binancecoin"),
        "XRP" => Some("ripple"),
        "ADA" => Some("cardano"),
        "DOGE" => Some("dogecoin"),
        "DOT" => Some("polkadot"),
        "LTC" => Some("litecoin"),
        "LINK" => Some("chainlink"),
        "AVAX" => Some("avalanche-2"),
        "MATIC" => Some("matic-network"),
        _ => None,
    };

    match mapped {
        Some(id) => id.to_string(),
        None => trimmed
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_coin_id;

    #[test]
    fn test_ticker_mapping() {
        assert_eq!(resolve_coin_id("BTC"), "bitcoin");
        assert_eq!(resolve_coin_id("eth"), "ethereum");
        assert_eq!(resolve_coin_id(" avax "), "avalanche-2");
    }

    #[test]
    fn test_names_are_normalized() {
        assert_eq!(resolve_coin_id("Bitcoin"), "bitcoin");
        assert_eq!(resolve_coin_id("  USD   Coin "), "usd-coin");
        assert_eq!(resolve_coin_id("shiba-inu"), "shiba-inu");
    }
}
