use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::pricing::{PriceError, PriceSource};

/// CoinGecko `/simple/price` client quoting in USD
#[derive(Debug, Clone)]
pub struct CoinGeckoSource {
    client: Client,
    base: Url,
}

impl CoinGeckoSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PriceError> {
        let base = Url::parse(base_url)
            .map_err(|e| PriceError::invalid_response(format!("invalid pricing URL: {}", e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PriceError::from)?;
        Ok(Self { client, base })
    }

    fn price_url(&self, coin_id: &str) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("ids", coin_id)
            .append_pair("vs_currencies", "usd");
        url
    }
}

/// Pulls the USD quote for `coin_id` out of a `{"<id>": {"usd": <n>}}` body
pub fn extract_usd_price(body: &[u8], coin_id: &str) -> Result<f64, PriceError> {
    let parsed: HashMap<String, HashMap<String, f64>> = serde_json::from_slice(body)
        .map_err(|e| PriceError::invalid_response(format!("coingecko: parse JSON failed: {}", e)))?;

    parsed
        .get(coin_id)
        .and_then(|quotes| quotes.get("usd"))
        .copied()
        .ok_or_else(|| PriceError::not_found(coin_id))
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    async fn usd_price(&self, coin_id: &str) -> Result<f64, PriceError> {
        let url = self.price_url(coin_id);
        debug!(coin = coin_id, url = %url, "Requesting CoinGecko price");

        let resp = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(coin = coin_id, status = %status, "CoinGecko returned an error status");
            return Err(PriceError::Http {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await?;
        extract_usd_price(&body, coin_id)
    }

    fn name(&self) -> &'static str {
        "coingecko"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_integer_price() {
        let price = extract_usd_price(br#"{"bitcoin":{"usd":71157}}"#, "bitcoin").unwrap();
        assert_eq!(price, 71157.0);
    }

    #[test]
    fn test_extract_fractional_price() {
        let price = extract_usd_price(br#"{"cardano":{"usd":0.4521}}"#, "cardano").unwrap();
        assert_eq!(price, 0.4521);
    }

    #[test]
    fn test_unknown_coin_yields_empty_object() {
        let err = extract_usd_price(b"{}", "notacoin").unwrap_err();
        assert_eq!(err, PriceError::not_found("notacoin"));
    }

    #[test]
    fn test_missing_usd_quote() {
        let err = extract_usd_price(br#"{"bitcoin":{"eur":60000}}"#, "bitcoin").unwrap_err();
        assert!(matches!(err, PriceError::NotFound { .. }));
    }

    #[test]
    fn test_malformed_body() {
        let err = extract_usd_price(b"<html>oops</html>", "bitcoin").unwrap_err();
        assert!(matches!(err, PriceError::InvalidResponse { .. }));
    }

    #[test]
    fn test_price_url_query() {
        let source = CoinGeckoSource::new(
            "https://api.coingecko.com/api/v3/simple/price",
            Duration::from_secs(5),
        )
        .unwrap();
        let url = source.price_url("usd-coin");
        assert_eq!(
            url.as_str(),
            "https://api.coingecko.com/api/v3/simple/price?ids=usd-coin&vs_currencies=usd"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(CoinGeckoSource::new("not a url", Duration::from_secs(5)).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let source =
            CoinGeckoSource::new("http://127.0.0.1:9/simple/price", Duration::from_secs(2)).unwrap();
        let err = source.usd_price("bitcoin").await.unwrap_err();
        assert!(matches!(err, PriceError::Network { .. } | PriceError::Timeout));
    }
}
