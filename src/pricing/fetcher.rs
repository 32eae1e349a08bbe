use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::pricing::{PriceCache, PriceError, PriceSource, RateLimiter, resolve_coin_id};

/// Cache-first price lookups, rate limited on the outbound side
///
/// Cache hits never consume a limiter slot.
pub struct PriceFetcher {
    source: Box<dyn PriceSource>,
    cache: PriceCache,
    limiter: RateLimiter,
}

impl PriceFetcher {
    pub fn new(source: Box<dyn PriceSource>, cache: PriceCache, limiter: RateLimiter) -> Self {
        Self {
            source,
            cache,
            limiter,
        }
    }

    pub fn with_limits(
        source: Box<dyn PriceSource>,
        cache_ttl: Duration,
        max_calls: usize,
        window: Duration,
    ) -> Self {
        Self::new(
            source,
            PriceCache::new(cache_ttl),
            RateLimiter::new(max_calls, window),
        )
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    pub async fn fetch_price(&mut self, coin: &str) -> Result<f64, PriceError> {
        self.fetch_price_at(coin, Instant::now()).await
    }

    pub async fn fetch_price_at(&mut self, coin: &str, now: Instant) -> Result<f64, PriceError> {
        let coin_id = resolve_coin_id(coin);
        if coin_id.is_empty() {
            return Err(PriceError::not_found(coin));
        }

        if let Some(price) = self.cache.get_at(&coin_id, now) {
            debug!(coin = %coin_id, price, "Using cached price");
            return Ok(price);
        }

        if !self.limiter.allow_call_at(now) {
            let retry_after = self
                .limiter
                .retry_after(now)
                .unwrap_or_else(|| self.limiter.window());
            warn!(
                coin = %coin_id,
                retry_after_secs = retry_after.as_secs(),
                "Pricing call rejected by rate limiter"
            );
            return Err(PriceError::RateLimited { retry_after });
        }

        let price = self.source.usd_price(&coin_id).await?;
        info!(coin = %coin_id, price, source = self.source.name(), "Fetched price");

        self.cache.put_at(coin_id, price, now);
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        prices: HashMap<String, f64>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PriceSource for CountingSource {
        async fn usd_price(&self, coin_id: &str) -> Result<f64, PriceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prices
                .get(coin_id)
                .copied()
                .ok_or_else(|| PriceError::not_found(coin_id))
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn fetcher(max_calls: usize) -> (PriceFetcher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let prices = [("bitcoin", 71157.0), ("ethereum", 3500.5), ("solana", 150.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let source = CountingSource {
            prices,
            calls: Arc::clone(&calls),
        };
        let fetcher = PriceFetcher::with_limits(
            Box::new(source),
            Duration::from_secs(60),
            max_calls,
            Duration::from_secs(60),
        );
        (fetcher, calls)
    }

    #[tokio::test]
    async fn test_second_fetch_within_ttl_hits_cache() {
        let (mut fetcher, calls) = fetcher(5);
        let t0 = Instant::now();

        assert_eq!(fetcher.fetch_price_at("bitcoin", t0).await, Ok(71157.0));
        assert_eq!(
            fetcher
                .fetch_price_at("Bitcoin", t0 + Duration::from_secs(30))
                .await,
            Ok(71157.0)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refetch_after_ttl() {
        let (mut fetcher, calls) = fetcher(5);
        let t0 = Instant::now();

        fetcher.fetch_price_at("ethereum", t0).await.unwrap();
        fetcher
            .fetch_price_at("ethereum", t0 + Duration::from_secs(61))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ticker_shares_cache_with_id() {
        let (mut fetcher, calls) = fetcher(5);
        let t0 = Instant::now();

        fetcher.fetch_price_at("BTC", t0).await.unwrap();
        fetcher.fetch_price_at("bitcoin", t0).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_without_outbound_call() {
        let (mut fetcher, calls) = fetcher(2);
        let t0 = Instant::now();

        // Unknown coins are never cached, so each attempt needs a slot
        assert!(matches!(
            fetcher.fetch_price_at("foo", t0).await,
            Err(PriceError::NotFound { .. })
        ));
        assert!(matches!(
            fetcher.fetch_price_at("bar", t0).await,
            Err(PriceError::NotFound { .. })
        ));

        let err = fetcher
            .fetch_price_at("bitcoin", t0 + Duration::from_secs(20))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PriceError::RateLimited {
                retry_after: Duration::from_secs(40)
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_bypasses_full_limiter() {
        let (mut fetcher, calls) = fetcher(1);
        let t0 = Instant::now();

        fetcher.fetch_price_at("solana", t0).await.unwrap();
        assert_eq!(fetcher.fetch_price_at("solana", t0).await, Ok(150.0));
        assert!(fetcher.fetch_price_at("ethereum", t0).await.unwrap_err().is_rate_limited());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_coin_is_not_found() {
        let (mut fetcher, calls) = fetcher(5);
        assert!(matches!(
            fetcher.fetch_price("   ").await,
            Err(PriceError::NotFound { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
