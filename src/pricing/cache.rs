//! Time-bounded memo of fetched coin prices

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheEntry {
    pub price: f64,
    pub fetched_at: Instant,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Price cache with TTL expiry and no other eviction
///
/// Stale entries stay in the map until overwritten; the key space is the
/// handful of coins a user asks about.
#[derive(Debug)]
pub struct PriceCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, coin: &str) -> Option<f64> {
        self.get_at(coin, Instant::now())
    }

    pub fn get_at(&self, coin: &str, now: Instant) -> Option<f64> {
        self.entries
            .get(coin)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.price)
    }

    pub fn put(&mut self, coin: impl Into<String>, price: f64) {
        self.put_at(coin, price, Instant::now());
    }

    pub fn put_at(&mut self, coin: impl Into<String>, price: f64, now: Instant) {
        self.entries.insert(
            coin.into(),
            CacheEntry {
                price,
                fetched_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
