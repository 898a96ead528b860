use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use moka::future::Cache;
use tracing::{debug, warn};

use crate::errors::MarketError;
use crate::market_api::Candle;

/// How long a cached series is considered fresh. Chosen to absorb bursts of
/// concurrent requests for the same symbol without materially staling charts.
pub const DEFAULT_TTL: Duration = Duration::from_secs(45);

const DEFAULT_INTERVAL: &str = "1d";
const DEFAULT_LIMIT: usize = 365;

/// Millisecond clock, injectable so staleness is deterministic under test.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A historical-data source the cache refreshes from.
pub trait MarketSource: Send + Sync + 'static {
    /// Fetch up to `limit` candles at `interval` resolution, newest-first.
    fn fetch(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Candle>, MarketError>> + Send;
}

/// One cached series. Entries are replaced whole on refresh, never mutated.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub symbol: String,
    pub fetched_at: u64,
    pub series: Vec<Candle>,
}

/// Short-TTL per-symbol memoization in front of the source adapter.
///
/// Staleness is judged against the entry's own `fetched_at` instead of
/// moka's TTL eviction: an expired-but-present entry must survive so it can
/// be served when a refresh fails.
pub struct MarketCache<S: MarketSource> {
    source: S,
    entries: Cache<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<S: MarketSource> MarketCache<S> {
    pub fn new(source: S) -> Self {
        Self::with_clock(source, DEFAULT_TTL, Arc::new(SystemClock))
    }

    pub fn with_clock(source: S, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let entries = Cache::builder().max_capacity(256).build();
        Self {
            source,
            entries,
            ttl,
            clock,
        }
    }

    /// Cached series if fresh, otherwise a refresh from the source. A failed
    /// refresh serves the previous entry when one exists; concurrent
    /// refreshes for the same symbol may race, which is harmless because
    /// writes are full-entry replacements.
    ///
    /// An empty refresh counts as a failure: the source adapters degrade a
    /// total outage to an empty series rather than an error, and that must
    /// not displace a good entry.
    pub async fn get_or_fetch(&self, symbol: &str) -> Result<Vec<Candle>, MarketError> {
        let now = self.clock.now_ms();
        let previous = self.entries.get(symbol).await;

        if let Some(entry) = &previous {
            if now.saturating_sub(entry.fetched_at) < self.ttl.as_millis() as u64 {
                debug!(symbol, "cache hit");
                return Ok(entry.series.clone());
            }
        }

        match self
            .source
            .fetch(symbol, DEFAULT_INTERVAL, DEFAULT_LIMIT)
            .await
        {
            Ok(series) if !series.is_empty() => {
                let entry = CacheEntry {
                    symbol: symbol.to_string(),
                    fetched_at: now,
                    series: series.clone(),
                };
                self.entries.insert(symbol.to_string(), entry).await;
                Ok(series)
            }
            Ok(series) => match previous {
                Some(entry) => {
                    warn!(symbol, "empty refresh, serving stale entry");
                    Ok(entry.series)
                }
                None => Ok(series),
            },
            Err(err) => match previous {
                Some(entry) => {
                    warn!(symbol, error = %err, "refresh failed, serving stale entry");
                    Ok(entry.series)
                }
                None => Err(err),
            },
        }
    }
}
