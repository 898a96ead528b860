use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::warn;

use crate::cache::{MarketCache, MarketSource};
use crate::market_api::Candle;

/// Upper bound on concurrent outbound fetches per basket.
pub const FETCH_WORKERS: usize = 10;

/// Fetch the whole basket concurrently, keeping only symbols that yielded at
/// least one candle. One symbol failing or coming back empty never aborts
/// the others; results are joined unconditionally.
pub async fn fetch_basket<S: MarketSource>(
    cache: &Arc<MarketCache<S>>,
    symbols: &[String],
) -> HashMap<String, Vec<Candle>> {
    let semaphore = Arc::new(Semaphore::new(FETCH_WORKERS));
    let mut tasks = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        let symbol = symbol.clone();
        let cache = Arc::clone(cache);
        let semaphore = Arc::clone(&semaphore);

        tasks.push(tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                // The semaphore is never closed.
                Err(_) => return (symbol, None),
            };

            match cache.get_or_fetch(&symbol).await {
                Ok(series) if !series.is_empty() => (symbol, Some(series)),
                Ok(_) => {
                    warn!(symbol = %symbol, "no usable candles from any source");
                    (symbol, None)
                }
                Err(err) => {
                    warn!(symbol = %symbol, error = %err, "fetch failed, omitting symbol");
                    (symbol, None)
                }
            }
        }));
    }

    let mut basket = HashMap::new();
    for task in tasks {
        match task.await {
            Ok((symbol, Some(series))) => {
                basket.insert(symbol, series);
            }
            Ok((_, None)) => {}
            Err(err) => warn!(error = %err, "fetch task failed to join"),
        }
    }

    basket
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MarketError;

    /// Per-symbol scripted source: symbols listed in `down` always fail,
    /// symbols in `empty` return no candles, everything else succeeds.
    struct FakeSource {
        down: Vec<&'static str>,
        empty: Vec<&'static str>,
    }

    impl MarketSource for FakeSource {
        async fn fetch(
            &self,
            symbol: &str,
            _interval: &str,
            _limit: usize,
        ) -> Result<Vec<Candle>, MarketError> {
            if self.down.contains(&symbol) {
                return Err(MarketError::Api(format!("502 Bad Gateway for {}", symbol)));
            }
            if self.empty.contains(&symbol) {
                return Ok(Vec::new());
            }
            Ok(vec![Candle {
                timestamp: 1700086400000,
                date: "2023-11-15".to_string(),
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.5,
                volume: 100.0,
            }])
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_symbols() {
        let source = FakeSource {
            down: vec!["SOL"],
            empty: vec!["ADA"],
        };
        let cache = Arc::new(MarketCache::new(source));

        let basket = fetch_basket(&cache, &symbols(&["BTC", "ETH", "SOL", "ADA"])).await;

        assert_eq!(basket.len(), 2);
        assert!(basket.contains_key("BTC"));
        assert!(basket.contains_key("ETH"));
        assert!(!basket.contains_key("SOL"));
        assert!(!basket.contains_key("ADA"));
    }

    #[tokio::test]
    async fn test_basket_larger_than_worker_pool() {
        let source = FakeSource {
            down: vec![],
            empty: vec![],
        };
        let cache = Arc::new(MarketCache::new(source));

        let many: Vec<String> = (0..25).map(|i| format!("SYM{}", i)).collect();
        let basket = fetch_basket(&cache, &many).await;
        assert_eq!(basket.len(), 25);
    }
}
