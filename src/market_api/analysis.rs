use std::sync::Arc;

use tracing::warn;

use super::briefing::synthesize_briefing;
use super::degraded::simulated_analysis;
use super::indicators::{score_asset, score_benchmark};
use super::matcher::{build_matches, match_indices, MATCH_TOLERANCE};
use super::types::{MarketAnalysis, BENCHMARK_SYMBOL, DEFAULT_SYMBOLS};
use crate::cache::{MarketCache, MarketSource};
use crate::fetcher::fetch_basket;

pub fn default_basket() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

/// Run the full pipeline for a basket: fetch, match against the target
/// benchmark price, score every asset, and compose the briefing.
///
/// Infallible by design: partial basket failure shrinks the result set, and
/// a completely unreachable benchmark short-circuits to the clearly-labeled
/// simulated dataset instead of an error.
pub async fn analyze_market<S: MarketSource>(
    cache: &Arc<MarketCache<S>>,
    symbols: &[String],
    target_price: Option<f64>,
) -> MarketAnalysis {
    let basket = fetch_basket(cache, symbols).await;

    let current_btc = match basket.get(BENCHMARK_SYMBOL).and_then(|s| s.first()) {
        Some(candle) => candle.close,
        None => {
            warn!("benchmark series unavailable from every source, serving simulated dataset");
            return simulated_analysis(symbols, target_price);
        }
    };
    let benchmark = &basket[BENCHMARK_SYMBOL];

    let target_btc = target_price.unwrap_or(current_btc);
    let indices = match_indices(benchmark, target_btc, MATCH_TOLERANCE);

    // Iterate the caller's symbol order so equal scores keep a stable,
    // reproducible ordering after the sort.
    let mut results = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let Some(series) = basket.get(symbol) else {
            continue;
        };
        if symbol == BENCHMARK_SYMBOL {
            if let Some(score) = score_benchmark(series) {
                results.push(score);
            }
        } else if let Some(score) = score_asset(symbol, series, benchmark, &indices) {
            results.push(score);
        }
    }

    results.sort_by(|a, b| {
        b.sniper_score
            .partial_cmp(&a.sniper_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let history_matches = build_matches(benchmark, &basket, &indices);
    let briefing = synthesize_briefing(&results, current_btc);

    MarketAnalysis {
        target_btc,
        current_btc,
        match_count: indices.len(),
        results,
        history_matches,
        briefing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MarketError;
    use crate::market_api::degraded::SIMULATED_MARKER;
    use crate::market_api::types::{Candle, ValuationStatus};

    /// Serves a fixed series per symbol; unknown symbols fail like a dead
    /// exchange.
    struct FixtureSource {
        series: std::collections::HashMap<&'static str, Vec<Candle>>,
    }

    impl MarketSource for FixtureSource {
        async fn fetch(
            &self,
            symbol: &str,
            _interval: &str,
            _limit: usize,
        ) -> Result<Vec<Candle>, MarketError> {
            self.series
                .get(symbol)
                .cloned()
                .ok_or_else(|| MarketError::Api(format!("521 Web Server Is Down for {}", symbol)))
        }
    }

    fn series(closes: &[f64], volume: f64) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: 1700086400000 - i as i64 * 86_400_000,
                date: format!("2023-{:03}", 320 - i),
                open: close,
                high: close,
                low: close,
                close,
                volume,
            })
            .collect()
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_live_pipeline_scores_and_sorts() {
        let mut fixtures = std::collections::HashMap::new();
        // Benchmark flat at 50k: every index matches a 50k target.
        fixtures.insert("BTC", series(&[50_000.0; 20], 5_000.0));
        // ETH currently well below its historical closes.
        let mut eth_closes = vec![2_000.0];
        eth_closes.extend(std::iter::repeat(3_000.0).take(19));
        fixtures.insert("ETH", series(&eth_closes, 800.0));
        // SOL currently well above them.
        let mut sol_closes = vec![150.0];
        sol_closes.extend(std::iter::repeat(100.0).take(19));
        fixtures.insert("SOL", series(&sol_closes, 400.0));

        let cache = Arc::new(MarketCache::new(FixtureSource { series: fixtures }));
        let analysis =
            analyze_market(&cache, &symbols(&["BTC", "ETH", "SOL", "DOGE"]), None).await;

        assert_eq!(analysis.current_btc, 50_000.0);
        assert_eq!(analysis.target_btc, 50_000.0);
        assert_eq!(analysis.match_count, 20);
        // DOGE failed to fetch and is simply absent.
        assert_eq!(analysis.results.len(), 3);

        let eth = analysis.results.iter().find(|r| r.symbol == "ETH").unwrap();
        assert_eq!(eth.status, ValuationStatus::Undervalued);
        let sol = analysis.results.iter().find(|r| r.symbol == "SOL").unwrap();
        assert_eq!(sol.status, ValuationStatus::Overvalued);

        // Sorted by sniper score descending; the benchmark's zero score
        // puts it last.
        assert!(analysis
            .results
            .windows(2)
            .all(|w| w[0].sniper_score >= w[1].sniper_score));
        assert_eq!(analysis.results.last().unwrap().symbol, "BTC");

        assert_eq!(analysis.history_matches.len(), 20);
        assert!(!analysis.briefing.title.contains(SIMULATED_MARKER));
    }

    #[tokio::test]
    async fn test_explicit_target_price_drives_matching() {
        let mut fixtures = std::collections::HashMap::new();
        let mut btc_closes = vec![60_000.0; 5];
        btc_closes.extend_from_slice(&[50_000.0, 50_500.0]);
        fixtures.insert("BTC", series(&btc_closes, 5_000.0));
        fixtures.insert("ETH", series(&[3_000.0; 7], 800.0));

        let cache = Arc::new(MarketCache::new(FixtureSource { series: fixtures }));
        let analysis =
            analyze_market(&cache, &symbols(&["BTC", "ETH"]), Some(50_000.0)).await;

        assert_eq!(analysis.target_btc, 50_000.0);
        assert_eq!(analysis.current_btc, 60_000.0);
        assert_eq!(analysis.match_count, 2);
    }

    #[tokio::test]
    async fn test_unreachable_benchmark_serves_labeled_simulation() {
        // Only non-benchmark symbols resolve; BTC fails everywhere.
        let mut fixtures = std::collections::HashMap::new();
        fixtures.insert("ETH", series(&[3_000.0; 20], 800.0));

        let cache = Arc::new(MarketCache::new(FixtureSource { series: fixtures }));
        let basket = symbols(&["BTC", "ETH", "SOL"]);
        let analysis = analyze_market(&cache, &basket, Some(50_000.0)).await;

        assert!(analysis.briefing.title.contains(SIMULATED_MARKER));
        assert_eq!(analysis.results.len(), basket.len());
        for result in &analysis.results {
            assert!(matches!(
                result.status,
                ValuationStatus::Undervalued
                    | ValuationStatus::Balanced
                    | ValuationStatus::Overvalued
                    | ValuationStatus::Benchmark
            ));
        }
    }
}
