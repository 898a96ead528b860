use std::collections::HashMap;

use super::types::{Candle, HistoricalMatch, BENCHMARK_SYMBOL};

/// Relative band around the target price a historical close must fall into.
pub const MATCH_TOLERANCE: f64 = 0.02;

const MAX_PRESENTED_MATCHES: usize = 50;

/// Indices of benchmark candles whose close lies within
/// `[target * (1 - tolerance), target * (1 + tolerance)]`, in the series'
/// native newest-first order.
pub fn match_indices(benchmark: &[Candle], target_price: f64, tolerance: f64) -> Vec<usize> {
    let lower = target_price * (1.0 - tolerance);
    let upper = target_price * (1.0 + tolerance);

    benchmark
        .iter()
        .enumerate()
        .filter(|(_, candle)| candle.close >= lower && candle.close <= upper)
        .map(|(i, _)| i)
        .collect()
}

/// Cross-asset snapshots for the matched indices. Assets whose series are
/// shorter than the benchmark simply omit that date. The presentation list
/// is re-sorted by date descending, decoupled from discovery order.
pub fn build_matches(
    benchmark: &[Candle],
    basket: &HashMap<String, Vec<Candle>>,
    indices: &[usize],
) -> Vec<HistoricalMatch> {
    let mut matches: Vec<HistoricalMatch> = indices
        .iter()
        .filter(|&&i| i < benchmark.len())
        .map(|&i| {
            let candle = &benchmark[i];
            let mut prices = HashMap::new();
            for (symbol, series) in basket {
                if symbol == BENCHMARK_SYMBOL {
                    continue;
                }
                if let Some(asset_candle) = series.get(i) {
                    prices.insert(symbol.clone(), asset_candle.close);
                }
            }
            HistoricalMatch {
                date: candle.date.clone(),
                benchmark_price: candle.close,
                prices,
            }
        })
        .collect();

    matches.sort_by(|a, b| b.date.cmp(&a.date));
    matches.truncate(MAX_PRESENTED_MATCHES);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn benchmark_series(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: 1700086400000 - i as i64 * 86_400_000,
                date: format!("2023-11-{:02}", 15 - i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn test_tolerance_band_edges() {
        // +2% of 50000 is 51000: 50900 matches, 51100 does not.
        let series = benchmark_series(&[50_900.0, 51_100.0, 49_000.0, 50_000.0]);
        let indices = match_indices(&series, 50_000.0, MATCH_TOLERANCE);
        assert_eq!(indices, vec![0, 2, 3]);
    }

    #[test]
    fn test_exact_band_boundaries_inclusive() {
        let series = benchmark_series(&[49_000.0, 51_000.0, 48_999.9, 51_000.1]);
        let indices = match_indices(&series, 50_000.0, MATCH_TOLERANCE);
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_shorter_asset_omits_date() {
        let benchmark = benchmark_series(&[50_000.0, 50_100.0, 50_200.0]);
        let mut basket = HashMap::new();
        basket.insert("BTC".to_string(), benchmark.clone());
        // ETH has no candle at index 2.
        basket.insert(
            "ETH".to_string(),
            benchmark_series(&[3_000.0, 3_100.0]),
        );

        let indices = match_indices(&benchmark, 50_000.0, MATCH_TOLERANCE);
        assert_eq!(indices.len(), 3);

        let matches = build_matches(&benchmark, &basket, &indices);
        assert_eq!(matches.len(), 3);

        // Date-descending presentation order.
        assert!(matches.windows(2).all(|w| w[0].date >= w[1].date));

        // The benchmark itself never appears in the per-date price map.
        assert!(matches.iter().all(|m| !m.prices.contains_key("BTC")));

        let oldest = matches.last().unwrap();
        assert_eq!(oldest.date, "2023-11-13");
        assert!(oldest.prices.is_empty());
        assert_eq!(matches[0].prices.get("ETH"), Some(&3_000.0));
    }

    #[test]
    fn test_presentation_list_is_capped() {
        let long: Vec<Candle> = (0..80)
            .map(|i| Candle {
                timestamp: 1700086400000 - i as i64 * 86_400_000,
                date: format!("2023-{:03}", 365 - i),
                open: 50_000.0,
                high: 50_000.0,
                low: 50_000.0,
                close: 50_000.0,
                volume: 0.0,
            })
            .collect();

        let indices = match_indices(&long, 50_000.0, MATCH_TOLERANCE);
        assert_eq!(indices.len(), 80);

        let matches = build_matches(&long, &HashMap::new(), &indices);
        assert_eq!(matches.len(), 50);
    }
}
