use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The reference asset every other basket member is valued against.
pub const BENCHMARK_SYMBOL: &str = "BTC";

/// Default dashboard basket.
pub const DEFAULT_SYMBOLS: [&str; 10] = [
    "BTC", "ETH", "SOL", "BNB", "XRP", "ADA", "DOGE", "DOT", "LINK", "AVAX",
];

/// One daily OHLCV candle. Series are stored newest-first (index 0 = most
/// recent trading day) across every adapter.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Candle {
    pub timestamp: i64,
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ValuationStatus {
    Undervalued,
    Balanced,
    Overvalued,
    Benchmark,
}

impl ValuationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValuationStatus::Undervalued => "Undervalued",
            ValuationStatus::Balanced => "Balanced",
            ValuationStatus::Overvalued => "Overvalued",
            ValuationStatus::Benchmark => "Benchmark",
        }
    }
}

/// Per-asset valuation snapshot, recomputed fresh on every request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssetScore {
    pub symbol: String,
    pub current_price: f64,
    pub avg_hist_price: f64,
    pub diff_percent: f64,
    pub status: ValuationStatus,
    pub win_rate: f64,
    pub potential_upside: f64,
    pub correlation: f64,
    pub rsi: f64,
    pub volume_ratio: f64,
    pub sparkline: Vec<f64>,
    pub sniper_score: f64,
}

/// Cross-asset snapshot for one historical date where the benchmark traded
/// within tolerance of the target price.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoricalMatch {
    pub date: String,
    pub benchmark_price: f64,
    pub prices: HashMap<String, f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Briefing {
    pub title: String,
    pub summary: String,
    pub timestamp: String,
}

/// The one response shape for the basket-analysis query, identical in live
/// and degraded mode.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MarketAnalysis {
    pub target_btc: f64,
    pub current_btc: f64,
    pub match_count: usize,
    pub results: Vec<AssetScore>,
    pub history_matches: Vec<HistoricalMatch>,
    pub briefing: Briefing,
}
