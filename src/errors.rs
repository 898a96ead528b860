use thiserror::Error;

/// All engine errors, categorized by domain.
#[derive(Debug, Error)]
pub enum MarketError {
    // ── Source adapters ──
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("source API error: {0}")]
    Api(String),

    #[error("malformed source response: {0}")]
    Parse(String),

    #[error("no fallback mapping for symbol: {0}")]
    UnmappedSymbol(String),

    // ── Basket assembly ──
    #[error("no usable candles for symbol: {0}")]
    EmptyResult(String),

    // ── Pipeline ──
    #[error("benchmark series unavailable from every source")]
    BenchmarkUnavailable,
}
