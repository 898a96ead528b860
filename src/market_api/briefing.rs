use chrono::Local;

use super::types::{AssetScore, Briefing, ValuationStatus};

/// Derive the aggregate market-sentiment label and short narrative from the
/// already-scored results. Deterministic; the optional external narrative
/// generator lives outside this crate and falls back to this.
pub fn synthesize_briefing(results: &[AssetScore], current_btc: f64) -> Briefing {
    let scored: Vec<&AssetScore> = results
        .iter()
        .filter(|r| r.status != ValuationStatus::Benchmark)
        .collect();

    let undervalued = scored
        .iter()
        .filter(|r| r.status == ValuationStatus::Undervalued)
        .count();
    let overvalued = scored
        .iter()
        .filter(|r| r.status == ValuationStatus::Overvalued)
        .count();

    let sentiment = if undervalued * 2 > scored.len() {
        "Bullish"
    } else if overvalued * 2 > scored.len() {
        "Overheated"
    } else {
        "Neutral"
    };

    let mut summary = format!("BTC is currently trading at ${:.2}.", current_btc);
    match sentiment {
        "Bullish" => summary.push_str(
            " Broad undervaluation signals across the basket suggest an accumulation window.",
        ),
        "Overheated" => summary.push_str(
            " Most assets trade well above their historical reference prices; chasing here carries elevated risk.",
        ),
        _ => summary.push_str(" Risk/reward across the basket looks balanced."),
    }

    // Results arrive sorted by sniper score, so the first non-benchmark
    // entry is the top pick.
    if let Some(top) = scored.first() {
        summary.push_str(&format!(
            " Top pick: {} (score {:.0}, {}).",
            top.symbol,
            top.sniper_score,
            top.status.as_str()
        ));
    }

    Briefing {
        title: format!("Market Sentiment: {}", sentiment),
        summary,
        timestamp: Local::now().format("%H:%M").to_string(),
    }
}
