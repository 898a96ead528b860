use super::types::{AssetScore, Candle, ValuationStatus, BENCHMARK_SYMBOL};

const RSI_PERIOD: usize = 14;
const CORRELATION_WINDOW: usize = 90;
const VOLUME_WINDOW: usize = 30;
const SPARKLINE_LEN: usize = 7;

/// RSI(14) over the 15 most recent closes. Neutral 50 when the series is too
/// short; 100 when there were no losing steps at all.
pub fn relative_strength_index(series: &[Candle]) -> f64 {
    if series.len() < RSI_PERIOD + 1 {
        return 50.0;
    }

    // Series are newest-first; RSI steps run oldest -> newest.
    let mut closes: Vec<f64> = series[..RSI_PERIOD + 1].iter().map(|c| c.close).collect();
    closes.reverse();

    let mut gains = 0.0;
    let mut losses = 0.0;
    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let avg_gain = gains / RSI_PERIOD as f64;
    let avg_loss = losses / RSI_PERIOD as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Pearson correlation of the most recent aligned closes (up to 90). Zero
/// when fewer than 2 points align or either side has no variance.
pub fn pearson_correlation(asset: &[Candle], benchmark: &[Candle]) -> f64 {
    let n = asset.len().min(benchmark.len()).min(CORRELATION_WINDOW);
    if n < 2 {
        return 0.0;
    }

    let mean_x = asset[..n].iter().map(|c| c.close).sum::<f64>() / n as f64;
    let mean_y = benchmark[..n].iter().map(|c| c.close).sum::<f64>() / n as f64;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..n {
        let dx = asset[i].close - mean_x;
        let dy = benchmark[i].close - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }

    covariance / (var_x.sqrt() * var_y.sqrt())
}

/// Current volume against the mean volume of the preceding 30 days (the
/// current day excluded). Zero when no trailing average exists.
pub fn volume_ratio(series: &[Candle]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }

    let trailing = &series[1..series.len().min(VOLUME_WINDOW + 1)];
    let avg = trailing.iter().map(|c| c.volume).sum::<f64>() / trailing.len() as f64;
    if avg == 0.0 {
        return 0.0;
    }

    series[0].volume / avg
}

/// Last 7 closes, oldest -> newest, min-max normalized to [0, 1]. Empty when
/// fewer than 7 candles exist; a flat window normalizes to all zeros.
pub fn sparkline(series: &[Candle]) -> Vec<f64> {
    if series.len() < SPARKLINE_LEN {
        return Vec::new();
    }

    let mut closes: Vec<f64> = series[..SPARKLINE_LEN].iter().map(|c| c.close).collect();
    closes.reverse();

    let min = closes.iter().copied().fold(f64::INFINITY, f64::min);
    let max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };

    closes.iter().map(|c| (c - min) / range).collect()
}

pub fn valuation_status(diff_percent: f64) -> ValuationStatus {
    if diff_percent < -10.0 {
        ValuationStatus::Undervalued
    } else if diff_percent > 10.0 {
        ValuationStatus::Overvalued
    } else {
        ValuationStatus::Balanced
    }
}

/// Additive 0-100 valuation-attractiveness heuristic: 50 plus signed
/// adjustments from each signal, clamped. Order-independent by construction.
pub fn sniper_score(
    diff_percent: f64,
    win_rate: f64,
    correlation: f64,
    rsi: f64,
    volume_ratio: f64,
) -> f64 {
    let mut score: f64 = 50.0;

    if diff_percent < -10.0 {
        score += 20.0;
    } else if diff_percent < 0.0 {
        score += 10.0;
    } else if diff_percent > 10.0 {
        score -= 20.0;
    }

    if win_rate > 80.0 {
        score += 15.0;
    } else if win_rate > 50.0 {
        score += 5.0;
    }

    if correlation > 0.8 {
        score += 10.0;
    } else if correlation < 0.3 {
        score -= 10.0;
    }

    if rsi < 30.0 {
        score += 15.0;
    } else if rsi > 70.0 {
        score -= 15.0;
    }

    if volume_ratio > 1.5 {
        score += 10.0;
    }

    score.clamp(0.0, 100.0)
}

/// Score one non-benchmark asset against the matched historical indices.
/// None when the series is empty or no matched index falls inside it.
pub fn score_asset(
    symbol: &str,
    series: &[Candle],
    benchmark: &[Candle],
    matched_indices: &[usize],
) -> Option<AssetScore> {
    let current_price = series.first()?.close;

    let matched_closes: Vec<f64> = matched_indices
        .iter()
        .filter(|&&i| i < series.len())
        .map(|&i| series[i].close)
        .collect();
    if matched_closes.is_empty() {
        return None;
    }

    let avg_hist_price = matched_closes.iter().sum::<f64>() / matched_closes.len() as f64;
    let diff_percent = (current_price - avg_hist_price) / avg_hist_price * 100.0;

    let wins = matched_closes.iter().filter(|&&p| p > current_price).count();
    let win_rate = wins as f64 / matched_closes.len() as f64 * 100.0;

    let potential_upside = if current_price < avg_hist_price {
        (avg_hist_price - current_price) / current_price * 100.0
    } else {
        0.0
    };

    let correlation = pearson_correlation(series, benchmark);
    let rsi = relative_strength_index(series);
    let volume_ratio = volume_ratio(series);

    Some(AssetScore {
        symbol: symbol.to_string(),
        current_price,
        avg_hist_price,
        diff_percent,
        status: valuation_status(diff_percent),
        win_rate,
        potential_upside,
        correlation,
        rsi,
        volume_ratio,
        sparkline: sparkline(series),
        sniper_score: sniper_score(diff_percent, win_rate, correlation, rsi, volume_ratio),
    })
}

/// The benchmark is never scored by the valuation rules; it anchors the
/// comparison with a fixed Benchmark status and a zero sniper score.
pub fn score_benchmark(series: &[Candle]) -> Option<AssetScore> {
    let current_price = series.first()?.close;

    Some(AssetScore {
        symbol: BENCHMARK_SYMBOL.to_string(),
        current_price,
        avg_hist_price: current_price,
        diff_percent: 0.0,
        status: ValuationStatus::Benchmark,
        win_rate: 50.0,
        potential_upside: 0.0,
        correlation: 1.0,
        rsi: relative_strength_index(series),
        volume_ratio: volume_ratio(series),
        sparkline: sparkline(series),
        sniper_score: 0.0,
    })
}
