use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::warn;

use super::types::Candle;
use crate::cache::MarketSource;
use crate::errors::MarketError;

const EXCHANGE_API: &str = "https://api.binance.com/api/v3";
const FALLBACK_API: &str = "https://api.coincap.io/v2";

static HTTP_CLIENT: OnceCell<reqwest::Client> = OnceCell::const_new();

async fn http_client() -> Result<&'static reqwest::Client, MarketError> {
    HTTP_CLIENT
        .get_or_try_init(|| async {
            reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
                .timeout(Duration::from_secs(20))
                .build()
                .map_err(MarketError::Network)
        })
        .await
}

fn exchange_pair(symbol: &str) -> String {
    format!("{}USDT", symbol.to_uppercase())
}

/// Explicit symbol → fallback asset identifier map. Symbols outside this map
/// are not supported by the fallback source at all.
fn fallback_asset_id(symbol: &str) -> Option<&'static str> {
    let id = match symbol.to_uppercase().as_str() {
        "BTC" => "bitcoin",
        "ETH" => "ethereum",
        "SOL" => "solana",
        "BNB" => "binancecoin",
        "XRP" => "ripple",
        "ADA" => "cardano",
        "DOGE" => "dogecoin",
        "DOT" => "polkadot",
        "LINK" => "chainlink",
        "AVAX" => "avalanche-2",
        _ => return None,
    };
    Some(id)
}

fn epoch_ms_to_date(timestamp: i64) -> String {
    Utc.timestamp_millis_opt(timestamp)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_decimal(value: &Value) -> Result<f64, MarketError> {
    match value {
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| MarketError::Parse(format!("bad decimal field: {}", s))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| MarketError::Parse(format!("bad numeric field: {}", n))),
        other => Err(MarketError::Parse(format!(
            "price field is neither string nor number: {}",
            other
        ))),
    }
}

/// Fetch historical candles for one symbol: primary exchange klines first,
/// then the fallback price-history source. A fallback that cannot deliver
/// returns an empty series ("no data") rather than an error; only an
/// unmapped symbol is reported as a hard failure.
pub async fn fetch_candles(
    symbol: &str,
    interval: &str,
    limit: usize,
) -> Result<Vec<Candle>, MarketError> {
    match fetch_exchange_klines(symbol, interval, limit).await {
        Ok(candles) if !candles.is_empty() => Ok(candles),
        Ok(_) => {
            warn!(symbol, "primary source returned no candles, trying fallback");
            fetch_fallback_history(symbol).await
        }
        Err(err) => {
            warn!(symbol, error = %err, "primary source failed, trying fallback");
            fetch_fallback_history(symbol).await
        }
    }
}

async fn fetch_exchange_klines(
    symbol: &str,
    interval: &str,
    limit: usize,
) -> Result<Vec<Candle>, MarketError> {
    let url = format!(
        "{}/klines?symbol={}&interval={}&limit={}",
        EXCHANGE_API,
        exchange_pair(symbol),
        interval,
        limit
    );

    let client = http_client().await?;
    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        return Err(MarketError::Api(format!(
            "{} for {}",
            response.status(),
            symbol
        )));
    }

    let json: Value = response.json().await?;
    parse_exchange_klines(&json)
}

/// Parse exchange kline rows `[open_time_ms, open, high, low, close, volume, ...]`
/// into candles, newest-first.
pub fn parse_exchange_klines(json: &Value) -> Result<Vec<Candle>, MarketError> {
    let rows = json
        .as_array()
        .ok_or_else(|| MarketError::Parse("klines payload is not an array".to_string()))?;

    let mut result = Vec::with_capacity(rows.len());

    for row in rows {
        let fields = row
            .as_array()
            .ok_or_else(|| MarketError::Parse("kline row is not an array".to_string()))?;
        if fields.len() < 6 {
            return Err(MarketError::Parse(format!(
                "kline row has {} fields, expected at least 6",
                fields.len()
            )));
        }

        let timestamp = fields[0]
            .as_i64()
            .ok_or_else(|| MarketError::Parse("kline open time is not an integer".to_string()))?;

        result.push(Candle {
            timestamp,
            date: epoch_ms_to_date(timestamp),
            open: parse_decimal(&fields[1])?,
            high: parse_decimal(&fields[2])?,
            low: parse_decimal(&fields[3])?,
            close: parse_decimal(&fields[4])?,
            volume: parse_decimal(&fields[5])?,
        });
    }

    // The exchange returns oldest-first; series are newest-first.
    result.reverse();
    Ok(result)
}

async fn fetch_fallback_history(symbol: &str) -> Result<Vec<Candle>, MarketError> {
    let asset_id = fallback_asset_id(symbol)
        .ok_or_else(|| MarketError::UnmappedSymbol(symbol.to_string()))?;

    let url = format!("{}/assets/{}/history?interval=d1", FALLBACK_API, asset_id);

    let outcome = async {
        let client = http_client().await?;
        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(MarketError::Api(format!(
                "{} for {}",
                response.status(),
                symbol
            )));
        }
        let json: Value = response.json().await?;
        parse_fallback_history(&json)
    }
    .await;

    match outcome {
        Ok(candles) => Ok(candles),
        Err(err) => {
            warn!(symbol, error = %err, "fallback source failed, returning no data");
            Ok(Vec::new())
        }
    }
}

/// Parse fallback history points `{priceUsd, time}` into candles, newest-first.
/// The fallback exposes only a spot price per timestamp, so open/high/low/close
/// all collapse to that price and volume is reported as zero.
pub fn parse_fallback_history(json: &Value) -> Result<Vec<Candle>, MarketError> {
    let points = json["data"]
        .as_array()
        .ok_or_else(|| MarketError::Parse("fallback payload has no data array".to_string()))?;

    let mut result = Vec::with_capacity(points.len());

    for point in points {
        let timestamp = point["time"]
            .as_i64()
            .ok_or_else(|| MarketError::Parse("fallback point time is not an integer".to_string()))?;
        let price = parse_decimal(&point["priceUsd"])?;

        result.push(Candle {
            timestamp,
            date: epoch_ms_to_date(timestamp),
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
        });
    }

    // History arrives oldest-first.
    result.reverse();
    Ok(result)
}

/// Live adapter chain used in production: exchange klines with the
/// price-history fallback behind them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExchangeSource;

impl MarketSource for ExchangeSource {
    async fn fetch(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketError> {
        fetch_candles(symbol, interval, limit).await
    }
}
