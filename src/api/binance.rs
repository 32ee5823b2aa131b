use crate::models::Candle;
use chrono::DateTime;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

const KLINES_PATH: &str = "/api/v3/klines";
const MAX_KLINES_PER_REQUEST: usize = 1000;
const RATE_LIMIT_PER_SEC: u32 = 20;
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

type BinanceRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by exchange (429)")]
    RateLimited,

    #[error("exchange server error ({0})")]
    Server(u16),

    #[error("exchange rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed kline at row {index}: {reason}")]
    Malformed { index: usize, reason: String },

    #[error("invalid symbol '{0}'")]
    InvalidSymbol(String),
}

impl ExchangeError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            ExchangeError::Http(e) => !e.is_decode() && !e.is_builder(),
            ExchangeError::RateLimited | ExchangeError::Server(_) => true,
            _ => false,
        }
    }
}

/// Public market-data client for Binance spot klines
///
/// Cloneable; clones share the HTTP connection pool and rate limiter.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    rate_limiter: Arc<BinanceRateLimiter>,
    initial_backoff: Duration,
}

impl BinanceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let per_sec = NonZeroU32::new(RATE_LIMIT_PER_SEC).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_sec)));

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the first retry delay (doubles on every further attempt)
    pub fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Fetch up to `limit` candles for `symbol` ("DOGE/USDT") at `timeframe` ("5m")
    ///
    /// Retries transient failures with exponential backoff.
    ///
    /// # Returns
    /// Candles sorted by timestamp (oldest first)
    pub async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let market = market_id(symbol)?;
        let limit = if limit > MAX_KLINES_PER_REQUEST {
            tracing::warn!(
                "Requested {} candles, exchange caps a request at {}",
                limit,
                MAX_KLINES_PER_REQUEST
            );
            MAX_KLINES_PER_REQUEST
        } else {
            limit
        };

        let mut attempt = 1;
        loop {
            match self.fetch_once(&market, timeframe, limit).await {
                Ok(candles) => {
                    if attempt > 1 {
                        tracing::info!("✓ Fetched {} after {} attempts", market, attempt);
                    }
                    tracing::info!(
                        "Fetched {} {} candles for {}",
                        candles.len(),
                        timeframe,
                        market
                    );
                    return Ok(candles);
                }
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    let backoff = self.initial_backoff * 2_u32.pow(attempt - 1);
                    tracing::warn!(
                        "Attempt {}/{} failed for {}: {}. Retrying in {}ms...",
                        attempt,
                        MAX_RETRIES,
                        market,
                        e,
                        backoff.as_millis()
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Single request without retry
    async fn fetch_once(
        &self,
        market: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, KLINES_PATH);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", market),
                ("interval", timeframe),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ExchangeError::RateLimited);
        }
        if status.is_server_error() {
            return Err(ExchangeError::Server(status.as_u16()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<Vec<Value>> = response.json().await?;
        parse_klines(&rows)
    }
}

/// "DOGE/USDT" -> "DOGEUSDT"
pub fn market_id(symbol: &str) -> Result<String, ExchangeError> {
    let market: String = symbol
        .chars()
        .filter(|c| *c != '/' && *c != '-')
        .collect::<String>()
        .to_uppercase();

    if market.is_empty() || !market.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ExchangeError::InvalidSymbol(symbol.to_string()));
    }

    Ok(market)
}

/// Convert raw kline rows (`[open_time, "open", "high", "low", "close", "volume", ...]`)
/// into candles, oldest first
pub fn parse_klines(rows: &[Vec<Value>]) -> Result<Vec<Candle>, ExchangeError> {
    let mut candles = rows
        .iter()
        .enumerate()
        .map(|(index, row)| parse_kline(index, row))
        .collect::<Result<Vec<_>, _>>()?;

    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

fn parse_kline(index: usize, row: &[Value]) -> Result<Candle, ExchangeError> {
    let malformed = |reason: String| ExchangeError::Malformed { index, reason };

    if row.len() < 6 {
        return Err(malformed(format!("expected at least 6 fields, got {}", row.len())));
    }

    let open_time = row[0]
        .as_i64()
        .ok_or_else(|| malformed("open time is not an integer".to_string()))?;
    let timestamp = DateTime::from_timestamp_millis(open_time)
        .ok_or_else(|| malformed(format!("open time {} out of range", open_time)))?;

    let field = |pos: usize, name: &str| -> Result<f64, ExchangeError> {
        match &row[pos] {
            Value::String(s) => s
                .parse::<f64>()
                .map_err(|_| malformed(format!("{} '{}' is not a number", name, s))),
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| malformed(format!("{} is not a number", name))),
            other => Err(malformed(format!("{} has unexpected type: {}", name, other))),
        }
    };

    Ok(Candle {
        timestamp,
        open: field(1, "open")?,
        high: field(2, "high")?,
        low: field(3, "low")?,
        close: field(4, "close")?,
        volume: field(5, "volume")?,
    })
}
