use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// OHLCV candlestick data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Side of an emitted trade action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeKind {
    Buy,
    Sell,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::Buy => write!(f, "BUY"),
            TradeKind::Sell => write!(f, "SELL"),
        }
    }
}

/// Why an action fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeReason {
    #[serde(rename = "Strategy Triggered")]
    StrategyTriggered,
    #[serde(rename = "Stop Loss Hit")]
    StopLoss,
    #[serde(rename = "Take Profit Hit")]
    TakeProfit,
}

impl TradeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeReason::StrategyTriggered => "Strategy Triggered",
            TradeReason::StopLoss => "Stop Loss Hit",
            TradeReason::TakeProfit => "Take Profit Hit",
        }
    }
}

impl fmt::Display for TradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A BUY or SELL decision emitted by the evaluator.
///
/// `timestamp` is the open time of the candle that triggered the action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAction {
    pub kind: TradeKind,
    pub price: f64,
    pub amount: f64,
    pub reason: TradeReason,
    pub timestamp: DateTime<Utc>,
}

impl TradeAction {
    /// Human-readable one-liner used for logs and notifications
    pub fn describe(&self, symbol: &str) -> String {
        format!(
            "{} {:.4} {} at {:.5} | Reason: {}",
            self.kind, self.amount, symbol, self.price, self.reason
        )
    }
}
