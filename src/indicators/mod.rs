// Technical indicators module
// Turns a candle series into indicator rows (SMA, Bollinger, MACD, RSI, Stochastic)

pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod stochastic;

pub use bollinger::{calculate_bollinger_series, BollingerBands};
pub use macd::{calculate_macd_series, MacdValue};
pub use moving_average::{calculate_ema_series, calculate_sma, calculate_sma_series};
pub use rsi::calculate_rsi_series;
pub use stochastic::calculate_stochastic_series;

use crate::models::Candle;

/// Window sizes for every indicator on an [`IndicatorRow`]
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub ma_short: usize,
    pub ma_long: usize,
    pub bb_window: usize,
    pub bb_multiplier: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub stoch_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ma_short: 20,
            ma_long: 200,
            bb_window: 20,
            bb_multiplier: 2.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            stoch_period: 14,
        }
    }
}

impl IndicatorConfig {
    /// First index at which every indicator field can be defined
    ///
    /// # Example
    /// ```
    /// use dipbot::indicators::IndicatorConfig;
    ///
    /// // the 200-candle moving average is the slowest to warm up
    /// assert_eq!(IndicatorConfig::default().warmup(), 199);
    /// ```
    pub fn warmup(&self) -> usize {
        [
            self.ma_short.saturating_sub(1),
            self.ma_long.saturating_sub(1),
            self.bb_window.saturating_sub(1),
            self.macd_slow.max(self.macd_fast).saturating_sub(1)
                + self.macd_signal.saturating_sub(1),
            self.rsi_period,
            self.stoch_period.saturating_sub(1),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// A candle plus every derived indicator value at its index.
///
/// `None` means the indicator has not warmed up (or is undefined) here.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub candle: Candle,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub rsi: Option<f64>,
    pub stoch: Option<f64>,
}

impl IndicatorRow {
    /// Row with no indicator values, for hand-built scenarios
    pub fn bare(candle: Candle) -> Self {
        Self {
            candle,
            ma_short: None,
            ma_long: None,
            bb_upper: None,
            bb_lower: None,
            macd: None,
            macd_signal: None,
            rsi: None,
            stoch: None,
        }
    }

    pub fn close(&self) -> f64 {
        self.candle.close
    }
}

/// Compute all indicators over `candles`
///
/// The output has the same length and order as the input.
pub fn apply_indicators(candles: &[Candle], config: &IndicatorConfig) -> Vec<IndicatorRow> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let ma_short = calculate_sma_series(&closes, config.ma_short);
    let ma_long = calculate_sma_series(&closes, config.ma_long);
    let bands = calculate_bollinger_series(&closes, config.bb_window, config.bb_multiplier);
    let macd = calculate_macd_series(
        &closes,
        config.macd_fast,
        config.macd_slow,
        config.macd_signal,
    );
    let rsi = calculate_rsi_series(&closes, config.rsi_period);
    let stoch = calculate_stochastic_series(candles, config.stoch_period);

    tracing::debug!(
        "Computed indicators for {} candles (warm-up index {})",
        candles.len(),
        config.warmup()
    );

    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| IndicatorRow {
            candle: candle.clone(),
            ma_short: ma_short[i],
            ma_long: ma_long[i],
            bb_upper: bands[i].map(|b| b.upper),
            bb_lower: bands[i].map(|b| b.lower),
            macd: macd[i].line,
            macd_signal: macd[i].signal,
            rsi: rsi[i],
            stoch: stoch[i],
        })
        .collect()
}
