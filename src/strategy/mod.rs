// Trading strategy module
pub mod evaluator;
pub mod position;

pub use evaluator::Evaluator;
pub use position::{PositionState, PositionStatus};

use crate::config::ConfigError;

/// Sizing and exit parameters for the confluence strategy
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    /// Quote-currency notional spent on every BUY (e.g. 1.0 USDT)
    pub trade_usd: f64,

    /// Fractional drop from entry that closes the position (e.g. 0.10 = 10%)
    pub stop_loss_pct: f64,

    /// Lower bound of the take-profit target, redrawn every candle
    pub take_profit_min_pct: f64,

    /// Upper bound of the take-profit target
    pub take_profit_max_pct: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            trade_usd: 1.0,
            stop_loss_pct: 0.10,
            take_profit_min_pct: 0.50,
            take_profit_max_pct: 1.00,
        }
    }
}

impl StrategyConfig {
    /// Reject parameters the evaluator cannot act on.
    ///
    /// The take-profit bounds may be negative but must be finite and ordered,
    /// since every candle draws a target from `min..=max`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.trade_usd > 0.0 && self.trade_usd.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "trade_usd must be > 0, got {}",
                self.trade_usd
            )));
        }
        if !(self.stop_loss_pct > 0.0 && self.stop_loss_pct < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "stop_loss_pct must be in (0, 1), got {}",
                self.stop_loss_pct
            )));
        }

        let (min, max) = (self.take_profit_min_pct, self.take_profit_max_pct);
        if !(min.is_finite() && max.is_finite() && min <= max) {
            return Err(ConfigError::Invalid(format!(
                "take-profit range must satisfy min <= max, got [{}, {}]",
                min, max
            )));
        }

        Ok(())
    }
}
