use crate::config::ConfigError;
use crate::indicators::{IndicatorConfig, IndicatorRow};
use crate::models::{TradeAction, TradeKind, TradeReason};
use crate::sink::ActionSink;
use crate::strategy::{PositionState, StrategyConfig};
use rand::Rng;

/// RSI level below which the market counts as oversold
pub const RSI_OVERSOLD: f64 = 30.0;

/// Stochastic %K level below which the market counts as oversold
pub const STOCH_OVERSOLD: f64 = 20.0;

/// Confluence dip-buying strategy with stop-loss / random take-profit exits
///
/// Entry (FLAT -> LONG), ALL must hold on the same candle:
/// - close below the lower Bollinger band
/// - MACD above its signal line
/// - RSI below 30
/// - Stochastic %K below 20
/// - close above the long moving average
///
/// Exit (LONG -> FLAT), first match wins:
/// - close at or below `entry * (1 - stop_loss_pct)`
/// - close at or above `entry * (1 + target)` where `target` is drawn
///   uniformly from `[take_profit_min_pct, take_profit_max_pct]` on every
///   candle the stop-loss did not fire
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: StrategyConfig,
    start_index: usize,
}

impl Evaluator {
    /// Build an evaluator, rejecting a config it could not step with
    /// (e.g. an inverted take-profit range).
    pub fn new(config: StrategyConfig, indicators: &IndicatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            start_index: indicators.warmup().max(indicators.ma_long),
        })
    }

    /// First row index the evaluator looks at; earlier rows are skipped.
    ///
    /// The first `ma_long` rows are never evaluated (200 with defaults),
    /// even where a shorter warm-up would already define every indicator.
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Whether `row` satisfies every entry condition.
    ///
    /// Any missing indicator makes the whole rule fail.
    pub fn entry_signal(&self, row: &IndicatorRow) -> bool {
        let close = row.close();

        let (
            Some(bb_lower),
            Some(macd),
            Some(macd_signal),
            Some(rsi),
            Some(stoch),
            Some(ma_long),
        ) = (
            row.bb_lower,
            row.macd,
            row.macd_signal,
            row.rsi,
            row.stoch,
            row.ma_long,
        ) else {
            return false;
        };

        let conditions = [
            close < bb_lower,
            macd > macd_signal,
            rsi < RSI_OVERSOLD,
            stoch < STOCH_OVERSOLD,
            close > ma_long,
        ];

        tracing::debug!(
            "Entry check @ {}: close={:.5} bb_lower={:.5} ({}), macd={:.6}>{:.6} ({}), \
             rsi={:.1} ({}), stoch={:.1} ({}), ma_long={:.5} ({})",
            row.candle.timestamp,
            close,
            bb_lower,
            conditions[0],
            macd,
            macd_signal,
            conditions[1],
            rsi,
            conditions[2],
            stoch,
            conditions[3],
            ma_long,
            conditions[4]
        );

        conditions.iter().all(|&c| c)
    }

    /// Evaluate one row against the current position, updating it in place
    pub fn step<R: Rng>(
        &self,
        row: &IndicatorRow,
        state: &mut PositionState,
        rng: &mut R,
    ) -> Option<TradeAction> {
        let close = row.close();

        match *state {
            PositionState::Flat => {
                if !self.entry_signal(row) {
                    return None;
                }

                state.open(close);
                Some(TradeAction {
                    kind: TradeKind::Buy,
                    price: close,
                    amount: self.config.trade_usd / close,
                    reason: TradeReason::StrategyTriggered,
                    timestamp: row.candle.timestamp,
                })
            }
            PositionState::Long { entry_price } => {
                let reason = if close <= entry_price * (1.0 - self.config.stop_loss_pct) {
                    TradeReason::StopLoss
                } else {
                    let target = rng.gen_range(
                        self.config.take_profit_min_pct..=self.config.take_profit_max_pct,
                    );
                    if close >= entry_price * (1.0 + target) {
                        TradeReason::TakeProfit
                    } else {
                        return None;
                    }
                };

                state.close();
                Some(TradeAction {
                    kind: TradeKind::Sell,
                    price: close,
                    amount: self.config.trade_usd / entry_price,
                    reason,
                    timestamp: row.candle.timestamp,
                })
            }
        }
    }

    /// Walk `rows` in order from `start_index()`, emitting every action
    /// to `sink` and returning them.
    ///
    /// A failing sink is logged and otherwise ignored.
    pub fn run<R, S>(
        &self,
        rows: &[IndicatorRow],
        state: &mut PositionState,
        rng: &mut R,
        sink: &mut S,
    ) -> Vec<TradeAction>
    where
        R: Rng,
        S: ActionSink + ?Sized,
    {
        let mut actions = Vec::new();

        if rows.len() <= self.start_index {
            tracing::info!(
                "Not enough candles to evaluate: have {}, first usable index is {}",
                rows.len(),
                self.start_index
            );
            return actions;
        }

        for row in &rows[self.start_index..] {
            if let Some(action) = self.step(row, state, rng) {
                if let Err(e) = sink.emit(&action) {
                    tracing::warn!(
                        "Trade sink failed for {} @ {}: {:#}",
                        action.kind,
                        action.timestamp,
                        e
                    );
                }
                actions.push(action);
            }
        }

        actions
    }
}
