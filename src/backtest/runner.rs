use crate::backtest::metrics::BacktestSummary;
use crate::config::{BotConfig, ConfigError};
use crate::indicators::{apply_indicators, IndicatorConfig};
use crate::models::{Candle, TradeAction};
use crate::sink::ActionSink;
use crate::strategy::{Evaluator, PositionState, StrategyConfig};
use crate::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Everything one pass over a candle series produced
#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub actions: Vec<TradeAction>,
    pub final_state: PositionState,
    pub summary: BacktestSummary,
}

/// Backtest runner that replays a candle series through the strategy
pub struct BacktestRunner {
    indicators: IndicatorConfig,
    evaluator: Evaluator,
    seed: Option<u64>,
}

impl BacktestRunner {
    /// Create a new backtest runner
    ///
    /// Without a seed every run draws take-profit targets from fresh entropy.
    pub fn new(
        indicators: IndicatorConfig,
        strategy: StrategyConfig,
        seed: Option<u64>,
    ) -> std::result::Result<Self, ConfigError> {
        let evaluator = Evaluator::new(strategy, &indicators)?;
        Ok(Self {
            indicators,
            evaluator,
            seed,
        })
    }

    pub fn from_config(config: &BotConfig) -> std::result::Result<Self, ConfigError> {
        Self::new(config.indicator_config(), config.strategy_config(), config.seed)
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Run a backtest over `candles`, starting flat
    ///
    /// # Arguments
    /// * `candles` - Historical candle data, oldest first
    /// * `sink` - Receives every action as it is produced
    ///
    /// # Returns
    /// Actions, the position left at the end and the run summary
    pub fn run<S: ActionSink + ?Sized>(
        &self,
        candles: &[Candle],
        sink: &mut S,
    ) -> Result<BacktestReport> {
        if let Some(i) = candles
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(format!(
                "Candles must be strictly ascending by time: {} follows {}",
                candles[i + 1].timestamp,
                candles[i].timestamp
            )
            .into());
        }

        tracing::info!(
            "Starting backtest: {} candles, strategy needs {}",
            candles.len(),
            self.evaluator.start_index() + 1
        );

        let rows = apply_indicators(candles, &self.indicators);
        let mut state = PositionState::flat();
        let mut rng = self.rng();

        let actions = self.evaluator.run(&rows, &mut state, &mut rng, sink);
        let summary = BacktestSummary::from_actions(&actions, &state);

        tracing::info!(
            "Backtest complete: {} actions, {} round trips, P&L: ${:.4}",
            summary.total_actions,
            summary.trades.len(),
            summary.total_pnl
        );

        Ok(BacktestReport {
            actions,
            final_state: state,
            summary,
        })
    }

    /// Run backtest and print report
    pub fn run_and_report<S: ActionSink + ?Sized>(
        &self,
        candles: &[Candle],
        sink: &mut S,
        symbol: &str,
        source_name: &str,
    ) -> Result<BacktestReport> {
        println!("\n🔬 Running backtest: {}", source_name);
        println!("   Candles: {}", candles.len());
        println!("   Notional per trade: ${:.2}", self.evaluator.config().trade_usd);
        match self.seed {
            Some(seed) => println!("   Seed: {}", seed),
            None => println!("   Seed: (entropy)"),
        }

        let report = self.run(candles, sink)?;
        report.summary.print_report(symbol);

        Ok(report)
    }
}
