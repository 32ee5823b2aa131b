use crate::models::{TradeAction, TradeKind, TradeReason};
use crate::strategy::PositionState;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One BUY followed by its SELL
#[derive(Debug, Clone, Serialize)]
pub struct RoundTrip {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub holding_period_minutes: i64,
    pub exit_reason: TradeReason,
}

impl RoundTrip {
    pub fn from_actions(buy: &TradeAction, sell: &TradeAction) -> Option<Self> {
        if buy.kind != TradeKind::Buy || sell.kind != TradeKind::Sell {
            return None;
        }

        let entry_price = buy.price;
        let exit_price = sell.price;
        let quantity = sell.amount;

        Some(Self {
            entry_time: buy.timestamp,
            exit_time: sell.timestamp,
            entry_price,
            exit_price,
            quantity,
            pnl: quantity * (exit_price - entry_price),
            pnl_pct: ((exit_price - entry_price) / entry_price) * 100.0,
            holding_period_minutes: (sell.timestamp - buy.timestamp).num_minutes(),
            exit_reason: sell.reason,
        })
    }
}

/// What a run did, in quote currency
#[derive(Debug, Clone, Serialize)]
pub struct BacktestSummary {
    // Actions
    pub total_actions: usize,
    pub buys: usize,
    pub sells: usize,
    pub stop_losses: usize,
    pub take_profits: usize,

    // P&L over closed round trips
    pub total_pnl: f64,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64, // Total wins / Total losses
    pub max_drawdown: f64,
    pub avg_holding_period_minutes: f64,

    /// Entry price of a position still open when the data ran out
    pub open_entry_price: Option<f64>,

    pub trades: Vec<RoundTrip>,
}

impl BacktestSummary {
    /// Summarize an action sequence and the position left at the end
    pub fn from_actions(actions: &[TradeAction], final_state: &PositionState) -> Self {
        let buys = actions.iter().filter(|a| a.kind == TradeKind::Buy).count();
        let sells = actions.len() - buys;
        let stop_losses = actions
            .iter()
            .filter(|a| a.reason == TradeReason::StopLoss)
            .count();
        let take_profits = actions
            .iter()
            .filter(|a| a.reason == TradeReason::TakeProfit)
            .count();

        let trades: Vec<RoundTrip> = actions
            .chunks_exact(2)
            .filter_map(|pair| RoundTrip::from_actions(&pair[0], &pair[1]))
            .collect();

        let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();

        let wins: Vec<f64> = trades.iter().map(|t| t.pnl).filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = trades
            .iter()
            .map(|t| t.pnl)
            .filter(|p| *p <= 0.0)
            .map(f64::abs)
            .collect();

        let total_wins: f64 = wins.iter().sum();
        let total_losses: f64 = losses.iter().sum();

        let win_rate = if trades.is_empty() {
            0.0
        } else {
            (wins.len() as f64 / trades.len() as f64) * 100.0
        };
        let avg_win = if wins.is_empty() {
            0.0
        } else {
            total_wins / wins.len() as f64
        };
        let avg_loss = if losses.is_empty() {
            0.0
        } else {
            total_losses / losses.len() as f64
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_holding_period_minutes = if trades.is_empty() {
            0.0
        } else {
            trades.iter().map(|t| t.holding_period_minutes).sum::<i64>() as f64
                / trades.len() as f64
        };

        Self {
            total_actions: actions.len(),
            buys,
            sells,
            stop_losses,
            take_profits,
            total_pnl,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate,
            avg_win,
            avg_loss,
            profit_factor,
            max_drawdown: Self::calculate_drawdown(&trades),
            avg_holding_period_minutes,
            open_entry_price: final_state.entry_price(),
            trades,
        }
    }

    /// Largest peak-to-trough drop of cumulative realised P&L
    fn calculate_drawdown(trades: &[RoundTrip]) -> f64 {
        let mut peak = 0.0_f64;
        let mut cumulative = 0.0;
        let mut max_dd = 0.0_f64;

        for trade in trades {
            cumulative += trade.pnl;
            peak = peak.max(cumulative);
            max_dd = max_dd.max(peak - cumulative);
        }

        max_dd
    }

    /// Print a formatted report to stdout
    pub fn print_report(&self, symbol: &str) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              BACKTEST PERFORMANCE REPORT              ║");
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!("📊 ACTIONS ({})", symbol);
        println!("  Total:                 {}", self.total_actions);
        println!("  Buys:                  {}", self.buys);
        println!(
            "  Sells:                 {} ({} stop loss, {} take profit)",
            self.sells, self.stop_losses, self.take_profits
        );

        println!("\n📈 ROUND TRIPS");
        println!("  Closed:                {}", self.trades.len());
        println!(
            "  Winning:               {} ({:.1}%)",
            self.winning_trades, self.win_rate
        );
        println!("  Losing:                {}", self.losing_trades);
        println!("  Realised P&L:          ${:.4}", self.total_pnl);

        if !self.trades.is_empty() {
            println!("  Average Win:           ${:.4}", self.avg_win);
            println!("  Average Loss:          ${:.4}", self.avg_loss);
            println!("  Profit Factor:         {:.2}", self.profit_factor);
            println!("  Max Drawdown:          ${:.4}", self.max_drawdown);
            println!(
                "  Avg Holding Period:    {:.1} minutes ({:.1} hours)",
                self.avg_holding_period_minutes,
                self.avg_holding_period_minutes / 60.0
            );
        }

        if let Some(entry) = self.open_entry_price {
            println!("\n⏳ Still long from {:.5}", entry);
        }

        println!("\n═══════════════════════════════════════════════════════\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn action(
        kind: TradeKind,
        price: f64,
        amount: f64,
        reason: TradeReason,
        minute: i64,
    ) -> TradeAction {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TradeAction {
            kind,
            price,
            amount,
            reason,
            timestamp: start + Duration::minutes(minute),
        }
    }

    #[test]
    fn test_summary_with_round_trips() {
        let actions = vec![
            action(TradeKind::Buy, 1.0, 10.0, TradeReason::StrategyTriggered, 0),
            action(TradeKind::Sell, 1.6, 10.0, TradeReason::TakeProfit, 60),
            action(TradeKind::Buy, 2.0, 5.0, TradeReason::StrategyTriggered, 120),
            action(TradeKind::Sell, 1.8, 5.0, TradeReason::StopLoss, 240),
        ];

        let summary = BacktestSummary::from_actions(&actions, &PositionState::flat());

        assert_eq!(summary.total_actions, 4);
        assert_eq!(summary.buys, 2);
        assert_eq!(summary.sells, 2);
        assert_eq!(summary.stop_losses, 1);
        assert_eq!(summary.take_profits, 1);
        assert_eq!(summary.trades.len(), 2);
        assert!((summary.total_pnl - (6.0 - 1.0)).abs() < 1e-9);
        assert_eq!(summary.winning_trades, 1);
        assert_eq!(summary.losing_trades, 1);
        assert!((summary.win_rate - 50.0).abs() < 1e-9);
        assert!((summary.profit_factor - 6.0).abs() < 1e-9);
        assert!((summary.max_drawdown - 1.0).abs() < 1e-9);
        assert!((summary.avg_holding_period_minutes - 90.0).abs() < 1e-9);
        assert_eq!(summary.open_entry_price, None);
    }

    #[test]
    fn test_summary_with_open_position() {
        let actions = vec![action(TradeKind::Buy, 0.5, 2.0, TradeReason::StrategyTriggered, 0)];
        let state = PositionState::Long { entry_price: 0.5 };

        let summary = BacktestSummary::from_actions(&actions, &state);

        assert_eq!(summary.buys, 1);
        assert!(summary.trades.is_empty());
        assert_eq!(summary.total_pnl, 0.0);
        assert_eq!(summary.open_entry_price, Some(0.5));
    }

    #[test]
    fn test_summary_with_no_actions() {
        let summary = BacktestSummary::from_actions(&[], &PositionState::flat());

        assert_eq!(summary.total_actions, 0);
        assert_eq!(summary.win_rate, 0.0);
        assert_eq!(summary.profit_factor, 0.0);
    }
}
