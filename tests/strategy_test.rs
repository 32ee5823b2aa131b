use chrono::{Duration, TimeZone, Utc};
use dipbot::backtest::{BacktestRunner, MarketScenario, SyntheticDataGenerator};
use dipbot::indicators::{apply_indicators, IndicatorConfig, IndicatorRow};
use dipbot::strategy::{Evaluator, PositionState, StrategyConfig};
use dipbot::{Candle, TradeAction, TradeKind, TradeReason};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn candle(i: i64, close: f64) -> Candle {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    Candle {
        timestamp: start + Duration::minutes(5 * i),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1000.0,
    }
}

fn flat_rows(n: i64, close: f64) -> Vec<IndicatorRow> {
    (0..n).map(|i| IndicatorRow::bare(candle(i, close))).collect()
}

fn qualifying(i: i64, close: f64) -> IndicatorRow {
    IndicatorRow {
        ma_short: Some(close),
        ma_long: Some(close * 0.8),
        bb_upper: Some(close * 1.4),
        bb_lower: Some(close * 1.05),
        macd: Some(0.0005),
        macd_signal: Some(0.0001),
        rsi: Some(22.0),
        stoch: Some(8.0),
        ..IndicatorRow::bare(candle(i, close))
    }
}

fn default_evaluator() -> Evaluator {
    Evaluator::new(StrategyConfig::default(), &IndicatorConfig::default()).unwrap()
}

fn default_runner(seed: u64) -> BacktestRunner {
    BacktestRunner::new(IndicatorConfig::default(), StrategyConfig::default(), Some(seed))
        .unwrap()
}

#[test]
fn test_short_series_emits_nothing() {
    let candles = SyntheticDataGenerator::new(3).generate(MarketScenario::Volatile, 199, 5);

    let mut sink: Vec<TradeAction> = Vec::new();
    let report = default_runner(3).run(&candles, &mut sink).unwrap();

    assert!(report.actions.is_empty());
    assert!(sink.is_empty());
    assert!(report.final_state.is_flat());
}

#[test]
fn test_actions_alternate_buy_sell() {
    for seed in 0..4 {
        let candles =
            SyntheticDataGenerator::new(seed).generate(MarketScenario::DipRecovery, 1000, 5);
        let report = default_runner(seed)
            .run(&candles, &mut Vec::<TradeAction>::new())
            .unwrap();

        assert!(!report.actions.is_empty(), "seed {} never traded", seed);
        assert_eq!(report.actions.len(), 10);
        for pair in report.actions.windows(2) {
            assert_ne!(pair[0].kind, pair[1].kind, "seed {}: two {} in a row", seed, pair[0].kind);
        }

        let first = &report.actions[0];
        assert_eq!(first.kind, TradeKind::Buy);
        assert_eq!(first.reason, TradeReason::StrategyTriggered);
        for sell in report.actions.iter().filter(|a| a.kind == TradeKind::Sell) {
            assert!(matches!(sell.reason, TradeReason::StopLoss | TradeReason::TakeProfit));
        }
    }
}

#[test]
fn test_position_follows_actions() {
    let eval = default_evaluator();
    let mut state = PositionState::flat();
    let mut rng = StdRng::seed_from_u64(8);

    let buy = eval.step(&qualifying(0, 0.20), &mut state, &mut rng).unwrap();
    assert_eq!(buy.kind, TradeKind::Buy);
    assert_eq!(state.entry_price(), Some(0.20));

    let sell = eval
        .step(&IndicatorRow::bare(candle(1, 0.17)), &mut state, &mut rng)
        .unwrap();
    assert_eq!(sell.kind, TradeKind::Sell);
    assert!(state.is_flat());
    assert_eq!(state.entry_price(), None);
}

#[test]
fn test_stop_loss_precedes_take_profit() {
    // Any close at or above entry * 0.95 would count as a take-profit
    let strategy = StrategyConfig {
        stop_loss_pct: 0.02,
        take_profit_min_pct: -0.05,
        take_profit_max_pct: -0.05,
        ..StrategyConfig::default()
    };
    let eval = Evaluator::new(strategy, &IndicatorConfig::default()).unwrap();
    let mut state = PositionState::Long { entry_price: 1.0 };
    let mut rng = StdRng::seed_from_u64(4);

    let action = eval
        .step(&IndicatorRow::bare(candle(0, 0.97)), &mut state, &mut rng)
        .unwrap();

    assert_eq!(action.reason, TradeReason::StopLoss);
    assert_eq!(action.reason.to_string(), "Stop Loss Hit");
}

#[test]
fn test_flat_series_never_buys() {
    let candles: Vec<Candle> = (0..300).map(|i| candle(i, 0.25)).collect();
    let rows = apply_indicators(&candles, &IndicatorConfig::default());

    let last = rows.last().unwrap();
    assert_eq!(last.bb_lower, Some(0.25));
    assert_eq!(last.bb_upper, Some(0.25));
    assert_eq!(last.rsi, Some(50.0));
    assert_eq!(last.stoch, None);

    let report = default_runner(1)
        .run(&candles, &mut Vec::<TradeAction>::new())
        .unwrap();
    assert!(report.actions.is_empty());
}

#[test]
fn test_single_qualifying_row_buys_once() {
    let mut rows = flat_rows(250, 0.10);
    rows[210] = qualifying(210, 0.10);

    let eval = default_evaluator();
    let mut state = PositionState::flat();
    let mut rng = StdRng::seed_from_u64(12);
    let mut sink: Vec<TradeAction> = Vec::new();

    let actions = eval.run(&rows, &mut state, &mut rng, &mut sink);

    assert_eq!(actions.len(), 1);
    assert_eq!(sink, actions);
    assert_eq!(actions[0].kind, TradeKind::Buy);
    assert_eq!(actions[0].timestamp, rows[210].candle.timestamp);
    assert!((actions[0].amount - 10.0).abs() < 1e-9);
    assert!(state.is_long());
}

#[test]
fn test_stop_loss_threshold() {
    let eval = default_evaluator();
    let mut rng = StdRng::seed_from_u64(2);

    let mut state = PositionState::Long { entry_price: 1.00 };
    assert!(eval
        .step(&IndicatorRow::bare(candle(0, 0.91)), &mut state, &mut rng)
        .is_none());

    let action = eval
        .step(&IndicatorRow::bare(candle(1, 0.89)), &mut state, &mut rng)
        .unwrap();
    assert_eq!(
        action.describe("DOGE/USDT"),
        "SELL 1.0000 DOGE/USDT at 0.89000 | Reason: Stop Loss Hit"
    );
}

#[test]
fn test_same_seed_same_actions() {
    let candles = SyntheticDataGenerator::new(21).generate(MarketScenario::DipRecovery, 1000, 5);

    let a = default_runner(77)
        .run(&candles, &mut Vec::<TradeAction>::new())
        .unwrap();
    let b = default_runner(77)
        .run(&candles, &mut Vec::<TradeAction>::new())
        .unwrap();

    assert!(!a.actions.is_empty());
    assert_eq!(a.actions, b.actions);
    assert_eq!(a.final_state, b.final_state);
}

#[test]
fn test_seed_decides_take_profit_exits() {
    // Closes of 1.75x entry exit only when the drawn target is <= 75%,
    // so the seed picks which candle of each cycle sells
    let mut rows = flat_rows(200, 1.0);
    for _ in 0..20 {
        let at = rows.len() as i64;
        rows.push(qualifying(at, 1.0));
        for k in 1..=30 {
            rows.push(IndicatorRow::bare(candle(at + k, 1.75)));
        }
        rows.push(IndicatorRow::bare(candle(at + 31, 0.5)));
    }

    let eval = default_evaluator();
    let replay = |seed: u64| {
        let mut state = PositionState::flat();
        let mut rng = StdRng::seed_from_u64(seed);
        eval.run(&rows, &mut state, &mut rng, &mut Vec::<TradeAction>::new())
    };

    let first = replay(3);
    assert!(!first.is_empty());
    assert_eq!(first.len(), 40);
    assert!(first
        .iter()
        .any(|a| a.reason == TradeReason::TakeProfit && a.price == 1.75));

    assert_eq!(first, replay(3));
    assert!((4..12).any(|seed| replay(seed) != first));
}
