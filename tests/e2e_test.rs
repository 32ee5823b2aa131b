use dipbot::backtest::{BacktestRunner, MarketScenario, SyntheticDataGenerator};
use dipbot::config::BotConfig;
use dipbot::notify::{run_notifier, TelegramNotifier};
use dipbot::sink::{ChannelSink, CsvTradeLog, FanoutSink, LogSink};
use dipbot::{BinanceClient, Candle, TradeKind, TradeReason};
use mockito::Matcher;
use serde_json::{json, Value};

fn klines_body(candles: &[Candle]) -> String {
    let rows: Vec<Value> = candles
        .iter()
        .map(|c| {
            let open_time = c.timestamp.timestamp_millis();
            json!([
                open_time,
                c.open.to_string(),
                c.high.to_string(),
                c.low.to_string(),
                c.close.to_string(),
                c.volume.to_string(),
                open_time + 299_999,
                "0",
                10,
                "0",
                "0",
                "0"
            ])
        })
        .collect();

    Value::Array(rows).to_string()
}

#[tokio::test]
async fn test_e2e_workflow() {
    let _ = tracing_subscriber::fmt::try_init();

    // Scripted sell-offs: five entries, exits alternate stop-loss / take-profit
    let generated =
        SyntheticDataGenerator::new(2024).generate(MarketScenario::DipRecovery, 1000, 5);

    // 1. Exchange serves the series
    let mut exchange = mockito::Server::new_async().await;
    let klines = exchange
        .mock("GET", "/api/v3/klines")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("symbol".into(), "DOGEUSDT".into()),
            Matcher::UrlEncoded("interval".into(), "5m".into()),
            Matcher::UrlEncoded("limit".into(), "1000".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(klines_body(&generated))
        .create_async()
        .await;

    let config = BotConfig {
        limit: 1000,
        seed: Some(5),
        binance_base_url: exchange.url(),
        ..BotConfig::default()
    };
    config.validate().unwrap();

    let client = BinanceClient::new(&config.binance_base_url).unwrap();
    let candles = client
        .fetch_ohlcv(&config.symbol, &config.timeframe, config.limit)
        .await
        .unwrap();
    klines.assert_async().await;
    assert_eq!(candles, generated);

    // 2. Telegram accepts every alert
    let mut telegram = mockito::Server::new_async().await;
    let alerts = telegram
        .mock("POST", "/botTOKEN/sendMessage")
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .expect(10)
        .create_async()
        .await;
    let notifier = TelegramNotifier::new("TOKEN", "42").with_base_url(telegram.url());

    // 3. Replay through every sink
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("trades.csv");

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let notifier_task = tokio::spawn(run_notifier(Some(notifier), config.symbol.clone(), rx));

    let mut sink = FanoutSink::new()
        .with(LogSink::new(config.symbol.clone()))
        .with(CsvTradeLog::open(&csv_path).unwrap())
        .with(ChannelSink::new(tx));
    assert_eq!(sink.len(), 3);

    let report = BacktestRunner::from_config(&config)
        .unwrap()
        .run(&candles, &mut sink)
        .unwrap();
    drop(sink);

    let delivered = notifier_task.await.unwrap();
    alerts.assert_async().await;

    // 4. Every action landed everywhere
    assert!(!report.actions.is_empty());
    assert_eq!(report.actions.len(), 10);
    assert_eq!(delivered, report.actions.len());

    let log = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines[0], "timestamp,kind,price,amount,reason");
    assert_eq!(lines.len(), report.actions.len() + 1);

    for (line, action) in lines[1..].iter().zip(&report.actions) {
        assert!(line.contains(&action.kind.to_string()));
        assert!(line.ends_with(action.reason.as_str()));
    }

    assert_eq!(report.summary.buys, 5);
    assert_eq!(report.summary.sells, 5);
    assert_eq!(report.summary.stop_losses, 3);
    assert_eq!(report.summary.take_profits, 2);

    assert_eq!(report.actions[0].kind, TradeKind::Buy);
    assert_eq!(report.actions[0].timestamp, candles[270].timestamp);
    assert_eq!(report.actions[1].reason, TradeReason::StopLoss);
    assert_eq!(report.actions[3].reason, TradeReason::TakeProfit);
    assert!(report.final_state.is_flat());
}
