use clap::{Parser, Subcommand};
use dipbot::api::BinanceClient;
use dipbot::backtest::{BacktestRunner, MarketScenario, SyntheticDataGenerator};
use dipbot::config::BotConfig;
use dipbot::models::Candle;
use dipbot::notify::{run_notifier, TelegramNotifier};
use dipbot::sink::{ChannelSink, CsvTradeLog, FanoutSink, LogSink};
use dipbot::Result;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "dipbot=info";

#[derive(Parser)]
#[command(name = "dipbot")]
#[command(about = "Confluence dip-buying backtester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter, e.g. "debug" or "dipbot=debug,reqwest=warn" (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch candles from Binance and replay the strategy over them
    Run {
        /// Trading pair (e.g., DOGE/USDT)
        #[arg(long)]
        symbol: Option<String>,

        /// Interval (1m, 5m, 15m, 1h, 4h, 1d)
        #[arg(long)]
        timeframe: Option<String>,

        /// Number of candles to fetch
        #[arg(long)]
        limit: Option<usize>,

        /// Seed for take-profit sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Trade log path
        #[arg(long)]
        csv_file: Option<String>,

        /// Skip Telegram alerts even when credentials are set
        #[arg(long)]
        no_notify: bool,
    },

    /// Replay the strategy over a generated series
    Synthetic {
        #[arg(long, value_enum)]
        scenario: MarketScenario,

        /// Number of candles to generate
        #[arg(long, default_value = "1000")]
        candles: usize,

        /// Seed for both the series and take-profit sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Trade log path
        #[arg(long)]
        csv_file: Option<String>,

        /// Skip Telegram alerts even when credentials are set
        #[arg(long)]
        no_notify: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(cli.log_level.as_deref());

    let mut config = BotConfig::from_env()?;

    match cli.command {
        Commands::Run {
            symbol,
            timeframe,
            limit,
            seed,
            csv_file,
            no_notify,
        } => {
            if let Some(symbol) = symbol {
                config.symbol = symbol;
            }
            if let Some(timeframe) = timeframe {
                config.timeframe = timeframe;
            }
            if let Some(limit) = limit {
                config.limit = limit;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            if let Some(csv_file) = csv_file {
                config.csv_file = csv_file;
            }
            config.validate()?;

            tracing::info!(
                "🚀 dipbot starting: {} {} x{} from {}",
                config.symbol,
                config.timeframe,
                config.limit,
                config.binance_base_url
            );

            let client = BinanceClient::new(&config.binance_base_url)?;
            let candles = client
                .fetch_ohlcv(&config.symbol, &config.timeframe, config.limit)
                .await?;

            let source = format!("Binance {} {}", config.symbol, config.timeframe);
            execute(&config, &candles, &source, !no_notify).await
        }
        Commands::Synthetic {
            scenario,
            candles,
            seed,
            csv_file,
            no_notify,
        } => {
            if seed.is_some() {
                config.seed = seed;
            }
            if let Some(csv_file) = csv_file {
                config.csv_file = csv_file;
            }
            config.validate()?;

            let series_seed = config.seed.unwrap_or_else(rand::random);
            tracing::info!(
                "🧪 Generating {} {:?} candles (seed {})",
                candles,
                scenario,
                series_seed
            );

            let interval = config.timeframe_minutes()?;
            let series =
                SyntheticDataGenerator::new(series_seed).generate(scenario, candles, interval);

            let source = format!("synthetic {:?}", scenario);
            execute(&config, &series, &source, !no_notify).await
        }
    }
}

/// Replay `candles` through log, CSV and Telegram sinks, then print the summary
async fn execute(
    config: &BotConfig,
    candles: &[Candle],
    source: &str,
    notify: bool,
) -> Result<()> {
    let runner = BacktestRunner::from_config(config)?;
    let csv_log = CsvTradeLog::open(&config.csv_file)?;

    let notifier = if notify {
        config
            .telegram()
            .map(|(token, chat_id)| TelegramNotifier::new(token, chat_id))
    } else {
        None
    };
    if notifier.is_none() {
        tracing::info!("📵 Telegram alerts disabled");
    }

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let notifier_task = tokio::spawn(run_notifier(notifier, config.symbol.clone(), rx));

    let mut sink = FanoutSink::new()
        .with(LogSink::new(config.symbol.clone()))
        .with(csv_log)
        .with(ChannelSink::new(tx));

    let report = runner.run_and_report(candles, &mut sink, &config.symbol, source);

    // Closing the channel lets the notifier finish its queue
    drop(sink);
    let delivered = notifier_task.await?;

    let report = report?;
    tracing::info!(
        "✅ Done: {} actions, {} alerts delivered, trade log at {}",
        report.actions.len(),
        delivered,
        config.csv_file
    );

    Ok(())
}

fn setup_logging(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) if level.contains('=') => EnvFilter::new(level),
        Some(level) => EnvFilter::new(format!("dipbot={}", level)),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
