use crate::indicators::IndicatorConfig;
use crate::strategy::StrategyConfig;
use serde::Deserialize;

pub const DEFAULT_BINANCE_BASE_URL: &str = "https://api.binance.com";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Everything a run needs, built once at startup and passed down.
///
/// Every field maps to an upper-case environment variable of the same name
/// (`TRADE_USD`, `SYMBOL`, `MA_LONG`, ...).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BotConfig {
    /// Quote-currency notional per BUY
    pub trade_usd: f64,
    /// Pair in exchange notation, e.g. "DOGE/USDT"
    pub symbol: String,
    /// Candle interval, e.g. "5m", "1h"
    pub timeframe: String,
    /// Max candles fetched per run
    pub limit: usize,
    /// Trade log path
    pub csv_file: String,

    pub stop_loss_pct: f64,
    pub take_profit_min_pct: f64,
    pub take_profit_max_pct: f64,

    /// Seed for take-profit sampling; fresh entropy when absent
    pub seed: Option<u64>,

    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub binance_base_url: String,

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

impl Default for BotConfig {
    fn default() -> Self {
        let indicators = IndicatorConfig::default();
        let strategy = StrategyConfig::default();

        Self {
            trade_usd: strategy.trade_usd,
            symbol: "DOGE/USDT".to_string(),
            timeframe: "5m".to_string(),
            limit: 500,
            csv_file: "trades.csv".to_string(),
            stop_loss_pct: strategy.stop_loss_pct,
            take_profit_min_pct: strategy.take_profit_min_pct,
            take_profit_max_pct: strategy.take_profit_max_pct,
            seed: None,
            telegram_token: None,
            telegram_chat_id: None,
            binance_base_url: DEFAULT_BINANCE_BASE_URL.to_string(),
            ma_short: indicators.ma_short,
            ma_long: indicators.ma_long,
            bb_window: indicators.bb_window,
            bb_multiplier: indicators.bb_multiplier,
            macd_fast: indicators.macd_fast,
            macd_slow: indicators.macd_slow,
            macd_signal: indicators.macd_signal,
            rsi_period: indicators.rsi_period,
            stoch_period: indicators.stoch_period,
        }
    }
}

impl BotConfig {
    /// Load from the process environment on top of the defaults.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should count.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load_from(config::Environment::default())
    }

    /// Load from an arbitrary environment source on top of the defaults
    pub fn load_from(env: config::Environment) -> Result<Self, ConfigError> {
        let d = Self::default();

        let settings = config::Config::builder()
            .set_default("trade_usd", d.trade_usd)?
            .set_default("symbol", d.symbol)?
            .set_default("timeframe", d.timeframe)?
            .set_default("limit", d.limit as i64)?
            .set_default("csv_file", d.csv_file)?
            .set_default("stop_loss_pct", d.stop_loss_pct)?
            .set_default("take_profit_min_pct", d.take_profit_min_pct)?
            .set_default("take_profit_max_pct", d.take_profit_max_pct)?
            .set_default("binance_base_url", d.binance_base_url)?
            .set_default("ma_short", d.ma_short as i64)?
            .set_default("ma_long", d.ma_long as i64)?
            .set_default("bb_window", d.bb_window as i64)?
            .set_default("bb_multiplier", d.bb_multiplier)?
            .set_default("macd_fast", d.macd_fast as i64)?
            .set_default("macd_slow", d.macd_slow as i64)?
            .set_default("macd_signal", d.macd_signal as i64)?
            .set_default("rsi_period", d.rsi_period as i64)?
            .set_default("stoch_period", d.stoch_period as i64)?
            .add_source(env.try_parsing(true))
            .build()?;

        let config: BotConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges that would make a run meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        self.strategy_config().validate()?;
        if self.take_profit_min_pct < 0.0 {
            return invalid(format!(
                "take_profit_min_pct must be >= 0, got {}",
                self.take_profit_min_pct
            ));
        }
        if self.limit == 0 {
            return invalid("limit must be at least 1".to_string());
        }

        let windows = [
            ("ma_short", self.ma_short),
            ("ma_long", self.ma_long),
            ("bb_window", self.bb_window),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("rsi_period", self.rsi_period),
            ("stoch_period", self.stoch_period),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, w)| *w == 0) {
            return invalid(format!("{} must be at least 1", name));
        }
        if self.macd_fast >= self.macd_slow {
            return invalid(format!(
                "macd_fast ({}) must be shorter than macd_slow ({})",
                self.macd_fast, self.macd_slow
            ));
        }
        if !(self.bb_multiplier > 0.0) {
            return invalid(format!("bb_multiplier must be > 0, got {}", self.bb_multiplier));
        }

        parse_timeframe_minutes(&self.timeframe)?;
        Ok(())
    }

    pub fn indicator_config(&self) -> IndicatorConfig {
        IndicatorConfig {
            ma_short: self.ma_short,
            ma_long: self.ma_long,
            bb_window: self.bb_window,
            bb_multiplier: self.bb_multiplier,
            macd_fast: self.macd_fast,
            macd_slow: self.macd_slow,
            macd_signal: self.macd_signal,
            rsi_period: self.rsi_period,
            stoch_period: self.stoch_period,
        }
    }

    pub fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig {
            trade_usd: self.trade_usd,
            stop_loss_pct: self.stop_loss_pct,
            take_profit_min_pct: self.take_profit_min_pct,
            take_profit_max_pct: self.take_profit_max_pct,
        }
    }

    /// Minutes per candle for the configured timeframe
    pub fn timeframe_minutes(&self) -> Result<i64, ConfigError> {
        parse_timeframe_minutes(&self.timeframe)
    }

    /// Telegram credentials, only when both are present
    pub fn telegram(&self) -> Option<(&str, &str)> {
        match (&self.telegram_token, &self.telegram_chat_id) {
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => {
                Some((token.as_str(), chat.as_str()))
            }
            _ => None,
        }
    }
}

/// Parse exchange interval notation ("1m", "5m", "4h", "1d", "1w")
///
/// # Example
/// ```
/// use dipbot::config::parse_timeframe_minutes;
///
/// assert_eq!(parse_timeframe_minutes("5m").unwrap(), 5);
/// assert_eq!(parse_timeframe_minutes("4h").unwrap(), 240);
/// ```
pub fn parse_timeframe_minutes(timeframe: &str) -> Result<i64, ConfigError> {
    let bad = || ConfigError::Invalid(format!("unsupported timeframe '{}'", timeframe));

    let unit_at = timeframe.len().checked_sub(1).ok_or_else(bad)?;
    if !timeframe.is_char_boundary(unit_at) {
        return Err(bad());
    }
    let (count, unit) = timeframe.split_at(unit_at);
    let count: i64 = count.parse().map_err(|_| bad())?;
    if count <= 0 {
        return Err(bad());
    }

    let per_unit = match unit {
        "m" => 1,
        "h" => 60,
        "d" => 60 * 24,
        "w" => 60 * 24 * 7,
        _ => return Err(bad()),
    };

    Ok(count * per_unit)
}
