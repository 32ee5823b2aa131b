// Core modules
pub mod api;
pub mod backtest;
pub mod config;
pub mod indicators;
pub mod models;
pub mod notify;
pub mod sink;
pub mod strategy;

// Re-export commonly used types
pub use api::{BinanceClient, ExchangeError};
pub use config::{BotConfig, ConfigError};
pub use models::*;
pub use sink::ActionSink;
pub use strategy::{Evaluator, PositionState};

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
