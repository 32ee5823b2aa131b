pub mod metrics;
pub mod runner;
pub mod synthetic;

pub use metrics::{BacktestSummary, RoundTrip};
pub use runner::{BacktestReport, BacktestRunner};
pub use synthetic::{MarketScenario, SyntheticDataGenerator};
