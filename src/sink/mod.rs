// Trade action sinks: where evaluator output goes (log, CSV, notifier channel)
pub mod csv_log;

pub use csv_log::CsvTradeLog;

use crate::models::TradeAction;
use tokio::sync::mpsc::UnboundedSender;

/// Receives every action the evaluator emits.
///
/// The evaluator ignores the outcome beyond logging it: by the time `emit`
/// is called the position transition is already committed.
pub trait ActionSink {
    fn emit(&mut self, action: &TradeAction) -> anyhow::Result<()>;
}

impl ActionSink for Vec<TradeAction> {
    fn emit(&mut self, action: &TradeAction) -> anyhow::Result<()> {
        self.push(action.clone());
        Ok(())
    }
}

/// Writes one human-readable line per action through `tracing`
#[derive(Debug, Clone)]
pub struct LogSink {
    symbol: String,
}

impl LogSink {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

impl ActionSink for LogSink {
    fn emit(&mut self, action: &TradeAction) -> anyhow::Result<()> {
        tracing::info!("{}", action.describe(&self.symbol));
        Ok(())
    }
}

/// Hands actions to an async consumer (the notifier task) without blocking
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<TradeAction>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<TradeAction>) -> Self {
        Self { tx }
    }
}

impl ActionSink for ChannelSink {
    fn emit(&mut self, action: &TradeAction) -> anyhow::Result<()> {
        self.tx
            .send(action.clone())
            .map_err(|_| anyhow::anyhow!("notification channel closed"))
    }
}

/// Emits to every inner sink in order.
///
/// All sinks are attempted even when one fails; the first error is returned
/// afterwards.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn ActionSink + Send>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ActionSink + Send + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ActionSink for FanoutSink {
    fn emit(&mut self, action: &TradeAction) -> anyhow::Result<()> {
        let mut first_error = None;

        for sink in &mut self.sinks {
            if let Err(e) = sink.emit(action) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
