use super::ActionSink;
use crate::models::TradeAction;
use anyhow::Context;
use chrono::SecondsFormat;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

const HEADER: [&str; 5] = ["timestamp", "kind", "price", "amount", "reason"];

/// Append-only CSV trade log, one record per action.
///
/// Columns: `timestamp,kind,price,amount,reason`. The header is written only
/// when the file starts out empty, so re-runs keep appending to one log.
pub struct CsvTradeLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvTradeLog {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open trade log {}", path.display()))?;

        let is_empty = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_empty {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }

        tracing::debug!("Trade log opened at {}", path.display());

        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActionSink for CsvTradeLog {
    fn emit(&mut self, action: &TradeAction) -> anyhow::Result<()> {
        self.writer
            .write_record([
                action.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                action.kind.to_string(),
                action.price.to_string(),
                action.amount.to_string(),
                action.reason.to_string(),
            ])
            .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        self.writer.flush()?;
        Ok(())
    }
}
