use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use common::{Journal, JournalEntry, Result};

/// Append-only CSV trade journal.
///
/// One row per successful submission. The file and its parent directory
/// are created on first write; the header is written only when the file
/// is new. Journaling must never take down the trading loop, so write
/// failures are logged and swallowed.
pub struct CsvJournal {
    path: PathBuf,
}

impl CsvJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write(&self, entry: &JournalEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let is_new = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush()?;
        debug!(path = %self.path.display(), symbol = %entry.symbol, "Journal row written");
        Ok(())
    }
}

#[async_trait]
impl Journal for CsvJournal {
    async fn append(&self, entry: &JournalEntry) {
        if let Err(e) = self.write(entry) {
            warn!(
                path = %self.path.display(),
                error = %e,
                "Trade journal write failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::OrderSide;

    fn entry(symbol: &str) -> JournalEntry {
        JournalEntry {
            time: Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap(),
            symbol: symbol.to_string(),
            direction: OrderSide::Buy,
            volume: 0.1,
            price: 1.2345,
            stop_loss: Some(1.2300),
            take_profit: Some(1.2400),
            ticket: Some(42),
            comment: "Order completed".to_string(),
        }
    }

    #[tokio::test]
    async fn creates_file_with_header_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades").join("journal.csv");
        let journal = CsvJournal::new(&path);

        journal.append(&entry("EURUSD")).await;
        journal.append(&entry("GBPUSD")).await;

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3); // header + 2 rows
        assert!(lines[0].starts_with("time,symbol,direction"));
        assert!(lines[1].contains("EURUSD"));
        assert!(lines[2].contains("GBPUSD"));
        // Header written once only.
        assert!(!lines[2].contains("symbol,direction"));
    }

    #[tokio::test]
    async fn unwritable_path_does_not_panic() {
        let journal = CsvJournal::new("/proc/does-not-exist/journal.csv");
        journal.append(&entry("EURUSD")).await;
    }
}
