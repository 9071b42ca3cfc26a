use async_trait::async_trait;

use crate::{Bar, JournalEntry, Result};

/// Supplies bar history. The live path asks for a bounded most-recent
/// window; the backtest path loads a stored range through
/// `backtest::load_bars_csv` instead.
#[async_trait]
pub trait BarFeed: Send + Sync {
    /// The most recent `count` closed bars for `symbol`, oldest first.
    async fn recent_bars(&self, symbol: &str, count: usize) -> Result<Vec<Bar>>;
}

/// Append-only trade record sink.
///
/// Fire-and-forget: implementations log and swallow their own failures.
/// A broken journal must never abort the execution pipeline.
#[async_trait]
pub trait Journal: Send + Sync {
    async fn append(&self, entry: &JournalEntry);
}

/// Push-notification channel for completed live trades.
///
/// Same containment rule as `Journal`: failures stay inside the
/// implementation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str);
}
