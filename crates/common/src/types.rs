use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::{FillMode, ReturnCode};

/// One OHLC price bar as delivered by the data feed.
///
/// Bars are immutable once produced. `time` is the bar open time in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// +1 for buys, -1 for sells. Used when converting price distance
    /// into signed P&L.
    pub fn sign(self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Output of the signal generator, recomputed on every new bar.
///
/// `direction` is `None` when no breakout fired, when ATR is below the
/// volatility floor, or when the window is too short to compute the
/// indicators at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub direction: Option<OrderSide>,
    pub atr: f64,
    pub breakout_high: f64,
    pub breakout_low: f64,
    pub ema_slope: f64,
}

impl Signal {
    /// The null signal emitted on insufficient history.
    pub fn none() -> Self {
        Self {
            direction: None,
            atr: 0.0,
            breakout_high: 0.0,
            breakout_low: 0.0,
            ema_slope: 0.0,
        }
    }
}

/// A fully sized trade the decision loop wants executed.
///
/// The execution pipeline turns this into one or more `OrderRequest`s.
#[derive(Debug, Clone)]
pub struct TradeIntent {
    pub symbol: String,
    pub side: OrderSide,
    pub volume: f64,
    pub price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

/// One wire-level market order submission. Built fresh per attempt.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub volume: f64,
    pub price: f64,
    /// Maximum accepted price deviation, in instrument points.
    pub deviation: u32,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub fill_mode: FillMode,
    /// Identifying tag so our orders can be told apart on the terminal.
    pub magic: u64,
    pub comment: String,
}

/// Terminal result of one execution pipeline run.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub retcode: ReturnCode,
    pub order_id: Option<u64>,
    pub reason: String,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        self.retcode.category() == crate::gateway::RetCategory::Success
    }
}

/// One row of the live trade journal, written at submission success.
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub direction: OrderSide,
    pub volume: f64,
    pub price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub ticket: Option<u64>,
    pub comment: String,
}

/// One closed trade in the replay engine's ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub side: OrderSide,
    pub entry: f64,
    pub exit: f64,
    pub lots: f64,
    pub pnl: f64,
    /// Realized P&L divided by the risk amount frozen at entry.
    pub r_multiple: f64,
}
