use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{OrderRequest, Result};

/// Fill semantics a broker can accept for a market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// Fill-or-kill: the whole volume or nothing.
    Fok,
    /// Immediate-or-cancel: fill what is available, cancel the rest.
    Ioc,
    /// Partial fill with the remainder left as a resting order.
    Return,
}

impl FillMode {
    /// Bit of this mode inside `SymbolInfo::fill_modes_mask`.
    pub fn bit(self) -> u32 {
        match self {
            FillMode::Fok => 1,
            FillMode::Ioc => 2,
            FillMode::Return => 4,
        }
    }

    /// Candidate order used when probing a symbol's advertised modes.
    pub const CANDIDATES: [FillMode; 3] = [FillMode::Fok, FillMode::Ioc, FillMode::Return];
}

/// Static per-instrument economics and trading constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInfo {
    pub name: String,
    /// False when the symbol is hidden or trading is disabled.
    pub tradable: bool,
    /// Smallest quoted price increment.
    pub point: f64,
    /// Monetary worth of one point move per 1.0 volume.
    pub tick_value: f64,
    /// Broker-imposed minimum stop distance, in points.
    pub stops_level: f64,
    pub volume_min: f64,
    pub volume_max: f64,
    pub volume_step: f64,
    /// Bitmask of acceptable fill modes; 0 means "use `default_fill_mode`".
    pub fill_modes_mask: u32,
    pub default_fill_mode: FillMode,
}

/// Latest quote for an instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub bid: f64,
    pub ask: f64,
}

impl Tick {
    /// Spread in instrument points.
    pub fn spread_points(&self, point: f64) -> f64 {
        (self.ask - self.bid) / point
    }
}

/// Wire-level return codes of the broker terminal, as a closed enum.
///
/// The execution pipeline never branches on individual codes; it maps
/// each to a `RetCategory` once and switches on the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    Done,
    Placed,
    DonePartial,
    Requote,
    PriceChanged,
    PriceOff,
    TradeContextBusy,
    InvalidStops,
    InvalidFill,
    InvalidVolume,
    InvalidPrice,
    NoMoney,
    MarketClosed,
    TradeDisabled,
    Rejected,
    Canceled,
    Timeout,
    Error,
}

/// Outcome category the state machine actually switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetCategory {
    Success,
    /// Retry the identical request after a fixed backoff.
    Transient,
    /// Advance to the next candidate fill mode.
    FillModeRejected,
    /// Resubmit without stops, then attach them via a modify call.
    StopsRejected,
    Terminal,
}

impl ReturnCode {
    pub fn category(self) -> RetCategory {
        match self {
            ReturnCode::Done | ReturnCode::Placed | ReturnCode::DonePartial => {
                RetCategory::Success
            }
            ReturnCode::Requote
            | ReturnCode::PriceChanged
            | ReturnCode::PriceOff
            | ReturnCode::TradeContextBusy => RetCategory::Transient,
            ReturnCode::InvalidFill => RetCategory::FillModeRejected,
            ReturnCode::InvalidStops => RetCategory::StopsRejected,
            _ => RetCategory::Terminal,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ReturnCode::Done => "Order completed",
            ReturnCode::Placed => "Order placed",
            ReturnCode::DonePartial => "Order partially completed",
            ReturnCode::Requote => "Requote",
            ReturnCode::PriceChanged => "Price changed",
            ReturnCode::PriceOff => "Off quotes",
            ReturnCode::TradeContextBusy => "Trade context busy",
            ReturnCode::InvalidStops => "Invalid stops",
            ReturnCode::InvalidFill => "Invalid filling mode",
            ReturnCode::InvalidVolume => "Invalid volume",
            ReturnCode::InvalidPrice => "Invalid price",
            ReturnCode::NoMoney => "Not enough money",
            ReturnCode::MarketClosed => "Market closed",
            ReturnCode::TradeDisabled => "Trade disabled",
            ReturnCode::Rejected => "Rejected",
            ReturnCode::Canceled => "Canceled",
            ReturnCode::Timeout => "Timeout",
            ReturnCode::Error => "Common error",
        }
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Result of one submission or modify request.
#[derive(Debug, Clone)]
pub struct OrderResult {
    pub retcode: ReturnCode,
    pub order_id: Option<u64>,
    pub comment: String,
}

/// Abstraction over the broker terminal session.
///
/// `PaperGateway` in `crates/paper` implements this for simulation; a
/// real terminal bridge plugs in behind the same trait. Only the
/// execution pipeline in `crates/exec` submits orders through it.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Per-instrument constraints and tick economics.
    async fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo>;

    /// Latest bid/ask quote.
    async fn tick(&self, symbol: &str) -> Result<Tick>;

    /// Number of open positions held on `symbol`. The decision loop
    /// uses this to enforce the per-symbol concurrency cap.
    async fn open_position_count(&self, symbol: &str) -> Result<u32>;

    /// Submit a market order. Transport failures are `Err`; broker
    /// rejections come back as an `OrderResult` with a non-success code.
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResult>;

    /// Attach or replace stop levels on an open position.
    async fn modify_stop_levels(
        &self,
        position_id: u64,
        symbol: &str,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<OrderResult>;
}
