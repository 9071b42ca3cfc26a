pub mod manager;

pub use manager::{RiskManager, RiskState, TradeVeto};
