pub mod costs;
pub mod data;
pub mod engine;
pub mod metrics;

pub use costs::TradingCosts;
pub use data::load_bars_csv;
pub use engine::{run_backtest, BacktestParams, BacktestReport, EquityPoint};
pub use metrics::{compute_metrics, BacktestMetrics};
