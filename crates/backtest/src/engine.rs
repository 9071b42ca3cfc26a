use chrono::{DateTime, Utc};
use tracing::info;

use common::config::{BacktestConfig, RiskLimits, StrategyConfig};
use common::{Bar, OrderSide, TradeRecord};
use risk::RiskManager;
use strategy::compute_signal;

use crate::costs::TradingCosts;

/// Everything the replay engine needs besides the bar history. The
/// strategy and risk sections are the same structs the live loop runs
/// on, so a parameter set validated here carries over unchanged.
#[derive(Debug, Clone)]
pub struct BacktestParams {
    pub strategy: StrategyConfig,
    pub risk: RiskLimits,
    pub backtest: BacktestConfig,
}

/// Account balance after processing one simulated bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub time: DateTime<Utc>,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    /// One point per simulated bar from the warm-up length onward.
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
    pub initial_balance: f64,
    pub final_balance: f64,
}

/// At most one of these exists per run.
struct OpenPosition {
    entry_time: DateTime<Utc>,
    side: OrderSide,
    entry: f64,
    stop_loss: f64,
    take_profit: f64,
    lots: f64,
    /// Monetary risk frozen at entry; denominator of the R-multiple.
    risk_amount: f64,
}

impl OpenPosition {
    /// Exit price touched by this bar, if any. When both levels fall
    /// inside the bar's range the stop-loss wins: the intrabar path is
    /// unknown, so the adverse outcome is assumed.
    fn exit_price(&self, bar: &Bar) -> Option<f64> {
        match self.side {
            OrderSide::Buy => {
                if bar.low <= self.stop_loss {
                    Some(self.stop_loss)
                } else if bar.high >= self.take_profit {
                    Some(self.take_profit)
                } else {
                    None
                }
            }
            OrderSide::Sell => {
                if bar.high >= self.stop_loss {
                    Some(self.stop_loss)
                } else if bar.low <= self.take_profit {
                    Some(self.take_profit)
                } else {
                    None
                }
            }
        }
    }
}

/// Replay the strategy bar-by-bar over a stored history.
///
/// Single pass, no I/O, fully deterministic: two runs over identical
/// inputs produce identical reports. Fills are simplified — entries at
/// the signal bar's close, exits exactly at the stop or target level.
/// Volume goes through the same rounding and clamping as the live
/// sizer, so simulated lots are always broker-tradable.
pub fn run_backtest(bars: &[Bar], params: &BacktestParams) -> BacktestReport {
    let cfg = &params.backtest;
    let costs = TradingCosts::from_config(cfg);
    let sizer = RiskManager::new(params.risk);
    let warmup = params.strategy.warmup_bars();

    let mut balance = cfg.initial_balance;
    let mut equity_curve = Vec::new();
    let mut trades = Vec::new();
    let mut position: Option<OpenPosition> = None;

    for i in warmup..bars.len() {
        let bar = &bars[i];

        // Exits are evaluated before any new entry.
        if let Some(pos) = position.take() {
            if let Some(exit) = pos.exit_price(bar) {
                let gross =
                    (exit - pos.entry) * pos.side.sign() / cfg.point * cfg.tick_value * pos.lots;
                let pnl = gross - costs.round_trip(pos.lots, cfg.tick_value);
                balance += pnl;
                let r_multiple = if pos.risk_amount > 0.0 {
                    pnl / pos.risk_amount
                } else {
                    0.0
                };
                trades.push(TradeRecord {
                    entry_time: pos.entry_time,
                    exit_time: bar.time,
                    side: pos.side,
                    entry: pos.entry,
                    exit,
                    lots: pos.lots,
                    pnl,
                    r_multiple,
                });
            } else {
                position = Some(pos);
            }
        }

        if position.is_none() {
            // Only bars up to and including the current one are visible.
            let signal = compute_signal(&bars[..=i], &params.strategy);
            if let Some(side) = signal.direction {
                let sl_distance = params.strategy.sl_atr_mult * signal.atr;
                if sl_distance > 0.0 {
                    let lots = sizer.position_size(
                        balance,
                        sl_distance,
                        cfg.point,
                        cfg.tick_value,
                        cfg.volume_step,
                        cfg.volume_min,
                        cfg.volume_max,
                    );
                    if lots > 0.0 {
                        let entry = bar.close;
                        let stop_loss = entry - side.sign() * sl_distance;
                        let take_profit = entry + side.sign() * params.strategy.rr_ratio * sl_distance;
                        position = Some(OpenPosition {
                            entry_time: bar.time,
                            side,
                            entry,
                            stop_loss,
                            take_profit,
                            lots,
                            risk_amount: balance * (params.risk.risk_per_trade_pct / 100.0),
                        });
                    }
                }
            }
        }

        equity_curve.push(EquityPoint {
            time: bar.time,
            balance,
        });
    }

    info!(
        bars = bars.len(),
        trades = trades.len(),
        final_balance = balance,
        "Backtest complete"
    );

    BacktestReport {
        equity_curve,
        trades,
        initial_balance: cfg.initial_balance,
        final_balance: balance,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
