use serde::Serialize;

use common::TradeRecord;

use crate::engine::EquityPoint;

/// Annualization factor: trading days per year, matching the common
/// daily-bar convention.
const TRADING_DAYS: f64 = 252.0;

/// Summary statistics over one backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BacktestMetrics {
    pub cagr: f64,
    /// Most negative peak-to-trough equity drop, as a fraction (≤ 0).
    pub max_drawdown: f64,
    /// Gross profits over gross losses; infinite with no losing trades.
    pub profit_factor: f64,
    pub sharpe: f64,
    pub win_rate: f64,
    pub avg_r_multiple: f64,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
}

impl BacktestMetrics {
    fn zero() -> Self {
        Self {
            cagr: 0.0,
            max_drawdown: 0.0,
            profit_factor: 0.0,
            sharpe: 0.0,
            win_rate: 0.0,
            avg_r_multiple: 0.0,
            trades: 0,
            wins: 0,
            losses: 0,
        }
    }
}

impl std::fmt::Display for BacktestMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "trades:        {}", self.trades)?;
        writeln!(f, "wins/losses:   {}/{}", self.wins, self.losses)?;
        writeln!(f, "win rate:      {:.1}%", self.win_rate * 100.0)?;
        writeln!(f, "profit factor: {:.2}", self.profit_factor)?;
        writeln!(f, "avg R:         {:.2}", self.avg_r_multiple)?;
        writeln!(f, "CAGR:          {:.2}%", self.cagr * 100.0)?;
        writeln!(f, "max drawdown:  {:.2}%", self.max_drawdown * 100.0)?;
        write!(f, "sharpe:        {:.2}", self.sharpe)
    }
}

/// Compute summary statistics from an equity curve and trade ledger.
///
/// Bar-to-bar equity returns drive the CAGR and Sharpe figures; the
/// ledger drives the per-trade figures. A trade counts as a win only
/// when its P&L is strictly positive and as a loss only when strictly
/// negative; exact break-evens belong to neither bucket.
pub fn compute_metrics(equity_curve: &[EquityPoint], trades: &[TradeRecord]) -> BacktestMetrics {
    if equity_curve.len() < 2 || equity_curve[0].balance <= 0.0 {
        return BacktestMetrics::zero();
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| w[1].balance / w[0].balance - 1.0)
        .collect();

    let first = equity_curve[0].balance;
    let last = equity_curve[equity_curve.len() - 1].balance;
    let cagr = (last / first).powf(TRADING_DAYS / returns.len() as f64) - 1.0;

    let mut running_max = f64::MIN;
    let mut max_drawdown: f64 = 0.0;
    for point in equity_curve {
        running_max = running_max.max(point.balance);
        max_drawdown = max_drawdown.min((point.balance - running_max) / running_max);
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let sharpe = if returns.len() > 1 {
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
            / (returns.len() - 1) as f64;
        let std = variance.sqrt();
        if std > 0.0 {
            mean / std * TRADING_DAYS.sqrt()
        } else {
            0.0
        }
    } else {
        0.0
    };

    let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
    let losses = trades.iter().filter(|t| t.pnl < 0.0).count();
    let profits: f64 = trades.iter().map(|t| t.pnl.max(0.0)).sum();
    let loss_total: f64 = trades.iter().map(|t| t.pnl.min(0.0).abs()).sum();
    let profit_factor = if loss_total > 0.0 {
        profits / loss_total
    } else {
        f64::INFINITY
    };

    let (win_rate, avg_r_multiple) = if trades.is_empty() {
        (0.0, 0.0)
    } else {
        (
            wins as f64 / trades.len() as f64,
            trades.iter().map(|t| t.r_multiple).sum::<f64>() / trades.len() as f64,
        )
    };

    BacktestMetrics {
        cagr,
        max_drawdown,
        profit_factor,
        sharpe,
        win_rate,
        avg_r_multiple,
        trades: trades.len(),
        wins,
        losses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use common::OrderSide;

    fn curve(balances: &[f64]) -> Vec<EquityPoint> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        balances
            .iter()
            .enumerate()
            .map(|(i, &balance)| EquityPoint {
                time: start + Duration::days(i as i64),
                balance,
            })
            .collect()
    }

    fn trade(pnl: f64, r_multiple: f64) -> TradeRecord {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TradeRecord {
            entry_time: t,
            exit_time: t + Duration::hours(4),
            side: OrderSide::Buy,
            entry: 1.0,
            exit: 1.0,
            lots: 0.1,
            pnl,
            r_multiple,
        }
    }

    #[test]
    fn empty_or_degenerate_inputs_yield_zeros() {
        assert_eq!(compute_metrics(&[], &[]), BacktestMetrics::zero());
        assert_eq!(compute_metrics(&curve(&[10_000.0]), &[]), BacktestMetrics::zero());
    }

    #[test]
    fn drawdown_tracks_peak_to_trough() {
        let metrics = compute_metrics(&curve(&[10_000.0, 12_000.0, 9_000.0, 11_000.0]), &[]);
        // Worst drop: 12k → 9k = -25%.
        assert!((metrics.max_drawdown - (-0.25)).abs() < 1e-9);
    }

    #[test]
    fn flat_curve_has_zero_sharpe_and_cagr() {
        let metrics = compute_metrics(&curve(&[10_000.0, 10_000.0, 10_000.0]), &[]);
        assert_eq!(metrics.sharpe, 0.0);
        assert!(metrics.cagr.abs() < 1e-12);
        assert_eq!(metrics.max_drawdown, 0.0);
    }

    #[test]
    fn trade_ledger_statistics() {
        let trades = vec![
            trade(200.0, 2.0),
            trade(-100.0, -1.0),
            trade(100.0, 1.0),
            trade(0.0, 0.0),
        ];
        let metrics = compute_metrics(&curve(&[10_000.0, 10_200.0]), &trades);

        assert_eq!(metrics.trades, 4);
        assert_eq!(metrics.wins, 2);
        // Break-even trades count as neither win nor loss.
        assert_eq!(metrics.losses, 1);
        assert!((metrics.win_rate - 0.5).abs() < 1e-9);
        assert!((metrics.profit_factor - 3.0).abs() < 1e-9);
        assert!((metrics.avg_r_multiple - 0.5).abs() < 1e-9);
    }

    #[test]
    fn no_losses_means_infinite_profit_factor() {
        let trades = vec![trade(100.0, 1.0)];
        let metrics = compute_metrics(&curve(&[10_000.0, 10_100.0]), &trades);
        assert!(metrics.profit_factor.is_infinite());
    }
}
