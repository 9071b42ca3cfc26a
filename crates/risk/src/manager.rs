use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use common::config::RiskLimits;

/// Rolling daily counters. In-memory only: a restart implicitly resets
/// them, which `reset_if_new_day` absorbs on the first call.
///
/// Owned exclusively by one `RiskManager`; callers running several
/// decision loops must wrap each manager in its own lock or partition
/// by instrument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskState {
    /// Current UTC day as "YYYY-MM-DD". Empty until the first check.
    pub day: String,
    pub trades_today: u32,
    pub realized_pnl_today: f64,
}

/// Machine-readable reason a trade was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeVeto {
    MaxTradesPerDay,
    DailyLossLimit,
}

impl std::fmt::Display for TradeVeto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeVeto::MaxTradesPerDay => write!(f, "max_trades_per_day"),
            TradeVeto::DailyLossLimit => write!(f, "daily_loss_limit"),
        }
    }
}

/// The gatekeeper between signal generation and order submission.
///
/// Two responsibilities: bounded position sizing, and allow/deny gating
/// against the rolling daily counters.
#[derive(Debug, Clone)]
pub struct RiskManager {
    limits: RiskLimits,
    state: RiskState,
}

impl RiskManager {
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits,
            state: RiskState::default(),
        }
    }

    pub fn state(&self) -> &RiskState {
        &self.state
    }

    /// Zero the counters when the UTC calendar day has advanced since
    /// the state was last touched. Comparison is by date string, so a
    /// process that slept through midnight still resets on the first
    /// call after it. Idempotent within a day.
    pub fn reset_if_new_day(&mut self, now: DateTime<Utc>) {
        let day = now.format("%Y-%m-%d").to_string();
        if day != self.state.day {
            info!(day = %day, "Risk counters reset for new day");
            self.state.day = day;
            self.state.trades_today = 0;
            self.state.realized_pnl_today = 0.0;
        }
    }

    /// Record a completed trade decision and its realized P&L.
    pub fn record_trade(&mut self, pnl: f64) {
        self.state.trades_today += 1;
        self.state.realized_pnl_today += pnl;
    }

    /// Allow/deny decision for opening a new trade right now.
    ///
    /// The daily loss threshold is recomputed against the current
    /// balance on every check, not frozen at day start.
    pub fn can_trade(&mut self, balance: f64, now: DateTime<Utc>) -> Result<(), TradeVeto> {
        self.reset_if_new_day(now);

        if self.state.trades_today >= self.limits.max_trades_per_day {
            return Err(TradeVeto::MaxTradesPerDay);
        }
        let daily_loss_limit = -balance * (self.limits.daily_loss_limit_pct / 100.0);
        if self.state.realized_pnl_today <= daily_loss_limit {
            return Err(TradeVeto::DailyLossLimit);
        }
        Ok(())
    }

    /// Volume whose monetary loss at the stop equals the per-trade risk
    /// amount, rounded to the broker's volume step and clamped into
    /// [volume_min, volume_max].
    ///
    /// Rounding happens before clamping: rounding preserves tradable
    /// granularity, clamping then guarantees the exchange-imposed
    /// bounds hold even if the rounded value over/undershoots.
    ///
    /// Returns 0.0 on non-positive stop distance or tick economics;
    /// callers must treat zero as "do not trade".
    #[allow(clippy::too_many_arguments)]
    pub fn position_size(
        &self,
        balance: f64,
        sl_distance: f64,
        point: f64,
        tick_value: f64,
        volume_step: f64,
        volume_min: f64,
        volume_max: f64,
    ) -> f64 {
        if sl_distance <= 0.0 || point <= 0.0 || tick_value <= 0.0 {
            return 0.0;
        }
        let risk_amount = balance * (self.limits.risk_per_trade_pct / 100.0);
        let raw = risk_amount / (sl_distance / point * tick_value);
        let rounded = (raw / volume_step).round() * volume_step;
        rounded.clamp(volume_min, volume_max)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn limits() -> RiskLimits {
        RiskLimits {
            risk_per_trade_pct: 1.0,
            daily_loss_limit_pct: 2.0,
            max_trades_per_day: 3,
            max_concurrent_positions_per_symbol: 1,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn position_size_reference_case() {
        let rm = RiskManager::new(limits());
        // 10k balance, 1% risk, 10-point stop at $10/point/lot → 1.0 lot,
        // clamped to volume_max.
        let lots = rm.position_size(10_000.0, 0.0010, 0.0001, 10.0, 0.01, 0.01, 1.0);
        assert!(lots > 0.0);
        assert!(lots <= 1.0);
    }

    #[test]
    fn position_size_zero_on_bad_inputs() {
        let rm = RiskManager::new(limits());
        assert_eq!(rm.position_size(10_000.0, 0.0, 0.0001, 10.0, 0.01, 0.01, 1.0), 0.0);
        assert_eq!(rm.position_size(10_000.0, 0.001, -1.0, 10.0, 0.01, 0.01, 1.0), 0.0);
        assert_eq!(rm.position_size(10_000.0, 0.001, 0.0001, 0.0, 0.01, 0.01, 1.0), 0.0);
    }

    #[test]
    fn position_size_clamps_to_min() {
        let rm = RiskManager::new(limits());
        // Tiny balance → raw volume rounds to zero → clamped up to min.
        let lots = rm.position_size(10.0, 0.0100, 0.0001, 10.0, 0.01, 0.01, 1.0);
        assert!((lots - 0.01).abs() < 1e-12);
    }

    #[test]
    fn trade_count_gate() {
        let mut rm = RiskManager::new(limits());
        let now = at(1, 10);
        for _ in 0..3 {
            assert!(rm.can_trade(10_000.0, now).is_ok());
            rm.record_trade(0.0);
        }
        assert_eq!(rm.can_trade(10_000.0, now), Err(TradeVeto::MaxTradesPerDay));
    }

    #[test]
    fn daily_loss_gate_uses_current_balance() {
        let mut rm = RiskManager::new(limits());
        let now = at(1, 10);
        rm.reset_if_new_day(now);
        rm.record_trade(-300.0);
        // 2% of 10k = 200 → blocked.
        assert_eq!(rm.can_trade(10_000.0, now), Err(TradeVeto::DailyLossLimit));
        // 2% of 20k = 400 → the same loss passes against a larger balance.
        assert!(rm.can_trade(20_000.0, now).is_ok());
    }

    #[test]
    fn counters_reset_on_day_change() {
        let mut rm = RiskManager::new(limits());
        let day1 = at(1, 23);
        rm.reset_if_new_day(day1);
        rm.record_trade(-500.0);
        rm.record_trade(-500.0);
        assert!(rm.can_trade(10_000.0, day1).is_err());

        // First call after midnight clears the counters.
        let day2 = at(2, 0);
        assert!(rm.can_trade(10_000.0, day2).is_ok());
        assert_eq!(rm.state().trades_today, 0);
        assert_eq!(rm.state().realized_pnl_today, 0.0);
    }

    #[test]
    fn same_day_reset_is_idempotent() {
        let mut rm = RiskManager::new(limits());
        rm.reset_if_new_day(at(1, 9));
        rm.record_trade(-50.0);
        let before = rm.state().clone();
        rm.reset_if_new_day(at(1, 18));
        assert_eq!(rm.state(), &before);
    }
}
