use common::config::BacktestConfig;

/// Round-trip trading cost model for the replay engine.
///
/// Commission scales with volume; spread and slippage are charged once
/// per round trip as a point-cost converted through the tick value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradingCosts {
    pub commission_per_lot: f64,
    pub spread_points: f64,
    pub slippage_points: f64,
}

impl TradingCosts {
    pub fn from_config(cfg: &BacktestConfig) -> Self {
        Self {
            commission_per_lot: cfg.commission_per_lot,
            spread_points: cfg.spread_points,
            slippage_points: cfg.slippage_points,
        }
    }

    pub fn spread_cost(&self, tick_value: f64) -> f64 {
        self.spread_points * tick_value
    }

    pub fn slippage_cost(&self, tick_value: f64) -> f64 {
        self.slippage_points * tick_value
    }

    /// Total cost deducted when a position closes.
    pub fn round_trip(&self, lots: f64, tick_value: f64) -> f64 {
        self.commission_per_lot * lots + self.spread_cost(tick_value) + self.slippage_cost(tick_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_combines_all_three_components() {
        let costs = TradingCosts {
            commission_per_lot: 7.0,
            spread_points: 2.0,
            slippage_points: 1.0,
        };
        // 0.5 lots at $10 tick value: 3.5 commission + 20 spread + 10 slippage.
        assert!((costs.round_trip(0.5, 10.0) - 33.5).abs() < 1e-9);
    }

    #[test]
    fn zero_costs_are_free() {
        let costs = TradingCosts {
            commission_per_lot: 0.0,
            spread_points: 0.0,
            slippage_points: 0.0,
        };
        assert_eq!(costs.round_trip(1.0, 10.0), 0.0);
    }
}
