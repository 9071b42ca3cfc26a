use common::config::RiskLimits;
use proptest::prelude::*;
use risk::RiskManager;

fn manager(risk_pct: f64) -> RiskManager {
    RiskManager::new(RiskLimits {
        risk_per_trade_pct: risk_pct,
        daily_loss_limit_pct: 2.0,
        max_trades_per_day: 5,
        max_concurrent_positions_per_symbol: 1,
    })
}

proptest! {
    /// For all valid positive inputs the sized volume lies in
    /// [volume_min, volume_max] and is a multiple of volume_step
    /// (within floating-point tolerance), or sits exactly at a clamp
    /// boundary.
    #[test]
    fn position_size_is_bounded_and_stepped(
        balance in 1.0f64..1_000_000.0,
        risk_pct in 0.1f64..5.0,
        sl_distance in 0.0001f64..0.1,
        point in prop::sample::select(vec![0.00001, 0.0001, 0.001, 0.01]),
        tick_value in 0.1f64..100.0,
    ) {
        let volume_step = 0.01;
        let volume_min = 0.01;
        let volume_max = 100.0;

        let rm = manager(risk_pct);
        let lots = rm.position_size(
            balance, sl_distance, point, tick_value, volume_step, volume_min, volume_max,
        );

        prop_assert!(lots >= volume_min - 1e-12);
        prop_assert!(lots <= volume_max + 1e-12);

        let steps = lots / volume_step;
        let on_grid = (steps - steps.round()).abs() < 1e-6;
        let at_bound = (lots - volume_min).abs() < 1e-12 || (lots - volume_max).abs() < 1e-12;
        prop_assert!(on_grid || at_bound, "lots {} off the step grid", lots);
    }

    /// Non-positive tick economics always size to zero, never panic.
    #[test]
    fn degenerate_inputs_size_to_zero(
        balance in 0.0f64..1_000_000.0,
        bad in -10.0f64..=0.0,
    ) {
        let rm = manager(1.0);
        prop_assert_eq!(rm.position_size(balance, bad, 0.0001, 10.0, 0.01, 0.01, 100.0), 0.0);
        prop_assert_eq!(rm.position_size(balance, 0.001, bad, 10.0, 0.01, 0.01, 100.0), 0.0);
        prop_assert_eq!(rm.position_size(balance, 0.001, 0.0001, bad, 0.01, 0.01, 100.0), 0.0);
    }
}
