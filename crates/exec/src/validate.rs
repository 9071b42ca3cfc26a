use std::path::Path;

use thiserror::Error;

use common::gateway::{SymbolInfo, Tick};

/// Safety multiplier applied on top of the broker's minimum stop
/// distance, so freshly placed stops survive small price drift between
/// validation and submission.
pub const STOPS_LEVEL_SAFETY: f64 = 1.2;

/// Pre-submission rejection reasons. Rejection is an expected, frequent
/// outcome here, not an exception; no submission attempt is made and
/// nothing is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("symbol not tradable")]
    NotTradable,

    #[error("spread {spread_points:.1} points exceeds ceiling {max_points:.1}")]
    SpreadTooWide { spread_points: f64, max_points: f64 },

    #[error("outside configured trading sessions")]
    OutsideSession,

    #[error("stop level within {min_distance} of price")]
    StopsTooClose { min_distance: f64 },
}

/// A symbol is tradable when it is visible on the terminal and trading
/// is not disabled for it.
pub fn check_tradable(info: &SymbolInfo) -> Result<(), ValidationError> {
    if info.tradable {
        Ok(())
    } else {
        Err(ValidationError::NotTradable)
    }
}

pub fn check_spread(
    tick: &Tick,
    point: f64,
    max_spread_points: f64,
) -> Result<(), ValidationError> {
    let spread_points = tick.spread_points(point);
    if spread_points > max_spread_points {
        return Err(ValidationError::SpreadTooWide {
            spread_points,
            max_points: max_spread_points,
        });
    }
    Ok(())
}

/// Both stop levels, when present, must sit at least
/// `stops_level × point × STOPS_LEVEL_SAFETY` away from the price.
pub fn check_stop_distance(
    info: &SymbolInfo,
    price: f64,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
) -> Result<(), ValidationError> {
    let min_distance = info.stops_level * info.point * STOPS_LEVEL_SAFETY;
    for level in [stop_loss, take_profit].into_iter().flatten() {
        if (price - level).abs() < min_distance {
            return Err(ValidationError::StopsTooClose { min_distance });
        }
    }
    Ok(())
}

/// Manual kill switch: while this file exists the live loop submits
/// nothing new. Existing positions are untouched.
pub fn kill_switch_active(path: &str) -> bool {
    Path::new(path).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::gateway::FillMode;

    fn symbol(tradable: bool, stops_level: f64) -> SymbolInfo {
        SymbolInfo {
            name: "EURUSD".to_string(),
            tradable,
            point: 0.0001,
            tick_value: 10.0,
            stops_level,
            volume_min: 0.01,
            volume_max: 100.0,
            volume_step: 0.01,
            fill_modes_mask: 0,
            default_fill_mode: FillMode::Fok,
        }
    }

    #[test]
    fn untradable_symbol_rejected() {
        assert_eq!(
            check_tradable(&symbol(false, 10.0)),
            Err(ValidationError::NotTradable)
        );
        assert!(check_tradable(&symbol(true, 10.0)).is_ok());
    }

    #[test]
    fn wide_spread_rejected() {
        let tick = Tick { bid: 1.1000, ask: 1.1050 }; // 50 points
        assert!(matches!(
            check_spread(&tick, 0.0001, 30.0),
            Err(ValidationError::SpreadTooWide { .. })
        ));
        let tight = Tick { bid: 1.1000, ask: 1.1002 };
        assert!(check_spread(&tight, 0.0001, 30.0).is_ok());
    }

    #[test]
    fn stops_inside_safety_margin_rejected() {
        let info = symbol(true, 100.0); // min distance = 100 * 0.0001 * 1.2 = 0.012
        let price = 1.2000;
        assert!(matches!(
            check_stop_distance(&info, price, Some(1.1950), Some(1.2100)),
            Err(ValidationError::StopsTooClose { .. })
        ));
        assert!(check_stop_distance(&info, price, Some(1.1800), Some(1.2200)).is_ok());
    }

    #[test]
    fn absent_stops_always_pass() {
        let info = symbol(true, 100.0);
        assert!(check_stop_distance(&info, 1.2, None, None).is_ok());
    }
}
