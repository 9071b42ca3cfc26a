use common::config::StrategyConfig;
use common::{Bar, OrderSide, Signal};

use crate::indicators::{atr_series, ema_series};

/// ATR-filtered breakout signal over a window of bars, oldest first.
///
/// The breakout band is the high/low extreme of the `breakout_n` bars
/// immediately preceding the current bar; the current bar is excluded
/// from band computation. Pure function: no side effects, no state.
pub fn compute_signal(bars: &[Bar], params: &StrategyConfig) -> Signal {
    if bars.len() < params.warmup_bars() {
        return Signal::none();
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema = ema_series(&closes, params.ema_period);
    let ema_slope = ema[ema.len() - 1] - ema[ema.len() - 2];

    let prior = &bars[bars.len() - 1 - params.breakout_n..bars.len() - 1];
    let breakout_high = prior.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let breakout_low = prior.iter().map(|b| b.low).fold(f64::MAX, f64::min);

    let atr = atr_series(bars, params.atr_period)
        .last()
        .copied()
        .flatten();

    // Volatility floor: no trading in dead markets.
    let atr = match atr {
        Some(v) if v >= params.atr_min => v,
        _ => {
            return Signal {
                direction: None,
                atr: atr.unwrap_or(0.0),
                breakout_high,
                breakout_low,
                ema_slope,
            }
        }
    };

    let close = bars[bars.len() - 1].close;
    let mut direction = if close > breakout_high {
        Some(OrderSide::Buy)
    } else if close < breakout_low {
        Some(OrderSide::Sell)
    } else {
        None
    };

    // The trend filter only removes signals, never adds them. A flat
    // slope cancels the trade in both directions.
    if params.use_trend_filter {
        direction = match direction {
            Some(OrderSide::Buy) if ema_slope <= 0.0 => None,
            Some(OrderSide::Sell) if ema_slope >= 0.0 => None,
            other => other,
        };
    }

    Signal {
        direction,
        atr,
        breakout_high,
        breakout_low,
        ema_slope,
    }
}
