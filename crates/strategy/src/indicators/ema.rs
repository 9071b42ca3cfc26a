/// Exponential moving average with alpha = 2 / (period + 1).
///
/// Seeded with the first value, so the output has the same length as the
/// input. Returns an empty vec for an empty input or a zero period.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() || period == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = values[0];
    out.push(ema);
    for &v in &values[1..] {
        ema += alpha * (v - ema);
        out.push(ema);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_of_constant_series_is_constant() {
        let values = vec![5.0; 10];
        let ema = ema_series(&values, 4);
        assert_eq!(ema.len(), 10);
        for v in ema {
            assert!((v - 5.0).abs() < 1e-12);
        }
    }

    #[test]
    fn ema_tracks_rising_series_from_below() {
        let values: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let ema = ema_series(&values, 5);
        let last = *ema.last().unwrap();
        assert!(last < 19.0);
        assert!(last > 10.0);
        // Slope of the last two values is positive in an uptrend.
        assert!(ema[19] > ema[18]);
    }

    #[test]
    fn ema_empty_input() {
        assert!(ema_series(&[], 5).is_empty());
    }
}
