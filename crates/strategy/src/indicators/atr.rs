use common::Bar;

/// True range of a bar given the previous close: the largest of
/// high−low, |high−prevClose| and |low−prevClose|.
pub fn true_range(prev_close: f64, bar: &Bar) -> f64 {
    let hl = bar.high - bar.low;
    let hc = (bar.high - prev_close).abs();
    let lc = (bar.low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// Average True Range, aligned with the input bars.
///
/// TR needs a previous close, so the series is undefined for bar 0 and
/// stays undefined until `period` TR samples exist (index `period`
/// onward). The first defined value is the simple mean of the initial
/// `period` true ranges; later values are smoothed with an EMA of the
/// same period.
pub fn atr_series(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() <= period {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut seed_sum = 0.0;
    let mut atr = 0.0;

    for i in 1..bars.len() {
        let tr = true_range(bars[i - 1].close, &bars[i]);
        if i < period {
            seed_sum += tr;
        } else if i == period {
            seed_sum += tr;
            atr = seed_sum / period as f64;
            out[i] = Some(atr);
        } else {
            atr += alpha * (tr - atr);
            out[i] = Some(atr);
        }
    }
    out
}
