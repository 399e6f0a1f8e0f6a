//! Engineered features for univariate time series.

/// `series[i - lag]`, or `None` for the first `lag` positions.
pub fn lag(series: &[f64], lag: usize) -> Vec<Option<f64>> {
    (0..series.len())
        .map(|i| i.checked_sub(lag).map(|j| series[j]))
        .collect()
}

/// Trailing mean over `window` observations ending at (and including) `i`.
///
/// `None` until a full window is available.
pub fn rolling_mean(series: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; series.len()];
    }
    let mut out = Vec::with_capacity(series.len());
    let mut sum = 0.0;
    for (i, &value) in series.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= series[i - window];
        }
        out.push((i + 1 >= window).then(|| sum / window as f64));
    }
    out
}
