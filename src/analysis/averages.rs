//! Trailing running averages, used for the wind-power smoothing.

/// Trailing boxcar average over `window` samples, with implicit zeros
/// before the start of the series (so the first `window - 1` outputs ramp
/// up from zero, matching a zero-state linear filter).
pub fn running_mean(series: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return series.to_vec();
    }
    let mut out = Vec::with_capacity(series.len());
    let mut sum = 0.0;
    for (i, &value) in series.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= series[i - window];
        }
        out.push(sum / window as f64);
    }
    out
}
