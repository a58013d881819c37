//! Small numeric helpers shared by the analyses. All of them treat `NaN`
//! as "missing" rather than poisoning the result.

/// Arithmetic mean of the non-`NaN` values. `NaN` when none remain.
pub fn mean(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        if !v.is_nan() {
            sum += v;
            n += 1;
        }
    }
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// Median of the non-`NaN` values. `NaN` when none remain.
pub fn median(values: &[f64]) -> f64 {
    let mut kept: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if kept.is_empty() {
        return f64::NAN;
    }
    kept.sort_by(|a, b| a.total_cmp(b));
    let mid = kept.len() / 2;
    if kept.len() % 2 == 1 {
        kept[mid]
    } else {
        (kept[mid - 1] + kept[mid]) / 2.0
    }
}

/// Minimum of the non-`NaN` values. `NaN` when none remain.
pub fn min(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NAN, f64::min)
}

/// Maximum of the non-`NaN` values. `NaN` when none remain.
pub fn max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NAN, f64::max)
}

/// Masks every occurrence of `bad` to `NaN`.
pub fn mask_value(values: &mut [f64], bad: f64) {
    for v in values.iter_mut() {
        if *v == bad {
            *v = f64::NAN;
        }
    }
}
