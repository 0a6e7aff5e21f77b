//! Rolling-window statistics over NaN-marked hourly series
//!
//! All kernels follow the same contract: windows are truncated at the series
//! edges, NaN samples inside a window are skipped, and a window emits a value
//! only when it holds at least `min_periods` present samples; otherwise the
//! missing marker (NaN) is emitted. Causal windows end at the current sample;
//! centered windows (odd lengths) straddle it.
//!
//! Variance and std use the sample divisor (n − 1); a window with a single
//! present sample therefore emits the missing marker regardless of
//! `min_periods`.

/// Causal rolling sum over the trailing `window` samples.
pub fn rolling_sum(x: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    causal(x, window, min_periods, |w| {
        Some(w.iter().sum::<f64>())
    })
}

/// Causal rolling mean over the trailing `window` samples.
pub fn rolling_mean(x: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    causal(x, window, min_periods, |w| {
        Some(w.iter().sum::<f64>() / w.len() as f64)
    })
}

/// Causal rolling sample variance (divisor n − 1).
pub fn rolling_var(x: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    causal(x, window, min_periods, |w| sample_variance(w))
}

/// Causal rolling sample standard deviation.
pub fn rolling_std(x: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    causal(x, window, min_periods, |w| sample_variance(w).map(f64::sqrt))
}

/// Causal rolling maximum.
pub fn rolling_max(x: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    causal(x, window, min_periods, |w| {
        w.iter().copied().reduce(f64::max)
    })
}

/// Causal rolling minimum.
pub fn rolling_min(x: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    causal(x, window, min_periods, |w| {
        w.iter().copied().reduce(f64::min)
    })
}

/// Centered rolling mean; `window` must be odd so the window straddles the
/// current sample symmetrically.
pub fn rolling_mean_centered(x: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    debug_assert!(window % 2 == 1, "centered windows must be odd");
    let half = window / 2;
    let n = x.len();
    let mut out = vec![f64::NAN; n];
    let mut buf = Vec::with_capacity(window);
    for i in 0..n {
        let lo = i.saturating_sub(half);
        let hi = (i + half).min(n.saturating_sub(1));
        buf.clear();
        buf.extend(x[lo..=hi].iter().copied().filter(|v| !v.is_nan()));
        if buf.len() >= min_periods && !buf.is_empty() {
            out[i] = buf.iter().sum::<f64>() / buf.len() as f64;
        }
    }
    out
}

/// Lagged difference: `out[i] = x[i] − x[i−k]`.
pub fn diff(x: &[f64], k: usize) -> Vec<f64> {
    let n = x.len();
    let mut out = vec![f64::NAN; n];
    for i in k..n {
        out[i] = x[i] - x[i - k];
    }
    out
}

/// Shift by `k` samples: positive pulls values from the past
/// (`out[i] = x[i−k]`), negative from the future (`out[i] = x[i+k]`).
/// Vacated positions hold the missing marker.
pub fn shift(x: &[f64], k: isize) -> Vec<f64> {
    let n = x.len() as isize;
    let mut out = vec![f64::NAN; x.len()];
    for i in 0..n {
        let j = i - k;
        if (0..n).contains(&j) {
            out[i as usize] = x[j as usize];
        }
    }
    out
}

/// Round to `decimals` decimal places, ties to even (NumPy semantics).
/// NaN stays NaN.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let factor = 10f64.powi(decimals);
    (x * factor).round_ties_even() / factor
}

/// Division that treats a zero denominator as missing instead of ±inf, so a
/// degenerate ratio never satisfies a flag criterion.
pub fn checked_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Apply `stat` to every trailing window, honouring `min_periods` over the
/// present (non-NaN) samples only.
fn causal<F>(x: &[f64], window: usize, min_periods: usize, stat: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let n = x.len();
    let mut out = vec![f64::NAN; n];
    let mut buf = Vec::with_capacity(window);
    for i in 0..n {
        let lo = (i + 1).saturating_sub(window);
        buf.clear();
        buf.extend(x[lo..=i].iter().copied().filter(|v| !v.is_nan()));
        if buf.len() >= min_periods {
            if let Some(v) = stat(&buf) {
                out[i] = v;
            }
        }
    }
    out
}

/// Sample variance of the present values; `None` below two samples.
fn sample_variance(w: &[f64]) -> Option<f64> {
    if w.len() < 2 {
        return None;
    }
    let n = w.len() as f64;
    let mean = w.iter().sum::<f64>() / n;
    let ss: f64 = w.iter().map(|v| (v - mean).powi(2)).sum();
    Some(ss / (n - 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_sum_respects_min_periods() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let out = rolling_sum(&x, 3, 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert!((out[2] - 6.0).abs() < EPS);
        assert!((out[3] - 9.0).abs() < EPS);
    }

    #[test]
    fn test_sum_partial_windows_with_min_periods_one() {
        let x = [1.0, f64::NAN, 3.0];
        let out = rolling_sum(&x, 3, 1);
        assert!((out[0] - 1.0).abs() < EPS);
        assert!((out[1] - 1.0).abs() < EPS); // NaN skipped
        assert!((out[2] - 4.0).abs() < EPS);
    }

    #[test]
    fn test_var_single_sample_is_missing() {
        let x = [5.0, 5.0];
        let out = rolling_var(&x, 2, 1);
        assert!(out[0].is_nan(), "one observation has no sample variance");
        assert!((out[1] - 0.0).abs() < EPS);
    }

    #[test]
    fn test_var_matches_hand_computation() {
        let x = [2.0, 4.0, 6.0];
        let out = rolling_var(&x, 3, 3);
        // mean 4, squared deviations 4 + 0 + 4, divisor 2
        assert!((out[2] - 4.0).abs() < EPS);
        let std = rolling_std(&x, 3, 3);
        assert!((std[2] - 2.0).abs() < EPS);
    }

    #[test]
    fn test_min_max_skip_missing() {
        let x = [1.0, f64::NAN, -3.0, 2.0];
        let max = rolling_max(&x, 4, 1);
        let min = rolling_min(&x, 4, 1);
        assert!((max[3] - 2.0).abs() < EPS);
        assert!((min[3] + 3.0).abs() < EPS);
    }

    #[test]
    fn test_centered_mean_truncates_at_edges() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = rolling_mean_centered(&x, 3, 1);
        assert!((out[0] - 1.5).abs() < EPS); // [1, 2]
        assert!((out[2] - 3.0).abs() < EPS); // [2, 3, 4]
        assert!((out[4] - 4.5).abs() < EPS); // [4, 5]
    }

    #[test]
    fn test_diff_and_shift() {
        let x = [1.0, 3.0, 6.0, 10.0];
        let d = diff(&x, 2);
        assert!(d[0].is_nan() && d[1].is_nan());
        assert!((d[2] - 5.0).abs() < EPS);
        let back = shift(&x, 1);
        assert!(back[0].is_nan());
        assert!((back[1] - 1.0).abs() < EPS);
        let fwd = shift(&x, -2);
        assert!((fwd[0] - 6.0).abs() < EPS);
        assert!(fwd[3].is_nan());
    }

    #[test]
    fn test_round_ties_to_even() {
        assert!((round_to(0.12349, 3) - 0.123).abs() < EPS);
        assert!((round_to(0.12351, 3) - 0.124).abs() < EPS);
        assert!((round_to(2.5, 0) - 2.0).abs() < EPS);
        assert!((round_to(3.5, 0) - 4.0).abs() < EPS);
        assert!(round_to(f64::NAN, 3).is_nan());
    }

    #[test]
    fn test_checked_div_zero_denominator() {
        assert!(checked_div(1.0, 0.0).is_nan());
        assert!((checked_div(1.0, 2.0) - 0.5).abs() < EPS);
    }
}
