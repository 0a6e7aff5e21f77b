//! Spike detection (D06)
//!
//! A spike is an isolated one-hour (or flat two-hour) excursion: the value
//! jumps by more than 15% against its predecessor, the curvature before and
//! after the peak nearly cancels, the neighborhood variance is small relative
//! to its mean, and the sample sits on a local extremum. All four criteria
//! must hold; the second hour of a flat two-hour peak inherits the flag from
//! the first.

use crate::detectors::Internals;
use crate::signal::{checked_div, round_to, Derivatives};
use crate::types::{Flag, QcSeries};

/// Half-width of the neighborhood variance window (25 samples centered).
const NEIGHBORHOOD: usize = 12;

pub fn flag_spikes(
    series: &mut QcSeries,
    derivs: &Derivatives,
    internals: Option<&mut Internals>,
) {
    let x = &series.values;
    let n = x.len();
    let d2 = &derivs.deriv2;

    // Ratio of each sample to its predecessor
    let mut value_ratio = vec![f64::NAN; n];
    for i in 1..n {
        value_ratio[i] = round_to(checked_div(x[i], x[i - 1]), 3);
    }

    // Curvature one hour before the peak against one hour after it
    let mut curvature_ratio = vec![f64::NAN; n];
    for i in 1..n {
        if i + 1 < n {
            curvature_ratio[i] = round_to(checked_div(d2[i - 1], d2[i + 1]).abs(), 3);
        }
    }

    // Variance of the 24 neighbors (center excluded) relative to their mean;
    // defined only where the full 25-sample neighborhood is present
    let mut relative_variance = vec![f64::NAN; n];
    if n > 2 * NEIGHBORHOOD {
        for i in NEIGHBORHOOD..n - NEIGHBORHOOD {
            let window = &x[i - NEIGHBORHOOD..=i + NEIGHBORHOOD];
            if window.iter().any(|v| v.is_nan()) {
                continue;
            }
            let neighbors = || {
                window
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != NEIGHBORHOOD)
                    .map(|(_, v)| *v)
            };
            let count = (window.len() - 1) as f64;
            let mean = neighbors().sum::<f64>() / count;
            let var = neighbors().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1.0);
            relative_variance[i] = checked_div(var.abs(), mean);
        }
    }

    let peak = peak_kinds(x);
    // Second hour of a flat peak: the previous sample saw a two-hour shape
    let spike_2h: Vec<bool> = (0..n)
        .map(|i| i > 0 && peak[i - 1] > 1.0)
        .collect();

    let mut spike = vec![false; n];
    for i in 0..n {
        let jumps = value_ratio[i] > 1.15 || value_ratio[i] < 0.85 || spike_2h[i];
        spike[i] = jumps
            && curvature_ratio[i] > 0.8
            && curvature_ratio[i] < 1.2
            && relative_variance[i] < 1.0
            && peak[i] > 0.0;
    }

    for i in 0..n {
        if spike[i] || (i > 0 && spike[i - 1] && spike_2h[i]) {
            series.qflag[i].insert(Flag::D06);
        }
    }

    if let Some(internals) = internals {
        internals.insert("spike_value_ratio", value_ratio);
        internals.insert("spike_curvature_ratio", curvature_ratio);
        internals.insert("spike_relative_variance", relative_variance);
        internals.insert("spike_peak_kind", peak);
    }
}

/// Peak classification per sample: 0 none, 1 single-hour extremum, 2 flat
/// two-hour extremum.
///
/// Sample `i` is classified from the four hours `[i−1, i, i+1, i+2]`; at the
/// series edges the window is truncated and needs at least three present
/// samples to be evaluated.
fn peak_kinds(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut out = vec![f64::NAN; n];
    for i in 0..n {
        let anchor = i + 1;
        if anchor >= n {
            break;
        }
        let lo = anchor.saturating_sub(2);
        let hi = (anchor + 1).min(n - 1);
        let window = &x[lo..=hi];
        let present = window.iter().filter(|v| !v.is_nan()).count();
        if present >= 3 {
            out[i] = classify(window);
        }
    }
    out
}

/// Extremum test at the second element of the window.
fn classify(w: &[f64]) -> f64 {
    let (a, b, c) = (w[0], w[1], w[2]);
    if (a < b && b > c) || (a > b && b < c) {
        return 1.0;
    }
    if w.len() > 3 {
        let d = w[3];
        if (a < b && b == c && c > d) || (a > b && b == c && c < d) {
            return 2.0;
        }
    }
    0.0
}
