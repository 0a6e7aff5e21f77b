//! Constant low values following a drop (D09)
//!
//! After a negative break the sensor sometimes settles on an implausibly
//! constant level. The detector scans a contracted view of the series with
//! the missing samples removed, so a plateau bridges data gaps: a record
//! where a drop (D07) coincides with low forward relative variance opens a
//! plateau, and the plateau stays open until the relative variance rises
//! again. The forward variance window spans 13 hours, which is also the
//! minimum plateau duration.
//!
//! Flags are written back through the contracted-to-original index map, so
//! flags on gap rows are never disturbed.

use crate::detectors::Internals;
use crate::signal::{checked_div, diff, rolling_max, rolling_mean, rolling_var, round_to, shift};
use crate::types::{Flag, QcSeries};

/// Forward window (hours) for the relative variance, and the minimum
/// plateau duration.
const PLATEAU_WINDOW: usize = 13;

/// Relative variance below which a period counts as constant.
const RELATIVE_VARIANCE_FLOOR: f64 = 0.001;

pub fn flag_low_plateaus(series: &mut QcSeries, internals: Option<&mut Internals>) {
    // Contract away the missing samples; a plateau may bridge a gap
    let present: Vec<usize> = (0..series.len())
        .filter(|&i| !series.values[i].is_nan())
        .collect();
    if present.is_empty() {
        return;
    }
    let x: Vec<f64> = present.iter().map(|&i| series.values[i]).collect();
    let m = x.len();

    // Forward 13-sample relative variance, aligned to the window start
    let var13 = shift(&rolling_var(&x, PLATEAU_WINDOW, PLATEAU_WINDOW), -12);
    let mean13 = shift(&rolling_mean(&x, PLATEAU_WINDOW, PLATEAU_WINDOW), -12);
    let mut rel_var = vec![f64::NAN; m];
    for i in 0..m {
        rel_var[i] = checked_div(round_to(var13[i], 4), round_to(mean13[i], 4));
    }
    // A run of zeros has zero mean and an undefined ratio; those periods are
    // exactly the aftermath of a drop to zero, so count them as constant
    for i in 0..m {
        if rel_var[i].is_nan() && x[i] == 0.0 {
            rel_var[i] = 0.0;
        }
    }

    // +1 opens a plateau (drop plus constancy), −1 closes it (variance rise)
    let rise = diff(&rel_var, 1);
    let mut event = vec![0i32; m];
    for i in 0..m {
        if series.qflag[present[i]].contains(Flag::D07) && rel_var[i] < RELATIVE_VARIANCE_FLOOR {
            event[i] = 1;
        }
    }
    for i in 0..m {
        if rise[i] >= RELATIVE_VARIANCE_FLOOR && event[i] == 0 {
            event[i] = -1;
        }
    }

    // Saturating accumulator: the mask holds 1 across the open plateau
    let mut level = 0i32;
    let mut plateau = vec![0.0f64; m];
    for i in 0..m {
        level = (level + event[i]).clamp(0, 1);
        plateau[i] = f64::from(level);
    }

    // Stretch by the trailing window so every plateau covers at least 13h
    let covered = rolling_max(&plateau, PLATEAU_WINDOW, PLATEAU_WINDOW);
    for i in 0..m {
        if covered[i] > 0.0 {
            series.qflag[present[i]].insert(Flag::D09);
        }
    }

    if let Some(internals) = internals {
        internals.insert(
            "plateau_relative_variance",
            scatter(&rel_var, &present, series.len()),
        );
        internals.insert("plateau_mask", scatter(&plateau, &present, series.len()));
    }
}

/// Expand a contracted column back onto the original grid; gap rows hold the
/// missing marker.
fn scatter(contracted: &[f64], present: &[usize], n: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; n];
    for (value, &i) in contracted.iter().zip(present.iter()) {
        out[i] = *value;
    }
    out
}
