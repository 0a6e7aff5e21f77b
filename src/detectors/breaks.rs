//! Break detection: drops (D07) and jumps (D08)
//!
//! A break is a single large signed step. Five criteria must coincide: a
//! relative change above 10%, an absolute step above 1, a first derivative
//! exceeding ten times the local derivative background, curvature of equal
//! magnitude on both sides of the step, and curvature collapsing within two
//! hours. The sign of the first derivative decides drop versus jump, so one
//! record never carries both codes.
//!
//! A separate rule catches hard sensor failures: any step larger than 5
//! landing exactly on zero is a drop, unconditionally.

use crate::detectors::Internals;
use crate::signal::{checked_div, diff, rolling_mean_centered, round_to, Derivatives};
use crate::types::{Flag, QcSeries};

pub fn flag_breaks(
    series: &mut QcSeries,
    derivs: &Derivatives,
    internals: Option<&mut Internals>,
) {
    let x = &series.values;
    let n = x.len();
    let d1 = &derivs.deriv1;
    let d2 = &derivs.deriv2;

    let step = diff(x, 1);

    // Relative change against the post-step level
    let mut relative_change = vec![f64::NAN; n];
    for i in 0..n {
        relative_change[i] = checked_div(step[i], x[i]).abs();
    }

    // Derivative background: centered daily mean of deriv1, scaled by 10
    let background: Vec<f64> = rolling_mean_centered(d1, 25, 4)
        .into_iter()
        .map(|m| (m * 10.0).abs())
        .collect();

    // Curvature magnitude before the step against the step itself
    let mut curvature_balance = vec![f64::NAN; n];
    for i in 1..n {
        curvature_balance[i] = round_to(checked_div(d2[i - 1], d2[i]).abs(), 1);
    }

    // Curvature two hours on: a true break relaxes by an order of magnitude
    let mut curvature_decay = vec![f64::NAN; n];
    for i in 0..n {
        if i + 2 < n {
            curvature_decay[i] = checked_div(d2[i], d2[i + 2]).abs();
        }
    }

    for i in 0..n {
        let is_break = relative_change[i] > 0.1
            && step[i].abs() > 1.0
            && x[i] != 0.0
            && d1[i].abs() > background[i]
            && (curvature_balance[i] - 1.0).abs() < 0.01
            && d2[i] != 0.0
            && curvature_decay[i] > 10.0;
        if is_break {
            if d1[i] < 0.0 {
                series.qflag[i].insert(Flag::D07);
            } else if d1[i] > 0.0 {
                series.qflag[i].insert(Flag::D08);
            }
        }
        // Drop to zero: a step of more than 5 ending exactly at zero
        if step[i].abs() > 5.0 && x[i] == 0.0 {
            series.qflag[i].insert(Flag::D07);
        }
    }

    if let Some(internals) = internals {
        internals.insert("break_step", step);
        internals.insert("break_relative_change", relative_change);
        internals.insert("break_background", background);
        internals.insert("break_curvature_balance", curvature_balance);
        internals.insert("break_curvature_decay", curvature_decay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::derivatives;
    use crate::types::Variable;
    use chrono::{Duration, TimeZone, Utc};

    fn make_series(values: Vec<f64>) -> QcSeries {
        let start = Utc.with_ymd_and_hms(2020, 1, 27, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| start + Duration::hours(i as i64))
            .collect();
        QcSeries::new(Variable::SoilMoisture, timestamps, values)
    }

    fn run(values: Vec<f64>) -> QcSeries {
        let mut series = make_series(values);
        let derivs = derivatives(&series.values);
        flag_breaks(&mut series, &derivs, None);
        series
    }

    /// Step series: `level_a` before the step, `level_b` after, with a faint
    /// alternating texture on the tail so the post-step curvature is nonzero
    /// (a perfectly flat tail zeroes the two-hour curvature ratio and the
    /// degenerate division suppresses the flag).
    fn step_series(level_a: f64, level_b: f64, at: usize, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                if i < at {
                    level_a
                } else {
                    level_b + 0.01 * ((i - at) % 2) as f64
                }
            })
            .collect()
    }

    #[test]
    fn test_sharp_drop_is_flagged_d07() {
        let series = run(step_series(30.0, 10.0, 20, 41));
        assert!(series.qflag[20].contains(Flag::D07));
        assert!(!series.qflag[20].contains(Flag::D08));
        assert!(!series.qflag[19].contains(Flag::D07));
        assert!(!series.qflag[21].contains(Flag::D07));
    }

    #[test]
    fn test_sharp_jump_is_flagged_d08() {
        let series = run(step_series(10.0, 30.0, 20, 41));
        assert!(series.qflag[20].contains(Flag::D08));
        assert!(!series.qflag[20].contains(Flag::D07));
    }

    #[test]
    fn test_flat_tail_suppresses_the_curvature_ratio() {
        // Same drop, but the tail is perfectly constant: the curvature two
        // hours after the step is exactly zero, the ratio is undefined, and
        // the conjunction must not fire.
        let values: Vec<f64> = (0..41).map(|i| if i < 20 { 30.0 } else { 10.0 }).collect();
        let series = run(values);
        assert!(!series.qflag[20].contains(Flag::D07));
    }

    #[test]
    fn test_drop_and_jump_are_exclusive_everywhere() {
        let mut values = step_series(10.0, 30.0, 15, 41);
        for (k, v) in values.iter_mut().enumerate().skip(30) {
            *v = 8.0 + 0.01 * (k % 2) as f64;
        }
        let series = run(values);
        assert!(series.qflag.iter().any(|q| q.contains(Flag::D08)));
        assert!(series.qflag.iter().any(|q| q.contains(Flag::D07)));
        for q in &series.qflag {
            assert!(!(q.contains(Flag::D07) && q.contains(Flag::D08)));
        }
    }

    #[test]
    fn test_small_step_is_not_a_break() {
        // |step| must exceed 1 in absolute terms
        let series = run(step_series(30.0, 29.5, 20, 41));
        assert!(series
            .qflag
            .iter()
            .all(|q| !q.contains(Flag::D07) && !q.contains(Flag::D08)));
    }

    #[test]
    fn test_gradual_decline_is_not_a_break() {
        let values: Vec<f64> = (0..41).map(|i| 40.0 - 0.5 * i as f64).collect();
        let series = run(values);
        assert!(series
            .qflag
            .iter()
            .all(|q| !q.contains(Flag::D07) && !q.contains(Flag::D08)));
    }

    #[test]
    fn test_drop_to_zero_is_always_d07() {
        // The base conjunction excludes x == 0, but the drop-to-zero rule
        // catches it regardless of the surrounding dynamics
        let series = run(step_series(20.0, 0.0, 20, 41));
        assert!(series.qflag[20].contains(Flag::D07));
        assert!(!series.qflag[20].contains(Flag::D08));
    }

    #[test]
    fn test_small_drop_to_zero_is_not_flagged() {
        let series = run(step_series(4.0, 0.0, 20, 41));
        assert!(!series.qflag[20].contains(Flag::D07));
    }

    #[test]
    fn test_constant_zero_series_has_no_breaks() {
        let series = run(vec![0.0; 41]);
        assert!(series
            .qflag
            .iter()
            .all(|q| !q.contains(Flag::D07) && !q.contains(Flag::D08)));
    }
}
