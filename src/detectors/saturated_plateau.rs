//! Saturated plateaus (D10)
//!
//! After heavy wetting a sensor can pin near its ceiling and report an
//! implausibly invariant level. The detector groups contiguous low-variance
//! runs on a contracted view of the series (missing samples removed, so a
//! plateau bridges gaps), then accepts a run when it is bracketed by a
//! sufficient rise and a drop of the first derivative and its mean exceeds
//! 95% of the highest soil moisture ever observed below the physical bound.

use statrs::statistics::Statistics;
use tracing::debug;

use crate::detectors::Internals;
use crate::signal::{rolling_max, rolling_min, rolling_var, round_to, shift, Derivatives};
use crate::types::{Flag, QcSeries};

/// Forward window (hours) whose variance must stay low inside a run.
const RUN_WINDOW: usize = 12;

/// Variance ceiling that defines a low-variance sample.
const VARIANCE_CEILING: f64 = 0.05;

/// Minimum first-derivative rise ahead of an accepted plateau.
const MIN_RISE: f64 = 0.25;

/// Tolerance when matching the first derivative against the rounded
/// rise/drop targets.
const DERIV_MATCH_TOLERANCE: f64 = 5e-4;

pub fn flag_saturated_plateaus(
    series: &mut QcSeries,
    derivs: &Derivatives,
    internals: Option<&mut Internals>,
) {
    // Historical maximum below the physical bound; the 95% acceptance level
    let highest_sm = series
        .values
        .iter()
        .copied()
        .filter(|v| !v.is_nan() && *v < 60.0)
        .fold(f64::NAN, f64::max);
    if highest_sm.is_nan() {
        debug!("no in-range soil moisture observed, saturated-plateau check skipped");
        return;
    }

    let present: Vec<usize> = (0..series.len())
        .filter(|&i| !series.values[i].is_nan())
        .collect();
    if present.is_empty() {
        return;
    }
    let x: Vec<f64> = present.iter().map(|&i| series.values[i]).collect();
    let d1: Vec<f64> = present.iter().map(|&i| derivs.deriv1[i]).collect();
    let m = x.len();

    // Low-variance mask over the forward 12h window, then consecutive run ids
    let var12 = shift(&rolling_var(&x, RUN_WINDOW, RUN_WINDOW), -11);
    let low_var: Vec<bool> = var12.iter().map(|v| *v <= VARIANCE_CEILING).collect();
    let groups = number_runs(&low_var);

    // Derivative envelope: the strongest rise around each sample and the
    // strongest drop in the following day
    let rise_max = shift(&rolling_max(&d1, 25, 1), -12);
    let drop_min = shift(&rolling_min(&d1, 25, 1), -24);

    let last_group = groups.iter().copied().max().unwrap_or(0);
    for group in 1..=last_group {
        let Some(first) = groups.iter().position(|&g| g == group) else {
            continue;
        };
        let Some(last) = groups.iter().rposition(|&g| g == group) else {
            continue;
        };

        // First present rise and last present drop of the run
        let rise = (first..=last).map(|i| rise_max[i]).find(|v| !v.is_nan());
        let drop = (first..=last)
            .rev()
            .map(|i| drop_min[i])
            .find(|v| !v.is_nan());
        let (Some(rise), Some(drop)) = (rise, drop) else {
            continue;
        };
        let rise = round_to(rise, 3);
        let drop = round_to(drop, 3);
        if !(rise >= MIN_RISE && drop < 0.0) {
            continue;
        }

        // Search the run plus a trailing 12h window for the samples where
        // the derivative attains the rise and the drop
        let search_end = (last + RUN_WINDOW - 1).min(m - 1);
        let start = (first..=search_end)
            .find(|&i| (d1[i] - rise).abs() < DERIV_MATCH_TOLERANCE)
            .unwrap_or(first);
        let end = (first..=search_end)
            .find(|&i| (d1[i] - drop).abs() < DERIV_MATCH_TOLERANCE)
            .unwrap_or(search_end);
        if start > end {
            continue;
        }

        let plateau = &x[start..=end];
        if plateau.mean() > highest_sm * 0.95 {
            debug!(group, start, end, "saturated plateau accepted");
            for i in start..=end {
                series.qflag[present[i]].insert(Flag::D10);
            }
        }
    }

    if let Some(internals) = internals {
        let mut group_column = vec![f64::NAN; series.len()];
        for (c, &i) in present.iter().enumerate() {
            group_column[i] = f64::from(groups[c]);
        }
        internals.insert("saturation_group", group_column);
    }
}

/// Number contiguous low-variance runs 1, 2, 3, …; samples outside a run get
/// 0. The group counter advances on each true→false transition; the final
/// sample belongs to the current run only if the series ends inside one.
fn number_runs(mask: &[bool]) -> Vec<u32> {
    let mut group = 1u32;
    let mut out = Vec::with_capacity(mask.len());
    for pair in mask.windows(2) {
        out.push(if pair[0] { group } else { 0 });
        if pair[0] && !pair[1] {
            group += 1;
        }
    }
    if let Some(&last) = mask.last() {
        out.push(if last { group } else { 0 });
    }
    out
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
        flag_saturated_plateaus(&mut series, &derivs, None);
        series
    }

    /// 30 → sharp ramp to `top` → 21h hold → sharp fall back to 30.
    fn saturation_fixture(top: f64) -> Vec<f64> {
        let mut values = vec![30.0; 20];
        for k in 1..=5 {
            values.push(30.0 + (top - 30.0) * k as f64 / 5.0);
        }
        while values.len() < 45 {
            values.push(top);
        }
        for k in 1..=5 {
            values.push(top - (top - 30.0) * k as f64 / 5.0);
        }
        while values.len() < 60 {
            values.push(30.0);
        }
        values
    }

    #[test]
    fn test_plateau_at_historical_maximum_is_flagged() {
        let series = run(saturation_fixture(55.0));
        assert!(series.qflag[24].contains(Flag::D10));
        assert!(series.qflag[30].contains(Flag::D10));
        assert!(series.qflag[44].contains(Flag::D10));
        assert!(!series.qflag[23].contains(Flag::D10));
        assert!(!series.qflag[45].contains(Flag::D10));
    }

    #[test]
    fn test_plateau_well_below_maximum_is_not_flagged() {
        // Same shape at 40, but a later excursion to 55 raises the
        // historical maximum above what the plateau can reach
        let mut values = saturation_fixture(40.0);
        values[55] = 55.0;
        let series = run(values);
        assert!(series.qflag.iter().all(|q| !q.contains(Flag::D10)));
    }

    #[test]
    fn test_gentle_ramp_lacks_the_required_rise() {
        // Rise to the top over 200 hours: the first derivative stays at
        // 0.125, below the required 0.25
        let mut values = vec![30.0; 10];
        for k in 1..=200 {
            values.push(30.0 + 25.0 * k as f64 / 200.0);
        }
        while values.len() < 240 {
            values.push(55.0);
        }
        for k in 1..=5 {
            values.push(55.0 - 5.0 * k as f64);
        }
        while values.len() < 260 {
            values.push(30.0);
        }
        let series = run(values);
        assert!(series.qflag.iter().all(|q| !q.contains(Flag::D10)));
    }

    #[test]
    fn test_observations_at_the_physical_bound_do_not_set_the_maximum() {
        // A spurious 60 must not inflate the acceptance level
        let mut values = saturation_fixture(55.0);
        values[10] = 60.0;
        let series = run(values);
        assert!(series.qflag[30].contains(Flag::D10));
    }

    #[test]
    fn test_number_runs_assigns_consecutive_ids() {
        let mask = [true, false, true, true, false, false, true, true];
        assert_eq!(number_runs(&mask), vec![1, 0, 2, 2, 0, 0, 3, 3]);
        // A series ending outside a run zeroes the final sample
        let mask = [true, true, false];
        assert_eq!(number_runs(&mask), vec![1, 1, 0]);
        let mask = [false, true];
        assert_eq!(number_runs(&mask), vec![0, 1]);
    }
}
