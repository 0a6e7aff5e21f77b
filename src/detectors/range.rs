//! Plausible-range and frozen-context checks (C01, C02, C03, D01, D02, D03)
//!
//! Each check reads only the current record, so the six are independent and
//! commutative. A missing sample never compares true and is never flagged.
//! Checks whose ancillary channel is absent are silent no-ops.

use tracing::debug;

use crate::types::thresholds::ancillary;
use crate::types::{Flag, FlagSet, QcSeries};

/// C01: primary observation below the variable's plausible lower bound.
pub fn flag_below_range(series: &mut QcSeries) {
    let QcSeries {
        variable,
        values,
        qflag,
        ..
    } = series;
    let (lower, _) = variable.bounds();
    mark_where(values, qflag, Flag::C01, |v| v < lower);
}

/// C02: primary observation above the variable's plausible upper bound.
pub fn flag_above_range(series: &mut QcSeries) {
    let QcSeries {
        variable,
        values,
        qflag,
        ..
    } = series;
    let (_, upper) = variable.bounds();
    mark_where(values, qflag, Flag::C02, |v| v > upper);
}

/// C03: soil moisture above the station saturation point. Strict comparison:
/// an observation exactly at the saturation point is not flagged.
pub fn flag_above_saturation(series: &mut QcSeries, saturation_point: f64) {
    let QcSeries { values, qflag, .. } = series;
    mark_where(values, qflag, Flag::C03, |v| v > saturation_point);
}

/// D01: negative in-situ soil temperature (frozen ground).
pub fn flag_frozen_soil(series: &mut QcSeries) {
    let QcSeries {
        soil_temperature,
        qflag,
        ..
    } = series;
    let Some(column) = soil_temperature else {
        debug!("soil_temperature channel absent, frozen-soil check skipped");
        return;
    };
    mark_where(column, qflag, Flag::D01, |t| t < ancillary::TS_LOWER);
}

/// D02: negative in-situ air temperature.
pub fn flag_frozen_air(series: &mut QcSeries) {
    let QcSeries {
        air_temperature,
        qflag,
        ..
    } = series;
    let Some(column) = air_temperature else {
        debug!("air_temperature channel absent, frozen-air check skipped");
        return;
    };
    mark_where(column, qflag, Flag::D02, |t| t < ancillary::TA_LOWER);
}

/// D03: negative GLDAS soil temperature.
pub fn flag_frozen_gldas(series: &mut QcSeries) {
    let QcSeries {
        gldas_soil_temperature,
        qflag,
        ..
    } = series;
    let Some(column) = gldas_soil_temperature else {
        debug!("gldas_soil_temperature channel absent, frozen-GLDAS check skipped");
        return;
    };
    mark_where(column, qflag, Flag::D03, |t| t < ancillary::TS_LOWER);
}

fn mark_where<F>(column: &[f64], qflag: &mut [FlagSet], flag: Flag, criterion: F)
where
    F: Fn(f64) -> bool,
{
    for (q, &v) in qflag.iter_mut().zip(column.iter()) {
        // NaN never satisfies a comparison, so missing samples pass through
        if criterion(v) {
            q.insert(flag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Variable;
    use chrono::{Duration, TimeZone, Utc};

    fn make_series(values: Vec<f64>) -> QcSeries {
        let start = Utc.with_ymd_and_hms(2020, 1, 27, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| start + Duration::hours(i as i64))
            .collect();
        QcSeries::new(Variable::SoilMoisture, timestamps, values)
    }

    #[test]
    fn test_below_and_above_range() {
        let mut series = make_series(vec![-0.1, 0.0, 30.0, 60.0, 60.1, f64::NAN]);
        flag_below_range(&mut series);
        flag_above_range(&mut series);
        assert!(series.qflag[0].contains(Flag::C01));
        assert!(series.qflag[1].is_empty(), "bounds are strict");
        assert!(series.qflag[2].is_empty());
        assert!(series.qflag[3].is_empty(), "bounds are strict");
        assert!(series.qflag[4].contains(Flag::C02));
        assert!(series.qflag[5].is_empty(), "missing sample is never flagged");
    }

    #[test]
    fn test_saturation_is_strict() {
        let mut series = make_series(vec![42.6, 42.7, 42.8]);
        flag_above_saturation(&mut series, 42.7);
        assert!(series.qflag[0].is_empty());
        assert!(series.qflag[1].is_empty(), "exactly the saturation point is not above it");
        assert!(series.qflag[2].contains(Flag::C03));
    }

    #[test]
    fn test_frozen_checks_flag_negative_temperatures() {
        let mut series = make_series(vec![10.0, 10.0, 10.0])
            .with_soil_temperature(vec![-0.5, 0.0, 4.0])
            .with_air_temperature(vec![2.0, -1.0, f64::NAN])
            .with_gldas_soil_temperature(vec![-3.0, 1.0, 1.0]);
        flag_frozen_soil(&mut series);
        flag_frozen_air(&mut series);
        flag_frozen_gldas(&mut series);
        assert!(series.qflag[0].contains(Flag::D01));
        assert!(series.qflag[0].contains(Flag::D03));
        assert!(series.qflag[1].contains(Flag::D02));
        assert!(!series.qflag[1].contains(Flag::D01), "zero is not below zero");
        assert!(!series.qflag[2].contains(Flag::D02), "missing temperature never flags");
    }

    #[test]
    fn test_absent_channel_is_a_no_op() {
        let mut series = make_series(vec![10.0, 10.0]);
        flag_frozen_soil(&mut series);
        flag_frozen_air(&mut series);
        flag_frozen_gldas(&mut series);
        assert!(series.qflag.iter().all(|q| q.is_empty()));
    }
}
