//! Rain-event cross checks (D04 in-situ, D05 GLDAS)
//!
//! A wetting event needs rain: when soil moisture rose over the last hour
//! and the 24-hour rise exceeds twice the rolling standard deviation, yet the
//! accumulated precipitation over the same day stayed below the minimum rain
//! event, the record is suspect.
//!
//! Applied to surface sensors only: a sensor at or below 0.1 m depth is out
//! of reach of individual rain events and the check is skipped entirely.

use tracing::debug;

use crate::detectors::Internals;
use crate::signal::{diff, rolling_std, rolling_sum, round_to};
use crate::types::thresholds::ancillary;
use crate::types::{Flag, FlagSet, QcSeries};

/// D04: soil moisture rise without an in-situ precipitation event.
pub fn flag_rain_mismatch(
    series: &mut QcSeries,
    depth_from: Option<f64>,
    internals: Option<&mut Internals>,
) {
    let QcSeries {
        values,
        precipitation,
        qflag,
        ..
    } = series;
    let Some(precip) = precipitation else {
        debug!("precipitation channel absent, rain-event check skipped");
        return;
    };
    let Some(min_precipitation) = minimum_rain_event(depth_from) else {
        debug!("sensor depth >= 0.1 m, rain-event check skipped");
        return;
    };
    // The in-situ accumulation is reported at gauge resolution
    apply(
        values,
        precip,
        qflag,
        Flag::D04,
        min_precipitation,
        true,
        internals,
        "precip_24h",
    );
}

/// D05: soil moisture rise without a GLDAS precipitation event.
pub fn flag_rain_mismatch_gldas(
    series: &mut QcSeries,
    depth_from: Option<f64>,
    internals: Option<&mut Internals>,
) {
    let QcSeries {
        values,
        gldas_precipitation,
        qflag,
        ..
    } = series;
    let Some(precip) = gldas_precipitation else {
        debug!("gldas_precipitation channel absent, rain-event check skipped");
        return;
    };
    let Some(min_precipitation) = minimum_rain_event(depth_from) else {
        debug!("sensor depth >= 0.1 m, rain-event check skipped");
        return;
    };
    apply(
        values,
        precip,
        qflag,
        Flag::D05,
        min_precipitation,
        false,
        internals,
        "gldas_precip_24h",
    );
}

/// Minimum 24h precipitation (mm) constituting a rain event at the given
/// sensor depth; `None` when the sensor is too deep for the check.
fn minimum_rain_event(depth_from: Option<f64>) -> Option<f64> {
    match depth_from {
        None => Some(ancillary::P_MIN),
        Some(depth) if depth >= 0.1 => None,
        Some(depth) if depth == 0.0 => Some(ancillary::P_MIN),
        // Water needed to wet the column down to the sensor: depth (m)
        // × 5% porosity change × 50% efficiency × 1000 mm/m
        Some(depth) => Some(depth * 0.05 * 0.5 * 1000.0),
    }
}

#[allow(clippy::too_many_arguments)]
fn apply(
    values: &[f64],
    precip: &[f64],
    qflag: &mut [FlagSet],
    flag: Flag,
    min_precipitation: f64,
    round_total: bool,
    internals: Option<&mut Internals>,
    total_name: &str,
) {
    let mut total = rolling_sum(precip, 24, 1);
    if round_total {
        for v in &mut total {
            *v = round_to(*v, 1);
        }
    }
    let double_std: Vec<f64> = rolling_std(values, 25, 1)
        .into_iter()
        .map(|s| s * 2.0)
        .collect();
    let rise_24h = diff(values, 24);
    let rise_1h = diff(values, 1);

    for i in 0..values.len() {
        // All three must hold; a missing marker in any of them never flags
        if rise_1h[i] > 0.0 && rise_24h[i] > double_std[i] && total[i] < min_precipitation {
            qflag[i].insert(flag);
        }
    }

    if let Some(internals) = internals {
        internals.insert(total_name, total);
        internals.insert("double_std_25h", double_std);
        internals.insert("rise_24h", rise_24h);
        internals.insert("rise_1h", rise_1h);
    }
}
