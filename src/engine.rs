//! Engine orchestrator
//!
//! Applies the detectors to a validated series in their fixed dependency
//! order: plausibility and context checks first, then the dynamical families
//! (spikes, breaks, plateaus) which consume the shared Savitzky–Golay
//! derivatives, and finally the good marker. The low-plateau pass must follow
//! the break pass because its seeding reads the drop flags.
//!
//! A run is a pure function of the input series plus the options; the engine
//! holds no state between invocations.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detectors::{
    breaks, good, low_plateau, precip, range, saturated_plateau, spike, Internals,
};
use crate::error::QcError;
use crate::signal::derivatives;
use crate::types::{Flag, QcRecord, QcSeries, Variable};

/// Per-run options of the QC engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QcOptions {
    /// Station saturation point; enables the C03 check when present
    pub saturation_point: Option<f64>,
    /// Sensor depth in metres; scales the D04/D05 rain-event minimum and
    /// disables both checks at depths of 0.1 m and below the surface layer
    pub depth_from: Option<f64>,
    /// Restrict the run to these detectors; canonical order is kept.
    /// Selecting either D07 or D08 runs the break pass, which emits both.
    pub names: Option<Vec<Flag>>,
    /// Render flags in the numeric alphabet ("1".."14") instead of the
    /// alphabetic one ("C01".."G")
    pub flag_numbers: bool,
    /// Retain the derivative columns and detector intermediates
    pub keep_internals: bool,
}

/// A finished run: the annotated series plus optional internals.
#[derive(Debug, Clone)]
pub struct QcOutput {
    pub series: QcSeries,
    pub internals: Option<Internals>,
    /// Alphabet selected for rendered views
    pub flag_numbers: bool,
}

impl QcOutput {
    /// Row-oriented view in the selected flag alphabet.
    pub fn records(&self) -> Vec<QcRecord> {
        self.series.records(self.flag_numbers)
    }

    /// JSON rendering of [`QcOutput::records`].
    pub fn to_json(&self) -> Result<String, QcError> {
        self.series.to_json(self.flag_numbers)
    }
}

/// Batch QC engine over hourly soil moisture series.
pub struct QcEngine {
    options: QcOptions,
}

impl QcEngine {
    pub fn new(options: QcOptions) -> QcEngine {
        QcEngine { options }
    }

    pub fn with_defaults() -> QcEngine {
        QcEngine::new(QcOptions::default())
    }

    pub fn options(&self) -> &QcOptions {
        &self.options
    }

    /// Annotate a series with quality flags.
    ///
    /// Validates the format contract first; a failed validation leaves the
    /// input untouched. For primary variables other than soil moisture only
    /// the plausible-range checks apply.
    pub fn run(&self, mut series: QcSeries) -> Result<QcOutput, QcError> {
        series.validate()?;
        let mut internals = self.options.keep_internals.then(Internals::default);

        if series.variable != Variable::SoilMoisture {
            debug!(variable = %series.variable, "range checks only for non soil-moisture series");
            if self.selected(Flag::C01) {
                range::flag_below_range(&mut series);
            }
            if self.selected(Flag::C02) {
                range::flag_above_range(&mut series);
            }
            return Ok(QcOutput {
                series,
                internals,
                flag_numbers: self.options.flag_numbers,
            });
        }

        // One derivative pass feeds every dynamical detector
        let derivs = derivatives(&series.values);

        if self.selected(Flag::C01) {
            range::flag_below_range(&mut series);
        }
        if self.selected(Flag::C02) {
            range::flag_above_range(&mut series);
        }
        if self.selected(Flag::C03) {
            if let Some(saturation_point) = self.options.saturation_point {
                range::flag_above_saturation(&mut series, saturation_point);
            } else {
                debug!("no saturation point supplied, saturation check skipped");
            }
        }
        if self.selected(Flag::D01) {
            range::flag_frozen_soil(&mut series);
        }
        if self.selected(Flag::D02) {
            range::flag_frozen_air(&mut series);
        }
        if self.selected(Flag::D03) {
            range::flag_frozen_gldas(&mut series);
        }
        if self.selected(Flag::D04) {
            precip::flag_rain_mismatch(&mut series, self.options.depth_from, internals.as_mut());
        }
        if self.selected(Flag::D05) {
            precip::flag_rain_mismatch_gldas(
                &mut series,
                self.options.depth_from,
                internals.as_mut(),
            );
        }
        if self.selected(Flag::D06) {
            spike::flag_spikes(&mut series, &derivs, internals.as_mut());
        }
        if self.selected(Flag::D07) {
            breaks::flag_breaks(&mut series, &derivs, internals.as_mut());
        }
        if self.selected(Flag::D09) {
            low_plateau::flag_low_plateaus(&mut series, internals.as_mut());
        }
        if self.selected(Flag::D10) {
            saturated_plateau::flag_saturated_plateaus(&mut series, &derivs, internals.as_mut());
        }
        if self.selected(Flag::G) {
            good::flag_good(&mut series);
        }

        if let Some(internals) = internals.as_mut() {
            internals.insert("deriv1", derivs.deriv1);
            internals.insert("deriv2", derivs.deriv2);
        }

        Ok(QcOutput {
            series,
            internals,
            flag_numbers: self.options.flag_numbers,
        })
    }

    fn selected(&self, flag: Flag) -> bool {
        match &self.options.names {
            None => true,
            Some(names) => match flag {
                // one pass emits both break codes
                Flag::D07 | Flag::D08 => {
                    names.contains(&Flag::D07) || names.contains(&Flag::D08)
                }
                other => names.contains(&other),
            },
        }
    }
}

/// Convenience wrapper for one-shot runs.
pub fn run(series: QcSeries, options: &QcOptions) -> Result<QcOutput, QcError> {
    QcEngine::new(options.clone()).run(series)
}
