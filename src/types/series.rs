//! Hourly observation series
//!
//! Columnar storage: one primary value column plus optional ancillary
//! channels, all aligned to a strictly increasing 1-hour timestamp grid.
//! Missing observations are explicit NaN samples, never absent rows, so every
//! rolling window sees the true hourly spacing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QcError;
use crate::types::flags::FlagSet;
use crate::types::thresholds::Variable;

/// An hourly in-situ series carrying the primary variable, optional
/// ancillary channels and the per-record quality flag sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QcSeries {
    /// UTC timestamps, strictly increasing at 1-hour spacing
    pub timestamps: Vec<DateTime<Utc>>,
    /// Primary variable of the series
    pub variable: Variable,
    /// Primary observations; NaN marks a missing sample
    pub values: Vec<f64>,
    /// In-situ soil temperature (°C)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_temperature: Option<Vec<f64>>,
    /// In-situ air temperature (°C)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_temperature: Option<Vec<f64>>,
    /// GLDAS reanalysis soil temperature (°C)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gldas_soil_temperature: Option<Vec<f64>>,
    /// In-situ precipitation (mm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<Vec<f64>>,
    /// GLDAS reanalysis precipitation (mm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gldas_precipitation: Option<Vec<f64>>,
    /// Per-record flag sets, empty until the engine runs
    #[serde(default)]
    pub qflag: Vec<FlagSet>,
}

impl QcSeries {
    /// Build a series from timestamps and primary values; flag sets start
    /// empty. Ancillary channels are attached via the `with_*` builders.
    pub fn new(variable: Variable, timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> QcSeries {
        let qflag = vec![FlagSet::EMPTY; values.len()];
        QcSeries {
            timestamps,
            variable,
            values,
            soil_temperature: None,
            air_temperature: None,
            gldas_soil_temperature: None,
            precipitation: None,
            gldas_precipitation: None,
            qflag,
        }
    }

    /// Build a series identifying the primary variable from a column name.
    pub fn from_named(
        name: &str,
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
    ) -> Result<QcSeries, QcError> {
        Ok(QcSeries::new(Variable::from_name(name)?, timestamps, values))
    }

    pub fn with_soil_temperature(mut self, column: Vec<f64>) -> QcSeries {
        self.soil_temperature = Some(column);
        self
    }

    pub fn with_air_temperature(mut self, column: Vec<f64>) -> QcSeries {
        self.air_temperature = Some(column);
        self
    }

    pub fn with_gldas_soil_temperature(mut self, column: Vec<f64>) -> QcSeries {
        self.gldas_soil_temperature = Some(column);
        self
    }

    pub fn with_precipitation(mut self, column: Vec<f64>) -> QcSeries {
        self.precipitation = Some(column);
        self
    }

    pub fn with_gldas_precipitation(mut self, column: Vec<f64>) -> QcSeries {
        self.gldas_precipitation = Some(column);
        self
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check the format contract: non-empty, aligned columns, strict 1-hour
    /// grid. Run before any detector so a failed run never mutates flags.
    pub fn validate(&self) -> Result<(), QcError> {
        let n = self.values.len();
        if n == 0 {
            return Err(QcError::EmptySeries);
        }
        Self::check_len("timestamps", self.timestamps.len(), n)?;
        Self::check_len("qflag", self.qflag.len(), n)?;
        for (column, data) in [
            ("soil_temperature", &self.soil_temperature),
            ("air_temperature", &self.air_temperature),
            ("gldas_soil_temperature", &self.gldas_soil_temperature),
            ("precipitation", &self.precipitation),
            ("gldas_precipitation", &self.gldas_precipitation),
        ] {
            if let Some(data) = data {
                Self::check_len(column, data.len(), n)?;
            }
        }
        let step = Duration::hours(1);
        for i in 1..n {
            if self.timestamps[i] - self.timestamps[i - 1] != step {
                return Err(QcError::IrregularGrid(i));
            }
        }
        Ok(())
    }

    fn check_len(column: &'static str, actual: usize, expected: usize) -> Result<(), QcError> {
        if actual == expected {
            Ok(())
        } else {
            Err(QcError::ColumnLength {
                column,
                expected,
                actual,
            })
        }
    }

    /// Row-oriented view of the flagged series for serialization.
    pub fn records(&self, flag_numbers: bool) -> Vec<QcRecord> {
        (0..self.len())
            .map(|i| QcRecord {
                timestamp: self.timestamps[i],
                value: self.values[i],
                soil_temperature: self.soil_temperature.as_ref().map(|c| c[i]),
                air_temperature: self.air_temperature.as_ref().map(|c| c[i]),
                gldas_soil_temperature: self.gldas_soil_temperature.as_ref().map(|c| c[i]),
                precipitation: self.precipitation.as_ref().map(|c| c[i]),
                gldas_precipitation: self.gldas_precipitation.as_ref().map(|c| c[i]),
                qflag: self.qflag[i].codes(flag_numbers),
            })
            .collect()
    }

    /// JSON rendering of [`QcSeries::records`]. NaN samples serialize as null.
    pub fn to_json(&self, flag_numbers: bool) -> Result<String, QcError> {
        Ok(serde_json::to_string(&self.records(flag_numbers))?)
    }
}

/// One flagged record in the row-oriented output view.
#[derive(Debug, Clone, Serialize)]
pub struct QcRecord {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gldas_soil_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gldas_precipitation: Option<f64>,
    /// Flag codes in the requested alphabet
    pub qflag: Vec<String>,
}
