//! Static plausibility thresholds per observed variable
//!
//! Lower/upper physical bounds follow the ISMN conventions: soil moisture is
//! percent by volume (m³/m³ × 100), temperatures are °C, precipitation is mm.

use serde::{Deserialize, Serialize};

use crate::error::QcError;

/// Observed variable kinds known to the thresholds table.
///
/// Only `SoilMoisture` gets the full detector pipeline; every other variable
/// is restricted to the plausible-range checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    SoilMoisture,
    SoilTemperature,
    AirTemperature,
    SurfaceTemperature,
    Precipitation,
    SoilSuction,
    SnowWaterEquivalent,
    SnowDepth,
}

impl Variable {
    /// (lower, upper) plausible physical bounds in the variable's unit.
    pub const fn bounds(self) -> (f64, f64) {
        match self {
            Variable::SoilMoisture => (0.0, 60.0),
            Variable::SoilTemperature | Variable::AirTemperature | Variable::SurfaceTemperature => {
                (-60.0, 60.0)
            }
            Variable::Precipitation => (0.0, 100.0),
            Variable::SoilSuction => (0.0, 2500.0),
            Variable::SnowWaterEquivalent | Variable::SnowDepth => (0.0, 10_000.0),
        }
    }

    /// Column name as it appears in ISMN exports.
    pub const fn name(self) -> &'static str {
        match self {
            Variable::SoilMoisture => "soil_moisture",
            Variable::SoilTemperature => "soil_temperature",
            Variable::AirTemperature => "air_temperature",
            Variable::SurfaceTemperature => "surface_temperature",
            Variable::Precipitation => "precipitation",
            Variable::SoilSuction => "soil_suction",
            Variable::SnowWaterEquivalent => "snow_water_equivalent",
            Variable::SnowDepth => "snow_depth",
        }
    }

    /// Identify a primary variable from its column name.
    ///
    /// An unknown name is an error: flagging against undefined thresholds is
    /// never silently attempted.
    pub fn from_name(name: &str) -> Result<Variable, QcError> {
        match name {
            "soil_moisture" => Ok(Variable::SoilMoisture),
            "soil_temperature" => Ok(Variable::SoilTemperature),
            "air_temperature" => Ok(Variable::AirTemperature),
            "surface_temperature" => Ok(Variable::SurfaceTemperature),
            "precipitation" => Ok(Variable::Precipitation),
            "soil_suction" => Ok(Variable::SoilSuction),
            "snow_water_equivalent" => Ok(Variable::SnowWaterEquivalent),
            "snow_depth" => Ok(Variable::SnowDepth),
            other => Err(QcError::UnsupportedVariable(other.to_string())),
        }
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fixed thresholds for ancillary-channel cross checks.
pub mod ancillary {
    /// In-situ air temperature lower bound (°C) below which ground context is suspect
    pub const TA_LOWER: f64 = 0.0;
    /// Soil temperature lower bound (°C), in-situ and GLDAS
    pub const TS_LOWER: f64 = 0.0;
    /// Minimum 24h precipitation (mm) that constitutes a rain event at the surface
    pub const P_MIN: f64 = 0.2;
}
