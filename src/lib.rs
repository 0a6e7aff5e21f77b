//! SMQC: Soil Moisture Quality Control
//!
//! Automated quality control for hourly in-situ soil moisture time series,
//! following the ISMN flag taxonomy: C-flags for observations outside the
//! plausible geophysical range, D-flags for dubious context or dynamics
//! (frozen ground, rain-free wetting, spikes, breaks, plateaus) and G for
//! good observations.
//!
//! ## Architecture
//!
//! - **Types**: columnar hourly [`QcSeries`], the closed [`Flag`] alphabet
//!   and per-record [`FlagSet`] bitsets, static thresholds
//! - **Signal**: rolling-window statistics and the Savitzky–Golay
//!   derivative builder shared by the dynamical detectors
//! - **Detectors**: one module per flag family, from per-sample range checks
//!   to stateful plateau grouping
//! - **Engine**: [`QcEngine`] applies the detectors in their fixed
//!   dependency order and returns the annotated series
//!
//! ## Usage
//!
//! ```ignore
//! use smqc::{QcEngine, QcOptions, QcSeries, Variable};
//!
//! let series = QcSeries::new(Variable::SoilMoisture, timestamps, values)
//!     .with_precipitation(precip);
//! let output = QcEngine::new(QcOptions {
//!     saturation_point: Some(42.7),
//!     ..QcOptions::default()
//! })
//! .run(series)?;
//! println!("{}", output.to_json()?);
//! ```

pub mod detectors;
pub mod engine;
pub mod error;
pub mod signal;
pub mod types;

// Re-export the engine surface
pub use engine::{run, QcEngine, QcOptions, QcOutput};

// Re-export commonly used types
pub use detectors::Internals;
pub use error::QcError;
pub use types::{Flag, FlagSet, QcRecord, QcSeries, Variable};
