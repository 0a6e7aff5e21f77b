//! Error surface for the QC engine
//!
//! Every variant is a format error in the contract sense: all are raised
//! before any flag is written, so a failed run never partially mutates the
//! input series. Detectors whose ancillary channel is absent no-op instead
//! of erroring; that outcome is logged, not surfaced here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QcError {
    #[error("input series is empty")]
    EmptySeries,

    #[error("column '{column}' has {actual} rows, expected {expected}")]
    ColumnLength {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("timestamps must increase in strict 1-hour steps (violation at index {0})")]
    IrregularGrid(usize),

    #[error("primary variable '{0}' is not in the thresholds table")]
    UnsupportedVariable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
