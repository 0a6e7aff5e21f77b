//! Signal primitives shared by the detectors
//!
//! - `rolling`: windowed statistics with `min_periods` support and explicit
//!   missing-marker handling
//! - `savgol`: closed-form Savitzky–Golay 3/2 derivatives

pub mod rolling;
pub mod savgol;

pub use rolling::{
    checked_div, diff, rolling_max, rolling_mean, rolling_mean_centered, rolling_min, rolling_std,
    rolling_sum, rolling_var, round_to, shift,
};
pub use savgol::{derivatives, Derivatives};
