//! Savitzky–Golay derivatives of the soil moisture signal
//!
//! Window 3, polynomial order 2, nearest-value edge extension. At that
//! geometry the filter collapses to closed-form stencils, so no generic
//! filter machinery is needed:
//!
//! - first derivative:  `(x[i+1] − x[i−1]) / 2`
//! - second derivative: `x[i−1] − 2·x[i] + x[i+1]`
//!
//! A missing sample propagates to every output the 3-point stencil touches.

/// First and second Savitzky–Golay derivatives, computed once per run and
/// shared by the dynamical detectors.
#[derive(Debug, Clone)]
pub struct Derivatives {
    pub deriv1: Vec<f64>,
    pub deriv2: Vec<f64>,
}

/// Compute both derivative orders with nearest-edge extension.
pub fn derivatives(x: &[f64]) -> Derivatives {
    let n = x.len();
    let mut deriv1 = vec![f64::NAN; n];
    let mut deriv2 = vec![f64::NAN; n];
    for i in 0..n {
        let prev = if i == 0 { x[0] } else { x[i - 1] };
        let next = if i + 1 == n { x[n - 1] } else { x[i + 1] };
        deriv1[i] = (next - prev) / 2.0;
        deriv2[i] = prev - 2.0 * x[i] + next;
    }
    Derivatives { deriv1, deriv2 }
}
