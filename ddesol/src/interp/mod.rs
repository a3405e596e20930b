//! Cubic Hermite dense output over a single mesh interval.
//!
//! The interpolant matches values and slopes at both interval endpoints, so
//! a mesh of (t, y, y') triples defines a C^1 piecewise-cubic solution. All
//! functions here are pure; callers pick the interval.

use crate::scalar::Scalar;
use nalgebra::DVector;

/// Evaluate the Hermite cubic on `[t, t + h]` at `s`.
///
/// With `sigma = (s - t) / h` the interpolant is
/// `y + h*sigma*(yp + sigma*(c + sigma*d))` where
/// `c = 3*slope - 2*yp - yp_new` and `d = yp + yp_new - 2*slope`.
/// Evaluating outside the interval extrapolates the cubic.
pub fn hermite_eval<T: Scalar>(
    t: T,
    h: T,
    y: &DVector<T>,
    yp: &DVector<T>,
    y_new: &DVector<T>,
    yp_new: &DVector<T>,
    s: T,
) -> DVector<T> {
    let sigma = (s - t) / h;
    let two = T::from(2.0);
    let three = T::from(3.0);
    let n = y.len();
    let mut out = DVector::zeros(n);
    for i in 0..n {
        let slope = (y_new[i] - y[i]) / h;
        let c = three * slope - two * yp[i] - yp_new[i];
        let d = yp[i] + yp_new[i] - two * slope;
        out[i] = y[i] + h * sigma * (yp[i] + sigma * (c + sigma * d));
    }
    out
}

/// Derivative of [`hermite_eval`] with respect to `s`.
pub fn hermite_deriv<T: Scalar>(
    t: T,
    h: T,
    y: &DVector<T>,
    yp: &DVector<T>,
    y_new: &DVector<T>,
    yp_new: &DVector<T>,
    s: T,
) -> DVector<T> {
    let sigma = (s - t) / h;
    let two = T::from(2.0);
    let three = T::from(3.0);
    let n = y.len();
    let mut out = DVector::zeros(n);
    for i in 0..n {
        let slope = (y_new[i] - y[i]) / h;
        let c = three * slope - two * yp[i] - yp_new[i];
        let d = yp[i] + yp_new[i] - two * slope;
        out[i] = yp[i] + sigma * (two * c + three * d * sigma);
    }
    out
}

/// Evaluate the interpolant at several query points at once.
pub fn hermite_eval_many<T: Scalar>(
    t: T,
    h: T,
    y: &DVector<T>,
    yp: &DVector<T>,
    y_new: &DVector<T>,
    yp_new: &DVector<T>,
    ss: &[T],
) -> Vec<DVector<T>> {
    ss.iter()
        .map(|&s| hermite_eval(t, h, y, yp, y_new, yp_new, s))
        .collect()
}
