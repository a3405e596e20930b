use crate::scalar::Scalar;
use nalgebra::{DMatrix, DVector};

/// Right-hand side of the delay system y'(t) = f(t, y(t), Z(t)).
///
/// `z` has one column per lag, in lag order, holding y(t - tau_j). Any extra
/// user parameters are captured by the implementing closure; the solver
/// never inspects them.
pub trait DdeRhs<T: Scalar> {
    fn call_inplace(&self, t: T, y: &DVector<T>, z: &DMatrix<T>, dy: &mut DVector<T>);

    fn call(&self, t: T, y: &DVector<T>, z: &DMatrix<T>) -> DVector<T> {
        let mut dy = DVector::zeros(y.len());
        self.call_inplace(t, y, z, &mut dy);
        dy
    }
}

impl<T: Scalar, F> DdeRhs<T> for F
where
    F: Fn(T, &DVector<T>, &DMatrix<T>, &mut DVector<T>),
{
    fn call_inplace(&self, t: T, y: &DVector<T>, z: &DMatrix<T>, dy: &mut DVector<T>) {
        self(t, y, z, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_rhs() {
        let rhs = |_t: f64, y: &DVector<f64>, z: &DMatrix<f64>, dy: &mut DVector<f64>| {
            dy[0] = -y[0] + z[(0, 0)];
        };
        let y = DVector::from_element(1, 2.0);
        let z = DMatrix::from_element(1, 1, 0.5);
        let dy = rhs.call(0.0, &y, &z);
        assert_eq!(dy[0], -1.5);
    }
}
