use nalgebra::RealField;
use std::fmt::Display;

pub type IndexType = usize;

/// Scalar type used throughout the solver.
///
/// The single type parameter fixes one floating precision for times, states,
/// right-hand sides and delayed arguments alike.
pub trait Scalar:
    nalgebra::Scalar + RealField + Copy + From<f64> + Into<f64> + Display + PartialOrd + Default
{
    const EPSILON: Self;
    const INFINITY: Self;

    /// Spacing of floating point numbers near `self`, floored at machine
    /// epsilon so that step-size lower bounds stay positive at t = 0.
    fn ulp(self) -> Self {
        Self::EPSILON * RealField::max(self.abs(), Self::one())
    }

    fn cbrt(self) -> Self {
        self.powf(Self::from(1.0 / 3.0))
    }
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const INFINITY: Self = f64::INFINITY;
}

#[cfg(test)]
mod tests {
    use super::Scalar;

    #[test]
    fn test_ulp() {
        assert_eq!(0.0.ulp(), f64::EPSILON);
        assert_eq!(0.5.ulp(), f64::EPSILON);
        assert_eq!(4.0.ulp(), 4.0 * f64::EPSILON);
        assert_eq!((-4.0).ulp(), 4.0 * f64::EPSILON);
    }

    #[test]
    fn test_cbrt() {
        assert!((Scalar::cbrt(8.0) - 2.0).abs() < 1e-12);
    }
}
