//! Solution history on (-inf, t0].
//!
//! A delay system needs y(s) for times before the integration start. The
//! source is one of a constant vector, a user function, or a previously
//! computed solution (for continuation). The variant is fixed for the whole
//! run, so the tag check in `evaluate` is stable across the inner loops.

use crate::dde_solver::solution::DdeSolution;
use crate::scalar::Scalar;
use nalgebra::DVector;
use std::fmt;
use std::rc::Rc;

pub enum History<T: Scalar> {
    Constant(DVector<T>),
    Function(Rc<dyn Fn(T) -> DVector<T>>),
    Prior(Rc<DdeSolution<T>>),
}

impl<T: Scalar> History<T> {
    pub fn constant(c: DVector<T>) -> Self {
        Self::Constant(c)
    }

    pub fn function(f: impl Fn(T) -> DVector<T> + 'static) -> Self {
        Self::Function(Rc::new(f))
    }

    pub fn prior(solution: Rc<DdeSolution<T>>) -> Self {
        Self::Prior(solution)
    }

    pub fn evaluate(&self, s: T) -> DVector<T> {
        match self {
            Self::Constant(c) => c.clone(),
            Self::Function(f) => f(s),
            Self::Prior(solution) => solution.evaluate(s),
        }
    }

    /// The prior solution when continuing, otherwise `None`.
    pub fn prior_solution(&self) -> Option<&Rc<DdeSolution<T>>> {
        match self {
            Self::Prior(solution) => Some(solution),
            _ => None,
        }
    }
}

impl<T: Scalar> Clone for History<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Constant(c) => Self::Constant(c.clone()),
            Self::Function(f) => Self::Function(Rc::clone(f)),
            Self::Prior(solution) => Self::Prior(Rc::clone(solution)),
        }
    }
}

impl<T: Scalar> fmt::Debug for History<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(c) => f.debug_tuple("Constant").field(c).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Prior(solution) => f
                .debug_tuple("Prior")
                .field(&(solution.x.first(), solution.x.last()))
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant() {
        let h = History::constant(DVector::from_vec(vec![1.0, 2.0]));
        assert_eq!(h.evaluate(-3.0), DVector::from_vec(vec![1.0, 2.0]));
        assert_eq!(h.evaluate(0.0), DVector::from_vec(vec![1.0, 2.0]));
    }

    #[test]
    fn test_function() {
        let h = History::function(|t: f64| DVector::from_element(1, t * t));
        assert_eq!(h.evaluate(-2.0)[0], 4.0);
    }
}
