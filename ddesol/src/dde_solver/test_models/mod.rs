//! Fixture problems with semi-analytic solution points, used by the solver
//! tests.

pub mod delayed_decay;
pub mod exponential_decay;
pub mod jump_forcing;
pub mod ramp_event;
pub mod short_lag_decay;

use crate::scalar::Scalar;
use nalgebra::DVector;

pub struct SolutionPoint<T: Scalar> {
    pub state: DVector<T>,
    pub t: T,
}

pub struct DdeSolverSolution<T: Scalar> {
    pub solution_points: Vec<SolutionPoint<T>>,
}

impl<T: Scalar> Default for DdeSolverSolution<T> {
    fn default() -> Self {
        Self {
            solution_points: Vec::new(),
        }
    }
}

impl<T: Scalar> DdeSolverSolution<T> {
    pub fn push(&mut self, state: DVector<T>, t: T) {
        self.solution_points.push(SolutionPoint { state, t });
    }
}
