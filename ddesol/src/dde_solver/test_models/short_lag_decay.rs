use super::delayed_decay::exact;
use super::DdeSolverSolution;
use crate::dde_solver::equations::DdeRhs;
use crate::dde_solver::problem::DdeProblem;
use crate::history::History;
use crate::scalar::Scalar;
use nalgebra::{DMatrix, DVector};

// dy/dt = -y(t - 0.05) with unit history. The lag is well below the default
// maximum step, so accepted steps overrun it and the stepper's fixed-point
// iteration carries the integration.
pub fn short_lag_decay_problem<T: Scalar>(
) -> (DdeProblem<T, impl DdeRhs<T>>, DdeSolverSolution<T>) {
    let lag = 0.05;
    let problem = DdeProblem::new(
        |_t: T, _y: &DVector<T>, z: &DMatrix<T>, dy: &mut DVector<T>| {
            dy[0] = -z[(0, 0)];
        },
        vec![T::from(lag)],
        History::constant(DVector::from_element(1, T::one())),
        vec![T::zero(), T::one()],
    );
    let mut soln = DdeSolverSolution::default();
    for &t in &[0.25, 0.5, 0.75, 1.0] {
        soln.push(DVector::from_element(1, T::from(exact(t, lag))), T::from(t));
    }
    (problem, soln)
}
