use super::DdeSolverSolution;
use crate::dde_solver::equations::DdeRhs;
use crate::dde_solver::events::{EventDirection, EventSpec};
use crate::dde_solver::problem::DdeProblem;
use crate::history::History;
use crate::scalar::Scalar;
use nalgebra::{DMatrix, DVector};

// dy/dt = 1 from y(0) = 0, with a terminal upward crossing of y = 0.7. The
// run must stop at t = 0.7 with the event logged as component 0.
pub fn ramp_event_problem<T: Scalar>(
) -> (DdeProblem<T, impl DdeRhs<T>>, EventSpec<T>, DdeSolverSolution<T>) {
    let problem = DdeProblem::new(
        |_t: T, _y: &DVector<T>, _z: &DMatrix<T>, dy: &mut DVector<T>| {
            dy[0] = T::one();
        },
        vec![T::from(0.1)],
        History::constant(DVector::from_element(1, T::zero())),
        vec![T::zero(), T::one()],
    );
    let events = EventSpec::new(
        |_t: T, y: &DVector<T>, _z: &DMatrix<T>| DVector::from_element(1, y[0] - T::from(0.7)),
        vec![true],
        vec![EventDirection::Increasing],
    );
    let mut soln = DdeSolverSolution::default();
    soln.push(DVector::from_element(1, T::from(0.7)), T::from(0.7));
    (problem, events, soln)
}
