use super::DdeSolverSolution;
use crate::dde_solver::equations::DdeRhs;
use crate::dde_solver::problem::DdeProblem;
use crate::history::History;
use crate::scalar::Scalar;
use nalgebra::{DMatrix, DVector};

// dy/dt = +1 before t = 0.5 and -1 after, with a short lag present so a
// declared jump at 0.5 propagates through the discontinuity tree and the
// mesh lands on it exactly. The solution is the tent y = min(t, 1 - t).
pub fn jump_forcing_problem<T: Scalar>() -> (DdeProblem<T, impl DdeRhs<T>>, DdeSolverSolution<T>) {
    let problem = DdeProblem::new(
        |t: T, _y: &DVector<T>, _z: &DMatrix<T>, dy: &mut DVector<T>| {
            dy[0] = if t < T::from(0.5) { T::one() } else { -T::one() };
        },
        vec![T::from(0.2)],
        History::constant(DVector::from_element(1, T::zero())),
        vec![T::zero(), T::one()],
    );
    let mut soln = DdeSolverSolution::default();
    for &t in &[0.25f64, 0.5, 0.75, 1.0] {
        let value = t.min(1.0 - t);
        soln.push(DVector::from_element(1, T::from(value)), T::from(t));
    }
    (problem, soln)
}
