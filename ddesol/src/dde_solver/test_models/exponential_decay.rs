use super::DdeSolverSolution;
use crate::dde_solver::equations::DdeRhs;
use crate::dde_solver::problem::DdeProblem;
use crate::history::History;
use crate::scalar::Scalar;
use nalgebra::{DMatrix, DVector};

// dy/dt = -y without lags: the solver degenerates to a plain (2,3) pair
pub fn exponential_decay_problem<T: Scalar>() -> (DdeProblem<T, impl DdeRhs<T>>, DdeSolverSolution<T>)
{
    let problem = DdeProblem::new(
        |_t: T, y: &DVector<T>, _z: &DMatrix<T>, dy: &mut DVector<T>| {
            dy[0] = -y[0];
        },
        vec![],
        History::constant(DVector::from_element(1, T::one())),
        vec![T::zero(), T::one()],
    );
    let mut soln = DdeSolverSolution::default();
    for i in 0..=10 {
        let t = T::from(i as f64 / 10.0);
        soln.push(DVector::from_element(1, (-t).exp()), t);
    }
    (problem, soln)
}
