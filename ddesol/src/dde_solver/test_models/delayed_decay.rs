use super::DdeSolverSolution;
use crate::dde_solver::equations::DdeRhs;
use crate::dde_solver::problem::DdeProblem;
use crate::history::History;
use crate::scalar::Scalar;
use nalgebra::{DMatrix, DVector};

// dy/dt = -y(t - 1) with y(t) = 1 for t <= 0. The method of steps gives a
// polynomial on each unit interval:
//   y(t) = sum_k (-1)^k (t - (k - 1))^k / k!   over terms with t >= k - 1
pub fn delayed_decay_problem<T: Scalar>(
    tf: f64,
) -> (DdeProblem<T, impl DdeRhs<T>>, DdeSolverSolution<T>) {
    let problem = DdeProblem::new(
        |_t: T, _y: &DVector<T>, z: &DMatrix<T>, dy: &mut DVector<T>| {
            dy[0] = -z[(0, 0)];
        },
        vec![T::one()],
        History::constant(DVector::from_element(1, T::one())),
        vec![T::zero(), T::from(tf)],
    );
    let mut soln = DdeSolverSolution::default();
    for i in 1..=(2.0 * tf) as usize {
        let t = i as f64 / 2.0;
        if t > tf {
            break;
        }
        soln.push(DVector::from_element(1, T::from(exact(t, 1.0))), T::from(t));
    }
    (problem, soln)
}

/// Method-of-steps series for dy/dt = -y(t - lag) with unit history.
pub fn exact(t: f64, lag: f64) -> f64 {
    let mut acc = 0.0;
    let mut factorial = 1.0;
    let mut k = 0usize;
    loop {
        let base = t - (k as f64 - 1.0) * lag;
        if base < 0.0 {
            break;
        }
        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
        acc += sign * base.powi(k as i32) / factorial;
        k += 1;
        factorial *= k as f64;
    }
    acc
}
