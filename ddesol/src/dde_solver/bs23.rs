//! One attempt of the Bogacki-Shampine (2,3) pair on a delay system.
//!
//! The pair is FSAL: the last stage of an accepted step is the first stage
//! of the next. When the step is longer than the smallest lag, the delayed
//! arguments of the stages fall inside the step itself; the attempt then
//! runs a short fixed-point iteration, extending the mesh view with the
//! tentative endpoint and recomputing the stages until successive endpoint
//! iterates agree.

use crate::dde_solver::equations::DdeRhs;
use crate::dde_solver::problem::Tolerances;
use crate::dde_solver::solution::Statistics;
use crate::history::History;
use crate::lag::LagSampler;
use crate::mesh::MeshView;
use crate::scalar::Scalar;
use nalgebra::{DMatrix, DVector};

/// Butcher data of the (2,3) pair, with the embedded error weights applied
/// to all four stages.
pub(crate) struct Tableau<T: Scalar> {
    pub c2: T,
    pub c3: T,
    pub a21: T,
    pub a31: T,
    pub a32: T,
    pub b1: T,
    pub b2: T,
    pub b3: T,
    pub e: [T; 4],
}

impl<T: Scalar> Tableau<T> {
    pub fn bs23() -> Self {
        Self {
            c2: T::from(1.0 / 2.0),
            c3: T::from(3.0 / 4.0),
            a21: T::from(1.0 / 2.0),
            a31: T::zero(),
            a32: T::from(3.0 / 4.0),
            b1: T::from(2.0 / 9.0),
            b2: T::from(1.0 / 3.0),
            b3: T::from(4.0 / 9.0),
            e: [
                T::from(-5.0 / 72.0),
                T::from(1.0 / 12.0),
                T::from(1.0 / 9.0),
                T::from(-1.0 / 8.0),
            ],
        }
    }
}

pub(crate) enum StepAttempt<T: Scalar> {
    Accepted {
        y_new: DVector<T>,
        p_new: DVector<T>,
        err: T,
    },
    ErrorTooLarge {
        err: T,
    },
    IterationFailed,
}

pub(crate) struct Bs23Stepper<T: Scalar> {
    tableau: Tableau<T>,
    max_iter: usize,
}

impl<T: Scalar> Bs23Stepper<T> {
    const MAX_ITER: usize = 5;

    pub fn new() -> Self {
        Self {
            tableau: Tableau::bs23(),
            max_iter: Self::MAX_ITER,
        }
    }

    /// Attempt one step from (t, y) with slope p1 = f(t, y, Z(t)) to
    /// `t_new = t + h`.
    #[allow(clippy::too_many_arguments)]
    pub fn try_step<F: DdeRhs<T>>(
        &self,
        rhs: &F,
        lags: &LagSampler<T>,
        history: &History<T>,
        tol: &Tolerances<T>,
        t: T,
        y: &DVector<T>,
        p1: &DVector<T>,
        h: T,
        t_new: T,
        view: &MeshView<'_, T>,
        z: &mut DMatrix<T>,
        stats: &mut Statistics,
    ) -> StepAttempt<T> {
        let n = y.len();
        let mut p2 = DVector::zeros(n);
        let mut p3 = DVector::zeros(n);
        let mut p4 = DVector::zeros(n);
        let mut y_new = DVector::zeros(n);

        // with the step inside the smallest lag every delayed argument lies
        // at or before t and one sweep is exact; otherwise this first sweep
        // extrapolates the mesh past its end and seeds the iteration
        let implicit = lags.min_lag().map_or(false, |min_lag| min_lag < h);
        self.stages(
            rhs, lags, history, t, y, p1, h, t_new, view, z, &mut p2, &mut p3, &mut p4,
            &mut y_new, stats,
        );
        if implicit {
            let mut converged = false;
            for _ in 0..self.max_iter {
                let tail_y = y_new.clone();
                let tail_p = p4.clone();
                let extended = view.with_tail(t_new, &tail_y, &tail_p);
                self.stages(
                    rhs, lags, history, t, y, p1, h, t_new, &extended, z, &mut p2, &mut p3,
                    &mut p4, &mut y_new, stats,
                );
                let diff = &y_new - &tail_y;
                let err_it = tol.error_norm(y, &y_new, &diff);
                if err_it <= T::from(0.1) * tol.rtol {
                    converged = true;
                    break;
                }
            }
            if !converged {
                return StepAttempt::IterationFailed;
            }
        }

        let mut err_vec = DVector::zeros(n);
        let e = &self.tableau.e;
        for i in 0..n {
            err_vec[i] = h * (e[0] * p1[i] + e[1] * p2[i] + e[2] * p3[i] + e[3] * p4[i]);
        }
        let err = tol.error_norm(y, &y_new, &err_vec);
        if err > tol.rtol {
            StepAttempt::ErrorTooLarge { err }
        } else {
            StepAttempt::Accepted {
                y_new,
                p_new: p4,
                err,
            }
        }
    }

    /// One sweep of stages 2-4 against the given mesh view.
    #[allow(clippy::too_many_arguments)]
    fn stages<F: DdeRhs<T>>(
        &self,
        rhs: &F,
        lags: &LagSampler<T>,
        history: &History<T>,
        t: T,
        y: &DVector<T>,
        p1: &DVector<T>,
        h: T,
        t_new: T,
        view: &MeshView<'_, T>,
        z: &mut DMatrix<T>,
        p2: &mut DVector<T>,
        p3: &mut DVector<T>,
        p4: &mut DVector<T>,
        y_new: &mut DVector<T>,
        stats: &mut Statistics,
    ) {
        let tab = &self.tableau;
        let t2 = t + tab.c2 * h;
        let t3 = t + tab.c3 * h;

        let mut arg = y.clone();
        arg.axpy(h * tab.a21, p1, T::one());
        lags.sample(t2, view, history, z);
        rhs.call_inplace(t2, &arg, z, p2);

        arg.copy_from(y);
        arg.axpy(h * tab.a31, p1, T::one());
        arg.axpy(h * tab.a32, p2, T::one());
        lags.sample(t3, view, history, z);
        rhs.call_inplace(t3, &arg, z, p3);

        y_new.copy_from(y);
        y_new.axpy(h * tab.b1, p1, T::one());
        y_new.axpy(h * tab.b2, p2, T::one());
        y_new.axpy(h * tab.b3, p3, T::one());
        lags.sample(t_new, view, history, z);
        rhs.call_inplace(t_new, y_new, z, p4);

        stats.nfevals += 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dde_solver::problem::AbsTol;
    use crate::mesh::SolutionMesh;

    fn tolerances(rtol: f64) -> Tolerances<f64> {
        Tolerances::new(rtol, &AbsTol::Scalar(1e-6), 1, false).unwrap()
    }

    #[test]
    fn test_error_weights_sum_to_zero() {
        let tab = Tableau::<f64>::bs23();
        let sum: f64 = tab.e.iter().sum();
        assert!(sum.abs() < 1e-16);
        // third-order weights are a convex combination
        assert!((tab.b1 + tab.b2 + tab.b3 - 1.0).abs() < 1e-16);
    }

    #[test]
    fn test_explicit_step_exponential_decay() {
        // y' = -y without lags: a single (2,3) step must land close to
        // exp(-h) and report a small error estimate
        let rhs = |_t: f64, y: &DVector<f64>, _z: &DMatrix<f64>, dy: &mut DVector<f64>| {
            dy[0] = -y[0];
        };
        let stepper = Bs23Stepper::new();
        let lags = LagSampler::new(vec![]);
        let history = History::constant(DVector::from_element(1, 1.0));
        let tol = tolerances(1e-6);
        let mut mesh = SolutionMesh::new(1);
        let y0 = DVector::from_element(1, 1.0);
        let p1 = DVector::from_element(1, -1.0);
        mesh.push(0.0, y0.clone(), p1.clone());
        let mut z = DMatrix::zeros(1, 0);
        let mut stats = Statistics::default();
        let h = 0.01;
        match stepper.try_step(
            &rhs,
            &lags,
            &history,
            &tol,
            0.0,
            &y0,
            &p1,
            h,
            h,
            &mesh.view(),
            &mut z,
            &mut stats,
        ) {
            StepAttempt::Accepted { y_new, p_new, err } => {
                assert!((y_new[0] - (-h).exp()).abs() < 1e-9);
                assert!((p_new[0] + y_new[0]).abs() < 1e-15);
                assert!(err <= 1e-6);
            }
            _ => panic!("step rejected"),
        }
        assert_eq!(stats.nfevals, 3);
    }

    #[test]
    fn test_large_error_rejected() {
        // a very coarse step on y' = -100 y fails the error test
        let rhs = |_t: f64, y: &DVector<f64>, _z: &DMatrix<f64>, dy: &mut DVector<f64>| {
            dy[0] = -100.0 * y[0];
        };
        let stepper = Bs23Stepper::new();
        let lags = LagSampler::new(vec![]);
        let history = History::constant(DVector::from_element(1, 1.0));
        let tol = tolerances(1e-6);
        let mut mesh = SolutionMesh::new(1);
        let y0 = DVector::from_element(1, 1.0);
        let p1 = DVector::from_element(1, -100.0);
        mesh.push(0.0, y0.clone(), p1.clone());
        let mut z = DMatrix::zeros(1, 0);
        let mut stats = Statistics::default();
        match stepper.try_step(
            &rhs,
            &lags,
            &history,
            &tol,
            0.0,
            &y0,
            &p1,
            0.5,
            0.5,
            &mesh.view(),
            &mut z,
            &mut stats,
        ) {
            StepAttempt::ErrorTooLarge { err } => assert!(err > 1e-6),
            _ => panic!("coarse step should fail the error test"),
        }
    }

    #[test]
    fn test_iteration_refines_short_lag_step() {
        // y(t) = t solves y'(t) = 1 + y(t - 0.1) - (t - 0.1) from the
        // history phi(t) = t. Stepping from 0.2 with h = 0.3 > tau queries
        // the solution inside the step, so the fixed-point path runs: the
        // first sweep extrapolates, the refinement sweep interpolates
        // through the tentative endpoint, and both reproduce the linear
        // solution exactly
        let rhs = |t: f64, _y: &DVector<f64>, z: &DMatrix<f64>, dy: &mut DVector<f64>| {
            dy[0] = 1.0 + z[(0, 0)] - (t - 0.1);
        };
        let stepper = Bs23Stepper::new();
        let lags = LagSampler::new(vec![0.1]);
        let history = History::function(|t: f64| DVector::from_element(1, t));
        let tol = tolerances(1e-3);
        let mut mesh = SolutionMesh::new(1);
        for &t in &[0.0, 0.1, 0.2] {
            mesh.push(t, DVector::from_element(1, t), DVector::from_element(1, 1.0));
        }
        let mut z = DMatrix::zeros(1, 1);
        let mut stats = Statistics::default();
        let p1 = DVector::from_element(1, 1.0);
        let y = DVector::from_element(1, 0.2);
        match stepper.try_step(
            &rhs,
            &lags,
            &history,
            &tol,
            0.2,
            &y,
            &p1,
            0.3,
            0.5,
            &mesh.view(),
            &mut z,
            &mut stats,
        ) {
            StepAttempt::Accepted { y_new, p_new, err } => {
                assert!((y_new[0] - 0.5).abs() < 1e-12);
                assert!((p_new[0] - 1.0).abs() < 1e-12);
                assert!(err < 1e-12);
            }
            _ => panic!("iterated step should be accepted"),
        }
        // the initial sweep plus at least one refinement sweep
        assert!(stats.nfevals >= 6);
    }
}
