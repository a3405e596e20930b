//! ddesol is a library for solving delay differential equations (DDEs) with
//! constant positive lags,
//!
//! ```text
//! y'(t) = f(t, y(t), y(t - tau_1), ..., y(t - tau_k)),    t in [t0, tf],
//! ```
//!
//! given the solution on (-inf, t0] as a history. The integrator is the
//! explicit Bogacki-Shampine (2,3) pair with a cubic Hermite interpolant for
//! dense output, discontinuity tracking through the lag set, and a
//! fixed-point iteration for steps that overrun the smallest lag. Event
//! functions can be localised on the dense output, and a finished
//! [`DdeSolution`] can be evaluated anywhere in its span or passed back as
//! the history of a follow-up problem.
//!
//! ```
//! use ddesol::{solve, DdeOptions, DdeProblem, History};
//! use nalgebra::{DMatrix, DVector};
//!
//! // y'(t) = -y(t - 1) with y(t) = 1 for t <= 0
//! let problem = DdeProblem::new(
//!     |_t: f64, _y: &DVector<f64>, z: &DMatrix<f64>, dy: &mut DVector<f64>| {
//!         dy[0] = -z[(0, 0)];
//!     },
//!     vec![1.0],
//!     History::constant(DVector::from_element(1, 1.0)),
//!     vec![0.0, 2.0],
//! );
//! let solution = solve(&problem, DdeOptions::default()).unwrap();
//! // on [0, 1] the exact solution is 1 - t
//! assert!((solution.evaluate(1.0)[0]).abs() < 1e-3);
//! ```

pub mod dde_solver;
pub mod discontinuity;
pub mod errors;
pub mod history;
pub mod interp;
pub mod lag;
pub mod mesh;
pub mod output;
pub mod scalar;

pub use crate::dde_solver::equations::DdeRhs;
pub use crate::dde_solver::events::{EventDirection, EventSpec};
pub use crate::dde_solver::problem::{AbsTol, DdeOptions, DdeProblem};
pub use crate::dde_solver::solution::{DdeSolution, EventLog, SolveReason, Statistics};
pub use crate::dde_solver::{solve, solve_with_output};
pub use crate::errors::DdeSolverError;
pub use crate::history::History;
pub use crate::output::{CollectSink, OutputSink, OutputStatus};
pub use crate::scalar::{IndexType, Scalar};
