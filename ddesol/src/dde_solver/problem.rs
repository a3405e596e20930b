use crate::dde_solver::equations::DdeRhs;
use crate::dde_solver::events::EventSpec;
use crate::errors::DdeSolverError;
use crate::history::History;
use crate::scalar::Scalar;
use nalgebra::DVector;

/// A delay differential equation problem: right-hand side, constant positive
/// lags, the history on (-inf, t0], and the integration span.
///
/// `t_span` has at least two entries; entries between the first and last are
/// requested output times.
pub struct DdeProblem<T: Scalar, F: DdeRhs<T>> {
    pub rhs: F,
    pub lags: Vec<T>,
    pub history: History<T>,
    pub t_span: Vec<T>,
}

impl<T: Scalar, F: DdeRhs<T>> DdeProblem<T, F> {
    pub fn new(rhs: F, lags: Vec<T>, history: History<T>, t_span: Vec<T>) -> Self {
        Self {
            rhs,
            lags,
            history,
            t_span,
        }
    }
}

/// Scalar or per-component absolute tolerance.
#[derive(Debug, Clone)]
pub enum AbsTol<T: Scalar> {
    Scalar(T),
    Vector(DVector<T>),
}

pub struct DdeOptions<T: Scalar> {
    /// Relative tolerance; silently raised to 100*eps when below it.
    pub rtol: T,
    pub atol: AbsTol<T>,
    /// Control the Euclidean norm of the error instead of each component.
    pub norm_control: bool,
    /// Defaults to a tenth of the span.
    pub max_step: Option<T>,
    pub initial_step: Option<T>,
    /// Known discontinuity times of the history or the right-hand side,
    /// filtered to [t0 - tau_max, t_f].
    pub jumps: Vec<T>,
    /// Overrides history(t0), allowing a jump at the initial point.
    pub initial_y: Option<DVector<T>>,
    pub events: Option<EventSpec<T>>,
    /// Components passed to the output sink; all of them when `None`.
    pub output_sel: Option<Vec<usize>>,
    /// Number of emitted points per accepted step when the span has no
    /// interior entries.
    pub refine: usize,
    /// Log the run statistics on completion.
    pub stats: bool,
}

impl<T: Scalar> Default for DdeOptions<T> {
    fn default() -> Self {
        Self {
            rtol: T::from(1e-3),
            atol: AbsTol::Scalar(T::from(1e-6)),
            norm_control: false,
            max_step: None,
            initial_step: None,
            jumps: Vec::new(),
            initial_y: None,
            events: None,
            output_sel: None,
            refine: 1,
            stats: false,
        }
    }
}

/// Weighted norms shared by the error test, the fixed-point convergence test
/// and the initial step selection. The threshold is AbsTol/RelTol, guarding
/// the denominators against vanishing components.
pub(crate) struct Tolerances<T: Scalar> {
    pub rtol: T,
    pub threshold: DVector<T>,
    pub threshold_scalar: T,
    pub norm_control: bool,
}

impl<T: Scalar> Tolerances<T> {
    pub fn new(
        rtol: T,
        atol: &AbsTol<T>,
        nstates: usize,
        norm_control: bool,
    ) -> Result<Self, DdeSolverError> {
        let (threshold, threshold_scalar) = match atol {
            AbsTol::Scalar(a) => {
                if *a <= T::zero() {
                    return Err(DdeSolverError::option("AbsTol", "must be positive"));
                }
                (DVector::from_element(nstates, *a / rtol), *a / rtol)
            }
            AbsTol::Vector(a) => {
                if norm_control {
                    return Err(DdeSolverError::option(
                        "AbsTol",
                        "must be a scalar when NormControl is on",
                    ));
                }
                if a.len() != nstates {
                    return Err(DdeSolverError::shape(format!(
                        "AbsTol has length {} but the state has length {}",
                        a.len(),
                        nstates
                    )));
                }
                if a.iter().any(|&x| x <= T::zero()) {
                    return Err(DdeSolverError::option("AbsTol", "must be positive"));
                }
                (a.map(|x| x / rtol), T::zero())
            }
        };
        Ok(Self {
            rtol,
            threshold,
            threshold_scalar,
            norm_control,
        })
    }

    /// Norm of `v` weighted by max(|y|, |y_new|, threshold).
    pub fn error_norm(&self, y: &DVector<T>, y_new: &DVector<T>, v: &DVector<T>) -> T {
        if self.norm_control {
            let denom = y
                .norm()
                .max(y_new.norm())
                .max(self.threshold_scalar);
            v.norm() / denom
        } else {
            let mut acc = T::zero();
            for i in 0..v.len() {
                let denom = y[i].abs().max(y_new[i].abs()).max(self.threshold[i]);
                acc = acc.max(v[i].abs() / denom);
            }
            acc
        }
    }

    /// Norm of `f` weighted by max(|y|, threshold), used to pick the initial
    /// step from the initial slope.
    pub fn rate_norm(&self, y: &DVector<T>, f: &DVector<T>) -> T {
        if self.norm_control {
            f.norm() / y.norm().max(self.threshold_scalar)
        } else {
            let mut acc = T::zero();
            for i in 0..f.len() {
                let denom = y[i].abs().max(self.threshold[i]);
                acc = acc.max(f[i].abs() / denom);
            }
            acc
        }
    }
}
