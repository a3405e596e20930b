use crate::history::History;
use crate::interp::hermite_eval;
use crate::scalar::Scalar;
use nalgebra::DVector;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Statistics {
    pub nsteps: usize,
    pub nfailed: usize,
    pub nfevals: usize,
}

/// Why the integration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveReason {
    /// Reached the end of the time span.
    Completed,
    /// A terminal event truncated the run.
    TerminalEvent,
    /// The output sink requested a stop.
    OutputStop,
    /// The step size was driven to its lower bound with persistent
    /// failures; the solution holds everything accepted up to that point.
    ToleranceNotMet,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog<T: Scalar> {
    pub xe: Vec<T>,
    pub ye: Vec<DVector<T>>,
    pub ie: Vec<usize>,
}

impl<T: Scalar> EventLog<T> {
    pub fn len(&self) -> usize {
        self.xe.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xe.is_empty()
    }
}

/// The continuous piecewise-cubic solution of a run.
///
/// Self-sufficient for continuation (pass it back as the history of a new
/// problem starting at its final time) and for evaluation anywhere in its
/// span via [`DdeSolution::evaluate`].
#[derive(Debug, Clone)]
pub struct DdeSolution<T: Scalar> {
    pub solver: &'static str,
    pub x: Vec<T>,
    pub y: Vec<DVector<T>>,
    pub yp: Vec<DVector<T>>,
    /// The history source the mesh was integrated from; queries left of the
    /// mesh are answered by it.
    pub history: History<T>,
    pub discontinuities: Vec<T>,
    pub events: EventLog<T>,
    pub stats: Statistics,
    pub reason: SolveReason,
}

impl<T: Scalar> DdeSolution<T> {
    pub fn nstates(&self) -> usize {
        self.y.first().map_or(0, |y| y.len())
    }

    pub fn t_initial(&self) -> T {
        self.x[0]
    }

    pub fn t_final(&self) -> T {
        *self.x.last().unwrap()
    }

    pub fn y_final(&self) -> &DVector<T> {
        self.y.last().unwrap()
    }

    /// Evaluate the solution at `s`.
    ///
    /// Mesh times return the stored value exactly; interior times use the
    /// Hermite interpolant of the bracketing interval; times left of the
    /// mesh fall through to the history.
    pub fn evaluate(&self, s: T) -> DVector<T> {
        if s < self.x[0] {
            return self.history.evaluate(s);
        }
        let i = self.x.partition_point(|&t| t <= s);
        if i > 0 && self.x[i - 1] == s {
            return self.y[i - 1].clone();
        }
        if self.x.len() < 2 {
            return self.y[0].clone();
        }
        let i = i.saturating_sub(1).min(self.x.len() - 2);
        let t = self.x[i];
        let h = self.x[i + 1] - t;
        hermite_eval(t, h, &self.y[i], &self.yp[i], &self.y[i + 1], &self.yp[i + 1], s)
    }

    pub fn evaluate_many(&self, ss: &[T]) -> Vec<DVector<T>> {
        ss.iter().map(|&s| self.evaluate(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_solution() -> DdeSolution<f64> {
        // y(t) = t on [0, 2]
        DdeSolution {
            solver: "bs23",
            x: vec![0.0, 1.0, 2.0],
            y: vec![
                DVector::from_element(1, 0.0),
                DVector::from_element(1, 1.0),
                DVector::from_element(1, 2.0),
            ],
            yp: vec![
                DVector::from_element(1, 1.0),
                DVector::from_element(1, 1.0),
                DVector::from_element(1, 1.0),
            ],
            history: History::constant(DVector::from_element(1, -5.0)),
            discontinuities: vec![2.0],
            events: EventLog::default(),
            stats: Statistics::default(),
            reason: SolveReason::Completed,
        }
    }

    #[test]
    fn test_evaluate_knots_exact() {
        let sol = linear_solution();
        assert_eq!(sol.evaluate(0.0)[0], 0.0);
        assert_eq!(sol.evaluate(1.0)[0], 1.0);
        assert_eq!(sol.evaluate(2.0)[0], 2.0);
    }

    #[test]
    fn test_evaluate_interior_and_history() {
        let sol = linear_solution();
        assert!((sol.evaluate(0.25)[0] - 0.25).abs() < 1e-12);
        assert!((sol.evaluate(1.75)[0] - 1.75).abs() < 1e-12);
        assert_eq!(sol.evaluate(-0.1)[0], -5.0);
    }
}
