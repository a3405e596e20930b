//! Event localisation on the dense output of an accepted step.
//!
//! After a step is accepted, each event component is checked for a sign
//! change across the step and, where the direction filter permits, the
//! crossing is localised with a bracketed secant/bisection hybrid on the
//! Hermite interpolant. Terminal events truncate the step.

use crate::dde_solver::solution::EventLog;
use crate::history::History;
use crate::interp::hermite_eval;
use crate::lag::LagSampler;
use crate::mesh::MeshView;
use crate::scalar::Scalar;
use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDirection {
    /// Report crossings in either direction.
    Any,
    /// Only report where the event function is increasing.
    Increasing,
    /// Only report where the event function is decreasing.
    Decreasing,
}

impl EventDirection {
    fn permits<T: Scalar>(self, v_prev: T, v_new: T) -> bool {
        match self {
            Self::Any => true,
            Self::Increasing => v_new >= v_prev,
            Self::Decreasing => v_new <= v_prev,
        }
    }
}

/// Event functions with per-component terminal and direction settings.
///
/// The callback returns one value per event component; a zero crossing of
/// component i is an event of index i.
pub struct EventSpec<T: Scalar> {
    f: Box<dyn Fn(T, &DVector<T>, &DMatrix<T>) -> DVector<T>>,
    terminal: Vec<bool>,
    direction: Vec<EventDirection>,
}

impl<T: Scalar> EventSpec<T> {
    pub fn new(
        f: impl Fn(T, &DVector<T>, &DMatrix<T>) -> DVector<T> + 'static,
        terminal: Vec<bool>,
        direction: Vec<EventDirection>,
    ) -> Self {
        Self {
            f: Box::new(f),
            terminal,
            direction,
        }
    }

    pub fn nevents(&self) -> usize {
        self.terminal.len()
    }

    pub fn terminal(&self) -> &[bool] {
        &self.terminal
    }

    pub fn direction(&self) -> &[EventDirection] {
        &self.direction
    }

    pub fn call(&self, t: T, y: &DVector<T>, z: &DMatrix<T>) -> DVector<T> {
        (self.f)(t, y, z)
    }
}

/// One located event.
#[derive(Debug, Clone)]
pub(crate) struct EventRecord<T: Scalar> {
    pub t: T,
    pub y: DVector<T>,
    pub index: usize,
    pub terminal: bool,
}

impl<T: Scalar> EventLog<T> {
    pub(crate) fn record(&mut self, event: &EventRecord<T>) {
        self.xe.push(event.t);
        self.ye.push(event.y.clone());
        self.ie.push(event.index);
    }
}

/// Locate the zero crossings of the event functions inside an accepted step
/// from (t, y, yp) to (t_new, y_new, yp_new), given the event values at both
/// ends. Returned records are in ascending time order, ties broken by
/// component index; everything after the earliest terminal event is dropped.
#[allow(clippy::too_many_arguments)]
pub(crate) fn locate_events<T: Scalar>(
    spec: &EventSpec<T>,
    lags: &LagSampler<T>,
    history: &History<T>,
    v_prev: &DVector<T>,
    v_new: &DVector<T>,
    t: T,
    y: &DVector<T>,
    yp: &DVector<T>,
    t_new: T,
    y_new: &DVector<T>,
    yp_new: &DVector<T>,
    view: &MeshView<'_, T>,
    z: &mut DMatrix<T>,
) -> Vec<EventRecord<T>> {
    let h = t_new - t;
    let mut records: Vec<EventRecord<T>> = Vec::new();
    for i in 0..spec.nevents() {
        let crosses = (v_prev[i] < T::zero() && v_new[i] >= T::zero())
            || (v_prev[i] > T::zero() && v_new[i] <= T::zero());
        if !crosses || !spec.direction()[i].permits(v_prev[i], v_new[i]) {
            continue;
        }
        let mut g = |s: T| -> T {
            let ys = hermite_eval(t, h, y, yp, y_new, yp_new, s);
            lags.sample(s, view, history, z);
            spec.call(s, &ys, z)[i]
        };
        let (te, _ge) = bracketed_root(&mut g, t, v_prev[i], t_new, v_new[i]);
        let ye = hermite_eval(t, h, y, yp, y_new, yp_new, te);
        records.push(EventRecord {
            t: te,
            y: ye,
            index: i,
            terminal: spec.terminal()[i],
        });
    }
    records.sort_by(|a, b| {
        a.t.partial_cmp(&b.t)
            .unwrap()
            .then(a.index.cmp(&b.index))
    });
    if let Some(cut) = records.iter().position(|r| r.terminal) {
        let te = records[cut].t;
        records.retain(|r| r.t <= te);
    }
    records
}

/// Bracketed scalar root finding: a clamped secant step per iteration with
/// the bracket maintained bisection-style, stopping once the bracket is a
/// few ulps wide. `ga` must be nonzero and of opposite sign to `gb` (zero
/// `gb` is allowed: the root is then at `b`).
fn bracketed_root<T: Scalar>(
    g: &mut impl FnMut(T) -> T,
    mut a: T,
    mut ga: T,
    mut b: T,
    mut gb: T,
) -> (T, T) {
    let tol = (T::from(128.0) * a.ulp().max(b.ulp())).min((b - a).abs());
    for _ in 0..64 {
        if (b - a).abs() <= tol || gb == T::zero() {
            break;
        }
        let lo = a + T::from(0.5) * tol;
        let hi = b - T::from(0.5) * tol;
        let mut c = if ga != gb {
            b - gb * (b - a) / (gb - ga)
        } else {
            (a + b) * T::from(0.5)
        };
        if !(c >= lo && c <= hi) {
            c = (a + b) * T::from(0.5);
        }
        let gc = g(c);
        if (gc > T::zero()) == (ga > T::zero()) && gc != T::zero() {
            a = c;
            ga = gc;
        } else {
            b = c;
            gb = gc;
        }
    }
    (b, gb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::SolutionMesh;

    #[test]
    fn test_direction_filter() {
        assert!(EventDirection::Any.permits(-1.0, 1.0));
        assert!(EventDirection::Increasing.permits(-1.0, 1.0));
        assert!(!EventDirection::Increasing.permits(1.0, -1.0));
        assert!(EventDirection::Decreasing.permits(1.0, -1.0));
        assert!(!EventDirection::Decreasing.permits(-1.0, 1.0));
    }

    #[test]
    fn test_bracketed_root_linear() {
        let mut g = |s: f64| 2.0 * s - 1.0;
        let (root, val) = bracketed_root(&mut g, 0.0, -1.0, 1.0, 1.0);
        assert!((root - 0.5).abs() < 1e-12);
        assert!(val.abs() < 1e-10);
    }

    #[test]
    fn test_bracketed_root_cubic() {
        let mut g = |s: f64| (s - 0.3).powi(3);
        let g0 = g(0.0);
        let g1 = g(1.0);
        let (root, _) = bracketed_root(&mut g, 0.0, g0, 1.0, g1);
        assert!((root - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_locate_simple_crossing() {
        // y(t) = t on [0, 1]; the event y - 0.7 crosses upward at 0.7
        let mut mesh = SolutionMesh::new(1);
        mesh.push(0.0, DVector::from_element(1, 0.0), DVector::from_element(1, 1.0));
        mesh.push(1.0, DVector::from_element(1, 1.0), DVector::from_element(1, 1.0));
        let spec = EventSpec::new(
            |_t: f64, y: &DVector<f64>, _z: &DMatrix<f64>| DVector::from_element(1, y[0] - 0.7),
            vec![true],
            vec![EventDirection::Increasing],
        );
        let lags = LagSampler::new(vec![]);
        let history = History::constant(DVector::from_element(1, 0.0));
        let mut z = DMatrix::zeros(1, 0);
        let y = DVector::from_element(1, 0.0);
        let yp = DVector::from_element(1, 1.0);
        let y_new = DVector::from_element(1, 1.0);
        let yp_new = DVector::from_element(1, 1.0);
        let v_prev = DVector::from_element(1, -0.7);
        let v_new = DVector::from_element(1, 0.3);
        let records = locate_events(
            &spec, &lags, &history, &v_prev, &v_new, 0.0, &y, &yp, 1.0, &y_new, &yp_new,
            &mesh.view(), &mut z,
        );
        assert_eq!(records.len(), 1);
        assert!((records[0].t - 0.7).abs() < 1e-9);
        assert!((records[0].y[0] - 0.7).abs() < 1e-9);
        assert_eq!(records[0].index, 0);
        assert!(records[0].terminal);
    }

    #[test]
    fn test_direction_suppresses_crossing() {
        let spec = EventSpec::new(
            |_t: f64, y: &DVector<f64>, _z: &DMatrix<f64>| DVector::from_element(1, y[0] - 0.7),
            vec![false],
            vec![EventDirection::Decreasing],
        );
        let mut mesh = SolutionMesh::new(1);
        mesh.push(0.0, DVector::from_element(1, 0.0), DVector::from_element(1, 1.0));
        mesh.push(1.0, DVector::from_element(1, 1.0), DVector::from_element(1, 1.0));
        let lags = LagSampler::new(vec![]);
        let history = History::constant(DVector::from_element(1, 0.0));
        let mut z = DMatrix::zeros(1, 0);
        let y = DVector::from_element(1, 0.0);
        let yp = DVector::from_element(1, 1.0);
        let y_new = DVector::from_element(1, 1.0);
        let v_prev = DVector::from_element(1, -0.7);
        let v_new = DVector::from_element(1, 0.3);
        let records = locate_events(
            &spec, &lags, &history, &v_prev, &v_new, 0.0, &y, &yp, 1.0, &y_new, &yp,
            &mesh.view(), &mut z,
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_terminal_truncates_later_events() {
        // two components: a terminal crossing at 0.25 and another at 0.75
        let spec = EventSpec::new(
            |t: f64, _y: &DVector<f64>, _z: &DMatrix<f64>| {
                DVector::from_vec(vec![t - 0.25, t - 0.75])
            },
            vec![true, false],
            vec![EventDirection::Any, EventDirection::Any],
        );
        let mut mesh = SolutionMesh::new(1);
        mesh.push(0.0, DVector::from_element(1, 0.0), DVector::from_element(1, 1.0));
        mesh.push(1.0, DVector::from_element(1, 1.0), DVector::from_element(1, 1.0));
        let lags = LagSampler::new(vec![]);
        let history = History::constant(DVector::from_element(1, 0.0));
        let mut z = DMatrix::zeros(1, 0);
        let y = DVector::from_element(1, 0.0);
        let yp = DVector::from_element(1, 1.0);
        let y_new = DVector::from_element(1, 1.0);
        let v_prev = DVector::from_vec(vec![-0.25, -0.75]);
        let v_new = DVector::from_vec(vec![0.75, 0.25]);
        let records = locate_events(
            &spec, &lags, &history, &v_prev, &v_new, 0.0, &y, &yp, 1.0, &y_new, &yp,
            &mesh.view(), &mut z,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].index, 0);
        assert!(records[0].terminal);
        assert!((records[0].t - 0.25).abs() < 1e-9);
    }
}
