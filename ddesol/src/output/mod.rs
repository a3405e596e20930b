//! Output emission to a user-supplied sink.
//!
//! The sink is a collaborator with three callbacks: `init` once before the
//! integration loop, `point` for each emitted (t, y) pair, and `done` once
//! on every exit path. `point` can stop the run cooperatively.

use crate::scalar::Scalar;
use nalgebra::DVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    Continue,
    Stop,
}

pub trait OutputSink<T: Scalar> {
    fn init(&mut self, t_span: (T, T), y0: &DVector<T>);
    fn point(&mut self, t: T, y: &DVector<T>) -> OutputStatus;
    fn done(&mut self);
}

/// Sink that appends every emitted point to owned vectors.
#[derive(Debug, Default)]
pub struct CollectSink<T: Scalar> {
    pub t: Vec<T>,
    pub y: Vec<DVector<T>>,
}

impl<T: Scalar> CollectSink<T> {
    pub fn new() -> Self {
        Self {
            t: Vec::new(),
            y: Vec::new(),
        }
    }
}

impl<T: Scalar> OutputSink<T> for CollectSink<T> {
    fn init(&mut self, _t_span: (T, T), _y0: &DVector<T>) {}

    fn point(&mut self, t: T, y: &DVector<T>) -> OutputStatus {
        self.t.push(t);
        self.y.push(y.clone());
        OutputStatus::Continue
    }

    fn done(&mut self) {}
}

/// How accepted steps are turned into emitted points.
#[derive(Debug, Clone)]
pub(crate) enum EmitPolicy<T: Scalar> {
    /// Emit only at the requested times (t_span longer than 2).
    RequestedTimes(Vec<T>),
    /// Emit every accepted step endpoint.
    EveryStep,
    /// Emit `refine - 1` equispaced interior points per step plus the
    /// endpoint.
    Refined(usize),
}

impl<T: Scalar> EmitPolicy<T> {
    pub fn for_span(t_span: &[T], refine: usize) -> Self {
        if t_span.len() > 2 {
            Self::RequestedTimes(t_span[1..].to_vec())
        } else if refine <= 1 {
            Self::EveryStep
        } else {
            Self::Refined(refine)
        }
    }
}

/// Calls `done` exactly once when dropped, so every exit path of the driver
/// (completion, terminal event, stop request, tolerance failure) closes the
/// sink.
pub(crate) struct SinkGuard<'a, T: Scalar> {
    sink: &'a mut dyn OutputSink<T>,
}

impl<'a, T: Scalar> SinkGuard<'a, T> {
    pub fn new(sink: &'a mut dyn OutputSink<T>, t_span: (T, T), y0: &DVector<T>) -> Self {
        sink.init(t_span, y0);
        Self { sink }
    }

    pub fn point(&mut self, t: T, y: &DVector<T>) -> OutputStatus {
        self.sink.point(t, y)
    }
}

impl<T: Scalar> Drop for SinkGuard<'_, T> {
    fn drop(&mut self) {
        self.sink.done();
    }
}
