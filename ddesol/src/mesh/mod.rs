//! Append-only solution mesh and read-only views over it.
//!
//! The mesh is the ordered sequence of accepted (t, y, y') triples. It only
//! ever grows by appending; dense output and delayed-argument sampling read
//! it through [`MeshView`], which can carry one extra tentative triple so the
//! in-progress step can be interpolated without copying the mesh.

use crate::interp::{hermite_deriv, hermite_eval};
use crate::scalar::{IndexType, Scalar};
use nalgebra::DVector;

const CHUNK_STEPS: usize = 100;
const CHUNK_SCALARS: usize = 1 << 13;

pub struct SolutionMesh<T: Scalar> {
    times: Vec<T>,
    values: Vec<DVector<T>>,
    slopes: Vec<DVector<T>>,
    chunk: usize,
    window_start: IndexType,
}

impl<T: Scalar> SolutionMesh<T> {
    pub fn new(nstates: usize) -> Self {
        let chunk = CHUNK_STEPS.min(CHUNK_SCALARS / nstates.max(1)).max(1);
        Self {
            times: Vec::with_capacity(chunk),
            values: Vec::with_capacity(chunk),
            slopes: Vec::with_capacity(chunk),
            chunk,
            window_start: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn push(&mut self, t: T, y: DVector<T>, yp: DVector<T>) {
        debug_assert!(self.times.last().map_or(true, |&last| t > last));
        if self.times.len() == self.times.capacity() {
            self.times.reserve(self.chunk);
            self.values.reserve(self.chunk);
            self.slopes.reserve(self.chunk);
        }
        self.times.push(t);
        self.values.push(y);
        self.slopes.push(yp);
    }

    pub fn t(&self, i: IndexType) -> T {
        self.times[i]
    }

    pub fn y(&self, i: IndexType) -> &DVector<T> {
        &self.values[i]
    }

    pub fn yp(&self, i: IndexType) -> &DVector<T> {
        &self.slopes[i]
    }

    pub fn last_t(&self) -> T {
        *self.times.last().unwrap()
    }

    /// Advance the sliding window so that the exposed view still brackets
    /// every query time >= `cutoff`. The window never empties: at least the
    /// interval containing `cutoff` is retained, which also guards against
    /// a step ever exceeding the maximum the cutoff was computed from.
    pub fn advance_window(&mut self, cutoff: T) {
        while self.window_start + 2 < self.times.len()
            && self.times[self.window_start + 1] <= cutoff
        {
            self.window_start += 1;
        }
    }

    /// Read-only view from the current window start to the mesh end.
    pub fn view(&self) -> MeshView<'_, T> {
        MeshView {
            times: &self.times[self.window_start..],
            values: &self.values[self.window_start..],
            slopes: &self.slopes[self.window_start..],
            tail: None,
        }
    }

    pub fn into_parts(self) -> (Vec<T>, Vec<DVector<T>>, Vec<DVector<T>>) {
        (self.times, self.values, self.slopes)
    }
}

/// Borrowed (times, values, slopes) triple, optionally extended by one
/// tentative triple past the mesh end.
#[derive(Clone)]
pub struct MeshView<'a, T: Scalar> {
    times: &'a [T],
    values: &'a [DVector<T>],
    slopes: &'a [DVector<T>],
    tail: Option<(T, &'a DVector<T>, &'a DVector<T>)>,
}

impl<'a, T: Scalar> MeshView<'a, T> {
    pub fn with_tail<'b>(&'b self, t: T, y: &'b DVector<T>, yp: &'b DVector<T>) -> MeshView<'b, T> {
        MeshView {
            times: self.times,
            values: self.values,
            slopes: self.slopes,
            tail: Some((t, y, yp)),
        }
    }

    pub fn len(&self) -> usize {
        self.times.len() + usize::from(self.tail.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn t(&self, i: IndexType) -> T {
        if i < self.times.len() {
            self.times[i]
        } else {
            self.tail.unwrap().0
        }
    }

    pub fn y(&self, i: IndexType) -> &'a DVector<T> {
        if i < self.values.len() {
            &self.values[i]
        } else {
            self.tail.unwrap().1
        }
    }

    pub fn yp(&self, i: IndexType) -> &'a DVector<T> {
        if i < self.slopes.len() {
            &self.slopes[i]
        } else {
            self.tail.unwrap().2
        }
    }

    pub fn first_t(&self) -> T {
        self.t(0)
    }

    pub fn last_t(&self) -> T {
        self.t(self.len() - 1)
    }

    /// Index i of the interval with t(i) <= s < t(i+1). Queries past the end
    /// land in the last interval, so interpolating there extrapolates.
    pub fn bracket(&self, s: T) -> IndexType {
        let in_base = self.times.partition_point(|&t| t <= s);
        let i = (in_base + usize::from(
            self.tail.map_or(false, |(t, _, _)| t <= s),
        ))
        .saturating_sub(1);
        i.min(self.len() - 2)
    }

    /// Hermite interpolation on the interval bracketing `s`.
    pub fn interpolate(&self, s: T) -> DVector<T> {
        let i = self.bracket(s);
        let t = self.t(i);
        let h = self.t(i + 1) - t;
        hermite_eval(t, h, self.y(i), self.yp(i), self.y(i + 1), self.yp(i + 1), s)
    }

    /// Derivative of the interpolant on the interval bracketing `s`.
    pub fn interpolate_deriv(&self, s: T) -> DVector<T> {
        let i = self.bracket(s);
        let t = self.t(i);
        let h = self.t(i + 1) - t;
        hermite_deriv(t, h, self.y(i), self.yp(i), self.y(i + 1), self.yp(i + 1), s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh_of(times: &[f64]) -> SolutionMesh<f64> {
        let mut mesh = SolutionMesh::new(1);
        for &t in times {
            mesh.push(t, DVector::from_element(1, t), DVector::from_element(1, 1.0));
        }
        mesh
    }

    #[test]
    fn test_chunk_sizing() {
        assert_eq!(SolutionMesh::<f64>::new(1).chunk, 100);
        assert_eq!(SolutionMesh::<f64>::new(50).chunk, 100);
        assert_eq!(SolutionMesh::<f64>::new(1000).chunk, 8);
        assert_eq!(SolutionMesh::<f64>::new(100_000).chunk, 1);
    }

    #[test]
    fn test_bracket() {
        let mesh = mesh_of(&[0.0, 1.0, 2.0, 4.0]);
        let view = mesh.view();
        assert_eq!(view.bracket(0.0), 0);
        assert_eq!(view.bracket(0.5), 0);
        assert_eq!(view.bracket(1.0), 1);
        assert_eq!(view.bracket(3.9), 2);
        // at and past the final time: last interval (extrapolation)
        assert_eq!(view.bracket(4.0), 2);
        assert_eq!(view.bracket(7.0), 2);
    }

    #[test]
    fn test_bracket_with_tail() {
        let mesh = mesh_of(&[0.0, 1.0]);
        let y = DVector::from_element(1, 2.0);
        let yp = DVector::from_element(1, 1.0);
        let view = mesh.view();
        let ext = view.with_tail(2.0, &y, &yp);
        assert_eq!(ext.len(), 3);
        assert_eq!(ext.bracket(1.5), 1);
        assert_eq!(ext.bracket(2.0), 1);
        assert_eq!(ext.last_t(), 2.0);
        // linear data interpolates linearly through the tail interval
        let v = ext.interpolate(1.5);
        assert!((v[0] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_window_advance() {
        let mut mesh = mesh_of(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        mesh.advance_window(2.5);
        let view = mesh.view();
        assert_eq!(view.first_t(), 2.0);
        assert_eq!(view.len(), 3);
        // never advances past the last interval
        mesh.advance_window(100.0);
        assert_eq!(mesh.view().len(), 2);
        assert_eq!(mesh.view().first_t(), 3.0);
    }

    #[test]
    fn test_interpolate_knot_left_endpoint_exact() {
        let mesh = mesh_of(&[0.0, 1.0, 2.0]);
        let view = mesh.view();
        // knots other than the last bracket into the interval they start
        let v = view.interpolate(1.0);
        assert_eq!(v[0], 1.0);
    }
}
