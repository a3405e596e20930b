//! Delayed-argument sampling.
//!
//! For a query time t the sampler produces the n-by-k matrix Z whose j-th
//! column is y(t - tau_j), dispatching each column to the history (left of the
//! mesh view), Hermite interpolation inside it, or extrapolation of its last
//! interval (queries inside the step being attempted).

use crate::history::History;
use crate::mesh::MeshView;
use crate::scalar::Scalar;
use nalgebra::DMatrix;

pub struct LagSampler<T: Scalar> {
    lags: Vec<T>,
    min_lag: Option<T>,
    max_lag: Option<T>,
}

impl<T: Scalar> LagSampler<T> {
    pub fn new(lags: Vec<T>) -> Self {
        let min_lag = lags
            .iter()
            .copied()
            .fold(None, |m: Option<T>, tau| Some(m.map_or(tau, |m| m.min(tau))));
        let max_lag = lags
            .iter()
            .copied()
            .fold(None, |m: Option<T>, tau| Some(m.map_or(tau, |m| m.max(tau))));
        Self {
            lags,
            min_lag,
            max_lag,
        }
    }

    pub fn nlags(&self) -> usize {
        self.lags.len()
    }

    pub fn lags(&self) -> &[T] {
        &self.lags
    }

    pub fn min_lag(&self) -> Option<T> {
        self.min_lag
    }

    pub fn max_lag(&self) -> Option<T> {
        self.max_lag
    }

    /// Fill `z` with the delayed arguments at `t_now`. Column order follows
    /// the lag order.
    pub fn sample(
        &self,
        t_now: T,
        view: &MeshView<'_, T>,
        history: &History<T>,
        z: &mut DMatrix<T>,
    ) {
        for (j, &tau) in self.lags.iter().enumerate() {
            let s = t_now - tau;
            let col = if view.len() < 2 || s < view.first_t() {
                history.evaluate(s)
            } else {
                view.interpolate(s)
            };
            z.column_mut(j).copy_from(&col);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::SolutionMesh;
    use nalgebra::DVector;

    #[test]
    fn test_min_max() {
        let sampler = LagSampler::new(vec![1.0, 0.2, 3.0]);
        assert_eq!(sampler.min_lag(), Some(0.2));
        assert_eq!(sampler.max_lag(), Some(3.0));
        assert_eq!(LagSampler::<f64>::new(vec![]).min_lag(), None);
    }

    #[test]
    fn test_sample_dispatch() {
        // mesh carries y(t) = t on [0, 2]; history is the constant -1
        let mut mesh = SolutionMesh::new(1);
        for &t in &[0.0, 1.0, 2.0] {
            mesh.push(t, DVector::from_element(1, t), DVector::from_element(1, 1.0));
        }
        let history = History::constant(DVector::from_element(1, -1.0));
        let sampler = LagSampler::new(vec![0.5, 3.0]);
        let mut z = DMatrix::zeros(1, 2);
        sampler.sample(2.0, &mesh.view(), &history, &mut z);
        // t - 0.5 = 1.5 interpolates the mesh, t - 3.0 = -1 is history
        assert!((z[(0, 0)] - 1.5).abs() < 1e-12);
        assert_eq!(z[(0, 1)], -1.0);
    }

    #[test]
    fn test_sample_no_lags() {
        let mesh = SolutionMesh::<f64>::new(1);
        let history = History::constant(DVector::from_element(1, 0.0));
        let sampler = LagSampler::new(vec![]);
        let mut z = DMatrix::zeros(1, 0);
        sampler.sample(0.0, &mesh.view(), &history, &mut z);
        assert_eq!(z.ncols(), 0);
    }
}
