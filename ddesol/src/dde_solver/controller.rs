use crate::scalar::Scalar;

/// Adaptive step-size control for the embedded (2,3) pair.
///
/// The error model is order 3, so factors use cube roots of error ratios.
/// Growth after a step is capped at 5x and only applied when the step saw no
/// failures; shrink factors are floored so a bad error estimate cannot
/// collapse the step in one go. The controller also snaps steps onto
/// approaching discontinuities and keeps the step away from the awkward
/// range (tau_min, 2*tau_min).
pub(crate) struct StepController<T: Scalar> {
    h: T,
    h_max: T,
    rtol: T,
    min_lag: Option<T>,
    had_failure: bool,
}

impl<T: Scalar> StepController<T> {
    pub fn new(h_max: T, rtol: T, min_lag: Option<T>) -> Self {
        Self {
            h: T::zero(),
            h_max,
            rtol,
            min_lag,
            had_failure: false,
        }
    }

    pub fn h(&self) -> T {
        self.h
    }

    pub fn h_max(&self) -> T {
        self.h_max
    }

    pub fn h_min(t: T) -> T {
        T::from(16.0) * t.ulp()
    }

    /// Pick the first step. Without a user guess this starts from the span,
    /// shortens so that h times the norm of f0 stays within the order-3 error target, and is
    /// then capped at half the smallest lag so the first step never queries
    /// inside itself.
    pub fn set_initial_step(&mut self, htry: Option<T>, t0: T, tf: T, rate: T) {
        let h_min = Self::h_min(t0);
        self.h = match htry {
            Some(htry) => self.h_max.min(h_min.max(htry)),
            None => {
                let mut h = self.h_max.min(tf - t0);
                let rh = rate / (T::from(0.8) * Scalar::cbrt(self.rtol));
                if h * rh > T::one() {
                    h = T::one() / rh;
                }
                h = h.max(h_min);
                if let Some(min_lag) = self.min_lag {
                    h = h.min(T::from(0.5) * min_lag);
                }
                h
            }
        };
    }

    /// Clamp the step into [h_min(t), h_max] at the top of a step and clear
    /// the failure flag.
    pub fn begin_step(&mut self, t: T) {
        self.h = self.h_max.min(Self::h_min(t).max(self.h));
        self.had_failure = false;
    }

    /// Look-ahead at the next tracked discontinuity, `delta` away. Within
    /// reach, the step is stretched (or shrunk) to land on it exactly;
    /// within twice the step, it is halved to avoid a sliver afterwards.
    /// Returns whether the step now targets the discontinuity.
    pub fn snap_to_discontinuity(&mut self, delta: T) -> bool {
        let mut hit = false;
        if (T::from(1.1) * self.h).min(self.h_max) >= delta {
            self.h = delta;
            hit = true;
        } else if T::from(2.0) * self.h >= delta {
            self.h = T::from(0.5) * delta;
        }
        if !hit {
            if let Some(min_lag) = self.min_lag {
                if min_lag < self.h && self.h < T::from(2.0) * min_lag {
                    self.h = min_lag;
                }
            }
        }
        hit
    }

    pub fn after_success(&mut self, err: T) {
        if !self.had_failure {
            let temp = T::from(1.25) * Scalar::cbrt(err / self.rtol);
            if temp > T::from(0.2) {
                self.h /= temp;
            } else {
                self.h *= T::from(5.0);
            }
        }
        self.h = self.h.min(self.h_max);
    }

    /// Shrink after a failed error test. Returns `false` when the step is
    /// already at its lower bound and the failure is fatal.
    pub fn after_error_failure(&mut self, t: T, err: T) -> bool {
        let h_min = Self::h_min(t);
        if self.h <= h_min {
            return false;
        }
        if !self.had_failure {
            self.had_failure = true;
            let factor = T::from(0.5).max(T::from(0.8) * Scalar::cbrt(self.rtol / err));
            self.h = h_min.max(self.h * factor);
        } else {
            self.h = h_min.max(T::from(0.5) * self.h);
        }
        true
    }

    /// Shrink after the fixed-point iteration failed to converge. Halves,
    /// but snaps down to tau_min when that would land in (tau_min, 2*tau_min), so
    /// the retry is explicit. Returns `false` when fatal.
    pub fn after_iteration_failure(&mut self, t: T) -> bool {
        if self.h <= Self::h_min(t) {
            return false;
        }
        self.had_failure = true;
        self.h *= T::from(0.5);
        if let Some(min_lag) = self.min_lag {
            if self.h < T::from(2.0) * min_lag {
                self.h = min_lag;
            }
        }
        true
    }
}
