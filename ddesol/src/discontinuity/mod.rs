//! Propagation of derivative discontinuities through the lag set.
//!
//! A jump in some derivative at time v induces lower-order jumps at v + tau_j,
//! so the step sequence must hit v, v + tau_j, v + tau_i + tau_j, ... exactly up to the
//! tracked smoothness level. The list is built once before integration and
//! consumed by an advancing cursor.

use crate::scalar::Scalar;

pub const DEFAULT_SMOOTHNESS_LEVEL: usize = 4;
pub const JUMP_SMOOTHNESS_LEVEL: usize = 5;

fn coalesces<T: Scalar>(a: T, b: T) -> bool {
    (b - a).abs() <= T::from(10.0) * T::EPSILON * a.abs().max(b.abs())
}

/// Sort ascending and drop points within 10*eps relative spacing of the one
/// kept before them.
fn sort_coalesce<T: Scalar>(points: &mut Vec<T>) {
    points.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mut kept = 0;
    for i in 1..points.len() {
        if !coalesces(points[kept], points[i]) {
            kept += 1;
            points[kept] = points[i];
        }
    }
    points.truncate(if points.is_empty() { 0 } else { kept + 1 });
}

/// Build the discontinuity list for a run on [t0, tf].
///
/// Seeds are t0, user jumps, and carried-over discontinuities from a prior
/// solution, all restricted to [t0 - tau_max, tf]. Each level adds every seed
/// shifted by every lag, capped at tf. The returned list is ascending, has
/// t0 (and anything coalescing with it) removed, and ends with tf: the last
/// propagated point is replaced by tf when already within 10*eps of it,
/// otherwise tf is appended.
pub fn propagate_discontinuities<T: Scalar>(
    t0: T,
    tf: T,
    lags: &[T],
    jumps: &[T],
    carryover: &[T],
    level: usize,
) -> Vec<T> {
    let max_lag = lags
        .iter()
        .copied()
        .fold(T::zero(), |m, tau| m.max(tau));
    let lower = t0 - max_lag;

    let mut current = vec![t0];
    current.extend(jumps.iter().copied().filter(|&j| j >= lower && j <= tf));
    current.extend(carryover.iter().copied().filter(|&c| c >= lower && c <= tf));
    sort_coalesce(&mut current);

    let mut all = current.clone();
    for _ in 0..level {
        let mut next: Vec<T> = Vec::with_capacity(current.len() * lags.len());
        for &v in &current {
            for &tau in lags {
                let w = v + tau;
                if w <= tf {
                    next.push(w);
                }
            }
        }
        sort_coalesce(&mut next);
        if next.is_empty() {
            break;
        }
        all.extend(next.iter().copied());
        current = next;
    }
    sort_coalesce(&mut all);
    all.retain(|&d| d > t0 && !coalesces(t0, d));

    match all.last().copied() {
        Some(last) if coalesces(last, tf) => {
            let end = all.len() - 1;
            all[end] = tf;
        }
        _ => all.push(tf),
    }
    all
}
