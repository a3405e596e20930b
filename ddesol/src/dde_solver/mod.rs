//! Adaptive solver for delay differential equations with constant lags.
//!
//! The driver owns the integration loop: it snaps steps onto tracked
//! discontinuities, invokes the (2,3) pair with its fixed-point iteration
//! for steps longer than the smallest lag, localises events on the dense
//! output, emits output, and finalises the solution record.

pub mod bs23;
pub mod controller;
pub mod equations;
pub mod events;
pub mod problem;
pub mod solution;
pub mod test_models;

use crate::discontinuity::{
    propagate_discontinuities, DEFAULT_SMOOTHNESS_LEVEL, JUMP_SMOOTHNESS_LEVEL,
};
use crate::errors::DdeSolverError;
use crate::interp::{hermite_deriv, hermite_eval};
use crate::lag::LagSampler;
use crate::mesh::SolutionMesh;
use crate::output::{EmitPolicy, OutputSink, OutputStatus, SinkGuard};
use crate::scalar::Scalar;
use bs23::{Bs23Stepper, StepAttempt};
use controller::StepController;
use equations::DdeRhs;
use events::locate_events;
use log::{info, warn};
use nalgebra::{DMatrix, DVector};
use problem::{DdeOptions, DdeProblem, Tolerances};
use solution::{DdeSolution, EventLog, SolveReason, Statistics};

/// Integrate the problem over its time span.
pub fn solve<T: Scalar, F: DdeRhs<T>>(
    problem: &DdeProblem<T, F>,
    options: DdeOptions<T>,
) -> Result<DdeSolution<T>, DdeSolverError> {
    solve_inner(problem, options, None)
}

/// Integrate the problem, emitting points to `sink` as the run proceeds.
///
/// The sink's `init` is called once before the first step and `done` once on
/// every exit path; `point` may stop the run by returning
/// [`OutputStatus::Stop`].
pub fn solve_with_output<T: Scalar, F: DdeRhs<T>>(
    problem: &DdeProblem<T, F>,
    options: DdeOptions<T>,
    sink: &mut dyn OutputSink<T>,
) -> Result<DdeSolution<T>, DdeSolverError> {
    solve_inner(problem, options, Some(sink))
}

fn solve_inner<T: Scalar, F: DdeRhs<T>>(
    problem: &DdeProblem<T, F>,
    options: DdeOptions<T>,
    sink: Option<&mut dyn OutputSink<T>>,
) -> Result<DdeSolution<T>, DdeSolverError> {
    let t_span = &problem.t_span;
    if t_span.len() < 2 {
        return Err(DdeSolverError::shape(
            "t_span must have at least two entries",
        ));
    }
    let t0 = t_span[0];
    let tf = *t_span.last().unwrap();
    if tf <= t0 {
        return Err(DdeSolverError::shape(format!(
            "t_span must end after it starts, got t0 = {} and tf = {}",
            t0, tf
        )));
    }
    for w in t_span.windows(2) {
        if w[1] <= w[0] {
            return Err(DdeSolverError::shape(
                "t_span entries must be strictly increasing",
            ));
        }
    }
    for (j, &tau) in problem.lags.iter().enumerate() {
        if tau <= T::zero() {
            return Err(DdeSolverError::shape(format!(
                "lag {} must be strictly positive, got {}",
                j, tau
            )));
        }
    }

    let mut rtol = options.rtol;
    if rtol <= T::zero() {
        return Err(DdeSolverError::option("RelTol", "must be positive"));
    }
    let rtol_floor = T::from(100.0) * T::EPSILON;
    if rtol < rtol_floor {
        warn!("RelTol raised to {}", rtol_floor);
        rtol = rtol_floor;
    }
    if options.max_step.map_or(false, |h| h <= T::zero()) {
        return Err(DdeSolverError::option("MaxStep", "must be positive"));
    }
    if options.initial_step.map_or(false, |h| h <= T::zero()) {
        return Err(DdeSolverError::option("InitialStep", "must be positive"));
    }
    if options.refine == 0 {
        return Err(DdeSolverError::option("Refine", "must be at least 1"));
    }
    if let Some(prior) = problem.history.prior_solution() {
        if prior.t_final() != t0 {
            return Err(DdeSolverError::ContinuationMismatch {
                expected: t0.into(),
                found: prior.t_final().into(),
            });
        }
    }
    if let Some(spec) = &options.events {
        if spec.terminal().len() != spec.direction().len() {
            return Err(DdeSolverError::shape(format!(
                "events declare {} terminal flags but {} directions",
                spec.terminal().len(),
                spec.direction().len()
            )));
        }
    }

    let history_y0 = problem.history.evaluate(t0);
    let n = history_y0.len();
    let y0 = match &options.initial_y {
        Some(y) => {
            if y.len() != n {
                return Err(DdeSolverError::shape(format!(
                    "InitialY has length {} but the history has length {}",
                    y.len(),
                    n
                )));
            }
            y.clone()
        }
        None => history_y0,
    };
    if let Some(sel) = &options.output_sel {
        if let Some(&bad) = sel.iter().find(|&&i| i >= n) {
            return Err(DdeSolverError::option(
                "OutputSel",
                format!("component {} is out of range for a state of length {}", bad, n),
            ));
        }
    }

    let tol = Tolerances::new(rtol, &options.atol, n, options.norm_control)?;
    let lags = LagSampler::new(problem.lags.clone());
    let h_max = (tf - t0).min(options.max_step.unwrap_or(T::from(0.1) * (tf - t0)));

    let level = if !options.jumps.is_empty() || options.initial_y.is_some() {
        JUMP_SMOOTHNESS_LEVEL
    } else {
        DEFAULT_SMOOTHNESS_LEVEL
    };
    let carryover = problem
        .history
        .prior_solution()
        .map(|prior| prior.discontinuities.clone())
        .unwrap_or_default();
    let discont =
        propagate_discontinuities(t0, tf, &problem.lags, &options.jumps, &carryover, level);

    let mut stats = Statistics::default();
    let mut mesh = SolutionMesh::new(n);
    let mut z = DMatrix::zeros(n, lags.nlags());
    lags.sample(t0, &mesh.view(), &problem.history, &mut z);
    let mut f0 = DVector::zeros(n);
    problem.rhs.call_inplace(t0, &y0, &z, &mut f0);
    stats.nfevals += 1;

    let mut event_log = EventLog::default();
    let mut v_prev = match &options.events {
        Some(spec) => {
            let v = spec.call(t0, &y0, &z);
            if v.len() != spec.nevents() {
                return Err(DdeSolverError::shape(format!(
                    "event function returned {} values but {} were declared",
                    v.len(),
                    spec.nevents()
                )));
            }
            v
        }
        None => DVector::zeros(0),
    };

    let stepper = Bs23Stepper::new();
    let mut controller = StepController::new(h_max, rtol, lags.min_lag());
    controller.set_initial_step(options.initial_step, t0, tf, tol.rate_norm(&y0, &f0));

    mesh.push(t0, y0.clone(), f0.clone());

    let policy = EmitPolicy::for_span(t_span, options.refine);
    let sel = options.output_sel.clone();
    let mut guard = sink.map(|s| SinkGuard::new(s, (t0, tf), &y0));
    let mut next_out = 0usize;

    let mut done = false;
    let mut reason = SolveReason::Completed;
    if let Some(g) = guard.as_mut() {
        if emit_point(g, t0, &y0, &sel) == OutputStatus::Stop {
            done = true;
            reason = SolveReason::OutputStop;
        }
    }

    let mut t = t0;
    let mut y = y0;
    let mut p1 = f0;
    let mut nextdsc = 0usize;
    let max_lag = lags.max_lag();

    while !done {
        controller.begin_step(t);
        let d = discont[nextdsc];
        let mut hit = controller.snap_to_discontinuity(d - t);

        // attempt the step, shrinking on failure, until accepted or the
        // step size cannot be reduced any further
        let mut fatal = false;
        let mut accepted: Option<(T, DVector<T>, DVector<T>, T)> = None;
        while accepted.is_none() && !fatal {
            let t_new = if hit { d } else { t + controller.h() };
            let h = t_new - t;
            if let Some(max_lag) = max_lag {
                mesh.advance_window(t_new - max_lag - controller.h_max());
            }
            let view = mesh.view();
            match stepper.try_step(
                &problem.rhs,
                &lags,
                &problem.history,
                &tol,
                t,
                &y,
                &p1,
                h,
                t_new,
                &view,
                &mut z,
                &mut stats,
            ) {
                StepAttempt::Accepted { y_new, p_new, err } => {
                    accepted = Some((t_new, y_new, p_new, err));
                }
                StepAttempt::ErrorTooLarge { err } => {
                    stats.nfailed += 1;
                    hit = false;
                    fatal = !controller.after_error_failure(t, err);
                }
                StepAttempt::IterationFailed => {
                    stats.nfailed += 1;
                    hit = false;
                    fatal = !controller.after_iteration_failure(t);
                }
            }
        }
        if fatal {
            warn!(
                "unable to meet integration tolerances at t = {} without reducing the step size below its minimum",
                t
            );
            reason = SolveReason::ToleranceNotMet;
            break;
        }
        let (mut t_new, mut y_new, mut p_new, err) = accepted.unwrap();
        stats.nsteps += 1;

        if let Some(spec) = &options.events {
            let (records, v_new) = {
                let view = mesh.view();
                let extended = view.with_tail(t_new, &y_new, &p_new);
                lags.sample(t_new, &extended, &problem.history, &mut z);
                let v_new = spec.call(t_new, &y_new, &z);
                let records = locate_events(
                    spec,
                    &lags,
                    &problem.history,
                    &v_prev,
                    &v_new,
                    t,
                    &y,
                    &p1,
                    t_new,
                    &y_new,
                    &p_new,
                    &extended,
                    &mut z,
                );
                (records, v_new)
            };
            for record in &records {
                event_log.record(record);
            }
            match records.iter().find(|r| r.terminal) {
                Some(terminal) => {
                    // truncate the step at the event; the endpoint slope is
                    // recomputed so the stored triple stays a consistent
                    // Hermite record of the shortened interval
                    let h_step = t_new - t;
                    let p_e = hermite_deriv(t, h_step, &y, &p1, &y_new, &p_new, terminal.t);
                    t_new = terminal.t;
                    y_new = terminal.y.clone();
                    p_new = p_e;
                    hit = false;
                    done = true;
                    reason = SolveReason::TerminalEvent;
                }
                None => v_prev = v_new,
            }
        }

        mesh.push(t_new, y_new.clone(), p_new.clone());

        if let Some(g) = guard.as_mut() {
            let status = emit_step(
                g, &policy, &sel, &mut next_out, t, &y, &p1, t_new, &y_new, &p_new,
            );
            if status == OutputStatus::Stop && !done {
                done = true;
                reason = SolveReason::OutputStop;
            }
        }

        if hit {
            nextdsc += 1;
            if nextdsc == discont.len() {
                done = true;
            }
        }

        controller.after_success(err);
        t = t_new;
        y = y_new;
        p1 = p_new;
    }
    drop(guard);

    if options.stats {
        info!(
            "{} successful steps, {} failed attempts, {} function evaluations",
            stats.nsteps, stats.nfailed, stats.nfevals
        );
    }

    let (x, ys, yps) = mesh.into_parts();
    let (x, ys, yps, history) = match problem.history.prior_solution() {
        Some(prior) => {
            // prepend the prior mesh (minus the shared point at t0) so the
            // solution is continuous over the union of both spans
            let keep = prior.x.len() - 1;
            let mut x_all = prior.x[..keep].to_vec();
            x_all.extend(x);
            let mut y_all = prior.y[..keep].to_vec();
            y_all.extend(ys);
            let mut yp_all = prior.yp[..keep].to_vec();
            yp_all.extend(yps);
            (x_all, y_all, yp_all, prior.history.clone())
        }
        None => (x, ys, yps, problem.history.clone()),
    };

    Ok(DdeSolution {
        solver: "bs23",
        x,
        y: ys,
        yp: yps,
        history,
        discontinuities: discont,
        events: event_log,
        stats,
        reason,
    })
}

fn emit_point<T: Scalar>(
    guard: &mut SinkGuard<'_, T>,
    t: T,
    y: &DVector<T>,
    sel: &Option<Vec<usize>>,
) -> OutputStatus {
    match sel {
        Some(indices) => {
            let sub = DVector::from_iterator(indices.len(), indices.iter().map(|&i| y[i]));
            guard.point(t, &sub)
        }
        None => guard.point(t, y),
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_step<T: Scalar>(
    guard: &mut SinkGuard<'_, T>,
    policy: &EmitPolicy<T>,
    sel: &Option<Vec<usize>>,
    next_out: &mut usize,
    t: T,
    y: &DVector<T>,
    yp: &DVector<T>,
    t_new: T,
    y_new: &DVector<T>,
    yp_new: &DVector<T>,
) -> OutputStatus {
    let h = t_new - t;
    match policy {
        EmitPolicy::RequestedTimes(times) => {
            while *next_out < times.len() && times[*next_out] <= t_new {
                let s = times[*next_out];
                *next_out += 1;
                let ys = if s == t_new {
                    y_new.clone()
                } else {
                    hermite_eval(t, h, y, yp, y_new, yp_new, s)
                };
                if emit_point(guard, s, &ys, sel) == OutputStatus::Stop {
                    return OutputStatus::Stop;
                }
            }
            OutputStatus::Continue
        }
        EmitPolicy::EveryStep => emit_point(guard, t_new, y_new, sel),
        EmitPolicy::Refined(refine) => {
            for j in 1..*refine {
                let s = t + h * T::from(j as f64) / T::from(*refine as f64);
                let ys = hermite_eval(t, h, y, yp, y_new, yp_new, s);
                if emit_point(guard, s, &ys, sel) == OutputStatus::Stop {
                    return OutputStatus::Stop;
                }
            }
            emit_point(guard, t_new, y_new, sel)
        }
    }
}
