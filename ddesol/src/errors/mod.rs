use thiserror::Error;

/// Errors raised while validating a problem or its options.
///
/// Everything here is fatal and detected before integration begins; the
/// solver never aborts mid-run with one of these. Non-fatal conditions
/// (step size driven to its lower bound) are reported on the returned
/// solution instead.
#[derive(Error, Debug)]
pub enum DdeSolverError {
    #[error("Shape mismatch: {context}")]
    InputShape { context: String },
    #[error("Continuation history ends at t = {found} but the time span starts at t = {expected}")]
    ContinuationMismatch { expected: f64, found: f64 },
    #[error("Invalid value for option {option}: {reason}")]
    OptionInvalid {
        option: &'static str,
        reason: String,
    },
}

impl DdeSolverError {
    pub(crate) fn shape(context: impl Into<String>) -> Self {
        Self::InputShape {
            context: context.into(),
        }
    }

    pub(crate) fn option(option: &'static str, reason: impl Into<String>) -> Self {
        Self::OptionInvalid {
            option,
            reason: reason.into(),
        }
    }
}
