//! Frame and run error types.

use std::error::Error;
use std::fmt;

use inkflow_arena::ArenaError;
use inkflow_core::{Field, FrameId, OperatorError, Stage};

use crate::sink::SinkError;

/// Errors from executing one frame.
///
/// Every variant is fatal for the run: a frame either completes all of
/// its stages or the run aborts. Nothing is retried.
#[derive(Debug)]
pub enum StepError {
    /// An operator call failed.
    OperatorFailed {
        /// Stage that issued the call.
        stage: Stage,
        /// Operator name.
        operator: &'static str,
        /// The underlying operator error.
        reason: OperatorError,
    },
    /// The field set refused a buffer operation.
    Buffer {
        /// Stage that issued the request.
        stage: Stage,
        /// The underlying arena error.
        reason: ArenaError,
    },
    /// Velocity holds NaN or infinity after projection.
    NonFinite {
        /// The offending field.
        field: Field,
        /// Index of the first non-finite cell.
        cell: usize,
    },
    /// The snapshot sink failed during Finalize.
    Sink(SinkError),
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorFailed {
                stage,
                operator,
                reason,
            } => write!(f, "{stage} stage: operator '{operator}' failed: {reason}"),
            Self::Buffer { stage, reason } => write!(f, "{stage} stage: {reason}"),
            Self::NonFinite { field, cell } => {
                write!(f, "non-finite value in {field} at cell {cell}")
            }
            Self::Sink(e) => write!(f, "finalize stage: {e}"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::OperatorFailed { reason, .. } => Some(reason),
            Self::Buffer { reason, .. } => Some(reason),
            Self::NonFinite { .. } => None,
            Self::Sink(e) => Some(e),
        }
    }
}

impl From<SinkError> for StepError {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

/// Errors that end a run.
#[derive(Debug)]
pub enum RunError {
    /// A frame failed.
    Frame {
        /// The frame that failed.
        frame: FrameId,
        /// What went wrong.
        error: StepError,
    },
    /// Clearing the fields on a reset request failed.
    Reset(ArenaError),
    /// The sink failed while flushing at the end of the run.
    Finish(SinkError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame { frame, error } => write!(f, "frame {frame}: {error}"),
            Self::Reset(e) => write!(f, "reset failed: {e}"),
            Self::Finish(e) => write!(f, "flushing output failed: {e}"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Frame { error, .. } => Some(error),
            Self::Reset(e) => Some(e),
            Self::Finish(e) => Some(e),
        }
    }
}
