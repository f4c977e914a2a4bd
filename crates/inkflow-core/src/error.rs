//! Error types shared across the workspace.
//!
//! Operator failures are reported by [`OperatorError`] and tagged with
//! the pipeline [`Stage`] that issued the call once they reach the
//! scheduler.

use std::error::Error;
use std::fmt;

/// Pipeline stage of the per-frame state machine.
///
/// Stages run in declaration order, once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Edge conditions on velocity and ink.
    Boundary,
    /// Semi-Lagrangian transport of every field.
    Advect,
    /// Forcing actions applied to velocity and ink.
    Force,
    /// Viscous diffusion of velocity.
    Diffuse,
    /// Pressure solve and gradient subtraction.
    Project,
    /// Synchronization and snapshot hand-off.
    Finalize,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 6] = [
        Stage::Boundary,
        Stage::Advect,
        Stage::Force,
        Stage::Diffuse,
        Stage::Project,
        Stage::Finalize,
    ];

    /// Lowercase stage name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Boundary => "boundary",
            Self::Advect => "advect",
            Self::Force => "force",
            Self::Diffuse => "diffuse",
            Self::Project => "project",
            Self::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors from a single operator call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperatorError {
    /// A slice passed to the operator does not match the grid size.
    DimensionMismatch {
        /// Name of the operator.
        operator: &'static str,
        /// Expected number of elements.
        expected: usize,
        /// Actual number of elements.
        actual: usize,
    },
    /// The grid has no interior for a stencil operator to work on.
    GridTooSmall {
        /// Name of the operator.
        operator: &'static str,
        /// Grid width in cells.
        width: usize,
        /// Grid height in cells.
        height: usize,
    },
    /// The backend failed to execute the operator.
    Backend {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for OperatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch {
                operator,
                expected,
                actual,
            } => write!(
                f,
                "{operator}: buffer holds {actual} elements, grid needs {expected}"
            ),
            Self::GridTooSmall {
                operator,
                width,
                height,
            } => write!(f, "{operator}: {width}x{height} grid has no interior"),
            Self::Backend { reason } => write!(f, "backend failure: {reason}"),
        }
    }
}

impl Error for OperatorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_listed_in_execution_order() {
        let names: Vec<&str> = Stage::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            ["boundary", "advect", "force", "diffuse", "project", "finalize"]
        );
    }

    #[test]
    fn mismatch_message_names_operator() {
        let err = OperatorError::DimensionMismatch {
            operator: "jacobi",
            expected: 16,
            actual: 9,
        };
        assert_eq!(
            err.to_string(),
            "jacobi: buffer holds 9 elements, grid needs 16"
        );
    }

    #[test]
    fn too_small_message_names_grid() {
        let err = OperatorError::GridTooSmall {
            operator: "boundary",
            width: 1,
            height: 1,
        };
        assert_eq!(err.to_string(), "boundary: 1x1 grid has no interior");
    }
}
