//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use inkflow_core::Field;

use crate::handle::SlotId;

/// Errors that can occur while allocating or rotating field buffers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The configuration cannot describe a usable field set.
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: String,
    },
    /// The grid needs more cells than the configured limit allows.
    CapacityExceeded {
        /// Number of cells requested per field.
        requested: usize,
        /// Configured per-field limit.
        capacity: usize,
    },
    /// The allocator refused to reserve a field buffer.
    AllocationFailed {
        /// Number of bytes that could not be reserved.
        bytes: usize,
    },
    /// Every scratch slot is already checked out.
    ScratchExhausted {
        /// Total scratch slots in the pool.
        pool: usize,
    },
    /// The operation needs every scratch buffer back in the pool.
    ScratchOutstanding {
        /// Number of buffers still checked out.
        count: usize,
    },
    /// The same field was requested twice for simultaneous mutation.
    DuplicateField {
        /// The repeated field.
        field: Field,
    },
    /// A scratch buffer was returned to a field set that did not hand
    /// it out, or was returned twice.
    ForeignScratch {
        /// The slot the buffer claims to belong to.
        slot: SlotId,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
            Self::CapacityExceeded {
                requested,
                capacity,
            } => write!(
                f,
                "arena capacity exceeded: requested {requested} cells, capacity {capacity} cells"
            ),
            Self::AllocationFailed { bytes } => {
                write!(f, "failed to allocate {bytes} bytes of field storage")
            }
            Self::ScratchExhausted { pool } => {
                write!(f, "all {pool} scratch slots are checked out")
            }
            Self::ScratchOutstanding { count } => {
                write!(f, "{count} scratch buffers are still checked out")
            }
            Self::DuplicateField { field } => {
                write!(f, "field {field} requested twice")
            }
            Self::ForeignScratch { slot } => {
                write!(f, "scratch buffer for slot {slot} is not checked out")
            }
        }
    }
}

impl Error for ArenaError {}
