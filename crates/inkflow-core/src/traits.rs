//! Read-only access to simulation fields.

use crate::field::{Field, GridDims};
use crate::id::FrameId;

/// Read-only access to the current version of every logical field.
///
/// Implemented by the arena's snapshot view and handed to snapshot
/// sinks. A reader borrows the field set, so it cannot outlive the
/// frame it was taken in.
pub trait FieldReader {
    /// Grid dimensions shared by all fields.
    fn dims(&self) -> GridDims;

    /// The frame whose output this reader exposes.
    fn frame(&self) -> FrameId;

    /// Current data of `field` as a row-major slice.
    fn read(&self, field: Field) -> &[f32];
}
