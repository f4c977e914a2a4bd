//! Slot identifiers and checked-out scratch buffers.

use std::fmt;
use std::ops::{Deref, DerefMut};

/// Index of a buffer slot inside a [`GridFieldSet`](crate::GridFieldSet).
///
/// Slots are stable for the life of the field set; only the role a slot
/// plays (current version of some field, or scratch) changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u16);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A scratch slot checked out of the pool.
///
/// Owns the slot's storage while checked out, so no other borrow of the
/// field set can observe it. Contents are whatever the slot last held;
/// writers must overwrite every cell. Return it with
/// [`GridFieldSet::commit`](crate::GridFieldSet::commit),
/// [`GridFieldSet::exchange`](crate::GridFieldSet::exchange) or
/// [`GridFieldSet::release`](crate::GridFieldSet::release). Dropping it
/// instead leaks the slot for the rest of the run.
#[must_use = "a dropped scratch buffer is lost to the pool"]
pub struct ScratchBuffer {
    pub(crate) slot: SlotId,
    pub(crate) data: Vec<f32>,
}

impl ScratchBuffer {
    /// The slot this buffer belongs to.
    pub fn slot(&self) -> SlotId {
        self.slot
    }
}

impl Deref for ScratchBuffer {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.data
    }
}

impl DerefMut for ScratchBuffer {
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

impl fmt::Debug for ScratchBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchBuffer")
            .field("slot", &self.slot)
            .field("len", &self.data.len())
            .finish()
    }
}
