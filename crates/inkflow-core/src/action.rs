//! Forcing actions: localized momentum and ink impulses.

use smallvec::SmallVec;

use crate::field::InkChannel;

/// One localized injection of momentum and ink at a grid cell.
///
/// Positions are signed so that producers can emit cells outside the
/// grid (a pointer dragged past the edge); applying such an action is a
/// no-op.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForcingAction {
    /// Ink channel receiving `amount`.
    pub channel: InkChannel,
    /// Column of the target cell.
    pub x: i64,
    /// Row of the target cell.
    pub y: i64,
    /// Velocity impulse added to `u`.
    pub u: f32,
    /// Velocity impulse added to `v`.
    pub v: f32,
    /// Ink density added to the channel.
    pub amount: f32,
}

/// Forcing actions for one frame. At most one per channel in practice,
/// so three fit inline.
pub type ForcingBatch = SmallVec<[ForcingAction; 3]>;
