//! The [`ForcingSource`] trait.

use inkflow_core::{ForcingBatch, FrameId};

/// Producer of per-frame forcing actions.
///
/// Called once per frame, in frame order, by the scheduler's Force
/// stage. Implementations may keep state across calls (a script cursor,
/// an RNG, pointer history) but must never revisit an earlier frame.
///
/// # Examples
///
/// ```
/// use inkflow_core::{ForcingAction, ForcingBatch, FrameId, InkChannel};
/// use inkflow_forcing::ForcingSource;
///
/// /// Drops red ink at (4, 4) on even frames.
/// struct EvenDrip;
///
/// impl ForcingSource for EvenDrip {
///     fn name(&self) -> &str { "even_drip" }
///
///     fn forcing_for_frame(&mut self, frame: FrameId) -> ForcingBatch {
///         let mut batch = ForcingBatch::new();
///         if frame.0 % 2 == 0 {
///             batch.push(ForcingAction {
///                 channel: InkChannel::Red,
///                 x: 4,
///                 y: 4,
///                 u: 0.0,
///                 v: 0.0,
///                 amount: 1.0,
///             });
///         }
///         batch
///     }
/// }
///
/// let mut drip = EvenDrip;
/// assert_eq!(drip.forcing_for_frame(FrameId(0)).len(), 1);
/// assert!(drip.forcing_for_frame(FrameId(1)).is_empty());
/// assert!(!drip.is_exhausted());
/// ```
pub trait ForcingSource: Send {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Forcing actions to apply during `frame`. Empty means no forcing.
    fn forcing_for_frame(&mut self, frame: FrameId) -> ForcingBatch;

    /// Whether the source will never produce forcing again and the run
    /// should end. Checked by the driver before each frame.
    ///
    /// Default: never exhausted.
    fn is_exhausted(&self) -> bool {
        false
    }

    /// Whether the user asked for the simulation state to be cleared.
    /// Returns `true` at most once per request.
    ///
    /// Default: never.
    fn take_reset_request(&mut self) -> bool {
        false
    }
}
