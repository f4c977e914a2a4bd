//! Test utilities and mock types for inkflow development.
//!
//! Provides operator sets with analytically known behaviour
//! ([`fixtures`]) and canned forcing sources for driving the scheduler
//! in tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use inkflow_core::{ForcingAction, ForcingBatch, FrameId, InkChannel};
use inkflow_forcing::ForcingSource;

pub use fixtures::{CallLog, FailingOperators, IdentityOperators, OpCall, RecordingOperators};

/// Forcing source that replays a fixed list of `(frame, action)` pairs.
///
/// Exhausted once every listed frame has been requested.
pub struct ReplayForcing {
    actions: Vec<(FrameId, ForcingAction)>,
    last_frame: Option<FrameId>,
}

impl ReplayForcing {
    pub fn new(actions: Vec<(FrameId, ForcingAction)>) -> Self {
        Self {
            actions,
            last_frame: None,
        }
    }

    /// A single drop of `amount` ink with no velocity at `(x, y)` on
    /// frame 0.
    pub fn single_drop(channel: InkChannel, x: i64, y: i64, amount: f32) -> Self {
        Self::new(vec![(FrameId(0), drop_action(channel, x, y, amount))])
    }
}

impl ForcingSource for ReplayForcing {
    fn name(&self) -> &str {
        "replay"
    }

    fn forcing_for_frame(&mut self, frame: FrameId) -> ForcingBatch {
        self.last_frame = Some(frame);
        self.actions
            .iter()
            .filter(|(f, _)| *f == frame)
            .map(|(_, a)| *a)
            .collect()
    }

    fn is_exhausted(&self) -> bool {
        match (self.actions.iter().map(|(f, _)| *f).max(), self.last_frame) {
            (None, _) => true,
            (Some(last), Some(seen)) => seen >= last,
            (Some(_), None) => false,
        }
    }
}

/// A forcing action that only adds ink.
pub fn drop_action(channel: InkChannel, x: i64, y: i64, amount: f32) -> ForcingAction {
    ForcingAction {
        channel,
        x,
        y,
        u: 0.0,
        v: 0.0,
        amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_emits_on_listed_frames_only() {
        let mut replay = ReplayForcing::new(vec![
            (FrameId(1), drop_action(InkChannel::Red, 2, 2, 1.0)),
            (FrameId(3), drop_action(InkChannel::Blue, 2, 2, 1.0)),
        ]);
        assert!(replay.forcing_for_frame(FrameId(0)).is_empty());
        assert_eq!(replay.forcing_for_frame(FrameId(1)).len(), 1);
        assert!(!replay.is_exhausted());
        assert!(replay.forcing_for_frame(FrameId(2)).is_empty());
        assert_eq!(replay.forcing_for_frame(FrameId(3))[0].channel, InkChannel::Blue);
        assert!(replay.is_exhausted());
    }
}
