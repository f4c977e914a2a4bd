//! Strongly-typed frame counter.

use std::fmt;

/// Monotonically increasing frame counter.
///
/// Frame 0 is the first frame a run executes. The scheduler never
/// revisits a frame: frame `n + 1` starts only after frame `n` has
/// committed all of its stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

impl FrameId {
    /// The frame that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Whether this frame falls on a cadence of `interval` frames.
    ///
    /// Frame 0 is always on cadence. An interval of 0 never matches.
    pub fn on_cadence(self, interval: u64) -> bool {
        interval != 0 && self.0 % interval == 0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FrameId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_increments() {
        assert_eq!(FrameId(0).next(), FrameId(1));
        assert_eq!(FrameId(41).next(), FrameId(42));
    }

    #[test]
    fn cadence_matches_multiples_only() {
        let hits: Vec<u64> = (0..35)
            .map(FrameId)
            .filter(|f| f.on_cadence(10))
            .map(|f| f.0)
            .collect();
        assert_eq!(hits, vec![0, 10, 20, 30]);
    }

    #[test]
    fn zero_interval_never_matches() {
        assert!(!FrameId(0).on_cadence(0));
        assert!(!FrameId(10).on_cadence(0));
    }

    #[test]
    fn display_is_bare_number() {
        assert_eq!(FrameId(7).to_string(), "7");
        assert_eq!(FrameId::from(3), FrameId(3));
    }
}
