//! Per-frame performance metrics.
//!
//! [`FrameMetrics`] captures stage timings for a single frame, for
//! logging and profiling.

use inkflow_core::{FrameId, Stage};

/// Timing data collected during a single frame.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default)]
pub struct FrameMetrics {
    /// The frame these metrics describe.
    pub frame: FrameId,
    /// Wall-clock time for the whole frame.
    pub total_us: u64,
    /// Boundary stage.
    pub boundary_us: u64,
    /// Advect stage.
    pub advect_us: u64,
    /// Force stage.
    pub force_us: u64,
    /// Diffuse stage.
    pub diffuse_us: u64,
    /// Project stage.
    pub project_us: u64,
    /// Finalize stage, including sink time.
    pub finalize_us: u64,
    /// Forcing actions applied this frame.
    pub forcing_actions: usize,
    /// Role swaps committed this frame.
    pub commits: u64,
    /// Whether a snapshot was handed to the sink.
    pub exported: bool,
}

impl FrameMetrics {
    /// Time spent in `stage`, in microseconds.
    pub fn stage_us(&self, stage: Stage) -> u64 {
        match stage {
            Stage::Boundary => self.boundary_us,
            Stage::Advect => self.advect_us,
            Stage::Force => self.force_us,
            Stage::Diffuse => self.diffuse_us,
            Stage::Project => self.project_us,
            Stage::Finalize => self.finalize_us,
        }
    }

    pub(crate) fn record(&mut self, stage: Stage, us: u64) {
        let slot = match stage {
            Stage::Boundary => &mut self.boundary_us,
            Stage::Advect => &mut self.advect_us,
            Stage::Force => &mut self.force_us,
            Stage::Diffuse => &mut self.diffuse_us,
            Stage::Project => &mut self.project_us,
            Stage::Finalize => &mut self.finalize_us,
        };
        *slot = us;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = FrameMetrics::default();
        assert_eq!(m.frame, FrameId(0));
        assert_eq!(m.total_us, 0);
        for stage in Stage::ALL {
            assert_eq!(m.stage_us(stage), 0);
        }
        assert_eq!(m.forcing_actions, 0);
        assert_eq!(m.commits, 0);
        assert!(!m.exported);
    }

    #[test]
    fn record_targets_one_stage() {
        let mut m = FrameMetrics::default();
        m.record(Stage::Diffuse, 1200);
        m.record(Stage::Project, 800);
        assert_eq!(m.stage_us(Stage::Diffuse), 1200);
        assert_eq!(m.stage_us(Stage::Project), 800);
        assert_eq!(m.stage_us(Stage::Advect), 0);
    }
}
