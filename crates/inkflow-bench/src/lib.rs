//! Benchmark profiles for the inkflow simulation pipeline.
//!
//! - [`reference_profile`]: 128x128 grid, the size most tests run at
//! - [`stress_profile`]: 512x512 grid, the default interactive size
//! - [`warmed_scheduler`]: a CPU scheduler that has already run frames

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use inkflow_engine::{NullSink, SimConfig, SimParams, TimeStepScheduler};
use inkflow_forcing::{ForcingSource, Scenario, ScenarioGenerator};
use inkflow_ops::CpuOperators;

/// 128x128 grid with default 16x16 tiles.
pub fn reference_profile() -> SimConfig {
    SimConfig::new(128, 128)
}

/// 512x512 grid with default 16x16 tiles.
pub fn stress_profile() -> SimConfig {
    SimConfig::new(512, 512)
}

/// Build a CPU scheduler for `config` and run `frames` frames of the
/// constant scenario so the fields hold a developed flow.
///
/// Returns the scheduler and the forcing source, positioned to continue.
///
/// # Panics
///
/// Panics if the configuration is invalid or a frame fails.
pub fn warmed_scheduler(config: &SimConfig, frames: u64) -> (TimeStepScheduler, ScenarioGenerator) {
    let mut scheduler =
        TimeStepScheduler::new(config, SimParams::default(), Box::new(CpuOperators::new()))
            .expect("benchmark profile must be valid");
    let mut forcing = ScenarioGenerator::new(Scenario::Constant, config.dims());
    for _ in 0..frames {
        scheduler
            .step(&mut forcing, &mut NullSink)
            .expect("warm-up frame failed");
    }
    (scheduler, forcing)
}

/// Run `frames` more frames, discarding output.
///
/// # Panics
///
/// Panics if a frame fails.
pub fn run_frames(
    scheduler: &mut TimeStepScheduler,
    forcing: &mut dyn ForcingSource,
    frames: u64,
) {
    for _ in 0..frames {
        scheduler
            .step(forcing, &mut NullSink)
            .expect("benchmark frame failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkflow_core::FrameId;

    #[test]
    fn warmed_scheduler_advances_frames() {
        let (mut scheduler, mut forcing) = warmed_scheduler(&SimConfig::new(16, 16), 3);
        assert_eq!(scheduler.frame(), FrameId(3));
        run_frames(&mut scheduler, &mut forcing, 2);
        assert_eq!(scheduler.frame(), FrameId(5));
    }

    #[test]
    fn profiles_validate() {
        assert!(reference_profile().validate().is_ok());
        assert!(stress_profile().validate().is_ok());
    }
}
