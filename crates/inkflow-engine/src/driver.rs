//! Run loop: drives a scheduler until a stop condition.
//!
//! A run ends after a frame limit (unattended mode), when the forcing
//! source reports exhaustion (scripted mode), or when a [`StopHandle`]
//! is triggered (interactive mode). Stop conditions are checked between
//! frames only; a frame is never cancelled part-way.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use inkflow_forcing::{ForcingSource, Scenario, ScenarioGenerator, ScriptedEvents};
use inkflow_ops::FluidOperators;

use crate::config::{ConfigError, SimConfig};
use crate::error::RunError;
use crate::metrics::FrameMetrics;
use crate::params::SimParams;
use crate::scheduler::TimeStepScheduler;
use crate::sink::SnapshotSink;

// Compile-time assertion: a Simulation can be moved to a worker thread.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Simulation>();
        assert_send::<StopHandle>();
    }
};

// ── StopHandle ──────────────────────────────────────────────────

/// Cloneable handle that asks a running [`Simulation`] to stop after
/// the current frame.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request a stop.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ── RunSummary ──────────────────────────────────────────────────

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The frame limit was reached.
    FrameLimit,
    /// The forcing source has nothing left to produce.
    SourceExhausted,
    /// A [`StopHandle`] was triggered.
    Stopped,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FrameLimit => "frame limit reached",
            Self::SourceExhausted => "forcing exhausted",
            Self::Stopped => "stopped",
        })
    }
}

/// Outcome of [`Simulation::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames executed by this call.
    pub frames: u64,
    /// Frames handed to the sink by this call.
    pub exports: u64,
    /// Why the run ended.
    pub reason: StopReason,
}

// ── Simulation ──────────────────────────────────────────────────

/// A scheduler wired to one forcing source and one sink.
///
/// The forcing source is chosen once, at construction, and never
/// switched mid-run.
pub struct Simulation {
    scheduler: TimeStepScheduler,
    forcing: Box<dyn ForcingSource>,
    sink: Box<dyn SnapshotSink>,
    stop: StopHandle,
    max_frames: Option<u64>,
}

impl Simulation {
    /// Build a simulation.
    ///
    /// If `config.script_path` is set, the script is loaded and drives
    /// the run, and `forcing` is ignored. Otherwise `forcing` is used,
    /// falling back to the constant scenario when it is `None`.
    pub fn new(
        config: &SimConfig,
        params: SimParams,
        ops: Box<dyn FluidOperators>,
        forcing: Option<Box<dyn ForcingSource>>,
        sink: Box<dyn SnapshotSink>,
    ) -> Result<Self, ConfigError> {
        let scheduler = TimeStepScheduler::new(config, params, ops)?;
        let dims = config.dims();
        let forcing: Box<dyn ForcingSource> = match (&config.script_path, forcing) {
            (Some(path), ignored) => {
                if let Some(source) = ignored {
                    tracing::warn!(source = source.name(), "script given, ignoring forcing source");
                }
                Box::new(ScriptedEvents::load(path, dims)?)
            }
            (None, Some(source)) => source,
            (None, None) => Box::new(ScenarioGenerator::new(Scenario::Constant, dims)),
        };
        tracing::info!(forcing = forcing.name(), sink = sink.name(), "simulation built");
        Ok(Self {
            scheduler,
            forcing,
            sink,
            stop: StopHandle::default(),
            max_frames: None,
        })
    }

    /// Stop once the scheduler's frame counter reaches `frames`.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// A handle that stops [`run`](Self::run) from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &TimeStepScheduler {
        &self.scheduler
    }

    /// Mutable access to the scheduler between frames.
    pub fn scheduler_mut(&mut self) -> &mut TimeStepScheduler {
        &mut self.scheduler
    }

    /// Name of the active forcing source.
    pub fn forcing_name(&self) -> &str {
        self.forcing.name()
    }

    /// Execute one frame, honouring a pending reset request first.
    pub fn step(&mut self) -> Result<&FrameMetrics, RunError> {
        if self.forcing.take_reset_request() {
            self.scheduler.reset().map_err(RunError::Reset)?;
        }
        let frame = self.scheduler.frame();
        self.scheduler
            .step(self.forcing.as_mut(), self.sink.as_mut())
            .map_err(|error| RunError::Frame { frame, error })
    }

    /// Run frames until a stop condition, then flush the sink.
    pub fn run(&mut self) -> Result<RunSummary, RunError> {
        let mut frames = 0;
        let mut exports = 0;
        let reason = loop {
            if self.stop.is_stopped() {
                break StopReason::Stopped;
            }
            if self
                .max_frames
                .is_some_and(|limit| self.scheduler.frame().0 >= limit)
            {
                break StopReason::FrameLimit;
            }
            if self.forcing.is_exhausted() {
                break StopReason::SourceExhausted;
            }
            let metrics = self.step()?;
            frames += 1;
            if metrics.exported {
                exports += 1;
            }
        };
        self.sink.finish().map_err(RunError::Finish)?;

        let summary = RunSummary {
            frames,
            exports,
            reason,
        };
        tracing::info!(
            frames = summary.frames,
            exports = summary.exports,
            reason = %summary.reason,
            "run finished"
        );
        Ok(summary)
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("scheduler", &self.scheduler)
            .field("forcing", &self.forcing.name())
            .field("sink", &self.sink.name())
            .field("max_frames", &self.max_frames)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkflow_ops::CpuOperators;

    use crate::sink::NullSink;

    fn simulation(config: &SimConfig) -> Simulation {
        Simulation::new(
            config,
            SimParams::default(),
            Box::new(CpuOperators::new()),
            None,
            Box::new(NullSink),
        )
        .unwrap()
    }

    #[test]
    fn default_forcing_is_constant_scenario() {
        let sim = simulation(&SimConfig::new(8, 8));
        assert_eq!(sim.forcing_name(), "constant");
    }

    #[test]
    fn frame_limit_ends_run() {
        let mut sim = simulation(&SimConfig::new(8, 8)).with_frame_limit(5);
        let summary = sim.run().unwrap();
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.reason, StopReason::FrameLimit);
        assert_eq!(summary.exports, 0);
    }

    #[test]
    fn stop_handle_ends_run_before_next_frame() {
        let mut sim = simulation(&SimConfig::new(8, 8)).with_frame_limit(100);
        sim.stop_handle().stop();
        let summary = sim.run().unwrap();
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.reason, StopReason::Stopped);
    }

    #[test]
    fn exports_follow_cadence() {
        let mut config = SimConfig::new(8, 8);
        config.export_enabled = true;
        let mut sim = simulation(&config).with_frame_limit(25);
        let summary = sim.run().unwrap();
        assert_eq!(summary.exports, 3);
    }

    #[test]
    fn missing_script_fails_construction() {
        let mut config = SimConfig::new(8, 8);
        config.script_path = Some("/nonexistent/inkflow/events.txt".into());
        let err = Simulation::new(
            &config,
            SimParams::default(),
            Box::new(CpuOperators::new()),
            None,
            Box::new(NullSink),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Script(_)));
    }
}
