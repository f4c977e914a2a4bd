//! Procedural forcing for unattended and demo runs.

use std::fmt;
use std::str::FromStr;

use inkflow_core::{ForcingAction, ForcingBatch, FrameId, GridDims, InkChannel};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::source::ForcingSource;

/// Scenarios fire on every 10th frame only.
pub const SCENARIO_INTERVAL: u64 = 10;

/// Period of the alternating emitter's sinusoid, in frames (full cycle).
const ALTERNATING_PERIOD: f64 = 600.0;

/// Bound of the random emitter's velocity components.
const RANDOM_SPEED: f32 = 200.0;

/// Ink per channel for the random emitter.
const RANDOM_AMOUNT: f32 = 100.0;

/// Which procedural emitter to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scenario {
    /// Fixed impulses at the grid centre.
    #[default]
    Constant,
    /// Random position and direction per channel.
    Random,
    /// Centre emitter whose vertical velocity swings sinusoidally.
    Alternating,
}

impl Scenario {
    /// Lowercase scenario name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Random => "random",
            Self::Alternating => "alternating",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "constant" => Ok(Self::Constant),
            "random" => Ok(Self::Random),
            "alternating" => Ok(Self::Alternating),
            other => Err(format!(
                "unknown scenario '{other}' (expected constant, random or alternating)"
            )),
        }
    }
}

/// Forcing source running one [`Scenario`].
///
/// Deterministic for a given seed: the random emitter draws from a
/// `ChaCha8Rng` seeded at construction.
pub struct ScenarioGenerator {
    scenario: Scenario,
    dims: GridDims,
    rng: ChaCha8Rng,
}

impl ScenarioGenerator {
    /// Create a generator with seed 0.
    pub fn new(scenario: Scenario, dims: GridDims) -> Self {
        Self::with_seed(scenario, dims, 0)
    }

    /// Create a generator whose random draws derive from `seed`.
    pub fn with_seed(scenario: Scenario, dims: GridDims, seed: u64) -> Self {
        Self {
            scenario,
            dims,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// The scenario being run.
    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    fn centred(&self, channel: InkChannel, u: f32, v: f32, amount: f32) -> ForcingAction {
        let (x, y) = self.dims.center();
        ForcingAction {
            channel,
            x,
            y,
            u,
            v,
            amount,
        }
    }

    fn random_action(&mut self, channel: InkChannel) -> ForcingAction {
        let x = self.rng.gen_range(0..self.dims.width) as i64;
        let y = self.rng.gen_range(0..self.dims.height) as i64;
        let u = self.rng.gen_range(-RANDOM_SPEED..RANDOM_SPEED);
        let v = self.rng.gen_range(-RANDOM_SPEED..RANDOM_SPEED);
        ForcingAction {
            channel,
            x,
            y,
            u,
            v,
            amount: RANDOM_AMOUNT,
        }
    }
}

impl fmt::Debug for ScenarioGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioGenerator")
            .field("scenario", &self.scenario)
            .field("dims", &self.dims)
            .finish_non_exhaustive()
    }
}

impl ForcingSource for ScenarioGenerator {
    fn name(&self) -> &str {
        self.scenario.name()
    }

    fn forcing_for_frame(&mut self, frame: FrameId) -> ForcingBatch {
        let mut batch = ForcingBatch::new();
        if !frame.on_cadence(SCENARIO_INTERVAL) {
            return batch;
        }
        match self.scenario {
            Scenario::Constant => {
                batch.push(self.centred(InkChannel::Red, 100.0, 0.0, 50.0));
                batch.push(self.centred(InkChannel::Green, 0.0, 0.0, 30.0));
                batch.push(self.centred(InkChannel::Blue, 0.0, 0.0, 10.0));
            }
            Scenario::Random => {
                for channel in InkChannel::ALL {
                    let action = self.random_action(channel);
                    batch.push(action);
                }
            }
            Scenario::Alternating => {
                let phase = frame.0 as f64 / (ALTERNATING_PERIOD / 2.0) * std::f64::consts::PI;
                let v = (100.0 * phase.sin()) as f32;
                batch.push(self.centred(InkChannel::Red, 100.0, v, 50.0));
                batch.push(self.centred(InkChannel::Green, 0.0, 0.0, 30.0));
                batch.push(self.centred(InkChannel::Blue, 0.0, 0.0, 10.0));
            }
        }
        batch
    }
}
