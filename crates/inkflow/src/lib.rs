//! inkflow: a stable-fluids time-stepping pipeline.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all inkflow sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use inkflow::prelude::*;
//!
//! let config = SimConfig::new(32, 32);
//! let mut scheduler = TimeStepScheduler::new(
//!     &config,
//!     SimParams::default(),
//!     Box::new(CpuOperators::new()),
//! )
//! .unwrap();
//! let mut forcing = ScenarioGenerator::new(Scenario::Constant, config.dims());
//!
//! let metrics = scheduler.step(&mut forcing, &mut NullSink).unwrap();
//! assert_eq!(metrics.forcing_actions, 3);
//! assert!(scheduler.fields().snapshot(FrameId(1)).total_ink() > 0.0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `inkflow-core` | Fields, grid dimensions, forcing actions, `FieldReader` |
//! | [`arena`] | `inkflow-arena` | `GridFieldSet` slot pool and snapshots |
//! | [`ops`] | `inkflow-ops` | `FluidOperators` trait and the CPU backend |
//! | [`forcing`] | `inkflow-forcing` | Live, scripted and procedural forcing |
//! | [`engine`] | `inkflow-engine` | Scheduler, run loop, sinks, parameters |
//! | [`export`] | `inkflow-export` | PNG sequence export |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core vocabulary (`inkflow-core`).
pub use inkflow_core as types;

/// Field storage and snapshots (`inkflow-arena`).
pub use inkflow_arena as arena;

/// Operator interface and CPU kernels (`inkflow-ops`).
///
/// Implement [`ops::FluidOperators`] to run the pipeline on another
/// backend.
pub use inkflow_ops as ops;

/// Forcing sources (`inkflow-forcing`).
pub use inkflow_forcing as forcing;

/// Scheduler and run loop (`inkflow-engine`).
pub use inkflow_engine as engine;

/// Snapshot export (`inkflow-export`).
pub use inkflow_export as export;

/// Common imports for typical inkflow usage.
pub mod prelude {
    pub use inkflow_arena::{FieldSnapshot, GridFieldSet};
    pub use inkflow_core::{
        Field, FieldReader, ForcingAction, ForcingBatch, FrameId, GridDims, InkChannel, Stage,
    };
    pub use inkflow_engine::{
        FrameMetrics, FrameView, NullSink, RunSummary, SimConfig, SimParams, Simulation,
        SnapshotSink, StopHandle, StopReason, TimeStepScheduler,
    };
    pub use inkflow_export::PngSequenceSink;
    pub use inkflow_forcing::{
        ForcingSource, InputEvent, LiveInput, PointerButton, Scenario, ScenarioGenerator,
        ScriptedEvents,
    };
    pub use inkflow_ops::{CpuOperators, FluidOperators, GridContext};
}
