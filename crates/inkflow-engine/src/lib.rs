//! Time-stepping scheduler and run loop for inkflow.
//!
//! [`TimeStepScheduler`] executes one frame of the fractional-step
//! pipeline against an injected operator set. [`Simulation`] owns a
//! scheduler, a forcing source and a snapshot sink, and drives frames
//! until a stop condition is met.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod params;
pub mod scheduler;
pub mod sink;

pub use config::{ConfigError, SimConfig};
pub use driver::{RunSummary, Simulation, StopHandle, StopReason};
pub use error::{RunError, StepError};
pub use metrics::FrameMetrics;
pub use params::{ParamsError, SimParams};
pub use scheduler::TimeStepScheduler;
pub use sink::{ExportCadence, FrameView, NullSink, SinkError, SnapshotSink};
