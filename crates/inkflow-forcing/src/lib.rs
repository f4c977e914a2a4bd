//! Forcing sources for inkflow.
//!
//! A [`ForcingSource`] turns a frame index into zero or more
//! [`ForcingAction`](inkflow_core::ForcingAction)s. Exactly one source
//! drives a run; it is picked at startup:
//!
//! - [`LiveInput`]: pointer and key events pushed through an
//!   [`InputSender`] by a UI or input thread.
//! - [`ScriptedEvents`]: a loaded event script, interpolated per frame.
//! - [`ScenarioGenerator`]: procedural emitters for unattended runs.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod live;
pub mod scenario;
pub mod script;
pub mod source;

pub use live::{InputEvent, InputSendError, InputSender, LiveInput, PointerButton};
pub use scenario::{Scenario, ScenarioGenerator};
pub use script::{ForcingEvent, InkData, ScriptError, ScriptedEvents};
pub use source::ForcingSource;
