//! Core types and traits for the inkflow fluid simulator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: logical fields,
//! grid dimensions, frame counters, forcing actions, error types and
//! the [`FieldReader`] trait.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod action;
pub mod error;
pub mod field;
pub mod id;
pub mod traits;

pub use action::{ForcingAction, ForcingBatch};
pub use error::{OperatorError, Stage};
pub use field::{Field, GridDims, InkChannel};
pub use id::FrameId;
pub use traits::FieldReader;
