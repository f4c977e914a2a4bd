//! Slot-pool field storage for inkflow simulations.
//!
//! Every buffer a simulation touches is allocated once, up front, in a
//! fixed pool of equally sized slots. A role table records which slot
//! is the current version of each logical field; the remaining slots
//! are scratch.
//!
//! ```text
//! GridFieldSet
//! ├── slots: [Vec<f32>; 6 + scratch]   (allocated once, never resized)
//! ├── roles: Field → SlotId            (the "current" table)
//! └── free:  Vec<SlotId>               (LIFO scratch pool)
//! ```
//!
//! Operators never write into the slot they read from. They write into
//! a [`ScratchBuffer`] checked out of the pool, and
//! [`GridFieldSet::commit`] swaps roles so that the scratch slot becomes
//! current and the old current slot goes back to the pool.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod fieldset;
pub mod handle;
pub mod read;

pub use config::ArenaConfig;
pub use error::ArenaError;
pub use fieldset::GridFieldSet;
pub use handle::{ScratchBuffer, SlotId};
pub use read::FieldSnapshot;
