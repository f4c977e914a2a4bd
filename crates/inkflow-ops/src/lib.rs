//! Operator interface and CPU reference kernels for inkflow.
//!
//! The time-stepping pipeline only ever talks to a grid through the
//! [`FluidOperators`] trait. Each operator is a pure transform over
//! row-major `f32` slices of one fixed grid size, described by a shared
//! [`GridContext`]. [`CpuOperators`] implements every operator on the
//! host with data parallelism inside each call.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod color;
pub mod context;
pub mod cpu;
pub mod operators;

pub use context::GridContext;
pub use cpu::CpuOperators;
pub use operators::{FluidOperators, Velocity};
