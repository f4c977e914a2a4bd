//! PNG snapshot export for inkflow.
//!
//! [`PngSequenceSink`] is a [`SnapshotSink`](inkflow_engine::SnapshotSink)
//! that writes numbered PNG files into an output directory.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod png_sink;

pub use error::ExportError;
pub use png_sink::{ExportLayers, PngSequenceSink};
