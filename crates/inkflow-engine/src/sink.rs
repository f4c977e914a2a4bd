//! Snapshot sinks: where finished frames go.
//!
//! The scheduler hands a [`FrameView`] to a [`SnapshotSink`] during the
//! Finalize stage of every frame on the export cadence. Sinks render or
//! persist the view; they never see a field outside that call.

use std::error::Error;
use std::fmt;

use inkflow_arena::FieldSnapshot;
use inkflow_core::{Field, FieldReader, FrameId, OperatorError};
use inkflow_ops::{FluidOperators, GridContext};

// ── ExportCadence ───────────────────────────────────────────────

/// Which frames are handed to the sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportCadence {
    /// No frame is exported.
    #[default]
    Never,
    /// Every frame whose index is a multiple of the interval.
    Every(u64),
}

impl ExportCadence {
    /// Whether `frame` is exported.
    pub fn is_due(self, frame: FrameId) -> bool {
        match self {
            Self::Never => false,
            Self::Every(interval) => frame.on_cadence(interval),
        }
    }
}

// ── SinkError ───────────────────────────────────────────────────

/// Errors raised while a sink consumes a frame.
#[derive(Debug)]
pub enum SinkError {
    /// Colour conversion failed.
    Operator(OperatorError),
    /// The sink could not store or display the frame.
    Failed {
        /// Name of the sink.
        sink: String,
        /// Underlying error.
        reason: Box<dyn Error + Send + Sync>,
    },
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operator(e) => write!(f, "colour conversion failed: {e}"),
            Self::Failed { sink, reason } => write!(f, "sink '{sink}' failed: {reason}"),
        }
    }
}

impl Error for SinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Operator(e) => Some(e),
            Self::Failed { reason, .. } => Some(reason.as_ref()),
        }
    }
}

impl From<OperatorError> for SinkError {
    fn from(e: OperatorError) -> Self {
        Self::Operator(e)
    }
}

// ── FrameView ───────────────────────────────────────────────────

/// Read-only view of one finished frame, with access to the operator
/// set's colour conversion.
///
/// Only valid for the duration of [`SnapshotSink::consume`].
pub struct FrameView<'a> {
    snapshot: FieldSnapshot<'a>,
    ops: &'a dyn FluidOperators,
    ctx: &'a GridContext,
}

impl<'a> FrameView<'a> {
    /// Wrap a snapshot. Backends must be synchronized before this.
    pub fn new(
        snapshot: FieldSnapshot<'a>,
        ops: &'a dyn FluidOperators,
        ctx: &'a GridContext,
    ) -> Self {
        Self { snapshot, ops, ctx }
    }

    /// The underlying field snapshot.
    pub fn snapshot(&self) -> &FieldSnapshot<'a> {
        &self.snapshot
    }

    /// Frame index.
    pub fn frame(&self) -> FrameId {
        self.snapshot.frame()
    }

    /// Grid context used for conversion.
    pub fn context(&self) -> &GridContext {
        self.ctx
    }

    /// Pressure rendered with the diverging colour map, RGBA row-major.
    pub fn pressure_rgba(&self) -> Result<Vec<u8>, OperatorError> {
        let mut out = vec![0u8; self.ctx.dims.cell_count() * 4];
        self.ops
            .pressure_colors(self.ctx, self.snapshot.read(Field::Pressure), &mut out)?;
        Ok(out)
    }

    /// The three ink channels as RGB, RGBA row-major.
    pub fn ink_rgba(&self) -> Result<Vec<u8>, OperatorError> {
        let mut out = vec![0u8; self.ctx.dims.cell_count() * 4];
        self.ops.ink_colors(
            self.ctx,
            self.snapshot.read(Field::InkRed),
            self.snapshot.read(Field::InkGreen),
            self.snapshot.read(Field::InkBlue),
            &mut out,
        )?;
        Ok(out)
    }
}

impl fmt::Debug for FrameView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameView")
            .field("frame", &self.frame())
            .field("dims", &self.ctx.dims)
            .field("ops", &self.ops.name())
            .finish()
    }
}

// ── SnapshotSink ────────────────────────────────────────────────

/// Consumer of finished frames.
pub trait SnapshotSink: Send {
    /// Human-readable name for logs and errors.
    fn name(&self) -> &str;

    /// Render or persist one frame.
    fn consume(&mut self, view: &FrameView<'_>) -> Result<(), SinkError>;

    /// Flush buffered output at the end of a run.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// A sink that discards every frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    fn consume(&mut self, _view: &FrameView<'_>) -> Result<(), SinkError> {
        Ok(())
    }
}
