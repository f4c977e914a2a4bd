//! Read-only snapshot view over a field set.

use inkflow_core::{Field, FieldReader, FrameId, GridDims};

use crate::fieldset::GridFieldSet;

/// Borrowed, read-only view of the current fields at the end of a frame.
///
/// Holds a shared borrow of the [`GridFieldSet`], so no commit can happen
/// while the snapshot is alive.
#[derive(Clone, Copy)]
pub struct FieldSnapshot<'a> {
    fields: &'a GridFieldSet,
    frame: FrameId,
}

impl<'a> FieldSnapshot<'a> {
    pub(crate) fn new(fields: &'a GridFieldSet, frame: FrameId) -> Self {
        Self { fields, frame }
    }

    /// Sum of all three ink channels over the whole grid.
    pub fn total_ink(&self) -> f64 {
        [Field::InkRed, Field::InkGreen, Field::InkBlue]
            .iter()
            .flat_map(|f| self.fields.current(*f).iter())
            .map(|&v| f64::from(v))
            .sum()
    }
}

impl FieldReader for FieldSnapshot<'_> {
    fn dims(&self) -> GridDims {
        self.fields.dims()
    }

    fn frame(&self) -> FrameId {
        self.frame
    }

    fn read(&self, field: Field) -> &[f32] {
        self.fields.current(field)
    }
}
