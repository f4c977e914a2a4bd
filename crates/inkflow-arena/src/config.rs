//! Arena configuration parameters.

use inkflow_core::GridDims;

/// Configuration for a [`GridFieldSet`](crate::GridFieldSet).
///
/// Validated by [`GridFieldSet::allocate`](crate::GridFieldSet::allocate);
/// immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Grid dimensions shared by all fields. Both sides must be at
    /// least [`ArenaConfig::MIN_SIDE`].
    pub dims: GridDims,

    /// Number of scratch slots beyond the six logical fields.
    ///
    /// Default: 2. The pipeline holds at most two scratch buffers at a
    /// time, so fewer than two is rejected.
    pub scratch_slots: usize,

    /// Upper bound on cells per field.
    ///
    /// Default: 2^26 (256MB per field at 4 bytes per f32).
    pub max_cells: usize,
}

impl ArenaConfig {
    /// Smallest grid side that still has an interior cell.
    pub const MIN_SIDE: usize = 3;

    /// Default scratch slot count.
    pub const DEFAULT_SCRATCH_SLOTS: usize = 2;

    /// Default per-field cell limit.
    pub const DEFAULT_MAX_CELLS: usize = 1 << 26;

    /// Create a config for a `width × height` grid with default limits.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            dims: GridDims::new(width, height),
            scratch_slots: Self::DEFAULT_SCRATCH_SLOTS,
            max_cells: Self::DEFAULT_MAX_CELLS,
        }
    }

    /// Total slot count: logical fields plus scratch.
    pub fn slot_count(&self) -> usize {
        inkflow_core::Field::COUNT + self.scratch_slots
    }

    /// Bytes the arena will hold once allocated, or `None` on overflow.
    pub fn total_bytes(&self) -> Option<usize> {
        self.dims
            .checked_cell_count()?
            .checked_mul(self.slot_count())?
            .checked_mul(std::mem::size_of::<f32>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_defaults() {
        let cfg = ArenaConfig::new(64, 32);
        assert_eq!(cfg.dims, GridDims::new(64, 32));
        assert_eq!(cfg.scratch_slots, ArenaConfig::DEFAULT_SCRATCH_SLOTS);
        assert_eq!(cfg.max_cells, ArenaConfig::DEFAULT_MAX_CELLS);
        assert_eq!(cfg.slot_count(), 8);
    }

    #[test]
    fn total_bytes_counts_every_slot() {
        let cfg = ArenaConfig::new(10, 10);
        assert_eq!(cfg.total_bytes(), Some(100 * 8 * 4));
    }

    #[test]
    fn total_bytes_overflow_is_none() {
        let cfg = ArenaConfig::new(usize::MAX / 2, 3);
        assert_eq!(cfg.total_bytes(), None);
    }
}
