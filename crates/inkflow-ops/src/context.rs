//! Grid context shared by every operator call.

use inkflow_core::{GridDims, OperatorError};

/// Grid dimensions plus dispatch granularity, identical for every call
/// of a simulation instance.
///
/// `tile_width × tile_height` is the work-group shape a backend
/// dispatches. The CPU backend parallelises over bands of `tile_height`
/// rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridContext {
    /// Grid dimensions.
    pub dims: GridDims,
    /// Columns per dispatch tile.
    pub tile_width: usize,
    /// Rows per dispatch tile.
    pub tile_height: usize,
}

impl GridContext {
    /// Default tile side.
    pub const DEFAULT_TILE: usize = 16;

    /// Smallest grid side a stencil operator accepts: one interior cell
    /// plus a border on each side.
    pub const MIN_STENCIL_SIDE: usize = 3;

    /// Create a context with explicit tile shape. Zero tile sides are
    /// raised to 1.
    pub fn new(dims: GridDims, tile_width: usize, tile_height: usize) -> Self {
        Self {
            dims,
            tile_width: tile_width.max(1),
            tile_height: tile_height.max(1),
        }
    }

    /// Create a context with the default 16×16 tile.
    pub fn with_default_tiles(dims: GridDims) -> Self {
        Self::new(dims, Self::DEFAULT_TILE, Self::DEFAULT_TILE)
    }

    /// Number of tiles needed to cover the grid, `(columns, rows)`.
    pub fn tile_grid(&self) -> (usize, usize) {
        (
            self.dims.width.div_ceil(self.tile_width),
            self.dims.height.div_ceil(self.tile_height),
        )
    }

    /// Check that a field buffer covers exactly one value per cell.
    pub fn check_field(&self, operator: &'static str, len: usize) -> Result<(), OperatorError> {
        self.check_len(operator, self.dims.cell_count(), len)
    }

    /// Check that the grid has an interior for `operator` to update.
    pub fn check_stencil(&self, operator: &'static str) -> Result<(), OperatorError> {
        let GridDims { width, height } = self.dims;
        if width < Self::MIN_STENCIL_SIDE || height < Self::MIN_STENCIL_SIDE {
            return Err(OperatorError::GridTooSmall {
                operator,
                width,
                height,
            });
        }
        Ok(())
    }

    /// Check that an RGBA buffer covers exactly four bytes per cell.
    pub fn check_rgba(&self, operator: &'static str, len: usize) -> Result<(), OperatorError> {
        self.check_len(operator, self.dims.cell_count() * 4, len)
    }

    fn check_len(
        &self,
        operator: &'static str,
        expected: usize,
        actual: usize,
    ) -> Result<(), OperatorError> {
        if expected == actual {
            Ok(())
        } else {
            Err(OperatorError::DimensionMismatch {
                operator,
                expected,
                actual,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_grid_rounds_up() {
        let ctx = GridContext::new(GridDims::new(33, 16), 16, 16);
        assert_eq!(ctx.tile_grid(), (3, 1));
    }

    #[test]
    fn zero_tiles_are_raised() {
        let ctx = GridContext::new(GridDims::new(8, 8), 0, 0);
        assert_eq!((ctx.tile_width, ctx.tile_height), (1, 1));
    }

    #[test]
    fn check_field_reports_mismatch() {
        let ctx = GridContext::with_default_tiles(GridDims::new(4, 4));
        assert!(ctx.check_field("advect", 16).is_ok());
        assert_eq!(
            ctx.check_field("advect", 15),
            Err(OperatorError::DimensionMismatch {
                operator: "advect",
                expected: 16,
                actual: 15,
            })
        );
        assert!(ctx.check_rgba("ink_colors", 64).is_ok());
    }

    #[test]
    fn check_stencil_needs_an_interior() {
        assert!(GridContext::with_default_tiles(GridDims::new(3, 3))
            .check_stencil("jacobi")
            .is_ok());
        assert_eq!(
            GridContext::with_default_tiles(GridDims::new(8, 2)).check_stencil("jacobi"),
            Err(OperatorError::GridTooSmall {
                operator: "jacobi",
                width: 8,
                height: 2,
            })
        );
    }
}
