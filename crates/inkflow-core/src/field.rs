//! Logical fields, ink channels and grid dimensions.

use std::fmt;

/// One of the six logical quantities simulated on the grid.
///
/// Every field has the same `width × height` shape and is stored
/// row-major: cell `(x, y)` lives at index `y * width + x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// Horizontal velocity component `u`.
    VelocityX,
    /// Vertical velocity component `v`.
    VelocityY,
    /// Pressure `p`.
    Pressure,
    /// Red ink density.
    InkRed,
    /// Green ink density.
    InkGreen,
    /// Blue ink density.
    InkBlue,
}

impl Field {
    /// Number of logical fields.
    pub const COUNT: usize = 6;

    /// All logical fields in storage order.
    pub const ALL: [Field; Field::COUNT] = [
        Field::VelocityX,
        Field::VelocityY,
        Field::Pressure,
        Field::InkRed,
        Field::InkGreen,
        Field::InkBlue,
    ];

    /// Dense index of this field, in `0..Field::COUNT`.
    pub fn index(self) -> usize {
        match self {
            Self::VelocityX => 0,
            Self::VelocityY => 1,
            Self::Pressure => 2,
            Self::InkRed => 3,
            Self::InkGreen => 4,
            Self::InkBlue => 5,
        }
    }

    /// Short lowercase name used in logs and file names.
    pub fn name(self) -> &'static str {
        match self {
            Self::VelocityX => "u",
            Self::VelocityY => "v",
            Self::Pressure => "p",
            Self::InkRed => "ink_r",
            Self::InkGreen => "ink_g",
            Self::InkBlue => "ink_b",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ink channel targeted by a forcing action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InkChannel {
    /// Red ink.
    #[default]
    Red,
    /// Green ink.
    Green,
    /// Blue ink.
    Blue,
}

impl InkChannel {
    /// All channels in cycling order.
    pub const ALL: [InkChannel; 3] = [InkChannel::Red, InkChannel::Green, InkChannel::Blue];

    /// The logical field holding this channel's density.
    pub fn field(self) -> Field {
        match self {
            Self::Red => Field::InkRed,
            Self::Green => Field::InkGreen,
            Self::Blue => Field::InkBlue,
        }
    }

    /// The next channel in `Red → Green → Blue → Red` order.
    pub fn next(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Blue,
            Self::Blue => Self::Red,
        }
    }
}

impl fmt::Display for InkChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => f.write_str("red"),
            Self::Green => f.write_str("green"),
            Self::Blue => f.write_str("blue"),
        }
    }
}

/// Dimensions of the simulation grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridDims {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl GridDims {
    /// Create grid dimensions. No validation happens here; the arena
    /// rejects grids too small to have an interior.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total number of cells, or `None` on overflow.
    pub fn checked_cell_count(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }

    /// Total number of cells.
    ///
    /// Callers must have validated the dimensions (the arena does so at
    /// allocation time).
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Row-major index of cell `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Row-major index of a signed position, or `None` outside the grid.
    pub fn checked_index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        (x < self.width && y < self.height).then(|| self.index(x, y))
    }

    /// The centre cell, rounding down.
    pub fn center(&self) -> (i64, i64) {
        ((self.width / 2) as i64, (self.height / 2) as i64)
    }
}

impl fmt::Display for GridDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
