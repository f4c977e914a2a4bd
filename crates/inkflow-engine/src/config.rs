//! Pipeline entry configuration, validation, and error types.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use inkflow_arena::{ArenaConfig, ArenaError};
use inkflow_core::GridDims;
use inkflow_forcing::ScriptError;
use inkflow_ops::GridContext;

use crate::params::ParamsError;
use crate::sink::ExportCadence;

// ── ConfigError ─────────────────────────────────────────────────

/// Errors detected while building a simulation. All are fatal: the
/// simulation never starts.
#[derive(Debug)]
pub enum ConfigError {
    /// The grid is too small to have an interior.
    InvalidGrid {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },
    /// A tile side is zero.
    ZeroTile,
    /// Export is enabled with an interval of zero frames.
    ZeroExportInterval,
    /// Field storage could not be allocated.
    Arena(ArenaError),
    /// Numerical parameters are invalid.
    Params(ParamsError),
    /// The event script could not be loaded.
    Script(ScriptError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGrid { width, height } => write!(
                f,
                "grid {width}x{height} is too small (minimum {min}x{min})",
                min = ArenaConfig::MIN_SIDE
            ),
            Self::ZeroTile => write!(f, "tile width and height must be at least 1"),
            Self::ZeroExportInterval => write!(f, "export interval must be at least 1 frame"),
            Self::Arena(e) => write!(f, "field allocation failed: {e}"),
            Self::Params(e) => write!(f, "{e}"),
            Self::Script(e) => write!(f, "event script: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            Self::Params(e) => Some(e),
            Self::Script(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

impl From<ParamsError> for ConfigError {
    fn from(e: ParamsError) -> Self {
        Self::Params(e)
    }
}

impl From<ScriptError> for ConfigError {
    fn from(e: ScriptError) -> Self {
        Self::Script(e)
    }
}

// ── SimConfig ───────────────────────────────────────────────────

/// Everything needed to start a pipeline.
///
/// If `script_path` is set, the run is driven by that event script and
/// ends when the script is exhausted; otherwise the caller supplies a
/// scenario or live forcing source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimConfig {
    /// Grid columns.
    pub width: usize,
    /// Grid rows.
    pub height: usize,
    /// Columns per dispatch tile.
    pub tile_width: usize,
    /// Rows per dispatch tile.
    pub tile_height: usize,
    /// Whether snapshots are handed to the sink.
    pub export_enabled: bool,
    /// Frames between exports. Default: 10.
    pub export_interval: u64,
    /// Optional event script selecting scripted mode.
    pub script_path: Option<PathBuf>,
}

impl SimConfig {
    /// Default export interval, in frames.
    pub const DEFAULT_EXPORT_INTERVAL: u64 = 10;

    /// A `width × height` configuration with 16×16 tiles, export off,
    /// and no script.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tile_width: GridContext::DEFAULT_TILE,
            tile_height: GridContext::DEFAULT_TILE,
            export_enabled: false,
            export_interval: Self::DEFAULT_EXPORT_INTERVAL,
            script_path: None,
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < ArenaConfig::MIN_SIDE || self.height < ArenaConfig::MIN_SIDE {
            return Err(ConfigError::InvalidGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(ConfigError::ZeroTile);
        }
        if self.export_enabled && self.export_interval == 0 {
            return Err(ConfigError::ZeroExportInterval);
        }
        Ok(())
    }

    /// Grid dimensions.
    pub fn dims(&self) -> GridDims {
        GridDims::new(self.width, self.height)
    }

    /// Operator context for this grid and tile shape.
    pub fn grid_context(&self) -> GridContext {
        GridContext::new(self.dims(), self.tile_width, self.tile_height)
    }

    /// Arena configuration for this grid.
    pub fn arena_config(&self) -> ArenaConfig {
        ArenaConfig::new(self.width, self.height)
    }

    /// When snapshots are exported.
    pub fn export_cadence(&self) -> ExportCadence {
        if self.export_enabled {
            ExportCadence::Every(self.export_interval)
        } else {
            ExportCadence::Never
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = SimConfig::new(64, 64);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.export_cadence(), ExportCadence::Never);
        assert_eq!(cfg.grid_context().tile_width, 16);
    }

    #[test]
    fn tiny_grid_is_rejected() {
        match SimConfig::new(2, 64).validate() {
            Err(ConfigError::InvalidGrid {
                width: 2,
                height: 64,
            }) => {}
            other => panic!("expected InvalidGrid, got {other:?}"),
        }
    }

    #[test]
    fn zero_tile_is_rejected() {
        let mut cfg = SimConfig::new(8, 8);
        cfg.tile_height = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroTile)));
    }

    #[test]
    fn zero_interval_only_matters_when_exporting() {
        let mut cfg = SimConfig::new(8, 8);
        cfg.export_interval = 0;
        assert!(cfg.validate().is_ok());
        cfg.export_enabled = true;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ZeroExportInterval)
        ));
    }

    #[test]
    fn enabled_export_uses_interval() {
        let mut cfg = SimConfig::new(8, 8);
        cfg.export_enabled = true;
        assert_eq!(cfg.export_cadence(), ExportCadence::Every(10));
    }
}
