//! Numerical parameters of the fractional-step scheme.
//!
//! [`SimParams`] is an immutable value handed to the scheduler at
//! construction. Defaults reproduce the reference constants; a YAML
//! file may override any subset of them.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ── ParamsError ─────────────────────────────────────────────────

/// Errors from loading or validating [`SimParams`].
#[derive(Debug)]
pub enum ParamsError {
    /// The parameter file could not be read.
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The parameter file is not valid YAML for [`SimParams`].
    Parse(serde_yaml::Error),
    /// A parameter is out of range.
    Invalid {
        /// Parameter name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read parameters {}: {source}", path.display())
            }
            Self::Parse(e) => write!(f, "invalid parameter file: {e}"),
            Self::Invalid { name, reason } => write!(f, "invalid parameter {name}: {reason}"),
        }
    }
}

impl Error for ParamsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_yaml::Error> for ParamsError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Parse(e)
    }
}

// ── SimParams ───────────────────────────────────────────────────

/// Immutable simulation parameters.
///
/// Derived coefficients (`rdx`, `alpha_*`, `rbeta_*`) are computed on
/// demand so they can never disagree with the base values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimParams {
    /// Time step per frame. Default: 0.001.
    pub dt: f32,
    /// Grid spacing. Default: 0.1.
    pub dx: f32,
    /// Kinematic viscosity. Default: 0.001.
    pub viscosity: f32,
    /// Jacobi sweeps per solve, for both diffusion and pressure.
    /// Fixed; there is no residual check. Default: 35.
    pub poisson_steps: u32,
    /// Scan velocity for NaN/inf after projection. Default: off.
    pub check_finite: bool,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            dt: 0.001,
            dx: 0.1,
            viscosity: 0.001,
            poisson_steps: 35,
            check_finite: false,
        }
    }
}

impl SimParams {
    /// Reciprocal grid spacing, `1 / dx`.
    pub fn rdx(&self) -> f32 {
        1.0 / self.dx
    }

    /// Half reciprocal grid spacing, `0.5 / dx`.
    pub fn halfrdx(&self) -> f32 {
        0.5 * self.rdx()
    }

    /// Jacobi `alpha` for viscous diffusion, `dx² / (viscosity · dt)`.
    pub fn alpha_diffusion(&self) -> f32 {
        self.dx * self.dx / (self.viscosity * self.dt)
    }

    /// Jacobi `rbeta` for viscous diffusion, `1 / (4 + alpha)`.
    pub fn rbeta_diffusion(&self) -> f32 {
        1.0 / (4.0 + self.alpha_diffusion())
    }

    /// Jacobi `alpha` for the pressure solve, `-dx²`.
    pub fn alpha_pressure(&self) -> f32 {
        -self.dx * self.dx
    }

    /// Jacobi `rbeta` for the pressure solve.
    pub fn rbeta_pressure(&self) -> f32 {
        0.25
    }

    /// Check every parameter is usable.
    pub fn validate(&self) -> Result<(), ParamsError> {
        for (name, value) in [
            ("dt", self.dt),
            ("dx", self.dx),
            ("viscosity", self.viscosity),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ParamsError::Invalid {
                    name,
                    reason: format!("must be finite and positive (got {value})"),
                });
            }
        }
        if self.poisson_steps == 0 {
            return Err(ParamsError::Invalid {
                name: "poisson_steps",
                reason: "must be at least 1".into(),
            });
        }
        if !self.alpha_diffusion().is_finite() {
            return Err(ParamsError::Invalid {
                name: "viscosity",
                reason: "diffusion coefficient overflows".into(),
            });
        }
        Ok(())
    }

    /// Parse and validate parameters from YAML. Missing keys keep their
    /// defaults; unknown keys are rejected.
    pub fn from_yaml_str(text: &str) -> Result<Self, ParamsError> {
        let params: Self = serde_yaml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    /// Read, parse and validate a YAML parameter file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ParamsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }
}
