//! Export error types.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors raised while writing snapshot images.
#[derive(Debug)]
pub enum ExportError {
    /// The output directory could not be created.
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// An image file could not be created.
    CreateFile {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// PNG encoding failed.
    Encode {
        /// File path.
        path: PathBuf,
        /// Underlying encoder error.
        source: png::EncodingError,
    },
    /// The grid does not fit the PNG size fields.
    TooLarge {
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDir { path, source } => {
                write!(f, "cannot create directory {}: {source}", path.display())
            }
            Self::CreateFile { path, source } => {
                write!(f, "cannot create {}: {source}", path.display())
            }
            Self::Encode { path, source } => {
                write!(f, "cannot encode {}: {source}", path.display())
            }
            Self::TooLarge { width, height } => {
                write!(f, "grid {width}x{height} is too large for PNG")
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::CreateFile { source, .. } => Some(source),
            Self::Encode { source, .. } => Some(source),
            Self::TooLarge { .. } => None,
        }
    }
}
