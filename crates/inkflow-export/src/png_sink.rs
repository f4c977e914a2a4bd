//! Numbered PNG sequence writer.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use inkflow_core::GridDims;
use inkflow_engine::{FrameView, SinkError, SnapshotSink};

use crate::error::ExportError;

/// Which images are written per exported frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportLayers {
    /// Write `pressure-NNNNN.png`.
    pub pressure: bool,
    /// Write `ink-NNNNN.png`.
    pub ink: bool,
}

impl Default for ExportLayers {
    fn default() -> Self {
        Self {
            pressure: true,
            ink: true,
        }
    }
}

/// Writes every frame it receives as PNG files in one directory.
///
/// File names carry the zero-padded frame index, e.g.
/// `ink-00040.png`. Grid row 0 is the bottom of the image.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    layers: ExportLayers,
    written: Vec<PathBuf>,
}

impl PngSequenceSink {
    /// Create `dir` if needed and write both layers into it.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ExportError> {
        Self::with_layers(dir, ExportLayers::default())
    }

    /// Create `dir` if needed and write the selected layers into it.
    pub fn with_layers(dir: impl Into<PathBuf>, layers: ExportLayers) -> Result<Self, ExportError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ExportError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            layers,
            written: Vec::new(),
        })
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every file written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write_layer(
        &mut self,
        layer: &str,
        frame: u64,
        dims: GridDims,
        rgba: &[u8],
    ) -> Result<(), ExportError> {
        let path = self.dir.join(format!("{layer}-{frame:05}.png"));
        write_png(&path, dims, rgba)?;
        tracing::debug!(path = %path.display(), "wrote snapshot");
        self.written.push(path);
        Ok(())
    }
}

impl SnapshotSink for PngSequenceSink {
    fn name(&self) -> &str {
        "png"
    }

    fn consume(&mut self, view: &FrameView<'_>) -> Result<(), SinkError> {
        let frame = view.frame().0;
        let dims = view.context().dims;
        if self.layers.pressure {
            let rgba = view.pressure_rgba()?;
            self.write_layer("pressure", frame, dims, &rgba)
                .map_err(failed)?;
        }
        if self.layers.ink {
            let rgba = view.ink_rgba()?;
            self.write_layer("ink", frame, dims, &rgba).map_err(failed)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        tracing::info!(
            files = self.written.len(),
            dir = %self.dir.display(),
            "png export complete"
        );
        Ok(())
    }
}

fn failed(e: ExportError) -> SinkError {
    SinkError::Failed {
        sink: "png".into(),
        reason: Box::new(e),
    }
}

/// Encode row-major RGBA with row 0 at the bottom of the image.
fn write_png(path: &Path, dims: GridDims, rgba: &[u8]) -> Result<(), ExportError> {
    let too_large = || ExportError::TooLarge {
        width: dims.width,
        height: dims.height,
    };
    let width = u32::try_from(dims.width).map_err(|_| too_large())?;
    let height = u32::try_from(dims.height).map_err(|_| too_large())?;

    let file = File::create(path).map_err(|source| ExportError::CreateFile {
        path: path.to_path_buf(),
        source,
    })?;
    let encode = |source| ExportError::Encode {
        path: path.to_path_buf(),
        source,
    };

    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(encode)?;

    let stride = dims.width * 4;
    let flipped: Vec<u8> = rgba
        .chunks_exact(stride)
        .rev()
        .flatten()
        .copied()
        .collect();
    writer.write_image_data(&flipped).map_err(encode)?;
    writer.finish().map_err(encode)
}
