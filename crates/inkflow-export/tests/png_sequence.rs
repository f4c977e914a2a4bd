//! Integration test: PNG files written by the sequence sink.

use std::fs::File;
use std::path::{Path, PathBuf};

use inkflow_arena::GridFieldSet;
use inkflow_core::{Field, FrameId, GridDims};
use inkflow_engine::{FrameView, SnapshotSink};
use inkflow_export::{ExportLayers, PngSequenceSink};
use inkflow_ops::{CpuOperators, GridContext};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("inkflow-export-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn decode(path: &Path) -> (Vec<u8>, u32, u32) {
    let decoder = png::Decoder::new(File::open(path).unwrap());
    let mut reader = decoder.read_info().unwrap();
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).unwrap();
    buf.truncate(info.buffer_size());
    (buf, info.width, info.height)
}

#[test]
fn writes_both_layers_with_bottom_row_last() {
    let dir = scratch_dir("layers");
    let dims = GridDims::new(4, 3);
    let mut fields = GridFieldSet::new(4, 3).unwrap();
    // Bottom-left cell: red ink and positive pressure.
    fields.current_mut(Field::InkRed)[dims.index(0, 0)] = 200.0;
    fields.current_mut(Field::Pressure)[dims.index(0, 0)] = 2.0;
    let ctx = GridContext::with_default_tiles(dims);
    let ops = CpuOperators::new();

    let mut sink = PngSequenceSink::new(&dir).unwrap();
    sink.consume(&FrameView::new(fields.snapshot(FrameId(40)), &ops, &ctx))
        .unwrap();
    sink.finish().unwrap();

    let names: Vec<String> = sink
        .written()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["pressure-00040.png", "ink-00040.png"]);

    let (ink, width, height) = decode(&dir.join("ink-00040.png"));
    assert_eq!((width, height), (4, 3));
    // Image row 2 (last) is grid row 0.
    let bottom_left = 2 * 4 * 4;
    assert_eq!(&ink[bottom_left..bottom_left + 4], &[200, 0, 0, 255]);
    assert_eq!(&ink[0..4], &[0, 0, 0, 255]);

    let (pressure, _, _) = decode(&dir.join("pressure-00040.png"));
    assert_eq!(&pressure[bottom_left..bottom_left + 4], &[100, 0, 0, 100]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn ink_only_layer_selection() {
    let dir = scratch_dir("ink-only");
    let fields = GridFieldSet::new(3, 3).unwrap();
    let ctx = GridContext::with_default_tiles(GridDims::new(3, 3));
    let ops = CpuOperators::new();
    let layers = ExportLayers {
        pressure: false,
        ink: true,
    };

    let mut sink = PngSequenceSink::with_layers(&dir, layers).unwrap();
    sink.consume(&FrameView::new(fields.snapshot(FrameId(0)), &ops, &ctx))
        .unwrap();
    assert_eq!(sink.written().len(), 1);
    assert!(dir.join("ink-00000.png").exists());
    assert!(!dir.join("pressure-00000.png").exists());

    let _ = std::fs::remove_dir_all(&dir);
}
