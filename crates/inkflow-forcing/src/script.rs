//! Event scripts: time-windowed, linearly interpolated forcing.
//!
//! A script is plain text, one event per line, seven whitespace-separated
//! fields:
//!
//! ```text
//! frame_start frame_end x_start x_end y_start y_end amount
//! 0           120       0.2     0.8   0.5     0.5   40
//! ```
//!
//! Coordinates are grid fractions, clamped into `[0, 1]` and scaled to
//! grid units when the script is loaded. Blank lines are skipped. Any
//! other malformed line rejects the whole script, as does an empty
//! window (`frame_end <= frame_start`) or an event that starts before
//! its predecessor.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use inkflow_core::{ForcingAction, ForcingBatch, FrameId, GridDims, InkChannel};

use crate::source::ForcingSource;

/// Gain applied to the anchor displacement when deriving the velocity
/// impulse of an event.
const VELOCITY_GAIN: f32 = 10.0;

const FIELDS_PER_LINE: usize = 7;

// ── ScriptError ─────────────────────────────────────────────────

/// Errors from loading an event script.
#[derive(Debug)]
pub enum ScriptError {
    /// The script file could not be read.
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A line does not hold seven valid numbers.
    Malformed {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
    /// An event whose window is empty (`frame_end <= frame_start`).
    DegenerateWindow {
        /// 1-based line number.
        line: usize,
        /// The event's first frame.
        frame_start: u64,
        /// The event's end frame (exclusive).
        frame_end: u64,
    },
    /// An event starts before the event on the previous line.
    OutOfOrder {
        /// 1-based line number.
        line: usize,
    },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read script {}: {source}", path.display())
            }
            Self::Malformed { line, reason } => write!(f, "line {line}: {reason}"),
            Self::DegenerateWindow {
                line,
                frame_start,
                frame_end,
            } => write!(
                f,
                "line {line}: empty event window [{frame_start}, {frame_end})"
            ),
            Self::OutOfOrder { line } => {
                write!(f, "line {line}: event starts before the previous event")
            }
        }
    }
}

impl Error for ScriptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ── ForcingEvent ────────────────────────────────────────────────

/// One scripted forcing window, in grid units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForcingEvent {
    /// First frame of the window.
    pub frame_start: u64,
    /// First frame after the window.
    pub frame_end: u64,
    /// Column at `frame_start`.
    pub x_start: f32,
    /// Column the event moves towards.
    pub x_end: f32,
    /// Row at `frame_start`.
    pub y_start: f32,
    /// Row the event moves towards.
    pub y_end: f32,
    /// Ink added per frame.
    pub amount: f32,
}

/// Interpolated forcing for one frame of an event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InkData {
    /// Column, in grid units.
    pub x: f32,
    /// Row, in grid units.
    pub y: f32,
    /// Horizontal velocity impulse.
    pub u: f32,
    /// Vertical velocity impulse.
    pub v: f32,
    /// Ink amount.
    pub amount: f32,
}

impl ForcingEvent {
    /// Whether `frame` lies in `[frame_start, frame_end)`.
    pub fn is_active(&self, frame: FrameId) -> bool {
        (self.frame_start..self.frame_end).contains(&frame.0)
    }

    /// Whether the event has ended by `frame`.
    pub fn has_passed(&self, frame: FrameId) -> bool {
        frame.0 >= self.frame_end
    }

    /// Linear interpolation of the event at `frame`.
    ///
    /// Progress is `t = (frame - frame_start) / (frame_end - frame_start)`,
    /// so the position equals the start anchor at `frame_start` and
    /// approaches the end anchor on the last active frame. The velocity
    /// impulse is constant over the window.
    pub fn ink_data(&self, frame: FrameId) -> InkData {
        let span = (self.frame_end - self.frame_start) as f32;
        let t = frame.0.saturating_sub(self.frame_start) as f32 / span;
        InkData {
            x: self.x_start + t * (self.x_end - self.x_start),
            y: self.y_start + t * (self.y_end - self.y_start),
            u: VELOCITY_GAIN * (self.x_end - self.x_start) / span,
            v: VELOCITY_GAIN * (self.y_end - self.y_start) / span,
            amount: self.amount,
        }
    }
}

impl InkData {
    /// The forcing action for this data on `channel`. The position is
    /// truncated to a cell and kept inside the grid.
    pub fn to_action(&self, channel: InkChannel, dims: GridDims) -> ForcingAction {
        let max_x = dims.width.saturating_sub(1) as i64;
        let max_y = dims.height.saturating_sub(1) as i64;
        ForcingAction {
            channel,
            x: (self.x as i64).clamp(0, max_x),
            y: (self.y as i64).clamp(0, max_y),
            u: self.u,
            v: self.v,
            amount: self.amount,
        }
    }
}

// ── Parsing ─────────────────────────────────────────────────────

/// Parse a script into events scaled to `dims`.
pub fn parse_script(text: &str, dims: GridDims) -> Result<Vec<ForcingEvent>, ScriptError> {
    let mut events: Vec<ForcingEvent> = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let fields: Vec<&str> = raw.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != FIELDS_PER_LINE {
            return Err(ScriptError::Malformed {
                line,
                reason: format!(
                    "expected {FIELDS_PER_LINE} fields, found {}",
                    fields.len()
                ),
            });
        }

        let frame_start = parse_frame(fields[0], line, "frame_start")?;
        let frame_end = parse_frame(fields[1], line, "frame_end")?;
        if frame_end <= frame_start {
            return Err(ScriptError::DegenerateWindow {
                line,
                frame_start,
                frame_end,
            });
        }
        if events.last().is_some_and(|prev| frame_start < prev.frame_start) {
            return Err(ScriptError::OutOfOrder { line });
        }

        let width = dims.width as f32;
        let height = dims.height as f32;
        events.push(ForcingEvent {
            frame_start,
            frame_end,
            x_start: parse_coord(fields[2], line, "x_start")? * width,
            x_end: parse_coord(fields[3], line, "x_end")? * width,
            y_start: parse_coord(fields[4], line, "y_start")? * height,
            y_end: parse_coord(fields[5], line, "y_end")? * height,
            amount: parse_real(fields[6], line, "amount")?,
        });
    }
    Ok(events)
}

fn parse_frame(token: &str, line: usize, name: &str) -> Result<u64, ScriptError> {
    token.parse().map_err(|_| ScriptError::Malformed {
        line,
        reason: format!("{name} '{token}' is not a frame number"),
    })
}

fn parse_real(token: &str, line: usize, name: &str) -> Result<f32, ScriptError> {
    match token.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ScriptError::Malformed {
            line,
            reason: format!("{name} '{token}' is not a finite number"),
        }),
    }
}

fn parse_coord(token: &str, line: usize, name: &str) -> Result<f32, ScriptError> {
    Ok(parse_real(token, line, name)?.clamp(0.0, 1.0))
}

// ── ScriptedEvents ──────────────────────────────────────────────

/// Forcing source that plays back a loaded event script.
///
/// One event is active at a time: the lowest-index event whose window
/// has not ended. The cursor only moves forward, so an event never
/// emits again once its window is over. All forcing goes to the red ink
/// channel.
#[derive(Debug)]
pub struct ScriptedEvents {
    events: Vec<ForcingEvent>,
    cursor: usize,
    channel: InkChannel,
    dims: GridDims,
}

impl ScriptedEvents {
    /// Play back pre-parsed events on a grid of `dims`.
    pub fn new(events: Vec<ForcingEvent>, dims: GridDims) -> Self {
        Self {
            events,
            cursor: 0,
            channel: InkChannel::Red,
            dims,
        }
    }

    /// Parse `text` and play it back on a grid of `dims`.
    pub fn parse(text: &str, dims: GridDims) -> Result<Self, ScriptError> {
        Ok(Self::new(parse_script(text, dims)?, dims))
    }

    /// Read and parse the script at `path`.
    pub fn load(path: impl AsRef<Path>, dims: GridDims) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let script = Self::parse(&text, dims)?;
        tracing::info!(
            "loaded {} forcing events from {}",
            script.events.len(),
            path.display()
        );
        Ok(script)
    }

    /// All events, in playback order.
    pub fn events(&self) -> &[ForcingEvent] {
        &self.events
    }

    /// Index of the active event (equal to `events().len()` once the
    /// script is exhausted).
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl ForcingSource for ScriptedEvents {
    fn name(&self) -> &str {
        "scripted_events"
    }

    fn forcing_for_frame(&mut self, frame: FrameId) -> ForcingBatch {
        let mut batch = ForcingBatch::new();
        while let Some(event) = self.events.get(self.cursor) {
            if event.has_passed(frame) {
                self.cursor += 1;
                tracing::debug!(frame = frame.0, cursor = self.cursor, "retired forcing event");
                continue;
            }
            if event.is_active(frame) {
                batch.push(event.ink_data(frame).to_action(self.channel, self.dims));
            }
            break;
        }
        batch
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> GridDims {
        GridDims::new(100, 50)
    }

    #[test]
    fn parse_scales_and_clamps_coordinates() {
        let events = parse_script("0 10 0.25 1.5 -0.2 0.5 40\n", dims()).unwrap();
        assert_eq!(
            events,
            vec![ForcingEvent {
                frame_start: 0,
                frame_end: 10,
                x_start: 25.0,
                x_end: 100.0,
                y_start: 0.0,
                y_end: 25.0,
                amount: 40.0,
            }]
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let text = "\n0 10 0 0 0 0 1\n   \n10 20 0 0 0 0 1\n";
        let events = parse_script(text, dims()).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        let err = parse_script("0 10 0 0 0 0 1\n0 10 0.5\n", dims()).unwrap_err();
        match err {
            ScriptError::Malformed { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("found 3"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let err = parse_script("0 ten 0 0 0 0 1", dims()).unwrap_err();
        assert!(matches!(err, ScriptError::Malformed { line: 1, .. }));
        let err = parse_script("0 10 0 0 0 0 NaN", dims()).unwrap_err();
        assert!(matches!(err, ScriptError::Malformed { line: 1, .. }));
        let err = parse_script("-1 10 0 0 0 0 1", dims()).unwrap_err();
        assert!(matches!(err, ScriptError::Malformed { line: 1, .. }));
    }

    #[test]
    fn degenerate_window_is_rejected() {
        let err = parse_script("5 5 0 0 0 0 1", dims()).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::DegenerateWindow {
                line: 1,
                frame_start: 5,
                frame_end: 5,
            }
        ));
        assert!(parse_script("6 5 0 0 0 0 1", dims()).is_err());
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        let err = parse_script("10 20 0 0 0 0 1\n5 8 0 0 0 0 1", dims()).unwrap_err();
        assert!(matches!(err, ScriptError::OutOfOrder { line: 2 }));
    }

    #[test]
    fn ink_data_is_exact_at_window_start() {
        let event = ForcingEvent {
            frame_start: 20,
            frame_end: 30,
            x_start: 10.0,
            x_end: 60.0,
            y_start: 5.0,
            y_end: 45.0,
            amount: 7.0,
        };
        let d = event.ink_data(FrameId(20));
        assert_eq!((d.x, d.y), (10.0, 5.0));
        assert_eq!(d.u, 10.0 * 50.0 / 10.0);
        assert_eq!(d.v, 10.0 * 40.0 / 10.0);
        assert_eq!(d.amount, 7.0);

        let last = event.ink_data(FrameId(29));
        assert!((last.x - 55.0).abs() < 1e-4);
        assert!((last.y - 41.0).abs() < 1e-4);
    }

    #[test]
    fn action_position_stays_inside_grid() {
        let d = InkData {
            x: 100.0,
            y: 50.0,
            u: 0.0,
            v: 0.0,
            amount: 1.0,
        };
        let a = d.to_action(InkChannel::Red, dims());
        assert_eq!((a.x, a.y), (99, 49));
    }

    #[test]
    fn scripted_source_emits_inside_window_only() {
        let mut src = ScriptedEvents::parse("2 4 0.5 0.5 0.5 0.5 9", dims()).unwrap();
        let emitted: Vec<u64> = (0..8)
            .filter(|&f| !src.forcing_for_frame(FrameId(f)).is_empty())
            .collect();
        assert_eq!(emitted, vec![2, 3]);
        assert!(src.is_exhausted());
    }

    #[test]
    fn scripted_source_forces_red_channel() {
        let mut src = ScriptedEvents::parse("0 4 0.5 0.5 0.5 0.5 9", dims()).unwrap();
        let batch = src.forcing_for_frame(FrameId(0));
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].channel, InkChannel::Red);
        assert_eq!((batch[0].x, batch[0].y), (50, 25));
        assert_eq!(batch[0].amount, 9.0);
    }

    #[test]
    fn exhaustion_is_reported_after_last_window() {
        let mut src = ScriptedEvents::parse("0 2 0 0 0 0 1", dims()).unwrap();
        assert!(!src.is_exhausted());
        src.forcing_for_frame(FrameId(0));
        src.forcing_for_frame(FrameId(1));
        assert!(!src.is_exhausted());
        assert!(src.forcing_for_frame(FrameId(2)).is_empty());
        assert!(src.is_exhausted());
    }

    #[test]
    fn empty_script_is_exhausted_immediately() {
        let src = ScriptedEvents::parse("", dims()).unwrap();
        assert!(src.is_exhausted());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ScriptedEvents::load("/nonexistent/inkflow/script.txt", dims()).unwrap_err();
        assert!(matches!(err, ScriptError::Io { .. }));
        assert!(err.source().is_some());
    }
}
