//! Live pointer input.
//!
//! A UI or input thread pushes [`InputEvent`]s through an
//! [`InputSender`]; [`LiveInput`] drains the channel once per frame and
//! turns pointer motion into a forcing action. Positions arrive in
//! screen coordinates (origin top-left, y down) and are flipped into
//! grid coordinates (origin bottom-left, y up).

use std::error::Error;
use std::fmt;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use inkflow_core::{ForcingAction, ForcingBatch, FrameId, InkChannel};

use crate::source::ForcingSource;

/// Velocity impulse per pixel of pointer motion between frames.
pub const MOTION_GAIN: f32 = 50.0;

/// Ink added per frame while the primary button is held.
pub const PRIMARY_INK: f32 = 100.0;

/// Capacity of the input channel. Input producers block nothing: a full
/// channel drops the event.
const INPUT_CAPACITY: usize = 1024;

/// Pointer buttons that drive forcing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    /// Adds momentum and ink.
    Primary,
    /// Adds momentum only.
    Secondary,
}

/// One input event, in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// A button went down with the pointer at `(x, y)`.
    Pressed {
        /// Which button.
        button: PointerButton,
        /// Pointer column.
        x: i64,
        /// Pointer row, from the top.
        y: i64,
    },
    /// The pointer moved to `(x, y)`.
    Moved {
        /// Pointer column.
        x: i64,
        /// Pointer row, from the top.
        y: i64,
    },
    /// A button was released.
    Released {
        /// Which button.
        button: PointerButton,
    },
    /// Select the ink channel for subsequent forcing.
    SelectChannel(InkChannel),
    /// Advance the ink channel selector `Red → Green → Blue → Red`.
    CycleChannel,
    /// Ask the driver to clear every field.
    Reset,
}

/// Error returned by [`InputSender::send`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSendError {
    /// The simulation has not drained earlier events yet.
    Full,
    /// The [`LiveInput`] was dropped.
    Disconnected,
}

impl fmt::Display for InputSendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "input queue is full"),
            Self::Disconnected => write!(f, "live input has shut down"),
        }
    }
}

impl Error for InputSendError {}

/// Cloneable handle for pushing input events into a [`LiveInput`].
#[derive(Clone, Debug)]
pub struct InputSender {
    tx: Sender<InputEvent>,
}

impl InputSender {
    /// Queue `event` without blocking.
    pub fn send(&self, event: InputEvent) -> Result<(), InputSendError> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => InputSendError::Full,
            TrySendError::Disconnected(_) => InputSendError::Disconnected,
        })
    }
}

/// Forcing source driven by interactive pointer input.
///
/// Each frame the impulse is the pointer displacement since the previous
/// frame times [`MOTION_GAIN`], applied at the current pointer cell.
/// The primary button adds [`PRIMARY_INK`] of the selected channel; the
/// secondary button adds momentum only. Releasing all buttons forgets
/// the previous position, so the first frame of a new stroke produces
/// no impulse.
#[derive(Debug)]
pub struct LiveInput {
    rx: Receiver<InputEvent>,
    grid_height: i64,
    channel: InkChannel,
    primary: bool,
    secondary: bool,
    pointer: Option<(i64, i64)>,
    previous: Option<(i64, i64)>,
    reset_requested: bool,
    disconnected: bool,
}

impl LiveInput {
    /// Create a live input source for a grid `grid_height` rows tall,
    /// plus the sender that feeds it.
    pub fn new(grid_height: usize) -> (Self, InputSender) {
        let (tx, rx) = crossbeam_channel::bounded(INPUT_CAPACITY);
        let input = Self {
            rx,
            grid_height: grid_height as i64,
            channel: InkChannel::Red,
            primary: false,
            secondary: false,
            pointer: None,
            previous: None,
            reset_requested: false,
            disconnected: false,
        };
        (input, InputSender { tx })
    }

    /// The currently selected ink channel.
    pub fn channel(&self) -> InkChannel {
        self.channel
    }

    fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Pressed { button, x, y } => {
                self.set_button(button, true);
                self.pointer = Some((x, y));
            }
            InputEvent::Moved { x, y } => self.pointer = Some((x, y)),
            InputEvent::Released { button } => self.set_button(button, false),
            InputEvent::SelectChannel(channel) => self.channel = channel,
            InputEvent::CycleChannel => self.channel = self.channel.next(),
            InputEvent::Reset => self.reset_requested = true,
        }
    }

    fn set_button(&mut self, button: PointerButton, down: bool) {
        match button {
            PointerButton::Primary => self.primary = down,
            PointerButton::Secondary => self.secondary = down,
        }
    }

    fn drain(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        tracing::info!("live input closed");
                    }
                    self.disconnected = true;
                    break;
                }
            }
        }
    }
}

impl ForcingSource for LiveInput {
    fn name(&self) -> &str {
        "live_input"
    }

    fn forcing_for_frame(&mut self, _frame: FrameId) -> ForcingBatch {
        self.drain();
        let mut batch = ForcingBatch::new();

        if !(self.primary || self.secondary) {
            self.previous = None;
            return batch;
        }
        let Some((x, y)) = self.pointer else {
            return batch;
        };
        if let Some((px, py)) = self.previous {
            batch.push(ForcingAction {
                channel: self.channel,
                x,
                y: self.grid_height - y,
                u: (x - px) as f32 * MOTION_GAIN,
                v: -((y - py) as f32) * MOTION_GAIN,
                amount: if self.primary { PRIMARY_INK } else { 0.0 },
            });
        }
        self.previous = Some((x, y));
        batch
    }

    fn is_exhausted(&self) -> bool {
        self.disconnected
    }

    fn take_reset_request(&mut self) -> bool {
        std::mem::take(&mut self.reset_requested)
    }
}
