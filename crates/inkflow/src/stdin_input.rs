//! Line protocol for driving live mode from standard input.
//!
//! One command per line, pointer coordinates in grid cells with row 0 at
//! the top:
//!
//! ```text
//! down X Y     press primary button (adds ink) at X Y
//! down2 X Y    press secondary button (momentum only)
//! move X Y     move the pointer
//! up | up2     release primary | secondary
//! red | green | blue | cycle
//! reset        clear every field
//! quit         stop after the current frame
//! ```

use std::io::BufRead;

use inkflow_core::InkChannel;
use inkflow_engine::StopHandle;
use inkflow_forcing::{InputEvent, InputSendError, InputSender, PointerButton};

/// One parsed line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineCommand {
    /// Forward to the live input source.
    Input(InputEvent),
    /// Stop the run.
    Quit,
}

/// Parse one protocol line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<LineCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let event = match (verb, args.as_slice()) {
        ("down", [x, y]) => InputEvent::Pressed {
            button: PointerButton::Primary,
            x: coord(x)?,
            y: coord(y)?,
        },
        ("down2", [x, y]) => InputEvent::Pressed {
            button: PointerButton::Secondary,
            x: coord(x)?,
            y: coord(y)?,
        },
        ("move", [x, y]) => InputEvent::Moved {
            x: coord(x)?,
            y: coord(y)?,
        },
        ("up", []) => InputEvent::Released {
            button: PointerButton::Primary,
        },
        ("up2", []) => InputEvent::Released {
            button: PointerButton::Secondary,
        },
        ("red", []) => InputEvent::SelectChannel(InkChannel::Red),
        ("green", []) => InputEvent::SelectChannel(InkChannel::Green),
        ("blue", []) => InputEvent::SelectChannel(InkChannel::Blue),
        ("cycle", []) => InputEvent::CycleChannel,
        ("reset", []) => InputEvent::Reset,
        ("quit", []) => return Ok(Some(LineCommand::Quit)),
        _ => return Err(format!("unrecognised command '{}'", line.trim())),
    };
    Ok(Some(LineCommand::Input(event)))
}

fn coord(token: &str) -> Result<i64, String> {
    token
        .parse()
        .map_err(|_| format!("'{token}' is not an integer coordinate"))
}

/// Forward protocol lines from `reader` until end of input, a `quit`
/// line, or the simulation hanging up.
///
/// Dropping `sender` on return disconnects the live source, which ends
/// the run.
pub fn pump(reader: impl BufRead, sender: InputSender, stop: StopHandle) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("stdin read failed: {e}");
                break;
            }
        };
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(LineCommand::Quit)) => {
                stop.stop();
                break;
            }
            Ok(Some(LineCommand::Input(event))) => match sender.send(event) {
                Ok(()) => {}
                Err(InputSendError::Full) => tracing::warn!("input queue full, dropped event"),
                Err(InputSendError::Disconnected) => break,
            },
            Err(reason) => tracing::warn!("ignoring input line: {reason}"),
        }
    }
    tracing::debug!("stdin input closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_commands() {
        assert_eq!(
            parse_line("down 3 4").unwrap(),
            Some(LineCommand::Input(InputEvent::Pressed {
                button: PointerButton::Primary,
                x: 3,
                y: 4,
            }))
        );
        assert_eq!(
            parse_line("  move -1 7 ").unwrap(),
            Some(LineCommand::Input(InputEvent::Moved { x: -1, y: 7 }))
        );
        assert_eq!(
            parse_line("up2").unwrap(),
            Some(LineCommand::Input(InputEvent::Released {
                button: PointerButton::Secondary,
            }))
        );
    }

    #[test]
    fn key_commands() {
        assert_eq!(
            parse_line("blue").unwrap(),
            Some(LineCommand::Input(InputEvent::SelectChannel(InkChannel::Blue)))
        );
        assert_eq!(
            parse_line("reset").unwrap(),
            Some(LineCommand::Input(InputEvent::Reset))
        );
        assert_eq!(parse_line("quit").unwrap(), Some(LineCommand::Quit));
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn bad_lines_are_rejected() {
        assert!(parse_line("down 3").is_err());
        assert!(parse_line("down x 4").is_err());
        assert!(parse_line("jump").is_err());
        assert!(parse_line("red 1").is_err());
    }

    #[test]
    fn pump_stops_on_quit() {
        let (_live, sender) = inkflow_forcing::LiveInput::new(16);
        let stop = StopHandle::default();
        pump("down 1 1\nquit\nmove 2 2\n".as_bytes(), sender, stop.clone());
        assert!(stop.is_stopped());
    }
}
