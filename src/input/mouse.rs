//! Mouse protocol codec.
//!
//! Encodes the tracking-mode toggles and decodes the two report formats a
//! terminal can send:
//!
//! ```text
//! SGR:  ESC [ < button ; x ; y M      (press / drag / wheel / move)
//!       ESC [ < button ; x ; y m      (release)
//! X10:  ESC [ M <button+32> <x+33> <y+33>
//! ```
//!
//! Button bits: 0/1/2 = left/middle/right, 3 = none, +4 shift, +8 alt,
//! +16 ctrl, +32 motion, 64/65 = wheel up/down.

use super::csi::{self, ESC};
use super::events::{MouseAction, MouseButton, MouseEvent};

// =============================================================================
// Modes
// =============================================================================

/// Mouse tracking mode to request from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseMode {
    /// SGR coordinate encoding only (1006).
    Sgr,
    /// Press/release tracking with SGR encoding (1000 + 1006).
    Normal,
    /// Press/release/drag tracking with SGR encoding (1002 + 1006).
    ButtonEvent,
    /// All motion events with SGR encoding (1003 + 1006).
    Any,
}

/// Report encoding used when synthesizing mouse input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEncoding {
    Sgr,
    X10,
}

/// Enable mouse reporting in `mode`.
pub fn encode_enable(mode: MouseMode) -> &'static str {
    match mode {
        MouseMode::Sgr => "\x1b[?1006h",
        MouseMode::Normal => "\x1b[?1000h\x1b[?1006h",
        MouseMode::ButtonEvent => "\x1b[?1002h\x1b[?1006h",
        MouseMode::Any => "\x1b[?1003h\x1b[?1006h",
    }
}

/// Disable every mode [`encode_enable`] can turn on.
///
/// Resetting 1000 drops whichever tracking mode is active.
pub fn encode_disable() -> &'static str {
    "\x1b[?1000l\x1b[?1006l"
}

// =============================================================================
// Decoding
// =============================================================================

const SHIFT_BIT: u32 = 4;
const ALT_BIT: u32 = 8;
const CTRL_BIT: u32 = 16;
const MOTION_BIT: u32 = 32;
const WHEEL_BIT: u32 = 64;

/// Decode a complete mouse report (SGR or X10).
///
/// Returns `None` for anything else, including trailing bytes.
pub fn decode(seq: impl AsRef<[u8]>) -> Option<MouseEvent> {
    let seq = seq.as_ref();
    match decode_prefix(seq) {
        Some((event, len)) if len == seq.len() => Some(event),
        _ => None,
    }
}

/// Decode a mouse report at the start of `input`, returning the bytes it spans.
pub fn decode_prefix(input: &[u8]) -> Option<(MouseEvent, usize)> {
    if input.len() >= 3 && input[0] == ESC && input[1] == b'[' && input[2] == b'M' {
        return decode_x10(input);
    }
    decode_sgr(input)
}

fn decode_sgr(input: &[u8]) -> Option<(MouseEvent, usize)> {
    let csi = csi::scan(input)?;
    if csi.marker != Some(b'<') || !csi.intermediates.is_empty() {
        return None;
    }
    let release = match csi.final_byte {
        b'M' => false,
        b'm' => true,
        _ => return None,
    };

    let cb = csi.sections().next().and_then(csi::number)?;
    let x = clamp_coord(csi.param(1, 1));
    let y = clamp_coord(csi.param(2, 1));

    Some((build_event(cb, x, y, release), csi.len))
}

fn decode_x10(input: &[u8]) -> Option<(MouseEvent, usize)> {
    if input.len() < 6 {
        return None;
    }
    let cb = u32::from(input[3]).checked_sub(32)?;
    let x = u16::from(input[4]).checked_sub(33)?;
    let y = u16::from(input[5]).checked_sub(33)?;
    Some((build_event(cb, x, y, false), 6))
}

fn clamp_coord(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn build_event(cb: u32, x: u16, y: u16, release: bool) -> MouseEvent {
    let (button, action) = decode_button(cb, release);
    MouseEvent {
        x,
        y,
        button,
        action,
        shift: cb & SHIFT_BIT != 0,
        alt: cb & ALT_BIT != 0,
        ctrl: cb & CTRL_BIT != 0,
    }
}

fn decode_button(cb: u32, release: bool) -> (MouseButton, MouseAction) {
    if cb & WHEEL_BIT != 0 {
        let button = if cb & 1 == 0 { MouseButton::WheelUp } else { MouseButton::WheelDown };
        return (button, MouseAction::Wheel);
    }

    let button = match cb & 3 {
        0 => MouseButton::Left,
        1 => MouseButton::Middle,
        2 => MouseButton::Right,
        _ => MouseButton::None,
    };

    if release {
        (button, MouseAction::Up)
    } else if cb & MOTION_BIT != 0 {
        match button {
            MouseButton::None => (MouseButton::None, MouseAction::Move),
            pressed => (pressed, MouseAction::Drag),
        }
    } else if button == MouseButton::None {
        // X10 has no release marker; button 3 means "released".
        (MouseButton::None, MouseAction::Up)
    } else {
        (button, MouseAction::Down)
    }
}

// =============================================================================
// Encoding
// =============================================================================

fn encode_button(event: &MouseEvent, x10: bool) -> u32 {
    let mut cb = match event.button {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
        MouseButton::None => 3,
        MouseButton::WheelUp => WHEEL_BIT,
        MouseButton::WheelDown => WHEEL_BIT | 1,
    };
    if x10 && event.action == MouseAction::Up {
        cb = 3;
    }
    if matches!(event.action, MouseAction::Drag | MouseAction::Move) {
        cb |= MOTION_BIT;
    }
    if event.shift {
        cb |= SHIFT_BIT;
    }
    if event.alt {
        cb |= ALT_BIT;
    }
    if event.ctrl {
        cb |= CTRL_BIT;
    }
    cb
}

/// Encode an event as an SGR report.
pub fn encode_sgr(event: &MouseEvent) -> String {
    let terminator = if event.action == MouseAction::Up { 'm' } else { 'M' };
    format!(
        "\x1b[<{};{};{}{}",
        encode_button(event, false),
        event.x,
        event.y,
        terminator
    )
}

/// Encode an event as an X10 report.
///
/// X10 cannot name the released button, so releases decode back with
/// [`MouseButton::None`]. Returns `None` when a value does not fit in a byte.
pub fn encode_x10(event: &MouseEvent) -> Option<Vec<u8>> {
    let cb = u8::try_from(encode_button(event, true) + 32).ok()?;
    let x = u8::try_from(u32::from(event.x) + 33).ok()?;
    let y = u8::try_from(u32::from(event.y) + 33).ok()?;
    Some(vec![ESC, b'[', b'M', cb, x, y])
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_modes() {
        assert_eq!(encode_enable(MouseMode::Sgr), "\x1b[?1006h");
        assert!(encode_enable(MouseMode::Any).contains("\x1b[?1003h"));
        assert!(encode_enable(MouseMode::Any).contains("\x1b[?1006h"));
        assert_eq!(encode_disable(), "\x1b[?1000l\x1b[?1006l");
    }

    #[test]
    fn test_sgr_mouse_press() {
        let m = decode("\x1b[<0;10;20M").unwrap();
        assert_eq!(m.action, MouseAction::Down);
        assert_eq!(m.button, MouseButton::Left);
        assert_eq!(m.x, 10);
        assert_eq!(m.y, 20);
        assert!(!m.ctrl && !m.alt && !m.shift);
    }

    #[test]
    fn test_sgr_mouse_release() {
        let m = decode("\x1b[<2;1;1m").unwrap();
        assert_eq!(m.action, MouseAction::Up);
        assert_eq!(m.button, MouseButton::Right);
    }

    #[test]
    fn test_sgr_drag_and_move() {
        let m = decode("\x1b[<32;5;5M").unwrap();
        assert_eq!((m.button, m.action), (MouseButton::Left, MouseAction::Drag));
        let m = decode("\x1b[<35;5;5M").unwrap();
        assert_eq!((m.button, m.action), (MouseButton::None, MouseAction::Move));
    }

    #[test]
    fn test_sgr_scroll() {
        let m = decode("\x1b[<64;10;20M").unwrap();
        assert_eq!((m.button, m.action), (MouseButton::WheelUp, MouseAction::Wheel));
        let m = decode("\x1b[<65;10;20M").unwrap();
        assert_eq!((m.button, m.action), (MouseButton::WheelDown, MouseAction::Wheel));
    }

    #[test]
    fn test_sgr_modifiers() {
        let m = decode("\x1b[<4;1;1M").unwrap();
        assert!(m.shift && !m.alt && !m.ctrl);
        let m = decode("\x1b[<8;1;1M").unwrap();
        assert!(m.alt);
        let m = decode("\x1b[<17;1;1M").unwrap();
        assert!(m.ctrl);
        assert_eq!(m.button, MouseButton::Middle);
    }

    #[test]
    fn test_x10_decode() {
        let m = decode(b"\x1b[M\x20\x2a\x35").unwrap();
        assert_eq!((m.button, m.action), (MouseButton::Left, MouseAction::Down));
        assert_eq!(m.x, 9);
        assert_eq!(m.y, 20);

        let m = decode(b"\x1b[M\x23\x21\x21").unwrap();
        assert_eq!((m.button, m.action), (MouseButton::None, MouseAction::Up));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(decode("\x1b[A"), None);
        assert_eq!(decode("hello"), None);
        assert_eq!(decode("\x1b[<0;10;20"), None);
        assert_eq!(decode("\x1b[<0;10;20X"), None);
        assert_eq!(decode(b"\x1b[M\x20"), None);
        assert_eq!(decode(""), None);
    }

    #[test]
    fn test_sgr_round_trip() {
        let mut drag = MouseEvent::new(MouseAction::Drag, MouseButton::Right, 300, 2);
        drag.ctrl = true;
        drag.shift = true;
        let events = [
            MouseEvent::down(MouseButton::Left, 10, 20),
            MouseEvent::up(MouseButton::Middle, 1, 1),
            drag,
            MouseEvent::new(MouseAction::Move, MouseButton::None, 7, 9),
            MouseEvent::new(MouseAction::Wheel, MouseButton::WheelDown, 3, 4),
        ];
        for event in events {
            assert_eq!(decode(encode_sgr(&event)), Some(event));
        }
    }

    #[test]
    fn test_x10_round_trip() {
        let event = MouseEvent::down(MouseButton::Right, 40, 12);
        let bytes = encode_x10(&event).unwrap();
        assert_eq!(decode(&bytes), Some(event));

        let release = MouseEvent::up(MouseButton::Left, 40, 12);
        let decoded = decode(encode_x10(&release).unwrap()).unwrap();
        assert_eq!(decoded.button, MouseButton::None);
        assert_eq!(decoded.action, MouseAction::Up);

        assert!(encode_x10(&MouseEvent::down(MouseButton::Left, 300, 1)).is_none());
    }

    #[test]
    fn test_decode_prefix_length() {
        let (_, len) = decode_prefix(b"\x1b[<0;1;1Mabc").unwrap();
        assert_eq!(len, 9);
        let (_, len) = decode_prefix(b"\x1b[M !!tail").unwrap();
        assert_eq!(len, 6);
    }
}
