//! Input synthesis - the bytes a terminal would send for an event.
//!
//! The inverse of the decoders in [`crate::input`]: feed the output of these
//! encoders to [`crate::input::parse`] and the original event comes back
//! (within what the chosen wire format can carry).
//!
//! The [`VirtualTerminal`] helpers pick the encoding from the modes the
//! application has negotiated with it, so a test can write setup sequences
//! to the terminal and then inject input the way a real terminal would.
//!
//! # Legacy encoding limits
//!
//! - Ctrl+I, Ctrl+M, Ctrl+J and Ctrl+H collide with Tab, Enter and Backspace.
//! - Shift on a character key is folded into the character itself.
//! - Release events and F13+ have no legacy form and encode to nothing.
//! - Alt+Escape is `ESC ESC`, which decodes as two Escape presses.

use crate::input::events::{KeyEvent, KeyEventType, Modifiers, MouseEvent};
use crate::input::keyboard::{encode_extended_key, key_codes, printable, ModifierBits};
use crate::input::mouse::{encode_sgr, encode_x10};
use crate::input::paste;
use crate::input::{MouseEncoding, ProtocolMode};

use super::virtual_terminal::{TerminalModes, VirtualTerminal};

// =============================================================================
// Keys
// =============================================================================

/// Encode a key event in the given keyboard protocol.
pub fn encode_key(key: &KeyEvent, mode: ProtocolMode) -> Vec<u8> {
    match mode {
        ProtocolMode::Extended => encode_extended_key(key).into_bytes(),
        ProtocolMode::Legacy => encode_legacy_key(key),
    }
}

fn encode_legacy_key(key: &KeyEvent) -> Vec<u8> {
    if key.event_type == KeyEventType::Release {
        return Vec::new();
    }
    let mods = key.modifiers;

    // Keys reported as CSI/SS3 sequences carry modifiers in a parameter.
    if let Some(out) = encode_legacy_sequence(key.key_code, mods) {
        return out.into_bytes();
    }

    let mut out = Vec::new();
    if mods.alt {
        out.push(0x1b);
    }

    match key.key_code {
        key_codes::ENTER => out.push(b'\r'),
        key_codes::TAB if mods.shift => return b"\x1b[Z".to_vec(),
        key_codes::TAB => out.push(b'\t'),
        key_codes::BACKSPACE => out.push(0x7f),
        key_codes::ESCAPE => out.push(0x1b),
        code => {
            let Some(ch) = printable(code) else {
                tracing::trace!(code, "key has no legacy encoding");
                return Vec::new();
            };
            match ctrl_byte(ch).filter(|_| mods.ctrl) {
                Some(byte) => out.push(byte),
                None if key.text.is_empty() => {
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                }
                None => out.extend_from_slice(key.text.as_bytes()),
            }
        }
    }
    out
}

/// Navigation and function keys.
fn encode_legacy_sequence(code: u32, mods: Modifiers) -> Option<String> {
    let modifier = ModifierBits::from(mods).to_wire();

    // `ESC [ 1 ; m X` when modified, otherwise the short form.
    let lettered = |letter: char, short: &str| {
        if modifier > 1 {
            format!("\x1b[1;{modifier}{letter}")
        } else {
            short.to_string()
        }
    };
    let tilde = |n: u32| {
        if modifier > 1 {
            format!("\x1b[{n};{modifier}~")
        } else {
            format!("\x1b[{n}~")
        }
    };

    let seq = match code {
        key_codes::UP => lettered('A', "\x1b[A"),
        key_codes::DOWN => lettered('B', "\x1b[B"),
        key_codes::RIGHT => lettered('C', "\x1b[C"),
        key_codes::LEFT => lettered('D', "\x1b[D"),
        key_codes::HOME => lettered('H', "\x1b[H"),
        key_codes::END => lettered('F', "\x1b[F"),
        key_codes::INSERT => tilde(2),
        key_codes::DELETE => tilde(3),
        key_codes::PAGE_UP => tilde(5),
        key_codes::PAGE_DOWN => tilde(6),
        _ if (key_codes::function(1)..=key_codes::function(12)).contains(&code) => {
            let n = code - key_codes::F1 + 1;
            match n {
                1 => lettered('P', "\x1bOP"),
                2 => lettered('Q', "\x1bOQ"),
                3 => lettered('R', "\x1bOR"),
                4 => lettered('S', "\x1bOS"),
                5 => tilde(15),
                6..=10 => tilde(n + 11),
                _ => tilde(n + 12),
            }
        }
        _ => return None,
    };
    Some(seq)
}

/// The C0 byte for Ctrl+`ch`, if there is one.
fn ctrl_byte(ch: char) -> Option<u8> {
    match ch.to_ascii_lowercase() {
        ' ' | '@' => Some(0x00),
        c @ 'a'..='z' => Some(c as u8 - b'a' + 1),
        c @ ('\\' | ']' | '^' | '_') => Some(c as u8 - 0x40),
        _ => None,
    }
}

// =============================================================================
// Mouse & Paste
// =============================================================================

/// Encode a mouse event. `None` when X10 cannot carry the coordinates.
pub fn encode_mouse(event: &MouseEvent, encoding: MouseEncoding) -> Option<Vec<u8>> {
    match encoding {
        MouseEncoding::Sgr => Some(encode_sgr(event).into_bytes()),
        MouseEncoding::X10 => encode_x10(event),
    }
}

/// Encode pasted text, wrapped in markers when `bracketed`.
pub fn encode_paste(text: &str, bracketed: bool) -> Vec<u8> {
    if bracketed {
        paste::wrap(text)
    } else {
        text.as_bytes().to_vec()
    }
}

// =============================================================================
// Negotiated Input
// =============================================================================

impl VirtualTerminal {
    /// Keyboard protocol the application has enabled.
    pub fn keyboard_protocol(&self) -> ProtocolMode {
        if self.keyboard_flags().is_empty() {
            ProtocolMode::Legacy
        } else {
            ProtocolMode::Extended
        }
    }

    /// Bytes this terminal would send for `key`.
    pub fn key_bytes(&self, key: &KeyEvent) -> Vec<u8> {
        encode_key(key, self.keyboard_protocol())
    }

    /// Bytes this terminal would send for `event`. `None` while mouse
    /// reporting is off.
    pub fn mouse_bytes(&self, event: &MouseEvent) -> Option<Vec<u8>> {
        if !self.mouse_enabled() {
            return None;
        }
        let encoding = if self.modes().contains(TerminalModes::MOUSE_SGR) {
            MouseEncoding::Sgr
        } else {
            MouseEncoding::X10
        };
        encode_mouse(event, encoding)
    }

    /// Bytes this terminal would send for a paste of `text`.
    pub fn paste_bytes(&self, text: &str) -> Vec<u8> {
        encode_paste(text, self.bracketed_paste())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::events::{MouseAction, MouseButton, PasteEvent};
    use crate::input::parse;

    fn legacy(key: &KeyEvent) -> Vec<u8> {
        encode_key(key, ProtocolMode::Legacy)
    }

    fn roundtrip(key: &KeyEvent, mode: ProtocolMode) -> Vec<KeyEvent> {
        parse(encode_key(key, mode)).keys
    }

    #[test]
    fn test_legacy_plain_chars() {
        assert_eq!(legacy(&KeyEvent::char('a')), b"a");
        assert_eq!(legacy(&KeyEvent::char('é')), "é".as_bytes());
    }

    #[test]
    fn test_legacy_named_keys() {
        assert_eq!(legacy(&KeyEvent::code(key_codes::ENTER)), b"\r");
        assert_eq!(legacy(&KeyEvent::code(key_codes::TAB)), b"\t");
        assert_eq!(legacy(&KeyEvent::code(key_codes::BACKSPACE)), b"\x7f");
        assert_eq!(legacy(&KeyEvent::code(key_codes::ESCAPE)), b"\x1b");
        let back_tab = KeyEvent::code(key_codes::TAB).with_modifiers(Modifiers::shift());
        assert_eq!(legacy(&back_tab), b"\x1b[Z");
    }

    #[test]
    fn test_legacy_arrows_and_function_keys() {
        assert_eq!(legacy(&KeyEvent::code(key_codes::UP)), b"\x1b[A");
        let ctrl_right = KeyEvent::code(key_codes::RIGHT).with_modifiers(Modifiers::ctrl());
        assert_eq!(legacy(&ctrl_right), b"\x1b[1;5C");
        assert_eq!(legacy(&KeyEvent::code(key_codes::function(1))), b"\x1bOP");
        assert_eq!(legacy(&KeyEvent::code(key_codes::function(5))), b"\x1b[15~");
        assert_eq!(legacy(&KeyEvent::code(key_codes::function(6))), b"\x1b[17~");
        assert_eq!(legacy(&KeyEvent::code(key_codes::function(12))), b"\x1b[24~");
        let shift_del = KeyEvent::code(key_codes::DELETE).with_modifiers(Modifiers::shift());
        assert_eq!(legacy(&shift_del), b"\x1b[3;2~");
    }

    #[test]
    fn test_legacy_ctrl_and_alt() {
        let ctrl_c = KeyEvent::char('c').with_modifiers(Modifiers::ctrl());
        assert_eq!(legacy(&ctrl_c), b"\x03");
        let ctrl_space = KeyEvent::char(' ').with_modifiers(Modifiers::ctrl());
        assert_eq!(legacy(&ctrl_space), b"\x00");
        let alt_x = KeyEvent::char('x').with_modifiers(Modifiers::alt());
        assert_eq!(legacy(&alt_x), b"\x1bx");
    }

    #[test]
    fn test_legacy_unencodable() {
        let release = KeyEvent::char('a').with_event_type(KeyEventType::Release);
        assert!(legacy(&release).is_empty());
        assert!(legacy(&KeyEvent::code(key_codes::function(13))).is_empty());
    }

    #[test]
    fn test_legacy_roundtrip() {
        let keys = [
            KeyEvent::char('q'),
            KeyEvent::char('日'),
            KeyEvent::char('c').with_modifiers(Modifiers::ctrl()),
            KeyEvent::char('x').with_modifiers(Modifiers::alt()),
            KeyEvent::code(key_codes::UP).with_modifiers(Modifiers::ctrl()),
            KeyEvent::code(key_codes::PAGE_DOWN),
            KeyEvent::code(key_codes::function(3)),
            KeyEvent::code(key_codes::function(3)).with_modifiers(Modifiers::shift()),
            KeyEvent::code(key_codes::function(11)),
            KeyEvent::code(key_codes::ENTER),
        ];
        for key in keys {
            assert_eq!(roundtrip(&key, ProtocolMode::Legacy), vec![key.clone()], "{key:?}");
        }
    }

    #[test]
    fn test_extended_roundtrip() {
        let keys = [
            KeyEvent::char('a').with_modifiers(Modifiers::ctrl()),
            KeyEvent::code(key_codes::ESCAPE),
            KeyEvent::code(key_codes::ENTER),
            KeyEvent::code(key_codes::LEFT).with_event_type(KeyEventType::Release),
        ];
        for key in keys {
            assert_eq!(roundtrip(&key, ProtocolMode::Extended), vec![key.clone()], "{key:?}");
        }
    }

    #[test]
    fn test_mouse_roundtrip() {
        let event = MouseEvent::down(MouseButton::Left, 10, 20);
        let sgr = encode_mouse(&event, MouseEncoding::Sgr).unwrap();
        assert_eq!(sgr, b"\x1b[<0;10;20M");
        assert_eq!(parse(&sgr).mouse, Some(event));

        let x10 = encode_mouse(&event, MouseEncoding::X10).unwrap();
        assert_eq!(parse(&x10).mouse, Some(event));

        let far = MouseEvent::new(MouseAction::Move, MouseButton::None, 500, 1);
        assert!(encode_mouse(&far, MouseEncoding::X10).is_none());
    }

    #[test]
    fn test_paste_encoding() {
        assert_eq!(encode_paste("hi", true), b"\x1b[200~hi\x1b[201~");
        assert_eq!(encode_paste("hi", false), b"hi");
        assert_eq!(
            parse(encode_paste("a\x1b[Ab", true)).paste,
            Some(PasteEvent {
                text: "a\x1b[Ab".to_string(),
                is_bracketed: true,
            })
        );
    }

    #[test]
    fn test_negotiated_keyboard() {
        let mut vt = VirtualTerminal::new(80, 24).unwrap();
        let ctrl_up = KeyEvent::code(key_codes::UP).with_modifiers(Modifiers::ctrl());
        assert_eq!(vt.keyboard_protocol(), ProtocolMode::Legacy);
        assert_eq!(vt.key_bytes(&ctrl_up), b"\x1b[1;5A");

        vt.feed("\x1b[>1u");
        assert_eq!(vt.keyboard_protocol(), ProtocolMode::Extended);
        assert_eq!(vt.key_bytes(&ctrl_up), b"\x1b[57352;5u");

        vt.feed("\x1b[<u");
        assert_eq!(vt.keyboard_protocol(), ProtocolMode::Legacy);
    }

    #[test]
    fn test_negotiated_mouse() {
        let mut vt = VirtualTerminal::new(80, 24).unwrap();
        let event = MouseEvent::down(MouseButton::Right, 3, 4);
        assert_eq!(vt.mouse_bytes(&event), None);

        vt.feed("\x1b[?1000h");
        assert_eq!(vt.mouse_bytes(&event), encode_x10(&event));

        vt.feed("\x1b[?1006h");
        assert_eq!(vt.mouse_bytes(&event), Some(b"\x1b[<2;3;4M".to_vec()));
    }

    #[test]
    fn test_negotiated_paste() {
        let mut vt = VirtualTerminal::new(80, 24).unwrap();
        assert_eq!(vt.paste_bytes("x"), b"x");
        vt.feed("\x1b[?2004h");
        assert_eq!(vt.paste_bytes("x"), b"\x1b[200~x\x1b[201~");
    }
}
