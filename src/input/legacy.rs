//! Legacy (VT100/xterm) key decoder.
//!
//! Handles what a terminal sends without the extended keyboard protocol:
//! - Printable ASCII and UTF-8 characters
//! - Control bytes (Ctrl+letter, Enter, Tab, Backspace)
//! - CSI sequences (arrows, Home, End, Insert, Delete, PageUp/Down, F1-F12)
//! - SS3 sequences (F1-F4, application-mode arrows)
//! - Alt+key (ESC + key)
//!
//! Every call consumes at least one byte of non-empty input. Bytes that fit
//! no grammar come back as literal characters, never dropped.

use super::csi::{self, ESC};
use super::events::{KeyEvent, Modifiers};
use super::keyboard::{key_codes, ModifierBits};

/// Decode one legacy key at the start of `input`.
///
/// Returns `None` only for empty input.
pub fn decode_prefix(input: &[u8]) -> Option<(KeyEvent, usize)> {
    let first = *input.first()?;
    let decoded = match first {
        ESC => decode_escape(input),
        0x00 => (ctrl(' '), 1),
        0x08 | 0x7F => (KeyEvent::code(key_codes::BACKSPACE), 1),
        0x09 => (KeyEvent::code(key_codes::TAB), 1),
        0x0A | 0x0D => (KeyEvent::code(key_codes::ENTER), 1),
        0x01..=0x1A => (ctrl(char::from(first + b'a' - 1)), 1),
        0x1C..=0x1F => (ctrl(char::from(first + 0x40)), 1),
        0x20..=0x7E => (KeyEvent::char(char::from(first)), 1),
        _ => decode_utf8(input),
    };
    Some(decoded)
}

fn ctrl(ch: char) -> KeyEvent {
    KeyEvent::char(ch).with_modifiers(Modifiers::ctrl())
}

fn escape_key() -> (KeyEvent, usize) {
    (KeyEvent::code(key_codes::ESCAPE), 1)
}

fn decode_escape(input: &[u8]) -> (KeyEvent, usize) {
    let Some(&next) = input.get(1) else {
        return escape_key();
    };

    match next {
        b'[' => decode_csi(input).unwrap_or_else(escape_key),
        b'O' => match decode_ss3(input) {
            Some(decoded) => decoded,
            None => (with_alt(KeyEvent::char('O')), 2),
        },
        ESC => {
            // ESC ESC [ A is Alt+Up on some terminals.
            match decode_csi(&input[1..]) {
                Some((key, len)) => (with_alt(key), len + 1),
                // Two Escape presses; the second decodes on its own.
                None => escape_key(),
            }
        }
        _ => match decode_prefix(&input[1..]) {
            Some((key, len)) => (with_alt(key), len + 1),
            None => escape_key(),
        },
    }
}

fn with_alt(mut key: KeyEvent) -> KeyEvent {
    key.modifiers.alt = true;
    key
}

/// CSI navigation and function keys, e.g. `ESC [ A`, `ESC [ 1 ; 5 C`, `ESC [ 3 ~`.
fn decode_csi(input: &[u8]) -> Option<(KeyEvent, usize)> {
    let csi = csi::scan(input)?;
    if csi.marker.is_some() || !csi.intermediates.is_empty() {
        return None;
    }

    let modifiers: Modifiers = ModifierBits::from_wire(csi.param(1, 1)).into();
    let first = csi.param(0, 1);

    let code = match csi.final_byte {
        b'A' => key_codes::UP,
        b'B' => key_codes::DOWN,
        b'C' => key_codes::RIGHT,
        b'D' => key_codes::LEFT,
        b'H' => key_codes::HOME,
        b'F' => key_codes::END,
        b'P' => key_codes::function(1),
        b'Q' => key_codes::function(2),
        // `ESC [ row ; col R` is a cursor position report, not F3.
        b'R' if first == 1 => key_codes::function(3),
        b'S' => key_codes::function(4),
        b'Z' => {
            let key = KeyEvent::code(key_codes::TAB).with_modifiers(Modifiers::shift());
            return Some((key, csi.len));
        }
        b'~' => tilde_key(first)?,
        _ => return None,
    };

    Some((KeyEvent::code(code).with_modifiers(modifiers), csi.len))
}

fn tilde_key(param: u32) -> Option<u32> {
    let code = match param {
        1 | 7 => key_codes::HOME,
        2 => key_codes::INSERT,
        3 => key_codes::DELETE,
        4 | 8 => key_codes::END,
        5 => key_codes::PAGE_UP,
        6 => key_codes::PAGE_DOWN,
        11..=15 => key_codes::function((param - 10) as u8),
        17..=21 => key_codes::function((param - 11) as u8),
        23 | 24 => key_codes::function((param - 12) as u8),
        _ => return None,
    };
    Some(code)
}

/// SS3 keys, e.g. `ESC O P` (F1) or `ESC O A` (application-mode Up).
fn decode_ss3(input: &[u8]) -> Option<(KeyEvent, usize)> {
    let code = match *input.get(2)? {
        b'A' => key_codes::UP,
        b'B' => key_codes::DOWN,
        b'C' => key_codes::RIGHT,
        b'D' => key_codes::LEFT,
        b'H' => key_codes::HOME,
        b'F' => key_codes::END,
        b'P' => key_codes::function(1),
        b'Q' => key_codes::function(2),
        b'R' => key_codes::function(3),
        b'S' => key_codes::function(4),
        _ => return None,
    };
    Some((KeyEvent::code(code), 3))
}

fn decode_utf8(input: &[u8]) -> (KeyEvent, usize) {
    let first = input[0];
    let expected = if first & 0xE0 == 0xC0 {
        2
    } else if first & 0xF0 == 0xE0 {
        3
    } else if first & 0xF8 == 0xF0 {
        4
    } else {
        0
    };

    if expected > 0 && input.len() >= expected {
        let decoded = std::str::from_utf8(&input[..expected]).ok();
        if let Some(ch) = decoded.and_then(|s| s.chars().next()) {
            return (KeyEvent::char(ch), expected);
        }
    }

    tracing::trace!(byte = first, "invalid utf-8 byte in key input");
    (KeyEvent::char(char::REPLACEMENT_CHARACTER), 1)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_one(data: &[u8]) -> (KeyEvent, usize) {
        decode_prefix(data).unwrap()
    }

    #[test]
    fn test_ascii_char() {
        let (key, len) = decode_one(b"abc");
        assert_eq!(key, KeyEvent::char('a'));
        assert_eq!(len, 1);
    }

    #[test]
    fn test_ctrl_letters() {
        let (key, _) = decode_one(b"\x03");
        assert_eq!(key.key_code, 'c' as u32);
        assert_eq!(key.text, "c");
        assert!(key.modifiers.ctrl);

        assert_eq!(decode_one(b"\x01").0.text, "a");
        assert_eq!(decode_one(b"\x1a").0.text, "z");
    }

    #[test]
    fn test_named_control_bytes() {
        assert_eq!(decode_one(b"\r").0.key_code, key_codes::ENTER);
        assert_eq!(decode_one(b"\n").0.key_code, key_codes::ENTER);
        assert_eq!(decode_one(b"\t").0.key_code, key_codes::TAB);
        assert_eq!(decode_one(b"\x7f").0.key_code, key_codes::BACKSPACE);
        assert_eq!(decode_one(b"\x08").0.key_code, key_codes::BACKSPACE);
    }

    #[test]
    fn test_lone_escape() {
        let (key, len) = decode_one(b"\x1b");
        assert_eq!(key.key_code, 27);
        assert_eq!(key.modifiers, Modifiers::none());
        assert!(key.text.is_empty());
        assert_eq!(len, 1);
    }

    #[test]
    fn test_escape_before_unknown_csi() {
        let (key, len) = decode_one(b"\x1b[99z");
        assert_eq!(key.key_code, 27);
        assert_eq!(len, 1);
    }

    #[test]
    fn test_alt_key() {
        let (key, len) = decode_one(b"\x1bx");
        assert_eq!(key.text, "x");
        assert!(key.modifiers.alt);
        assert_eq!(len, 2);
    }

    #[test]
    fn test_arrow_keys() {
        assert_eq!(decode_one(b"\x1b[A").0.key_code, key_codes::UP);
        assert_eq!(decode_one(b"\x1b[B").0.key_code, key_codes::DOWN);
        assert_eq!(decode_one(b"\x1b[C").0.key_code, key_codes::RIGHT);
        assert_eq!(decode_one(b"\x1b[D").0.key_code, key_codes::LEFT);
        assert_eq!(decode_one(b"\x1bOA").0.key_code, key_codes::UP);
    }

    #[test]
    fn test_modified_arrow() {
        let (key, len) = decode_one(b"\x1b[1;5C");
        assert_eq!(key.key_code, key_codes::RIGHT);
        assert!(key.modifiers.ctrl);
        assert_eq!(len, 6);
    }

    #[test]
    fn test_alt_arrow_double_escape() {
        let (key, len) = decode_one(b"\x1b\x1b[A");
        assert_eq!(key.key_code, key_codes::UP);
        assert!(key.modifiers.alt);
        assert_eq!(len, 4);
    }

    #[test]
    fn test_double_escape_is_two_presses() {
        let (key, len) = decode_one(b"\x1b\x1b");
        assert_eq!(key, KeyEvent::code(key_codes::ESCAPE));
        assert_eq!(len, 1);

        let (key, len) = decode_one(b"\x1b\x1bx");
        assert!(!key.modifiers.alt);
        assert_eq!(len, 1);
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(decode_one(b"\x1bOP").0.key_code, key_codes::F1);
        assert_eq!(decode_one(b"\x1b[15~").0.key_code, key_codes::function(5));
        assert_eq!(decode_one(b"\x1b[24~").0.key_code, key_codes::function(12));
    }

    #[test]
    fn test_tilde_keys() {
        assert_eq!(decode_one(b"\x1b[3~").0.key_code, key_codes::DELETE);
        assert_eq!(decode_one(b"\x1b[5~").0.key_code, key_codes::PAGE_UP);
        assert_eq!(decode_one(b"\x1b[6~").0.key_code, key_codes::PAGE_DOWN);
        assert_eq!(decode_one(b"\x1b[2~").0.key_code, key_codes::INSERT);
    }

    #[test]
    fn test_shift_tab() {
        let (key, _) = decode_one(b"\x1b[Z");
        assert_eq!(key.key_code, key_codes::TAB);
        assert!(key.modifiers.shift);
    }

    #[test]
    fn test_cursor_report_is_not_f3() {
        let (key, len) = decode_one(b"\x1b[24;80R");
        assert_eq!(key.key_code, key_codes::ESCAPE);
        assert_eq!(len, 1);
    }

    #[test]
    fn test_utf8() {
        let (key, len) = decode_one("é!".as_bytes());
        assert_eq!(key.text, "é");
        assert_eq!(len, 2);

        let (key, len) = decode_one("日本".as_bytes());
        assert_eq!(key.text, "日");
        assert_eq!(len, 3);
    }

    #[test]
    fn test_invalid_utf8_is_literal() {
        let (key, len) = decode_one(&[0xFF, b'a']);
        assert_eq!(key.text, "\u{FFFD}");
        assert_eq!(len, 1);
    }

    #[test]
    fn test_empty() {
        assert!(decode_prefix(b"").is_none());
    }
}
