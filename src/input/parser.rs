//! Unified input parser.
//!
//! Classifies an arbitrary input chunk into key, mouse, paste and focus
//! events. Decoders are tried in a fixed order at each position:
//!
//! 1. Bracketed paste (wraps everything else)
//! 2. Focus reports (`ESC [ I` / `ESC [ O`)
//! 3. Mouse reports (SGR, X10)
//! 4. Extended keyboard protocol (`CSI ... u`)
//! 5. Legacy keys (fallback, total)
//!
//! Each decoder returns `(event, bytes consumed)`, so the scan never stalls
//! and never drops input. Sequences split across two chunks are not
//! reassembled: each call is self-contained.

use super::csi;
use super::events::{FocusEvent, InputEvent, ParsedInput};
use super::{keyboard, legacy, mouse, paste};

/// Parse one chunk into its aggregate [`ParsedInput`].
///
/// All keys are kept in order. The first mouse report, paste and focus change
/// win; later ones in the same chunk are dropped with a debug log.
pub fn parse(chunk: impl AsRef<[u8]>) -> ParsedInput {
    let chunk = chunk.as_ref();
    let mut parsed = ParsedInput::default();

    for event in parse_events(chunk) {
        match event {
            InputEvent::Key(key) => parsed.keys.push(key),
            InputEvent::Mouse(m) => {
                if parsed.mouse.is_none() {
                    parsed.mouse = Some(m);
                } else {
                    tracing::debug!(?m, "dropping additional mouse report in chunk");
                }
            }
            InputEvent::Paste(p) => {
                if parsed.paste.is_none() {
                    parsed.paste = Some(p);
                } else {
                    tracing::debug!(len = p.text.len(), "dropping additional paste in chunk");
                }
            }
            InputEvent::Focus(f) => {
                if parsed.focus.is_none() {
                    parsed.focus = Some(f);
                } else {
                    tracing::debug!(?f, "dropping additional focus change in chunk");
                }
            }
        }
    }

    tracing::trace!(
        bytes = chunk.len(),
        keys = parsed.keys.len(),
        mouse = parsed.mouse.is_some(),
        paste = parsed.paste.is_some(),
        "parsed input chunk"
    );
    parsed
}

/// Parse one chunk into events, in stream order.
pub fn parse_events(chunk: impl AsRef<[u8]>) -> Vec<InputEvent> {
    let chunk = chunk.as_ref();
    let mut events = Vec::new();
    let mut pos = 0;

    while let Some((event, len)) = decode_event(&chunk[pos..]) {
        events.push(event);
        pos += len;
    }

    events
}

/// Decode the event at the start of `input`.
///
/// Returns `None` only for empty input; the consumed length is always at
/// least one byte.
pub fn decode_event(input: &[u8]) -> Option<(InputEvent, usize)> {
    if let Some((p, len)) = paste::decode_prefix(input) {
        return Some((InputEvent::Paste(p), len));
    }
    if let Some((f, len)) = decode_focus(input) {
        return Some((InputEvent::Focus(f), len));
    }
    if let Some((m, len)) = mouse::decode_prefix(input) {
        return Some((InputEvent::Mouse(m), len));
    }
    if let Some((key, len)) = keyboard::decode_extended_key_prefix(input) {
        return Some((InputEvent::Key(key), len));
    }
    legacy::decode_prefix(input).map(|(key, len)| (InputEvent::Key(key), len))
}

fn decode_focus(input: &[u8]) -> Option<(FocusEvent, usize)> {
    let csi = csi::scan(input)?;
    if csi.marker.is_some() || !csi.params.is_empty() || !csi.intermediates.is_empty() {
        return None;
    }
    match csi.final_byte {
        b'I' => Some((FocusEvent::Gained, csi.len)),
        b'O' => Some((FocusEvent::Lost, csi.len)),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::events::{KeyEvent, KeyEventType, MouseAction, MouseButton, PasteEvent};
    use crate::input::keyboard::key_codes;

    fn texts(parsed: &ParsedInput) -> String {
        parsed.keys.iter().map(|k| k.text.as_str()).collect()
    }

    #[test]
    fn test_plain_text() {
        let parsed = parse("abc");
        assert_eq!(parsed.keys.len(), 3);
        assert_eq!(parsed.keys[0], KeyEvent::char('a'));
        assert_eq!(texts(&parsed), "abc");
        assert!(parsed.mouse.is_none());
        assert!(parsed.paste.is_none());
    }

    #[test]
    fn test_sgr_mouse() {
        let parsed = parse("\x1b[<0;10;20M");
        let m = parsed.mouse.unwrap();
        assert_eq!(m.action, MouseAction::Down);
        assert_eq!(m.button, MouseButton::Left);
        assert_eq!((m.x, m.y), (10, 20));
        assert!(parsed.keys.is_empty());
    }

    #[test]
    fn test_paste_with_surrounding_keys() {
        let parsed = parse("before\x1b[200~pasted\x1b[201~after");
        assert_eq!(
            parsed.paste,
            Some(PasteEvent {
                text: "pasted".into(),
                is_bracketed: true,
            })
        );
        assert_eq!(texts(&parsed), "beforeafter");
    }

    #[test]
    fn test_paste_hides_escape_sequences() {
        let parsed = parse("\x1b[200~\x1b[<0;1;1M\x1b[A\x1b[201~");
        assert!(parsed.mouse.is_none());
        assert!(parsed.keys.is_empty());
        assert_eq!(parsed.paste.unwrap().text, "\x1b[<0;1;1M\x1b[A");
    }

    #[test]
    fn test_extended_key_before_legacy() {
        let parsed = parse("\x1b[97;5:3u");
        assert_eq!(parsed.keys.len(), 1);
        let key = &parsed.keys[0];
        assert_eq!(key.key_code, 97);
        assert!(key.modifiers.ctrl);
        assert_eq!(key.event_type, KeyEventType::Release);
    }

    #[test]
    fn test_lone_escape() {
        let parsed = parse("\x1b");
        assert_eq!(parsed.keys, vec![KeyEvent::code(key_codes::ESCAPE)]);
    }

    #[test]
    fn test_double_escape() {
        let escape = KeyEvent::code(key_codes::ESCAPE);
        assert_eq!(parse("\x1b\x1b").keys, vec![escape.clone(), escape.clone()]);
        assert_eq!(parse("\x1b\x1b\x1b").keys.len(), 3);

        let alt_up = parse("\x1b\x1b[A").keys;
        assert_eq!(alt_up.len(), 1);
        assert!(alt_up[0].modifiers.alt);
    }

    #[test]
    fn test_ctrl_letter() {
        let parsed = parse("\x01");
        assert_eq!(parsed.keys[0].text, "a");
        assert!(parsed.keys[0].modifiers.ctrl);
    }

    #[test]
    fn test_unrecognized_bytes_are_kept() {
        let parsed = parse("\x1b[99zq");
        let codes: Vec<u32> = parsed.keys.iter().map(|k| k.key_code).collect();
        assert_eq!(codes, vec![27, '[' as u32, '9' as u32, '9' as u32, 'z' as u32, 'q' as u32]);
    }

    #[test]
    fn test_mixed_chunk_order() {
        let events = parse_events("a\x1b[<64;3;4Mb\x1b[I");
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], InputEvent::Key(_)));
        assert!(matches!(events[1], InputEvent::Mouse(_)));
        assert!(matches!(events[2], InputEvent::Key(_)));
        assert_eq!(events[3], InputEvent::Focus(FocusEvent::Gained));
    }

    #[test]
    fn test_only_first_mouse_reported() {
        let parsed = parse("\x1b[<0;1;1M\x1b[<0;1;1m");
        assert_eq!(parsed.mouse.unwrap().action, MouseAction::Down);
        assert!(parsed.keys.is_empty());
    }

    #[test]
    fn test_focus_events() {
        assert_eq!(parse("\x1b[I").focus, Some(FocusEvent::Gained));
        assert_eq!(parse("\x1b[O").focus, Some(FocusEvent::Lost));
    }

    #[test]
    fn test_only_first_focus_reported() {
        let chunk = "\x1b[O\x1b[Ia";
        assert_eq!(parse(chunk).focus, Some(FocusEvent::Lost));
        assert_eq!(parse(chunk).keys, vec![KeyEvent::char('a')]);
        assert_eq!(parse_events(chunk).len(), 3);
    }

    #[test]
    fn test_empty_chunk() {
        assert!(parse("").is_empty());
        assert!(parse_events(b"").is_empty());
    }
}
