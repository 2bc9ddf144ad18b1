//! Bracketed-paste codec.
//!
//! With mode 2004 enabled the terminal wraps pasted text:
//!
//! ```text
//! ESC [ 200 ~ <payload> ESC [ 201 ~
//! ```
//!
//! [`extract`] pulls the payload out of a chunk and hands back the bytes
//! around it untouched.

use super::csi;
use super::events::PasteEvent;

/// Paste start marker.
pub const PASTE_START: &[u8] = b"\x1b[200~";

/// Paste end marker.
pub const PASTE_END: &[u8] = b"\x1b[201~";

/// Enable bracketed paste.
pub fn encode_enable() -> &'static str {
    "\x1b[?2004h"
}

/// Disable bracketed paste.
pub fn encode_disable() -> &'static str {
    "\x1b[?2004l"
}

/// Wrap `text` in paste markers, as a terminal would deliver it.
pub fn wrap(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(PASTE_START.len() + text.len() + PASTE_END.len());
    out.extend_from_slice(PASTE_START);
    out.extend_from_slice(text.as_bytes());
    out.extend_from_slice(PASTE_END);
    out
}

/// A paste pulled out of a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteExtraction {
    pub event: PasteEvent,
    /// Bytes before the start marker followed by the bytes after the end marker.
    pub remaining: Vec<u8>,
}

impl PasteExtraction {
    /// `remaining` as text (invalid UTF-8 replaced).
    pub fn remaining_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.remaining)
    }
}

/// True when `stream` holds a start marker followed by an end marker.
pub fn contains(stream: impl AsRef<[u8]>) -> bool {
    let stream = stream.as_ref();
    match csi::find(stream, PASTE_START) {
        Some(start) => csi::find(&stream[start + PASTE_START.len()..], PASTE_END).is_some(),
        None => false,
    }
}

/// Pull the first paste out of `stream`.
///
/// A missing end marker makes everything after the start marker the payload.
/// Returns `None` when there is no start marker.
pub fn extract(stream: impl AsRef<[u8]>) -> Option<PasteExtraction> {
    let stream = stream.as_ref();
    let start = csi::find(stream, PASTE_START)?;
    let body_start = start + PASTE_START.len();
    let body = &stream[body_start..];

    let mut remaining = stream[..start].to_vec();
    let payload = match csi::find(body, PASTE_END) {
        Some(end) => {
            remaining.extend_from_slice(&body[end + PASTE_END.len()..]);
            &body[..end]
        }
        None => {
            tracing::debug!(len = body.len(), "paste without end marker");
            body
        }
    };

    Some(PasteExtraction {
        event: PasteEvent {
            text: String::from_utf8_lossy(payload).into_owned(),
            is_bracketed: true,
        },
        remaining,
    })
}

/// Decode a paste that starts at the front of `input`.
///
/// Returns the event and the bytes it spans, end marker included. A missing
/// end marker makes the paste run to the end of `input`.
pub fn decode_prefix(input: &[u8]) -> Option<(PasteEvent, usize)> {
    let body = input.strip_prefix(PASTE_START)?;
    let (payload, len) = match csi::find(body, PASTE_END) {
        Some(end) => (&body[..end], PASTE_START.len() + end + PASTE_END.len()),
        None => (body, input.len()),
    };
    let event = PasteEvent {
        text: String::from_utf8_lossy(payload).into_owned(),
        is_bracketed: true,
    };
    Some((event, len))
}
