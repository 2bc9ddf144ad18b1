//! Keyboard protocol codec.
//!
//! Negotiates and decodes the extended (kitty) keyboard protocol and decides
//! which protocol is active for the running terminal.
//!
//! # API
//!
//! - [`detect`] - Pick a [`ProtocolMode`] from terminal identity hints
//! - [`ProtocolContext`] - Application-owned cache of the active mode with override
//! - [`encode_enable`] / [`encode_disable`] / [`encode_query`] - Negotiation sequences
//! - [`decode_extended_key`] - Decode one `CSI ... u` key report
//! - [`decode_query_response`] - Decode the terminal's answer to [`encode_query`]
//! - [`encode_extended_key`] - Inverse of [`decode_extended_key`]
//!
//! # Wire format
//!
//! ```text
//! ESC [ keycode[:shifted[:base]] [; modifier[:event-type] [; text]] u
//! ```
//!
//! The modifier field is `1 + bits` where bit0=shift, bit1=alt, bit2=ctrl,
//! bit3=super. The event type is 1 (press), 2 (repeat) or 3 (release).

use std::cell::OnceCell;
use std::fmt;
use std::fmt::Write as _;

use spark_signals::{signal, Signal};

use super::csi;
use super::events::{KeyEvent, KeyEventType, Modifiers};

// =============================================================================
// Key Codes
// =============================================================================

/// Key codes for non-character keys.
///
/// Functional keys use the extended protocol's private-use numbering. The
/// legacy decoder reports the same values so both protocols agree.
pub mod key_codes {
    pub const TAB: u32 = 9;
    pub const ENTER: u32 = 13;
    pub const ESCAPE: u32 = 27;
    pub const SPACE: u32 = 32;
    pub const BACKSPACE: u32 = 127;

    pub const INSERT: u32 = 57348;
    pub const DELETE: u32 = 57349;
    pub const LEFT: u32 = 57350;
    pub const RIGHT: u32 = 57351;
    pub const UP: u32 = 57352;
    pub const DOWN: u32 = 57353;
    pub const PAGE_UP: u32 = 57354;
    pub const PAGE_DOWN: u32 = 57355;
    pub const HOME: u32 = 57356;
    pub const END: u32 = 57357;

    /// F1. F2..F12 follow consecutively.
    pub const F1: u32 = 57364;

    /// Function key `n` (1-based). Out-of-range values clamp to F1..F35.
    pub const fn function(n: u8) -> u32 {
        let n = if n == 0 { 1 } else if n > 35 { 35 } else { n };
        F1 + (n as u32) - 1
    }

    /// True for codes in the private-use functional range.
    pub const fn is_functional(code: u32) -> bool {
        code >= 0xE000 && code <= 0xF8FF
    }
}

// =============================================================================
// Flags & Modifier Bits
// =============================================================================

bitflags::bitflags! {
    /// Progressive enhancement flags for the extended keyboard protocol.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeyboardFlags: u32 {
        const DISAMBIGUATE_ESCAPE_CODES = 1 << 0;
        const REPORT_EVENT_TYPES = 1 << 1;
        const REPORT_ALTERNATE_KEYS = 1 << 2;
        const REPORT_ALL_KEYS_AS_ESCAPE_CODES = 1 << 3;
        const REPORT_ASSOCIATED_TEXT = 1 << 4;
    }
}

bitflags::bitflags! {
    /// Modifier bits as carried on the wire (value minus one).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModifierBits: u32 {
        const SHIFT     = 1 << 0;
        const ALT       = 1 << 1;
        const CTRL      = 1 << 2;
        const SUPER     = 1 << 3;
        const HYPER     = 1 << 4;
        const META      = 1 << 5;
        const CAPS_LOCK = 1 << 6;
        const NUM_LOCK  = 1 << 7;
    }
}

impl ModifierBits {
    /// Decode a 1-based wire modifier value. Zero is treated like 1.
    pub fn from_wire(value: u32) -> Self {
        Self::from_bits_truncate(value.saturating_sub(1))
    }

    /// Encode as a 1-based wire modifier value.
    pub fn to_wire(self) -> u32 {
        self.bits() + 1
    }
}

impl From<ModifierBits> for Modifiers {
    fn from(bits: ModifierBits) -> Self {
        Modifiers {
            ctrl: bits.contains(ModifierBits::CTRL),
            alt: bits.contains(ModifierBits::ALT),
            shift: bits.contains(ModifierBits::SHIFT),
            meta: bits.intersects(ModifierBits::SUPER | ModifierBits::META),
        }
    }
}

impl From<Modifiers> for ModifierBits {
    fn from(mods: Modifiers) -> Self {
        let mut bits = ModifierBits::empty();
        bits.set(ModifierBits::SHIFT, mods.shift);
        bits.set(ModifierBits::ALT, mods.alt);
        bits.set(ModifierBits::CTRL, mods.ctrl);
        bits.set(ModifierBits::SUPER, mods.meta);
        bits
    }
}

// =============================================================================
// Protocol Detection
// =============================================================================

/// Which keyboard protocol the terminal speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtocolMode {
    #[default]
    Legacy,
    Extended,
}

const EXTENDED_TERM_PROGRAMS: &[&str] = &["kitty", "WezTerm", "ghostty"];
const EXTENDED_TERMS: &[&str] = &["xterm-kitty", "xterm-ghostty"];

/// Terminal identity hints read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalEnv {
    /// `KITTY_WINDOW_ID`
    pub kitty_window_id: Option<String>,
    /// `TERM_PROGRAM`
    pub term_program: Option<String>,
    /// `TERM`
    pub term: Option<String>,
}

impl TerminalEnv {
    /// Capture the hints from the current process environment.
    pub fn from_env() -> Self {
        Self {
            kitty_window_id: std::env::var("KITTY_WINDOW_ID").ok(),
            term_program: std::env::var("TERM_PROGRAM").ok(),
            term: std::env::var("TERM").ok(),
        }
    }
}

/// Pick the protocol mode for a terminal. Side-effect free.
pub fn detect(env: &TerminalEnv) -> ProtocolMode {
    let window_id = env.kitty_window_id.as_deref().is_some_and(|id| !id.is_empty());
    let program = env
        .term_program
        .as_deref()
        .is_some_and(|p| EXTENDED_TERM_PROGRAMS.contains(&p));
    let term = env.term.as_deref().is_some_and(|t| EXTENDED_TERMS.contains(&t));

    let mode = if window_id || program || term {
        ProtocolMode::Extended
    } else {
        ProtocolMode::Legacy
    };
    tracing::debug!(?mode, window_id, program, term, "keyboard protocol detected");
    mode
}

/// Application-owned holder of the active keyboard protocol.
///
/// Detection runs at most once, on first use. An explicit override takes
/// precedence until it is reset. The override lives in a signal so reactive
/// code can track protocol switches.
pub struct ProtocolContext {
    env: TerminalEnv,
    detected: OnceCell<ProtocolMode>,
    override_mode: Signal<Option<ProtocolMode>>,
}

impl ProtocolContext {
    pub fn new(env: TerminalEnv) -> Self {
        Self {
            env,
            detected: OnceCell::new(),
            override_mode: signal(None),
        }
    }

    /// Context for the current process environment.
    pub fn from_env() -> Self {
        Self::new(TerminalEnv::from_env())
    }

    /// The environment hints this context detects from.
    pub fn env(&self) -> &TerminalEnv {
        &self.env
    }

    /// The detected mode, computed once and cached.
    pub fn detected(&self) -> ProtocolMode {
        *self.detected.get_or_init(|| detect(&self.env))
    }

    /// Force a mode, or pass `None` to revert to detection.
    pub fn set_override(&self, mode: Option<ProtocolMode>) {
        tracing::debug!(?mode, "keyboard protocol override");
        self.override_mode.set(mode);
    }

    /// Current override, if any.
    pub fn override_mode(&self) -> Option<ProtocolMode> {
        self.override_mode.get()
    }

    /// Drop the override and fall back to detection.
    pub fn reset(&self) {
        self.set_override(None);
    }

    /// The mode decoders and encoders should use right now.
    pub fn active(&self) -> ProtocolMode {
        self.override_mode().unwrap_or_else(|| self.detected())
    }

    /// Get the override signal for reactive tracking.
    pub fn override_signal(&self) -> Signal<Option<ProtocolMode>> {
        self.override_mode.clone()
    }

    /// Enable sequence to write at startup, only when the extended protocol is active.
    pub fn enable_sequence(&self, flags: KeyboardFlags) -> Option<String> {
        match self.active() {
            ProtocolMode::Extended => Some(encode_enable(flags)),
            ProtocolMode::Legacy => None,
        }
    }
}

impl Default for ProtocolContext {
    fn default() -> Self {
        Self::from_env()
    }
}

impl fmt::Debug for ProtocolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolContext")
            .field("env", &self.env)
            .field("detected", &self.detected.get())
            .field("override", &self.override_mode())
            .finish()
    }
}

// =============================================================================
// Negotiation Sequences
// =============================================================================

/// Push `flags` onto the terminal's keyboard mode stack.
pub fn encode_enable(flags: KeyboardFlags) -> String {
    format!("\x1b[>{}u", flags.bits())
}

/// Pop the keyboard mode stack.
pub fn encode_disable() -> &'static str {
    "\x1b[<u"
}

/// Ask the terminal for its current flags.
pub fn encode_query() -> &'static str {
    "\x1b[?u"
}

/// Decode the answer to [`encode_query`]: `ESC [ ? flags u`.
pub fn decode_query_response(seq: impl AsRef<[u8]>) -> Option<KeyboardFlags> {
    let seq = seq.as_ref();
    let csi = csi::scan(seq)?;
    if csi.marker != Some(b'?') || csi.final_byte != b'u' || !csi.intermediates.is_empty() {
        return None;
    }
    let bits = csi::number(csi.params)?;
    Some(KeyboardFlags::from_bits_retain(bits))
}

// =============================================================================
// Key Reports
// =============================================================================

/// Decode a complete extended-protocol key report.
///
/// Trailing bytes after the terminator make this a no-match; use
/// [`decode_extended_key_prefix`] to decode from the front of a stream.
pub fn decode_extended_key(seq: impl AsRef<[u8]>) -> Option<KeyEvent> {
    let seq = seq.as_ref();
    match decode_extended_key_prefix(seq) {
        Some((event, len)) if len == seq.len() => Some(event),
        _ => None,
    }
}

/// Decode an extended key report at the start of `input`.
///
/// Returns the event and the number of bytes it spans.
pub fn decode_extended_key_prefix(input: &[u8]) -> Option<(KeyEvent, usize)> {
    let csi = csi::scan(input)?;
    if csi.marker.is_some() || csi.final_byte != b'u' || !csi.intermediates.is_empty() {
        return None;
    }

    let mut sections = csi.sections();

    let mut key_fields = sections.next()?.split(|&b| b == b':');
    let key_code = key_fields.next().and_then(csi::number)?;
    let shifted_key = key_fields.next().and_then(csi::number);

    let (modifier_value, event_value) = match sections.next() {
        Some(section) => {
            let mut fields = section.split(|&b| b == b':');
            let modifier = fields.next().and_then(csi::number).unwrap_or(1);
            let event = fields.next().and_then(csi::number).unwrap_or(1);
            (modifier, event)
        }
        None => (1, 1),
    };

    let modifiers: Modifiers = ModifierBits::from_wire(modifier_value).into();
    let event_type = match event_value {
        2 => KeyEventType::Repeat,
        3 => KeyEventType::Release,
        _ => KeyEventType::Press,
    };

    let text = match sections.next() {
        Some(section) => section
            .split(|&b| b == b':')
            .filter_map(csi::number)
            .filter_map(char::from_u32)
            .collect(),
        None => {
            let code = match shifted_key {
                Some(shifted) if modifiers.shift => shifted,
                _ => key_code,
            };
            printable(code).map(String::from).unwrap_or_default()
        }
    };

    Some((
        KeyEvent {
            key_code,
            text,
            modifiers,
            event_type,
            shifted_key,
        },
        csi.len,
    ))
}

/// Encode a key event as an extended-protocol report.
///
/// Decoding the result yields the same event. Text that the decoder would
/// derive from the key code is omitted; other non-empty text is sent as the
/// associated-text field.
pub fn encode_extended_key(event: &KeyEvent) -> String {
    let mut out = format!("\x1b[{}", event.key_code);
    if let Some(shifted) = event.shifted_key {
        let _ = write!(out, ":{shifted}");
    }

    let derived = {
        let code = match event.shifted_key {
            Some(shifted) if event.modifiers.shift => shifted,
            _ => event.key_code,
        };
        printable(code).map(String::from).unwrap_or_default()
    };
    let text_field = !event.text.is_empty() && event.text != derived;

    let modifier = ModifierBits::from(event.modifiers).to_wire();
    let event_field = match event.event_type {
        KeyEventType::Press => None,
        KeyEventType::Repeat => Some(2),
        KeyEventType::Release => Some(3),
    };

    if modifier != 1 || event_field.is_some() || text_field {
        let _ = write!(out, ";{modifier}");
        if let Some(kind) = event_field {
            let _ = write!(out, ":{kind}");
        }
    }

    if text_field {
        out.push(';');
        let codepoints: Vec<String> = event.text.chars().map(|c| (c as u32).to_string()).collect();
        out.push_str(&codepoints.join(":"));
    }

    out.push('u');
    out
}

/// The printable character for a key code, if it has one.
pub(crate) fn printable(code: u32) -> Option<char> {
    if key_codes::is_functional(code) {
        return None;
    }
    char::from_u32(code).filter(|c| !c.is_control())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn env(window: Option<&str>, program: Option<&str>, term: Option<&str>) -> TerminalEnv {
        TerminalEnv {
            kitty_window_id: window.map(String::from),
            term_program: program.map(String::from),
            term: term.map(String::from),
        }
    }

    #[test]
    fn test_detect() {
        assert_eq!(detect(&env(Some("1"), None, None)), ProtocolMode::Extended);
        assert_eq!(detect(&env(None, Some("kitty"), None)), ProtocolMode::Extended);
        assert_eq!(detect(&env(None, None, Some("xterm-kitty"))), ProtocolMode::Extended);
        assert_eq!(
            detect(&env(None, Some("Apple_Terminal"), Some("xterm-256color"))),
            ProtocolMode::Legacy
        );
        assert_eq!(detect(&TerminalEnv::default()), ProtocolMode::Legacy);
    }

    #[test]
    fn test_context_override() {
        let ctx = ProtocolContext::new(env(None, None, Some("xterm")));
        assert_eq!(ctx.active(), ProtocolMode::Legacy);

        ctx.set_override(Some(ProtocolMode::Extended));
        assert_eq!(ctx.active(), ProtocolMode::Extended);
        assert_eq!(ctx.override_signal().get(), Some(ProtocolMode::Extended));

        ctx.reset();
        assert_eq!(ctx.active(), ProtocolMode::Legacy);
        assert_eq!(ctx.override_mode(), None);
    }

    #[test]
    fn test_context_enable_sequence() {
        let ctx = ProtocolContext::new(env(Some("7"), None, None));
        assert_eq!(
            ctx.enable_sequence(KeyboardFlags::DISAMBIGUATE_ESCAPE_CODES).as_deref(),
            Some("\x1b[>1u")
        );
        ctx.set_override(Some(ProtocolMode::Legacy));
        assert_eq!(ctx.enable_sequence(KeyboardFlags::all()), None);
    }

    #[test]
    fn test_encode_sequences() {
        assert_eq!(encode_enable(KeyboardFlags::DISAMBIGUATE_ESCAPE_CODES), "\x1b[>1u");
        assert_eq!(encode_enable(KeyboardFlags::all()), "\x1b[>31u");
        assert_eq!(encode_disable(), "\x1b[<u");
        assert_eq!(encode_query(), "\x1b[?u");
    }

    #[test]
    fn test_query_response() {
        assert_eq!(decode_query_response("\x1b[?31u"), Some(KeyboardFlags::all()));
        assert_eq!(decode_query_response("\x1b[?0u"), Some(KeyboardFlags::empty()));
        assert_eq!(decode_query_response("\x1b[31u"), None);
        assert_eq!(decode_query_response("\x1b[?u"), None);
    }

    #[test]
    fn test_decode_plain_key() {
        let ev = decode_extended_key("\x1b[97u").unwrap();
        assert_eq!(ev.key_code, 97);
        assert_eq!(ev.text, "a");
        assert_eq!(ev.modifiers, Modifiers::none());
        assert_eq!(ev.event_type, KeyEventType::Press);
        assert_eq!(ev.shifted_key, None);
    }

    #[test]
    fn test_decode_modifiers() {
        assert!(decode_extended_key("\x1b[97;2u").unwrap().modifiers.shift);
        assert!(decode_extended_key("\x1b[97;3u").unwrap().modifiers.alt);
        assert!(decode_extended_key("\x1b[97;5u").unwrap().modifiers.ctrl);
        assert!(decode_extended_key("\x1b[97;9u").unwrap().modifiers.meta);

        let all = decode_extended_key("\x1b[97;16u").unwrap().modifiers;
        assert!(all.shift && all.alt && all.ctrl && all.meta);
    }

    #[test]
    fn test_decode_event_types() {
        assert_eq!(decode_extended_key("\x1b[97;1:1u").unwrap().event_type, KeyEventType::Press);
        assert_eq!(decode_extended_key("\x1b[97;1:2u").unwrap().event_type, KeyEventType::Repeat);
        assert_eq!(decode_extended_key("\x1b[97;1:3u").unwrap().event_type, KeyEventType::Release);
    }

    #[test]
    fn test_decode_shifted_key() {
        let ev = decode_extended_key("\x1b[97:65;2u").unwrap();
        assert_eq!(ev.shifted_key, Some(65));
        assert_eq!(ev.text, "A");
        assert!(ev.modifiers.shift);
    }

    #[test]
    fn test_decode_lenient_fields() {
        let ev = decode_extended_key("\x1b[97;u").unwrap();
        assert_eq!(ev.modifiers, Modifiers::none());
        let ev = decode_extended_key("\x1b[97;5:u").unwrap();
        assert!(ev.modifiers.ctrl);
        assert_eq!(ev.event_type, KeyEventType::Press);
    }

    #[test]
    fn test_decode_associated_text() {
        let ev = decode_extended_key("\x1b[97;2;65u").unwrap();
        assert_eq!(ev.text, "A");
    }

    #[test]
    fn test_decode_functional_has_no_text() {
        let ev = decode_extended_key("\x1b[57352u").unwrap();
        assert_eq!(ev.key_code, key_codes::UP);
        assert!(ev.text.is_empty());
        assert!(decode_extended_key("\x1b[13u").unwrap().text.is_empty());
    }

    #[test]
    fn test_decode_no_match() {
        assert_eq!(decode_extended_key("a"), None);
        assert_eq!(decode_extended_key("\x1b[A"), None);
        assert_eq!(decode_extended_key("\x1b[97~"), None);
        assert_eq!(decode_extended_key("\x1b[u"), None);
        assert_eq!(decode_extended_key("\x1b[?1u"), None);
        assert_eq!(decode_extended_key("\x1b[97"), None);
        assert_eq!(decode_extended_key("\x1b[97ux"), None);
        assert_eq!(decode_extended_key(""), None);
    }

    #[test]
    fn test_decode_prefix_reports_length() {
        let (ev, len) = decode_extended_key_prefix(b"\x1b[98;5urest").unwrap();
        assert_eq!(ev.key_code, 98);
        assert_eq!(len, 7);
    }

    #[test]
    fn test_encode_extended_key_round_trip() {
        let events = [
            KeyEvent::char('a'),
            KeyEvent::char('a').with_modifiers(Modifiers::ctrl()),
            KeyEvent::char('z').with_event_type(KeyEventType::Release),
            KeyEvent::code(key_codes::ESCAPE),
            KeyEvent {
                key_code: 97,
                text: "A".into(),
                modifiers: Modifiers::shift(),
                event_type: KeyEventType::Repeat,
                shifted_key: Some(65),
            },
            KeyEvent {
                key_code: 97,
                text: "é".into(),
                modifiers: Modifiers::alt(),
                event_type: KeyEventType::Press,
                shifted_key: None,
            },
        ];
        for event in events {
            let encoded = encode_extended_key(&event);
            assert_eq!(decode_extended_key(&encoded), Some(event), "{encoded:?}");
        }
    }

    #[test]
    fn test_encode_extended_key_shape() {
        assert_eq!(encode_extended_key(&KeyEvent::char('a')), "\x1b[97u");
        assert_eq!(
            encode_extended_key(&KeyEvent::char('a').with_modifiers(Modifiers::ctrl())),
            "\x1b[97;5u"
        );
        assert_eq!(
            encode_extended_key(&KeyEvent::char('a').with_event_type(KeyEventType::Release)),
            "\x1b[97;1:3u"
        );
    }

    #[test]
    fn test_function_codes() {
        assert_eq!(key_codes::function(1), key_codes::F1);
        assert_eq!(key_codes::function(12), key_codes::F1 + 11);
        assert!(key_codes::is_functional(key_codes::F1));
        assert!(!key_codes::is_functional(97));
    }
}
