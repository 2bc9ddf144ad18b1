//! Structured input events produced by the codecs.
//!
//! Every decoder in this crate produces one of the closed event types below.
//! Downstream dispatch (focus routing, widgets) matches on them exhaustively,
//! so a new event kind is a compile-time-checked addition.

// =============================================================================
// KEYBOARD
// =============================================================================

/// Keyboard modifier state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Create empty modifiers
    pub fn none() -> Self {
        Self::default()
    }

    /// Create modifiers with ctrl
    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::default() }
    }

    /// Create modifiers with alt
    pub fn alt() -> Self {
        Self { alt: true, ..Self::default() }
    }

    /// Create modifiers with shift
    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }

    /// True when no modifier is held.
    pub fn is_empty(&self) -> bool {
        !(self.ctrl || self.alt || self.shift || self.meta)
    }
}

/// Key event type (press, repeat, release)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyEventType {
    #[default]
    Press,
    Repeat,
    Release,
}

/// A decoded key event.
///
/// `key_code` is a Unicode codepoint for character keys, or one of the
/// functional codes in [`crate::input::keyboard::key_codes`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: u32,
    /// Text produced by the key. Empty for non-printable keys.
    pub text: String,
    pub modifiers: Modifiers,
    pub event_type: KeyEventType,
    /// Alternate keycode for the shifted form (extended protocol only).
    pub shifted_key: Option<u32>,
}

impl KeyEvent {
    /// A press of a printable character.
    pub fn char(ch: char) -> Self {
        Self {
            key_code: ch as u32,
            text: ch.to_string(),
            modifiers: Modifiers::none(),
            event_type: KeyEventType::Press,
            shifted_key: None,
        }
    }

    /// A press of a non-printable key (empty text).
    pub fn code(key_code: u32) -> Self {
        Self {
            key_code,
            text: String::new(),
            modifiers: Modifiers::none(),
            event_type: KeyEventType::Press,
            shifted_key: None,
        }
    }

    /// Builder-style modifier override.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Builder-style event type override.
    pub fn with_event_type(mut self, event_type: KeyEventType) -> Self {
        self.event_type = event_type;
        self
    }

    /// Check if this is a press event
    pub fn is_press(&self) -> bool {
        self.event_type == KeyEventType::Press
    }
}

// =============================================================================
// MOUSE
// =============================================================================

/// Mouse button reported with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    None,
    WheelUp,
    WheelDown,
}

/// Mouse action type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseAction {
    Down,
    Up,
    Drag,
    Wheel,
    Move,
}

/// A decoded mouse report.
///
/// Coordinates are what the wire format carries, with no translation into
/// component space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub x: u16,
    pub y: u16,
    pub button: MouseButton,
    pub action: MouseAction,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl MouseEvent {
    /// Button press at a position, no modifiers.
    pub fn down(button: MouseButton, x: u16, y: u16) -> Self {
        Self::new(MouseAction::Down, button, x, y)
    }

    /// Button release at a position, no modifiers.
    pub fn up(button: MouseButton, x: u16, y: u16) -> Self {
        Self::new(MouseAction::Up, button, x, y)
    }

    pub fn new(action: MouseAction, button: MouseButton, x: u16, y: u16) -> Self {
        Self {
            x,
            y,
            button,
            action,
            ctrl: false,
            alt: false,
            shift: false,
        }
    }
}

// =============================================================================
// PASTE / FOCUS
// =============================================================================

/// Pasted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEvent {
    pub text: String,
    pub is_bracketed: bool,
}

/// Terminal focus change (focus reporting mode 1004).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusEvent {
    Gained,
    Lost,
}

// =============================================================================
// PARSED CHUNK
// =============================================================================

/// One decoded event, in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Paste(PasteEvent),
    Focus(FocusEvent),
}

/// Everything decoded from one input chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInput {
    pub keys: Vec<KeyEvent>,
    pub mouse: Option<MouseEvent>,
    pub paste: Option<PasteEvent>,
    pub focus: Option<FocusEvent>,
}

impl ParsedInput {
    /// True when the chunk produced nothing.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.mouse.is_none() && self.paste.is_none() && self.focus.is_none()
    }
}
