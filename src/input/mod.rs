//! Input protocol layer - terminal bytes → structured events → text edits.
//!
//! Decodes what the terminal sends, encodes what the application sends to
//! negotiate protocols, and drives single-line text editing.
//!
//! # Architecture
//!
//! ```text
//! input bytes → parser ─┬─ paste    (ESC[200~ … ESC[201~)
//!                       ├─ focus    (ESC[I / ESC[O)
//!                       ├─ mouse    (SGR / X10)
//!                       ├─ keyboard (extended CSI … u)
//!                       └─ legacy   (fallback, total)
//!                               │
//!                          ParsedInput
//!                               │
//!                 focus / dispatch (external)
//!                               │
//!                 text_edit::apply(state, action)
//! ```

pub(crate) mod csi;

pub mod events;
pub mod keyboard;
pub mod legacy;
pub mod mouse;
pub mod parser;
pub mod paste;
pub mod text_edit;

pub use events::{
    FocusEvent, InputEvent, KeyEvent, KeyEventType, Modifiers, MouseAction, MouseButton,
    MouseEvent, ParsedInput, PasteEvent,
};
pub use keyboard::{key_codes, KeyboardFlags, ProtocolContext, ProtocolMode, TerminalEnv};
pub use mouse::{MouseEncoding, MouseMode};
pub use parser::{parse, parse_events};
pub use paste::PasteExtraction;
pub use text_edit::{apply, selected_text, InputAction, InputState};
