//! # spark-tui-input
//!
//! Terminal input protocol layer for SparkTUI.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for the
//! reactive keyboard protocol override.
//!
//! ## Architecture
//!
//! Raw bytes from the terminal are decoded into closed event types, which
//! drive a pure text-editing state machine. The reverse direction - what the
//! application writes to negotiate protocols - is checked against a virtual
//! terminal that also synthesizes input:
//! ```text
//! stdin bytes → input::parse → ParsedInput → text_edit::apply → InputState
//! app output  → terminal::VirtualTerminal → grid, modes, responses
//! ```
//!
//! ## Modules
//!
//! - [`input`] - Key, mouse and paste codecs, the unified parser, text editing
//! - [`terminal`] - ANSI writers, virtual terminal, input injection
//! - [`error`] - Crate error type

pub mod error;
pub mod input;
pub mod terminal;

pub use error::{Error, Result};

pub use input::{
    parse, parse_events, FocusEvent, InputAction, InputEvent, InputState, KeyEvent,
    KeyEventType, KeyboardFlags, Modifiers, MouseAction, MouseButton, MouseEvent, ParsedInput,
    PasteEvent, ProtocolContext, ProtocolMode,
};

pub use terminal::{CursorPosition, VirtualTerminal};
