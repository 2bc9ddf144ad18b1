//! Terminal side of the protocol layer.
//!
//! What the application writes ([`ansi`]), a model of the terminal that
//! interprets those writes ([`virtual_terminal`]), and the bytes that terminal
//! sends back for user input ([`inject`]).
//!
//! ```text
//! app output → ansi writers → VirtualTerminal ─┬─ grid / cursor / modes
//!                                              └─ responses (CPR, ?u)
//! test input → inject (per negotiated modes) → input::parse
//! ```

pub mod ansi;
pub mod grid;
pub mod inject;
pub mod virtual_terminal;

pub use grid::{Cell, CellFlags, Grid};
pub use inject::{encode_key, encode_mouse, encode_paste};
pub use virtual_terminal::{
    parse_cursor_position_report, CursorPosition, TerminalModes, VirtualTerminal,
};
