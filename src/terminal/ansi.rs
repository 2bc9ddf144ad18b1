//! ANSI control sequences an application writes to the terminal.
//!
//! Everything here writes into any [`std::io::Write`]. The
//! [`VirtualTerminal`](super::VirtualTerminal) understands every sequence
//! this module emits, which is how the two are tested against each other.
//!
//! - Cursor movement, save/restore and visibility
//! - Screen and line erasing, scrolling, alternate screen
//! - Text attributes
//! - Mouse, keyboard, paste and focus protocol toggles
//! - Cursor position request/report and window title

use std::io::Write;

use super::grid::CellFlags;
use crate::input::keyboard::{self, KeyboardFlags};
use crate::input::{mouse, paste, MouseMode};

// =============================================================================
// Constants
// =============================================================================

/// Control Sequence Introducer.
pub const CSI: &str = "\x1b[";

/// Operating System Command.
pub const OSC: &str = "\x1b]";

/// Bell character (OSC terminator).
pub const BEL: &str = "\x07";

/// String Terminator.
pub const ST: &str = "\x1b\\";

// =============================================================================
// Cursor Movement
// =============================================================================

/// Move cursor to a 0-based position. The sequence itself is 1-based.
#[inline]
pub fn cursor_to<W: Write>(w: &mut W, x: u16, y: u16) -> std::io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

/// Move cursor up by n rows.
#[inline]
pub fn cursor_up<W: Write>(w: &mut W, n: u16) -> std::io::Result<()> {
    if n > 0 { write!(w, "\x1b[{}A", n) } else { Ok(()) }
}

/// Move cursor down by n rows.
#[inline]
pub fn cursor_down<W: Write>(w: &mut W, n: u16) -> std::io::Result<()> {
    if n > 0 { write!(w, "\x1b[{}B", n) } else { Ok(()) }
}

/// Move cursor forward (right) by n columns.
#[inline]
pub fn cursor_forward<W: Write>(w: &mut W, n: u16) -> std::io::Result<()> {
    if n > 0 { write!(w, "\x1b[{}C", n) } else { Ok(()) }
}

/// Move cursor backward (left) by n columns.
#[inline]
pub fn cursor_backward<W: Write>(w: &mut W, n: u16) -> std::io::Result<()> {
    if n > 0 { write!(w, "\x1b[{}D", n) } else { Ok(()) }
}

/// Save cursor position.
#[inline]
pub fn cursor_save<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[s")
}

/// Restore cursor position.
#[inline]
pub fn cursor_restore<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[u")
}

/// Hide cursor.
#[inline]
pub fn cursor_hide<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?25l")
}

/// Show cursor.
#[inline]
pub fn cursor_show<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?25h")
}

// =============================================================================
// Cursor Position Report
// =============================================================================

/// Ask the terminal where the cursor is.
#[inline]
pub fn request_cursor_position<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[6n")
}

/// The terminal's answer to [`request_cursor_position`] (1-based row/col).
#[inline]
pub fn cursor_position_report<W: Write>(w: &mut W, row: u16, col: u16) -> std::io::Result<()> {
    write!(w, "\x1b[{};{}R", row, col)
}

// =============================================================================
// Screen Control
// =============================================================================

/// Clear from cursor to end of line.
#[inline]
pub fn erase_to_eol<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[K")
}

/// Clear from start of line to cursor.
#[inline]
pub fn erase_from_sol<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[1K")
}

/// Clear entire line.
#[inline]
pub fn erase_line<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[2K")
}

/// Clear from cursor to end of screen.
#[inline]
pub fn erase_down<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[J")
}

/// Clear from start of screen to cursor.
#[inline]
pub fn erase_up<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[1J")
}

/// Clear entire screen.
#[inline]
pub fn erase_screen<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[2J")
}

/// Enter alternate screen buffer.
#[inline]
pub fn enter_alt_screen<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?1049h")
}

/// Exit alternate screen buffer.
#[inline]
pub fn exit_alt_screen<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?1049l")
}

/// Scroll screen up by n lines.
#[inline]
pub fn scroll_up<W: Write>(w: &mut W, n: u16) -> std::io::Result<()> {
    write!(w, "\x1b[{}S", n)
}

/// Scroll screen down by n lines.
#[inline]
pub fn scroll_down<W: Write>(w: &mut W, n: u16) -> std::io::Result<()> {
    write!(w, "\x1b[{}T", n)
}

// =============================================================================
// Text Attributes
// =============================================================================

/// Reset all attributes.
#[inline]
pub fn reset<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[0m")
}

/// Set text attributes from cell flags. Layout flags are ignored.
#[allow(unused_assignments)]
pub fn attrs<W: Write>(w: &mut W, flags: CellFlags) -> std::io::Result<()> {
    let flags = flags & CellFlags::PEN;
    if flags.is_empty() {
        return Ok(());
    }

    let mut first = true;
    write!(w, "\x1b[")?;

    macro_rules! emit {
        ($flag:expr, $code:expr) => {
            if flags.contains($flag) {
                if !first {
                    write!(w, ";")?;
                }
                write!(w, "{}", $code)?;
                first = false;
            }
        };
    }

    emit!(CellFlags::BOLD, 1);
    emit!(CellFlags::DIM, 2);
    emit!(CellFlags::ITALIC, 3);
    emit!(CellFlags::UNDERLINE, 4);
    emit!(CellFlags::BLINK, 5);
    emit!(CellFlags::INVERSE, 7);
    emit!(CellFlags::HIDDEN, 8);
    emit!(CellFlags::STRIKETHROUGH, 9);

    write!(w, "m")
}

// =============================================================================
// Protocol Toggles
// =============================================================================

/// Enable mouse reporting in `mode`.
#[inline]
pub fn enable_mouse<W: Write>(w: &mut W, mode: MouseMode) -> std::io::Result<()> {
    w.write_all(mouse::encode_enable(mode).as_bytes())
}

/// Disable mouse reporting.
#[inline]
pub fn disable_mouse<W: Write>(w: &mut W) -> std::io::Result<()> {
    w.write_all(mouse::encode_disable().as_bytes())
}

/// Push extended keyboard flags.
#[inline]
pub fn enable_kitty_keyboard<W: Write>(w: &mut W, flags: KeyboardFlags) -> std::io::Result<()> {
    w.write_all(keyboard::encode_enable(flags).as_bytes())
}

/// Pop extended keyboard flags.
#[inline]
pub fn disable_kitty_keyboard<W: Write>(w: &mut W) -> std::io::Result<()> {
    w.write_all(keyboard::encode_disable().as_bytes())
}

/// Ask for the current extended keyboard flags.
#[inline]
pub fn query_kitty_keyboard<W: Write>(w: &mut W) -> std::io::Result<()> {
    w.write_all(keyboard::encode_query().as_bytes())
}

/// Enable bracketed paste mode.
#[inline]
pub fn enable_bracketed_paste<W: Write>(w: &mut W) -> std::io::Result<()> {
    w.write_all(paste::encode_enable().as_bytes())
}

/// Disable bracketed paste mode.
#[inline]
pub fn disable_bracketed_paste<W: Write>(w: &mut W) -> std::io::Result<()> {
    w.write_all(paste::encode_disable().as_bytes())
}

/// Enable focus reporting.
#[inline]
pub fn enable_focus_reporting<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?1004h")
}

/// Disable focus reporting.
#[inline]
pub fn disable_focus_reporting<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?1004l")
}

// =============================================================================
// Window/Title
// =============================================================================

/// Set terminal window title.
#[inline]
pub fn set_title<W: Write>(w: &mut W, title: &str) -> std::io::Result<()> {
    write!(w, "{OSC}0;{title}{BEL}")
}

// =============================================================================
// Tests
// =============================================================================
