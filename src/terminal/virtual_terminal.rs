//! Virtual terminal interpreter.
//!
//! Consumes the byte stream an application writes (cursor moves, erases,
//! mode toggles, text) and keeps the resulting screen state. Used to check
//! encoders against a terminal model and to drive headless tests.
//!
//! # Supported sequences
//!
//! | Sequence | Effect |
//! |---|---|
//! | printable / UTF-8 | Write at cursor (wide chars take two cells) |
//! | `\n` `\r` `\t` `\b` | Newline (CR+LF), carriage return, tab stop (every 8), backspace |
//! | `CSI n A/B/C/D/E/F/G/d` | Relative / absolute cursor moves |
//! | `CSI r ; c H` / `f` | Absolute position (1-based) |
//! | `CSI n J` / `K` | Erase display / line (0 = to end, 1 = from start, 2 = all) |
//! | `CSI n S` / `T` | Scroll up / down |
//! | `CSI … m` | SGR pen attributes |
//! | `CSI s` / `u`, `ESC 7` / `ESC 8` | Save / restore cursor |
//! | `CSI ? n h/l` | DEC modes 25, 1000/1002/1003/1006, 1004, 1049, 2004 |
//! | `CSI 6 n`, `CSI 5 n` | Cursor position / status report (queued) |
//! | `CSI > f u`, `CSI < n u`, `CSI = f ; m u`, `CSI ? u` | Extended keyboard flag stack |
//! | `OSC 0;t` / `OSC 2;t` | Title (BEL or `ESC \` terminated) |
//!
//! Anything else is consumed and ignored with a trace log.

use unicode_width::UnicodeWidthChar;

use super::grid::{Cell, CellFlags, Grid};
use crate::error::{Error, Result};
use crate::input::csi::{self, ESC};
use crate::input::KeyboardFlags;

/// Longest CSI sequence accepted before it is abandoned.
const MAX_CSI_LEN: usize = 256;

/// Longest OSC payload kept.
const MAX_OSC_LEN: usize = 4096;

/// Depth of the extended keyboard flag stack.
const MAX_KEYBOARD_STACK: usize = 16;

const TAB_WIDTH: u32 = 8;

// =============================================================================
// Modes
// =============================================================================

bitflags::bitflags! {
    /// DEC private modes the interpreter tracks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TerminalModes: u16 {
        /// 1000
        const MOUSE_NORMAL = 1 << 0;
        /// 1002
        const MOUSE_BUTTON_EVENT = 1 << 1;
        /// 1003
        const MOUSE_ANY_EVENT = 1 << 2;
        /// 1006
        const MOUSE_SGR = 1 << 3;
        /// 1004
        const FOCUS_REPORTING = 1 << 4;
        /// 2004
        const BRACKETED_PASTE = 1 << 5;

        const MOUSE_TRACKING = Self::MOUSE_NORMAL.bits()
            | Self::MOUSE_BUTTON_EVENT.bits()
            | Self::MOUSE_ANY_EVENT.bits();
    }
}

/// A 1-based cursor position, as carried by a cursor position report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorPosition {
    pub row: u16,
    pub col: u16,
}

/// Decode a cursor position report: `ESC [ row ; col R`.
pub fn parse_cursor_position_report(seq: impl AsRef<[u8]>) -> Option<CursorPosition> {
    let seq = seq.as_ref();
    let csi = csi::scan(seq)?;
    if csi.len != seq.len() || csi.marker.is_some() || csi.final_byte != b'R' {
        return None;
    }
    if !csi.intermediates.is_empty() {
        return None;
    }
    let mut sections = csi.sections();
    let row = sections.next().and_then(csi::number)?;
    let col = sections.next().and_then(csi::number)?;
    if sections.next().is_some() {
        return None;
    }
    Some(CursorPosition {
        row: u16::try_from(row).ok()?,
        col: u16::try_from(col).ok()?,
    })
}

// =============================================================================
// Interpreter
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Ground,
    Escape,
    Csi,
    Osc,
    OscEscape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SavedScreen {
    grid: Grid,
    cursor: (u16, u16),
}

/// Screen state rebuilt from an output byte stream.
///
/// ```
/// use spark_tui_input::terminal::VirtualTerminal;
///
/// let mut vt = VirtualTerminal::new(80, 24).unwrap();
/// vt.feed("\x1b[24;80H\x1b[6n");
/// assert_eq!(vt.take_responses(), b"\x1b[24;80R");
/// ```
#[derive(Debug, Clone)]
pub struct VirtualTerminal {
    grid: Grid,
    cursor_x: u16,
    cursor_y: u16,
    /// Set after writing the last column; the next printable wraps first.
    wrap_pending: bool,
    cursor_visible: bool,
    pen: CellFlags,
    saved_cursor: Option<(u16, u16)>,
    title: String,
    primary: Option<SavedScreen>,
    modes: TerminalModes,
    keyboard_stack: Vec<KeyboardFlags>,
    responses: Vec<u8>,
    // Parser state
    state: ParseState,
    seq: Vec<u8>,
    osc: Vec<u8>,
    utf8_buf: [u8; 4],
    utf8_len: u8,
    utf8_expected: u8,
}

impl VirtualTerminal {
    /// A blank terminal. Both dimensions must be non-zero.
    pub fn new(columns: u16, rows: u16) -> Result<Self> {
        check_size(columns, rows)?;
        Ok(Self {
            grid: Grid::new(columns, rows),
            cursor_x: 0,
            cursor_y: 0,
            wrap_pending: false,
            cursor_visible: true,
            pen: CellFlags::empty(),
            saved_cursor: None,
            title: String::new(),
            primary: None,
            modes: TerminalModes::empty(),
            keyboard_stack: Vec::new(),
            responses: Vec::new(),
            state: ParseState::Ground,
            seq: Vec::new(),
            osc: Vec::new(),
            utf8_buf: [0; 4],
            utf8_len: 0,
            utf8_expected: 0,
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn columns(&self) -> u16 {
        self.grid.columns()
    }

    pub fn rows(&self) -> u16 {
        self.grid.rows()
    }

    /// `(columns, rows)`
    pub fn size(&self) -> (u16, u16) {
        (self.grid.columns(), self.grid.rows())
    }

    /// 0-based `(x, y)`.
    pub fn cursor(&self) -> (u16, u16) {
        (self.cursor_x, self.cursor_y)
    }

    /// 1-based cursor position, as a report would carry it.
    pub fn cursor_position(&self) -> CursorPosition {
        CursorPosition {
            row: self.cursor_y + 1,
            col: self.cursor_x + 1,
        }
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_alternate_screen(&self) -> bool {
        self.primary.is_some()
    }

    pub fn modes(&self) -> TerminalModes {
        self.modes
    }

    /// Any mouse reporting mode is on.
    pub fn mouse_enabled(&self) -> bool {
        self.modes.intersects(TerminalModes::MOUSE_TRACKING | TerminalModes::MOUSE_SGR)
    }

    pub fn bracketed_paste(&self) -> bool {
        self.modes.contains(TerminalModes::BRACKETED_PASTE)
    }

    /// Active extended keyboard flags (top of the stack).
    pub fn keyboard_flags(&self) -> KeyboardFlags {
        self.keyboard_stack.last().copied().unwrap_or(KeyboardFlags::empty())
    }

    /// Current SGR pen.
    pub fn pen(&self) -> CellFlags {
        self.pen
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cell_at(&self, x: u16, y: u16) -> Option<&Cell> {
        self.grid.cell(x, y)
    }

    pub fn char_at(&self, x: u16, y: u16) -> Option<char> {
        self.grid.cell(x, y).map(|c| c.ch)
    }

    pub fn row_text(&self, y: u16) -> String {
        self.grid.row_text(y)
    }

    pub fn screen_text(&self) -> String {
        self.grid.text()
    }

    /// Drain replies the terminal would have sent back (reports, query answers).
    pub fn take_responses(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.responses)
    }

    // -------------------------------------------------------------------------
    // Control
    // -------------------------------------------------------------------------

    /// Reallocate the grid. Contents are discarded and the cursor clamped.
    pub fn resize(&mut self, columns: u16, rows: u16) -> Result<()> {
        check_size(columns, rows)?;
        tracing::debug!(columns, rows, "virtual terminal resized");

        self.grid = Grid::new(columns, rows);
        if let Some(primary) = &mut self.primary {
            primary.grid = Grid::new(columns, rows);
            primary.cursor = clamp_to(primary.cursor, columns, rows);
        }
        (self.cursor_x, self.cursor_y) = clamp_to((self.cursor_x, self.cursor_y), columns, rows);
        self.saved_cursor = self.saved_cursor.map(|c| clamp_to(c, columns, rows));
        self.wrap_pending = false;
        Ok(())
    }

    /// Full reset (`ESC c`). Size is kept.
    pub fn reset(&mut self) {
        let (columns, rows) = self.size();
        self.grid = Grid::new(columns, rows);
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.wrap_pending = false;
        self.cursor_visible = true;
        self.pen = CellFlags::empty();
        self.saved_cursor = None;
        self.title.clear();
        self.primary = None;
        self.modes = TerminalModes::empty();
        self.keyboard_stack.clear();
    }

    // -------------------------------------------------------------------------
    // Input Processing
    // -------------------------------------------------------------------------

    /// Feed output bytes. Sequences may be split across calls.
    pub fn feed(&mut self, data: impl AsRef<[u8]>) {
        for &byte in data.as_ref() {
            self.process_byte(byte);
        }
    }

    fn process_byte(&mut self, byte: u8) {
        match self.state {
            ParseState::Ground => self.ground(byte),
            ParseState::Escape => self.escape(byte),
            ParseState::Csi => self.csi(byte),
            ParseState::Osc => self.osc(byte),
            ParseState::OscEscape => self.osc_escape(byte),
        }
    }

    fn ground(&mut self, byte: u8) {
        if self.utf8_len > 0 {
            if (0x80..=0xBF).contains(&byte) {
                self.utf8_continue(byte);
                return;
            }
            // Truncated sequence.
            self.utf8_len = 0;
            self.put_char(char::REPLACEMENT_CHARACTER);
        }

        match byte {
            ESC => self.state = ParseState::Escape,
            b'\n' => {
                self.cursor_x = 0;
                self.linefeed();
            }
            b'\r' => self.set_cursor_x(0),
            b'\t' => {
                let next = (u32::from(self.cursor_x) / TAB_WIDTH + 1) * TAB_WIDTH;
                let last = self.columns() - 1;
                self.set_cursor_x(u16::try_from(next).map_or(last, |next| next.min(last)));
            }
            0x08 => self.set_cursor_x(self.cursor_x.saturating_sub(1)),
            0x20..=0x7E => self.put_char(char::from(byte)),
            0xC2..=0xDF => self.utf8_start(byte, 2),
            0xE0..=0xEF => self.utf8_start(byte, 3),
            0xF0..=0xF4 => self.utf8_start(byte, 4),
            0x80..=0xFF => self.put_char(char::REPLACEMENT_CHARACTER),
            // BEL and other C0 controls
            _ => {}
        }
    }

    fn utf8_start(&mut self, byte: u8, expected: u8) {
        self.utf8_buf[0] = byte;
        self.utf8_len = 1;
        self.utf8_expected = expected;
    }

    fn utf8_continue(&mut self, byte: u8) {
        self.utf8_buf[usize::from(self.utf8_len)] = byte;
        self.utf8_len += 1;
        if self.utf8_len < self.utf8_expected {
            return;
        }

        let len = usize::from(self.utf8_len);
        self.utf8_len = 0;
        let bytes = self.utf8_buf;
        match std::str::from_utf8(&bytes[..len]) {
            Ok(decoded) => {
                for ch in decoded.chars() {
                    self.put_char(ch);
                }
            }
            Err(_) => self.put_char(char::REPLACEMENT_CHARACTER),
        }
    }

    fn escape(&mut self, byte: u8) {
        self.state = ParseState::Ground;
        match byte {
            b'[' => {
                self.seq.clear();
                self.seq.extend_from_slice(&[ESC, b'[']);
                self.state = ParseState::Csi;
            }
            b']' => {
                self.osc.clear();
                self.state = ParseState::Osc;
            }
            b'7' => self.saved_cursor = Some(self.cursor()),
            b'8' => self.restore_cursor(),
            b'D' => self.linefeed(),
            b'E' => {
                self.cursor_x = 0;
                self.linefeed();
            }
            b'M' => self.reverse_index(),
            b'c' => self.reset(),
            ESC => self.state = ParseState::Escape,
            // Stray string terminator
            b'\\' => {}
            _ => tracing::trace!(byte, "unhandled escape sequence"),
        }
    }

    fn csi(&mut self, byte: u8) {
        match byte {
            0x40..=0x7E => {
                self.seq.push(byte);
                self.state = ParseState::Ground;
                self.dispatch_csi();
            }
            0x20..=0x3F => {
                self.seq.push(byte);
                if self.seq.len() > MAX_CSI_LEN {
                    tracing::debug!(len = self.seq.len(), "abandoning oversized CSI sequence");
                    self.state = ParseState::Ground;
                }
            }
            ESC => self.state = ParseState::Escape,
            _ => {
                tracing::trace!(byte, "CSI sequence aborted");
                self.state = ParseState::Ground;
            }
        }
    }

    fn osc(&mut self, byte: u8) {
        match byte {
            0x07 => {
                self.dispatch_osc();
                self.state = ParseState::Ground;
            }
            ESC => self.state = ParseState::OscEscape,
            _ => {
                if self.osc.len() < MAX_OSC_LEN {
                    self.osc.push(byte);
                }
            }
        }
    }

    fn osc_escape(&mut self, byte: u8) {
        self.dispatch_osc();
        if byte == b'\\' {
            self.state = ParseState::Ground;
        } else {
            // Unterminated OSC: the ESC starts a new sequence.
            self.escape(byte);
        }
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    fn dispatch_csi(&mut self) {
        let seq = std::mem::take(&mut self.seq);
        match csi::scan(&seq) {
            Some(parsed) if parsed.len == seq.len() => self.execute_csi(&parsed),
            _ => tracing::trace!(seq = ?String::from_utf8_lossy(&seq), "malformed CSI sequence"),
        }
        self.seq = seq;
        self.seq.clear();
    }

    fn execute_csi(&mut self, seq: &csi::Csi<'_>) {
        if !seq.intermediates.is_empty() {
            tracing::trace!(final_byte = seq.final_byte, "unhandled CSI with intermediates");
            return;
        }

        let count = |idx: usize| clamp_u16(seq.param(idx, 1).max(1));
        let (columns, rows) = self.size();

        match (seq.marker, seq.final_byte) {
            (None, b'A') => self.set_cursor_y(self.cursor_y.saturating_sub(count(0))),
            (None, b'B') => self.set_cursor_y(self.cursor_y.saturating_add(count(0)).min(rows - 1)),
            (None, b'C') => {
                self.set_cursor_x(self.cursor_x.saturating_add(count(0)).min(columns - 1));
            }
            (None, b'D') => self.set_cursor_x(self.cursor_x.saturating_sub(count(0))),
            (None, b'E') => {
                self.set_cursor_y(self.cursor_y.saturating_add(count(0)).min(rows - 1));
                self.cursor_x = 0;
            }
            (None, b'F') => {
                self.set_cursor_y(self.cursor_y.saturating_sub(count(0)));
                self.cursor_x = 0;
            }
            (None, b'G') => self.set_cursor_x((count(0) - 1).min(columns - 1)),
            (None, b'd') => self.set_cursor_y((count(0) - 1).min(rows - 1)),
            (None, b'H' | b'f') => {
                self.cursor_y = (count(0) - 1).min(rows - 1);
                self.set_cursor_x((count(1) - 1).min(columns - 1));
            }
            (None, b'J') => self.erase_display(seq.param(0, 0)),
            (None, b'K') => self.erase_line(seq.param(0, 0)),
            (None, b'S') => self.grid.scroll_up(count(0), Cell::blank(self.pen)),
            (None, b'T') => self.grid.scroll_down(count(0), Cell::blank(self.pen)),
            (None, b'm') => self.dispatch_sgr(seq),
            (None, b's') => self.saved_cursor = Some(self.cursor()),
            (None, b'u') => self.restore_cursor(),
            (None, b'n') => match seq.param(0, 0) {
                5 => self.responses.extend_from_slice(b"\x1b[0n"),
                6 => {
                    let pos = self.cursor_position();
                    let report = format!("\x1b[{};{}R", pos.row, pos.col);
                    self.responses.extend_from_slice(report.as_bytes());
                }
                other => tracing::trace!(other, "unhandled device status request"),
            },
            (Some(b'?'), b'h' | b'l') => {
                let enable = seq.final_byte == b'h';
                for mode in seq.sections().filter_map(csi::number) {
                    self.set_dec_mode(mode, enable);
                }
            }
            (Some(b'?'), b'u') => {
                let report = format!("\x1b[?{}u", self.keyboard_flags().bits());
                self.responses.extend_from_slice(report.as_bytes());
            }
            (Some(b'>'), b'u') => {
                let flags = KeyboardFlags::from_bits_truncate(seq.param(0, 0));
                if self.keyboard_stack.len() == MAX_KEYBOARD_STACK {
                    self.keyboard_stack.remove(0);
                }
                self.keyboard_stack.push(flags);
            }
            (Some(b'<'), b'u') => {
                let n = (seq.param(0, 1).max(1) as usize).min(self.keyboard_stack.len());
                self.keyboard_stack.truncate(self.keyboard_stack.len() - n);
            }
            (Some(b'='), b'u') => {
                let flags = KeyboardFlags::from_bits_truncate(seq.param(0, 0));
                let current = self.keyboard_flags();
                let next = match seq.param(1, 1) {
                    2 => current | flags,
                    3 => current - flags,
                    _ => flags,
                };
                match self.keyboard_stack.last_mut() {
                    Some(top) => *top = next,
                    None => self.keyboard_stack.push(next),
                }
            }
            (marker, final_byte) => {
                tracing::trace!(?marker, final_byte, "unhandled CSI sequence");
            }
        }
    }

    fn dispatch_sgr(&mut self, seq: &csi::Csi<'_>) {
        let params: Vec<u32> = seq
            .sections()
            .map(|section| section.split(|&b| b == b':').next().and_then(csi::number).unwrap_or(0))
            .collect();
        if params.is_empty() {
            self.pen = CellFlags::empty();
            return;
        }

        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => self.pen = CellFlags::empty(),
                1 => self.pen |= CellFlags::BOLD,
                2 => self.pen |= CellFlags::DIM,
                3 => self.pen |= CellFlags::ITALIC,
                4 => self.pen |= CellFlags::UNDERLINE,
                5 => self.pen |= CellFlags::BLINK,
                7 => self.pen |= CellFlags::INVERSE,
                8 => self.pen |= CellFlags::HIDDEN,
                9 => self.pen |= CellFlags::STRIKETHROUGH,
                22 => self.pen -= CellFlags::BOLD | CellFlags::DIM,
                23 => self.pen -= CellFlags::ITALIC,
                24 => self.pen -= CellFlags::UNDERLINE,
                25 => self.pen -= CellFlags::BLINK,
                27 => self.pen -= CellFlags::INVERSE,
                28 => self.pen -= CellFlags::HIDDEN,
                29 => self.pen -= CellFlags::STRIKETHROUGH,
                // Extended colors carry their arguments in the following params.
                38 | 48 | 58 => match params.get(i + 1) {
                    Some(5) => i += 2,
                    Some(2) => i += 4,
                    _ => {}
                },
                // Colors are not modelled.
                _ => {}
            }
            i += 1;
        }
    }

    fn dispatch_osc(&mut self) {
        let data = String::from_utf8_lossy(&self.osc).into_owned();
        self.osc.clear();
        match data.split_once(';') {
            Some(("0" | "2", title)) => self.title = title.to_string(),
            _ => tracing::trace!(len = data.len(), "unhandled OSC sequence"),
        }
    }

    fn set_dec_mode(&mut self, mode: u32, enable: bool) {
        let flag = match mode {
            25 => {
                self.cursor_visible = enable;
                return;
            }
            1049 | 1047 | 47 => {
                self.set_alternate_screen(enable);
                return;
            }
            // Any tracking reset stops reporting altogether.
            1000 | 1002 | 1003 if !enable => TerminalModes::MOUSE_TRACKING,
            1000 => TerminalModes::MOUSE_NORMAL,
            1002 => TerminalModes::MOUSE_BUTTON_EVENT,
            1003 => TerminalModes::MOUSE_ANY_EVENT,
            1006 => TerminalModes::MOUSE_SGR,
            1004 => TerminalModes::FOCUS_REPORTING,
            2004 => TerminalModes::BRACKETED_PASTE,
            other => {
                tracing::trace!(mode = other, enable, "unhandled DEC mode");
                return;
            }
        };
        self.modes.set(flag, enable);
    }

    fn set_alternate_screen(&mut self, enable: bool) {
        if enable && self.primary.is_none() {
            let (columns, rows) = self.size();
            let grid = std::mem::replace(&mut self.grid, Grid::new(columns, rows));
            self.primary = Some(SavedScreen {
                grid,
                cursor: self.cursor(),
            });
            self.cursor_x = 0;
            self.cursor_y = 0;
            self.wrap_pending = false;
        } else if !enable {
            if let Some(saved) = self.primary.take() {
                self.grid = saved.grid;
                (self.cursor_x, self.cursor_y) = saved.cursor;
                self.wrap_pending = false;
            }
        }
    }

    // -------------------------------------------------------------------------
    // Grid Operations
    // -------------------------------------------------------------------------

    fn set_cursor_x(&mut self, x: u16) {
        self.cursor_x = x;
        self.wrap_pending = false;
    }

    fn set_cursor_y(&mut self, y: u16) {
        self.cursor_y = y;
        self.wrap_pending = false;
    }

    fn restore_cursor(&mut self) {
        if let Some((x, y)) = self.saved_cursor {
            self.cursor_y = y.min(self.rows() - 1);
            self.set_cursor_x(x.min(self.columns() - 1));
        }
    }

    /// Write one character at the cursor.
    ///
    /// Filling the last column does not move to the next row: the cursor stays
    /// on the last column with a pending wrap, taken by the next printable
    /// character. A position report in between shows the last column.
    fn put_char(&mut self, ch: char) {
        let width = match ch.width() {
            Some(w @ 1..=2) => w as u16,
            // Zero-width marks are not composed onto cells.
            _ => return,
        };
        let columns = self.columns();
        if width > columns {
            return;
        }

        if self.wrap_pending {
            self.cursor_x = 0;
            self.linefeed();
        }
        if u32::from(self.cursor_x) + u32::from(width) > u32::from(columns) {
            // A wide char that does not fit wraps early.
            self.grid.fill_row(self.cursor_y, self.cursor_x, columns, Cell::BLANK);
            self.cursor_x = 0;
            self.linefeed();
        }

        // x + width <= columns from here on.
        let (x, y) = (self.cursor_x, self.cursor_y);
        self.grid.fill_row(y, x, x + width, Cell::BLANK);
        if width == 2 {
            if let Some(cell) = self.grid.cell_mut(x, y) {
                *cell = Cell::new(ch, self.pen | CellFlags::WIDE);
            }
            if let Some(cell) = self.grid.cell_mut(x + 1, y) {
                *cell = Cell::new(' ', self.pen | CellFlags::WIDE_SPACER);
            }
        } else if let Some(cell) = self.grid.cell_mut(x, y) {
            *cell = Cell::new(ch, self.pen);
        }

        let next = x + width;
        if next >= columns {
            self.cursor_x = columns - 1;
            self.wrap_pending = true;
        } else {
            self.cursor_x = next;
            self.wrap_pending = false;
        }
    }

    fn linefeed(&mut self) {
        self.wrap_pending = false;
        if self.cursor_y + 1 >= self.rows() {
            self.grid.scroll_up(1, Cell::blank(self.pen));
        } else {
            self.cursor_y += 1;
        }
    }

    fn reverse_index(&mut self) {
        self.wrap_pending = false;
        if self.cursor_y == 0 {
            self.grid.scroll_down(1, Cell::blank(self.pen));
        } else {
            self.cursor_y -= 1;
        }
    }

    fn erase_display(&mut self, mode: u32) {
        let blank = Cell::blank(self.pen);
        let (columns, rows) = self.size();
        let (x, y) = self.cursor();
        match mode {
            0 => {
                self.grid.fill_row(y, x, columns, blank);
                self.grid.fill_rows(y + 1, rows, blank);
            }
            1 => {
                self.grid.fill_rows(0, y, blank);
                self.grid.fill_row(y, 0, x + 1, blank);
            }
            2 | 3 => self.grid.fill_rows(0, rows, blank),
            other => tracing::trace!(mode = other, "unhandled erase display mode"),
        }
    }

    fn erase_line(&mut self, mode: u32) {
        let blank = Cell::blank(self.pen);
        let columns = self.columns();
        let (x, y) = self.cursor();
        match mode {
            0 => self.grid.fill_row(y, x, columns, blank),
            1 => self.grid.fill_row(y, 0, x + 1, blank),
            2 => self.grid.fill_row(y, 0, columns, blank),
            other => tracing::trace!(mode = other, "unhandled erase line mode"),
        }
    }
}

/// Lets the [`ansi`](super::ansi) writers target the terminal directly.
impl std::io::Write for VirtualTerminal {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.feed(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn check_size(columns: u16, rows: u16) -> Result<()> {
    if columns == 0 || rows == 0 {
        return Err(Error::InvalidSize { columns, rows });
    }
    Ok(())
}

fn clamp_to((x, y): (u16, u16), columns: u16, rows: u16) -> (u16, u16) {
    (x.min(columns - 1), y.min(rows - 1))
}

fn clamp_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

// =============================================================================
// Tests
// =============================================================================
