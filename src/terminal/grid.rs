//! Character grid backing the virtual terminal.

bitflags::bitflags! {
    /// Per-cell attributes.
    ///
    /// The low byte is the SGR pen; `WIDE` / `WIDE_SPACER` mark the two
    /// halves of a double-width character.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u16 {
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const ITALIC = 1 << 2;
        const UNDERLINE = 1 << 3;
        const BLINK = 1 << 4;
        const INVERSE = 1 << 5;
        const HIDDEN = 1 << 6;
        const STRIKETHROUGH = 1 << 7;

        const WIDE = 1 << 8;
        const WIDE_SPACER = 1 << 9;

        const PEN = Self::BOLD.bits()
            | Self::DIM.bits()
            | Self::ITALIC.bits()
            | Self::UNDERLINE.bits()
            | Self::BLINK.bits()
            | Self::INVERSE.bits()
            | Self::HIDDEN.bits()
            | Self::STRIKETHROUGH.bits();
    }
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub ch: char,
    pub flags: CellFlags,
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

impl Cell {
    pub const BLANK: Cell = Cell {
        ch: ' ',
        flags: CellFlags::empty(),
    };

    pub fn new(ch: char, flags: CellFlags) -> Self {
        Self { ch, flags }
    }

    /// A blank carrying pen attributes, used by erase operations.
    pub fn blank(flags: CellFlags) -> Self {
        Self {
            ch: ' ',
            flags: flags & CellFlags::PEN,
        }
    }

    pub fn is_wide_spacer(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_SPACER)
    }
}

/// Row-major cell storage. Dimensions are never zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    columns: u16,
    rows: u16,
    cells: Vec<Cell>,
}

impl Grid {
    pub(crate) fn new(columns: u16, rows: u16) -> Self {
        Self {
            columns,
            rows,
            cells: vec![Cell::BLANK; usize::from(columns) * usize::from(rows)],
        }
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    fn idx(&self, x: u16, y: u16) -> usize {
        usize::from(y) * usize::from(self.columns) + usize::from(x)
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.columns && y < self.rows {
            self.cells.get(self.idx(x, y))
        } else {
            None
        }
    }

    pub(crate) fn cell_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if x < self.columns && y < self.rows {
            let idx = self.idx(x, y);
            self.cells.get_mut(idx)
        } else {
            None
        }
    }

    /// One row as text, spacer halves skipped and trailing blanks trimmed.
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.rows {
            return String::new();
        }
        let start = self.idx(0, y);
        let row = &self.cells[start..start + usize::from(self.columns)];
        let text: String = row.iter().filter(|c| !c.is_wide_spacer()).map(|c| c.ch).collect();
        text.trim_end().to_string()
    }

    /// All rows joined with `\n`.
    pub fn text(&self) -> String {
        (0..self.rows).map(|y| self.row_text(y)).collect::<Vec<_>>().join("\n")
    }

    /// Fill columns `[from, to)` of row `y` with `fill`.
    pub(crate) fn fill_row(&mut self, y: u16, from: u16, to: u16, fill: Cell) {
        if y >= self.rows {
            return;
        }
        let to = to.min(self.columns);
        if from >= to {
            return;
        }
        let (start, end) = (self.idx(from, y), self.idx(to - 1, y) + 1);
        self.cells[start..end].fill(fill);
        self.fixup_wide(y, from, to);
    }

    /// Fill whole rows `[from, to)`.
    pub(crate) fn fill_rows(&mut self, from: u16, to: u16, fill: Cell) {
        let to = to.min(self.rows);
        if from >= to {
            return;
        }
        let (start, end) = (self.idx(0, from), self.idx(0, to));
        self.cells[start..end].fill(fill);
    }

    /// Shift rows up by `n`, blanking the bottom.
    pub(crate) fn scroll_up(&mut self, n: u16, fill: Cell) {
        let n = n.min(self.rows);
        let shift = usize::from(n) * usize::from(self.columns);
        self.cells.rotate_left(shift);
        self.fill_rows(self.rows - n, self.rows, fill);
    }

    /// Shift rows down by `n`, blanking the top.
    pub(crate) fn scroll_down(&mut self, n: u16, fill: Cell) {
        let n = n.min(self.rows);
        let shift = usize::from(n) * usize::from(self.columns);
        self.cells.rotate_right(shift);
        self.fill_rows(0, n, fill);
    }

    /// Blank orphaned halves of wide characters at the edges of `[from, to)`.
    fn fixup_wide(&mut self, y: u16, from: u16, to: u16) {
        if from > 0 {
            if let Some(lead) = self.cell_mut(from - 1, y) {
                if lead.flags.contains(CellFlags::WIDE) {
                    *lead = Cell::BLANK;
                }
            }
        }
        if let Some(tail) = self.cell_mut(to, y) {
            if tail.is_wide_spacer() {
                *tail = Cell::BLANK;
            }
        }
    }
}
