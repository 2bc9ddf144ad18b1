//! Text editing state machine.
//!
//! A pure transition function over a single-line buffer with cursor,
//! selection and undo/redo history. Input widgets feed it the key and paste
//! events decoded by [`crate::input::parser`].
//!
//! # API
//!
//! - [`InputState`] - Buffer, cursor, selection and history
//! - [`InputAction`] - Every edit the machine understands
//! - [`apply`] - `(state, action) -> state`
//! - [`selected_text`] - The normalized selection contents
//! - [`action_for_key`] / [`action_for_paste`] - Map decoded events to actions
//!
//! Positions are measured in `char`s. Left/right movement and single
//! character deletion step over whole grapheme clusters, so a combining
//! sequence is never split by the cursor.

use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use super::events::{KeyEvent, KeyEventType, PasteEvent};
use super::keyboard::key_codes;

/// Undo history kept by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

// =============================================================================
// ACTIONS
// =============================================================================

/// Direction for character and word deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

/// Direction for line deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineDirection {
    ToStart,
    ToEnd,
}

/// Cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movement {
    Left,
    Right,
    Home,
    End,
    WordLeft,
    WordRight,
}

/// Selection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectTarget {
    Left,
    Right,
    Home,
    End,
    /// The whitespace-delimited word under the cursor.
    Word,
    All,
}

/// An edit applied by [`apply`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputAction {
    Insert(String),
    Delete(Direction),
    DeleteWord(Direction),
    DeleteLine(LineDirection),
    Move(Movement),
    Select(SelectTarget),
    Undo,
    Redo,
    Clear,
}

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    buffer: Arc<str>,
    cursor: usize,
}

/// Editing state. Every [`apply`] returns a new value.
///
/// The cursor is always within `0..=len` and selection bounds never exceed
/// `len`. The selection may be stored reversed (`start > end`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputState {
    buffer: String,
    cursor: usize,
    selection_start: Option<usize>,
    selection_end: Option<usize>,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    history_limit: usize,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    /// Empty buffer, cursor at 0.
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            selection_start: None,
            selection_end: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Seeded buffer with the cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let buffer = text.into();
        let cursor = buffer.chars().count();
        Self {
            buffer,
            cursor,
            ..Self::new()
        }
    }

    /// Bound the undo stack. Zero disables history.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        trim_history(&mut self.undo_stack, limit);
        self
    }

    /// Move the cursor (clamped) without touching history.
    pub fn with_cursor(mut self, cursor: usize) -> Self {
        self.cursor = cursor.min(self.len());
        self
    }

    /// Set the selection (each bound clamped). The cursor follows `end`.
    pub fn with_selection(mut self, start: usize, end: usize) -> Self {
        let len = self.len();
        self.selection_start = Some(start.min(len));
        self.selection_end = Some(end.min(len));
        self.cursor = end.min(len);
        self
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selection_start(&self) -> Option<usize> {
        self.selection_start
    }

    pub fn selection_end(&self) -> Option<usize> {
        self.selection_end
    }

    /// Buffer length in chars.
    pub fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Normalized `(min, max)` selection, if both bounds are set.
    pub fn selection_range(&self) -> Option<(usize, usize)> {
        let (start, end) = (self.selection_start?, self.selection_end?);
        let len = self.len();
        Some((start.min(end).min(len), start.max(end).min(len)))
    }

    /// Convenience for [`apply`].
    pub fn apply(&self, action: &InputAction) -> InputState {
        apply(self, action)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            buffer: Arc::from(self.buffer.as_str()),
            cursor: self.cursor,
        }
    }

    fn restore(&mut self, snapshot: &Snapshot) {
        self.buffer = snapshot.buffer.to_string();
        self.cursor = snapshot.cursor.min(self.len());
        self.clear_selection();
    }

    fn clear_selection(&mut self) {
        self.selection_start = None;
        self.selection_end = None;
    }

    /// Non-empty selection range.
    fn active_selection(&self) -> Option<(usize, usize)> {
        self.selection_range().filter(|(start, end)| start < end)
    }

    /// Replace `[start, end)` with `text`, recording history when the
    /// buffer changes. The cursor lands at `cursor`.
    fn splice(&mut self, start: usize, end: usize, text: &str, cursor: usize) {
        if start == end && text.is_empty() {
            self.clear_selection();
            return;
        }

        let before = self.snapshot();
        let from = byte_offset(&self.buffer, start);
        let to = byte_offset(&self.buffer, end);
        self.buffer.replace_range(from..to, text);
        self.cursor = cursor.min(self.len());
        self.clear_selection();
        self.record(before);
    }

    fn record(&mut self, before: Snapshot) {
        if self.history_limit == 0 {
            return;
        }
        self.undo_stack.push(before);
        trim_history(&mut self.undo_stack, self.history_limit);
        self.redo_stack.clear();
    }

    /// Extend (or start) the selection from the current cursor to `to`.
    fn extend_selection(&mut self, to: usize) {
        let anchor = match (self.selection_start, self.selection_end) {
            (Some(start), Some(_)) => start,
            _ => self.cursor,
        };
        self.cursor = to.min(self.len());
        self.selection_start = Some(anchor);
        self.selection_end = Some(self.cursor);
    }
}

fn trim_history(stack: &mut Vec<Snapshot>, limit: usize) {
    if stack.len() > limit {
        let excess = stack.len() - limit;
        stack.drain(..excess);
    }
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Apply one action, returning the next state.
pub fn apply(state: &InputState, action: &InputAction) -> InputState {
    let mut next = state.clone();
    // Sanitize foreign states before indexing into the buffer.
    next.cursor = next.cursor.min(next.len());

    match action {
        InputAction::Insert(text) => {
            let (start, end) = next.active_selection().unwrap_or((next.cursor, next.cursor));
            let cursor = start + text.chars().count();
            next.splice(start, end, text, cursor);
        }

        InputAction::Delete(direction) => {
            if let Some((start, end)) = next.active_selection() {
                next.splice(start, end, "", start);
            } else {
                let cursor = next.cursor;
                match direction {
                    Direction::Backward => {
                        let start = prev_grapheme(&next.buffer, cursor);
                        next.splice(start, cursor, "", start);
                    }
                    Direction::Forward => {
                        let end = next_grapheme(&next.buffer, cursor);
                        next.splice(cursor, end, "", cursor);
                    }
                }
            }
        }

        InputAction::DeleteWord(direction) => {
            if let Some((start, end)) = next.active_selection() {
                next.splice(start, end, "", start);
            } else {
                let cursor = next.cursor;
                match direction {
                    Direction::Backward => {
                        let start = word_start(&next.buffer, cursor);
                        next.splice(start, cursor, "", start);
                    }
                    Direction::Forward => {
                        let end = word_end(&next.buffer, cursor);
                        next.splice(cursor, end, "", cursor);
                    }
                }
            }
        }

        InputAction::DeleteLine(direction) => {
            let cursor = next.cursor;
            match direction {
                LineDirection::ToStart => next.splice(0, cursor, "", 0),
                LineDirection::ToEnd => {
                    let len = next.len();
                    next.splice(cursor, len, "", cursor);
                }
            }
        }

        InputAction::Move(movement) => {
            next.cursor = move_target(&next, *movement);
            next.clear_selection();
        }

        InputAction::Select(target) => select(&mut next, *target),

        InputAction::Undo => {
            if let Some(snapshot) = next.undo_stack.pop() {
                let current = next.snapshot();
                next.redo_stack.push(current);
                next.restore(&snapshot);
            }
        }

        InputAction::Redo => {
            if let Some(snapshot) = next.redo_stack.pop() {
                let current = next.snapshot();
                next.undo_stack.push(current);
                trim_history(&mut next.undo_stack, next.history_limit);
                next.restore(&snapshot);
            }
        }

        InputAction::Clear => {
            let len = next.len();
            next.splice(0, len, "", 0);
        }
    }

    next
}

fn move_target(state: &InputState, movement: Movement) -> usize {
    let text = &state.buffer;
    let cursor = state.cursor;
    match movement {
        Movement::Left => prev_grapheme(text, cursor),
        Movement::Right => next_grapheme(text, cursor),
        Movement::Home => 0,
        Movement::End => state.len(),
        Movement::WordLeft => word_start(text, cursor),
        Movement::WordRight => word_end(text, cursor),
    }
}

fn select(state: &mut InputState, target: SelectTarget) {
    match target {
        SelectTarget::Left => state.extend_selection(move_target(state, Movement::Left)),
        SelectTarget::Right => state.extend_selection(move_target(state, Movement::Right)),
        SelectTarget::Home => state.extend_selection(0),
        SelectTarget::End => {
            let len = state.len();
            state.extend_selection(len);
        }
        SelectTarget::All => {
            let len = state.len();
            state.selection_start = Some(0);
            state.selection_end = Some(len);
            state.cursor = len;
        }
        SelectTarget::Word => {
            let chars: Vec<char> = state.buffer.chars().collect();
            let mut start = state.cursor;
            while start > 0 && !chars[start - 1].is_whitespace() {
                start -= 1;
            }
            let mut end = state.cursor;
            while end < chars.len() && !chars[end].is_whitespace() {
                end += 1;
            }

            if start == end {
                state.clear_selection();
            } else {
                state.selection_start = Some(start);
                state.selection_end = Some(end);
                state.cursor = end;
            }
        }
    }
}

/// The selected text, or `None` without a non-empty selection.
pub fn selected_text(state: &InputState) -> Option<String> {
    let (start, end) = state.active_selection()?;
    Some(state.buffer.chars().skip(start).take(end - start).collect())
}

// =============================================================================
// Boundaries
// =============================================================================

fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices().nth(char_idx).map_or(text.len(), |(byte, _)| byte)
}

/// Start of the grapheme cluster before `pos`.
fn prev_grapheme(text: &str, pos: usize) -> usize {
    let mut at = 0;
    for grapheme in text.graphemes(true) {
        let next = at + grapheme.chars().count();
        if next >= pos {
            return at;
        }
        at = next;
    }
    at
}

/// End of the grapheme cluster at `pos`.
fn next_grapheme(text: &str, pos: usize) -> usize {
    let mut at = 0;
    for grapheme in text.graphemes(true) {
        at += grapheme.chars().count();
        if at > pos {
            return at;
        }
    }
    at
}

/// Start of the word before `pos`: skip whitespace, then the word.
fn word_start(text: &str, pos: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut i = pos.min(chars.len());

    while i > 0 && chars[i - 1].is_whitespace() {
        i -= 1;
    }
    while i > 0 && !chars[i - 1].is_whitespace() {
        i -= 1;
    }

    i
}

/// End of the word after `pos`: skip whitespace, then the word.
fn word_end(text: &str, pos: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut i = pos.min(len);

    while i < len && chars[i].is_whitespace() {
        i += 1;
    }
    while i < len && !chars[i].is_whitespace() {
        i += 1;
    }

    i
}

// =============================================================================
// Event Mapping
// =============================================================================

/// Map a decoded key to the edit a focused text field performs.
///
/// Releases, Enter, Escape, Tab and unbound modified keys return `None` so
/// the caller can route them elsewhere (submit, cancel, focus).
pub fn action_for_key(key: &KeyEvent) -> Option<InputAction> {
    if key.event_type == KeyEventType::Release {
        return None;
    }
    let mods = key.modifiers;
    let word = mods.ctrl || mods.alt;

    let action = match key.key_code {
        key_codes::BACKSPACE if word => InputAction::DeleteWord(Direction::Backward),
        key_codes::BACKSPACE => InputAction::Delete(Direction::Backward),
        key_codes::DELETE if word => InputAction::DeleteWord(Direction::Forward),
        key_codes::DELETE => InputAction::Delete(Direction::Forward),

        key_codes::LEFT if mods.shift => InputAction::Select(SelectTarget::Left),
        key_codes::LEFT if word => InputAction::Move(Movement::WordLeft),
        key_codes::LEFT => InputAction::Move(Movement::Left),
        key_codes::RIGHT if mods.shift => InputAction::Select(SelectTarget::Right),
        key_codes::RIGHT if word => InputAction::Move(Movement::WordRight),
        key_codes::RIGHT => InputAction::Move(Movement::Right),
        key_codes::HOME if mods.shift => InputAction::Select(SelectTarget::Home),
        key_codes::HOME => InputAction::Move(Movement::Home),
        key_codes::END if mods.shift => InputAction::Select(SelectTarget::End),
        key_codes::END => InputAction::Move(Movement::End),

        _ if mods.ctrl && !mods.alt => match key.text.as_str() {
            "a" => InputAction::Select(SelectTarget::All),
            "u" => InputAction::DeleteLine(LineDirection::ToStart),
            "k" => InputAction::DeleteLine(LineDirection::ToEnd),
            "w" => InputAction::DeleteWord(Direction::Backward),
            "z" => InputAction::Undo,
            "y" => InputAction::Redo,
            _ => return None,
        },

        _ if mods.alt || mods.meta => return None,
        _ if !key.text.is_empty() && !key.text.chars().any(char::is_control) => {
            InputAction::Insert(key.text.clone())
        }
        _ => return None,
    };
    Some(action)
}

/// A paste inserts its text, replacing any selection.
pub fn action_for_paste(paste: &PasteEvent) -> InputAction {
    InputAction::Insert(paste.text.clone())
}

// =============================================================================
// Tests
// =============================================================================
