//! Text input component.
//!
//! A single-line text input with cursor movement and an overwrite-primed
//! mode: when an inline edit opens, the existing text is selected so the
//! first keystroke replaces it wholesale, matching the double-click-to-
//! edit convention the detail view implements.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// A text input widget.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    /// The current input value.
    value: String,
    /// Cursor position within the value, in bytes (ASCII-safe edits only
    /// move through char boundaries).
    cursor: usize,
    /// Placeholder text shown when empty.
    placeholder: String,
    /// Whether the whole value is "selected": the next character typed
    /// replaces everything.
    primed: bool,
}

impl TextInput {
    /// Create a new empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input seeded with a value, with the value selected for
    /// overwrite.
    pub fn with_value_selected(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.len();
        Self {
            value,
            cursor,
            placeholder: String::new(),
            primed: true,
        }
    }

    /// Set the placeholder text.
    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.placeholder = placeholder.into();
    }

    /// Get the current value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Set the value and move the cursor to the end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.len();
        self.primed = false;
    }

    /// Clear the input.
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
        self.primed = false;
    }

    /// Handle keyboard input. Returns true if the value was modified.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                if self.primed {
                    self.clear();
                }
                self.insert_char(c);
                true
            }
            (KeyCode::Backspace, _) => {
                if self.primed {
                    self.clear();
                    return true;
                }
                if self.cursor > 0 {
                    let prev = prev_boundary(&self.value, self.cursor);
                    self.value.replace_range(prev..self.cursor, "");
                    self.cursor = prev;
                    true
                } else {
                    false
                }
            }
            (KeyCode::Delete, _) => {
                self.primed = false;
                if self.cursor < self.value.len() {
                    let next = next_boundary(&self.value, self.cursor);
                    self.value.replace_range(self.cursor..next, "");
                    true
                } else {
                    false
                }
            }
            (KeyCode::Left, _) => {
                self.primed = false;
                if self.cursor > 0 {
                    self.cursor = prev_boundary(&self.value, self.cursor);
                }
                false
            }
            (KeyCode::Right, _) => {
                self.primed = false;
                if self.cursor < self.value.len() {
                    self.cursor = next_boundary(&self.value, self.cursor);
                }
                false
            }
            (KeyCode::Home, _) => {
                self.primed = false;
                self.cursor = 0;
                false
            }
            (KeyCode::End, _) => {
                self.primed = false;
                self.cursor = self.value.len();
                false
            }
            // Ctrl-U clears the line.
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                let changed = !self.value.is_empty();
                self.clear();
                changed
            }
            _ => false,
        }
    }

    fn insert_char(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
        self.primed = false;
    }

    /// Render the input with a titled border.
    pub fn render(&self, frame: &mut Frame, area: Rect, title: &str, focused: bool) {
        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let display: &str = if self.value.is_empty() {
            &self.placeholder
        } else {
            &self.value
        };
        let text_style = if self.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else if self.primed {
            // Selected-for-overwrite text renders reversed.
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };

        let widget = Paragraph::new(display).style(text_style).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title.to_string()),
        );
        frame.render_widget(widget, area);

        if focused {
            let x = area.x + 1 + self.value[..self.cursor].chars().count() as u16;
            frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(2)), area.y + 1));
        }
    }
}

fn prev_boundary(s: &str, from: usize) -> usize {
    let mut i = from - 1;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn next_boundary(s: &str, from: usize) -> usize {
    let mut i = from + 1;
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
