//! Single-line message editor

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use unicode_width::UnicodeWidthStr;

/// Chat input with a cursor
#[derive(Debug, Default)]
pub struct ChatInput {
    content: String,
    /// Cursor position in chars
    cursor: usize,
    placeholder: String,
}

impl ChatInput {
    pub fn new() -> Self {
        Self {
            placeholder: "Type your message...".to_string(),
            ..Self::default()
        }
    }

    pub fn with_placeholder(mut self, placeholder: String) -> Self {
        self.placeholder = placeholder;
        self
    }

    #[cfg(test)]
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Take the content out, leaving the input empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.content
            .char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    /// Insert pasted text; line breaks become spaces
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\r' => {}
                '\n' | '\t' => self.insert_char(' '),
                c => self.insert_char(c),
            }
        }
    }

    /// Handle an editing key. Returns whether the key was consumed.
    pub fn handle_key_event(&mut self, event: KeyEvent) -> bool {
        match event.code {
            KeyCode::Char(c) if !event.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                self.insert_char(c);
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.content.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.char_count() {
                    let at = self.byte_index(self.cursor);
                    self.content.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.char_count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.char_count(),
            _ => return false,
        }
        true
    }

    /// Text to show in a box `width` columns wide, scrolled so the cursor
    /// stays visible, and the cursor column within it.
    pub fn visible(&self, width: usize) -> (&str, u16) {
        if width == 0 {
            return ("", 0);
        }

        let cursor_at = self.byte_index(self.cursor);
        let mut start = 0;
        while self.content[start..cursor_at].width() >= width {
            start += self.content[start..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(0);
        }

        let column = self.content[start..cursor_at].width() as u16;
        (&self.content[start..], column)
    }
}
