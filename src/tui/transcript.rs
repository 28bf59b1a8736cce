//! Scrollable list of chat entries

use chrono::{DateTime, Local};
use ratatui::text::{Line, Span};

use crate::relay::Reply;
use crate::tui::styles::Theme;

/// Who an entry comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRole {
    User,
    Assistant,
    Error,
    System,
}

impl EntryRole {
    pub fn label(&self) -> &'static str {
        match self {
            EntryRole::User => "You",
            EntryRole::Assistant => "Assistant",
            EntryRole::Error => "Error",
            EntryRole::System => "System",
        }
    }
}

/// A chat entry
#[derive(Debug, Clone)]
pub struct ChatEntry {
    pub role: EntryRole,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl ChatEntry {
    pub fn new(role: EntryRole, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: Local::now(),
        }
    }

    pub fn user(content: String) -> Self {
        Self::new(EntryRole::User, content)
    }

    /// A relayed reply; failed exchanges become error entries
    pub fn reply(reply: Reply) -> Self {
        match reply {
            Reply::Answer(content) => Self::new(EntryRole::Assistant, content),
            Reply::Failed(content) => Self::new(EntryRole::Error, content),
        }
    }

    pub fn system(content: String) -> Self {
        Self::new(EntryRole::System, content)
    }
}

/// Transcript of the current session
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<ChatEntry>,
    /// Lines scrolled up from the bottom
    scroll: usize,
    /// Height of the last rendered viewport
    viewport: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Append an entry and jump back to the bottom
    pub fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
        self.scroll = 0;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.scroll = 0;
    }

    #[cfg(test)]
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn page_up(&mut self) {
        self.scroll += self.viewport.max(1);
    }

    pub fn page_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(self.viewport.max(1));
    }

    /// All entries laid out for a given width
    pub fn lines(&self, width: usize, theme: &Theme) -> Vec<Line<'static>> {
        let width = width.max(1);
        let mut lines = Vec::new();

        for entry in &self.entries {
            let label_style = match entry.role {
                EntryRole::User => theme.user_label_style(),
                EntryRole::Assistant => theme.assistant_label_style(),
                EntryRole::Error => theme.error_style(),
                EntryRole::System => theme.system_style(),
            };
            let body_style = match entry.role {
                EntryRole::Error => theme.error_style(),
                EntryRole::System => theme.system_style(),
                EntryRole::User | EntryRole::Assistant => theme.text_style(),
            };

            lines.push(Line::from(vec![
                Span::styled(entry.role.label(), label_style),
                Span::styled(
                    format!(" {}", entry.timestamp.format("%H:%M")),
                    theme.placeholder_style(),
                ),
            ]));
            for wrapped in textwrap::wrap(&entry.content, width) {
                lines.push(Line::styled(wrapped.into_owned(), body_style));
            }
            lines.push(Line::default());
        }

        lines
    }

    /// The slice of lines that fits in `height` rows at the current scroll.
    /// Clamps the scroll offset to the available history.
    pub fn visible_lines(&mut self, width: usize, height: usize, theme: &Theme) -> Vec<Line<'static>> {
        self.viewport = height;

        let lines = self.lines(width, theme);
        let max_scroll = lines.len().saturating_sub(height);
        self.scroll = self.scroll.min(max_scroll);

        let end = lines.len() - self.scroll;
        let start = end.saturating_sub(height);
        lines[start..end].to_vec()
    }
}
