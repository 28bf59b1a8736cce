use ratatui::style::{Color, Modifier, Style};

/// Application theme configuration
#[derive(Debug, Clone)]
pub struct Theme {
    /// Primary colors
    pub primary: Color,
    pub secondary: Color,

    /// Text colors
    pub text: Color,
    pub text_dim: Color,

    /// Background colors
    pub background: Color,
    pub background_alt: Color,

    /// Border colors
    pub border: Color,
    pub border_focused: Color,

    /// Status colors
    pub warning: Color,
    pub error: Color,

    /// Special colors
    pub placeholder: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Create a dark theme
    pub fn dark() -> Self {
        Self {
            primary: Color::Rgb(147, 51, 234),    // Purple
            secondary: Color::Rgb(59, 130, 246),  // Blue

            text: Color::Rgb(248, 250, 252),      // Slate-50
            text_dim: Color::Rgb(148, 163, 184),  // Slate-400

            background: Color::Rgb(15, 23, 42),   // Slate-900
            background_alt: Color::Rgb(30, 41, 59), // Slate-800

            border: Color::Rgb(71, 85, 105),      // Slate-600
            border_focused: Color::Rgb(147, 51, 234), // Purple

            warning: Color::Rgb(245, 158, 11),    // Amber-500
            error: Color::Rgb(239, 68, 68),       // Red-500

            placeholder: Color::Rgb(100, 116, 139), // Slate-500
        }
    }

    /// Base style for normal elements
    pub fn base_style(&self) -> Style {
        Style::default()
            .fg(self.text)
            .bg(self.background)
    }

    /// Style for text content
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    /// Style for borders
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Style for focused borders
    pub fn focused_border_style(&self) -> Style {
        Style::default()
            .fg(self.border_focused)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for the header line
    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.text)
            .bg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for the status bar
    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.text)
            .bg(self.background_alt)
    }

    /// Status bar while a reply is pending
    pub fn waiting_style(&self) -> Style {
        Style::default()
            .fg(self.warning)
            .bg(self.background_alt)
    }

    /// Style for help text
    pub fn help_style(&self) -> Style {
        Style::default()
            .fg(self.text)
            .bg(self.background)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for placeholder text
    pub fn placeholder_style(&self) -> Style {
        Style::default()
            .fg(self.placeholder)
            .add_modifier(Modifier::ITALIC)
    }

    /// Label above the user's messages
    pub fn user_label_style(&self) -> Style {
        Style::default()
            .fg(self.secondary)
            .add_modifier(Modifier::BOLD)
    }

    /// Label above the service's replies
    pub fn assistant_label_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.text_dim)
            .add_modifier(Modifier::ITALIC)
    }
}
