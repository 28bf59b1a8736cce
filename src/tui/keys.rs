use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key binding configuration
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub label: &'static str,
    pub description: &'static str,
}

impl KeyBinding {
    pub fn new(key: KeyCode, modifiers: KeyModifiers, label: &'static str, description: &'static str) -> Self {
        Self {
            key,
            modifiers,
            label,
            description,
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.key == event.code && self.modifiers == event.modifiers
    }
}

/// Application key mappings
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Quit application
    pub quit: KeyBinding,

    /// Show help
    pub help: KeyBinding,

    /// Start a new session
    pub new_session: KeyBinding,

    /// Send the typed message
    pub send: KeyBinding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            quit: KeyBinding::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL,
                "Ctrl+C",
                "Quit application",
            ),
            help: KeyBinding::new(
                KeyCode::Char('g'),
                KeyModifiers::CONTROL,
                "Ctrl+G",
                "Show/hide help",
            ),
            new_session: KeyBinding::new(
                KeyCode::Char('n'),
                KeyModifiers::CONTROL,
                "Ctrl+N",
                "Start a new session",
            ),
            send: KeyBinding::new(
                KeyCode::Enter,
                KeyModifiers::NONE,
                "Enter",
                "Send message",
            ),
        }
    }
}

impl KeyMap {
    /// Check if the event should quit the application
    pub fn should_quit(&self, event: &KeyEvent) -> bool {
        self.quit.matches(event)
    }

    /// Check if the event should show help
    pub fn should_show_help(&self, event: &KeyEvent) -> bool {
        self.help.matches(event)
    }

    pub fn should_start_session(&self, event: &KeyEvent) -> bool {
        self.new_session.matches(event)
    }

    pub fn should_send(&self, event: &KeyEvent) -> bool {
        self.send.matches(event)
    }

    /// Get help text for all key bindings
    pub fn help_text(&self) -> String {
        [&self.send, &self.new_session, &self.help, &self.quit]
            .iter()
            .map(|binding| format!("{:<8} {}", binding.label, binding.description))
            .chain(std::iter::once(format!("{:<8} {}", "PgUp/Dn", "Scroll messages")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let keys = KeyMap::default();
        assert!(keys.should_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!keys.should_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(keys.should_start_session(&KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL)));
        assert!(keys.should_send(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
    }

    #[test]
    fn test_help_text_lists_bindings() {
        let help = KeyMap::default().help_text();
        assert!(help.contains("Ctrl+N"));
        assert!(help.contains("Quit application"));
        assert_eq!(help.lines().count(), 5);
    }
}
