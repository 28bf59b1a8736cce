use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tracing::debug;

use crate::session::Session;
use crate::tui::{
    events::Event,
    input::ChatInput,
    keys::KeyMap,
    styles::Theme,
    transcript::{ChatEntry, Transcript},
    Frame,
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// What the event loop should do after an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    /// Forward this message in the current session
    Send(String),
    NewSession,
}

/// State and rendering of the chat screen
pub struct ChatScreen {
    endpoint: String,
    session_id: String,
    transcript: Transcript,
    input: ChatInput,
    key_map: KeyMap,
    theme: Theme,
    show_help: bool,
    /// A request is in flight for the current session
    waiting: bool,
    spinner: usize,
    status_message: Option<String>,
}

impl ChatScreen {
    pub fn new(endpoint: String, session: &Session) -> Self {
        let mut screen = Self {
            endpoint,
            session_id: String::new(),
            transcript: Transcript::new(),
            input: ChatInput::new().with_placeholder("Type your message here...".to_string()),
            key_map: KeyMap::default(),
            theme: Theme::default(),
            show_help: false,
            waiting: false,
            spinner: 0,
            status_message: None,
        };
        screen.start_session(session);
        screen
    }

    #[cfg(test)]
    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    #[cfg(test)]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Reset the screen for a fresh session
    pub fn start_session(&mut self, session: &Session) {
        self.session_id = session.context_id().to_string();
        self.transcript.clear();
        self.transcript.push(ChatEntry::system(format!(
            "Session {} started at {}",
            session.context_id(),
            session.started_at().with_timezone(&Local).format("%H:%M:%S")
        )));
        self.waiting = false;
        self.status_message = None;
    }

    /// Handle incoming events
    pub fn handle_event(&mut self, event: Event) -> Action {
        match event {
            Event::Key(key_event) => self.handle_key_event(key_event),
            Event::Paste(text) => {
                self.input.insert_str(&text);
                Action::None
            }
            Event::Resize(_, _) => Action::None,
            Event::Tick => {
                if self.waiting {
                    self.spinner = (self.spinner + 1) % SPINNER.len();
                }
                Action::None
            }
            Event::Reply { session_id, reply } => {
                if session_id == self.session_id {
                    self.transcript.push(ChatEntry::reply(reply));
                    self.waiting = false;
                } else {
                    debug!("Dropping reply for previous session {}", session_id);
                }
                Action::None
            }
        }
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) -> Action {
        if key_event.kind != KeyEventKind::Press {
            return Action::None;
        }

        if self.key_map.should_quit(&key_event) {
            return Action::Quit;
        }

        if self.key_map.should_show_help(&key_event) {
            self.show_help = !self.show_help;
            return Action::None;
        }

        if self.show_help && key_event.code == KeyCode::Esc {
            self.show_help = false;
            return Action::None;
        }

        if self.key_map.should_start_session(&key_event) {
            return Action::NewSession;
        }

        if self.key_map.should_send(&key_event) {
            return self.submit();
        }

        match key_event.code {
            KeyCode::PageUp => self.transcript.page_up(),
            KeyCode::PageDown => self.transcript.page_down(),
            _ => {
                if self.input.handle_key_event(key_event) {
                    self.status_message = None;
                }
            }
        }
        Action::None
    }

    fn submit(&mut self) -> Action {
        if self.input.is_blank() {
            return Action::None;
        }
        if self.waiting {
            self.status_message = Some("Still waiting for the previous reply".to_string());
            return Action::None;
        }

        let message = self.input.take();
        self.transcript.push(ChatEntry::user(message.clone()));
        self.waiting = true;
        self.status_message = None;
        Action::Send(message)
    }

    /// Render the application UI
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.size();
        frame.render_widget(Block::default().style(self.theme.base_style()), area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),   // Header
                Constraint::Min(1),      // Messages
                Constraint::Length(3),   // Input
                Constraint::Length(1),   // Status bar
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.render_messages(frame, chunks[1]);
        self.render_input(frame, chunks[2]);
        self.render_status_bar(frame, chunks[3]);

        if self.show_help {
            self.render_help_overlay(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let header = format!(" chatrelay  {}  session {}", self.endpoint, self.session_id);
        frame.render_widget(Paragraph::new(header).style(self.theme.header_style()), area);
    }

    fn render_messages(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Messages")
            .border_style(self.theme.border_style());
        let inner = block.inner(area);

        let lines = self.transcript.visible_lines(
            inner.width as usize,
            inner.height as usize,
            &self.theme,
        );
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Message")
            .border_style(if self.waiting {
                self.theme.border_style()
            } else {
                self.theme.focused_border_style()
            });
        let inner = block.inner(area);

        let (text, column) = self.input.visible(inner.width as usize);
        let paragraph = if text.is_empty() {
            Paragraph::new(Span::styled(self.input.placeholder(), self.theme.placeholder_style()))
        } else {
            Paragraph::new(Span::styled(text, self.theme.text_style()))
        };

        frame.render_widget(paragraph.block(block), area);
        if !self.show_help && inner.width > 0 {
            frame.set_cursor(inner.x + column.min(inner.width - 1), inner.y);
        }
    }

    /// Render the status bar
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = if let Some(ref message) = self.status_message {
            (message.clone(), self.theme.waiting_style())
        } else if self.waiting {
            (
                format!("{} Waiting for reply...", SPINNER[self.spinner]),
                self.theme.waiting_style(),
            )
        } else {
            (
                "Enter to send | Ctrl+N new session | Ctrl+G help | Ctrl+C quit".to_string(),
                self.theme.status_bar_style(),
            )
        };

        frame.render_widget(Paragraph::new(text).style(style), area);
    }

    /// Render help overlay
    fn render_help_overlay(&self, frame: &mut Frame) {
        let help_area = centered_rect(60, 40, frame.size());

        let help_block = Block::default()
            .borders(Borders::ALL)
            .title("Help")
            .style(self.theme.help_style());

        let help_lines: Vec<Line> = self
            .key_map
            .help_text()
            .lines()
            .map(|line| Line::from(line.to_string()))
            .collect();
        let help_paragraph = Paragraph::new(help_lines)
            .block(help_block)
            .style(self.theme.text_style());

        frame.render_widget(Clear, help_area);
        frame.render_widget(help_paragraph, help_area);
    }
}

/// Create a centered rectangle with given percentage of the screen
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
