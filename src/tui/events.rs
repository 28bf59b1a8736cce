use crossterm::event::{Event as CrosstermEvent, KeyEvent};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::relay::Reply;

/// Application events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Keyboard input event
    Key(KeyEvent),

    /// Bracketed paste
    Paste(String),

    /// Terminal resize event
    Resize(u16, u16),

    /// Periodic tick event
    Tick,

    /// A relayed reply arrived for the given session
    Reply { session_id: String, reply: Reply },
}

/// Event handler for managing input events
pub struct EventHandler {
    /// Event receiver channel
    receiver: mpsc::UnboundedReceiver<Event>,

    /// Event sender channel
    sender: mpsc::UnboundedSender<Event>,

    /// Tick interval for periodic events
    tick_interval: Duration,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let tick_interval = Duration::from_millis(100); // 10 FPS

        Self {
            receiver,
            sender,
            tick_interval,
        }
    }

    /// Get the next event
    pub async fn next(&mut self) -> Option<Event> {
        // Internal events first so replies are not held back by input
        if let Ok(event) = self.receiver.try_recv() {
            return Some(event);
        }

        let tick = self.tick_interval;
        let polled = tokio::task::spawn_blocking(move || -> std::io::Result<Option<CrosstermEvent>> {
            if crossterm::event::poll(tick)? {
                crossterm::event::read().map(Some)
            } else {
                Ok(None)
            }
        })
        .await;

        match polled {
            Ok(Ok(Some(event))) => Some(Self::convert_crossterm_event(event).unwrap_or(Event::Tick)),
            Ok(Ok(None)) => Some(Event::Tick),
            Ok(Err(e)) => {
                debug!("Failed to read terminal event: {}", e);
                Some(Event::Tick)
            }
            Err(_) => None,
        }
    }

    /// Convert crossterm events to application events
    fn convert_crossterm_event(event: CrosstermEvent) -> Option<Event> {
        match event {
            CrosstermEvent::Key(key_event) => Some(Event::Key(key_event)),
            CrosstermEvent::Paste(text) => Some(Event::Paste(text)),
            CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
            CrosstermEvent::Mouse(_) | CrosstermEvent::FocusGained | CrosstermEvent::FocusLost => None,
        }
    }

    /// Get a clone of the sender
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn test_convert_crossterm_event() {
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(
            EventHandler::convert_crossterm_event(CrosstermEvent::Key(key)),
            Some(Event::Key(key))
        );
        assert_eq!(
            EventHandler::convert_crossterm_event(CrosstermEvent::Paste("hi".into())),
            Some(Event::Paste("hi".into()))
        );
        assert_eq!(EventHandler::convert_crossterm_event(CrosstermEvent::FocusLost), None);
    }

    #[tokio::test]
    async fn test_internal_events_come_first() {
        let mut handler = EventHandler::new();
        handler
            .sender()
            .send(Event::Reply {
                session_id: "s".into(),
                reply: Reply::Answer("ok".into()),
            })
            .unwrap();

        assert_eq!(
            handler.next().await,
            Some(Event::Reply {
                session_id: "s".into(),
                reply: Reply::Answer("ok".into())
            })
        );
    }
}
