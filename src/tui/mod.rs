//! Terminal User Interface module using ratatui

mod app;
mod events;
mod input;
mod keys;
mod styles;
mod transcript;

pub use app::{Action, ChatScreen};
pub use events::{Event, EventHandler};

use anyhow::Result;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use tracing::{debug, info};

use crate::app::App;

pub type Backend = CrosstermBackend<io::Stdout>;
pub type Frame<'a> = ratatui::Frame<'a>;

/// Initialize the terminal for TUI mode
pub fn init_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableBracketedPaste) {
        let _ = disable_raw_mode();
        return Err(e.into());
    }
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Best-effort restore when no terminal handle is at hand, e.g. from a panic hook
pub fn reset_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste);
}

/// Main TUI entry point
pub async fn run(app: &mut App) -> Result<()> {
    let mut terminal = init_terminal()?;
    let mut screen = ChatScreen::new(app.config().endpoint.clone(), app.session());
    let mut event_handler = EventHandler::new();

    let result = run_app(&mut terminal, app, &mut screen, &mut event_handler).await;

    restore_terminal(&mut terminal)?;
    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Terminal<Backend>,
    app: &mut App,
    screen: &mut ChatScreen,
    event_handler: &mut EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| screen.render(frame))?;

        let Some(event) = event_handler.next().await else {
            break;
        };

        match screen.handle_event(event) {
            Action::None => {}
            Action::Quit => {
                info!("Quit requested");
                break;
            }
            Action::Send(message) => {
                let turn = app.turn();
                let session_id = app.session().context_id().to_string();
                let sender = event_handler.sender();

                tokio::spawn(async move {
                    let reply = turn.run(message).await;
                    if sender.send(Event::Reply { session_id, reply }).is_err() {
                        debug!("Reply arrived after the UI closed");
                    }
                });
            }
            Action::NewSession => {
                let session = app.new_session();
                screen.start_session(session);
            }
        }
    }
    Ok(())
}
