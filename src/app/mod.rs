//! Core application logic and orchestration
//!
//! This module provides the main application structure that ties the
//! configuration, the current session and the relay together.

mod events;

pub use events::*;

use anyhow::{Context, Result};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    config::Config,
    relay::{Relay, RelayClient, Reply},
    session::Session,
    tui,
};

/// Main application structure
pub struct App {
    config: Config,
    relay: Relay,
    session: Session,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<AppEvent>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    event_loop: Option<JoinHandle<()>>,
}

/// One message exchange, detached from [`App`] so it can run on its own task
#[derive(Debug, Clone)]
pub struct Turn {
    relay: Relay,
    session: Session,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl Turn {
    /// Forward `message` and return the reply to display
    pub async fn run(self, message: String) -> Reply {
        let session_id = self.session.context_id().to_string();

        let _ = self.event_tx.send(AppEvent::MessageSent {
            session_id: session_id.clone(),
            chars: message.chars().count(),
        });

        let reply = self.relay.handle_message(&self.session, &message).await;

        let event = match &reply {
            Reply::Failed(error) => AppEvent::RelayFailed {
                session_id,
                error: error.clone(),
            },
            Reply::Answer(body) => AppEvent::ReplyReceived {
                session_id,
                bytes: body.len(),
            },
        };
        let _ = self.event_tx.send(event);

        reply
    }
}

impl App {
    /// Create a new application instance with a fresh session
    pub fn new(config: Config) -> Result<Self> {
        debug!("Creating new App instance");

        config.validate()?;

        let client = RelayClient::new(&config.endpoint)
            .with_context(|| format!("Failed to create client for {}", config.endpoint))?;
        info!(
            "Relaying to {} (timeout {:?}, context {})",
            client.endpoint(),
            client.timeout(),
            if config.use_context { "on" } else { "off" }
        );
        let relay = Relay::new(client, config.use_context);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let session = Session::new();
        let _ = event_tx.send(AppEvent::SessionStarted {
            session_id: session.context_id().to_string(),
        });

        Ok(App {
            config,
            relay,
            session,
            event_tx,
            event_rx: Some(event_rx),
            shutdown_tx: None,
            event_loop: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the current session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Replace the current session with a fresh one
    pub fn new_session(&mut self) -> &Session {
        self.session = Session::new();
        let _ = self.event_tx.send(AppEvent::SessionStarted {
            session_id: self.session.context_id().to_string(),
        });
        &self.session
    }

    /// Prepare an exchange bound to the current session
    pub fn turn(&self) -> Turn {
        Turn {
            relay: self.relay.clone(),
            session: self.session.clone(),
            event_tx: self.event_tx.clone(),
        }
    }

    /// Forward a message within the current session
    pub async fn send(&self, message: &str) -> Reply {
        self.turn().run(message.to_string()).await
    }

    /// Start the application event loop
    pub fn start_event_loop(&mut self) -> Result<()> {
        let mut event_rx = self
            .event_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("Event loop already started"))?;

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        self.shutdown_tx = Some(shutdown_tx);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    Some(event) = event_rx.recv() => Self::handle_event(event),
                    _ = shutdown_rx.recv() => {
                        // Events queued before shutdown still get logged
                        while let Ok(event) = event_rx.try_recv() {
                            Self::handle_event(event);
                        }
                        info!("Shutting down event loop");
                        break;
                    }
                }
            }
        });
        self.event_loop = Some(handle);

        Ok(())
    }

    /// Handle application events
    fn handle_event(event: AppEvent) {
        match event {
            AppEvent::SessionStarted { session_id } => {
                info!("Session started: {}", session_id);
            }
            AppEvent::MessageSent { session_id, chars } => {
                debug!("Message sent in session {} ({} chars)", session_id, chars);
            }
            AppEvent::ReplyReceived { session_id, bytes } => {
                debug!("Reply received in session {} ({} bytes)", session_id, bytes);
            }
            AppEvent::RelayFailed { session_id, error } => {
                error!("Exchange failed in session {}: {}", session_id, error);
            }
            AppEvent::Shutdown => {
                info!("Application shutdown requested");
            }
        }
    }

    /// Run the application in interactive mode (TUI)
    pub async fn run_interactive(&mut self) -> Result<()> {
        info!("Starting interactive mode");

        self.start_event_loop()?;
        let result = tui::run(self).await;
        self.shutdown().await?;

        result
    }

    /// Run a line-oriented chat over stdin and stdout
    pub async fn run_plain(&mut self) -> Result<()> {
        info!("Starting plain mode");

        self.start_event_loop()?;
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let interrupted = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        let result = self.chat_lines(stdin, tokio::io::stdout(), interrupted).await;
        self.shutdown().await?;

        result
    }

    /// Chat loop over any line source: one message per non-empty line,
    /// `/new` starts a new session, `/quit`, end of input or `stop`
    /// resolving ends it. Lines are sent as typed.
    pub async fn chat_lines<R, W, S>(&mut self, input: R, mut output: W, stop: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        tokio::pin!(stop);
        let mut lines = input.lines();

        let banner = format!(
            "Session {} ({}{}). /new starts a new session, /quit exits.\n",
            self.session.context_id(),
            self.relay.client().endpoint(),
            if self.relay.uses_context() { "" } else { ", no context" }
        );
        output.write_all(banner.as_bytes()).await?;
        output.flush().await?;

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line.context("Failed to read input")?,
                _ = &mut stop => {
                    info!("Interrupted, leaving plain mode");
                    None
                }
            };

            let Some(line) = line else {
                break;
            };

            match line.trim() {
                "" => continue,
                "/quit" | "/exit" => break,
                "/new" => {
                    let session_id = self.new_session().context_id().to_string();
                    output
                        .write_all(format!("New session {}\n", session_id).as_bytes())
                        .await?;
                }
                _ => {
                    let reply = tokio::select! {
                        reply = self.send(&line) => reply.into_text(),
                        _ = &mut stop => {
                            info!("Interrupted while waiting for a reply");
                            break;
                        }
                    };
                    output.write_all(reply.as_bytes()).await?;
                    if !reply.ends_with('\n') {
                        output.write_all(b"\n").await?;
                    }
                }
            }
            output.flush().await?;
        }

        Ok(())
    }

    /// Run a single prompt non-interactively
    pub async fn run_non_interactive(&mut self, prompt: &str) -> Result<String> {
        info!("Running non-interactive prompt");

        self.start_event_loop()?;
        let reply = self.send(prompt).await;
        self.shutdown().await?;

        Ok(reply.into_text())
    }

    /// Shutdown the application gracefully
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down application");

        let _ = self.event_tx.send(AppEvent::Shutdown);
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            if shutdown_tx.send(()).await.is_err() {
                warn!("Event loop already stopped");
            }
        }
        if let Some(handle) = self.event_loop.take() {
            handle.await.context("Event loop task failed")?;
        }

        Ok(())
    }
}
