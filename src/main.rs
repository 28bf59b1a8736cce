use anyhow::Result;
use clap::Parser;
use std::sync::{Mutex, TryLockError};
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod cli;
mod config;
mod relay;
mod session;
mod tui;

use cli::Cli;
use config::Config;

/// Keeps the file writer alive; must be emptied before the process exits
static LOG_GUARD: Mutex<Option<WorkerGuard>> = Mutex::new(None);

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let uses_tui = cli.uses_tui();

    // Set up panic hook for graceful error recovery
    std::panic::set_hook(Box::new(move |panic_info| {
        if uses_tui {
            tui::reset_terminal();
        }
        error!("Application panicked: {}", panic_info);
        flush_logs(&LOG_GUARD);
        eprintln!("chatrelay panicked: {}", panic_info);
        std::process::exit(1);
    }));

    // Load environment variables from .env file
    let dotenv = dotenvy::dotenv();

    // Initialize logging/tracing
    match init_logging(uses_tui, cli.debug) {
        Ok(guard) => {
            if let Ok(mut slot) = LOG_GUARD.lock() {
                *slot = guard;
            }
        }
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = dotenv {
        // Don't error if .env file doesn't exist, just log it
        tracing::debug!("No .env file found or error loading it: {}", e);
    }

    // Execute CLI command
    if let Err(e) = cli.execute().await {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        flush_logs(&LOG_GUARD);
        std::process::exit(1);
    }

    flush_logs(&LOG_GUARD);
}

/// Drop the log guard so buffered lines reach the file. Never blocks: a
/// panic while the slot is held just loses the tail of the log.
fn flush_logs(slot: &Mutex<Option<WorkerGuard>>) {
    let guard = match slot.try_lock() {
        Ok(mut slot) => slot.take(),
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().take(),
        Err(TryLockError::WouldBlock) => None,
    };
    drop(guard);
}

/// Logs go to stderr, or to a file while the TUI owns the terminal
fn init_logging(uses_tui: bool, debug: bool) -> Result<Option<WorkerGuard>> {
    let default_filter = if debug { "chatrelay=debug" } else { "chatrelay=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if uses_tui {
        let log_dir = Config::log_dir();
        std::fs::create_dir_all(&log_dir)?;
        let file_appender = tracing_appender::rolling::never(&log_dir, "chatrelay.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false),
            )
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_logs_writes_buffered_lines() {
        let dir = tempfile::tempdir().unwrap();
        let appender = tracing_appender::rolling::never(dir.path(), "chatrelay.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let slot = Mutex::new(Some(guard));

        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        );
        tracing::subscriber::with_default(subscriber, || {
            error!("Application panicked: boom");
        });

        flush_logs(&slot);
        assert!(slot.lock().unwrap().is_none());

        let content = std::fs::read_to_string(dir.path().join("chatrelay.log")).unwrap();
        assert!(content.contains("Application panicked: boom"));

        // A second flush has nothing left to do
        flush_logs(&slot);
    }
}
