use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use tracing::{debug, info};

use super::run::RunCommand;
use crate::app::App;
use crate::config::Config;

/// chatrelay - chat with a context-aware HTTP service from your terminal
#[derive(Parser, Debug)]
#[command(
    name = "chatrelay",
    version,
    about = "Chat with a context-aware HTTP chat service from your terminal",
    long_about = r#"chatrelay forwards each message you type, together with a per-session
context id, to a chat service and shows the reply as-is.

Examples:
  chatrelay                                  # Start interactive mode
  chatrelay run "what is in the handbook?"   # Send a single message
  chatrelay --plain < questions.txt          # Line-by-line, no TUI
  chatrelay --endpoint http://host:8080      # Talk to another service"#
)]
pub struct Cli {
    /// Base URL of the chat service
    #[arg(short = 'e', long = "endpoint", global = true)]
    pub endpoint: Option<String>,

    /// Do not forward the session id; every message stands alone
    #[arg(long = "no-context", global = true)]
    pub no_context: bool,

    /// Read messages line by line from stdin instead of starting the TUI
    #[arg(long = "plain")]
    pub plain: bool,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a single message non-interactively
    Run(RunCommand),
}

impl Cli {
    /// Whether this invocation takes over the terminal
    pub fn uses_tui(&self) -> bool {
        self.command.is_none() && !self.plain && std::io::stdout().is_terminal()
    }

    /// Apply command-line overrides on top of file and environment configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if self.no_context {
            config.use_context = false;
        }
    }

    pub async fn execute(self) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        // Initialize configuration
        let mut config = Config::init().await?;
        self.apply_overrides(&mut config);
        config.validate()?;
        debug!("Configuration initialized: {:?}", config);

        let uses_tui = self.uses_tui();
        match self.command {
            Some(Commands::Run(run_cmd)) => run_cmd.execute(config).await,
            None => {
                let mut app = App::new(config)?;
                if uses_tui {
                    app.run_interactive().await?;
                } else {
                    app.run_plain().await?;
                }
                info!("Application finished");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from(["chatrelay", "run", "hello", "world"]).unwrap();
        match cli.command {
            Some(Commands::Run(ref run)) => assert_eq!(run.prompt, vec!["hello", "world"]),
            None => panic!("expected run command"),
        }
        assert!(!cli.uses_tui());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "chatrelay",
            "run",
            "--endpoint",
            "http://chat:9000",
            "--no-context",
            "-d",
            "hi",
        ])
        .unwrap();

        assert_eq!(cli.endpoint.as_deref(), Some("http://chat:9000"));
        assert!(cli.no_context);
        assert!(cli.debug);
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli::try_parse_from(["chatrelay", "--plain", "-e", "https://chat.example.com", "--no-context"]).unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.endpoint, "https://chat.example.com");
        assert!(!config.use_context);
        assert!(!cli.uses_tui());
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::try_parse_from(["chatrelay"]).unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config, Config::default());
    }
}
