use anyhow::{anyhow, Result};
use clap::Args;
use std::io::{self, Read};
use tracing::{debug, info};

use crate::app::App;
use crate::config::Config;

/// Send a single message non-interactively
#[derive(Args, Debug)]
pub struct RunCommand {
    /// The message to send. If not provided, will read from stdin
    pub prompt: Vec<String>,
}

impl RunCommand {
    pub async fn execute(&self, config: Config) -> Result<()> {
        debug!("Executing run command");

        // Get the prompt either from arguments or stdin
        let prompt = self.get_prompt()?;

        if prompt.trim().is_empty() {
            return Err(anyhow!("No message provided. Use arguments or pipe input via stdin."));
        }

        info!("Sending one message to {}", config.endpoint);

        let mut app = App::new(config)?;
        let reply = app.run_non_interactive(&prompt).await?;

        println!("{}", reply);

        Ok(())
    }

    fn get_prompt(&self) -> Result<String> {
        if !self.prompt.is_empty() {
            // Join all arguments into a single prompt
            Ok(self.prompt.join(" "))
        } else {
            debug!("Reading prompt from stdin");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| anyhow!("Failed to read from stdin: {}", e))?;
            Ok(strip_line_ending(buffer))
        }
    }
}

/// Drop the single line ending a pipe or `echo` adds; keep everything else
fn strip_line_ending(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_from_arguments() {
        let cmd = RunCommand {
            prompt: vec!["hello".to_string(), "world".to_string()],
        };
        assert_eq!(cmd.get_prompt().unwrap(), "hello world");
    }

    #[test]
    fn test_stdin_prompt_keeps_its_spacing() {
        assert_eq!(strip_line_ending("  hi there \n".to_string()), "  hi there ");
        assert_eq!(strip_line_ending("line one\nline two\r\n".to_string()), "line one\nline two");
        assert_eq!(strip_line_ending("no newline ".to_string()), "no newline ");
        assert_eq!(strip_line_ending("two\n\n".to_string()), "two\n");
    }

    #[tokio::test]
    async fn test_blank_prompt_is_rejected() {
        let cmd = RunCommand {
            prompt: vec!["  ".to_string()],
        };
        let err = cmd.execute(Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("No message provided"));
    }
}
