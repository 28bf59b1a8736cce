use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::relay::{parse_endpoint, DEFAULT_ENDPOINT};

/// Application configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the chat service
    pub endpoint: String,

    /// Forward the session id so the service keeps conversation context
    pub use_context: bool,
}

/// Partial configuration as read from a config file
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfigFile {
    pub endpoint: Option<String>,
    pub use_context: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            use_context: true,
        }
    }
}

impl Config {
    /// Initialize configuration from various sources
    pub async fn init() -> Result<Self> {
        debug!("Initializing configuration");

        let mut config = Self::default();

        // Load from environment variables
        config.load_from_env()?;

        // Configuration files override the environment
        if let Some(file_config) = Self::load_from_file(&Self::config_paths()).await? {
            config.merge_with(file_config);
        }

        Ok(config)
    }

    /// Candidate configuration files, in priority order
    pub fn config_paths() -> Vec<PathBuf> {
        let mut config_paths = vec![
            PathBuf::from("./.chatrelay.json"),
            PathBuf::from("./chatrelay.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            config_paths.push(config_dir.join("chatrelay").join("chatrelay.json"));
        }

        config_paths
    }

    /// Directory for log files written while the TUI owns the terminal
    pub fn log_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chatrelay")
    }

    /// Load configuration from environment variables
    pub fn load_from_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = var("CHATRELAY_ENDPOINT") {
            self.endpoint = endpoint;
        }

        if let Some(use_context) = var("CHATRELAY_USE_CONTEXT") {
            self.use_context = use_context.trim().to_lowercase().parse().map_err(|_| {
                anyhow!(
                    "Invalid CHATRELAY_USE_CONTEXT value '{}': expected true or false",
                    use_context
                )
            })?;
        }

        Ok(())
    }

    /// Load the first configuration file that exists
    pub async fn load_from_file(paths: &[PathBuf]) -> Result<Option<ConfigFile>> {
        for path in paths {
            if path.exists() {
                return Self::read_file(path).await.map(Some);
            }
        }

        Ok(None)
    }

    async fn read_file(path: &Path) -> Result<ConfigFile> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Merge a configuration file into this one
    pub fn merge_with(&mut self, other: ConfigFile) {
        if let Some(endpoint) = other.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(use_context) = other.use_context {
            self.use_context = use_context;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        parse_endpoint(&self.endpoint)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.endpoint, "http://localhost:8080");
        assert!(config.use_context);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_env() {
        let vars: HashMap<&str, &str> = [
            ("CHATRELAY_ENDPOINT", "http://chat.internal:9000"),
            ("CHATRELAY_USE_CONTEXT", "False"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.endpoint, "http://chat.internal:9000");
        assert!(!config.use_context);
    }

    #[test]
    fn test_apply_env_without_vars_keeps_defaults() {
        let mut config = Config::default();
        config.apply_env(|_| None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_apply_env_rejects_unknown_use_context() {
        for value in ["no", "0", ""] {
            let mut config = Config::default();
            let err = config
                .apply_env(|key| (key == "CHATRELAY_USE_CONTEXT").then(|| value.to_string()))
                .unwrap_err();
            assert!(err.to_string().contains("CHATRELAY_USE_CONTEXT"));
            assert!(config.use_context);
        }
    }

    #[test]
    fn test_merge_with_partial_file() {
        let mut config = Config::default();
        config.merge_with(ConfigFile {
            endpoint: None,
            use_context: Some(false),
        });

        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(!config.use_context);
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let config = Config {
            endpoint: "not a url".to_string(),
            use_context: true,
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_from_file_uses_first_existing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        std::fs::write(&first, r#"{"endpoint": "http://first:1"}"#).unwrap();
        std::fs::write(&second, r#"{"endpoint": "http://second:2", "use_context": false}"#).unwrap();

        let loaded = Config::load_from_file(&[missing, first, second])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.endpoint.as_deref(), Some("http://first:1"));
        assert_eq!(loaded.use_context, None);
    }

    #[tokio::test]
    async fn test_load_from_file_none_found() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from_file(&[dir.path().join("nope.json")]).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_from_file_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ endpoint: ").unwrap();

        let err = Config::load_from_file(&[path]).await.unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }
}
