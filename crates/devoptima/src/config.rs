//! Configuration file support for devoptima.
//!
//! Loads `devoptima.toml` from the working directory, falling back to the
//! user configuration directory. Command-line flags override both.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use devoptima_agent::{ClientConfig, SupportedModel};
use devoptima_core::DEFAULT_MAX_ATTEMPTS;

/// The config file name
pub const CONFIG_FILE_NAME: &str = "devoptima.toml";

/// Settings read from `devoptima.toml`
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Completion model identifier
    pub model: Option<String>,
    /// Generation calls per correction run
    pub max_attempts: Option<u32>,
    /// Chat completions endpoint
    pub api_url: Option<String>,
    /// Base delay between transport retries
    pub retry_base_delay_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        Self::load_file(&working_dir.join(CONFIG_FILE_NAME))
    }

    /// Load from the working directory, then from `user_dir/devoptima/`
    pub fn discover(working_dir: &Path, user_dir: Option<&Path>) -> Result<Option<Self>> {
        if let Some(config) = Self::load(working_dir)? {
            return Ok(Some(config));
        }
        match user_dir {
            Some(dir) => Self::load_file(&dir.join("devoptima").join(CONFIG_FILE_NAME)),
            None => Ok(None),
        }
    }

    fn load_file(config_path: &Path) -> Result<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// User-level config directory (e.g., `~/.config`)
    pub fn user_dir() -> Option<PathBuf> {
        dirs::config_dir()
    }
}

/// Effective settings after applying flags over the config file over defaults
#[derive(Debug, Clone)]
pub struct Settings {
    pub model: SupportedModel,
    pub max_attempts: u32,
    pub client: ClientConfig,
}

impl Settings {
    pub fn resolve(
        cli_model: Option<&str>,
        cli_max_attempts: Option<u32>,
        config: &ProjectConfig,
    ) -> Result<Self> {
        let model = match cli_model.or(config.model.as_deref()) {
            Some(name) => name.parse::<SupportedModel>()?,
            None => SupportedModel::default(),
        };

        let max_attempts = cli_max_attempts
            .or(config.max_attempts)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            bail!("max_attempts must be at least 1");
        }

        let mut client = ClientConfig::default();
        if let Some(ref url) = config.api_url {
            client = client.with_api_url(url.clone());
        }
        if let Some(ms) = config.retry_base_delay_ms {
            client = client.with_retry_base_delay(Duration::from_millis(ms));
        }
        if let Some(secs) = config.request_timeout_secs {
            client = client.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            model,
            max_attempts,
            client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) {
        std::fs::write(dir.join(CONFIG_FILE_NAME), content).unwrap();
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(ProjectConfig::load(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_full_config() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            r#"
model = "llama-3.1-8b-instant"
max_attempts = 5
api_url = "http://localhost:9999/v1/chat/completions"
retry_base_delay_ms = 10
request_timeout_secs = 5
"#,
        );

        let config = ProjectConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(config.model.as_deref(), Some("llama-3.1-8b-instant"));
        assert_eq!(config.max_attempts, Some(5));

        let settings = Settings::resolve(None, None, &config).unwrap();
        assert_eq!(settings.model, SupportedModel::Llama31Instant);
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(
            settings.client.api_url,
            "http://localhost:9999/v1/chat/completions"
        );
        assert_eq!(settings.client.retry_base_delay, Duration::from_millis(10));
        assert_eq!(settings.client.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), "temperature = 0.9\n");
        assert!(ProjectConfig::load(dir.path()).is_err());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), "model = [\n");
        let err = ProjectConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_user_dir_fallback() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        std::fs::create_dir_all(user.path().join("devoptima")).unwrap();
        std::fs::write(
            user.path().join("devoptima").join(CONFIG_FILE_NAME),
            "max_attempts = 2\n",
        )
        .unwrap();

        let config = ProjectConfig::discover(project.path(), Some(user.path()))
            .unwrap()
            .unwrap();
        assert_eq!(config.max_attempts, Some(2));

        // The working directory wins when both exist
        write_config(project.path(), "max_attempts = 4\n");
        let config = ProjectConfig::discover(project.path(), Some(user.path()))
            .unwrap()
            .unwrap();
        assert_eq!(config.max_attempts, Some(4));
    }

    #[test]
    fn test_flags_override_file() {
        let config = ProjectConfig {
            model: Some("llama-3.1-8b-instant".into()),
            max_attempts: Some(5),
            ..Default::default()
        };
        let settings =
            Settings::resolve(Some("llama-3.3-70b-versatile"), Some(2), &config).unwrap();
        assert_eq!(settings.model, SupportedModel::Llama33Versatile);
        assert_eq!(settings.max_attempts, 2);
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(None, None, &ProjectConfig::default()).unwrap();
        assert_eq!(settings.model, SupportedModel::default());
        assert_eq!(settings.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(settings.client.api_url, ClientConfig::DEFAULT_API_URL);
    }

    #[test]
    fn test_rejects_unsupported_model_and_zero_budget() {
        let config = ProjectConfig::default();
        let err = Settings::resolve(Some("gpt-4"), None, &config).unwrap_err();
        assert!(err.to_string().contains("gpt-4"));
        assert!(Settings::resolve(None, Some(0), &config).is_err());
    }
}
