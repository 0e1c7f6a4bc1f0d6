use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://todo.hillel.it";
pub const DEFAULT_IDENTITY: &str = "todo-client";

const APP_DIR: &str = "todo-client";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    /// Sent verbatim as the login payload
    pub identity: String,
    pub timeout: Option<Duration>,
    /// Undo optimistic view changes whose request failed
    pub rollback_on_failure: bool,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            identity: DEFAULT_IDENTITY.to_string(),
            timeout: None,
            rollback_on_failure: false,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<String>,
    identity: Option<String>,
    timeout_secs: Option<u64>,
    rollback_on_failure: Option<bool>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
}

impl Config {
    /// Defaults, then the config file, then `TODO_*` environment variables.
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };
        if let Some(file) = file {
            config.apply_file(&file)?;
        }

        if let Ok(base_url) = std::env::var("TODO_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(identity) = std::env::var("TODO_IDENTITY") {
            config.identity = identity;
        }

        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let file: ConfigFile = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if let Some(identity) = file.identity {
            self.identity = identity;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(rollback) = file.rollback_on_failure {
            self.rollback_on_failure = rollback;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if file.log_file.is_some() {
            self.log_file = file.log_file;
        }
        Ok(())
    }

    pub fn with_overrides(mut self, base_url: Option<String>, identity: Option<String>) -> Self {
        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        if let Some(identity) = identity {
            self.identity = identity;
        }
        self
    }

    /// Where the terminal front-end writes its log
    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("todo.log")
        })
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn given_no_overrides_when_defaulting_then_uses_remote_defaults() {
        let config = Config::default();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, None);
        assert!(!config.rollback_on_failure);
    }

    #[test]
    fn given_config_file_when_applying_then_overrides_set_fields_only() {
        // Arrange
        let file = write_config(
            "base_url = \"http://localhost:9000\"\ntimeout_secs = 5\nrollback_on_failure = true\n",
        );
        let mut config = Config::default();

        // Act
        config.apply_file(file.path()).expect("config should apply");

        // Assert
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert!(config.rollback_on_failure);
        assert_eq!(config.identity, DEFAULT_IDENTITY);
    }

    #[test]
    fn given_unknown_key_when_applying_then_returns_error_naming_file() {
        let file = write_config("colour = \"blue\"\n");
        let mut config = Config::default();

        let err = config.apply_file(file.path()).expect_err("unknown key must fail");

        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn given_cli_flags_when_overriding_then_flags_win() {
        let config = Config::default()
            .with_overrides(Some("http://127.0.0.1:1".to_string()), None);

        assert_eq!(config.base_url, "http://127.0.0.1:1");
        assert_eq!(config.identity, DEFAULT_IDENTITY);
    }

    #[test]
    fn given_explicit_missing_path_when_loading_then_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent.toml");

        let result = Config::load(Some(missing.as_path()));

        assert!(result.is_err());
    }
}
