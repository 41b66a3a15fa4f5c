//! Session configuration.
//!
//! Values come from, in increasing priority: built-in defaults, the JSON file at
//! `~/.sqlchat/config.json` (or an explicit path), `SQLCHAT_*` environment
//! variables, and finally CLI flags applied by the binary. API keys are only
//! ever read from the environment.

use crate::store::ExecutionLimits;
use crate::types::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default chat model (Groq-hosted).
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model identifier; also selects the provider
    pub model: String,
    /// Sampling temperature (0 for deterministic queries)
    pub temperature: f32,
    /// Row limit suggested to the model when the question gives none
    pub top_k: usize,
    /// Hard cap on rows collected from one query
    pub max_rows: usize,
    /// Characters kept per result cell
    pub max_cell_chars: usize,
    /// Sample rows per table in the schema description
    pub sample_rows: usize,
    /// Reject synthesized statements that modify the database
    pub read_only: bool,
    /// Override of the chat-completions endpoint URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            top_k: 5,
            max_rows: 100,
            max_cell_chars: 300,
            sample_rows: 3,
            read_only: true,
            base_url: None,
        }
    }
}

impl Config {
    /// Default config directory (`~/.sqlchat/`).
    pub fn config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| ChatError::config("HOME not set"))?;
        Ok(PathBuf::from(home).join(".sqlchat"))
    }

    /// Default config file path (`~/.sqlchat/config.json`).
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load from `path` (or the default file), then apply environment overrides.
    ///
    /// A missing file is not an error; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file()?,
        };

        let mut config = Self::from_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file, falling back to defaults if it does not exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ChatError::config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Apply `SQLCHAT_*` overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("SQLCHAT_MODEL") {
            self.model = model;
        }
        if let Some(v) = lookup("SQLCHAT_TOP_K") {
            self.top_k = parse_env("SQLCHAT_TOP_K", &v)?;
        }
        if let Some(v) = lookup("SQLCHAT_MAX_ROWS") {
            self.max_rows = parse_env("SQLCHAT_MAX_ROWS", &v)?;
        }
        if let Some(v) = lookup("SQLCHAT_READ_ONLY") {
            self.read_only = parse_bool("SQLCHAT_READ_ONLY", &v)?;
        }
        if let Some(url) = lookup("SQLCHAT_BASE_URL") {
            self.base_url = Some(url);
        }
        Ok(())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ChatError::config("model must not be empty"));
        }
        if self.top_k == 0 {
            return Err(ChatError::config("top_k must be at least 1"));
        }
        if self.max_rows == 0 {
            return Err(ChatError::config("max_rows must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ChatError::config(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        Ok(())
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Limits handed to the executor.
    pub fn execution_limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            max_rows: self.max_rows,
            max_cell_chars: self.max_cell_chars,
            read_only: self.read_only,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ChatError::config(format!("{} has invalid value '{}'", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ChatError::config(format!("{} has invalid value '{}'", key, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.top_k, 5);
        assert!(config.read_only);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::from_file(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"top_k": 10, "read_only": false}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.top_k, 10);
        assert!(!config.read_only);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::from_file(&path), Err(ChatError::Config(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            model: "gpt-4o-mini".to_string(),
            max_rows: 20,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("SQLCHAT_MODEL", "gpt-4o"),
                ("SQLCHAT_TOP_K", "8"),
                ("SQLCHAT_READ_ONLY", "off"),
            ]))
            .unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.top_k, 8);
        assert!(!config.read_only);
    }

    #[test]
    fn test_env_invalid_number() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[("SQLCHAT_TOP_K", "many")])).unwrap_err();
        assert!(err.to_string().contains("SQLCHAT_TOP_K"));
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let config = Config {
            top_k: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
