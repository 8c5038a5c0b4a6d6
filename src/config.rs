//! Organizer configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then `ORGANIZER_*`
//! environment variables (a `.env` file is loaded into the environment at startup).

use crate::error::OrganizeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name under the config dir that holds `config.toml`
const CONFIG_DIR_NAME: &str = "file-organizer";

/// Configuration for an organize run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    /// Base URL of the Ollama server
    pub ollama_url: String,
    /// Model used for text completion
    pub text_model: String,
    /// Vision-capable model used for images and PDF figures
    pub vision_model: String,
    /// OpenAI-compatible transcription endpoint (faster-whisper, whisper.cpp server)
    pub transcription_url: String,
    pub transcription_model: String,
    /// Upper bound for a single inference call
    pub request_timeout_secs: u64,
    /// Retries on 429/5xx/transport errors
    pub max_retries: u32,
    /// Parallel per-file units of work
    pub max_workers: usize,
    /// Character budget for text excerpts sent to the model
    pub max_text_chars: usize,
    /// Embedded PDF images captioned per document
    pub max_pdf_images: usize,
    /// Longest edge of images sent to the vision model
    pub max_image_dimension: u32,
    /// Output folder created under the input root when no output dir is given
    pub output_folder_name: String,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            text_model: "llama3".to_string(),
            vision_model: "llava".to_string(),
            transcription_url: "http://localhost:8000/v1/audio/transcriptions".to_string(),
            transcription_model: "whisper-1".to_string(),
            request_timeout_secs: 120,
            max_retries: 3,
            max_workers: num_cpus::get().max(1),
            max_text_chars: 3000,
            max_pdf_images: 4,
            max_image_dimension: 1600,
            output_folder_name: "organized_folder".to_string(),
        }
    }
}

impl OrganizerConfig {
    /// Load configuration from an explicit file, the default location, and the environment
    pub fn load(explicit: Option<&Path>) -> Result<Self, OrganizeError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        tracing::debug!(
            ollama = %config.ollama_url,
            text_model = %config.text_model,
            vision_model = %config.vision_model,
            workers = config.max_workers,
            "[Config] Loaded"
        );

        Ok(config)
    }

    /// `<config_dir>/file-organizer/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self, OrganizeError> {
        let raw = std::fs::read_to_string(path).map_err(|source| OrganizeError::Io {
            context: "failed to read config",
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw)
            .map_err(|e| OrganizeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Override fields from `ORGANIZER_*` variables
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), OrganizeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ORGANIZER_OLLAMA_URL") {
            self.ollama_url = v;
        }
        if let Some(v) = lookup("ORGANIZER_TEXT_MODEL") {
            self.text_model = v;
        }
        if let Some(v) = lookup("ORGANIZER_VISION_MODEL") {
            self.vision_model = v;
        }
        if let Some(v) = lookup("ORGANIZER_TRANSCRIBE_URL") {
            self.transcription_url = v;
        }
        if let Some(v) = lookup("ORGANIZER_TRANSCRIBE_MODEL") {
            self.transcription_model = v;
        }
        if let Some(v) = lookup("ORGANIZER_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("ORGANIZER_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("ORGANIZER_WORKERS") {
            self.max_workers = parse_env("ORGANIZER_WORKERS", &v)?;
        }
        if let Some(v) = lookup("ORGANIZER_MAX_CHARS") {
            self.max_text_chars = parse_env("ORGANIZER_MAX_CHARS", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), OrganizeError> {
        if self.max_workers == 0 {
            return Err(OrganizeError::Config("max_workers must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(OrganizeError::Config("request_timeout_secs must be at least 1".into()));
        }
        if self.max_text_chars == 0 {
            return Err(OrganizeError::Config("max_text_chars must be at least 1".into()));
        }
        if self.ollama_url.trim().is_empty() {
            return Err(OrganizeError::Config("ollama_url is empty".into()));
        }
        if self.output_folder_name.trim().is_empty() {
            return Err(OrganizeError::Config("output_folder_name is empty".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, OrganizeError> {
    value
        .trim()
        .parse()
        .map_err(|_| OrganizeError::Config(format!("{} has an invalid value: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = OrganizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_text_chars, 3000);
        assert_eq!(config.output_folder_name, "organized_folder");
        assert!(config.max_workers >= 1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "text_model = \"mistral\"").unwrap();
        writeln!(file, "max_workers = 2").unwrap();

        let config = OrganizerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.text_model, "mistral");
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.vision_model, "llava");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ORGANIZER_VISION_MODEL", "llava:13b"),
            ("ORGANIZER_WORKERS", "3"),
        ]
        .into_iter()
        .collect();

        let mut config = OrganizerConfig::default();
        config
            .apply_env(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.vision_model, "llava:13b");
        assert_eq!(config.max_workers, 3);
    }

    #[test]
    fn test_invalid_env_value_is_config_error() {
        let mut config = OrganizerConfig::default();
        let result = config.apply_env(|k| (k == "ORGANIZER_TIMEOUT_SECS").then(|| "soon".into()));
        assert!(matches!(result, Err(OrganizeError::Config(_))));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = OrganizerConfig {
            max_workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
