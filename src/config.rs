//! Configuration types for Tapedeck

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Result, TapedeckError};

/// Environment variable selecting the interception mode
pub const MODE_ENV_VAR: &str = "TAPEDECK_MODE";

/// Operating mode, fixed for the life of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Passthrough: forward traffic untouched, capture nothing
    #[default]
    None,
    /// Record mode: forward traffic and capture every exchange
    Record,
    /// Playback mode: serve responses from a persisted session
    Playback,
}

impl Mode {
    /// Read the mode from `TAPEDECK_MODE`; absent or empty means `None`
    ///
    /// # Errors
    ///
    /// Returns error if the variable holds an unknown mode name
    pub fn from_env() -> Result<Self> {
        match std::env::var(MODE_ENV_VAR) {
            Ok(value) => Self::parse(&value),
            Err(std::env::VarError::NotPresent) => Ok(Self::None),
            Err(e) => Err(TapedeckError::Config(format!("{MODE_ENV_VAR}: {e}"))),
        }
    }

    /// Parse a mode name, case-insensitively
    ///
    /// # Errors
    ///
    /// Returns error on an unknown mode name
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "record" => Ok(Self::Record),
            "playback" => Ok(Self::Playback),
            other => Err(TapedeckError::Config(format!(
                "Unknown mode '{other}': expected none, record, or playback"
            ))),
        }
    }

    /// Check if mode is Record
    #[must_use]
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record)
    }

    /// Check if mode is Playback
    #[must_use]
    pub fn is_playback(&self) -> bool {
        matches!(self, Self::Playback)
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Operating mode
    pub mode: Mode,
    /// Base directory holding one subdirectory per test identity
    pub session_dir: PathBuf,
    /// Remove stale session files before a fresh Record save
    #[serde(default = "default_purge")]
    pub purge_on_save: bool,
}

fn default_purge() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::None,
            session_dir: PathBuf::from("sessions"),
            purge_on_save: true,
        }
    }
}

impl Config {
    /// Build a configuration from the environment, with the mode taken
    /// from `TAPEDECK_MODE` and everything else defaulted
    ///
    /// # Errors
    ///
    /// Returns error if the mode variable is malformed
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            mode: Mode::from_env()?,
            ..Self::default()
        })
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TapedeckError::Config(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| TapedeckError::Config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.session_dir.as_os_str().is_empty() {
            return Err(TapedeckError::Config(
                "session_dir cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_mode_parse_case_insensitive() {
        assert_eq!(Mode::parse("record").unwrap(), Mode::Record);
        assert_eq!(Mode::parse("RECORD").unwrap(), Mode::Record);
        assert_eq!(Mode::parse("Playback").unwrap(), Mode::Playback);
        assert_eq!(Mode::parse("none").unwrap(), Mode::None);
    }

    #[test]
    fn test_mode_parse_empty_defaults_to_none() {
        assert_eq!(Mode::parse("").unwrap(), Mode::None);
        assert_eq!(Mode::parse("   ").unwrap(), Mode::None);
    }

    #[test]
    fn test_mode_parse_unknown() {
        assert!(Mode::parse("replay-ish").is_err());
    }

    #[test]
    fn test_config_parse() {
        let config_toml = r#"
            mode = "record"
            session_dir = "/tmp/sessions"
        "#;

        let config: Config = toml::from_str(config_toml).unwrap();
        assert_eq!(config.mode, Mode::Record);
        assert!(config.purge_on_save);
        assert_eq!(config.session_dir, PathBuf::from("/tmp/sessions"));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        let config_toml = r#"
            mode = "playback"
            session_dir = "/tmp/sessions"
            purge_on_save = false
        "#;
        file.write_all(config_toml.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.mode, Mode::Playback);
        assert!(!config.purge_on_save);
    }

    #[test]
    fn test_invalid_config_empty_dir() {
        let config = Config {
            mode: Mode::Record,
            session_dir: PathBuf::new(),
            purge_on_save: true,
        };
        assert!(config.validate().is_err());
    }
}
