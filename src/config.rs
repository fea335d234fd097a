use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use termcolor::ColorChoice;
use tracing::Level;

use crate::error::ConfigError;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "midi-flipper.json";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto => ColorChoice::Auto,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

/// Settings read from `midi-flipper.json`. Every field is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub preserve_octaves: bool,
    pub color: ColorMode,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            preserve_octaves: false,
            color: ColorMode::Auto,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load `path`, or [`DEFAULT_CONFIG_FILE`] if it exists, or the defaults.
    ///
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Config::default());
                }
                fallback
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json { path, source })
    }

    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(self.log_level.trim())
            .map_err(|_| ConfigError::UnknownLogLevel(self.log_level.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{ "preserve_octaves": true }"#).unwrap();
        assert_eq!(
            config,
            Config {
                preserve_octaves: true,
                ..Config::default()
            }
        );
        assert_eq!(config.level().unwrap(), Level::INFO);
    }

    #[test]
    fn color_and_level_are_parsed() {
        let config: Config =
            serde_json::from_str(r#"{ "color": "never", "log_level": "debug" }"#).unwrap();
        assert_eq!(config.color, ColorMode::Never);
        assert_eq!(config.color.choice(), ColorChoice::Never);
        assert_eq!(config.level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn unknown_level_is_rejected() {
        let config = Config {
            log_level: "loud".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.level(), Err(ConfigError::UnknownLogLevel(l)) if l == "loud"));
    }

    #[test]
    fn loads_named_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "color": "always" }}"#).unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.color, ColorMode::Always);
        assert!(!config.preserve_octaves);
    }

    #[test]
    fn named_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(Config::load(Some(&missing)), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn malformed_json_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ preserve_octaves: yes }}").unwrap();
        assert!(matches!(
            Config::load(Some(file.path())),
            Err(ConfigError::Json { .. })
        ));
    }
}
