//! Compile options and YAML configuration.
//!
//! ```yaml
//! note-length: 0.3   # seconds per unmodified note
//! root-note: 48      # pitch code of note 0 before any octave shift (A4)
//! validate: true     # range-check the compiled tracks
//! ```

use serde::Deserialize;

use crate::error::RmlError;
use crate::playback::DEFAULT_ROOT_NOTE;

/// Seconds per unmodified note when nothing else is given (60 BPM).
pub const DEFAULT_NOTE_LENGTH: f64 = 1.0;

/// Options for a single compile call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompileOptions {
    pub note_length: f64,
    pub root_note: i32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            note_length: DEFAULT_NOTE_LENGTH,
            root_note: DEFAULT_ROOT_NOTE,
        }
    }
}

impl CompileOptions {
    pub fn with_note_length(note_length: f64) -> Self {
        Self {
            note_length,
            ..Self::default()
        }
    }

    pub fn check(&self) -> Result<(), RmlError> {
        if !(self.note_length.is_finite() && self.note_length > 0.0) {
            return Err(RmlError::ConfigError(format!(
                "note-length must be a positive number, got {}",
                self.note_length
            )));
        }
        Ok(())
    }
}

/// Raw configuration for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
    pub note_length: Option<f64>,
    pub root_note: Option<i32>,
    pub validate: Option<bool>,
}

/// Resolved configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub options: CompileOptions,
    pub validate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            options: CompileOptions::default(),
            validate: true,
        }
    }
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self, RmlError> {
        // An empty document deserializes as unit, not as an empty map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| RmlError::ConfigError(e.to_string()))?;
        let defaults = Self::default();

        let config = Self {
            options: CompileOptions {
                note_length: raw.note_length.unwrap_or(defaults.options.note_length),
                root_note: raw.root_note.unwrap_or(defaults.options.root_note),
            },
            validate: raw.validate.unwrap_or(defaults.validate),
        };
        config.options.check()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let yaml = "note-length: 0.3\nroot-note: 36\nvalidate: false\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.options.note_length, 0.3);
        assert_eq!(config.options.root_note, 36);
        assert!(!config.validate);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = Config::from_yaml("note-length: 0.5").unwrap();
        assert_eq!(config.options.note_length, 0.5);
        assert_eq!(config.options.root_note, DEFAULT_ROOT_NOTE);
        assert!(config.validate);
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = Config::from_yaml("tempo: 120").unwrap_err();
        assert!(matches!(err, RmlError::ConfigError(_)));
    }

    #[test]
    fn test_non_positive_note_length_is_rejected() {
        let err = Config::from_yaml("note-length: -1").unwrap_err();
        assert!(matches!(err, RmlError::ConfigError(ref m) if m.contains("note-length")));
    }
}
