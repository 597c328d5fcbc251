//! # Error Types
//!
//! This module defines all error types for the RML compiler.
//!
//! Every failure is terminal for the compile call: the first error found aborts
//! immediately and no partial track list is returned.
//!
//! ## Error Types
//! - `LexError` - Malformed notation, with the cursor position inside the voice being scanned
//! - `ScheduleError` - Undefined meta effects and unusable meta values
//! - `ConfigError` - Invalid YAML configuration or compile options
//! - `ValidationError` - Out-of-range events found by [`crate::semantic::validate`]
//!
//! ## Error Positions
//! `LexError::index` counts characters from the start of the *voice substring*
//! (the text between `|`/`:` separators after preprocessing), not from the start
//! of the document. The `fragment` and `voice` fields say which substring that was,
//! so a caller wanting a global offset has to add up the preceding substrings itself.
//!
//! ## Usage
//! ```rust
//! use rml::{compile, RmlError};
//!
//! match compile("[01", 1.0) {
//!     Ok(tracks) => println!("{} tracks", tracks.len()),
//!     Err(RmlError::LexError { message, index, .. }) => {
//!         eprintln!("Lex error at {}: {}", index, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RmlError {
    /// Lexical error with a voice-local position.
    ///
    /// Unknown symbols, misplaced length modifiers, unbalanced chords or shapes,
    /// and unterminated or empty meta blocks.
    ///
    /// # Example
    /// ```
    /// # use rml::RmlError;
    /// let err = RmlError::LexError {
    ///     message: "Chords must be closed".to_string(),
    ///     index: 3,
    ///     fragment: 0,
    ///     voice: 1,
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Lex error in fragment 0, voice 1 at index 3: Chords must be closed"
    /// );
    /// ```
    #[error("Lex error in fragment {fragment}, voice {voice} at index {index}: {message}")]
    LexError {
        message: String,
        index: usize,
        fragment: usize,
        voice: usize,
    },

    /// Scheduling error.
    ///
    /// Occurs when a meta block names an effect the scheduler does not know, or
    /// carries a value that cannot be used (e.g. `{notelength=abc}`).
    ///
    /// # Example
    /// ```
    /// # use rml::RmlError;
    /// let err = RmlError::ScheduleError {
    ///     message: "Undefined meta effect: FOO".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Schedule error: Undefined meta effect: FOO");
    /// ```
    #[error("Schedule error: {message}")]
    ScheduleError { message: String },

    /// Invalid configuration.
    ///
    /// # Example
    /// ```
    /// # use rml::RmlError;
    /// let err = RmlError::ConfigError("note-length must be positive".to_string());
    /// assert_eq!(err.to_string(), "Invalid configuration: note-length must be positive");
    /// ```
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Validation error with track and event indices (both 0-based).
    ///
    /// # Example
    /// ```
    /// # use rml::RmlError;
    /// let err = RmlError::ValidationError {
    ///     track: 1,
    ///     event: 4,
    ///     message: "volume 1.5 is outside (0, 1]".to_string(),
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Validation error in track 1, event 4: volume 1.5 is outside (0, 1]"
    /// );
    /// ```
    #[error("Validation error in track {track}, event {event}: {message}")]
    ValidationError {
        track: usize,
        event: usize,
        message: String,
    },
}

impl RmlError {
    pub(crate) fn schedule(message: impl Into<String>) -> Self {
        RmlError::ScheduleError {
            message: message.into(),
        }
    }
}
