//! # Token Types
//!
//! This module defines the structures the lexer emits and the scheduler consumes.
//!
//! ## Type Hierarchy
//! ```text
//! Vec<Fragment>                 (played one after another, split on '|')
//!   └── Fragment
//!         ├── rhythm: RhythmMode
//!         └── Vec<Sequence>     (voices starting together, split on ':')
//!               └── Vec<Token>
//!                     ├── Note(NoteCode)
//!                     ├── Chord(Vec<NoteCode>)
//!                     ├── Rest { length }
//!                     └── Meta(Meta)
//! ```
//!
//! ## Length Codes
//! Notes, chord members and rests carry a signed length code. Positive codes come
//! from `~` runs and multiply the base duration by `1 + code`; negative codes come
//! from `'` runs and halve it once per step. See [`crate::duration`].

use serde::Serialize;

/// A pitch relative to the voice's octave bias, plus its length code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoteCode {
    pub pitch: i32,
    pub length: i32,
}

impl NoteCode {
    pub fn new(pitch: i32, length: i32) -> Self {
        Self { pitch, length }
    }
}

/// Effects a meta token can apply.
///
/// Single-character directives map to the first four; named effects come from
/// `{name=value}` blocks. Names are matched case-insensitively and anything else
/// is kept as `Unknown` so the scheduler can report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaEffect {
    OctaveUp,   // ^
    OctaveDown, // V
    SlurUp,     // L
    SlurDown,   // S
    Volume,     // {vol=..}
    NoteLength, // {notelength=..}
    Rhythm,     // {rhythm=..}
    Tempo,      // {tempo=..}
    Unknown(String),
}

impl MetaEffect {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "vol" => MetaEffect::Volume,
            "notelength" => MetaEffect::NoteLength,
            "rhythm" => MetaEffect::Rhythm,
            "tempo" => MetaEffect::Tempo,
            _ => MetaEffect::Unknown(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MetaEffect::OctaveUp => "octave_up",
            MetaEffect::OctaveDown => "octave_down",
            MetaEffect::SlurUp => "slur_up",
            MetaEffect::SlurDown => "slur_down",
            MetaEffect::Volume => "vol",
            MetaEffect::NoteLength => "notelength",
            MetaEffect::Rhythm => "rhythm",
            MetaEffect::Tempo => "tempo",
            MetaEffect::Unknown(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    pub effect: MetaEffect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Meta {
    pub fn new(effect: MetaEffect) -> Self {
        Self {
            effect,
            value: None,
        }
    }

    pub fn with_value(effect: MetaEffect, value: impl Into<String>) -> Self {
        Self {
            effect,
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Token {
    Note(NoteCode),
    Chord { notes: Vec<NoteCode> },
    Rest { length: i32 },
    Meta(Meta),
}

/// How a fragment's voices are lined up after scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RhythmMode {
    /// Every voice but the last is time-dilated to end with the last one.
    #[default]
    Relative,
    /// Any other value: voices keep their nominal timing.
    Absolute(String),
}

impl RhythmMode {
    pub fn from_value(value: &str) -> Self {
        if value.eq_ignore_ascii_case("relative") {
            RhythmMode::Relative
        } else {
            RhythmMode::Absolute(value.to_string())
        }
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, RhythmMode::Relative)
    }
}

/// One voice: an append-only list of tokens.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Sequence {
    pub tokens: Vec<Token>,
}

impl Sequence {
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Voices that start at the same time.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Fragment {
    pub sequences: Vec<Sequence>,
    pub rhythm: RhythmMode,
}

impl Fragment {
    pub fn new(sequences: Vec<Sequence>) -> Self {
        Self {
            sequences,
            rhythm: RhythmMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_effect_names_are_case_insensitive() {
        assert_eq!(MetaEffect::from_name("VOL"), MetaEffect::Volume);
        assert_eq!(MetaEffect::from_name("NoteLength"), MetaEffect::NoteLength);
        assert_eq!(MetaEffect::from_name("RHYTHM"), MetaEffect::Rhythm);
        assert_eq!(MetaEffect::from_name("tempo"), MetaEffect::Tempo);
    }

    #[test]
    fn test_unknown_meta_effect_keeps_name() {
        let effect = MetaEffect::from_name("REVERB");
        assert_eq!(effect, MetaEffect::Unknown("REVERB".to_string()));
        assert_eq!(effect.name(), "REVERB");
    }

    #[test]
    fn test_rhythm_mode_from_value() {
        assert!(RhythmMode::from_value("RELATIVE").is_relative());
        assert!(!RhythmMode::from_value("ABSOLUTE").is_relative());
        assert_eq!(
            RhythmMode::from_value("SWUNG"),
            RhythmMode::Absolute("SWUNG".to_string())
        );
    }

    #[test]
    fn test_fragment_defaults_to_relative() {
        let fragment = Fragment::new(vec![Sequence::default()]);
        assert!(fragment.rhythm.is_relative());
    }

    #[test]
    fn test_sequence_push() {
        let mut sequence = Sequence::default();
        assert!(sequence.is_empty());
        sequence.push(Token::Rest { length: 0 });
        sequence.push(Token::Meta(Meta::new(MetaEffect::OctaveUp)));
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.iter().next(), Some(&Token::Rest { length: 0 }));
    }

    #[test]
    fn test_token_serializes_with_type_tag() {
        let json = serde_json::to_string(&Token::Rest { length: -1 }).unwrap();
        assert_eq!(json, r#"{"type":"rest","length":-1}"#);
    }
}
