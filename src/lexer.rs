//! # Lexer
//!
//! Turns preprocessed RML text into fragments of token sequences.
//!
//! ## Structure
//! The text is split on `|` into fragments and each fragment on `:` into voices.
//! Every voice substring is scanned left to right by its own [`VoiceLexer`].
//!
//! ## Grammar
//! | Symbol          | Meaning                                                     |
//! |-----------------|-------------------------------------------------------------|
//! | `0`-`9` `T` `E` | note, pitch class 0-11                                      |
//! | `~` / `'`       | after a note: lengthen once / halve once per character      |
//! | `-`             | rest, may be shortened with `'`                             |
//! | `[` `]`         | chord                                                       |
//! | `<` `>`         | shape: note values are deltas added to a running pitch      |
//! | `^` `V`         | octave up / down                                            |
//! | `L` `S`         | slur up / down                                              |
//! | `{a=1,b=2}`     | named meta effects                                          |
//!
//! A shape may be opened inside a chord (chord arpeggios written as interval
//! chains) but a chord may not be opened inside a shape.

use tracing::{debug, trace};

use crate::error::RmlError;
use crate::reader::Reader;
use crate::token::{Fragment, Meta, MetaEffect, NoteCode, Sequence, Token};

/// Strip all whitespace and upper-case everything.
pub fn preprocess(source: &str) -> String {
    source
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Lex preprocessed text into fragments.
pub fn lex(input: &str) -> Result<Vec<Fragment>, RmlError> {
    Lexer::new(input).tokenize()
}

/// Lexer for a whole preprocessed document
pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    pub fn tokenize(&self) -> Result<Vec<Fragment>, RmlError> {
        let mut fragments = Vec::new();

        for (fragment_index, fragment_src) in self.input.split('|').enumerate() {
            let sequences = fragment_src
                .split(':')
                .enumerate()
                .map(|(voice_index, voice_src)| {
                    VoiceLexer::new(voice_src, fragment_index, voice_index).lex()
                })
                .collect::<Result<Vec<_>, _>>()?;

            trace!(
                fragment = fragment_index,
                voices = sequences.len(),
                "lexed fragment"
            );
            fragments.push(Fragment::new(sequences));
        }

        debug!(fragments = fragments.len(), "lexing complete");
        Ok(fragments)
    }
}

/// Chord/shape nesting. A chord inside a shape has no variant.
#[derive(Debug, Default)]
enum LexState {
    #[default]
    Free,
    InChord(Vec<NoteCode>),
    InShape {
        offset: i32,
    },
    InChordShape {
        chord: Vec<NoteCode>,
        offset: i32,
    },
}

/// Single-pass scanner for one voice substring
struct VoiceLexer<'a> {
    reader: Reader<'a>,
    state: LexState,
    sequence: Sequence,
    fragment: usize,
    voice: usize,
}

impl<'a> VoiceLexer<'a> {
    fn new(input: &'a str, fragment: usize, voice: usize) -> Self {
        Self {
            reader: Reader::new(input),
            state: LexState::Free,
            sequence: Sequence::default(),
            fragment,
            voice,
        }
    }

    fn error(&self, message: impl Into<String>) -> RmlError {
        RmlError::LexError {
            message: message.into(),
            index: self.reader.index(),
            fragment: self.fragment,
            voice: self.voice,
        }
    }

    fn lex(mut self) -> Result<Sequence, RmlError> {
        while let Some(c) = self.reader.next_char() {
            match c {
                '0'..='9' | 'T' | 'E' => self.note(c),
                '-' => self.rest()?,
                '[' => self.open_chord()?,
                ']' => self.close_chord()?,
                '<' => self.open_shape()?,
                '>' => self.close_shape()?,
                '^' => self.meta(MetaEffect::OctaveUp),
                'V' => self.meta(MetaEffect::OctaveDown),
                'L' => self.meta(MetaEffect::SlurUp),
                'S' => self.meta(MetaEffect::SlurDown),
                '{' => self.meta_block()?,
                '\'' => return Err(self.error("' symbols must follow notes or rests")),
                '~' => return Err(self.error("~ symbols must follow notes")),
                _ => return Err(self.error(format!("Unknown symbol: {}", c))),
            }
        }

        match self.state {
            LexState::Free => Ok(self.sequence),
            LexState::InShape { .. } | LexState::InChordShape { .. } => {
                Err(self.error("Chord shapes must be closed"))
            }
            LexState::InChord(_) => Err(self.error("Chords must be closed")),
        }
    }

    /// Read the length modifiers after a note or rest head.
    /// Tildes win; apostrophes are only looked for when there are none.
    fn length_code(&mut self, allow_tilde: bool) -> i32 {
        let tildes = if allow_tilde {
            self.reader.skip_while(|c| c == '~')
        } else {
            0
        };
        if tildes > 0 {
            tildes as i32
        } else {
            -(self.reader.skip_while(|c| c == '\'') as i32)
        }
    }

    fn note(&mut self, head: char) {
        let value = match head {
            'T' => 10,
            'E' => 11,
            digit => digit.to_digit(10).map_or(0, |d| d as i32),
        };
        let length = self.length_code(true);

        let pitch = match &mut self.state {
            LexState::InShape { offset } | LexState::InChordShape { offset, .. } => {
                *offset += value;
                *offset
            }
            LexState::Free | LexState::InChord(_) => value,
        };

        let note = NoteCode::new(pitch, length);
        match &mut self.state {
            LexState::InChord(chord) | LexState::InChordShape { chord, .. } => chord.push(note),
            LexState::Free | LexState::InShape { .. } => self.sequence.push(Token::Note(note)),
        }
    }

    fn rest(&mut self) -> Result<(), RmlError> {
        match self.state {
            LexState::InShape { .. } | LexState::InChordShape { .. } => {
                Err(self.error("Rests disallowed in shape"))
            }
            LexState::InChord(_) => Err(self.error("Rests disallowed in chord")),
            LexState::Free => {
                let length = self.length_code(false);
                self.sequence.push(Token::Rest { length });
                Ok(())
            }
        }
    }

    fn open_chord(&mut self) -> Result<(), RmlError> {
        match self.state {
            LexState::InChord(_) | LexState::InChordShape { .. } => {
                Err(self.error("Cannot nest chords"))
            }
            LexState::InShape { .. } => Err(self.error("Cannot nest chords inside shapes")),
            LexState::Free => {
                self.state = LexState::InChord(Vec::new());
                Ok(())
            }
        }
    }

    fn close_chord(&mut self) -> Result<(), RmlError> {
        match std::mem::take(&mut self.state) {
            LexState::InChord(notes) if notes.is_empty() => {
                Err(self.error("Chords must contain at least one note"))
            }
            LexState::InChord(notes) => {
                self.sequence.push(Token::Chord { notes });
                Ok(())
            }
            LexState::InChordShape { .. } => {
                Err(self.error("Close open shape before closing chords"))
            }
            LexState::Free | LexState::InShape { .. } => {
                Err(self.error("Attempt to close chord when not in chord"))
            }
        }
    }

    fn open_shape(&mut self) -> Result<(), RmlError> {
        self.state = match std::mem::take(&mut self.state) {
            LexState::Free => LexState::InShape { offset: 0 },
            LexState::InChord(chord) => LexState::InChordShape { chord, offset: 0 },
            LexState::InShape { .. } | LexState::InChordShape { .. } => {
                return Err(self.error("Cannot nest shapes"));
            }
        };
        Ok(())
    }

    fn close_shape(&mut self) -> Result<(), RmlError> {
        self.state = match std::mem::take(&mut self.state) {
            LexState::InShape { .. } => LexState::Free,
            LexState::InChordShape { chord, .. } => LexState::InChord(chord),
            LexState::Free | LexState::InChord(_) => {
                return Err(self.error("Attempt to close shape when not in shape"));
            }
        };
        Ok(())
    }

    fn meta(&mut self, effect: MetaEffect) {
        self.sequence.push(Token::Meta(Meta::new(effect)));
    }

    /// `{name=value,name=value}`; the opening brace is already consumed.
    fn meta_block(&mut self) -> Result<(), RmlError> {
        let contents = match self.reader.scan_to('}') {
            Some(contents) => contents,
            None => return Err(self.error("Unclosed meta")),
        };
        if contents.is_empty() {
            return Err(self.error("Null meta"));
        }

        for entry in contents.split(',') {
            let (name, value) = match entry.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (entry, None),
            };
            if name.is_empty() {
                return Err(self.error(format!("Meta entry '{}' has no name", entry)));
            }

            let effect = MetaEffect::from_name(name);
            self.sequence.push(Token::Meta(Meta {
                effect,
                value: value.map(str::to_string),
            }));
        }
        Ok(())
    }
}
