//! # RML
//!
//! A compiler for RML, a compact textual music notation, into an absolute-time
//! schedule of note events.
//!
//! ## Pipeline
//! 1. [`preprocess`] strips whitespace and upper-cases the text
//! 2. [`lex`] splits it into fragments (`|`) and voices (`:`) of tokens
//! 3. [`Scheduler`] turns the tokens into one [`NoteTrack`] per voice per fragment
//!
//! ```rust
//! use rml::compile;
//!
//! // Four notes against three: the first voice is stretched to end with the second.
//! let tracks = compile("0000:333", 1.0)?;
//! assert_eq!(tracks.len(), 2);
//! assert_eq!(tracks[0].end_time(), tracks[1].end_time());
//! # Ok::<(), rml::RmlError>(())
//! ```
//!
//! Compilation is pure and deterministic: every call returns freshly owned tracks,
//! so a player should replace its previous result rather than mutate it.

pub mod config;
pub mod duration;
pub mod error;
pub mod lexer;
pub mod playback;
pub mod reader;
pub mod scheduler;
pub mod semantic;
pub mod token;

pub use config::{CompileOptions, Config, DEFAULT_NOTE_LENGTH};
pub use error::*;
pub use lexer::{lex, preprocess};
pub use playback::{NoteEvent, NoteTrack};
pub use scheduler::Scheduler;
pub use semantic::validate;
pub use token::*;

/// Compile RML source with the given seconds-per-note.
/// This is the main entry point for the library.
pub fn compile(source: &str, default_note_length: f64) -> Result<Vec<NoteTrack>, RmlError> {
    compile_with_options(source, &CompileOptions::with_note_length(default_note_length))
}

/// Compile with explicit options (note length and root note).
pub fn compile_with_options(
    source: &str,
    options: &CompileOptions,
) -> Result<Vec<NoteTrack>, RmlError> {
    options.check()?;
    let fragments = lex(&preprocess(source))?;
    Scheduler::new(options.note_length, options.root_note).schedule(&fragments)
}

/// Compile and range-check the result (volumes, pitch codes, timings).
pub fn compile_checked(
    source: &str,
    options: &CompileOptions,
) -> Result<Vec<NoteTrack>, RmlError> {
    let tracks = compile_with_options(source, options)?;
    validate(&tracks)?;
    Ok(tracks)
}
