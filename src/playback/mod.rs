//! # Playback Module
//!
//! The compiled output of the RML compiler and the pull-based helpers a playback
//! loop uses to consume it.
//!
//! ## Sub-modules
//! - `types` - NoteEvent and NoteTrack definitions
//! - `transport` - Draining a set of tracks against a moving playhead
//! - `pitch` - Naming pitch codes on the 88-key sample table
//!
//! ## Key Types
//! - [`NoteEvent`] - One note: start, scheduled and sounding durations, pitch code, volume
//! - [`NoteTrack`] - The ordered events of one voice plus a read cursor
//! - [`Transport`] - Polls many tracks for events due inside a look-ahead window
//!
//! ## Example
//! ```rust
//! use rml::compile;
//! use rml::playback::{Transport, DEFAULT_LOOKAHEAD};
//!
//! let tracks = compile("0 1 2", 0.5).unwrap();
//! let mut transport = Transport::new(tracks);
//!
//! // A tick at t=0 picks up only the first note.
//! let due = transport.poll(0.0, DEFAULT_LOOKAHEAD);
//! assert_eq!(due.len(), 1);
//! assert_eq!(due[0].pitch_code, 48);
//!
//! let rest = transport.poll(1.0, DEFAULT_LOOKAHEAD);
//! assert_eq!(rest.len(), 2);
//! assert!(transport.is_finished());
//! ```
//!
//! ## Two Durations
//! Every event carries a `play_duration` (how long it sounds, and how far the
//! voice's clock advanced) and a `scheduled_duration` (at least as long; slurs
//! widen it). Audio stops a note at `start_time + play_duration`; the scheduled
//! extent is only for visual overlap.

mod pitch;
mod transport;
mod types;


pub use pitch::{note_name, DEFAULT_ROOT_NOTE, PITCH_RANGE};
pub use transport::{Transport, DEFAULT_LOOKAHEAD};
pub use types::{NoteEvent, NoteTrack};
