//! # Semantic Validation Module
//!
//! Checks compiled tracks for values the scheduler deliberately passes through.
//!
//! ## Purpose
//! The scheduler never range-checks: `{vol=3}` yields a volume of 3 and a high
//! enough octave bias yields a pitch code past the top of the keyboard. Callers
//! that hand tracks to an audio backend can run this validator first.
//!
//! ## Validation Rules
//! - Volume must lie in (0, 1]
//! - Pitch codes must index the 88-key sample table (`0..PITCH_RANGE`)
//! - Start times must be finite and non-negative
//! - `scheduled_duration >= play_duration`
//!
//! ## Entry Point
//! `validate(tracks: &[NoteTrack]) -> Result<(), RmlError>`
//!
//! ## Example
//! ```rust
//! use rml::{compile, validate};
//!
//! let tracks = compile("{vol=0.5}0123", 1.0)?;
//! validate(&tracks)?;
//! # Ok::<(), rml::RmlError>(())
//! ```

use crate::error::RmlError;
use crate::playback::{NoteEvent, NoteTrack, PITCH_RANGE};

/// Validate every event of every track, stopping at the first problem.
pub fn validate(tracks: &[NoteTrack]) -> Result<(), RmlError> {
    for (track_index, track) in tracks.iter().enumerate() {
        for (event_index, event) in track.events().iter().enumerate() {
            validate_event(event).map_err(|message| RmlError::ValidationError {
                track: track_index,
                event: event_index,
                message,
            })?;
        }
    }
    Ok(())
}

fn validate_event(event: &NoteEvent) -> Result<(), String> {
    if !(event.volume > 0.0 && event.volume <= 1.0) {
        return Err(format!("volume {} is outside (0, 1]", event.volume));
    }
    if !(0..PITCH_RANGE).contains(&event.pitch_code) {
        return Err(format!(
            "pitch code {} is outside the keyboard (0..{})",
            event.pitch_code, PITCH_RANGE
        ));
    }
    if !(event.start_time.is_finite() && event.start_time >= 0.0) {
        return Err(format!("start time {} is invalid", event.start_time));
    }
    if event.scheduled_duration < event.play_duration {
        return Err(format!(
            "scheduled duration {} is shorter than play duration {}",
            event.scheduled_duration, event.play_duration
        ));
    }
    Ok(())
}
