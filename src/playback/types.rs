//! Note event and note track type definitions
//!
//! This module defines the compiled output handed to audio and visual collaborators.

use serde::Serialize;

/// A single scheduled note
///
/// # Fields
/// - `start_time`: Absolute start in seconds
/// - `scheduled_duration`: Visual/legato extent in seconds (widened by slurs)
/// - `play_duration`: How long the note actually sounds, in seconds
/// - `pitch_code`: Absolute chromatic index into the 88-key sample table (0 = A0)
/// - `volume`: Gain, nominally in (0, 1]
///
/// `scheduled_duration >= play_duration` always holds for events built by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    pub start_time: f64,
    pub scheduled_duration: f64,
    pub play_duration: f64,
    pub pitch_code: i32,
    pub volume: f64,
}

impl NoteEvent {
    /// The later of the sounding and scheduled ends.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.scheduled_duration.max(self.play_duration)
    }
}

/// The compiled, replayable output for one voice
///
/// Events are kept in the order they were scheduled, which is non-decreasing in
/// `start_time`; nothing ever re-sorts them. A read cursor lets a playback loop
/// drain the track incrementally and [`NoteTrack::reset`] rewinds it for replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteTrack {
    events: Vec<NoteEvent>,
    #[serde(skip)]
    cursor: usize,
}

impl NoteTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Only the scheduler builds tracks.
    pub(crate) fn push(&mut self, event: NoteEvent) {
        debug_assert!(
            self.events
                .last()
                .map_or(true, |last| last.start_time <= event.start_time),
            "events must be appended in start-time order"
        );
        self.events.push(event);
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// End of the last event (0 for an empty track).
    ///
    /// Only the last event counts: a trailing rest or a longer, earlier chord member
    /// does not extend it, so in `[0~~5]|1` and `0-|1` the second fragment starts at 1.0.
    pub fn end_time(&self) -> f64 {
        self.events.last().map_or(0.0, NoteEvent::end_time)
    }

    /// Multiply every start time and both durations by `ratio`.
    pub fn scale_notes(&mut self, ratio: f64) {
        for event in &mut self.events {
            event.start_time *= ratio;
            event.scheduled_duration *= ratio;
            event.play_duration *= ratio;
        }
    }

    /// Shift every start time by `offset`.
    pub fn set_start(&mut self, offset: f64) {
        for event in &mut self.events {
            event.start_time += offset;
        }
    }

    pub fn has_more(&self) -> bool {
        self.cursor < self.events.len()
    }

    pub fn peek_next_time(&self) -> Option<f64> {
        self.events.get(self.cursor).map(|event| event.start_time)
    }

    pub fn take_next(&mut self) -> Option<NoteEvent> {
        let event = self.events.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(event)
    }

    /// Rewind the read cursor to the first event.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}
