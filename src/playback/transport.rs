//! Pull-based draining of compiled tracks
//!
//! The transport owns no timer. An external tick source calls [`Transport::poll`]
//! with its current clock reading and gets back every event that falls inside the
//! look-ahead window, ready to be scheduled on an audio clock.

use tracing::trace;

use super::types::{NoteEvent, NoteTrack};

/// Default look-ahead window, in seconds.
pub const DEFAULT_LOOKAHEAD: f64 = 0.1;

/// Drains a set of tracks against a moving playhead
#[derive(Debug, Clone, Default)]
pub struct Transport {
    tracks: Vec<NoteTrack>,
}

impl Transport {
    pub fn new(tracks: Vec<NoteTrack>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[NoteTrack] {
        &self.tracks
    }

    /// Take every event starting before `now + lookahead`, track by track.
    ///
    /// Within one track events come out in start-time order; across tracks they
    /// are grouped by track, as an audio clock schedules them ahead anyway.
    pub fn poll(&mut self, now: f64, lookahead: f64) -> Vec<NoteEvent> {
        let horizon = now + lookahead;
        let mut due = Vec::new();

        for track in &mut self.tracks {
            while track.peek_next_time().is_some_and(|time| time < horizon) {
                if let Some(event) = track.take_next() {
                    due.push(event);
                }
            }
        }

        if !due.is_empty() {
            trace!(now, count = due.len(), "events due");
        }
        due
    }

    /// True once every track has been drained.
    pub fn is_finished(&self) -> bool {
        self.tracks.iter().all(|track| !track.has_more())
    }

    /// Rewind every track so the piece can be played again.
    pub fn rewind(&mut self) {
        for track in &mut self.tracks {
            track.reset();
        }
    }

    /// Latest end time over all tracks.
    pub fn duration(&self) -> f64 {
        self.tracks
            .iter()
            .map(NoteTrack::end_time)
            .fold(0.0, f64::max)
    }
}
