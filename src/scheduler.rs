//! # Scheduler
//!
//! Interprets lexed fragments into note tracks on one absolute timeline.
//!
//! ## State Scopes
//! - **Fragment scope** ([`FragmentState`]): the base note length and the rhythm
//!   mode. A `{notelength}`, `{tempo}` or `{rhythm}` meta in one voice affects every
//!   voice processed after it in the same fragment, never earlier voices and never
//!   other fragments.
//! - **Voice scope** ([`VoiceState`]): octave bias, slur multiplier, volume and the
//!   voice's time cursor. These reset for every voice.
//!
//! ## Timing
//! - A note sounds for `duration(base, length)` and the voice clock advances by
//!   exactly that. Its scheduled extent is `max(play, base * slur)`.
//! - A chord starts all members together and advances the clock by its shortest
//!   member, so longer members keep sounding over whatever comes next.
//! - In relative rhythm every voice but the last is scaled so it ends together with
//!   the last voice. This lines up polyrhythms written as naive equal-length voices,
//!   e.g. `0000:333` plays four notes against three.
//! - Fragments are chained: each starts where the latest voice of the previous one ended.

use tracing::{debug, trace};

use crate::duration::duration;
use crate::error::RmlError;
use crate::playback::{NoteEvent, NoteTrack};
use crate::token::{Fragment, Meta, MetaEffect, NoteCode, RhythmMode, Sequence, Token};

const OCTAVE: i32 = 12;

/// State shared by all voices of one fragment, in processing order
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentState {
    pub note_length: f64,
    pub rhythm: RhythmMode,
}

/// State private to one voice
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceState {
    pub octave_bias: i32,
    pub slur: u32,
    pub volume: f64,
    pub time: f64,
}

impl VoiceState {
    pub fn new(root_note: i32) -> Self {
        Self {
            octave_bias: root_note,
            slur: 1,
            volume: 1.0,
            time: 0.0,
        }
    }
}

/// Turns fragments into note tracks
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduler {
    note_length: f64,
    root_note: i32,
}

impl Scheduler {
    pub fn new(note_length: f64, root_note: i32) -> Self {
        Self {
            note_length,
            root_note,
        }
    }

    /// Schedule every fragment, one voice per track, in source order.
    pub fn schedule(&self, fragments: &[Fragment]) -> Result<Vec<NoteTrack>, RmlError> {
        let mut tracks = Vec::new();
        let mut fragment_start = 0.0;

        for (index, fragment) in fragments.iter().enumerate() {
            let mut fragment_tracks = self.schedule_fragment(fragment)?;

            for track in &mut fragment_tracks {
                track.set_start(fragment_start);
                check_timings(track)?;
            }

            let fragment_end = fragment_tracks
                .iter()
                .filter(|track| !track.is_empty())
                .map(NoteTrack::end_time)
                .fold(fragment_start, f64::max);

            debug!(
                fragment = index,
                start = fragment_start,
                end = fragment_end,
                "scheduled fragment"
            );
            fragment_start = fragment_end;
            tracks.extend(fragment_tracks);
        }

        Ok(tracks)
    }

    /// Schedule one fragment's voices relative to time 0, then line them up.
    fn schedule_fragment(&self, fragment: &Fragment) -> Result<Vec<NoteTrack>, RmlError> {
        let mut state = FragmentState {
            note_length: self.note_length,
            rhythm: fragment.rhythm.clone(),
        };

        let mut tracks = fragment
            .sequences
            .iter()
            .map(|sequence| self.schedule_voice(sequence, &mut state))
            .collect::<Result<Vec<_>, _>>()?;

        if state.rhythm.is_relative() {
            align_to_last_voice(&mut tracks)?;
        }

        Ok(tracks)
    }

    fn schedule_voice(
        &self,
        sequence: &Sequence,
        fragment: &mut FragmentState,
    ) -> Result<NoteTrack, RmlError> {
        let mut voice = VoiceState::new(self.root_note);
        let mut track = NoteTrack::new();

        for token in sequence.iter() {
            match token {
                Token::Note(code) => {
                    let played = schedule_note(&mut track, code, &voice, fragment)?;
                    advance(&mut voice, played)?;
                }
                Token::Rest { length } => {
                    advance(&mut voice, duration(fragment.note_length, *length))?;
                }
                Token::Chord { notes } => {
                    let mut shortest = f64::INFINITY;
                    for code in notes {
                        shortest = shortest.min(schedule_note(&mut track, code, &voice, fragment)?);
                    }
                    if !notes.is_empty() {
                        advance(&mut voice, shortest)?;
                    }
                }
                Token::Meta(meta) => apply_meta(meta, &mut voice, fragment)?,
            }
        }

        Ok(track)
    }
}

/// Emit one note at the voice's current time and return its sounding length.
fn schedule_note(
    track: &mut NoteTrack,
    code: &NoteCode,
    voice: &VoiceState,
    fragment: &FragmentState,
) -> Result<f64, RmlError> {
    let play_duration = duration(fragment.note_length, code.length);
    let scheduled_duration = play_duration.max(fragment.note_length * voice.slur as f64);
    if !scheduled_duration.is_finite() {
        return Err(RmlError::schedule(format!(
            "Note duration overflows at {}s",
            voice.time
        )));
    }

    track.push(NoteEvent {
        start_time: voice.time,
        scheduled_duration,
        play_duration,
        pitch_code: code.pitch + voice.octave_bias,
        volume: voice.volume,
    });
    Ok(play_duration)
}

/// Move the voice clock forward, refusing to run past the largest representable time.
fn advance(voice: &mut VoiceState, by: f64) -> Result<(), RmlError> {
    let time = voice.time + by;
    if !time.is_finite() {
        return Err(RmlError::schedule(format!(
            "Voice time overflows after {}s",
            voice.time
        )));
    }
    voice.time = time;
    Ok(())
}

/// Rescaling and fragment offsets can still overflow an otherwise finite track.
fn check_timings(track: &NoteTrack) -> Result<(), RmlError> {
    match track.events().iter().find(|event| !event.end_time().is_finite()) {
        Some(event) => Err(RmlError::schedule(format!(
            "Note timing overflows (start {}s)",
            event.start_time
        ))),
        None => Ok(()),
    }
}

fn apply_meta(
    meta: &Meta,
    voice: &mut VoiceState,
    fragment: &mut FragmentState,
) -> Result<(), RmlError> {
    match &meta.effect {
        MetaEffect::OctaveUp => voice.octave_bias += OCTAVE,
        MetaEffect::OctaveDown => voice.octave_bias -= OCTAVE,
        MetaEffect::SlurUp => voice.slur += 1,
        MetaEffect::SlurDown => voice.slur = voice.slur.saturating_sub(1).max(1),
        MetaEffect::Volume => voice.volume = parse_number(meta)?,
        MetaEffect::NoteLength => fragment.note_length = positive(meta, parse_number(meta)?)?,
        MetaEffect::Tempo => {
            let tempo = positive(meta, parse_number(meta)?)?;
            fragment.note_length = positive(meta, 60.0 / tempo)?;
        }
        MetaEffect::Rhythm => {
            fragment.rhythm = RhythmMode::from_value(meta.value.as_deref().unwrap_or_default());
        }
        MetaEffect::Unknown(name) => {
            return Err(RmlError::schedule(format!(
                "Undefined meta effect: {}",
                name
            )));
        }
    }

    trace!(effect = meta.effect.name(), value = ?meta.value, "applied meta");
    Ok(())
}

fn parse_number(meta: &Meta) -> Result<f64, RmlError> {
    let value = meta.value.as_deref().unwrap_or_default();
    value.parse::<f64>().map_err(|_| {
        RmlError::schedule(format!(
            "Invalid value '{}' for meta effect {}",
            value,
            meta.effect.name()
        ))
    })
}

/// Note lengths and tempi, and the note length a tempo implies, must be finite and above zero.
fn positive(meta: &Meta, number: f64) -> Result<f64, RmlError> {
    if number.is_finite() && number > 0.0 {
        Ok(number)
    } else {
        Err(RmlError::schedule(format!(
            "Meta effect {} must be a positive number, got {}",
            meta.effect.name(),
            number
        )))
    }
}

/// Relative rhythm: stretch every voice but the last to end with the last.
fn align_to_last_voice(tracks: &mut [NoteTrack]) -> Result<(), RmlError> {
    let Some((last, others)) = tracks.split_last_mut() else {
        return Ok(());
    };
    let floor = last.end_time();
    if floor <= 0.0 {
        return Ok(());
    }

    for track in others {
        let end = track.end_time();
        if end > 0.0 {
            let ratio = floor / end;
            if !ratio.is_finite() {
                return Err(RmlError::schedule(format!(
                    "Cannot stretch a voice ending at {}s to {}s",
                    end, floor
                )));
            }
            trace!(ratio, "rescaling voice");
            track.scale_notes(ratio);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{lex, preprocess};

    const EPSILON: f64 = 1e-9;

    fn schedule_source(source: &str, note_length: f64) -> Result<Vec<NoteTrack>, RmlError> {
        let fragments = lex(&preprocess(source))?;
        Scheduler::new(note_length, 48).schedule(&fragments)
    }

    fn starts(track: &NoteTrack) -> Vec<f64> {
        track.events().iter().map(|e| e.start_time).collect()
    }

    fn pitches(track: &NoteTrack) -> Vec<i32> {
        track.events().iter().map(|e| e.pitch_code).collect()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < EPSILON, "{} != {}", a, b);
    }

    #[test]
    fn test_notes_advance_by_play_duration() {
        let tracks = schedule_source("01~2'", 1.0).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(starts(&tracks[0]), vec![0.0, 1.0, 3.0]);
        assert_eq!(pitches(&tracks[0]), vec![48, 49, 50]);
        assert_eq!(tracks[0].events()[2].play_duration, 0.5);
    }

    #[test]
    fn test_rests_advance_time_only() {
        let tracks = schedule_source("0-'1--2", 1.0).unwrap();
        assert_eq!(starts(&tracks[0]), vec![0.0, 1.5, 4.5]);
    }

    #[test]
    fn test_chord_advances_by_shortest_member() {
        let tracks = schedule_source("[05']7", 0.3).unwrap();
        let events = tracks[0].events();
        assert_eq!(events.len(), 3);
        assert_close(events[0].play_duration, 0.3);
        assert_close(events[1].play_duration, 0.15);
        assert_eq!(events[0].start_time, events[1].start_time);
        assert_close(events[2].start_time, 0.15);
    }

    #[test]
    fn test_octave_shifts() {
        let tracks = schedule_source("0^0^0VV0", 1.0).unwrap();
        assert_eq!(pitches(&tracks[0]), vec![48, 60, 72, 48]);
    }

    #[test]
    fn test_slur_widens_scheduled_duration_only() {
        let tracks = schedule_source("LL0''1", 1.0).unwrap();
        let events = tracks[0].events();
        assert_eq!(events[0].play_duration, 0.25);
        assert_eq!(events[0].scheduled_duration, 3.0);
        assert_eq!(events[1].start_time, 0.25);
    }

    #[test]
    fn test_slur_down_is_floored_at_one() {
        let tracks = schedule_source("SSS0'", 1.0).unwrap();
        let event = tracks[0].events()[0];
        assert_eq!(event.play_duration, 0.5);
        assert_eq!(event.scheduled_duration, 1.0);
    }

    #[test]
    fn test_volume_meta() {
        let tracks = schedule_source("0{vol=0.25}1", 1.0).unwrap();
        let volumes: Vec<f64> = tracks[0].events().iter().map(|e| e.volume).collect();
        assert_eq!(volumes, vec![1.0, 0.25]);
    }

    #[test]
    fn test_voice_state_resets_per_voice() {
        let tracks = schedule_source("^L{vol=0.5}0:0", 1.0).unwrap();
        let second = tracks[1].events()[0];
        assert_eq!(second.pitch_code, 48);
        assert_eq!(second.volume, 1.0);
        assert_eq!(second.scheduled_duration, 1.0);
    }

    #[test]
    fn test_note_length_carries_to_later_voices_only() {
        let tracks = schedule_source("{rhythm=absolute}00:{notelength=0.5}00:00", 1.0).unwrap();
        assert_eq!(starts(&tracks[0]), vec![0.0, 1.0]);
        assert_eq!(starts(&tracks[1]), vec![0.0, 0.5]);
        assert_eq!(starts(&tracks[2]), vec![0.0, 0.5]);
    }

    #[test]
    fn test_note_length_does_not_leak_into_next_fragment() {
        let tracks = schedule_source("{notelength=0.5}00|00", 1.0).unwrap();
        assert_eq!(starts(&tracks[1]), vec![1.0, 2.0]);
    }

    #[test]
    fn test_tempo_sets_note_length() {
        let tracks = schedule_source("{tempo=120}000", 1.0).unwrap();
        assert_eq!(starts(&tracks[0]), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_relative_rhythm_aligns_voices() {
        let tracks = schedule_source("0000:333", 1.0).unwrap();
        assert_close(tracks[0].end_time(), 3.0);
        assert_close(tracks[1].end_time(), 3.0);
        let expected = [0.0, 0.75, 1.5, 2.25];
        for (start, want) in starts(&tracks[0]).iter().zip(expected) {
            assert_close(*start, want);
        }
        assert_close(tracks[0].events()[0].play_duration, 0.75);
    }

    #[test]
    fn test_absolute_rhythm_keeps_nominal_timing() {
        let tracks = schedule_source("{rhythm=absolute}0000:333", 1.0).unwrap();
        assert_eq!(tracks[0].end_time(), 4.0);
        assert_eq!(tracks[1].end_time(), 3.0);
    }

    #[test]
    fn test_rhythm_set_in_last_voice_still_applies() {
        let tracks = schedule_source("0000:{rhythm=absolute}333", 1.0).unwrap();
        assert_eq!(tracks[0].end_time(), 4.0);
    }

    #[test]
    fn test_empty_last_voice_skips_rescaling() {
        let tracks = schedule_source("0000:", 1.0).unwrap();
        assert_eq!(tracks[0].end_time(), 4.0);
        assert!(tracks[1].is_empty());
    }

    #[test]
    fn test_fragments_are_chained() {
        let tracks = schedule_source("00:0|1", 1.0).unwrap();
        assert_eq!(tracks.len(), 3);
        assert_close(tracks[2].events()[0].start_time, 1.0);
    }

    #[test]
    fn test_fragment_starts_after_longest_voice() {
        let tracks = schedule_source("{rhythm=absolute}000:0|1", 1.0).unwrap();
        assert_eq!(tracks[2].events()[0].start_time, 3.0);
    }

    #[test]
    fn test_empty_fragment_does_not_rewind_time() {
        let tracks = schedule_source("00||1", 1.0).unwrap();
        assert_eq!(tracks.len(), 3);
        assert!(tracks[1].is_empty());
        assert_eq!(tracks[2].events()[0].start_time, 2.0);
    }

    #[test]
    fn test_undefined_meta_effect() {
        let err = schedule_source("0{reverb=1}", 1.0).unwrap_err();
        assert!(matches!(err, RmlError::ScheduleError { ref message } if message.contains("Undefined meta effect: REVERB")));
    }

    #[test]
    fn test_invalid_meta_values() {
        assert!(matches!(
            schedule_source("{vol=loud}0", 1.0),
            Err(RmlError::ScheduleError { .. })
        ));
        assert!(matches!(
            schedule_source("{notelength=0}0", 1.0),
            Err(RmlError::ScheduleError { .. })
        ));
        assert!(matches!(
            schedule_source("{tempo}0", 1.0),
            Err(RmlError::ScheduleError { .. })
        ));
    }

    #[test]
    fn test_overflowing_note_length_is_an_error() {
        let err = schedule_source("{notelength=1e308}0~~0:{notelength=1}0", 1.0).unwrap_err();
        assert_eq!(err, RmlError::schedule("Note duration overflows at 0s"));
    }

    #[test]
    fn test_tiny_tempo_is_an_error() {
        let err = schedule_source("{tempo=1e-320}00", 1.0).unwrap_err();
        assert_eq!(
            err,
            RmlError::schedule("Meta effect tempo must be a positive number, got inf")
        );
    }

    #[test]
    fn test_voice_clock_overflow_is_an_error() {
        let err = schedule_source("{notelength=1e308}0-", 1.0).unwrap_err();
        assert!(matches!(
            err,
            RmlError::ScheduleError { ref message } if message.starts_with("Voice time overflows")
        ));
    }

    #[test]
    fn test_rescale_overflow_is_an_error() {
        let err = schedule_source("{notelength=1e-300}0:{notelength=1e300}0", 1.0).unwrap_err();
        assert!(matches!(
            err,
            RmlError::ScheduleError { ref message } if message.starts_with("Cannot stretch")
        ));
    }

    #[test]
    fn test_fragment_offset_overflow_is_an_error() {
        let err = schedule_source("{notelength=1e308}0|{notelength=1e308}0", 1.0).unwrap_err();
        assert!(matches!(
            err,
            RmlError::ScheduleError { ref message } if message.starts_with("Note timing overflows")
        ));
    }

    #[test]
    fn test_volume_is_not_range_checked() {
        let tracks = schedule_source("{vol=3}0", 1.0).unwrap();
        assert_eq!(tracks[0].events()[0].volume, 3.0);
    }
}
