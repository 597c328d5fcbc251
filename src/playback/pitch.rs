//! Pitch code naming for the 88-key sample table
//!
//! Pitch codes index a piano sample table starting at A0. The audio collaborator
//! loads one sample per key; this module only names them.

/// Number of keys in the sample table.
pub const PITCH_RANGE: i32 = 88;

/// Starting octave bias of every voice: A4.
pub const DEFAULT_ROOT_NOTE: i32 = 48;

const NOTE_NAMES: [&str; 12] = [
    "A", "Bb", "B", "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab",
];

/// Name a pitch code, e.g. `48` -> `"A4"`.
///
/// Octave numbers change at C, so code 3 is `C1` while code 2 is `B0`.
///
/// # Examples
/// ```
/// use rml::playback::note_name;
///
/// assert_eq!(note_name(0).as_deref(), Some("A0"));
/// assert_eq!(note_name(48).as_deref(), Some("A4"));
/// assert_eq!(note_name(51).as_deref(), Some("C5"));
/// assert_eq!(note_name(88), None);
/// ```
pub fn note_name(code: i32) -> Option<String> {
    if !(0..PITCH_RANGE).contains(&code) {
        return None;
    }
    let name = NOTE_NAMES[(code % 12) as usize];
    let octave = (code + 9) / 12;
    Some(format!("{}{}", name, octave))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octave_boundary_at_c() {
        assert_eq!(note_name(2).as_deref(), Some("B0"));
        assert_eq!(note_name(3).as_deref(), Some("C1"));
    }

    #[test]
    fn test_default_root_is_a4() {
        assert_eq!(note_name(DEFAULT_ROOT_NOTE).as_deref(), Some("A4"));
    }

    #[test]
    fn test_top_of_keyboard() {
        assert_eq!(note_name(87).as_deref(), Some("C8"));
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(note_name(-1), None);
        assert_eq!(note_name(PITCH_RANGE), None);
    }
}
