//! Note duration model.
//!
//! A length code of `n > 0` (from `n` tildes) stretches a note to `1 + n` base
//! lengths; `n < 0` (from `-n` apostrophes) halves it `-n` times.

/// Apply a length code to a base duration (in seconds).
///
/// # Examples
/// ```
/// use rml::duration::duration;
///
/// assert_eq!(duration(0.5, 0), 0.5);
/// assert_eq!(duration(0.5, 2), 1.5);
/// assert_eq!(duration(0.5, -2), 0.125);
/// ```
pub fn duration(base: f64, length_code: i32) -> f64 {
    if length_code > 0 {
        base * (1 + length_code) as f64
    } else if length_code < 0 {
        base / 2f64.powi(-length_code)
    } else {
        base
    }
}
