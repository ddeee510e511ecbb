//! Staff-notation pitches: `<letter><accidental>*<octave?>`.
//!
//! | accidental | semitones |
//! |------------|-----------|
//! | `#`        | +1        |
//! | `b`        | -1        |
//! | `x`        | +2        |
//! | `n`        | 0         |
//! | `+`        | +1/2      |
//! | `d`        | -1/2      |
//!
//! Double sharps and flats may also be written `##` and `bb`. The octave is a
//! signed integer (`c-1` is MIDI 0); when it is left out the voice's last
//! octave is used.

use crate::score::{NoteName, Pitch, PitchSpelling};

fn accidental_value(c: char) -> Option<f32> {
    match c {
        '#' => Some(1.0),
        'b' => Some(-1.0),
        'x' => Some(2.0),
        'n' => Some(0.0),
        '+' => Some(0.5),
        'd' => Some(-0.5),
        _ => None,
    }
}

/// Resolve a staff pitch. On success the resolved octave is written back to
/// `octave`, whether it was explicit or inherited.
pub fn resolve_standard(token: &str, octave: &mut i32) -> Option<Pitch> {
    let mut chars = token.chars();
    let step = NoteName::from_char(chars.next()?)?;
    let rest = chars.as_str();

    let accidental_len = rest
        .find(|c: char| accidental_value(c).is_none())
        .unwrap_or(rest.len());
    let alter: f32 = rest[..accidental_len]
        .chars()
        .filter_map(accidental_value)
        .sum();

    let octave_text = &rest[accidental_len..];
    let resolved_octave = if octave_text.is_empty() {
        *octave
    } else {
        // i8 keeps the MIDI arithmetic far from overflow
        octave_text.parse::<i8>().ok()? as i32
    };

    *octave = resolved_octave;
    let midi = ((resolved_octave + 1) * 12 + step.semitone()) as f32 + alter;
    Some(Pitch {
        midi,
        spelling: PitchSpelling::Staff {
            step,
            alter,
            octave: resolved_octave,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midi(token: &str, octave: &mut i32) -> Option<f32> {
        resolve_standard(token, octave).map(|p| p.midi)
    }

    #[test]
    fn test_naturals() {
        let mut octave = 4;
        assert_eq!(midi("c4", &mut octave), Some(60.0));
        assert_eq!(midi("a4", &mut octave), Some(69.0));
        assert_eq!(midi("b3", &mut octave), Some(59.0));
        assert_eq!(midi("C5", &mut octave), Some(72.0));
    }

    #[test]
    fn test_accidentals() {
        let mut octave = 4;
        assert_eq!(midi("c#4", &mut octave), Some(61.0));
        assert_eq!(midi("bb4", &mut octave), Some(70.0));
        assert_eq!(midi("fx4", &mut octave), Some(67.0));
        assert_eq!(midi("f##4", &mut octave), Some(67.0));
        assert_eq!(midi("ebb4", &mut octave), Some(62.0));
        assert_eq!(midi("gn4", &mut octave), Some(67.0));
        assert_eq!(midi("cb4", &mut octave), Some(59.0));
    }

    #[test]
    fn test_quarter_tones() {
        let mut octave = 4;
        assert_eq!(midi("e+4", &mut octave), Some(64.5));
        assert_eq!(midi("ed4", &mut octave), Some(63.5));
        assert_eq!(midi("c#+4", &mut octave), Some(61.5));
    }

    #[test]
    fn test_sticky_octave() {
        let mut octave = 4;
        assert_eq!(midi("c5", &mut octave), Some(72.0));
        assert_eq!(octave, 5);
        assert_eq!(midi("e", &mut octave), Some(76.0));
        assert_eq!(midi("g", &mut octave), Some(79.0));
        assert_eq!(octave, 5);
    }

    #[test]
    fn test_negative_octave() {
        let mut octave = 4;
        assert_eq!(midi("c-1", &mut octave), Some(0.0));
        assert_eq!(octave, -1);
    }

    #[test]
    fn test_spelling() {
        let mut octave = 4;
        let pitch = resolve_standard("f#3", &mut octave).unwrap();
        assert_eq!(
            pitch.spelling,
            PitchSpelling::Staff {
                step: NoteName::F,
                alter: 1.0,
                octave: 3
            }
        );
    }

    #[test]
    fn test_unresolved_leaves_octave() {
        let mut octave = 3;
        assert_eq!(midi("h4", &mut octave), None);
        assert_eq!(midi("c4z", &mut octave), None);
        assert_eq!(midi("c999", &mut octave), None);
        assert_eq!(midi("", &mut octave), None);
        assert_eq!(octave, 3);
    }
}
