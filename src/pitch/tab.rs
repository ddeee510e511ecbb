//! Tablature pitches: `<fret>-<string>`.
//!
//! Strings are numbered from the highest-sounding string inward, so on a
//! guitar in standard tuning string 1 is the high E and string 6 the low E.

use super::standard::resolve_standard;
use crate::score::{Pitch, PitchSpelling};

/// E2 A2 D3 G3 B3 E4, lowest string first
pub const DEFAULT_TUNING: [f32; 6] = [40.0, 45.0, 50.0, 55.0, 59.0, 64.0];

pub fn resolve_tab(token: &str, tuning: &[f32]) -> Option<Pitch> {
    let (fret, string) = token.split_once('-')?;
    let fret: u32 = fret.parse().ok()?;
    let string: u32 = string.parse().ok()?;
    if string == 0 || fret > 48 {
        return None;
    }

    let strings: &[f32] = if tuning.is_empty() {
        &DEFAULT_TUNING
    } else {
        tuning
    };
    let index = strings.len().checked_sub(string as usize)?;
    let open = strings[index];

    Some(Pitch {
        midi: open + fret as f32,
        spelling: PitchSpelling::Fret { fret, string },
    })
}

/// Read a `tuning=[...]` value. Entries are MIDI numbers or staff pitches with
/// an octave (`e2`, `f#3`), lowest string first. Any unreadable entry rejects
/// the whole list.
pub fn parse_tuning(values: &[String]) -> Option<Vec<f32>> {
    if values.is_empty() {
        return None;
    }
    values
        .iter()
        .map(|v| match v.parse::<f32>() {
            Ok(midi) if midi.is_finite() => Some(midi),
            _ => {
                let mut octave = 4;
                resolve_standard(v, &mut octave).map(|p| p.midi)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning() {
        assert_eq!(resolve_tab("0-1", &[]).unwrap().midi, 64.0);
        assert_eq!(resolve_tab("0-6", &[]).unwrap().midi, 40.0);
        assert_eq!(resolve_tab("3-6", &[]).unwrap().midi, 43.0);
        assert_eq!(resolve_tab("5-2", &[]).unwrap().midi, 64.0);
    }

    #[test]
    fn test_custom_tuning() {
        // Four-string bass: E1 A1 D2 G2
        let bass = [28.0, 33.0, 38.0, 43.0];
        assert_eq!(resolve_tab("0-1", &bass).unwrap().midi, 43.0);
        assert_eq!(resolve_tab("2-4", &bass).unwrap().midi, 30.0);
        assert!(resolve_tab("0-5", &bass).is_none());
    }

    #[test]
    fn test_spelling() {
        let pitch = resolve_tab("7-3", &[]).unwrap();
        assert_eq!(pitch.spelling, PitchSpelling::Fret { fret: 7, string: 3 });
        assert_eq!(pitch.midi, 62.0);
    }

    #[test]
    fn test_unresolved() {
        assert!(resolve_tab("c4", &[]).is_none());
        assert!(resolve_tab("3", &[]).is_none());
        assert!(resolve_tab("3-0", &[]).is_none());
        assert!(resolve_tab("x-2", &[]).is_none());
        assert!(resolve_tab("3-7", &[]).is_none());
    }

    #[test]
    fn test_parse_tuning() {
        let drop_d: Vec<String> = ["d2", "a2", "d3", "g3", "b3", "e4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            parse_tuning(&drop_d).unwrap(),
            vec![38.0, 45.0, 50.0, 55.0, 59.0, 64.0]
        );

        let numeric = vec!["28".to_string(), "33".to_string()];
        assert_eq!(parse_tuning(&numeric).unwrap(), vec![28.0, 33.0]);

        assert!(parse_tuning(&["e2".to_string(), "zz".to_string()]).is_none());
        assert!(parse_tuning(&[]).is_none());
    }
}
