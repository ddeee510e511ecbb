//! Duration text: `<denominator><dots?>` followed by an optional `.modifier` tail.
//!
//! `4` = 1 quarter note, `8` = 1/2, `2.` = 3, `8..` = 7/8. When a dot run is
//! followed by a name, its last dot starts the modifier: `4..stacc` is a dotted
//! quarter with `stacc`, `4...stacc` a double-dotted one.

use super::modifier_names;
use crate::score::Quarters;

/// Largest accepted denominator (a 1024th note).
pub const MAX_DENOMINATOR: i32 = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct DurationSpec<'a> {
    /// `None` when the text carried no usable denominator
    pub value: Option<Quarters>,
    /// Modifier names written after the duration
    pub modifiers: Vec<&'a str>,
    /// Something in the text was ignored (bad denominator, extra dots, junk)
    pub malformed: bool,
}

pub fn parse_duration(text: &str) -> DurationSpec<'_> {
    let digits_len = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, rest) = text.split_at(digits_len);

    if digits.is_empty() {
        // `c4:.stacc` - no duration, only modifiers
        let well_formed = rest.starts_with('.');
        return DurationSpec {
            value: None,
            modifiers: if well_formed { modifier_names(rest) } else { Vec::new() },
            malformed: !well_formed,
        };
    }

    let dot_run = rest.find(|c: char| c != '.').unwrap_or(rest.len());
    let (dots, tail) = if dot_run < rest.len() && dot_run > 0 {
        (dot_run - 1, &rest[dot_run - 1..])
    } else {
        (dot_run, &rest[dot_run..])
    };

    // A tail that does not start with a dot is junk right after the number
    let mut malformed = !tail.is_empty() && !tail.starts_with('.');
    let modifiers = if malformed { Vec::new() } else { modifier_names(tail) };

    let dots = if dots > 2 {
        malformed = true;
        2
    } else {
        dots
    };

    let value = match digits.parse::<i32>() {
        Ok(d) if d > 0 && d <= MAX_DENOMINATOR => {
            let base = Quarters::new(4, d);
            Some(match dots {
                0 => base,
                1 => base * Quarters::new(3, 2),
                _ => base * Quarters::new(7, 4),
            })
        }
        _ => {
            malformed = true;
            None
        }
    };

    DurationSpec {
        value,
        modifiers,
        malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i32, d: i32) -> Option<Quarters> {
        Some(Quarters::new(n, d))
    }

    #[test]
    fn test_plain_values() {
        assert_eq!(parse_duration("1").value, q(4, 1));
        assert_eq!(parse_duration("2").value, q(2, 1));
        assert_eq!(parse_duration("4").value, q(1, 1));
        assert_eq!(parse_duration("8").value, q(1, 2));
        assert_eq!(parse_duration("16").value, q(1, 4));
        assert_eq!(parse_duration("32").value, q(1, 8));
    }

    #[test]
    fn test_dots() {
        assert_eq!(parse_duration("4.").value, q(3, 2));
        assert_eq!(parse_duration("4..").value, q(7, 4));
        assert_eq!(parse_duration("2.").value, q(3, 1));
        assert!(!parse_duration("8..").malformed);
    }

    #[test]
    fn test_modifier_tail() {
        let spec = parse_duration("8.vol");
        assert_eq!(spec.value, q(1, 2));
        assert_eq!(spec.modifiers, vec!["vol"]);

        let spec = parse_duration("4..stacc");
        assert_eq!(spec.value, q(3, 2));
        assert_eq!(spec.modifiers, vec!["stacc"]);

        let spec = parse_duration("4...stacc.acc");
        assert_eq!(spec.value, q(7, 4));
        assert_eq!(spec.modifiers, vec!["stacc", "acc"]);
        assert!(!spec.malformed);
    }

    #[test]
    fn test_modifiers_without_value() {
        let spec = parse_duration(".grace");
        assert_eq!(spec.value, None);
        assert_eq!(spec.modifiers, vec!["grace"]);
        assert!(!spec.malformed);
    }

    #[test]
    fn test_malformed() {
        let spec = parse_duration("0");
        assert_eq!(spec.value, None);
        assert!(spec.malformed);

        let spec = parse_duration("4....");
        assert_eq!(spec.value, q(7, 4));
        assert!(spec.malformed);

        assert!(parse_duration("99999999999").value.is_none());
        assert!(parse_duration("4x").malformed);
        assert!(parse_duration("quarter").malformed);
    }

    #[test]
    fn test_non_power_of_two() {
        // Not rejected: 4/3 of a quarter (a half-note triplet member)
        assert_eq!(parse_duration("3").value, q(4, 3));
    }
}
