//! # Pitch/Duration Module
//!
//! Resolves the text of a single event into MIDI pitches and a duration.
//!
//! ## Event Grammar
//! ```text
//! <pitchPart>[:<duration>][.<modifier>]*
//! ```
//! The lexer splits an event over several tokens: `c4:8.vol(80).stacc` arrives
//! as `c4`, `:`, `8.vol`, `(`, `80`, `)`, `.stacc`. This module works on the
//! text of those tokens; stitching them together is the voice interpreter's job.
//!
//! ## Dialects
//! The pitch part is read according to the instrument's staff style:
//! - `standard` - `c#5`, `bb`, `f+4` (`standard.rs`)
//! - `tab` - `<fret>-<string>`, string 1 is the highest (`tab.rs`)
//! - `grid` - percussion symbols such as `k`, `sn`, `hh` (`grid.rs`)
//!
//! `r` and `s` are rests in every dialect.
//!
//! ## Durations
//! `4` is a quarter note, `8` an eighth, `2.` a dotted half, `8..` a double-dotted
//! eighth (`duration.rs`).

mod duration;
mod grid;
mod standard;
mod tab;

pub use duration::{parse_duration, DurationSpec, MAX_DENOMINATOR};
pub use grid::{builtin_map, resolve_grid, MapEntry, PercussionMap, GM_KIT};
pub use standard::resolve_standard;
pub use tab::{parse_tuning, resolve_tab, DEFAULT_TUNING};

use crate::score::{InstrumentDef, Pitch, StaffStyle};

/// Rest spellings
pub fn is_rest(pitch_part: &str) -> bool {
    matches!(pitch_part, "r" | "s")
}

/// Split an event token at its first `.` into the pitch part and the names of
/// the modifiers that follow it: `c4.stacc.acc` -> (`c4`, [`stacc`, `acc`]).
pub fn split_event_token(token: &str) -> (&str, Vec<&str>) {
    match token.find('.') {
        Some(dot) => (&token[..dot], modifier_names(&token[dot..])),
        None => (token, Vec::new()),
    }
}

/// Names in a `.a.b.c` tail. Empty segments are skipped.
pub fn modifier_names(tail: &str) -> Vec<&str> {
    tail.split('.').filter(|s| !s.is_empty()).collect()
}

/// Resolve a pitch part for an instrument. `octave` is the voice's sticky
/// octave; only the standard dialect reads or updates it.
///
/// Returns `None` when the token does not fit the dialect; callers fall back
/// to [`Pitch::nominal`].
pub fn resolve_pitch(pitch_part: &str, instrument: &InstrumentDef, octave: &mut i32) -> Option<Pitch> {
    match instrument.style {
        StaffStyle::Standard => resolve_standard(pitch_part, octave),
        StaffStyle::Tab => resolve_tab(pitch_part, &instrument.tuning),
        StaffStyle::Grid => {
            let map = instrument
                .map
                .as_deref()
                .and_then(builtin_map)
                .unwrap_or(&GM_KIT);
            resolve_grid(pitch_part, map)
        }
    }
}
