//! # Compiled Score Types
//!
//! This module defines the output of the OmniScore compiler: a normalized,
//! absolute-time timeline of events keyed by instrument and voice.
//!
//! ## Type Hierarchy
//! ```text
//! CompiledScore
//!   ├── Meta (title, composer, tempo, key, time signature)
//!   ├── Vec<InstrumentDef> (id, label, group, style, clef, tuning, map, ...)
//!   ├── Vec<GroupDef> (label, attributes, member ids)
//!   ├── Vec<NoteEvent> sorted by tick_start
//!   │     ├── kind: Note | Rest | Chord
//!   │     ├── pitches: Vec<Pitch> (midi + spelling)
//!   │     ├── duration: quarter notes (rational)
//!   │     ├── tick_start / tick_end: absolute ticks
//!   │     ├── velocity: [0, 1]
//!   │     └── modifiers: Vec<Modifier>
//!   └── duration_ticks
//! ```
//!
//! ## Time Base
//! All ticks are at a fixed resolution of [`TICKS_PER_QUARTER`] (1920) ticks per
//! quarter note. A measure of `N/D` spans `N * 4 / D` quarter notes.
//!
//! ## Consumers
//! - A renderer picks events per instrument and measure window with
//!   [`CompiledScore::events_in_window`].
//! - A playback engine converts ticks to seconds with
//!   [`CompiledScore::tick_to_seconds`].

use num_rational::Rational32;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Absolute time in ticks.
pub type Tick = u64;

/// Fixed timeline resolution.
pub const TICKS_PER_QUARTER: Tick = 1920;

/// Quarter-note count, kept exact (dotted and short values do not round).
pub type Quarters = Rational32;

/// Convert a quarter-note count into ticks, rounding down.
pub fn quarters_to_ticks(q: Quarters) -> Tick {
    if *q.numer() <= 0 {
        return 0;
    }
    (*q.numer() as i64 * TICKS_PER_QUARTER as i64 / *q.denom() as i64) as Tick
}

/// Time signature (e.g., 4/4, 3/4, 6/8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl TimeSignature {
    /// Parse `"N/D"` (or the list form `"[N,D]"`). Zero parts are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim().trim_start_matches('[').trim_end_matches(']');
        let (num, den) = trimmed.split_once('/').or_else(|| trimmed.split_once(','))?;
        let numerator: u32 = num.trim().parse().ok()?;
        let denominator: u32 = den.trim().parse().ok()?;
        if numerator == 0 || denominator == 0 {
            return None;
        }
        Some(Self {
            numerator,
            denominator,
        })
    }

    pub fn as_pair(&self) -> [u32; 2] {
        [self.numerator, self.denominator]
    }

    /// Length of one measure in ticks.
    pub fn ticks_per_measure(&self) -> Tick {
        self.numerator as Tick * 4 * TICKS_PER_QUARTER / self.denominator as Tick
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

pub const DEFAULT_TEMPO: u32 = 120;

/// Score-level metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub title: String,
    pub composer: String,
    /// Quarter notes per minute
    pub tempo: u32,
    pub key: String,
    pub time_signature: TimeSignature,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            title: String::new(),
            composer: String::new(),
            tempo: DEFAULT_TEMPO,
            key: "C".to_string(),
            time_signature: TimeSignature::default(),
        }
    }
}

impl Meta {
    /// Wall-clock length of one tick: `60 / (tempo * 1920)`.
    pub fn seconds_per_tick(&self) -> f64 {
        60.0 / (self.tempo.max(1) as f64 * TICKS_PER_QUARTER as f64)
    }
}

/// Pitch-resolution dialect of an instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffStyle {
    #[default]
    Standard,
    Tab,
    Grid,
}

impl StaffStyle {
    /// Case-sensitive: only the lowercase names are accepted.
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(StaffStyle::Standard),
            "tab" => Some(StaffStyle::Tab),
            "grid" => Some(StaffStyle::Grid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffStyle::Standard => "standard",
            StaffStyle::Tab => "tab",
            StaffStyle::Grid => "grid",
        }
    }
}

/// An instrument declared with `def`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentDef {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub style: StaffStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clef: Option<String>,
    pub transpose: i32,
    /// Open-string MIDI pitches, lowest string first. Empty means the
    /// standard six-string tuning.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tuning: Vec<f32>,
    /// Name of the bound percussion table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    pub volume: f32,
    pub pan: f32,
}

impl InstrumentDef {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            group: None,
            style: StaffStyle::Standard,
            clef: None,
            transpose: 0,
            tuning: Vec::new(),
            map: None,
            patch: None,
            volume: 1.0,
            pan: 0.0,
        }
    }
}

/// A `group` block, kept for visual grouping
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDef {
    pub label: String,
    pub attributes: BTreeMap<String, String>,
    pub members: Vec<String>,
}

/// Note letters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'c' => Some(NoteName::C),
            'd' => Some(NoteName::D),
            'e' => Some(NoteName::E),
            'f' => Some(NoteName::F),
            'g' => Some(NoteName::G),
            'a' => Some(NoteName::A),
            'b' => Some(NoteName::B),
            _ => None,
        }
    }

    /// Semitones above C
    pub fn semitone(&self) -> i32 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }
}

/// How a pitch was written, for the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PitchSpelling {
    /// Staff notation: letter, alteration in semitones, octave
    Staff { step: NoteName, alter: f32, octave: i32 },
    /// Tablature: fret on a string (1 = highest string)
    Fret { fret: u32, string: u32 },
    /// Percussion symbol with an optional staff position
    Pad {
        symbol: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        position: Option<i32>,
    },
    /// Unresolved token, sounded at the nominal pitch
    Nominal,
}

/// A resolved pitch. `midi` may be fractional for quarter tones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pitch {
    pub midi: f32,
    pub spelling: PitchSpelling,
}

/// Pitch used when a token cannot be resolved (middle C).
pub const NOMINAL_MIDI: f32 = 60.0;

impl Pitch {
    pub fn nominal() -> Self {
        Self {
            midi: NOMINAL_MIDI,
            spelling: PitchSpelling::Nominal,
        }
    }
}

/// Dynamic markings, passed through to playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dynamic {
    Ppp,
    Pp,
    P,
    Mp,
    Mf,
    F,
    Ff,
    Fff,
}

impl Dynamic {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "ppp" => Some(Dynamic::Ppp),
            "pp" => Some(Dynamic::Pp),
            "p" => Some(Dynamic::P),
            "mp" => Some(Dynamic::Mp),
            "mf" => Some(Dynamic::Mf),
            "f" => Some(Dynamic::F),
            "ff" => Some(Dynamic::Ff),
            "fff" => Some(Dynamic::Fff),
            _ => None,
        }
    }
}

/// A modifier argument: numeric-looking text is parsed as a number
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModifierArg {
    Number(f64),
    Text(String),
}

impl ModifierArg {
    pub fn parse(s: &str) -> Self {
        match s.parse::<f64>() {
            Ok(n) if n.is_finite() => ModifierArg::Number(n),
            _ => ModifierArg::Text(s.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ModifierArg::Number(n) => Some(*n),
            ModifierArg::Text(_) => None,
        }
    }
}

impl fmt::Display for ModifierArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierArg::Number(n) => write!(f, "{}", n),
            ModifierArg::Text(s) => f.write_str(s),
        }
    }
}

/// Event modifiers. Only `Grace` and `Velocity` change the compiled event;
/// the rest are carried for the renderer and the playback engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Modifier {
    Grace,
    /// `vol(n)` / `vel(n)`; `value` is the raw 0..127 argument
    Velocity { value: f64 },
    Staccato,
    Accent,
    Tenuto,
    Fermata,
    Ghost,
    Dynamic { level: Dynamic },
    /// Any other name, kept verbatim
    Other { name: String, args: Vec<ModifierArg> },
}

impl Modifier {
    pub fn from_parts(name: &str, args: Vec<ModifierArg>) -> Self {
        match name {
            "grace" => Modifier::Grace,
            "vol" | "vel" => match args.first().and_then(ModifierArg::as_number) {
                Some(value) => Modifier::Velocity { value },
                None => Modifier::Other {
                    name: name.to_string(),
                    args,
                },
            },
            "stacc" => Modifier::Staccato,
            "acc" => Modifier::Accent,
            "ten" => Modifier::Tenuto,
            "fermata" => Modifier::Fermata,
            "ghost" => Modifier::Ghost,
            _ => match Dynamic::from_name(name) {
                Some(level) => Modifier::Dynamic { level },
                None => Modifier::Other {
                    name: name.to_string(),
                    args,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Note,
    Rest,
    Chord,
}

/// Velocity of an event without a `vol`/`vel` modifier.
pub const DEFAULT_VELOCITY: f32 = 0.8;

/// A single compiled event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    pub kind: EventKind,
    pub pitches: Vec<Pitch>,
    pub duration: Quarters,
    pub tick_start: Tick,
    pub tick_end: Tick,
    pub velocity: f32,
    pub instrument_id: String,
    pub voice_id: String,
    /// 1-based measure index the event was produced in
    pub measure: u32,
    pub modifiers: Vec<Modifier>,
}

impl NoteEvent {
    pub fn is_grace(&self) -> bool {
        self.modifiers.contains(&Modifier::Grace)
    }
}

/// The compiler output
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledScore {
    pub meta: Meta,
    pub instruments: Vec<InstrumentDef>,
    pub groups: Vec<GroupDef>,
    pub timeline: Vec<NoteEvent>,
    pub duration_ticks: Tick,
}

impl CompiledScore {
    pub fn instrument(&self, id: &str) -> Option<&InstrumentDef> {
        self.instruments.iter().find(|i| i.id == id)
    }

    /// Measure length under the final time signature.
    pub fn ticks_per_measure(&self) -> Tick {
        self.meta.time_signature.ticks_per_measure()
    }

    /// Tick range covering measures `first..=last` (1-based).
    pub fn measure_window(&self, first: u32, last: u32) -> Range<Tick> {
        let tpm = self.ticks_per_measure();
        let start = first.saturating_sub(1) as Tick * tpm;
        let end = last.max(first) as Tick * tpm;
        start..end
    }

    /// Events of one instrument (and optionally one voice) starting inside `window`.
    pub fn events_in_window<'a>(
        &'a self,
        instrument_id: &'a str,
        voice_id: Option<&'a str>,
        window: Range<Tick>,
    ) -> impl Iterator<Item = &'a NoteEvent> + 'a {
        self.timeline.iter().filter(move |e| {
            e.instrument_id == instrument_id
                && voice_id.map_or(true, |v| e.voice_id == v)
                && window.contains(&e.tick_start)
        })
    }

    pub fn tick_to_seconds(&self, tick: Tick) -> f64 {
        tick as f64 * self.meta.seconds_per_tick()
    }
}
