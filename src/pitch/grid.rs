//! Percussion-grid pitches: a symbol looked up in a percussion map.

use crate::score::{Pitch, PitchSpelling};

/// A map entry: a bare MIDI note, or a staff position plus MIDI note.
/// Only the MIDI half reaches the timeline; the position rides along in the
/// pitch spelling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEntry {
    Midi(u8),
    Placed { position: i32, midi: u8 },
}

impl MapEntry {
    pub fn midi(&self) -> u8 {
        match self {
            MapEntry::Midi(m) | MapEntry::Placed { midi: m, .. } => *m,
        }
    }

    pub fn position(&self) -> Option<i32> {
        match self {
            MapEntry::Midi(_) => None,
            MapEntry::Placed { position, .. } => Some(*position),
        }
    }
}

#[derive(Debug)]
pub struct PercussionMap {
    pub name: &'static str,
    entries: &'static [(&'static str, MapEntry)],
}

impl PercussionMap {
    pub fn lookup(&self, symbol: &str) -> Option<MapEntry> {
        self.entries
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, entry)| *entry)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|(s, _)| *s)
    }
}

/// General MIDI drum kit. Positions count staff steps from the middle line.
pub const GM_KIT: PercussionMap = PercussionMap {
    name: "gm_kit",
    entries: &[
        ("k", MapEntry::Placed { position: -5, midi: 36 }),
        ("bd", MapEntry::Placed { position: -5, midi: 36 }),
        ("sn", MapEntry::Placed { position: 1, midi: 38 }),
        ("h", MapEntry::Placed { position: 5, midi: 42 }),
        ("hh", MapEntry::Placed { position: 5, midi: 42 }),
        ("ho", MapEntry::Placed { position: 5, midi: 46 }),
        ("hp", MapEntry::Placed { position: -7, midi: 44 }),
        ("cr", MapEntry::Placed { position: 6, midi: 49 }),
        ("rd", MapEntry::Placed { position: 4, midi: 51 }),
        ("t1", MapEntry::Placed { position: 3, midi: 48 }),
        ("t2", MapEntry::Placed { position: 2, midi: 45 }),
        ("t3", MapEntry::Placed { position: -1, midi: 43 }),
        ("cl", MapEntry::Midi(39)),
        ("rim", MapEntry::Midi(37)),
        ("cb", MapEntry::Midi(56)),
    ],
};

/// Built-in maps by the name used in `map=<name>`.
pub fn builtin_map(name: &str) -> Option<&'static PercussionMap> {
    match name {
        "gm_kit" => Some(&GM_KIT),
        _ => None,
    }
}

pub fn resolve_grid(symbol: &str, map: &PercussionMap) -> Option<Pitch> {
    let entry = map.lookup(symbol)?;
    Some(Pitch {
        midi: entry.midi() as f32,
        spelling: PitchSpelling::Pad {
            symbol: symbol.to_string(),
            position: entry.position(),
        },
    })
}
