//! # Compiler Module
//!
//! Interprets the token stream from the lexer and produces the raw event list
//! of a score.
//!
//! ## Two-Pass Algorithm
//!
//! ### First Pass: Document Structure
//! Walks the document root (the body of an `omniscore { ... }` wrapper, or the
//! whole file when there is none) and handles, in source order:
//! - `macro` definitions (`macros.rs`)
//! - `group` and `def` instrument declarations (`instruments.rs`)
//! - `meta { ... }` blocks and `measure` headers, whose bodies are captured
//!   as `DocumentItem`s but not yet interpreted
//!
//! Every instrument and macro is therefore known before any measure runs,
//! wherever it was declared. `omniscore` and `group` bodies nest at most
//! `max_nesting_depth` levels deep.
//!
//! ### Second Pass: Replay
//! The captured items run in document order: `meta` blocks are applied
//! (`meta.rs`) and each measure block is replayed once per index in its range
//! (`measure.rs`). Voice streams inside a measure emit events through the
//! per-voice interpreter (`voice.rs`).
//!
//! ## Sticky State
//! Octave and duration carry over from one event to the next within a voice,
//! across measures and replays. The state lives in a [`VoiceCursor`] keyed by
//! [`VoiceKey`].
//!
//! ## Leniency
//! Nothing in this module fails. Every problem becomes a [`Diagnostic`] (also
//! logged with `tracing`) and the input is skipped or defaulted.

mod instruments;
mod macros;
mod measure;
mod meta;
mod voice;


use crate::config::CompileOptions;
use crate::error::Diagnostic;
use crate::lexer::{LocatedToken, Token, TokenCursor};
use crate::score::{GroupDef, InstrumentDef, Meta, NoteEvent, Quarters, Tick};
use macros::MacroDef;
use measure::MeasureBlock;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

pub use macros::MAX_EXPANSIONS;
pub use measure::MAX_MEASURE_INDEX;

/// Identity of a voice: an instrument and a voice id within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceKey {
    pub instrument: String,
    pub voice: String,
}

impl VoiceKey {
    pub fn new(instrument: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            voice: voice.into(),
        }
    }
}

/// Sticky state of one voice
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceCursor {
    pub octave: i32,
    /// Duration used by events that do not spell one out
    pub duration: Quarters,
    /// End of the last non-grace event. Informational only: event placement
    /// uses the local tick of the current voice occurrence.
    pub tick: Tick,
}

impl Default for VoiceCursor {
    fn default() -> Self {
        Self {
            octave: 4,
            duration: Quarters::from_integer(1),
            tick: 0,
        }
    }
}

/// Everything the compiler produced, before timeline assembly
#[derive(Debug)]
pub struct CompilerOutput {
    pub meta: Meta,
    pub instruments: Vec<InstrumentDef>,
    pub groups: Vec<GroupDef>,
    /// Events in production order
    pub events: Vec<NoteEvent>,
    pub cursors: HashMap<VoiceKey, VoiceCursor>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A top-level block whose effect depends on its position in the document
#[derive(Debug, Clone)]
enum DocumentItem<'a> {
    Meta(&'a [LocatedToken]),
    Measure(MeasureBlock<'a>),
}

/// Compiler state for one compilation
pub struct Compiler<'o> {
    options: &'o CompileOptions,
    meta: Meta,
    macros: HashMap<String, MacroDef>,
    instruments: Vec<InstrumentDef>,
    instrument_index: HashMap<String, usize>,
    groups: Vec<GroupDef>,
    cursors: HashMap<VoiceKey, VoiceCursor>,
    events: Vec<NoteEvent>,
    diagnostics: Vec<Diagnostic>,
    macro_depth: usize,
    nesting: usize,
    expansions: usize,
    depth_reported: HashSet<String>,
    expansion_budget_reported: bool,
    event_limit_reached: bool,
}

impl<'o> Compiler<'o> {
    pub fn new(options: &'o CompileOptions) -> Self {
        Self {
            options,
            meta: Meta::default(),
            macros: HashMap::new(),
            instruments: Vec::new(),
            instrument_index: HashMap::new(),
            groups: Vec::new(),
            cursors: HashMap::new(),
            events: Vec::new(),
            diagnostics: Vec::new(),
            macro_depth: 0,
            nesting: 0,
            expansions: 0,
            depth_reported: HashSet::new(),
            expansion_budget_reported: false,
            event_limit_reached: false,
        }
    }

    pub fn run(mut self, tokens: &[LocatedToken]) -> CompilerOutput {
        let mut items = Vec::new();
        self.collect_top_level(tokens, None, &mut items);
        debug!(
            instruments = self.instruments.len(),
            macros = self.macros.len(),
            items = items.len(),
            "collected document structure"
        );

        for item in &items {
            match item {
                DocumentItem::Meta(body) => self.apply_meta(body),
                DocumentItem::Measure(block) => self.replay_measure(block),
            }
        }

        CompilerOutput {
            meta: self.meta,
            instruments: self.instruments,
            groups: self.groups,
            events: self.events,
            cursors: self.cursors,
            diagnostics: self.diagnostics,
        }
    }

    /// First pass over a document root or a `group` body.
    fn collect_top_level<'a>(
        &mut self,
        tokens: &'a [LocatedToken],
        group: Option<usize>,
        items: &mut Vec<DocumentItem<'a>>,
    ) {
        let mut cursor = TokenCursor::new(tokens);

        while let Some(located) = cursor.peek() {
            match &located.token {
                Token::Symbol(word) => match word.as_str() {
                    "meta" => {
                        cursor.advance();
                        match cursor.capture_block() {
                            Some(body) => items.push(DocumentItem::Meta(body)),
                            None => self.diagnose_at(located, "'meta' without a block"),
                        }
                    }
                    "macro" => {
                        cursor.advance();
                        self.parse_macro(&mut cursor, located);
                    }
                    "group" => {
                        cursor.advance();
                        self.parse_group(&mut cursor, located, items);
                    }
                    "def" => {
                        cursor.advance();
                        self.parse_def(&mut cursor, located, group);
                    }
                    "measure" => {
                        cursor.advance();
                        if let Some(block) = self.parse_measure(&mut cursor, located) {
                            items.push(DocumentItem::Measure(block));
                        }
                    }
                    "omniscore" if cursor.peek_nth(1).map(|t| &t.token) == Some(&Token::LeftBrace) => {
                        cursor.advance();
                        if let Some(body) = cursor.capture_block() {
                            self.collect_nested(body, located, group, items);
                        }
                    }
                    _ => {
                        self.diagnose_at(located, format!("Unexpected '{}' at top level", word));
                        cursor.advance();
                    }
                },
                Token::Str(_) | Token::MacroRef(_) => {
                    self.diagnose_at(
                        located,
                        format!("Unexpected '{}' at top level", located.token.text()),
                    );
                    cursor.advance();
                }
                Token::LeftBrace => {
                    self.diagnose_at(located, "Block without a keyword skipped");
                    cursor.capture_block();
                }
                _ => {
                    cursor.advance();
                }
            }
        }
    }

    /// Walk an `omniscore` or `group` body one level deeper. A body past the
    /// nesting limit is skipped.
    fn collect_nested<'a>(
        &mut self,
        body: &'a [LocatedToken],
        at: &LocatedToken,
        group: Option<usize>,
        items: &mut Vec<DocumentItem<'a>>,
    ) {
        if self.nesting >= self.options.max_nesting_depth {
            let message = format!(
                "Blocks nested deeper than {} levels skipped",
                self.options.max_nesting_depth
            );
            self.diagnose_limit(at, message);
            return;
        }
        self.nesting += 1;
        self.collect_top_level(body, group, items);
        self.nesting -= 1;
    }

    fn instrument_at(&self, id: &str) -> Option<usize> {
        self.instrument_index.get(id).copied()
    }

    fn diagnose_at(&mut self, at: &LocatedToken, message: impl Into<String>) {
        self.push_diagnostic(Diagnostic::warning(at.line, at.column, message));
    }

    /// A hardening limit cut the compilation short
    fn diagnose_limit(&mut self, at: &LocatedToken, message: impl Into<String>) {
        self.push_diagnostic(Diagnostic::error(at.line, at.column, message));
    }

    fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        warn!(
            line = diagnostic.line,
            column = diagnostic.column,
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }
}
