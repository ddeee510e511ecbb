//! Voice streams.
//!
//! After an instrument id (and an optional `:`) a measure holds either a bare
//! stream, which is voice `v1`:
//!
//! ```text
//! pno: c4:4 d e f | dr: k sn k sn
//! ```
//!
//! or a block of voices separated by `|` or introduced by `voiceId:` labels:
//!
//! ```text
//! pno { rh: c5:4 e g c6 | lh: c3:2 g2 }
//! ```
//!
//! A bare stream ends at `|`, a brace, a keyword, or the next instrument id.
//! Inside a block or a macro body a `meta { ... }` is applied where it stands
//! and any other keyword is skipped.
//! Every voice occurrence counts its own local ticks from the start of the
//! measure.

use super::macros::split_arguments;
use super::measure::MeasureContext;
use super::{Compiler, VoiceKey};
use crate::lexer::{LocatedToken, Token, TokenCursor};
use crate::pitch::{
    is_rest, modifier_names, parse_duration, resolve_pitch, split_event_token,
};
use crate::score::{
    quarters_to_ticks, EventKind, Modifier, ModifierArg, NoteEvent, Pitch, Quarters, Tick,
    DEFAULT_VELOCITY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamMode {
    /// After `instrument:` with no braces
    Bare,
    /// Inside `instrument { ... }`
    Block,
    /// A macro body inlined into a voice
    Expansion,
}

#[derive(Debug)]
struct VoiceContext {
    instrument: usize,
    key: VoiceKey,
    measure: u32,
    offset: Tick,
    local_tick: Tick,
}

/// A duration literal: digits, then nothing or a dot. `.stacc` also counts,
/// as a duration position holding only modifiers.
fn is_duration_literal(text: &str) -> bool {
    if text.starts_with('.') {
        return true;
    }
    let digits = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    digits > 0 && (digits == text.len() || text[digits..].starts_with('.'))
}

/// `name:` opening a voice segment. `c4:8` is an event, not a label.
fn voice_label<'a>(cursor: &TokenCursor<'a>) -> Option<&'a str> {
    let Some(Token::Symbol(name)) = cursor.peek_token() else {
        return None;
    };
    if cursor.peek_nth(1).map(|t| &t.token) != Some(&Token::Colon) {
        return None;
    }
    match cursor.peek_nth(2).map(|t| &t.token) {
        Some(Token::Symbol(next)) if is_duration_literal(next) => None,
        _ => Some(name),
    }
}

fn modifier_args(parts: &[&[LocatedToken]]) -> Vec<ModifierArg> {
    parts
        .iter()
        .map(|part| part.iter().map(|t| t.token.text()).collect::<String>())
        .filter(|text| !text.is_empty())
        .map(|text| ModifierArg::parse(&text))
        .collect()
}

impl Compiler<'_> {
    /// Interpret the stream(s) following an instrument id.
    pub(super) fn interpret_voices(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        instrument: usize,
        ctx: MeasureContext,
    ) {
        cursor.eat(&Token::Colon);

        match cursor.capture_block() {
            Some(block) => self.interpret_voice_block(block, instrument, ctx),
            None => {
                let mut voice = self.voice_context(instrument, "v1".to_string(), ctx);
                self.interpret_events(cursor, &mut voice, StreamMode::Bare);
            }
        }
    }

    fn interpret_voice_block(&mut self, tokens: &[LocatedToken], instrument: usize, ctx: MeasureContext) {
        let mut cursor = TokenCursor::new(tokens);
        let mut segment = 0;

        while !cursor.is_at_end() {
            if cursor.eat(&Token::Pipe) {
                continue;
            }
            segment += 1;

            let voice_id = match voice_label(&cursor) {
                Some(label) => {
                    cursor.advance();
                    cursor.advance();
                    label.to_string()
                }
                None => format!("v{}", segment),
            };

            let mut voice = self.voice_context(instrument, voice_id, ctx);
            self.interpret_events(&mut cursor, &mut voice, StreamMode::Block);
        }
    }

    fn voice_context(&self, instrument: usize, voice: String, ctx: MeasureContext) -> VoiceContext {
        VoiceContext {
            instrument,
            key: VoiceKey::new(self.instruments[instrument].id.clone(), voice),
            measure: ctx.index,
            offset: ctx.offset,
            local_tick: 0,
        }
    }

    fn interpret_events(&mut self, cursor: &mut TokenCursor<'_>, voice: &mut VoiceContext, mode: StreamMode) {
        while let Some(located) = cursor.peek() {
            if mode == StreamMode::Block && voice_label(cursor).is_some() {
                break;
            }

            match &located.token {
                Token::Pipe if mode == StreamMode::Expansion => {
                    cursor.advance();
                }
                Token::Pipe => break,
                Token::LeftBrace | Token::RightBrace if mode == StreamMode::Bare => break,
                Token::Symbol(word)
                    if mode == StreamMode::Bare
                        && (located.token.is_reserved() || self.instrument_at(word).is_some()) =>
                {
                    break
                }
                Token::Symbol(_) if located.token.is_symbol("meta") => {
                    cursor.advance();
                    match cursor.capture_block() {
                        Some(body) => self.apply_meta(body),
                        None => self.diagnose_at(located, "'meta' without a block"),
                    }
                }
                Token::Symbol(word) if located.token.is_reserved() => {
                    self.diagnose_at(located, format!("Keyword '{}' in a voice skipped", word));
                    cursor.advance();
                    cursor.capture_block();
                }
                Token::MacroRef(name) => {
                    cursor.advance();
                    let args = split_arguments(cursor);
                    self.expand_macro(name, &args, located, |compiler, expanded| {
                        let mut inner = TokenCursor::new(expanded);
                        compiler.interpret_events(&mut inner, voice, StreamMode::Expansion);
                    });
                }
                Token::LeftBracket => self.parse_chord(cursor, voice),
                Token::Symbol(word) if word.starts_with('.') => {
                    self.diagnose_at(located, format!("Modifier '{}' without an event", word));
                    cursor.advance();
                }
                Token::Symbol(_) => self.parse_note(cursor, voice),
                Token::Comma => {
                    cursor.advance();
                }
                Token::LeftBrace => {
                    self.diagnose_at(located, "Nested block in a voice skipped");
                    cursor.capture_block();
                }
                other => {
                    self.diagnose_at(located, format!("Unexpected '{}' in voice stream", other.text()));
                    cursor.advance();
                }
            }
        }
    }

    /// A note or rest: `c4`, `c4:8`, `c4:8.stacc`, `r:2`, `h.vol(90)`
    fn parse_note(&mut self, cursor: &mut TokenCursor<'_>, voice: &mut VoiceContext) {
        let Some(located) = cursor.advance() else {
            return;
        };
        let Token::Symbol(text) = &located.token else {
            return;
        };

        let (pitch_part, names) = split_event_token(text);
        let mut modifiers = Vec::new();
        self.take_modifiers(cursor, &names, &mut modifiers, located);
        let duration = self.take_duration(cursor, &mut modifiers, false);
        self.take_trailing_modifiers(cursor, &mut modifiers);

        if is_rest(pitch_part) {
            self.emit_event(voice, EventKind::Rest, Vec::new(), duration, modifiers, located);
        } else {
            let pitch = self.resolve_event_pitch(voice, pitch_part, located);
            self.emit_event(voice, EventKind::Note, vec![pitch], duration, modifiers, located);
        }
    }

    /// `[p1 p2 ...]` with an optional `:` before the duration
    fn parse_chord(&mut self, cursor: &mut TokenCursor<'_>, voice: &mut VoiceContext) {
        let Some(open) = cursor.advance() else {
            return;
        };
        let mut pitches = Vec::new();
        let mut modifiers = Vec::new();

        loop {
            let Some(located) = cursor.peek() else {
                self.diagnose_at(open, "Unclosed chord");
                break;
            };
            match &located.token {
                Token::RightBracket => {
                    cursor.advance();
                    break;
                }
                Token::Symbol(text) => {
                    cursor.advance();
                    let (pitch_part, names) = split_event_token(text);
                    self.take_modifiers(cursor, &names, &mut modifiers, located);
                    if is_rest(pitch_part) {
                        self.diagnose_at(located, "Rest inside a chord ignored");
                    } else if !pitch_part.is_empty() {
                        pitches.push(self.resolve_event_pitch(voice, pitch_part, located));
                    }
                }
                Token::Comma => {
                    cursor.advance();
                }
                Token::Pipe | Token::LeftBrace | Token::RightBrace => {
                    self.diagnose_at(open, "Unclosed chord");
                    break;
                }
                other => {
                    self.diagnose_at(located, format!("Unexpected '{}' in chord", other.text()));
                    cursor.advance();
                }
            }
        }

        let duration = self.take_duration(cursor, &mut modifiers, true);
        self.take_trailing_modifiers(cursor, &mut modifiers);
        self.emit_event(voice, EventKind::Chord, pitches, duration, modifiers, open);
    }

    /// Read `:<duration>`; after a chord the colon may be left out.
    fn take_duration(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        modifiers: &mut Vec<Modifier>,
        colon_optional: bool,
    ) -> Option<Quarters> {
        let colon = cursor.peek().filter(|t| t.token == Token::Colon);
        if let Some(colon) = colon {
            cursor.advance();
            match cursor.peek() {
                Some(t) if matches!(&t.token, Token::Symbol(_)) => {}
                _ => {
                    self.diagnose_at(colon, "Missing duration after ':'");
                    return None;
                }
            }
        } else {
            match cursor.peek_token() {
                Some(Token::Symbol(text)) if colon_optional && is_duration_literal(text) => {}
                _ => return None,
            }
        }

        let located = cursor.advance()?;
        let Token::Symbol(text) = &located.token else {
            return None;
        };
        let spec = parse_duration(text);
        if spec.malformed {
            self.diagnose_at(located, format!("Malformed duration '{}'", text));
        }
        self.take_modifiers(cursor, &spec.modifiers, modifiers, located);
        spec.value
    }

    /// `.name` symbols after the event, each with optional `(args)`
    fn take_trailing_modifiers(&mut self, cursor: &mut TokenCursor<'_>, modifiers: &mut Vec<Modifier>) {
        while let Some(located) = cursor.peek() {
            let Token::Symbol(text) = &located.token else {
                break;
            };
            if !text.starts_with('.') {
                break;
            }
            cursor.advance();
            let names = modifier_names(text);
            self.take_modifiers(cursor, &names, modifiers, located);
        }
    }

    /// Turn modifier names into [`Modifier`]s. A `( ... )` right after the
    /// names belongs to the last one.
    fn take_modifiers(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        names: &[&str],
        modifiers: &mut Vec<Modifier>,
        at: &LocatedToken,
    ) {
        let args = if cursor.peek_token() == Some(&Token::LeftParen) {
            Some(modifier_args(&split_arguments(cursor)))
        } else {
            None
        };

        match names.split_last() {
            Some((last, rest)) => {
                modifiers.extend(rest.iter().map(|name| Modifier::from_parts(name, Vec::new())));
                modifiers.push(Modifier::from_parts(last, args.unwrap_or_default()));
            }
            None if args.is_some() => {
                self.diagnose_at(at, "Arguments without a modifier name ignored");
            }
            None => {}
        }
    }

    fn resolve_event_pitch(&mut self, voice: &VoiceContext, text: &str, at: &LocatedToken) -> Pitch {
        let instrument = &self.instruments[voice.instrument];
        let state = self.cursors.entry(voice.key.clone()).or_default();
        if let Some(pitch) = resolve_pitch(text, instrument, &mut state.octave) {
            return pitch;
        }

        let message = format!(
            "Unrecognized pitch '{}' for {} instrument '{}'; using MIDI 60",
            text,
            instrument.style.as_str(),
            instrument.id
        );
        self.diagnose_at(at, message);
        Pitch::nominal()
    }

    fn emit_event(
        &mut self,
        voice: &mut VoiceContext,
        kind: EventKind,
        pitches: Vec<Pitch>,
        explicit_duration: Option<Quarters>,
        modifiers: Vec<Modifier>,
        at: &LocatedToken,
    ) {
        let grace = modifiers.contains(&Modifier::Grace);
        let state = self.cursors.entry(voice.key.clone()).or_default();

        let duration = if grace {
            Quarters::from_integer(0)
        } else {
            if let Some(explicit) = explicit_duration {
                state.duration = explicit;
            }
            state.duration
        };
        let ticks = quarters_to_ticks(duration);
        let tick_start = voice.offset.saturating_add(voice.local_tick);
        let tick_end = tick_start.saturating_add(ticks);
        voice.local_tick = voice.local_tick.saturating_add(ticks);
        if !grace {
            state.tick = tick_end;
        }

        if self.events.len() >= self.options.max_events {
            if !self.event_limit_reached {
                self.event_limit_reached = true;
                let message = format!(
                    "Event limit of {} reached; later events dropped",
                    self.options.max_events
                );
                self.diagnose_limit(at, message);
            }
            return;
        }

        let velocity = modifiers
            .iter()
            .rev()
            .find_map(|m| match m {
                Modifier::Velocity { value } => Some((value / 127.0).clamp(0.0, 1.0) as f32),
                _ => None,
            })
            .unwrap_or(DEFAULT_VELOCITY);

        self.events.push(NoteEvent {
            kind,
            pitches,
            duration,
            tick_start,
            tick_end,
            velocity,
            instrument_id: voice.key.instrument.clone(),
            voice_id: voice.key.voice.clone(),
            measure: voice.measure,
            modifiers,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn test_is_duration_literal() {
        assert!(is_duration_literal("4"));
        assert!(is_duration_literal("16"));
        assert!(is_duration_literal("8."));
        assert!(is_duration_literal("8.vol"));
        assert!(is_duration_literal(".stacc"));
        assert!(!is_duration_literal("3-2"));
        assert!(!is_duration_literal("c4"));
        assert!(!is_duration_literal("t1"));
        assert!(!is_duration_literal(""));
    }

    #[test]
    fn test_voice_label() {
        let tokens = tokenize("rh: c4");
        assert_eq!(voice_label(&TokenCursor::new(&tokens)), Some("rh"));

        let tokens = tokenize("c4:8 d");
        assert_eq!(voice_label(&TokenCursor::new(&tokens)), None);

        let tokens = tokenize("v2: [c e g]");
        assert_eq!(voice_label(&TokenCursor::new(&tokens)), Some("v2"));

        let tokens = tokenize("lh:");
        assert_eq!(voice_label(&TokenCursor::new(&tokens)), Some("lh"));
    }

    #[test]
    fn test_modifier_args() {
        let tokens = tokenize("80, up, -2");
        let parts: Vec<&[LocatedToken]> = tokens.split(|t| t.token == Token::Comma).collect();
        assert_eq!(
            modifier_args(&parts),
            vec![
                ModifierArg::Number(80.0),
                ModifierArg::Text("up".into()),
                ModifierArg::Number(-2.0)
            ]
        );
    }
}
