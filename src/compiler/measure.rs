//! Measure blocks: `measure <n> { ... }` and `measure <start>-<end> { ... }`.
//!
//! The body is captured in the first pass and replayed once per index. Each
//! replay starts at `(index - 1) * ticks_per_measure`, with the measure length
//! taken from the time signature in force when that replay begins.

use super::Compiler;
use crate::lexer::{LocatedToken, Token, TokenCursor};
use crate::score::Tick;
use tracing::trace;

/// Highest measure index honored; larger indices are clamped.
pub const MAX_MEASURE_INDEX: u32 = 100_000;

#[derive(Debug, Clone)]
pub(super) struct MeasureBlock<'a> {
    pub start: u32,
    pub end: u32,
    pub body: &'a [LocatedToken],
}

/// Where the measure being replayed sits on the timeline
#[derive(Debug, Clone, Copy)]
pub(super) struct MeasureContext {
    pub index: u32,
    pub offset: Tick,
}

/// `"4"` -> (4, 4), `"1-8"` -> (1, 8)
fn parse_range(text: &str) -> Option<(u64, u64)> {
    match text.split_once('-') {
        Some((start, end)) => Some((start.parse().ok()?, end.parse().ok()?)),
        None => {
            let index = text.parse().ok()?;
            Some((index, index))
        }
    }
}

impl Compiler<'_> {
    /// Read a measure header and capture its body, with the cursor just past
    /// `measure`. A malformed header still consumes the body.
    pub(super) fn parse_measure<'a>(
        &mut self,
        cursor: &mut TokenCursor<'a>,
        keyword: &LocatedToken,
    ) -> Option<MeasureBlock<'a>> {
        // `1-4`, `1 -4` and `1 - 4` all arrive as symbols
        let mut header = String::new();
        while let Some(t) = cursor.peek() {
            match &t.token {
                Token::Symbol(s) if !t.token.is_reserved() => {
                    header.push_str(s);
                    cursor.advance();
                }
                _ => break,
            }
        }

        let body = cursor.capture_block();

        let Some((start, end)) = parse_range(&header).filter(|(start, end)| *start > 0 && *end > 0) else {
            self.diagnose_at(keyword, format!("Malformed measure header '{}'", header));
            return None;
        };
        let Some(body) = body else {
            self.diagnose_at(keyword, format!("Measure {} has no body", header));
            return None;
        };

        if start > end {
            self.diagnose_at(keyword, format!("Measure range {} is empty", header));
            return None;
        }

        let clamp = |index: u64| index.min(MAX_MEASURE_INDEX as u64) as u32;
        if end > MAX_MEASURE_INDEX as u64 {
            self.diagnose_at(
                keyword,
                format!("Measure index above {} clamped", MAX_MEASURE_INDEX),
            );
        }

        Some(MeasureBlock {
            start: clamp(start),
            end: clamp(end),
            body,
        })
    }

    pub(super) fn replay_measure(&mut self, block: &MeasureBlock<'_>) {
        for index in block.start..=block.end {
            let ticks_per_measure = self.meta.time_signature.ticks_per_measure();
            let offset = (index as Tick - 1).saturating_mul(ticks_per_measure);
            trace!(index, offset, "replaying measure");
            self.interpret_measure(block.body, MeasureContext { index, offset });
        }
    }

    /// Interpret measure content: voice streams, `meta` blocks and macro
    /// references. Anything else is skipped.
    pub(super) fn interpret_measure(&mut self, tokens: &[LocatedToken], ctx: MeasureContext) {
        let mut cursor = TokenCursor::new(tokens);

        while let Some(located) = cursor.peek() {
            match &located.token {
                Token::Symbol(word) => {
                    cursor.advance();
                    if let Some(instrument) = self.instrument_at(word) {
                        self.interpret_voices(&mut cursor, instrument, ctx);
                    } else if word == "meta" {
                        match cursor.capture_block() {
                            Some(body) => self.apply_meta(body),
                            None => self.diagnose_at(located, "'meta' without a block"),
                        }
                    } else if matches!(cursor.peek_token(), Some(Token::Colon) | Some(Token::LeftBrace)) {
                        self.diagnose_at(located, format!("Unknown instrument '{}'", word));
                        cursor.eat(&Token::Colon);
                        cursor.capture_block();
                    }
                }
                Token::MacroRef(name) => {
                    cursor.advance();
                    let args = super::macros::split_arguments(&mut cursor);
                    self.expand_macro(name, &args, located, |compiler, expanded| {
                        compiler.interpret_measure(expanded, ctx)
                    });
                }
                Token::LeftBrace => {
                    cursor.capture_block();
                }
                _ => {
                    cursor.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("3"), Some((3, 3)));
        assert_eq!(parse_range("1-8"), Some((1, 8)));
        assert_eq!(parse_range("5-2"), Some((5, 2)));
        assert_eq!(parse_range("a-b"), None);
        assert_eq!(parse_range(""), None);
        assert_eq!(parse_range("1-"), None);
    }
}
