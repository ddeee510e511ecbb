//! Macro definitions and expansion.
//!
//! ```text
//! macro HatPattern(vel) = { h:8.vol($vel) h h h }
//! ...
//! dr: $HatPattern(80)
//! ```
//!
//! A body is stored as tokens with every `$param` replaced by a slot holding the
//! parameter's index. Any other `$name` stays a literal reference and is
//! expanded when the body is interpreted, so macros may call each other.

use super::Compiler;
use crate::lexer::{LocatedToken, Token, TokenCursor};
use tracing::trace;

/// Total number of expansions per compilation. Bounds the work done by
/// macros that invoke themselves more than once.
pub const MAX_EXPANSIONS: usize = 100_000;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum BodyPart {
    Token(LocatedToken),
    /// Index into the argument list
    Param(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct MacroDef {
    pub params: Vec<String>,
    pub body: Vec<BodyPart>,
}

impl MacroDef {
    fn new(params: Vec<String>, body: &[LocatedToken]) -> Self {
        let body = body
            .iter()
            .map(|t| match &t.token {
                Token::MacroRef(name) => match params.iter().position(|p| p == name) {
                    Some(index) => BodyPart::Param(index),
                    None => BodyPart::Token(t.clone()),
                },
                _ => BodyPart::Token(t.clone()),
            })
            .collect();
        Self { params, body }
    }

    /// Substitute arguments into the body. A missing argument expands to
    /// nothing.
    pub fn expand(&self, args: &[&[LocatedToken]]) -> Vec<LocatedToken> {
        let mut tokens = Vec::with_capacity(self.body.len());
        for part in &self.body {
            match part {
                BodyPart::Token(t) => tokens.push(t.clone()),
                BodyPart::Param(index) => {
                    if let Some(arg) = args.get(*index) {
                        tokens.extend_from_slice(arg);
                    }
                }
            }
        }
        tokens
    }
}

/// Read an optional `( ... )` argument list after a macro reference or a
/// modifier name. Arguments are split on commas outside nested parentheses
/// and brackets. `()` is an empty list.
pub(super) fn split_arguments<'a>(cursor: &mut TokenCursor<'a>) -> Vec<&'a [LocatedToken]> {
    match cursor.capture_parens() {
        Some(inner) => split_top_level(inner),
        None => Vec::new(),
    }
}

fn split_top_level(tokens: &[LocatedToken]) -> Vec<&[LocatedToken]> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, t) in tokens.iter().enumerate() {
        match t.token {
            Token::LeftParen | Token::LeftBracket => depth += 1,
            Token::RightParen | Token::RightBracket => depth = depth.saturating_sub(1),
            Token::Comma if depth == 0 => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}

impl Compiler<'_> {
    /// `macro Name(p1, p2) = { body }`, with the cursor just past `macro`.
    /// The parameter list and the `=` are optional.
    pub(super) fn parse_macro(&mut self, cursor: &mut TokenCursor<'_>, keyword: &LocatedToken) {
        let name = match cursor.peek_token() {
            Some(Token::Symbol(name)) if !cursor.peek().is_some_and(|t| t.token.is_reserved()) => {
                cursor.advance();
                name.clone()
            }
            _ => {
                self.diagnose_at(keyword, "'macro' without a name");
                return;
            }
        };

        let mut params: Vec<String> = Vec::new();
        if let Some(list) = cursor.capture_parens() {
            for param in list {
                let param_name = match &param.token {
                    Token::Symbol(s) | Token::MacroRef(s) => s,
                    _ => continue,
                };
                if params.contains(param_name) {
                    self.diagnose_at(
                        param,
                        format!("Duplicate parameter '{}' in macro '{}'", param_name, name),
                    );
                } else {
                    params.push(param_name.clone());
                }
            }
        }

        cursor.eat(&Token::Equals);

        let Some(body) = cursor.capture_block() else {
            self.diagnose_at(keyword, format!("Macro '{}' has no body", name));
            return;
        };

        let def = MacroDef::new(params, body);
        if self.macros.insert(name.clone(), def).is_some() {
            self.diagnose_at(keyword, format!("Macro '{}' redefined", name));
        }
    }

    /// Expand `$name(args)` and hand the tokens to `interpret`. Unknown names,
    /// nesting beyond the depth limit and invocations past the expansion
    /// budget are skipped.
    pub(super) fn expand_macro<F>(
        &mut self,
        name: &str,
        args: &[&[LocatedToken]],
        at: &LocatedToken,
        interpret: F,
    ) where
        F: FnOnce(&mut Self, &[LocatedToken]),
    {
        if !self.macros.contains_key(name) {
            self.diagnose_at(at, format!("Unknown macro '${}'", name));
            return;
        }

        if self.macro_depth >= self.options.max_macro_depth {
            if self.depth_reported.insert(name.to_string()) {
                let message = format!(
                    "Macro '${}' exceeds the nesting limit of {}; invocation skipped",
                    name, self.options.max_macro_depth
                );
                self.diagnose_limit(at, message);
            }
            return;
        }

        if self.expansions >= MAX_EXPANSIONS {
            if !self.expansion_budget_reported {
                self.expansion_budget_reported = true;
                let message = format!(
                    "More than {} macro expansions; later invocations skipped",
                    MAX_EXPANSIONS
                );
                self.diagnose_limit(at, message);
            }
            return;
        }

        let (expanded, arity) = match self.macros.get(name) {
            Some(def) => (def.expand(args), def.params.len()),
            None => return,
        };
        if args.len() > arity {
            let message = format!(
                "Macro '${}' takes {} argument(s), got {}; extra arguments ignored",
                name,
                arity,
                args.len()
            );
            self.diagnose_at(at, message);
        }
        self.expansions += 1;
        trace!(
            name,
            depth = self.macro_depth,
            tokens = expanded.len(),
            "expanding macro"
        );

        self.macro_depth += 1;
        interpret(self, &expanded);
        self.macro_depth -= 1;
    }
}
