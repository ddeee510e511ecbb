//! `meta { key: value, ... }`
//!
//! Colons and commas are optional. Values are symbols, quoted strings, or a
//! bracketed list (`time: [3,4]`), which is read back as its concatenated text.

use super::Compiler;
use crate::lexer::{LocatedToken, Token, TokenCursor};
use crate::score::TimeSignature;

impl Compiler<'_> {
    pub(super) fn apply_meta(&mut self, body: &[LocatedToken]) {
        let mut cursor = TokenCursor::new(body);

        while let Some(located) = cursor.advance() {
            let key = match &located.token {
                Token::Symbol(s) | Token::Str(s) => s.as_str(),
                _ => continue,
            };
            cursor.eat(&Token::Colon);

            let Some(value) = read_meta_value(&mut cursor) else {
                self.diagnose_at(located, format!("Meta key '{}' has no value", key));
                continue;
            };
            cursor.eat(&Token::Comma);

            self.set_meta(key, &value, located);
        }
    }

    fn set_meta(&mut self, key: &str, value: &str, at: &LocatedToken) {
        match key {
            "title" => self.meta.title = value.to_string(),
            "composer" => self.meta.composer = value.to_string(),
            "key" => self.meta.key = value.to_string(),
            "tempo" => match value.trim().parse::<u32>() {
                Ok(tempo) if tempo > 0 => self.meta.tempo = tempo,
                _ => {
                    let message = format!(
                        "Invalid tempo '{}'; keeping {}",
                        value, self.meta.tempo
                    );
                    self.diagnose_at(at, message);
                }
            },
            "time" => match TimeSignature::parse(value) {
                Some(time_signature) => self.meta.time_signature = time_signature,
                None => {
                    self.meta.time_signature = TimeSignature::default();
                    self.diagnose_at(
                        at,
                        format!("Invalid time signature '{}'; using 4/4", value),
                    );
                }
            },
            _ => self.diagnose_at(at, format!("Unknown meta key '{}'", key)),
        }
    }
}

fn read_meta_value(cursor: &mut TokenCursor<'_>) -> Option<String> {
    match cursor.peek_token()? {
        Token::Str(s) | Token::Symbol(s) => {
            cursor.advance();
            Some(s.clone())
        }
        Token::LeftBracket => {
            let mut text = String::new();
            while let Some(t) = cursor.advance() {
                text.push_str(&t.token.text());
                if t.token == Token::RightBracket {
                    break;
                }
            }
            Some(text)
        }
        _ => None,
    }
}
