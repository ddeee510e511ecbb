//! `group` and `def` declarations.
//!
//! ```text
//! group "Rhythm" bracket=square {
//!     def gtr "Guitar" style=tab tuning=[d2 a2 d3 g3 b3 e4]
//!     def dr "Drums" style=grid map=gm_kit
//! }
//! def pno "Piano" clef=treble patch=0
//! ```

use super::{Compiler, DocumentItem};
use crate::lexer::{LocatedToken, Token, TokenCursor};
use crate::pitch::{builtin_map, parse_tuning};
use crate::score::{GroupDef, InstrumentDef, StaffStyle};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
enum AttributeValue {
    Text(String),
    List(Vec<String>),
}

impl AttributeValue {
    fn items(&self) -> Vec<String> {
        match self {
            AttributeValue::Text(s) => vec![s.clone()],
            AttributeValue::List(items) => items.clone(),
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            AttributeValue::List(_) => None,
        }
    }

    fn to_display(&self) -> String {
        match self {
            AttributeValue::Text(s) => s.clone(),
            AttributeValue::List(items) => format!("[{}]", items.join(" ")),
        }
    }
}

struct Attribute<'a> {
    key: &'a str,
    value: AttributeValue,
    at: &'a LocatedToken,
}

impl Compiler<'_> {
    /// `def id ["Label"] key=value...`, with the cursor just past `def`.
    pub(super) fn parse_def(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        keyword: &LocatedToken,
        group: Option<usize>,
    ) {
        let id = match cursor.peek() {
            Some(t) if !t.token.is_reserved() => match &t.token {
                Token::Symbol(id) => {
                    cursor.advance();
                    id.clone()
                }
                _ => {
                    self.diagnose_at(keyword, "'def' without an instrument id");
                    return;
                }
            },
            _ => {
                self.diagnose_at(keyword, "'def' without an instrument id");
                return;
            }
        };

        let mut def = InstrumentDef::new(id);
        if let Some(Token::Str(label)) = cursor.peek_token() {
            cursor.advance();
            def.label = label.clone();
        }
        def.group = group.map(|g| self.groups[g].label.clone());

        for attribute in self.read_attributes(cursor) {
            self.apply_instrument_attribute(&mut def, attribute);
        }

        self.register_instrument(def, group, keyword);
    }

    /// `group "Label" key=value... { ... }`, with the cursor just past `group`.
    /// The body is walked like the document root, so nested `def`s join the
    /// group.
    pub(super) fn parse_group<'a>(
        &mut self,
        cursor: &mut TokenCursor<'a>,
        keyword: &LocatedToken,
        items: &mut Vec<DocumentItem<'a>>,
    ) {
        let label = match cursor.peek_token() {
            Some(Token::Str(label)) => {
                cursor.advance();
                label.clone()
            }
            Some(Token::Symbol(label))
                if cursor.peek().is_some_and(|t| !t.token.is_reserved())
                    && cursor.peek_nth(1).map(|n| &n.token) != Some(&Token::Equals) =>
            {
                cursor.advance();
                label.clone()
            }
            _ => {
                self.diagnose_at(keyword, "'group' without a label");
                String::new()
            }
        };

        let attributes: BTreeMap<String, String> = self
            .read_attributes(cursor)
            .into_iter()
            .map(|a| (a.key.to_string(), a.value.to_display()))
            .collect();

        let index = self.groups.len();
        self.groups.push(GroupDef {
            label,
            attributes,
            members: Vec::new(),
        });

        match cursor.capture_block() {
            Some(body) => self.collect_nested(body, keyword, Some(index), items),
            None => self.diagnose_at(keyword, "'group' without a block"),
        }
    }

    /// Scan `key=value` pairs. Stops at the first token that is not a
    /// non-reserved symbol followed by `=`.
    fn read_attributes<'a>(&mut self, cursor: &mut TokenCursor<'a>) -> Vec<Attribute<'a>> {
        let mut attributes = Vec::new();

        loop {
            let Some(at) = cursor.peek() else { break };
            let Token::Symbol(key) = &at.token else { break };
            if at.token.is_reserved() || cursor.peek_nth(1).map(|t| &t.token) != Some(&Token::Equals) {
                break;
            }
            cursor.advance();
            cursor.advance();

            match read_attribute_value(cursor) {
                Some(value) => attributes.push(Attribute { key, value, at }),
                None => self.diagnose_at(at, format!("Attribute '{}' has no value", key)),
            }
        }

        attributes
    }

    fn apply_instrument_attribute(&mut self, def: &mut InstrumentDef, attribute: Attribute<'_>) {
        let Attribute { key, value, at } = attribute;

        match key {
            "style" => {
                let style = value.as_text().and_then(StaffStyle::from_name);
                match style {
                    Some(style) => def.style = style,
                    None => {
                        def.style = StaffStyle::Standard;
                        self.diagnose_at(
                            at,
                            format!("Unknown style '{}'; using standard", value.to_display()),
                        );
                    }
                }
            }
            "clef" => def.clef = Some(value.to_display()),
            "patch" => def.patch = Some(value.to_display()),
            "label" => def.label = value.to_display(),
            "transpose" => match value.as_text().and_then(|v| v.parse::<i32>().ok()) {
                Some(semitones) => def.transpose = semitones,
                None => self.diagnose_at(
                    at,
                    format!("Invalid transpose '{}'", value.to_display()),
                ),
            },
            "vol" | "pan" => match value.as_text().and_then(parse_finite) {
                Some(amount) if key == "vol" => def.volume = amount,
                Some(amount) => def.pan = amount,
                None => self.diagnose_at(
                    at,
                    format!("Invalid {} '{}'", key, value.to_display()),
                ),
            },
            "map" => match value.as_text().filter(|name| builtin_map(name).is_some()) {
                Some(name) => def.map = Some(name.to_string()),
                None => self.diagnose_at(
                    at,
                    format!("Unknown percussion map '{}'; ignored", value.to_display()),
                ),
            },
            "tuning" => match parse_tuning(&value.items()) {
                Some(tuning) => def.tuning = tuning,
                None => self.diagnose_at(
                    at,
                    format!("Invalid tuning '{}'", value.to_display()),
                ),
            },
            _ => self.diagnose_at(
                at,
                format!("Unknown attribute '{}' on instrument '{}'", key, def.id),
            ),
        }
    }

    /// Add an instrument, or replace an earlier one with the same id in place.
    fn register_instrument(&mut self, def: InstrumentDef, group: Option<usize>, at: &LocatedToken) {
        let id = def.id.clone();

        match self.instrument_at(&id) {
            Some(index) => {
                self.instruments[index] = def;
                for g in &mut self.groups {
                    g.members.retain(|member| member != &id);
                }
                self.diagnose_at(at, format!("Instrument '{}' redefined", id));
            }
            None => {
                self.instrument_index.insert(id.clone(), self.instruments.len());
                self.instruments.push(def);
            }
        }

        if let Some(g) = group {
            self.groups[g].members.push(id);
        }
    }
}

fn read_attribute_value(cursor: &mut TokenCursor<'_>) -> Option<AttributeValue> {
    let located = cursor.peek()?;
    match &located.token {
        Token::Symbol(s) if !located.token.is_reserved() => {
            cursor.advance();
            Some(AttributeValue::Text(s.clone()))
        }
        Token::Str(s) => {
            cursor.advance();
            Some(AttributeValue::Text(s.clone()))
        }
        Token::LeftBracket => {
            cursor.advance();
            let mut items = Vec::new();
            while let Some(t) = cursor.peek() {
                match &t.token {
                    Token::RightBracket => {
                        cursor.advance();
                        break;
                    }
                    Token::Symbol(s) | Token::Str(s) if !t.token.is_reserved() => {
                        items.push(s.clone());
                        cursor.advance();
                    }
                    Token::Comma => {
                        cursor.advance();
                    }
                    _ => break,
                }
            }
            Some(AttributeValue::List(items))
        }
        _ => None,
    }
}

fn parse_finite(text: &str) -> Option<f32> {
    text.parse::<f32>().ok().filter(|v| v.is_finite())
}
