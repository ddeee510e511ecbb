/// Token types for the OmniScore language
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LeftBrace,    // {
    RightBrace,   // }
    Pipe,         // |
    Comma,        // ,
    LeftBracket,  // [
    RightBracket, // ]
    Equals,       // =
    LeftParen,    // (
    RightParen,   // )
    Colon,        // :

    /// Double-quoted string, quotes stripped
    Str(String),
    /// `$name`, stored without the `$`
    MacroRef(String),
    /// Run of alphanumerics and `. - + # _`
    Symbol(String),
}

impl Token {
    /// Source-like text of the token. Strings come back unquoted.
    pub fn text(&self) -> String {
        match self {
            Token::LeftBrace => "{".to_string(),
            Token::RightBrace => "}".to_string(),
            Token::Pipe => "|".to_string(),
            Token::Comma => ",".to_string(),
            Token::LeftBracket => "[".to_string(),
            Token::RightBracket => "]".to_string(),
            Token::Equals => "=".to_string(),
            Token::LeftParen => "(".to_string(),
            Token::RightParen => ")".to_string(),
            Token::Colon => ":".to_string(),
            Token::Str(s) | Token::Symbol(s) => s.clone(),
            Token::MacroRef(name) => format!("${}", name),
        }
    }

    pub fn is_symbol(&self, word: &str) -> bool {
        matches!(self, Token::Symbol(s) if s == word)
    }

    /// Words and braces that end attribute scanning in `def` and `group`.
    pub fn is_reserved(&self) -> bool {
        match self {
            Token::LeftBrace | Token::RightBrace => true,
            Token::Symbol(s) => matches!(
                s.as_str(),
                "def" | "group" | "measure" | "meta" | "macro"
            ),
            _ => false,
        }
    }
}

/// A token with its position in the source
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedToken {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

/// Lexer for tokenizing OmniScore source code
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
    position: usize,
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '#' | '_')
}

fn is_macro_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
            position: 0,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn remaining(&self) -> &'a str {
        let input = self.input;
        &input[self.position..]
    }

    fn skip_line_comment(&mut self) {
        while let Some(&c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Collect characters while `pred` holds, starting at the current position.
    fn take_while(&mut self, pred: fn(char) -> bool) -> &'a str {
        let start = self.position;
        while let Some(&c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.advance();
        }
        let input = self.input;
        &input[start..self.position]
    }

    /// Tokenize the whole input. Never fails: characters that start no token
    /// are dropped.
    pub fn tokenize(&mut self) -> Vec<LocatedToken> {
        let mut tokens = Vec::new();

        while let Some(&c) = self.peek() {
            let line = self.line;
            let column = self.column;

            if self.remaining().starts_with("//") {
                self.skip_line_comment();
                continue;
            }

            let token = match c {
                '{' => Token::LeftBrace,
                '}' => Token::RightBrace,
                '|' => Token::Pipe,
                ',' => Token::Comma,
                '[' => Token::LeftBracket,
                ']' => Token::RightBracket,
                '=' => Token::Equals,
                '(' => Token::LeftParen,
                ')' => Token::RightParen,
                ':' => Token::Colon,
                '"' => {
                    // Only a terminated string is a token; a stray quote is dropped.
                    match self.remaining()[1..].find(['"', '\n']) {
                        Some(end) if self.remaining()[1..].as_bytes()[end] == b'"' => {
                            self.advance();
                            let content = self.take_while(|ch| ch != '"');
                            self.advance();
                            tokens.push(LocatedToken {
                                token: Token::Str(content.to_string()),
                                line,
                                column,
                            });
                        }
                        _ => {
                            self.advance();
                        }
                    }
                    continue;
                }
                '$' => {
                    self.advance();
                    let name = self.take_while(is_macro_name_char);
                    if !name.is_empty() {
                        tokens.push(LocatedToken {
                            token: Token::MacroRef(name.to_string()),
                            line,
                            column,
                        });
                    }
                    continue;
                }
                c if is_symbol_char(c) => {
                    let run = self.take_while(is_symbol_char);
                    tokens.push(LocatedToken {
                        token: Token::Symbol(run.to_string()),
                        line,
                        column,
                    });
                    continue;
                }
                _ => {
                    self.advance();
                    continue;
                }
            };

            self.advance();
            tokens.push(LocatedToken {
                token,
                line,
                column,
            });
        }

        tokens
    }
}

/// Tokenize a source string.
pub fn tokenize(source: &str) -> Vec<LocatedToken> {
    Lexer::new(source).tokenize()
}

/// Copyable read position over a token slice.
///
/// Measure replay and macro inlining fork a cursor instead of sharing one
/// mutable index, so a replay can never disturb the position of its caller.
#[derive(Debug, Clone, Copy)]
pub struct TokenCursor<'a> {
    tokens: &'a [LocatedToken],
    position: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [LocatedToken]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn peek(&self) -> Option<&'a LocatedToken> {
        self.tokens.get(self.position)
    }

    pub fn peek_nth(&self, n: usize) -> Option<&'a LocatedToken> {
        self.tokens.get(self.position + n)
    }

    pub fn peek_token(&self) -> Option<&'a Token> {
        self.peek().map(|t| &t.token)
    }

    pub fn advance(&mut self) -> Option<&'a LocatedToken> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Consume the next token if it equals `expected`.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.peek_token() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// Position of the next token, or of the last one when at the end.
    pub fn location(&self) -> (usize, usize) {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| (t.line, t.column))
            .unwrap_or((1, 1))
    }

    /// With the cursor on a `{`, return the tokens up to the matching `}` and
    /// move past it. A missing close brace takes everything to the end.
    /// Returns `None` (without moving) when the next token is not `{`.
    pub fn capture_block(&mut self) -> Option<&'a [LocatedToken]> {
        self.capture_between(&Token::LeftBrace, &Token::RightBrace)
    }

    /// Same as [`capture_block`](Self::capture_block) for `( ... )`.
    pub fn capture_parens(&mut self) -> Option<&'a [LocatedToken]> {
        self.capture_between(&Token::LeftParen, &Token::RightParen)
    }

    fn capture_between(&mut self, open: &Token, close: &Token) -> Option<&'a [LocatedToken]> {
        if self.peek_token() != Some(open) {
            return None;
        }
        self.position += 1;
        let start = self.position;
        let mut depth = 1usize;
        while let Some(t) = self.tokens.get(self.position) {
            if &t.token == open {
                depth += 1;
            } else if &t.token == close {
                depth -= 1;
                if depth == 0 {
                    let inner = &self.tokens[start..self.position];
                    self.position += 1;
                    return Some(inner);
                }
            }
            self.position += 1;
        }
        Some(&self.tokens[start..])
    }
}
