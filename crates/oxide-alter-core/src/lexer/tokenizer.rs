//! Character-level scanning of DDL text into [`Token`]s.

use super::{Keyword, Span, Token, TokenKind};

/// Single-character tokens that never combine with what follows.
fn single(c: char) -> Option<TokenKind> {
    Some(match c {
        '(' => TokenKind::LeftParen,
        ')' => TokenKind::RightParen,
        ',' => TokenKind::Comma,
        ';' => TokenKind::Semicolon,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        '~' => TokenKind::BitNot,
        '&' => TokenKind::BitAnd,
        '?' => TokenKind::Question,
        '@' => TokenKind::At,
        ':' => TokenKind::Colon,
        '$' => TokenKind::Dollar,
        _ => return None,
    })
}

/// Two-character operators.
fn pair(first: char, second: char) -> Option<TokenKind> {
    Some(match (first, second) {
        ('=', '=') => TokenKind::Eq,
        ('<', '=') => TokenKind::LtEq,
        ('<', '>') | ('!', '=') => TokenKind::NotEq,
        ('<', '<') => TokenKind::LeftShift,
        ('>', '=') => TokenKind::GtEq,
        ('>', '>') => TokenKind::RightShift,
        ('|', '|') => TokenKind::Concat,
        _ => return None,
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Splits DDL text into tokens.
///
/// Lexing never fails outright: a malformed literal becomes a
/// [`TokenKind::Error`] token and scanning carries on after it.
pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `source`.
    #[must_use]
    pub const fn new(source: &'a str) -> Self {
        Self { source, offset: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn current(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn lookahead(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.current()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        let matched = self.current() == Some(expected);
        if matched {
            self.bump();
        }
        matched
    }

    fn bump_while(&mut self, keep: impl Fn(char) -> bool) {
        while self.current().is_some_and(&keep) {
            self.bump();
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            self.bump_while(char::is_whitespace);
            let rest = self.rest();
            if rest.starts_with("--") {
                self.bump_while(|c| c != '\n');
            } else if rest.starts_with("/*") {
                // An unclosed block comment runs to the end of input.
                self.offset = rest[2..]
                    .find("*/")
                    .map_or(self.source.len(), |end| self.offset + 2 + end + 2);
            } else {
                return;
            }
        }
    }

    /// Reads up to the `close` delimiter, the opening one already consumed.
    /// With `doubling`, two closing delimiters in a row stand for one.
    /// Returns `None` when the input ends first.
    fn delimited(&mut self, close: char, doubling: bool) -> Option<String> {
        let mut text = String::new();
        loop {
            let c = self.bump()?;
            if c != close {
                text.push(c);
            } else if doubling && self.eat(close) {
                text.push(close);
            } else {
                return Some(text);
            }
        }
    }

    fn word(&self, start: usize) -> TokenKind {
        let text = &self.source[start..self.offset];
        Keyword::lookup(text).map_or_else(
            || TokenKind::Identifier(text.to_string()),
            TokenKind::Keyword,
        )
    }

    /// Scans the rest of a number whose first character was consumed.
    fn number(&mut self, start: usize) -> TokenKind {
        let leading_dot = self.source[start..].starts_with('.');
        if &self.source[start..self.offset] == "0" && matches!(self.current(), Some('x' | 'X')) {
            self.bump();
            self.bump_while(|c| c.is_ascii_hexdigit());
            return TokenKind::Number(self.source[start..self.offset].to_string());
        }

        self.bump_while(|c| c.is_ascii_digit());
        if !leading_dot && self.eat('.') {
            self.bump_while(|c| c.is_ascii_digit());
        }
        if matches!(self.current(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.current(), Some('+' | '-')) {
                self.bump();
            }
            if !self.current().is_some_and(|c| c.is_ascii_digit()) {
                return TokenKind::Error(String::from("Invalid number: missing exponent digits"));
            }
            self.bump_while(|c| c.is_ascii_digit());
        }
        TokenKind::Number(self.source[start..self.offset].to_string())
    }

    /// Scans the hex digits and closing quote of `X'...'`.
    fn blob(&mut self) -> TokenKind {
        let Some(end) = self.rest().find('\'') else {
            self.offset = self.source.len();
            return TokenKind::Error(String::from("Unterminated blob literal"));
        };
        let digits = &self.rest()[..end];
        self.offset += end + 1;

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return TokenKind::Error(String::from("Invalid character in blob literal"));
        }
        if digits.len() % 2 != 0 {
            return TokenKind::Error(String::from("Odd number of hex digits in blob literal"));
        }
        let bytes = (0..digits.len())
            .step_by(2)
            .filter_map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
            .collect();
        TokenKind::Blob(bytes)
    }

    fn quoted(&mut self, close: char, doubling: bool, unterminated: &str) -> TokenKind {
        match self.delimited(close, doubling) {
            Some(text) if close == '\'' => TokenKind::String(text),
            Some(text) => TokenKind::QuotedIdentifier(text),
            None => TokenKind::Error(String::from(unterminated)),
        }
    }

    /// Scans the next token. Returns [`TokenKind::Eof`] at the end of input,
    /// and keeps returning it.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let start = self.offset;
        let kind = match self.bump() {
            None => TokenKind::Eof,
            Some(c) => self.scan(c, start),
        };
        Token::new(kind, Span::new(start, self.offset))
    }

    fn scan(&mut self, c: char, start: usize) -> TokenKind {
        if let Some(kind) = self.current().and_then(|next| pair(c, next)) {
            self.bump();
            return kind;
        }
        if let Some(kind) = single(c) {
            return kind;
        }

        match c {
            '=' => TokenKind::Eq,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '|' => TokenKind::BitOr,
            '\'' => self.quoted('\'', true, "Unterminated string literal"),
            '"' => self.quoted('"', true, "Unterminated quoted identifier"),
            '`' => self.quoted('`', true, "Unterminated quoted identifier"),
            '[' => self.quoted(']', false, "Unterminated quoted identifier"),
            'x' | 'X' if self.eat('\'') => self.blob(),
            '.' if self.current().is_some_and(|n| n.is_ascii_digit()) => self.number(start),
            '.' => TokenKind::Dot,
            c if c.is_ascii_digit() => self.number(start),
            c if c.is_alphabetic() || c == '_' => {
                self.bump_while(is_word_char);
                self.word(start)
            }
            c => TokenKind::Error(format!("Unexpected character: {c}")),
        }
    }

    /// Scans the whole input. The last token is always [`TokenKind::Eof`].
    #[must_use]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is_eof();
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }
}
