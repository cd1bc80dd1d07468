//! Source text → token stream (§4.1).
//!
//! A single forward pass over the characters, maintaining `start`,
//! `current`, `line`, and `column` the way the specification describes.
//! Column is the character offset of `start` from the beginning of its
//! line (the spec says "byte offset"; trill tracks characters instead,
//! which coincide for the ASCII-only syntax the grammar actually uses —
//! multi-byte UTF-8 only ever appears inside string literal bodies, which
//! are never re-parsed).

use crate::internal::ast::TextAlignOp;
use crate::internal::errors::{ErrorHandler, ErrorKind};
use crate::internal::tokens::{Literal, Token, TokenKind};

pub struct Lexer<'a> {
    source: Vec<char>,
    start: usize,
    current: usize,
    line: usize,
    column: usize,
    start_column: usize,
    _input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            source: input.chars().collect(),
            start: 0,
            current: 0,
            line: 1,
            column: 0,
            start_column: 0,
            _input: input,
        }
    }

    pub fn scan_tokens(mut self, errors: &mut ErrorHandler) -> Vec<Token> {
        let mut tokens = Vec::new();
        while !self.is_at_end() {
            self.start = self.current;
            self.start_column = self.column;
            if let Some(token) = self.scan_token(errors) {
                tokens.push(token);
            }
        }
        tokens.push(Token::eof(self.line, self.column));
        tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn make(&self, kind: TokenKind) -> Option<Token> {
        Some(Token::new(kind, self.lexeme(), None, self.line, self.start_column))
    }

    fn make_literal(&self, kind: TokenKind, literal: Literal) -> Option<Token> {
        Some(Token::new(
            kind,
            self.lexeme(),
            Some(literal),
            self.line,
            self.start_column,
        ))
    }

    fn error(&self, errors: &mut ErrorHandler, message: impl Into<String>) -> Option<Token> {
        errors.report(ErrorKind::Scanner, self.line, self.start_column, message);
        None
    }

    fn scan_token(&mut self, errors: &mut ErrorHandler) -> Option<Token> {
        let c = self.advance();
        match c {
            ' ' | '\t' | '\r' => None,
            '\n' => {
                self.line += 1;
                self.column = 0;
                None
            }
            '\\' => {
                while self.peek() != '\n' && !self.is_at_end() {
                    self.advance();
                }
                None
            }
            '(' => self.make(TokenKind::LParen),
            ')' => self.make(TokenKind::RParen),
            '{' => self.make(TokenKind::LBracket),
            '}' => self.make(TokenKind::RBracket),
            '[' => self.make(TokenKind::LSquare),
            ']' => self.make(TokenKind::RSquare),
            ',' => self.make(TokenKind::Comma),
            ';' => self.make(TokenKind::Semicolon),
            '+' => self.make(TokenKind::Plus),
            '-' => {
                if self.match_char('-') {
                    self.make(TokenKind::MinusMinus)
                } else {
                    self.make(TokenKind::Minus)
                }
            }
            '*' => self.make(TokenKind::Multiply),
            '/' => self.make(TokenKind::Divide),
            '~' => self.make(TokenKind::Default),
            '#' => self.make(TokenKind::Samples),
            '@' => self.make(TokenKind::Union),
            '&' => self.make(TokenKind::And),
            '!' => self.make(TokenKind::Not),
            '?' => self.make(TokenKind::Probability),
            '\'' => self.make(TokenKind::Textbox),
            '%' => {
                if self.match_char('1') {
                    self.make_literal(TokenKind::PairValue, Literal::Int(1))
                } else if self.match_char('2') {
                    self.make_literal(TokenKind::PairValue, Literal::Int(2))
                } else {
                    self.error(errors, format!("unexpected character: %{}", self.peek()))
                }
            }
            '.' => {
                if self.match_char('.') {
                    self.make(TokenKind::Range)
                } else {
                    self.error(errors, "unexpected character: .")
                }
            }
            ':' => {
                if self.match_char('=') {
                    self.make(TokenKind::Assign)
                } else {
                    self.error(errors, "unexpected character: :")
                }
            }
            '=' => {
                if self.match_char('/') {
                    if self.match_char('=') {
                        self.make(TokenKind::NotEqual)
                    } else {
                        self.error(errors, "malformed operator: =/")
                    }
                } else {
                    self.make(TokenKind::Equal)
                }
            }
            '<' => {
                if self.match_char('=') {
                    self.make(TokenKind::LessThanOrEqual)
                } else if self.match_char('>') {
                    self.make(TokenKind::TextAlign)
                } else if self.match_char('|') {
                    self.make(TokenKind::TextAlign)
                } else {
                    self.make(TokenKind::LessThan)
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.make(TokenKind::GreaterThanOrEqual)
                } else {
                    self.make(TokenKind::GreaterThan)
                }
            }
            '|' => {
                if self.match_char('>') {
                    self.make(TokenKind::TextAlign)
                } else if self.match_char('|') {
                    self.make(TokenKind::TextAlign)
                } else {
                    self.error(errors, "unexpected character: |")
                }
            }
            '"' => self.string(errors),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() => self.identifier(),
            other => self.error(errors, format!("unexpected character: {other}")),
        }
    }

    fn string(&mut self, errors: &mut ErrorHandler) -> Option<Token> {
        let mut content = String::new();
        while self.peek() != '"' && !self.is_at_end() {
            let c = self.advance();
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            }
            if c == '\\' {
                match self.peek() {
                    'n' => {
                        self.advance();
                        content.push('\n');
                        continue;
                    }
                    '"' => {
                        self.advance();
                        content.push('"');
                        continue;
                    }
                    '\\' => {
                        self.advance();
                        content.push('\\');
                        continue;
                    }
                    _ => {}
                }
            }
            content.push(c);
        }
        if self.is_at_end() {
            return self.error(errors, "unterminated string");
        }
        self.advance(); // closing quote
        self.make_literal(TokenKind::String, Literal::Str(content))
    }

    fn number(&mut self) -> Option<Token> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        let mut is_float = false;
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let lexeme = self.lexeme();
        if is_float {
            let value: f64 = lexeme.parse().expect("scanned float literal is well-formed");
            self.make_literal(TokenKind::Float, Literal::Float(value))
        } else {
            let value: i64 = lexeme.parse().expect("scanned integer literal is well-formed");
            self.make_literal(TokenKind::Integer, Literal::Int(value))
        }
    }

    /// Identifiers are letters only (§4.1): digits never extend one, so
    /// that `4d6`'s `d` is never swallowed into a longer identifier. A
    /// maximal run of letters that happens to be exactly `d`/`D`/`z`/`Z`/`U`
    /// is retokenized as the corresponding operator — by construction this
    /// can only happen when the run is not immediately followed by another
    /// letter, matching the spec's lookahead rule for free.
    fn identifier(&mut self) -> Option<Token> {
        while self.peek().is_alphabetic() {
            self.advance();
        }
        let text = self.lexeme();
        match text.as_str() {
            "d" | "D" => {
                return self.make(TokenKind::Dice);
            }
            "z" | "Z" => {
                return self.make(TokenKind::Dice);
            }
            "U" => return self.make(TokenKind::Union),
            _ => {}
        }
        let kind = match text.as_str() {
            "sum" => TokenKind::Sum,
            "sgn" => TokenKind::Sign,
            "count" => TokenKind::Count,
            "choose" => TokenKind::Choose,
            "pick" => TokenKind::Pick,
            "min" => TokenKind::Min,
            "max" => TokenKind::Max,
            "minimal" => TokenKind::Minimal,
            "maximal" => TokenKind::Maximal,
            "median" => TokenKind::Median,
            "different" => TokenKind::Different,
            "drop" => TokenKind::Drop,
            "keep" => TokenKind::Keep,
            "largest" => TokenKind::Largest,
            "least" => TokenKind::Least,
            "mod" => TokenKind::Modulo,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "else" => TokenKind::Else,
            "foreach" => TokenKind::Foreach,
            "in" => TokenKind::In,
            "do" => TokenKind::Do,
            "repeat" => TokenKind::Repeat,
            "while" => TokenKind::While,
            "until" => TokenKind::Until,
            "accumulate" => TokenKind::Accumulate,
            "function" => TokenKind::Function,
            "call" => TokenKind::Call,
            "compositional" => TokenKind::Compositional,
            _ => TokenKind::Identifier,
        };
        self.make(kind)
    }
}

/// Maps a `TextAlign` token's lexeme back to its [`TextAlignOp`] (the
/// scanner doesn't distinguish the four spellings at the token-kind level,
/// since the parser needs the lexeme anyway to report errors).
pub fn text_align_op(lexeme: &str) -> TextAlignOp {
    match lexeme {
        "|>" => TextAlignOp::LeftStack,
        "<|" => TextAlignOp::RightStack,
        "<>" => TextAlignOp::CenterStack,
        "||" => TextAlignOp::SideBySide,
        other => unreachable!("lexer never emits TextAlign for {other:?}"),
    }
}
