//! Mandatory single-token consumption, with the sentinel-absence error
//! policy from §4.2: never panics, reports into the shared error handler,
//! and returns `None` for the caller to propagate.

use crate::internal::errors::{ErrorHandler, ErrorKind};
use crate::internal::next::advance;
use crate::internal::peek::{check, peek};
use crate::internal::tokens::{Token, TokenKind};

pub fn expect<'a>(
    tokens: &'a [Token],
    pos: &mut usize,
    kind: TokenKind,
    errors: &mut ErrorHandler,
) -> Option<&'a Token> {
    if check(tokens, *pos, kind) {
        Some(advance(tokens, pos))
    } else {
        let found = peek(tokens, *pos);
        errors.report(
            ErrorKind::Parser,
            found.line,
            found.column,
            format!("expected {kind}, found {}", describe(found)),
        );
        None
    }
}

fn describe(token: &Token) -> String {
    if token.kind == TokenKind::Eof {
        "end of input".to_string()
    } else {
        format!("{} '{}'", token.kind, token.lexeme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_consumes_matching_kind() {
        let tokens = vec![
            Token::new(TokenKind::LParen, "(", None, 1, 0),
            Token::eof(1, 1),
        ];
        let mut pos = 0;
        let mut errors = ErrorHandler::new();
        let got = expect(&tokens, &mut pos, TokenKind::LParen, &mut errors);
        assert!(got.is_some());
        assert_eq!(pos, 1);
        assert!(!errors.is_fatal());
    }

    #[test]
    fn expect_reports_and_returns_none_on_mismatch() {
        let tokens = vec![
            Token::new(TokenKind::Semicolon, ";", None, 1, 3),
            Token::eof(1, 4),
        ];
        let mut pos = 0;
        let mut errors = ErrorHandler::new();
        let got = expect(&tokens, &mut pos, TokenKind::RParen, &mut errors);
        assert!(got.is_none());
        assert!(errors.is_fatal());
        assert_eq!(pos, 0);
    }
}
