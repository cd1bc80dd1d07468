//! Conditional single-token consumption: the `(a|b|c)` alternatives that
//! appear throughout the grammar in §4.2.

use crate::internal::next::advance;
use crate::internal::peek::peek_kind;
use crate::internal::tokens::{Token, TokenKind};

/// If the next token's kind is one of `kinds`, consumes it and returns it;
/// otherwise leaves `pos` untouched and returns `None`.
pub fn match_any<'a>(tokens: &'a [Token], pos: &mut usize, kinds: &[TokenKind]) -> Option<&'a Token> {
    if kinds.contains(&peek_kind(tokens, *pos)) {
        Some(advance(tokens, pos))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_one_of_several_kinds_and_consumes() {
        let tokens = vec![
            Token::new(TokenKind::Plus, "+", None, 1, 0),
            Token::eof(1, 1),
        ];
        let mut pos = 0;
        let got = match_any(&tokens, &mut pos, &[TokenKind::Plus, TokenKind::Minus]);
        assert!(got.is_some());
        assert_eq!(pos, 1);
    }

    #[test]
    fn leaves_position_untouched_on_mismatch() {
        let tokens = vec![
            Token::new(TokenKind::Multiply, "*", None, 1, 0),
            Token::eof(1, 1),
        ];
        let mut pos = 0;
        let got = match_any(&tokens, &mut pos, &[TokenKind::Plus]);
        assert!(got.is_none());
        assert_eq!(pos, 0);
    }
}
