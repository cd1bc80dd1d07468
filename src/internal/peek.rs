//! Non-consuming lookahead over the token stream.

use crate::internal::tokens::{Token, TokenKind};

/// The token at `pos`, or the trailing `EOF` if `pos` has run past the end.
pub fn peek<'a>(tokens: &'a [Token], pos: usize) -> &'a Token {
    tokens
        .get(pos)
        .unwrap_or_else(|| tokens.last().expect("token stream always ends with EOF"))
}

pub fn peek_kind(tokens: &[Token], pos: usize) -> TokenKind {
    peek(tokens, pos).kind
}

pub fn check(tokens: &[Token], pos: usize, kind: TokenKind) -> bool {
    peek_kind(tokens, pos) == kind
}

pub fn is_at_end(tokens: &[Token], pos: usize) -> bool {
    check(tokens, pos, TokenKind::Eof)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::tokens::Literal;

    fn sample() -> Vec<Token> {
        vec![
            Token::new(TokenKind::Integer, "1", Some(Literal::Int(1)), 1, 0),
            Token::new(TokenKind::Plus, "+", None, 1, 2),
            Token::eof(1, 3),
        ]
    }

    #[test]
    fn peek_past_end_returns_eof() {
        let tokens = sample();
        assert_eq!(peek_kind(&tokens, 99), TokenKind::Eof);
    }

    #[test]
    fn check_matches_kind_at_position() {
        let tokens = sample();
        assert!(check(&tokens, 1, TokenKind::Plus));
        assert!(!check(&tokens, 1, TokenKind::Minus));
    }

    #[test]
    fn is_at_end_true_only_on_eof() {
        let tokens = sample();
        assert!(!is_at_end(&tokens, 0));
        assert!(is_at_end(&tokens, 2));
    }
}
