//! Consuming advance over the token stream.

use crate::internal::peek::is_at_end;
use crate::internal::tokens::Token;

/// Consumes and returns the token at `pos`, then advances `pos` — unless
/// already at `EOF`, which is never consumed past.
pub fn advance<'a>(tokens: &'a [Token], pos: &mut usize) -> &'a Token {
    if !is_at_end(tokens, *pos) {
        *pos += 1;
    }
    previous(tokens, *pos)
}

/// The token just consumed by the most recent [`advance`].
pub fn previous(tokens: &[Token], pos: usize) -> &Token {
    tokens.get(pos.saturating_sub(1)).unwrap_or(&tokens[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::tokens::TokenKind;

    #[test]
    fn advance_moves_forward_and_returns_consumed_token() {
        let tokens = vec![
            Token::new(TokenKind::Integer, "1", None, 1, 0),
            Token::eof(1, 1),
        ];
        let mut pos = 0;
        let consumed = advance(&tokens, &mut pos);
        assert_eq!(consumed.kind, TokenKind::Integer);
        assert_eq!(pos, 1);
    }

    #[test]
    fn advance_at_eof_does_not_move_past_it() {
        let tokens = vec![Token::eof(1, 0)];
        let mut pos = 0;
        advance(&tokens, &mut pos);
        advance(&tokens, &mut pos);
        assert_eq!(pos, 0);
    }
}
