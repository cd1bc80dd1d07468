//! `filter → samples ( (=|=/=|<|<=|>|>=) factor )*`
//! `samples → diceroll ( # expression )?`
//! `diceroll → d primary | primary ( d primary )?`

use crate::internal::ast::{BinaryOp, DiceKind, Expr, UnaryOp};
use crate::internal::errors::ErrorHandler;
use crate::internal::matches::match_any;
use crate::internal::parse_expression::expression;
use crate::internal::parse_primary::primary;
use crate::internal::parse_term::factor;
use crate::internal::tokens::{Token, TokenKind};

pub fn filter(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    let mut left = samples(tokens, pos, errors)?;
    while let Some(tok) = match_any(
        tokens,
        pos,
        &[
            TokenKind::Equal,
            TokenKind::NotEqual,
            TokenKind::LessThan,
            TokenKind::LessThanOrEqual,
            TokenKind::GreaterThan,
            TokenKind::GreaterThanOrEqual,
        ],
    ) {
        let op = match tok.kind {
            TokenKind::Equal => BinaryOp::Equal,
            TokenKind::NotEqual => BinaryOp::NotEqual,
            TokenKind::LessThan => BinaryOp::LessThan,
            TokenKind::LessThanOrEqual => BinaryOp::LessThanOrEqual,
            TokenKind::GreaterThan => BinaryOp::GreaterThan,
            _ => BinaryOp::GreaterThanOrEqual,
        };
        let right = factor(tokens, pos, errors)?;
        left = Expr::Binary(Box::new(left), op, Box::new(right));
    }
    Some(left)
}

pub fn samples(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    let left = diceroll(tokens, pos, errors)?;
    if match_any(tokens, pos, &[TokenKind::Samples]).is_some() {
        let right = expression(tokens, pos, errors)?;
        return Some(Expr::Binary(Box::new(left), BinaryOp::Samples, Box::new(right)));
    }
    Some(left)
}

pub fn diceroll(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    if let Some(tok) = match_any(tokens, pos, &[TokenKind::Dice]) {
        let kind = dice_kind(tok);
        let n = primary(tokens, pos, errors)?;
        return Some(Expr::Unary(UnaryOp::Dice(kind), Box::new(n)));
    }
    let left = primary(tokens, pos, errors)?;
    if let Some(tok) = match_any(tokens, pos, &[TokenKind::Dice]) {
        let kind = dice_kind(tok);
        let right = primary(tokens, pos, errors)?;
        return Some(Expr::Binary(Box::new(left), BinaryOp::Dice(kind), Box::new(right)));
    }
    Some(left)
}

fn dice_kind(tok: &Token) -> DiceKind {
    if tok.lexeme.eq_ignore_ascii_case("z") {
        DiceKind::ZeroBased
    } else {
        DiceKind::Standard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::lexer::Lexer;
    use crate::internal::tokens::Literal;

    fn parse(src: &str) -> Option<Expr> {
        let mut errors = ErrorHandler::new();
        let tokens = Lexer::new(src).scan_tokens(&mut errors);
        let mut pos = 0;
        filter(&tokens, &mut pos, &mut errors)
    }

    #[test]
    fn unary_dice_is_a_single_roll() {
        assert_eq!(
            parse("d6").unwrap(),
            Expr::Unary(
                UnaryOp::Dice(DiceKind::Standard),
                Box::new(Expr::Literal(Literal::Int(6)))
            )
        );
    }

    #[test]
    fn binary_dice_carries_the_roll_count() {
        assert_eq!(
            parse("4d6").unwrap(),
            Expr::Binary(
                Box::new(Expr::Literal(Literal::Int(4))),
                BinaryOp::Dice(DiceKind::Standard),
                Box::new(Expr::Literal(Literal::Int(6))),
            )
        );
    }

    #[test]
    fn zero_based_dice_uses_z() {
        assert_eq!(
            parse("z10").unwrap(),
            Expr::Unary(
                UnaryOp::Dice(DiceKind::ZeroBased),
                Box::new(Expr::Literal(Literal::Int(10)))
            )
        );
    }

    #[test]
    fn comparison_applies_to_samples_level() {
        assert_eq!(
            parse("d6<3").unwrap(),
            Expr::Binary(
                Box::new(Expr::Unary(
                    UnaryOp::Dice(DiceKind::Standard),
                    Box::new(Expr::Literal(Literal::Int(6)))
                )),
                BinaryOp::LessThan,
                Box::new(Expr::Literal(Literal::Int(3))),
            )
        );
    }
}
