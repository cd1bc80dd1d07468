//! `unary → call | (-|?) qualifier | qualifier`
//! `qualifier → (largest|least) expression diceroll`
//! `           | (choose|count|sum|sgn|min|max|different|minimal|maximal|median|%1|%2|!) qualifier`
//! `           | filter`

use crate::internal::ast::{BinaryOp, Expr, UnaryOp};
use crate::internal::errors::{ErrorHandler, ErrorKind};
use crate::internal::expect::expect;
use crate::internal::matches::match_any;
use crate::internal::next::advance;
use crate::internal::parse_expression::expression;
use crate::internal::parse_filter::{diceroll, filter};
use crate::internal::peek::check;
use crate::internal::tokens::{Literal, Token, TokenKind};

pub fn unary(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    if check(tokens, *pos, TokenKind::Call) {
        return call(tokens, pos, errors);
    }
    if let Some(tok) = match_any(tokens, pos, &[TokenKind::Minus, TokenKind::Probability]) {
        let op = if tok.kind == TokenKind::Minus {
            UnaryOp::Neg
        } else {
            UnaryOp::Probability
        };
        let right = qualifier(tokens, pos, errors)?;
        return Some(Expr::Unary(op, Box::new(right)));
    }
    qualifier(tokens, pos, errors)
}

fn call(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    advance(tokens, pos); // `call`
    let name = expect(tokens, pos, TokenKind::Identifier, errors)?.lexeme.clone();
    expect(tokens, pos, TokenKind::LParen, errors)?;
    let mut args = Vec::new();
    if !check(tokens, *pos, TokenKind::RParen) {
        args.push(expression(tokens, pos, errors)?);
        while match_any(tokens, pos, &[TokenKind::Comma]).is_some() {
            args.push(expression(tokens, pos, errors)?);
        }
    }
    expect(tokens, pos, TokenKind::RParen, errors)?;
    Some(Expr::Call { name, args })
}

const PREFIX_AGGREGATES: &[TokenKind] = &[
    TokenKind::Choose,
    TokenKind::Count,
    TokenKind::Sum,
    TokenKind::Sign,
    TokenKind::Min,
    TokenKind::Max,
    TokenKind::Different,
    TokenKind::Minimal,
    TokenKind::Maximal,
    TokenKind::Median,
    TokenKind::PairValue,
    TokenKind::Not,
];

pub fn qualifier(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    if let Some(tok) = match_any(tokens, pos, &[TokenKind::Largest, TokenKind::Least]) {
        let op = if tok.kind == TokenKind::Largest {
            BinaryOp::Largest
        } else {
            BinaryOp::Least
        };
        let count = expression(tokens, pos, errors)?;
        let target = diceroll(tokens, pos, errors)?;
        return Some(Expr::Binary(Box::new(count), op, Box::new(target)));
    }
    if let Some(tok) = match_any(tokens, pos, PREFIX_AGGREGATES) {
        let op = unary_op_for(tok)?;
        let right = qualifier(tokens, pos, errors)?;
        return Some(Expr::Unary(op, Box::new(right)));
    }
    filter(tokens, pos, errors)
}

fn unary_op_for(tok: &Token) -> Option<UnaryOp> {
    match tok.kind {
        TokenKind::Choose => Some(UnaryOp::Choose),
        TokenKind::Count => Some(UnaryOp::Count),
        TokenKind::Sum => Some(UnaryOp::Sum),
        TokenKind::Sign => Some(UnaryOp::Sgn),
        TokenKind::Min => Some(UnaryOp::Min),
        TokenKind::Max => Some(UnaryOp::Max),
        TokenKind::Different => Some(UnaryOp::Different),
        TokenKind::Minimal => Some(UnaryOp::Minimal),
        TokenKind::Maximal => Some(UnaryOp::Maximal),
        TokenKind::Median => Some(UnaryOp::Median),
        TokenKind::Not => Some(UnaryOp::Not),
        TokenKind::PairValue => match tok.literal {
            Some(Literal::Int(1)) => Some(UnaryOp::Pair1),
            Some(Literal::Int(2)) => Some(UnaryOp::Pair2),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::lexer::Lexer;

    fn parse(src: &str) -> (Option<Expr>, ErrorHandler) {
        let mut errors = ErrorHandler::new();
        let tokens = Lexer::new(src).scan_tokens(&mut errors);
        let mut pos = 0;
        let expr = unary(&tokens, &mut pos, &mut errors);
        (expr, errors)
    }

    #[test]
    fn sum_wraps_its_operand() {
        let (expr, errors) = parse("sum 4d6");
        assert!(!errors.is_fatal());
        assert!(matches!(expr, Some(Expr::Unary(UnaryOp::Sum, _))));
    }

    #[test]
    fn largest_takes_a_count_and_a_diceroll() {
        let (expr, errors) = parse("largest 3 4d6");
        assert!(!errors.is_fatal());
        match expr {
            Some(Expr::Binary(_, BinaryOp::Largest, _)) => {}
            other => panic!("expected Largest binary node, got {other:?}"),
        }
    }

    #[test]
    fn pair_accessors_are_distinguished() {
        let (first, _) = parse("%1 [1,2]");
        let (second, _) = parse("%2 [1,2]");
        assert!(matches!(first, Some(Expr::Unary(UnaryOp::Pair1, _))));
        assert!(matches!(second, Some(Expr::Unary(UnaryOp::Pair2, _))));
    }

    #[test]
    fn call_parses_name_and_argument_list() {
        let (expr, errors) = parse("call f(1,2)");
        assert!(!errors.is_fatal());
        match expr {
            Some(Expr::Call { name, args }) => {
                assert_eq!(name, "f");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }
}
