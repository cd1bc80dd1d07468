//! `term → factor ( (+|-) factor )*`
//! `factor → unary ( (*|/|mod) unary )*`

use crate::internal::ast::{BinaryOp, Expr};
use crate::internal::errors::ErrorHandler;
use crate::internal::matches::match_any;
use crate::internal::parse_unary::unary;
use crate::internal::tokens::{Token, TokenKind};

pub fn term(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    let mut left = factor(tokens, pos, errors)?;
    while let Some(tok) = match_any(tokens, pos, &[TokenKind::Plus, TokenKind::Minus]) {
        let op = if tok.kind == TokenKind::Plus {
            BinaryOp::Add
        } else {
            BinaryOp::Sub
        };
        let right = factor(tokens, pos, errors)?;
        left = Expr::Binary(Box::new(left), op, Box::new(right));
    }
    Some(left)
}

pub fn factor(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    let mut left = unary(tokens, pos, errors)?;
    while let Some(tok) = match_any(
        tokens,
        pos,
        &[TokenKind::Multiply, TokenKind::Divide, TokenKind::Modulo],
    ) {
        let op = match tok.kind {
            TokenKind::Multiply => BinaryOp::Mul,
            TokenKind::Divide => BinaryOp::Div,
            _ => BinaryOp::Mod,
        };
        let right = unary(tokens, pos, errors)?;
        left = Expr::Binary(Box::new(left), op, Box::new(right));
    }
    Some(left)
}
