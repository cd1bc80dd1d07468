//! `picker → combination ( (drop|keep|pick|--) combination )*`
//! `combination → term ( (U|&) term )*`

use crate::internal::ast::{BinaryOp, Expr};
use crate::internal::errors::ErrorHandler;
use crate::internal::matches::match_any;
use crate::internal::parse_term::term;
use crate::internal::tokens::{Token, TokenKind};

pub fn picker(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    let mut left = combination(tokens, pos, errors)?;
    while let Some(tok) = match_any(
        tokens,
        pos,
        &[
            TokenKind::Drop,
            TokenKind::Keep,
            TokenKind::Pick,
            TokenKind::MinusMinus,
        ],
    ) {
        let op = match tok.kind {
            TokenKind::Drop => BinaryOp::Drop,
            TokenKind::Keep => BinaryOp::Keep,
            TokenKind::Pick => BinaryOp::Pick,
            _ => BinaryOp::Difference,
        };
        let right = combination(tokens, pos, errors)?;
        left = Expr::Binary(Box::new(left), op, Box::new(right));
    }
    Some(left)
}

pub fn combination(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    let mut left = term(tokens, pos, errors)?;
    while let Some(tok) = match_any(tokens, pos, &[TokenKind::Union, TokenKind::And]) {
        let op = if tok.kind == TokenKind::Union {
            BinaryOp::Union
        } else {
            BinaryOp::And
        };
        let right = term(tokens, pos, errors)?;
        left = Expr::Binary(Box::new(left), op, Box::new(right));
    }
    Some(left)
}
