//! `assignment → comparison ( := assignment )?`
//! `comparison → picker ( (.. | ~) picker )*`
//!
//! Named for the grammar's own level, not for the `=`-family comparison
//! operators — those live one level down, in `filter`.

use crate::internal::ast::{BinaryOp, Expr};
use crate::internal::errors::{ErrorHandler, ErrorKind};
use crate::internal::matches::match_any;
use crate::internal::parse_picker::picker;
use crate::internal::tokens::{Token, TokenKind};

pub fn assignment(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    let left = comparison(tokens, pos, errors)?;
    if let Some(assign_tok) = match_any(tokens, pos, &[TokenKind::Assign]) {
        let (line, column) = (assign_tok.line, assign_tok.column);
        let value = assignment(tokens, pos, errors)?;
        return match left {
            Expr::Variable(name) => Some(Expr::Assign(name, Box::new(value))),
            _ => {
                errors.report(
                    ErrorKind::Parser,
                    line,
                    column,
                    "left-hand side of ':=' must be a variable",
                );
                None
            }
        };
    }
    Some(left)
}

pub fn comparison(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    let mut left = picker(tokens, pos, errors)?;
    while let Some(tok) = match_any(tokens, pos, &[TokenKind::Range, TokenKind::Default]) {
        let op = if tok.kind == TokenKind::Range {
            BinaryOp::Range
        } else {
            BinaryOp::DefaultOp
        };
        let right = picker(tokens, pos, errors)?;
        left = Expr::Binary(Box::new(left), op, Box::new(right));
    }
    Some(left)
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
        assignment(&tokens, &mut pos, &mut errors)
    }

    #[test]
    fn assignment_binds_a_variable() {
        assert_eq!(
            parse("x := 2").unwrap(),
            Expr::Assign("x".to_string(), Box::new(Expr::Literal(Literal::Int(2))))
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        let expr = parse("x := y := 1").unwrap();
        match expr {
            Expr::Assign(name, value) => {
                assert_eq!(name, "x");
                assert!(matches!(*value, Expr::Assign(_, _)));
            }
            other => panic!("expected Assign, got {other:?}"),
        }
    }

    #[test]
    fn range_produces_binary_range_node() {
        assert_eq!(
            parse("1..6").unwrap(),
            Expr::Binary(
                Box::new(Expr::Literal(Literal::Int(1))),
                BinaryOp::Range,
                Box::new(Expr::Literal(Literal::Int(6))),
            )
        );
    }

    #[test]
    fn default_operator_is_left_associative() {
        assert!(matches!(
            parse("a ~ b").unwrap(),
            Expr::Binary(_, BinaryOp::DefaultOp, _)
        ));
    }
}
