//! `expression → if | accumulate | repeat | foreach | assignment`

use crate::internal::ast::{Expr, RepeatKind};
use crate::internal::errors::{ErrorHandler, ErrorKind};
use crate::internal::expect::expect;
use crate::internal::matches::match_any;
use crate::internal::parse_assignment::assignment;
use crate::internal::peek::peek;
use crate::internal::tokens::{Token, TokenKind};

pub fn expression(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    match peek(tokens, *pos).kind {
        TokenKind::If => if_expr(tokens, pos, errors),
        TokenKind::Accumulate => accumulate_expr(tokens, pos, errors),
        TokenKind::Repeat => repeat_expr(tokens, pos, errors),
        TokenKind::Foreach => foreach_expr(tokens, pos, errors),
        _ => assignment(tokens, pos, errors),
    }
}

fn if_expr(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    expect(tokens, pos, TokenKind::If, errors)?;
    let cond = expression(tokens, pos, errors)?;
    expect(tokens, pos, TokenKind::Then, errors)?;
    let then_branch = expression(tokens, pos, errors)?;
    expect(tokens, pos, TokenKind::Else, errors)?;
    let else_branch = expression(tokens, pos, errors)?;
    Some(Expr::Conditional(
        Box::new(cond),
        Box::new(then_branch),
        Box::new(else_branch),
    ))
}

fn foreach_expr(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    expect(tokens, pos, TokenKind::Foreach, errors)?;
    let var = expect(tokens, pos, TokenKind::Identifier, errors)?.lexeme.clone();
    expect(tokens, pos, TokenKind::In, errors)?;
    let source = expression(tokens, pos, errors)?;
    expect(tokens, pos, TokenKind::Do, errors)?;
    let body = expression(tokens, pos, errors)?;
    Some(Expr::Foreach {
        var,
        source: Box::new(source),
        body: Box::new(body),
    })
}

/// `repeat x := action while/until q` — `action` is parsed as the bound
/// variable's assignment so the interpreter can both re-run it each
/// iteration and read `x` back out once the loop ends (§4.3, "returns the
/// final value of `x`").
fn repeat_expr(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    expect(tokens, pos, TokenKind::Repeat, errors)?;
    let var = expect(tokens, pos, TokenKind::Identifier, errors)?.lexeme.clone();
    expect(tokens, pos, TokenKind::Assign, errors)?;
    let action = expression(tokens, pos, errors)?;
    let kind = if let Some(tok) = match_any(tokens, pos, &[TokenKind::While, TokenKind::Until]) {
        if tok.kind == TokenKind::While {
            RepeatKind::While
        } else {
            RepeatKind::Until
        }
    } else {
        let found = peek(tokens, *pos);
        errors.report(
            ErrorKind::Parser,
            found.line,
            found.column,
            "expected 'while' or 'until' after a repeat action",
        );
        return None;
    };
    let qualifier = expression(tokens, pos, errors)?;
    Some(Expr::Repeat {
        kind,
        action: Box::new(Expr::Assign(var, Box::new(action))),
        qualifier: Box::new(qualifier),
    })
}

fn accumulate_expr(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    expect(tokens, pos, TokenKind::Accumulate, errors)?;
    let var = expect(tokens, pos, TokenKind::Identifier, errors)?.lexeme.clone();
    expect(tokens, pos, TokenKind::Assign, errors)?;
    let action = expression(tokens, pos, errors)?;
    expect(tokens, pos, TokenKind::While, errors)?;
    let qualifier = expression(tokens, pos, errors)?;
    Some(Expr::Accumulate {
        action: Box::new(Expr::Assign(var, Box::new(action))),
        qualifier: Box::new(qualifier),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::lexer::Lexer;
    use crate::internal::tokens::Literal;

    fn parse(src: &str) -> (Option<Expr>, ErrorHandler) {
        let mut errors = ErrorHandler::new();
        let tokens = Lexer::new(src).scan_tokens(&mut errors);
        let mut pos = 0;
        let expr = expression(&tokens, &mut pos, &mut errors);
        (expr, errors)
    }

    #[test]
    fn if_then_else() {
        let (expr, errors) = parse("if 1 then 2 else 3");
        assert!(!errors.is_fatal());
        assert_eq!(
            expr,
            Some(Expr::Conditional(
                Box::new(Expr::Literal(Literal::Int(1))),
                Box::new(Expr::Literal(Literal::Int(2))),
                Box::new(Expr::Literal(Literal::Int(3))),
            ))
        );
    }

    #[test]
    fn foreach_binds_the_loop_variable() {
        let (expr, errors) = parse("foreach x in {1,2,3} do x");
        assert!(!errors.is_fatal());
        match expr {
            Some(Expr::Foreach { var, .. }) => assert_eq!(var, "x"),
            other => panic!("expected Foreach, got {other:?}"),
        }
    }

    #[test]
    fn repeat_until_stores_action_as_assignment() {
        let (expr, errors) = parse("repeat x := d8 until x < 8");
        assert!(!errors.is_fatal());
        match expr {
            Some(Expr::Repeat { kind, action, .. }) => {
                assert_eq!(kind, RepeatKind::Until);
                assert!(matches!(*action, Expr::Assign(ref name, _) if name == "x"));
            }
            other => panic!("expected Repeat, got {other:?}"),
        }
    }

    #[test]
    fn accumulate_requires_while() {
        let (expr, errors) = parse("accumulate x := 1 until x < 8");
        assert!(expr.is_none());
        assert!(errors.is_fatal());
    }
}
