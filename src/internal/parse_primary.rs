//! `primary → INT | FLOAT | STRING | IDENT | ( expr ) | ( expr ; expr ; … ) | { list } | [ pair ]`

use crate::internal::ast::Expr;
use crate::internal::errors::{ErrorHandler, ErrorKind};
use crate::internal::expect::expect;
use crate::internal::matches::match_any;
use crate::internal::next::advance;
use crate::internal::parse_expression::expression;
use crate::internal::peek::{check, peek};
use crate::internal::tokens::{Token, TokenKind};

pub fn primary(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    let kind = peek(tokens, *pos).kind;
    match kind {
        TokenKind::Integer | TokenKind::Float | TokenKind::String => {
            let token = advance(tokens, pos);
            Some(Expr::Literal(
                token.literal.clone().expect("literal token carries a literal"),
            ))
        }
        TokenKind::Identifier => {
            let token = advance(tokens, pos);
            Some(Expr::Variable(token.lexeme.clone()))
        }
        TokenKind::LParen => grouping_or_block(tokens, pos, errors),
        TokenKind::LSquare => pair(tokens, pos, errors),
        TokenKind::LBracket => list(tokens, pos, errors),
        _ => {
            let found = peek(tokens, *pos);
            errors.report(
                ErrorKind::Parser,
                found.line,
                found.column,
                format!("expected an expression, found {} '{}'", found.kind, found.lexeme),
            );
            None
        }
    }
}

/// `( expr )` is a [`Expr::Grouping`]; `( expr ; expr ; … )` is a
/// [`Expr::Block`] — the two are distinguished only by whether a `;`
/// separates more than one sub-expression (§4.2 "Key edge cases").
fn grouping_or_block(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    expect(tokens, pos, TokenKind::LParen, errors)?;
    let mut exprs = vec![expression(tokens, pos, errors)?];
    while match_any(tokens, pos, &[TokenKind::Semicolon]).is_some() {
        if check(tokens, *pos, TokenKind::RParen) {
            break;
        }
        exprs.push(expression(tokens, pos, errors)?);
    }
    expect(tokens, pos, TokenKind::RParen, errors)?;
    if exprs.len() == 1 {
        Some(Expr::Grouping(Box::new(exprs.remove(0))))
    } else {
        Some(Expr::Block(exprs))
    }
}

fn pair(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    expect(tokens, pos, TokenKind::LSquare, errors)?;
    let first = expression(tokens, pos, errors)?;
    expect(tokens, pos, TokenKind::Comma, errors)?;
    let second = expression(tokens, pos, errors)?;
    expect(tokens, pos, TokenKind::RSquare, errors)?;
    Some(Expr::Pair(Box::new(first), Box::new(second)))
}

/// `{ }` is a list; items are full expressions, so `{1..6}` holds a single
/// `Range` expression that the interpreter splices flat when it evaluates
/// the list (see the `Expr::List` arm of `internal::interpreter::eval_expr`).
fn list(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    expect(tokens, pos, TokenKind::LBracket, errors)?;
    let mut items = Vec::new();
    if !check(tokens, *pos, TokenKind::RBracket) {
        items.push(expression(tokens, pos, errors)?);
        while match_any(tokens, pos, &[TokenKind::Comma]).is_some() {
            items.push(expression(tokens, pos, errors)?);
        }
    }
    expect(tokens, pos, TokenKind::RBracket, errors)?;
    Some(Expr::List(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::lexer::Lexer;
    use crate::internal::tokens::Literal;

    fn parse_primary(src: &str) -> (Option<Expr>, ErrorHandler) {
        let mut errors = ErrorHandler::new();
        let tokens = Lexer::new(src).scan_tokens(&mut errors);
        let mut pos = 0;
        let expr = primary(&tokens, &mut pos, &mut errors);
        (expr, errors)
    }

    #[test]
    fn integer_literal() {
        let (expr, errors) = parse_primary("42");
        assert_eq!(expr, Some(Expr::Literal(Literal::Int(42))));
        assert!(!errors.is_fatal());
    }

    #[test]
    fn grouping_single_expression() {
        let (expr, _) = parse_primary("(1)");
        assert_eq!(
            expr,
            Some(Expr::Grouping(Box::new(Expr::Literal(Literal::Int(1)))))
        );
    }

    #[test]
    fn semicolon_separated_parens_is_a_block() {
        let (expr, _) = parse_primary("(1;2;3)");
        assert_eq!(
            expr,
            Some(Expr::Block(vec![
                Expr::Literal(Literal::Int(1)),
                Expr::Literal(Literal::Int(2)),
                Expr::Literal(Literal::Int(3)),
            ]))
        );
    }

    #[test]
    fn bracket_pair() {
        let (expr, _) = parse_primary("[1,2]");
        assert_eq!(
            expr,
            Some(Expr::Pair(
                Box::new(Expr::Literal(Literal::Int(1))),
                Box::new(Expr::Literal(Literal::Int(2)))
            ))
        );
    }

    #[test]
    fn brace_list_may_be_empty() {
        let (expr, _) = parse_primary("{}");
        assert_eq!(expr, Some(Expr::List(vec![])));
    }

    #[test]
    fn unexpected_token_reports_parser_error() {
        let (expr, errors) = parse_primary(")");
        assert_eq!(expr, None);
        assert!(errors.is_fatal());
    }
}
