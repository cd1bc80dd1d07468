//! Token stream → statement list (§4.2).
//!
//! [`Parser::parse`] is the front door: it tokenizes nothing itself
//! (tokens are produced once by [`crate::internal::lexer::Lexer`] and owned
//! here), then repeatedly parses one top-level declaration at a time. Each
//! grammar production below `declaration` lives in its own `parse_*`
//! module, one per precedence level, mirroring the recursive-descent chain
//! in the specification.

use crate::internal::ast::{BinaryOp, Expr, FoldOp, Stmt};
use crate::internal::errors::{ErrorHandler, ErrorKind};
use crate::internal::expect::expect;
use crate::internal::lexer::{text_align_op, Lexer};
use crate::internal::matches::match_any;
use crate::internal::next::advance;
use crate::internal::parse_expression::expression;
use crate::internal::peek::{check, is_at_end, peek};
use crate::internal::tokens::Token;
use crate::internal::tokens::TokenKind;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str, errors: &mut ErrorHandler) -> Self {
        let tokens = Lexer::new(source).scan_tokens(errors);
        Parser { tokens, pos: 0 }
    }

    /// Parses every top-level declaration, continuing best-effort after a
    /// syntax error so later problems in the same source are also surfaced
    /// (§4.2, "Error policy"). `declaration → ... | expression (; expression)*`
    /// means a `;` always commits to another declaration following it — a
    /// trailing `;` with nothing after it is itself a parser error (§8, S7).
    pub fn parse(&mut self, errors: &mut ErrorHandler) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !is_at_end(&self.tokens, self.pos) {
            match declaration(&self.tokens, &mut self.pos, errors) {
                Some(stmt) => statements.push(stmt),
                None => {
                    synchronize(&self.tokens, &mut self.pos);
                    continue;
                }
            }
            if let Some(semi) = match_any(&self.tokens, &mut self.pos, &[TokenKind::Semicolon]) {
                if is_at_end(&self.tokens, self.pos) {
                    errors.report(
                        ErrorKind::Parser,
                        semi.line,
                        semi.column,
                        format!("Unexpected semicolon: {}", semi.lexeme),
                    );
                    break;
                }
            }
        }
        statements
    }
}

/// Skips to the next statement boundary after a parse error, so a single
/// bad declaration doesn't prevent later ones from being reported.
fn synchronize(tokens: &[Token], pos: &mut usize) {
    while !is_at_end(tokens, *pos) {
        if check(tokens, *pos, TokenKind::Semicolon) {
            advance(tokens, pos);
            return;
        }
        advance(tokens, pos);
    }
}

/// `declaration → function | compositional | print | expression (; expression)*`
fn declaration(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Stmt> {
    match peek(tokens, *pos).kind {
        TokenKind::Function => function_decl(tokens, pos, errors),
        TokenKind::Compositional => compositional_decl(tokens, pos, errors),
        TokenKind::Textbox => print_stmt(tokens, pos, errors, None),
        TokenKind::Integer if check(tokens, *pos + 1, TokenKind::Textbox) => {
            let count = expression_primary_int(tokens, pos, errors)?;
            print_stmt(tokens, pos, errors, Some(count))
        }
        _ => expression_stmt(tokens, pos, errors),
    }
}

fn expression_primary_int(
    tokens: &[Token],
    pos: &mut usize,
    errors: &mut ErrorHandler,
) -> Option<Box<Expr>> {
    use crate::internal::tokens::Literal;
    let token = expect(tokens, pos, TokenKind::Integer, errors)?;
    let Literal::Int(_) = token.literal.clone().expect("integer token carries a literal") else {
        unreachable!("lexer only ever attaches Literal::Int to an Integer token")
    };
    Some(Box::new(Expr::Literal(token.literal.clone().unwrap())))
}

fn print_stmt(
    tokens: &[Token],
    pos: &mut usize,
    errors: &mut ErrorHandler,
    repeats: Option<Box<Expr>>,
) -> Option<Stmt> {
    expect(tokens, pos, TokenKind::Textbox, errors)?;
    let expr = expression(tokens, pos, errors)?;
    Some(Stmt::Print { expr, repeats })
}

fn function_decl(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Stmt> {
    expect(tokens, pos, TokenKind::Function, errors)?;
    let name = expect(tokens, pos, TokenKind::Identifier, errors)?.lexeme.clone();
    expect(tokens, pos, TokenKind::LParen, errors)?;
    let params = parse_param_list(tokens, pos, errors)?;
    expect(tokens, pos, TokenKind::RParen, errors)?;
    expect(tokens, pos, TokenKind::Equal, errors)?;
    let body = expression(tokens, pos, errors)?;
    Some(Stmt::Function { name, params, body })
}

fn parse_param_list(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Vec<String>> {
    let mut params = Vec::new();
    if !check(tokens, *pos, TokenKind::RParen) {
        params.push(expect(tokens, pos, TokenKind::Identifier, errors)?.lexeme.clone());
        while match_any(tokens, pos, &[TokenKind::Comma]).is_some() {
            params.push(expect(tokens, pos, TokenKind::Identifier, errors)?.lexeme.clone());
        }
    }
    Some(params)
}

fn compositional_decl(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Stmt> {
    expect(tokens, pos, TokenKind::Compositional, errors)?;
    let name = expect(tokens, pos, TokenKind::Identifier, errors)?.lexeme.clone();
    expect(tokens, pos, TokenKind::LParen, errors)?;
    let empty = expression(tokens, pos, errors)?;
    expect(tokens, pos, TokenKind::Comma, errors)?;
    let singleton = fold_op(tokens, pos, errors)?;
    expect(tokens, pos, TokenKind::Comma, errors)?;
    let union = fold_op(tokens, pos, errors)?;
    expect(tokens, pos, TokenKind::RParen, errors)?;
    Some(Stmt::Compositional {
        name,
        empty,
        singleton,
        union,
    })
}

fn fold_op(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<FoldOp> {
    if check(tokens, *pos, TokenKind::Identifier) {
        let name = advance(tokens, pos).lexeme.clone();
        return Some(FoldOp::Named(name));
    }
    if let Some(tok) = match_any(
        tokens,
        pos,
        &[
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Multiply,
            TokenKind::Divide,
            TokenKind::Modulo,
            TokenKind::Union,
            TokenKind::MinusMinus,
            TokenKind::And,
        ],
    ) {
        let op = match tok.kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Multiply => BinaryOp::Mul,
            TokenKind::Divide => BinaryOp::Div,
            TokenKind::Modulo => BinaryOp::Mod,
            TokenKind::Union => BinaryOp::Union,
            TokenKind::MinusMinus => BinaryOp::Difference,
            _ => BinaryOp::And,
        };
        return Some(FoldOp::Operator(op));
    }
    let found = peek(tokens, *pos);
    errors.report(
        ErrorKind::Parser,
        found.line,
        found.column,
        "expected a function name or operator in compositional definition",
    );
    None
}

/// One member of a top-level `expression (; expression)*` declaration,
/// folded left-associatively with any following alignment operators into
/// an [`Expr::TextAlign`] chain (§4.2, "At top level...").
fn aligned_expression(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Expr> {
    let mut expr = expression(tokens, pos, errors)?;
    while check(tokens, *pos, TokenKind::TextAlign) {
        let tok = advance(tokens, pos);
        let op = text_align_op(&tok.lexeme);
        let right = expression(tokens, pos, errors)?;
        expr = Expr::TextAlign(Box::new(expr), op, Box::new(right));
    }
    Some(expr)
}

/// A `;` is part of this declaration's own `(; expression)*` repetition
/// only if another expression actually follows it — a trailing `;` (S7) or
/// one introducing a different declaration kind (`function`, `compositional`,
/// `textbox`, or an `N ' ` repeat count) belongs to the outer statement
/// loop in [`Parser::parse`] instead.
fn continues_expression_chain(tokens: &[Token], pos: usize) -> bool {
    if !check(tokens, pos, TokenKind::Semicolon) {
        return false;
    }
    match peek(tokens, pos + 1).kind {
        TokenKind::Eof | TokenKind::Function | TokenKind::Compositional | TokenKind::Textbox => false,
        TokenKind::Integer if peek(tokens, pos + 2).kind == TokenKind::Textbox => false,
        _ => true,
    }
}

/// `declaration → ... | expression (; expression)*` (§4.2): the whole
/// `;`-chain of bare expressions is a single declaration whose value is the
/// last expression, evaluated in a pushed scope frame like any other
/// sequence (§4.3, "`a;b;…`: sequence in a pushed frame; result is the last
/// expression") — so more than one member is wrapped in an [`Expr::Block`],
/// exactly as a parenthesized `(e1; e2; …)` would be.
fn expression_stmt(tokens: &[Token], pos: &mut usize, errors: &mut ErrorHandler) -> Option<Stmt> {
    let mut exprs = vec![aligned_expression(tokens, pos, errors)?];
    while continues_expression_chain(tokens, *pos) {
        advance(tokens, pos);
        exprs.push(aligned_expression(tokens, pos, errors)?);
    }
    let expr = if exprs.len() == 1 {
        exprs.remove(0)
    } else {
        Expr::Block(exprs)
    };
    Some(Stmt::Expression(expr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::tokens::Literal;

    fn parse(src: &str) -> (Vec<Stmt>, ErrorHandler) {
        let mut errors = ErrorHandler::new();
        let mut parser = Parser::new(src, &mut errors);
        let stmts = parser.parse(&mut errors);
        (stmts, errors)
    }

    #[test]
    fn s4_if_with_conjunction_and_assignment_chain() {
        let (stmts, errors) = parse("x := 2; y := 3; if x = 2 & y = 3 then 42 else 24");
        assert!(!errors.is_fatal());
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::Expression(Expr::Block(exprs)) => {
                assert_eq!(exprs.len(), 3);
                match &exprs[2] {
                    Expr::Conditional(_, then_branch, _) => {
                        assert_eq!(**then_branch, Expr::Literal(Literal::Int(42)));
                    }
                    other => panic!("expected Conditional, got {other:?}"),
                }
            }
            other => panic!("expected a Block sequence, got {other:?}"),
        }
    }

    #[test]
    fn semicolon_before_a_different_declaration_kind_does_not_join_the_chain() {
        let (stmts, errors) = parse("x := 1; function f(y) = y + 1");
        assert!(!errors.is_fatal());
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&stmts[0], Stmt::Expression(Expr::Assign(_, _))));
        assert!(matches!(&stmts[1], Stmt::Function { .. }));
    }

    #[test]
    fn s6_alignment_chain_is_left_associative() {
        let (stmts, errors) = parse("\"1\" |> \"two\" |> \"three\"");
        assert!(!errors.is_fatal());
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::Expression(Expr::TextAlign(left, _, _)) => {
                assert!(matches!(**left, Expr::TextAlign(_, _, _)));
            }
            other => panic!("expected nested TextAlign, got {other:?}"),
        }
    }

    #[test]
    fn s7_trailing_semicolon_after_binary_dice_is_a_parser_error() {
        let (_, errors) = parse("3d6;");
        assert!(errors.is_fatal());
        assert_eq!(
            errors.errors()[0].to_string(),
            "Parser-error at line 1, column 3: Unexpected semicolon: ;"
        );
    }

    #[test]
    fn function_declaration_round_trips() {
        let (stmts, errors) = parse("function f(x) = x + 1");
        assert!(!errors.is_fatal());
        match &stmts[0] {
            Stmt::Function { name, params, .. } => {
                assert_eq!(name, "f");
                assert_eq!(params, &vec!["x".to_string()]);
            }
            other => panic!("expected Function, got {other:?}"),
        }
    }

    #[test]
    fn compositional_declaration_with_operator_folds() {
        let (stmts, errors) = parse("compositional total(0, x, +)");
        assert!(!errors.is_fatal());
        match &stmts[0] {
            Stmt::Compositional {
                singleton, union, ..
            } => {
                assert!(matches!(singleton, FoldOp::Named(_)));
                assert_eq!(*union, FoldOp::Operator(BinaryOp::Add));
            }
            other => panic!("expected Compositional, got {other:?}"),
        }
    }

    #[test]
    fn print_statement_with_repeat_count() {
        let (stmts, errors) = parse("3 ' d6");
        assert!(!errors.is_fatal());
        match &stmts[0] {
            Stmt::Print { repeats, .. } => assert!(repeats.is_some()),
            other => panic!("expected Print, got {other:?}"),
        }
    }
}
