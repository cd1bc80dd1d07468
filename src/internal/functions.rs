//! The process-local function table (§3, "Function table").
//!
//! A name maps to either an ordinary function definition or a
//! compositional fold definition. Both the interpreter and the calculator
//! share one table per evaluation.

use crate::internal::ast::{Expr, FoldOp};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub params: Vec<String>,
    pub body: Expr,
}

#[derive(Debug, Clone)]
pub struct CompositionalDef {
    pub empty: Expr,
    pub singleton: FoldOp,
    pub union: FoldOp,
}

#[derive(Debug, Clone)]
pub enum Definition {
    Function(FunctionDef),
    Compositional(CompositionalDef),
}

#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    definitions: HashMap<String, Definition>,
}

impl FunctionTable {
    pub fn new() -> Self {
        FunctionTable::default()
    }

    pub fn define_function(&mut self, name: String, params: Vec<String>, body: Expr) {
        self.definitions
            .insert(name, Definition::Function(FunctionDef { params, body }));
    }

    pub fn define_compositional(
        &mut self,
        name: String,
        empty: Expr,
        singleton: FoldOp,
        union: FoldOp,
    ) {
        self.definitions.insert(
            name,
            Definition::Compositional(CompositionalDef {
                empty,
                singleton,
                union,
            }),
        );
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::tokens::Literal;

    #[test]
    fn define_then_lookup_function() {
        let mut table = FunctionTable::new();
        table.define_function(
            "double".to_string(),
            vec!["x".to_string()],
            Expr::Literal(Literal::Int(2)),
        );
        match table.get("double") {
            Some(Definition::Function(f)) => assert_eq!(f.params, vec!["x".to_string()]),
            other => panic!("expected Function definition, got {other:?}"),
        }
    }

    #[test]
    fn unknown_name_is_none() {
        let table = FunctionTable::new();
        assert!(table.get("nope").is_none());
    }
}
