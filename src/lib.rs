//! `trill` — an interpreter and probability analyzer for a small
//! Troll-descended dice and combinatorics language.
//!
//! [`run`] is the only supported entry point; everything under
//! `internal` is an implementation detail and carries no stability
//! guarantee. A caller gets a source string and an [`options::EvalOptions`]
//! in, and a [`RunResult`] out — one sampled or averaged [`Value`] per
//! top-level statement that produces one, plus whatever diagnostics the
//! tokenizer, parser, or interpreter reported along the way.

mod internal;
pub mod options;

use internal::errors::ErrorHandler;
use internal::parser::Parser;
use internal::random::{RandomSource, StdRandomSource};
use options::EvalOptions;

pub use internal::errors::{ErrorKind, TrillError};
pub use internal::value::Value;

/// The outcome of one [`run`] invocation.
///
/// `values` is `None` when a tokenizer or parser error made the source
/// unevaluable; it is `Some` (possibly containing further `Interpreter`-phase
/// errors in `errors`) once evaluation began, per §6/§7's five-step
/// pipeline: tokenize, check, parse, check, evaluate.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub values: Option<Vec<Value>>,
    pub errors: Vec<TrillError>,
}

/// Runs one source program to completion.
///
/// Tokenizing and parsing happen eagerly inside [`Parser::new`] and
/// [`Parser::parse`]; a fatal error at either stage short-circuits before
/// the interpreter ever sees the program, returning `values: None`.
pub fn run(source: &str, options: EvalOptions) -> RunResult {
    let mut errors = ErrorHandler::new();
    let mut parser = Parser::new(source, &mut errors);
    if errors.is_fatal() {
        return RunResult {
            values: None,
            errors: errors.into_errors(),
        };
    }

    let program = parser.parse(&mut errors);
    if errors.is_fatal() {
        return RunResult {
            values: None,
            errors: errors.into_errors(),
        };
    }

    let mut random: Box<dyn RandomSource> = match options.seed {
        Some(seed) => Box::new(StdRandomSource::seeded(seed)),
        None => Box::new(StdRandomSource::from_entropy()),
    };
    let mut interpreter = internal::interpreter::Interpreter::new(random.as_mut(), options.average);
    let values = interpreter.run(&program, &mut errors);

    RunResult {
        values: Some(values),
        errors: errors.into_errors(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_average_mode_of_3d6_plus_2_is_twelve_and_a_half() {
        let mut options = EvalOptions::default();
        options.average = true;
        let result = run("3d6+2", options);
        assert!(result.errors.is_empty());
        assert_eq!(result.values, Some(vec![Value::Float(12.5)]));
    }

    #[test]
    fn seeded_runs_are_deterministic() {
        let options = EvalOptions {
            seed: Some(1),
            ..EvalOptions::default()
        };
        let a = run("3d6", options);
        let b = run("3d6", options);
        assert_eq!(a.values, b.values);
    }

    #[test]
    fn lexer_error_short_circuits_before_parsing_with_no_values() {
        let result = run("$", EvalOptions::default());
        assert_eq!(result.values, None);
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn parser_error_short_circuits_before_evaluation_with_no_values() {
        let result = run("3d6;", EvalOptions::default());
        assert_eq!(result.values, None);
        assert!(!result.errors.is_empty());
    }
}
