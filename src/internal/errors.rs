//! Error types and the evaluator-owned error collector.
//!
//! The specification's original design (§4.7) used a process-wide singleton
//! collector, reset on every tokenizer construction. Design Notes §9 flags
//! this as unsafe for concurrent use and redesigns it as a value owned by
//! whichever evaluator is running. We follow the redesign: `ErrorHandler` is
//! a plain struct, constructed fresh by [`crate::run`] for each invocation
//! and threaded through the tokenizer, parser, interpreter, and calculator
//! by `&mut` reference.

use thiserror::Error;

/// Which phase reported an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Scanner,
    Parser,
    Interpreter,
}

impl ErrorKind {
    fn label(self) -> &'static str {
        match self {
            ErrorKind::Scanner => "Scanner",
            ErrorKind::Parser => "Parser",
            ErrorKind::Interpreter => "Interpreter",
        }
    }
}

/// A single diagnostic, rendered per §7 as
/// `"<Kind>-error at line L, column C: <message>"`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}-error at line {line}, column {column}: {message}", kind.label())]
pub struct TrillError {
    pub kind: ErrorKind,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl TrillError {
    pub fn new(kind: ErrorKind, line: usize, column: usize, message: impl Into<String>) -> Self {
        TrillError {
            kind,
            line,
            column,
            message: message.into(),
        }
    }
}

/// Collects diagnostics for one pipeline invocation and tracks whether the
/// run is fatal.
///
/// A `Scanner` or `Parser` error is always fatal: the pipeline in
/// [`crate::run`] will not advance to the next phase once `is_fatal()`
/// returns `true`. An `Interpreter`-phase error is fatal for the remainder
/// of that evaluation, per §7.
#[derive(Debug, Default)]
pub struct ErrorHandler {
    fatal: bool,
    errors: Vec<TrillError>,
}

impl ErrorHandler {
    pub fn new() -> Self {
        // The original kept a process-wide singleton that the tokenizer
        // reset on construction; an owned handler starts clean by
        // definition, so `reset` is kept only for API parity with that
        // description and as an explicit, callable no-op-from-fresh.
        let mut handler = ErrorHandler::default();
        handler.reset();
        handler
    }

    pub fn reset(&mut self) {
        self.fatal = false;
        self.errors.clear();
    }

    pub fn report(&mut self, kind: ErrorKind, line: usize, column: usize, message: impl Into<String>) {
        let err = TrillError::new(kind, line, column, message);
        log::debug!("{}", err);
        self.errors.push(err);
        self.fatal = true;
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn errors(&self) -> &[TrillError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<TrillError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_handler_is_not_fatal() {
        let h = ErrorHandler::new();
        assert!(!h.is_fatal());
        assert!(h.errors().is_empty());
    }

    #[test]
    fn report_sets_fatal_and_collects_in_order() {
        let mut h = ErrorHandler::new();
        h.report(ErrorKind::Scanner, 1, 3, "unknown character: $");
        h.report(ErrorKind::Parser, 2, 0, "missing keyword: then");
        assert!(h.is_fatal());
        assert_eq!(h.errors().len(), 2);
        assert_eq!(h.errors()[0].line, 1);
        assert_eq!(h.errors()[1].kind, ErrorKind::Parser);
    }

    #[test]
    fn reset_clears_fatal_and_errors() {
        let mut h = ErrorHandler::new();
        h.report(ErrorKind::Scanner, 1, 0, "bad");
        h.reset();
        assert!(!h.is_fatal());
        assert!(h.errors().is_empty());
    }

    #[test]
    fn display_matches_spec_format() {
        let e = TrillError::new(ErrorKind::Parser, 1, 3, "Unexpected semicolon: ;");
        assert_eq!(
            e.to_string(),
            "Parser-error at line 1, column 3: Unexpected semicolon: ;"
        );
    }
}
