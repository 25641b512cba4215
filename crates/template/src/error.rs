//! Errors raised while compiling or invoking a template body.

use rhai::{EvalAltResult, ParseError, Position};
use thiserror::Error;

/// Failure of a single template evaluation.
///
/// These never escape the evaluator's logged entry points; they are only surfaced through
/// [`crate::TemplateEvaluator::try_evaluate`] for editors and diagnostics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The body could not be parsed.
    #[error("syntax error at line {line}, column {col}: {message}")]
    Syntax {
        /// 1-based line within the template body.
        line: usize,
        /// 1-based column within the template body.
        col: usize,
        /// Parser message.
        message: String,
    },
    /// The body raised an error while running (unknown variable, bad operands, limits).
    #[error("runtime error at line {line}, column {col}: {message}")]
    Runtime {
        /// 1-based line within the template body.
        line: usize,
        /// 1-based column within the template body.
        col: usize,
        /// Interpreter message.
        message: String,
    },
    /// The returned value could not be represented as JSON.
    #[error("template result could not be converted: {0}")]
    Conversion(String),
    /// The value handed to the evaluator is not a template string.
    #[error("value is not a template")]
    NotTemplate,
}

impl TemplateError {
    /// Build a syntax error from a parser failure.
    pub(crate) fn from_parse(err: &ParseError) -> Self {
        let (line, col) = body_line_col(err.position());
        Self::Syntax {
            line,
            col,
            message: err.err_type().to_string(),
        }
    }

    /// Build a runtime error from an interpreter failure.
    pub(crate) fn from_eval(err: &EvalAltResult) -> Self {
        let (line, col) = body_line_col(err.position());
        Self::Runtime {
            line,
            col,
            message: err.to_string(),
        }
    }
}

/// Convert a script position to a 1-based (line, col) within the body.
///
/// The compiled script opens with one wrapper line, so reported lines are shifted back by one.
fn body_line_col(pos: Position) -> (usize, usize) {
    let line = pos.line().map_or(1, |l| l.saturating_sub(1).max(1));
    let col = pos.position().unwrap_or(1).max(1);
    (line, col)
}
