//! Centralised error hierarchy for the **Brewin interpreter**.
//!
//! All subsystems (scanner, parser, evaluator, CLI) convert their internal
//! failure modes into one of the variants defined here. Runtime failures come
//! in exactly two language-level categories, [`BrewinError::Name`] and
//! [`BrewinError::Type`]; both are fatal and abort the run.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

/// Every failure the crate reports: front-end errors carry a line, runtime
/// errors carry only a message.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BrewinError {
    /// Bad character, unterminated string or comment, oversized literal.
    #[error("[line {line}] Error: {message}")]
    Lex { message: String, line: usize },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Undefined variable, function, field or method, or an ambiguous bare
    /// reference to an overloaded function.
    #[error("NameError: {0}")]
    Name(String),

    /// Operand, condition or argument mismatch, arity mismatch, calling a
    /// non-callable, invalid `proto` assignment.
    #[error("TypeError: {0}")]
    Type(String),

    /// Wrapper around `std::io::Error` (transparent). Enables `?` on console I/O.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting source text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl BrewinError {
    /// Scanner error at `line`.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        BrewinError::Lex { message, line }
    }

    /// Parser error at `line`.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        BrewinError::Parse { message, line }
    }

    /// Helper constructor for runtime name errors.
    pub fn name<S: Into<String>>(msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Name error: msg={}", message);

        BrewinError::Name(message)
    }

    /// Helper constructor for runtime type errors.
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Type error: msg={}", message);

        BrewinError::Type(message)
    }

    /// `true` for the two fatal runtime categories.
    pub fn is_runtime(&self) -> bool {
        matches!(self, BrewinError::Name(_) | BrewinError::Type(_))
    }
}

pub type Result<T> = std::result::Result<T, BrewinError>;
