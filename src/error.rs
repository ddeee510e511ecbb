//! # Error Types
//!
//! This module defines the error and diagnostic types for the OmniScore compiler.
//!
//! The compiler is lenient: malformed input degrades to a best-effort score and
//! the problems found along the way are reported as [`Diagnostic`] values rather
//! than errors. Only three things surface as an [`OmniError`]:
//! - `ParseError` - the first diagnostic, when strict mode is enabled
//! - `ConfigError` - invalid compile options (YAML config)
//! - `Internal` - an invariant violation inside the compiler
//!
//! ## Usage
//! ```rust
//! use omniscore::{compile_with_options, CompileOptions, OmniError};
//!
//! let options = CompileOptions { strict: true, ..CompileOptions::default() };
//! match compile_with_options("def pno\nmeasure 1 { pno: q4 }", &options) {
//!     Ok(compilation) => println!("{} events", compilation.score.timeline.len()),
//!     Err(OmniError::ParseError { line, column, message }) => {
//!         eprintln!("Parse error at {}:{}: {}", line, column, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OmniError {
    /// Strict-mode failure with location information.
    ///
    /// # Example
    /// ```
    /// # use omniscore::OmniError;
    /// let err = OmniError::ParseError {
    ///     line: 5,
    ///     column: 10,
    ///     message: "Unknown macro '$Verse'".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Parse error at line 5, column 10: Unknown macro '$Verse'");
    /// ```
    #[error("Parse error at line {line}, column {column}: {message}")]
    ParseError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Invalid compile options.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// An internal invariant was violated. Not caused by input shape.
    #[error("Internal compiler error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Input was degraded to a default or skipped.
    Warning,
    /// A hardening limit cut part of the compilation short.
    Error,
}

/// A problem found while compiling, with the source position it was found at.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}:{}: {}: {}", self.line, self.column, label, self.message)
    }
}

impl From<Diagnostic> for OmniError {
    fn from(d: Diagnostic) -> Self {
        OmniError::ParseError {
            line: d.line,
            column: d.column,
            message: d.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::warning(3, 7, "Unknown macro '$Fill'");
        assert_eq!(d.to_string(), "3:7: warning: Unknown macro '$Fill'");
    }

    #[test]
    fn test_diagnostic_into_parse_error() {
        let err: OmniError = Diagnostic::error(2, 1, "too deep").into();
        match err {
            OmniError::ParseError { line, column, message } => {
                assert_eq!((line, column), (2, 1));
                assert_eq!(message, "too deep");
            }
            _ => panic!("Expected ParseError"),
        }
    }
}
