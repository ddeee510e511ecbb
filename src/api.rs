//! # Public API
//!
//! Entry points of the OmniScore compiler library.
//!
//! ## Compilation Functions
//!
//! - [`compile()`] - lenient compilation with default options; returns the score
//! - [`compile_with_options()`] - custom limits and strict mode; returns the
//!   score together with the diagnostics collected along the way
//!
//! ## Typical Usage
//!
//! ```rust
//! use omniscore::compile;
//!
//! let source = r#"
//! meta { title: "Scale", tempo: 90 }
//! def pno "Piano"
//! measure 1 { pno: c4:4 d e f }
//! measure 2 { pno: g4:4 a b c5 }
//! "#;
//!
//! let score = compile(source)?;
//! assert_eq!(score.timeline.len(), 8);
//! assert_eq!(score.duration_ticks, 2 * 7680);
//! # Ok::<(), omniscore::OmniError>(())
//! ```
//!
//! ## Strict Mode
//!
//! ```rust
//! use omniscore::{compile_with_options, CompileOptions, OmniError};
//!
//! let options = CompileOptions { strict: true, ..CompileOptions::default() };
//! let result = compile_with_options("def pno\nmeasure 1 { pno: c4 $Missing }", &options);
//! assert!(matches!(result, Err(OmniError::ParseError { line: 2, .. })));
//! ```

use crate::compiler::Compiler;
use crate::config::CompileOptions;
use crate::error::{Diagnostic, OmniError, Severity};
use crate::lexer::tokenize;
use crate::score::CompiledScore;
use crate::timeline;
use serde::Serialize;
use tracing::debug;

/// A compiled score plus the problems found while compiling it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Compilation {
    pub score: CompiledScore,
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics raised by a hardening limit
    pub fn limit_errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }
}

/// Compile OmniScore source with the default (lenient) options.
///
/// Malformed input never fails here: it is skipped or defaulted. Use
/// [`compile_with_options`] to see what was skipped.
///
/// # Errors
/// Returns [`OmniError::Internal`] only if the compiler breaks one of its own
/// invariants.
pub fn compile(source: &str) -> Result<CompiledScore, OmniError> {
    compile_with_options(source, &CompileOptions::default()).map(|c| c.score)
}

/// Compile OmniScore source with explicit options.
///
/// # Pipeline
/// 1. Tokenize the source
/// 2. First pass: meta, macros, instruments, measure headers
/// 3. Second pass: replay measures, interpret voices
/// 4. Sort the timeline and compute the total length
///
/// # Errors
/// - [`OmniError::ParseError`] for the first diagnostic when `options.strict`
///   is set
/// - [`OmniError::Internal`] on an invariant violation
pub fn compile_with_options(
    source: &str,
    options: &CompileOptions,
) -> Result<Compilation, OmniError> {
    let tokens = tokenize(source);
    debug!(tokens = tokens.len(), "tokenized source");

    let mut output = Compiler::new(options).run(&tokens);

    if options.strict {
        if let Some(first) = output.diagnostics.first() {
            return Err(first.clone().into());
        }
    }

    let diagnostics = std::mem::take(&mut output.diagnostics);
    let score = timeline::assemble(output)?;
    debug!(
        events = score.timeline.len(),
        duration_ticks = score.duration_ticks,
        diagnostics = diagnostics.len(),
        "compiled score"
    );

    Ok(Compilation { score, diagnostics })
}
