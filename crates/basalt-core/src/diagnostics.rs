// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Structured diagnostics and the sink they are delivered to.
//!
//! The lexer and parser never stop at the first problem: every recoverable
//! issue becomes a [`Diagnostic`] pushed into a [`DiagnosticSink`], and
//! analysis continues. A diagnostic carries a stable short-name code (used
//! by golden tests and tooling), a severity, a human-readable message, and
//! the byte span of the offending source.
//!
//! Emission is fire-and-forget: a sink can collect, render, or drop
//! diagnostics, but it can never feed an error back into analysis.

use ecow::EcoString;

use crate::source_analysis::Span;

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A problem that makes the compilation unit invalid.
    Error,
    /// A problem worth reporting that does not invalidate the unit.
    Warning,
}

/// A single diagnostic record.
///
/// # Examples
///
/// ```
/// use basalt_core::diagnostics::{Diagnostic, Severity};
/// use basalt_core::source_analysis::Span;
///
/// let diag = Diagnostic::error(
///     "syntax-invalid-number",
///     "empty digit sequence in numeric literal",
///     Span::new(2, 3),
/// );
/// assert_eq!(diag.severity, Severity::Error);
/// assert_eq!(diag.code, "syntax-invalid-number");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Error or warning.
    pub severity: Severity,
    /// Stable short-name code, e.g. `"syntax-invalid-number"`.
    pub code: &'static str,
    /// The human-readable message.
    pub message: EcoString,
    /// The source location.
    pub span: Span,
    /// Optional hint for how to fix the issue.
    pub hint: Option<EcoString>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    #[must_use]
    pub fn error(code: &'static str, message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Creates a new warning diagnostic.
    #[must_use]
    pub fn warning(code: &'static str, message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Attaches a fix-it hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Receiver for diagnostics produced during lexing and parsing.
///
/// Implementations must not fail; emission is one-way.
pub trait DiagnosticSink {
    /// Delivers one diagnostic to the sink.
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// A sink that collects diagnostics in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticList {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if any collected diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Returns the number of collected diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns true if no diagnostics were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Iterates over the collected diagnostics in emission order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Consumes the list, returning the diagnostics.
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for DiagnosticList {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl<'a> IntoIterator for &'a DiagnosticList {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

/// A sink that discards everything. Useful in tests that only care about
/// token or tree shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreDiagnostics;

impl DiagnosticSink for IgnoreDiagnostics {
    fn emit(&mut self, _diagnostic: Diagnostic) {}
}
