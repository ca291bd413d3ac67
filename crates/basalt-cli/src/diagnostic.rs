// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Rendering core diagnostics through miette.
//!
//! Converts [`basalt_core::diagnostics::Diagnostic`] records into miette
//! reports with:
//! - source code context and an arrow at the offending span
//! - the stable short-name code as the label
//! - the optional hint as a help footnote

use basalt_core::diagnostics::{Diagnostic as CoreDiagnostic, Severity};
use miette::{Diagnostic, SourceSpan};

/// A core diagnostic paired with its source, ready for rendering.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("{message}")]
#[diagnostic(code(basalt::syntax))]
pub struct RenderedDiagnostic {
    /// Error or warning.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Source text for context.
    #[source_code]
    pub src: miette::NamedSource<String>,
    /// Where to point.
    #[label("{label}")]
    pub span: SourceSpan,
    /// The stable short-name code, shown at the span.
    pub label: String,
    /// Optional fix-it hint.
    #[help]
    pub help: Option<String>,
}

impl RenderedDiagnostic {
    /// Pairs a core diagnostic with its source file for rendering.
    pub fn from_core(diagnostic: &CoreDiagnostic, source_path: &str, source: &str) -> Self {
        Self {
            severity: diagnostic.severity,
            message: diagnostic.message.to_string(),
            src: miette::NamedSource::new(source_path, source.to_string()),
            span: diagnostic.span.into(),
            label: diagnostic.code.to_string(),
            help: diagnostic.hint.as_ref().map(ToString::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_core::source_analysis::Span;

    #[test]
    fn from_core_carries_everything_over() {
        let core = CoreDiagnostic::error("syntax-error", "expected `;`", Span::new(10, 15))
            .with_hint("statements end with a semicolon");
        let rendered = RenderedDiagnostic::from_core(&core, "test.bst", "fn f() { g() }");

        assert_eq!(rendered.severity, Severity::Error);
        assert_eq!(rendered.message, "expected `;`");
        assert_eq!(rendered.label, "syntax-error");
        assert_eq!(rendered.span.offset(), 10);
        assert_eq!(rendered.span.len(), 5);
        assert_eq!(
            rendered.help.as_deref(),
            Some("statements end with a semicolon")
        );
    }
}
