// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for Basalt source code.
//!
//! This module converts a [`SourceBuffer`](crate::source_buffer::SourceBuffer)
//! into a [`TokenizedBuffer`]: a columnar token stream with side-tables for
//! decoded literal values and interned identifiers. The lexer is
//! hand-written for full control over error recovery.
//!
//! # Design Principles
//!
//! - **Error recovery**: never stop; malformed input becomes `Error`
//!   tokens and error values, with diagnostics through the sink
//! - **Columnar storage**: tokens are parallel arrays indexed by
//!   [`TokenIndex`], not boxed records
//! - **Precise offsets**: every token knows its exact byte range, and the
//!   stream round-trips to the source text
//!
//! # Example
//!
//! ```
//! use basalt_core::diagnostics::DiagnosticList;
//! use basalt_core::source_analysis::{TokenKind, TokenizedBuffer};
//! use basalt_core::source_buffer::SourceBuffer;
//!
//! let source = SourceBuffer::from_text("fn f() {}", "demo.bst").unwrap();
//! let mut diagnostics = DiagnosticList::new();
//! let tokens = TokenizedBuffer::lex(&source, &mut diagnostics);
//!
//! assert!(diagnostics.is_empty());
//! let kinds: Vec<_> = tokens.tokens().map(|t| tokens.kind(t)).collect();
//! assert_eq!(kinds[0], TokenKind::Fn);
//! ```
//!
//! The literal sub-lexers ([`LexedNumericLiteral`], [`LexedStringLiteral`])
//! are exposed for direct use in tests and tooling; the main loop in
//! [`TokenizedBuffer::lex`] is how everything else should lex.

pub mod char_set;
mod numeric_literal;
mod span;
mod string_literal;
mod token_buffer;
mod token_kind;


pub use numeric_literal::{LexedNumericLiteral, NumericValue, RealValue};
pub use span::Span;
pub use string_literal::LexedStringLiteral;
pub use token_buffer::{IdentifierId, TokenIndex, TokenizedBuffer};
pub use token_kind::TokenKind;
