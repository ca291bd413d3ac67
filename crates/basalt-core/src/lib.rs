// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Basalt compiler front-end.
//!
//! This crate turns a source buffer into a token stream and a postorder
//! parse tree:
//!
//! - [`source_buffer`] - the text handed to the lexer, capped at 31-bit
//!   offsets
//! - [`source_analysis`] - the lexer, its literal sub-lexers, and the
//!   columnar [`TokenizedBuffer`](source_analysis::TokenizedBuffer)
//! - [`parse_tree`] - the recursive-descent parser and the flat postorder
//!   [`ParseTree`](parse_tree::ParseTree)
//! - [`diagnostics`] - the structured diagnostics both phases emit
//!
//! Both phases recover from every malformed input: lexing and parsing
//! always run to completion, and problems surface as diagnostics rather
//! than failures.
//!
//! ```
//! use basalt_core::diagnostics::DiagnosticList;
//! use basalt_core::parse_tree::ParseTree;
//! use basalt_core::source_analysis::TokenizedBuffer;
//! use basalt_core::source_buffer::SourceBuffer;
//!
//! let source = SourceBuffer::from_text("fn f() {}", "demo.bst").unwrap();
//! let mut diagnostics = DiagnosticList::new();
//! let tokens = TokenizedBuffer::lex(&source, &mut diagnostics);
//! let tree = ParseTree::parse(&tokens, &mut diagnostics);
//!
//! assert!(diagnostics.is_empty());
//! assert!(tree.verify().is_ok());
//! ```

pub mod diagnostics;
pub mod parse_tree;
pub mod source_analysis;
pub mod source_buffer;
