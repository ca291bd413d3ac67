// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for lexer and parser crash safety.
//!
//! Feeds arbitrary byte sequences through the whole front-end and asserts
//! it never panics: every input must produce a token stream, a parse tree
//! that passes `verify()`, and nothing else.
//!
//! Invalid UTF-8 is converted via lossy conversion (U+FFFD replacement)
//! so unusual byte sequences still exercise the lexer.
//!
//! # Success Criteria
//!
//! - No panic on any input
//! - The tree's structural invariants hold (`verify()` returns `Ok`)
//! - Diagnostics may be emitted freely; they are not checked

#![no_main]

use basalt_core::diagnostics::DiagnosticList;
use basalt_core::parse_tree::ParseTree;
use basalt_core::source_analysis::TokenizedBuffer;
use basalt_core::source_buffer::SourceBuffer;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let Ok(source) = SourceBuffer::from_text(text.as_ref(), "fuzz.bst") else {
        return;
    };

    let mut diagnostics = DiagnosticList::new();
    let tokens = TokenizedBuffer::lex(&source, &mut diagnostics);
    let tree = ParseTree::parse(&tokens, &mut diagnostics);

    tree.verify().expect("parse tree invariants must hold");
});
