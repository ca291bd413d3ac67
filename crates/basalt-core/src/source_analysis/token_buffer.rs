// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The main lexer loop and the columnar token buffer it produces.
//!
//! [`TokenizedBuffer::lex`] runs exactly once over a source buffer and
//! yields an immutable token stream. Tokens are identified by
//! [`TokenIndex`] and stored struct-of-arrays: parallel vectors for kind,
//! offset, length, bracket partner, and value index, with side-tables for
//! decoded numeric values, decoded strings, and interned identifiers.
//!
//! # Error Recovery
//!
//! The lexer never fails. Unrecognized bytes become [`TokenKind::Error`]
//! tokens, malformed literals keep their token with an error value, and
//! mismatched brackets are diagnosed while lexing continues. Every
//! diagnostic goes through the [`DiagnosticSink`] handed to `lex`.
//!
//! # Bracket Pairing
//!
//! A stack of open grouping tokens pairs `(`/`)`, `[`/`]`, and `{`/`}`
//! while scanning. Matched pairs cross-link their partner fields; a
//! closing token that does not match the innermost opener is diagnosed and
//! left unmatched without popping, so a stray `)` cannot unravel an
//! enclosing `{ ... }`.

use std::collections::HashMap;
use std::fmt;

use crate::diagnostics::{Diagnostic, DiagnosticSink, Severity};
use crate::source_buffer::SourceBuffer;

use num_bigint::BigUint;

use super::char_set::{is_alnum, is_decimal_digit, is_whitespace};
use super::numeric_literal::{LexedNumericLiteral, NumericValue, RealValue};
use super::string_literal::LexedStringLiteral;
use super::token_kind::SYMBOL_SPELLINGS;
use super::{Span, TokenKind};

/// Diagnostic code for bytes no token can start with.
const UNRECOGNIZED_CHARACTERS: &str = "syntax-unrecognized-characters";
/// Diagnostic code for bracket pairing problems.
const MISMATCHED_BRACKETS: &str = "syntax-mismatched-brackets";
/// Diagnostic code for string literals without a closing delimiter.
const INVALID_STRING: &str = "syntax-invalid-string";

/// Sentinel for "no partner" / "no value".
const NONE_SENTINEL: u32 = u32::MAX;

/// Identifies a token in a [`TokenizedBuffer`].
///
/// Tokens are created once and never renumbered, so an index taken during
/// lexing stays valid for the buffer's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenIndex(u32);

impl TokenIndex {
    /// Returns the position of this token in the buffer.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TokenIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies an interned identifier spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentifierId(u32);

/// An immutable, columnar token stream over one source buffer.
pub struct TokenizedBuffer<'src> {
    source: &'src SourceBuffer,

    kinds: Vec<TokenKind>,
    offsets: Vec<u32>,
    lengths: Vec<u32>,
    /// Matched bracket partner, or [`NONE_SENTINEL`].
    partners: Vec<u32>,
    /// Index into the side-table for the token's kind, or [`NONE_SENTINEL`].
    value_indices: Vec<u32>,

    numeric_values: Vec<NumericValue>,
    string_values: Vec<String>,
    identifiers: Vec<&'src str>,

    has_errors: bool,
}

impl<'src> TokenizedBuffer<'src> {
    /// Lexes a source buffer into a token stream.
    ///
    /// Always succeeds and always ends the stream with a
    /// [`TokenKind::FileEnd`] token; problems are reported through `sink`
    /// and recorded in [`Self::has_errors`].
    #[must_use]
    pub fn lex(source: &'src SourceBuffer, sink: &mut dyn DiagnosticSink) -> Self {
        Lexer::new(source, sink).run()
    }

    /// Returns the number of tokens, including the end-of-file marker.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// A lexed buffer always contains at least the end-of-file token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Iterates over all token indices in source order.
    pub fn tokens(&self) -> impl ExactSizeIterator<Item = TokenIndex> {
        (0..self.kinds.len() as u32).map(TokenIndex)
    }

    /// Returns the token at a raw position.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn token_at(&self, index: usize) -> TokenIndex {
        assert!(index < self.kinds.len(), "token index out of bounds");
        TokenIndex(index as u32)
    }

    /// Returns a token's kind.
    #[must_use]
    pub fn kind(&self, token: TokenIndex) -> TokenKind {
        self.kinds[token.index()]
    }

    /// Returns a token's source span.
    #[must_use]
    pub fn span(&self, token: TokenIndex) -> Span {
        let start = self.offsets[token.index()];
        Span::new(start, start + self.lengths[token.index()])
    }

    /// Returns a token's source text. The end-of-file token's text is
    /// empty.
    #[must_use]
    pub fn text(&self, token: TokenIndex) -> &'src str {
        &self.source.text()[self.span(token).as_range()]
    }

    /// Returns the matched bracket partner of a grouping token, or `None`
    /// for non-grouping and unmatched tokens.
    #[must_use]
    pub fn partner(&self, token: TokenIndex) -> Option<TokenIndex> {
        match self.partners[token.index()] {
            NONE_SENTINEL => None,
            partner => Some(TokenIndex(partner)),
        }
    }

    /// Returns the decoded value of a numeric literal token.
    #[must_use]
    pub fn numeric_value(&self, token: TokenIndex) -> Option<&NumericValue> {
        matches!(
            self.kind(token),
            TokenKind::IntegerLiteral | TokenKind::RealLiteral
        )
        .then(|| &self.numeric_values[self.value_indices[token.index()] as usize])
    }

    /// Returns the value of a valid integer literal token.
    #[must_use]
    pub fn integer_value(&self, token: TokenIndex) -> Option<&BigUint> {
        match self.numeric_value(token)? {
            NumericValue::Integer(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value of a valid real literal token.
    #[must_use]
    pub fn real_value(&self, token: TokenIndex) -> Option<&RealValue> {
        match self.numeric_value(token)? {
            NumericValue::Real(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the decoded value of a string literal token. Unterminated
    /// strings decode to the empty string.
    #[must_use]
    pub fn string_value(&self, token: TokenIndex) -> Option<&str> {
        matches!(self.kind(token), TokenKind::StringLiteral)
            .then(|| self.string_values[self.value_indices[token.index()] as usize].as_str())
    }

    /// Returns the interned identifier of an identifier token.
    #[must_use]
    pub fn identifier(&self, token: TokenIndex) -> Option<IdentifierId> {
        matches!(self.kind(token), TokenKind::Identifier)
            .then(|| IdentifierId(self.value_indices[token.index()]))
    }

    /// Returns an interned identifier's spelling.
    #[must_use]
    pub fn identifier_text(&self, id: IdentifierId) -> &'src str {
        self.identifiers[id.0 as usize]
    }

    /// Returns the source buffer this token stream was lexed from.
    #[must_use]
    pub fn source(&self) -> &'src SourceBuffer {
        self.source
    }

    /// Returns true if lexing emitted any error diagnostic.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }
}

/// Forwards to an outer sink while recording whether any error went by.
struct TrackingSink<'a> {
    inner: &'a mut dyn DiagnosticSink,
    saw_error: bool,
}

impl DiagnosticSink for TrackingSink<'_> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.saw_error |= diagnostic.severity == Severity::Error;
        self.inner.emit(diagnostic);
    }
}

/// One-shot lexer state; consumed by [`Lexer::run`].
struct Lexer<'a, 'src> {
    buffer: TokenizedBuffer<'src>,
    sink: TrackingSink<'a>,
    identifier_map: HashMap<&'src str, u32>,
    /// Indices of grouping tokens still waiting for their closing partner.
    open_groups: Vec<TokenIndex>,
    position: usize,
}

impl<'a, 'src> Lexer<'a, 'src> {
    fn new(source: &'src SourceBuffer, sink: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            buffer: TokenizedBuffer {
                source,
                kinds: Vec::new(),
                offsets: Vec::new(),
                lengths: Vec::new(),
                partners: Vec::new(),
                value_indices: Vec::new(),
                numeric_values: Vec::new(),
                string_values: Vec::new(),
                identifiers: Vec::new(),
                has_errors: false,
            },
            sink: TrackingSink {
                inner: sink,
                saw_error: false,
            },
            identifier_map: HashMap::new(),
            open_groups: Vec::new(),
            position: 0,
        }
    }

    fn run(mut self) -> TokenizedBuffer<'src> {
        let text = self.buffer.source.text();

        loop {
            self.skip_trivia();
            if self.position >= text.len() {
                break;
            }

            let rest = &text[self.position..];
            if let Some(literal) = LexedStringLiteral::lex(rest) {
                self.lex_string(&literal);
            } else if let Some(literal) = LexedNumericLiteral::lex(rest) {
                self.lex_numeric(&literal);
            } else if rest.as_bytes()[0] == b'_' || rest.as_bytes()[0].is_ascii_alphabetic() {
                self.lex_identifier_or_keyword(rest);
            } else if let Some(&(spelling, kind)) = SYMBOL_SPELLINGS
                .iter()
                .find(|(spelling, _)| rest.starts_with(spelling))
            {
                self.lex_symbol(spelling, kind);
            } else {
                self.lex_unrecognized(rest);
            }
        }

        self.diagnose_unclosed_groups();

        // The end-of-file marker makes "the token after the last real one"
        // well-defined for the parser.
        self.add_token(TokenKind::FileEnd, 0, NONE_SENTINEL);

        self.buffer.has_errors = self.sink.saw_error;
        self.buffer
    }

    /// Skips whitespace and `//` line comments.
    fn skip_trivia(&mut self) {
        let bytes = self.buffer.source.text().as_bytes();
        loop {
            while self.position < bytes.len() && is_whitespace(bytes[self.position]) {
                self.position += 1;
            }
            if bytes[self.position..].starts_with(b"//") {
                while self.position < bytes.len() && bytes[self.position] != b'\n' {
                    self.position += 1;
                }
                continue;
            }
            break;
        }
    }

    /// Appends one token at the current position and advances past it.
    fn add_token(&mut self, kind: TokenKind, length: usize, value_index: u32) -> TokenIndex {
        let token = TokenIndex(self.buffer.kinds.len() as u32);
        self.buffer.kinds.push(kind);
        self.buffer.offsets.push(self.position as u32);
        self.buffer.lengths.push(length as u32);
        self.buffer.partners.push(NONE_SENTINEL);
        self.buffer.value_indices.push(value_index);
        self.position += length;
        token
    }

    fn lex_string(&mut self, literal: &LexedStringLiteral<'src>) {
        let offset = self.position as u32;
        let value = literal.compute_value(offset, &mut self.sink);

        if !literal.is_terminated() {
            self.sink.emit(Diagnostic::error(
                INVALID_STRING,
                "unterminated string literal",
                Span::new(offset, offset + literal.text().len() as u32),
            ));
        }

        let value_index = self.buffer.string_values.len() as u32;
        self.buffer.string_values.push(value);
        self.add_token(TokenKind::StringLiteral, literal.text().len(), value_index);
    }

    fn lex_numeric(&mut self, literal: &LexedNumericLiteral<'src>) {
        let offset = self.position as u32;
        let value = literal.compute_value(offset, &mut self.sink);

        let kind = if literal.is_integer() {
            TokenKind::IntegerLiteral
        } else {
            TokenKind::RealLiteral
        };
        let value_index = self.buffer.numeric_values.len() as u32;
        self.buffer.numeric_values.push(value);
        self.add_token(kind, literal.text().len(), value_index);
    }

    fn lex_identifier_or_keyword(&mut self, rest: &'src str) {
        let length = rest
            .bytes()
            .position(|b| !is_alnum(b) && b != b'_')
            .unwrap_or(rest.len());
        let word = &rest[..length];

        if let Some(kind) = TokenKind::from_keyword(word) {
            self.add_token(kind, length, NONE_SENTINEL);
        } else if let Some(kind) = sized_type_literal_kind(word) {
            self.add_token(kind, length, NONE_SENTINEL);
        } else {
            let next_id = self.identifier_map.len() as u32;
            let id = *self.identifier_map.entry(word).or_insert(next_id);
            if id == next_id {
                self.buffer.identifiers.push(word);
            }
            self.add_token(TokenKind::Identifier, length, id);
        }
    }

    fn lex_symbol(&mut self, spelling: &str, kind: TokenKind) {
        let token = self.add_token(kind, spelling.len(), NONE_SENTINEL);

        if kind.is_opening_symbol() {
            self.open_groups.push(token);
        } else if kind.is_closing_symbol() {
            self.match_closing_symbol(kind, token);
        }
    }

    /// Pairs a closing bracket with the innermost opener, or diagnoses it.
    ///
    /// On mismatch the opener stays on the stack, so a stray closer cannot
    /// unravel an enclosing well-formed group.
    fn match_closing_symbol(&mut self, kind: TokenKind, token: TokenIndex) {
        let matches_top = self
            .open_groups
            .last()
            .is_some_and(|&open| self.buffer.kinds[open.index()].closing_partner() == Some(kind));

        if matches_top {
            let open = self.open_groups.pop().expect("top was just checked");
            self.buffer.partners[open.index()] = token.index() as u32;
            self.buffer.partners[token.index()] = open.index() as u32;
        } else {
            let span = self.buffer.span(token);
            self.sink.emit(Diagnostic::error(
                MISMATCHED_BRACKETS,
                format!(
                    "closing `{}` does not match any open bracket",
                    kind.spelling().unwrap_or_default()
                ),
                span,
            ));
        }
    }

    /// Diagnoses every opener left on the stack at end of input. Their
    /// partner fields keep the unmatched sentinel.
    fn diagnose_unclosed_groups(&mut self) {
        for open in std::mem::take(&mut self.open_groups) {
            let span = self.buffer.span(open);
            let kind = self.buffer.kinds[open.index()];
            self.sink.emit(Diagnostic::error(
                MISMATCHED_BRACKETS,
                format!(
                    "opening `{}` is never closed",
                    kind.spelling().unwrap_or_default()
                ),
                span,
            ));
        }
    }

    /// Consumes a run of bytes no token can start with.
    ///
    /// The first character is consumed unconditionally: it may be a byte
    /// like `#` that can start a token but did not start one here.
    fn lex_unrecognized(&mut self, rest: &'src str) {
        let mut chars = rest.char_indices();
        chars.next();
        let length = chars
            .find(|&(_, c)| c.is_ascii() && can_start_token(c as u8))
            .map_or(rest.len(), |(index, _)| index);

        let offset = self.position as u32;
        self.sink.emit(Diagnostic::error(
            UNRECOGNIZED_CHARACTERS,
            "encountered unrecognized characters while parsing",
            Span::new(offset, offset + length as u32),
        ));
        self.add_token(TokenKind::Error, length, NONE_SENTINEL);
    }
}

/// Classifies `[iuf][1-9][0-9]*` identifiers as sized type literals.
fn sized_type_literal_kind(word: &str) -> Option<TokenKind> {
    let bytes = word.as_bytes();
    let kind = match bytes.first()? {
        b'i' => TokenKind::IntTypeLiteral,
        b'u' => TokenKind::UnsignedIntTypeLiteral,
        b'f' => TokenKind::FloatTypeLiteral,
        _ => return None,
    };
    let digits = &bytes[1..];
    if digits.is_empty() || digits[0] == b'0' || !digits.iter().all(|&b| is_decimal_digit(b)) {
        return None;
    }
    Some(kind)
}

/// Returns true if a token (or trivia) can start at this byte.
fn can_start_token(byte: u8) -> bool {
    is_whitespace(byte)
        || is_alnum(byte)
        || matches!(byte, b'_' | b'#' | b'"' | b'/')
        || SYMBOL_SPELLINGS
            .iter()
            .any(|(spelling, _)| spelling.as_bytes()[0] == byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticList;
    use num_bigint::BigUint;

    fn buffer_for<'a>(
        source: &'a SourceBuffer,
        diagnostics: &mut DiagnosticList,
    ) -> TokenizedBuffer<'a> {
        TokenizedBuffer::lex(source, diagnostics)
    }

    /// Lexes and returns the non-EOF token kinds.
    fn kinds(text: &str) -> Vec<TokenKind> {
        let source = SourceBuffer::from_text(text, "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);
        buffer
            .tokens()
            .map(|t| buffer.kind(t))
            .filter(|k| !k.is_file_end())
            .collect()
    }

    #[test]
    fn empty_input_is_just_eof() {
        let source = SourceBuffer::from_text("", "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.kind(buffer.token_at(0)), TokenKind::FileEnd);
        assert!(!buffer.has_errors());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn whitespace_and_comments_are_skipped() {
        assert_eq!(kinds("  \t\r\n"), vec![]);
        assert_eq!(kinds("// just a comment"), vec![]);
        assert_eq!(
            kinds("x // comment\ny"),
            vec![TokenKind::Identifier, TokenKind::Identifier]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("fn main variable var"),
            vec![
                TokenKind::Fn,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Var,
            ]
        );
        // Keywords only match whole words.
        assert_eq!(kinds("fnord"), vec![TokenKind::Identifier]);
        assert_eq!(kinds("_tmp"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn sized_type_literals() {
        assert_eq!(
            kinds("i32 u8 f64"),
            vec![
                TokenKind::IntTypeLiteral,
                TokenKind::UnsignedIntTypeLiteral,
                TokenKind::FloatTypeLiteral,
            ]
        );
        // No leading zero, at least one digit, digits only.
        assert_eq!(kinds("i0"), vec![TokenKind::Identifier]);
        assert_eq!(kinds("i032"), vec![TokenKind::Identifier]);
        assert_eq!(kinds("i"), vec![TokenKind::Identifier]);
        assert_eq!(kinds("i32x"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn symbols_use_maximal_munch() {
        assert_eq!(
            kinds("->=> == != <= >= << >>"),
            vec![
                TokenKind::Arrow,
                TokenKind::FatArrow,
                TokenKind::EqualEqual,
                TokenKind::NotEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::LessLess,
                TokenKind::GreaterGreater,
            ]
        );
        // `<<=` is `<<` then `=`; `==` wins over `=` `=`.
        assert_eq!(
            kinds("<<="),
            vec![TokenKind::LessLess, TokenKind::Equal]
        );
    }

    #[test]
    fn spans_and_text_are_exact() {
        let source = SourceBuffer::from_text("fn  f(x)", "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);

        let texts: Vec<_> = buffer.tokens().map(|t| buffer.text(t)).collect();
        assert_eq!(texts, ["fn", "f", "(", "x", ")", ""]);

        let fn_span = buffer.span(buffer.token_at(0));
        assert_eq!((fn_span.start(), fn_span.end()), (0, 2));
        let f_span = buffer.span(buffer.token_at(1));
        assert_eq!((f_span.start(), f_span.end()), (4, 5));
    }

    #[test]
    fn token_round_trip_reconstructs_source() {
        let text = "fn f(n: i32) -> i32 { return n * 2; } // twice\nvar s = \"x\";";
        let source = SourceBuffer::from_text(text, "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);

        let mut reconstructed = String::new();
        let mut cursor = 0usize;
        for token in buffer.tokens() {
            let span = buffer.span(token);
            reconstructed.push_str(&text[cursor..span.start() as usize]);
            reconstructed.push_str(buffer.text(token));
            cursor = span.end() as usize;
        }
        reconstructed.push_str(&text[cursor..]);
        assert_eq!(reconstructed, text);
    }

    #[test]
    fn numeric_literal_values_are_stored() {
        let source = SourceBuffer::from_text("42 0x1F 1.5e+2", "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);

        assert_eq!(buffer.kind(buffer.token_at(0)), TokenKind::IntegerLiteral);
        assert_eq!(
            buffer.numeric_value(buffer.token_at(0)),
            Some(&NumericValue::Integer(BigUint::from(42u32)))
        );
        assert_eq!(
            buffer.numeric_value(buffer.token_at(1)),
            Some(&NumericValue::Integer(BigUint::from(31u32)))
        );
        assert_eq!(buffer.kind(buffer.token_at(2)), TokenKind::RealLiteral);
        assert!(matches!(
            buffer.numeric_value(buffer.token_at(2)),
            Some(NumericValue::Real(_))
        ));

        // Typed accessors agree and reject the other kind.
        assert_eq!(
            buffer.integer_value(buffer.token_at(0)),
            Some(&BigUint::from(42u32))
        );
        assert!(buffer.real_value(buffer.token_at(0)).is_none());
        assert!(buffer.integer_value(buffer.token_at(2)).is_none());
        assert!(buffer.real_value(buffer.token_at(2)).is_some());
        assert!(!buffer.has_errors());
    }

    #[test]
    fn invalid_numeric_literal_keeps_token_with_error_value() {
        let source = SourceBuffer::from_text("0b1.0;", "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);

        assert_eq!(buffer.kind(buffer.token_at(0)), TokenKind::RealLiteral);
        assert_eq!(
            buffer.numeric_value(buffer.token_at(0)),
            Some(&NumericValue::Error)
        );
        assert_eq!(buffer.kind(buffer.token_at(1)), TokenKind::Semicolon);
        assert!(buffer.has_errors());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn string_literal_values_are_stored() {
        let source = SourceBuffer::from_text(r#"var s = "a\n\x41";"#, "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);

        let string_token = buffer.token_at(3);
        assert_eq!(buffer.kind(string_token), TokenKind::StringLiteral);
        assert_eq!(buffer.string_value(string_token), Some("a\nA"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn raw_string_is_one_token() {
        let source = SourceBuffer::from_text(r##"#"a\n"#"##, "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);

        assert_eq!(buffer.kind(buffer.token_at(0)), TokenKind::StringLiteral);
        assert_eq!(buffer.string_value(buffer.token_at(0)), Some("a\\n"));
        assert_eq!(buffer.text(buffer.token_at(0)), r##"#"a\n"#"##);
    }

    #[test]
    fn unterminated_string_is_diagnosed() {
        let source = SourceBuffer::from_text("\"abc", "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);

        assert_eq!(buffer.kind(buffer.token_at(0)), TokenKind::StringLiteral);
        assert_eq!(buffer.string_value(buffer.token_at(0)), Some(""));
        assert!(buffer.has_errors());
        let codes: Vec<_> = diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(codes, vec!["syntax-invalid-string"]);
    }

    #[test]
    fn brackets_cross_link() {
        let source = SourceBuffer::from_text("( [ { } ] )", "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);
        assert!(diagnostics.is_empty());

        for (open, close) in [(0, 5), (1, 4), (2, 3)] {
            let open = buffer.token_at(open);
            let close = buffer.token_at(close);
            assert_eq!(buffer.partner(open), Some(close));
            assert_eq!(buffer.partner(close), Some(open));
            assert_eq!(
                buffer.kind(open).closing_partner(),
                Some(buffer.kind(close))
            );
        }
    }

    #[test]
    fn mismatched_close_keeps_enclosing_group() {
        // The stray `)` must not consume the `{` opener.
        let source = SourceBuffer::from_text("{ ) }", "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);

        assert_eq!(buffer.partner(buffer.token_at(0)), Some(buffer.token_at(2)));
        assert_eq!(buffer.partner(buffer.token_at(1)), None);
        assert!(buffer.has_errors());
        let codes: Vec<_> = diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(codes, vec!["syntax-mismatched-brackets"]);
    }

    #[test]
    fn unclosed_openers_are_diagnosed_at_eof() {
        let source = SourceBuffer::from_text("( [", "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);

        assert_eq!(buffer.partner(buffer.token_at(0)), None);
        assert_eq!(buffer.partner(buffer.token_at(1)), None);
        assert_eq!(diagnostics.len(), 2);
        assert!(buffer.has_errors());
    }

    #[test]
    fn unrecognized_bytes_form_one_error_token() {
        let source = SourceBuffer::from_text("x §§ y", "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);

        let kinds: Vec<_> = buffer.tokens().map(|t| buffer.kind(t)).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Error,
                TokenKind::Identifier,
                TokenKind::FileEnd,
            ]
        );
        assert_eq!(buffer.text(buffer.token_at(1)), "§§");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics.iter().next().unwrap().code,
            "syntax-unrecognized-characters"
        );
    }

    #[test]
    fn identifiers_are_interned() {
        let source = SourceBuffer::from_text("x y x", "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);

        let x1 = buffer.identifier(buffer.token_at(0)).unwrap();
        let y = buffer.identifier(buffer.token_at(1)).unwrap();
        let x2 = buffer.identifier(buffer.token_at(2)).unwrap();
        assert_eq!(x1, x2);
        assert_ne!(x1, y);
        assert_eq!(buffer.identifier_text(x1), "x");
        assert_eq!(buffer.identifier_text(y), "y");
    }

    #[test]
    fn file_end_is_always_last_and_empty() {
        for text in ["", "fn", "x + 1", "\"unterminated"] {
            let source = SourceBuffer::from_text(text, "test.bst").unwrap();
            let mut diagnostics = DiagnosticList::new();
            let buffer = buffer_for(&source, &mut diagnostics);
            let last = buffer.token_at(buffer.len() - 1);
            assert_eq!(buffer.kind(last), TokenKind::FileEnd);
            assert_eq!(buffer.text(last), "");
            assert_eq!(buffer.span(last).start() as usize, text.len());
        }
    }

    #[test]
    fn hash_without_string_is_unrecognized() {
        let source = SourceBuffer::from_text("# x", "test.bst").unwrap();
        let mut diagnostics = DiagnosticList::new();
        let buffer = buffer_for(&source, &mut diagnostics);
        assert_eq!(buffer.kind(buffer.token_at(0)), TokenKind::Error);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn function_declaration_token_stream() {
        assert_eq!(
            kinds("fn f(n: i32) -> i32 { return n; }"),
            vec![
                TokenKind::Fn,
                TokenKind::Identifier,
                TokenKind::OpenParen,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::IntTypeLiteral,
                TokenKind::CloseParen,
                TokenKind::Arrow,
                TokenKind::IntTypeLiteral,
                TokenKind::OpenCurly,
                TokenKind::Return,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::CloseCurly,
            ]
        );
    }
}
