// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The string-literal sub-lexer.
//!
//! Basalt strings come in two shapes, both raisable to raw strings by
//! surrounding `#`s:
//!
//! ```text
//! "plain\n"            #"raw, \n is two characters"#
//! """
//!   multi-line, indented by the closing line
//!   """
//! ```
//!
//! The number of `#`s on each side is the *hash level*. It lengthens both
//! the terminator (`"` or `"""` followed by that many `#`s) and the escape
//! introducer (`\` followed by that many `#`s), so at hash level 1 the text
//! `\n` is literal and `\#n` is a newline escape.
//!
//! Recognition ([`LexedStringLiteral::lex`]) walks the source consuming
//! terminator and escape prefixes, so an escaped `"` can never falsely
//! close a string. Decoding ([`LexedStringLiteral::compute_value`]) strips
//! the multi-line indent and expands escapes, emitting recoverable
//! diagnostics for everything malformed.

use crate::diagnostics::{Diagnostic, DiagnosticSink};

use super::char_set::{is_decimal_digit, is_horizontal_whitespace, is_space, is_upper_hex_digit};
use super::Span;

/// Diagnostic code for malformed string literals.
const INVALID_STRING: &str = "syntax-invalid-string";

/// The multi-line string delimiter.
const MULTI_LINE_INDICATOR: &str = "\"\"\"";

/// A recognized string literal, before decoding.
#[derive(Debug, Clone, Copy)]
pub struct LexedStringLiteral<'src> {
    /// The full token text, delimiters included.
    text: &'src str,
    /// Content range within `text` (delimiters excluded).
    content_start: usize,
    content_end: usize,
    /// Number of `#`s on each side of the delimiters.
    hash_level: usize,
    multi_line: bool,
    /// False when the closing delimiter is missing; the token then runs to
    /// the end of the line (single-line form) or of the input.
    is_terminated: bool,
}

impl<'src> LexedStringLiteral<'src> {
    /// Recognizes a string literal at the start of `source_text`.
    ///
    /// Returns `None` (consuming nothing) unless a leading `#` run is
    /// followed by `"` or by a well-formed multi-line introducer.
    #[must_use]
    pub fn lex(source_text: &'src str) -> Option<Self> {
        let bytes = source_text.as_bytes();
        let mut cursor = 0;
        while cursor < bytes.len() && bytes[cursor] == b'#' {
            cursor += 1;
        }
        let hash_level = cursor;

        let multi_line_prefix = multi_line_prefix_size(&source_text[hash_level..]);
        let multi_line = multi_line_prefix > 0;
        if multi_line {
            cursor += multi_line_prefix;
        } else if cursor < bytes.len() && bytes[cursor] == b'"' {
            cursor += 1;
        } else {
            return None;
        }

        let prefix_len = cursor;

        let mut terminator =
            String::from(if multi_line { MULTI_LINE_INDICATOR } else { "\"" });
        let mut escape = String::from("\\");
        for _ in 0..hash_level {
            terminator.push('#');
            escape.push('#');
        }

        while cursor < bytes.len() {
            match bytes[cursor] {
                b'\\' => {
                    if escape.len() == 1 || source_text[cursor..].starts_with(&escape) {
                        cursor += escape.len();

                        // An escape at the end of input, or of the line in
                        // single-line form, leaves the string unterminated.
                        if cursor >= bytes.len() || (!multi_line && bytes[cursor] == b'\n') {
                            return Some(Self::unterminated(
                                &source_text[..cursor],
                                prefix_len,
                                hash_level,
                                multi_line,
                            ));
                        }
                        // The escaped byte itself is consumed by the shared
                        // increment below.
                    }
                }
                b'\n' => {
                    if !multi_line {
                        return Some(Self::unterminated(
                            &source_text[..cursor],
                            prefix_len,
                            hash_level,
                            multi_line,
                        ));
                    }
                }
                b'"' => {
                    if terminator.len() == 1 || source_text[cursor..].starts_with(&terminator) {
                        return Some(Self {
                            text: &source_text[..cursor + terminator.len()],
                            content_start: prefix_len,
                            content_end: cursor,
                            hash_level,
                            multi_line,
                            is_terminated: true,
                        });
                    }
                }
                _ => {}
            }
            cursor += 1;
        }

        Some(Self::unterminated(
            source_text,
            prefix_len,
            hash_level,
            multi_line,
        ))
    }

    fn unterminated(
        text: &'src str,
        prefix_len: usize,
        hash_level: usize,
        multi_line: bool,
    ) -> Self {
        Self {
            text,
            content_start: prefix_len,
            content_end: text.len(),
            hash_level,
            multi_line,
            is_terminated: false,
        }
    }

    /// Returns the full token text, delimiters included.
    #[must_use]
    pub fn text(&self) -> &'src str {
        self.text
    }

    /// Returns the content between the delimiters.
    #[must_use]
    pub fn content(&self) -> &'src str {
        &self.text[self.content_start..self.content_end]
    }

    /// Returns the number of `#`s on each side of the delimiters.
    #[must_use]
    pub fn hash_level(&self) -> usize {
        self.hash_level
    }

    /// Returns true for the `"""` form.
    #[must_use]
    pub fn is_multi_line(&self) -> bool {
        self.multi_line
    }

    /// Returns true if the closing delimiter was found.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.is_terminated
    }

    /// Decodes the string's value, expanding escapes and stripping the
    /// multi-line indent.
    ///
    /// `offset` is the absolute byte offset of the literal within the
    /// source buffer, used to key diagnostics. An unterminated literal
    /// decodes to the empty string; diagnosing the missing terminator is
    /// the main lexer loop's job.
    #[must_use]
    pub fn compute_value(&self, offset: u32, sink: &mut dyn DiagnosticSink) -> String {
        if !self.is_terminated {
            return String::new();
        }
        let indent = if self.multi_line {
            self.check_indent(offset, sink)
        } else {
            ""
        };
        self.expand_escapes_and_remove_indent(offset, sink, indent)
    }

    /// Computes the indent of the closing line and flags any non-whitespace
    /// content preceding the closing `"""`.
    fn check_indent(&self, offset: u32, sink: &mut dyn DiagnosticSink) -> &'src str {
        let indent = indent_of_final_line(self.text);

        if indent.end != self.content_end {
            let at = offset + indent.end as u32;
            sink.emit(Diagnostic::error(
                INVALID_STRING,
                "only whitespace is permitted before the closing \"\"\" of a multi-line string",
                Span::new(at, at + 1),
            ));
        }

        &self.text[indent]
    }

    fn expand_escapes_and_remove_indent(
        &self,
        offset: u32,
        sink: &mut dyn DiagnosticSink,
        indent: &str,
    ) -> String {
        let content = self.content();
        let bytes = content.as_bytes();
        let mut result = String::with_capacity(content.len());

        let mut escape = String::from("\\");
        for _ in 0..self.hash_level {
            escape.push('#');
        }

        // Absolute position of content byte `i` is `offset + base + i`.
        let base = self.content_start;
        let mut i = 0;

        'lines: loop {
            // Start of line: strip the indent, or flag the mismatch and
            // drop whatever leading whitespace there is. Blank lines are
            // exempt.
            if content[i..].starts_with(indent) {
                i += indent.len();
            } else {
                let line_start = i;
                while i < bytes.len() && is_horizontal_whitespace(bytes[i]) {
                    i += 1;
                }
                if !content[i..].starts_with('\n') {
                    let at = offset + (base + line_start) as u32;
                    sink.emit(Diagnostic::error(
                        INVALID_STRING,
                        "indentation does not match that of the closing \"\"\" in multi-line \
                         string literal",
                        Span::new(at, at + 1),
                    ));
                }
            }

            loop {
                // Copy regular text up to the next newline, escape, or
                // non-space horizontal whitespace (i.e. tab).
                let stop = bytes[i..]
                    .iter()
                    .position(|&b| {
                        b == b'\n' || b == b'\\' || (is_horizontal_whitespace(b) && b != b' ')
                    })
                    .map_or(bytes.len(), |found| i + found);
                result.push_str(&content[i..stop]);
                i = stop;

                if i == bytes.len() {
                    return result;
                }

                if bytes[i] == b'\n' {
                    // Trailing whitespace on the line is stripped, but
                    // never across an earlier newline.
                    while result.ends_with([' ', '\t']) {
                        result.pop();
                    }
                    result.push('\n');
                    i += 1;
                    continue 'lines;
                }

                if is_horizontal_whitespace(bytes[i]) {
                    debug_assert!(bytes[i] != b' ', "should not have stopped at a plain space");
                    let mut after = i;
                    while after < bytes.len() && is_horizontal_whitespace(bytes[after]) {
                        after += 1;
                    }
                    if after == bytes.len() || bytes[after] != b'\n' {
                        let at = offset + (base + i) as u32;
                        sink.emit(Diagnostic::error(
                            INVALID_STRING,
                            "whitespace other than plain space must be expressed with an escape \
                             sequence in a string literal",
                            Span::new(at, at + 1),
                        ));
                        // Copy it through for error recovery.
                        result.push_str(&content[i..after]);
                    }
                    i = after;
                    continue;
                }

                // A backslash that is not a full escape introducer (short a
                // `#` or more) is plain content.
                if !content[i..].starts_with(&escape) {
                    result.push('\\');
                    i += 1;
                    continue;
                }
                i += escape.len();

                if i < bytes.len() && bytes[i] == b'\n' {
                    // Line continuation: no newline, no trailing trim.
                    i += 1;
                    continue 'lines;
                }

                self.expand_and_consume_escape(offset, sink, content, &mut i, &mut result);
            }
        }
    }

    /// Expands one escape sequence; `i` points at the byte after the
    /// introducer on entry and past the sequence on exit.
    fn expand_and_consume_escape(
        &self,
        offset: u32,
        sink: &mut dyn DiagnosticSink,
        content: &str,
        i: &mut usize,
        result: &mut String,
    ) {
        let bytes = content.as_bytes();
        assert!(*i < bytes.len(), "should have escaped closing delimiter");
        let at = |index: usize| {
            let position = offset + (self.content_start + index) as u32;
            Span::new(position, position + 1)
        };

        let first = bytes[*i];
        *i += 1;

        match first {
            b't' => result.push('\t'),
            b'n' => result.push('\n'),
            b'r' => result.push('\r'),
            b'"' => result.push('"'),
            b'\'' => result.push('\''),
            b'\\' => result.push('\\'),
            b'0' => {
                result.push('\0');
                if *i < bytes.len() && is_decimal_digit(bytes[*i]) {
                    sink.emit(
                        Diagnostic::error(
                            INVALID_STRING,
                            "decimal digit follows \\0 escape sequence",
                            at(*i),
                        )
                        .with_hint("use \\x00 instead of \\0 if the next character is a digit"),
                    );
                }
            }
            b'x' => {
                if *i + 2 <= bytes.len()
                    && is_upper_hex_digit(bytes[*i])
                    && is_upper_hex_digit(bytes[*i + 1])
                {
                    let value = hex_nibble(bytes[*i]) << 4 | hex_nibble(bytes[*i + 1]);
                    result.push(char::from(value));
                    *i += 2;
                } else {
                    sink.emit(
                        Diagnostic::error(
                            INVALID_STRING,
                            "escape sequence \\x must be followed by two uppercase hexadecimal \
                             digits, for example \\x0F",
                            at(*i),
                        ),
                    );
                    result.push('x');
                }
            }
            b'u' => {
                if *i < bytes.len() && bytes[*i] == b'{' {
                    let digits_start = *i + 1;
                    let mut digits_end = digits_start;
                    while digits_end < bytes.len() && is_upper_hex_digit(bytes[digits_end]) {
                        digits_end += 1;
                    }
                    if digits_end > digits_start
                        && digits_end < bytes.len()
                        && bytes[digits_end] == b'}'
                    {
                        let digits = &content[digits_start..digits_end];
                        if expand_unicode_escape(sink, digits, at(digits_start), result) {
                            *i = digits_end + 1;
                        } else {
                            // Leave the braced digits as plain content.
                            result.push('u');
                        }
                        return;
                    }
                }
                sink.emit(Diagnostic::error(
                    INVALID_STRING,
                    "escape sequence \\u must be followed by a braced sequence of uppercase \
                     hexadecimal digits, for example \\u{70AD}",
                    at(*i),
                ));
                result.push('u');
            }
            _ => {
                sink.emit(Diagnostic::error(
                    INVALID_STRING,
                    format!("unrecognized escape sequence `{}`", first as char),
                    at(*i - 1),
                ));
                result.push(first as char);
            }
        }
    }
}

/// Expands a `\u{...}` escape's digits into `result`. Returns false (after
/// diagnosing) for out-of-range and surrogate code points.
fn expand_unicode_escape(
    sink: &mut dyn DiagnosticSink,
    digits: &str,
    span: Span,
    result: &mut String,
) -> bool {
    let code_point = match u32::from_str_radix(digits, 16) {
        Ok(value) if value <= 0x10FFFF => value,
        // Parse failure on validated hex digits means overflow.
        _ => {
            sink.emit(Diagnostic::error(
                INVALID_STRING,
                "code point specified by \\u{...} escape is greater than 0x10FFFF",
                span,
            ));
            return false;
        }
    };

    if (0xD800..0xE000).contains(&code_point) {
        sink.emit(Diagnostic::error(
            INVALID_STRING,
            "code point specified by \\u{...} escape is a surrogate character",
            span,
        ));
        return false;
    }

    match char::from_u32(code_point) {
        Some(c) => {
            result.push(c);
            true
        }
        None => unreachable!("non-surrogate code point below 0x110000 is always valid"),
    }
}

/// Decodes one validated uppercase hex digit.
fn hex_nibble(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'A'..=b'F' => byte - b'A' + 10,
        _ => unreachable!("digit was validated as uppercase hex"),
    }
}

/// Returns the length of a multi-line opener (`"""`, a file-type indicator,
/// and a newline) at the start of `text`, or 0 if there is none.
fn multi_line_prefix_size(text: &str) -> usize {
    let Some(rest) = text.strip_prefix(MULTI_LINE_INDICATOR) else {
        return 0;
    };

    // The file-type indicator may not contain `"`, `#`, or a newline.
    for (i, byte) in rest.bytes().enumerate() {
        match byte {
            b'\n' => return MULTI_LINE_INDICATOR.len() + i + 1,
            b'"' | b'#' => return 0,
            _ => {}
        }
    }
    0
}

/// The indent range of the final line of `text`: the run of whitespace
/// between the last newline and the closing delimiter.
fn indent_of_final_line(text: &str) -> std::ops::Range<usize> {
    let bytes = text.as_bytes();
    let mut indent_end = bytes.len();
    let mut i = bytes.len();
    while i > 0 {
        i -= 1;
        if bytes[i] == b'\n' {
            return i + 1..indent_end;
        }
        if !is_space(bytes[i]) {
            indent_end = i;
        }
    }
    unreachable!("multi-line token text always contains a newline")
}
