// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! ASCII byte classification for the lexer.
//!
//! The lexer and its literal sub-lexers scan byte-by-byte, so these
//! predicates work on `u8` rather than `char`. All are constant-time and
//! total; bytes outside ASCII simply fall in no class.

/// Returns true for `0-9`.
#[must_use]
pub const fn is_decimal_digit(byte: u8) -> bool {
    byte.is_ascii_digit()
}

/// Returns true for `0` and `1`.
#[must_use]
pub const fn is_binary_digit(byte: u8) -> bool {
    matches!(byte, b'0' | b'1')
}

/// Returns true for `a-f`.
#[must_use]
pub const fn is_lower_hex_digit(byte: u8) -> bool {
    matches!(byte, b'a'..=b'f')
}

/// Returns true for `0-9` and `A-F`.
///
/// Basalt hexadecimal literals and `\x`/`\u` escapes require uppercase
/// digits, so this is the predicate the literal sub-lexers use.
#[must_use]
pub const fn is_upper_hex_digit(byte: u8) -> bool {
    matches!(byte, b'0'..=b'9' | b'A'..=b'F')
}

/// Returns true for ASCII letters and digits.
#[must_use]
pub const fn is_alnum(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
}

/// Returns true for `a-z`.
#[must_use]
pub const fn is_lower(byte: u8) -> bool {
    byte.is_ascii_lowercase()
}

/// Returns true for space and tab.
#[must_use]
pub const fn is_horizontal_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t')
}

/// Returns true for any whitespace byte the lexer skips between tokens:
/// horizontal whitespace plus `\n`, `\r`, vertical tab, and form feed.
#[must_use]
pub const fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | b'\x0B' | b'\x0C')
}

/// Returns true for space, tab, and newline.
///
/// This is the set the multi-line string decoder treats as ignorable when
/// computing closing-line indentation and trimming line ends.
#[must_use]
pub const fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n')
}
