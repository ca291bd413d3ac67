// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The numeric-literal sub-lexer.
//!
//! Numeric literals are recognized greedily and validated afterwards, so a
//! malformed literal like `0x1G` still forms a single token with a single
//! diagnostic rather than splitting into surprising pieces. Recognition
//! ([`LexedNumericLiteral::lex`]) only locates the token text and the
//! positions of the radix point and exponent introducer; decoding
//! ([`LexedNumericLiteral::compute_value`]) runs the validation pipeline
//! and produces an arbitrary-precision value.
//!
//! The grammar, informally:
//!
//! ```text
//! [0x|0b] digits [. digits [e|p [+|-] digits]]
//! ```
//!
//! with `_` digit separators permitted in the integer and exponent parts,
//! subject to placement rules (every 4 digits from the right in decimal,
//! every 5 in hexadecimal where the hex digits come in groups of 4).

use num_bigint::{BigInt, BigUint};

use crate::diagnostics::{Diagnostic, DiagnosticSink};

use super::char_set::{is_alnum, is_binary_digit, is_decimal_digit, is_lower, is_upper_hex_digit};
use super::Span;

/// Diagnostic code for malformed numeric literals.
const INVALID_NUMBER: &str = "syntax-invalid-number";
/// Diagnostic code for legal-but-irregular digit separator placement.
const IRREGULAR_SEPARATORS: &str = "syntax-irregular-digit-separators";

/// A recognized numeric literal, before validation.
///
/// `radix_point` and `exponent` are byte indices into `text`; either is
/// `text.len()` when the corresponding part is absent.
#[derive(Debug, Clone, Copy)]
pub struct LexedNumericLiteral<'src> {
    text: &'src str,
    radix_point: usize,
    exponent: usize,
}

/// The decoded value of a numeric literal token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericValue {
    /// Validation failed. The token still exists; downstream consumers use
    /// this to avoid piling secondary diagnostics onto one bad literal.
    Error,
    /// An integer literal's value.
    Integer(BigUint),
    /// A real literal's value.
    Real(RealValue),
}

/// The decoded value of a real literal: `mantissa * radix^exponent`.
///
/// Hexadecimal reals are scaled to binary: `0x1.8p+0` decodes with
/// `radix == 2`, mantissa `0x18`, exponent `-4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealValue {
    /// 10 for decimal literals, 2 for hexadecimal ones.
    pub radix: u32,
    /// The combined integer and fractional digits.
    pub mantissa: BigUint,
    /// The stated exponent minus the excess from fractional digits.
    pub exponent: BigInt,
}

impl<'src> LexedNumericLiteral<'src> {
    /// Recognizes a numeric literal at the start of `source_text`.
    ///
    /// Returns `None` (consuming nothing) unless the first byte is a
    /// decimal digit. Consumption is greedy: anything alphanumeric or `_`
    /// extends the token, `.` is absorbed when followed by an alphanumeric
    /// byte, and `+`/`-` only directly after a candidate exponent
    /// introducer. Validation happens later, in [`Self::compute_value`].
    #[must_use]
    pub fn lex(source_text: &'src str) -> Option<Self> {
        let bytes = source_text.as_bytes();
        if bytes.first().copied().is_none_or(|b| !is_decimal_digit(b)) {
            return None;
        }

        let mut radix_point = None;
        let mut exponent = None;

        let mut seen_plus_minus = false;
        let mut seen_radix_point = false;
        let mut seen_potential_exponent = false;

        let mut i = 1;
        while i < bytes.len() {
            let byte = bytes[i];
            if is_alnum(byte) || byte == b'_' {
                // A lowercase letter after the radix point is a candidate
                // exponent introducer; the last one before `+`/`-` wins.
                if is_lower(byte) && seen_radix_point && !seen_plus_minus {
                    exponent = Some(i);
                    seen_potential_exponent = true;
                }
                i += 1;
                continue;
            }

            if byte == b'.' && !seen_radix_point && i + 1 < bytes.len() && is_alnum(bytes[i + 1]) {
                radix_point = Some(i);
                seen_radix_point = true;
                i += 1;
                continue;
            }

            if (byte == b'+' || byte == b'-')
                && seen_potential_exponent
                && exponent == Some(i - 1)
                && i + 1 < bytes.len()
                && is_alnum(bytes[i + 1])
            {
                debug_assert!(!seen_plus_minus, "should only absorb one + or -");
                seen_plus_minus = true;
                i += 1;
                continue;
            }

            break;
        }

        Some(Self {
            text: &source_text[..i],
            radix_point: radix_point.unwrap_or(i),
            exponent: exponent.unwrap_or(i),
        })
    }

    /// Returns the token text.
    #[must_use]
    pub fn text(&self) -> &'src str {
        self.text
    }

    /// Returns true when the literal has no radix point. This is the
    /// integer/real split: validity is a separate question answered by
    /// [`Self::compute_value`].
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.radix_point == self.text.len()
    }

    /// Validates the literal and decodes its value.
    ///
    /// `offset` is the absolute byte offset of the literal within the
    /// source buffer, used to key diagnostics. Every validation failure
    /// emits through `sink` and yields [`NumericValue::Error`]; a valid
    /// literal decodes to an integer or real value.
    #[must_use]
    pub fn compute_value(&self, offset: u32, sink: &mut dyn DiagnosticSink) -> NumericValue {
        let mut parser = NumericParser::new(self, offset, sink);

        if !parser.check() {
            return NumericValue::Error;
        }

        if parser.is_integer() {
            NumericValue::Integer(parser.mantissa())
        } else {
            NumericValue::Real(RealValue {
                radix: if parser.radix == 10 { 10 } else { 2 },
                mantissa: parser.mantissa(),
                exponent: parser.exponent(),
            })
        }
    }
}

/// Result of checking one digit sequence.
struct DigitSequenceCheck {
    ok: bool,
    has_digit_separators: bool,
}

/// Validation and decoding state for one literal.
struct NumericParser<'a, 'src> {
    sink: &'a mut dyn DiagnosticSink,
    literal: &'a LexedNumericLiteral<'src>,
    offset: u32,

    /// The radix of the literal: 2, 10, or 16.
    radix: u32,

    // [radix prefix] int_part [. fract_part [[ep] [+-] exponent_part]]
    int_part: &'src str,
    /// Byte index of `int_part` within the literal text (0, or 2 after a
    /// radix prefix).
    int_start: usize,
    fract_part: &'src str,
    exponent_part: &'src str,
    exponent_start: usize,

    mantissa_needs_cleaning: bool,
    exponent_needs_cleaning: bool,

    /// True if a `-` introduced `exponent_part`.
    exponent_is_negative: bool,
}

impl<'a, 'src> NumericParser<'a, 'src> {
    fn new(
        literal: &'a LexedNumericLiteral<'src>,
        offset: u32,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        let text = literal.text;

        let mut radix = 10;
        let mut int_part = &text[..literal.radix_point];
        let mut int_start = 0;
        if let Some(stripped) = int_part.strip_prefix("0x") {
            radix = 16;
            int_part = stripped;
            int_start = 2;
        } else if let Some(stripped) = int_part.strip_prefix("0b") {
            radix = 2;
            int_part = stripped;
            int_start = 2;
        }

        let fract_part = if literal.radix_point < text.len() {
            &text[literal.radix_point + 1..literal.exponent]
        } else {
            ""
        };

        let mut exponent_part = if literal.exponent < text.len() {
            &text[literal.exponent + 1..]
        } else {
            ""
        };
        let mut exponent_start = literal.exponent + 1;
        let mut exponent_is_negative = false;
        if let Some(stripped) = exponent_part.strip_prefix('+') {
            exponent_part = stripped;
            exponent_start += 1;
        } else if let Some(stripped) = exponent_part.strip_prefix('-') {
            exponent_part = stripped;
            exponent_start += 1;
            exponent_is_negative = true;
        }

        Self {
            sink,
            literal,
            offset,
            radix,
            int_part,
            int_start,
            fract_part,
            exponent_part,
            exponent_start,
            mantissa_needs_cleaning: false,
            exponent_needs_cleaning: false,
            exponent_is_negative,
        }
    }

    fn is_integer(&self) -> bool {
        self.literal.is_integer()
    }

    /// Runs the validation pipeline, short-circuiting on failure.
    fn check(&mut self) -> bool {
        self.check_leading_zero()
            && self.check_int_part()
            && self.check_fractional_part()
            && self.check_exponent_part()
    }

    /// Emits an error keyed to a byte range within the literal.
    fn error_at(&mut self, code: &'static str, message: String, start: usize, len: usize) {
        let start = self.offset + start as u32;
        self.sink.emit(Diagnostic::error(
            code,
            message,
            Span::new(start, start + len as u32),
        ));
    }

    fn check_leading_zero(&mut self) -> bool {
        if self.radix == 10 && self.int_part.starts_with('0') && self.int_part != "0" {
            self.error_at(
                INVALID_NUMBER,
                "unknown base specifier in numeric literal".to_string(),
                self.int_start,
                1,
            );
            return false;
        }
        true
    }

    fn check_int_part(&mut self) -> bool {
        let result = self.check_digit_sequence(self.int_part, self.int_start, self.radix, true);
        self.mantissa_needs_cleaning |= result.has_digit_separators;
        result.ok
    }

    fn check_fractional_part(&mut self) -> bool {
        if self.is_integer() {
            return true;
        }

        let mut ok = true;
        if self.radix == 2 {
            self.error_at(
                INVALID_NUMBER,
                "binary real number literals are not supported".to_string(),
                self.literal.radix_point,
                1,
            );
            ok = false;
        }

        // The mantissa spans the radix point, which always gets stripped.
        self.mantissa_needs_cleaning = true;

        let fract_start = self.literal.radix_point + 1;
        ok & self
            .check_digit_sequence(self.fract_part, fract_start, self.radix, false)
            .ok
    }

    fn check_exponent_part(&mut self) -> bool {
        if self.literal.exponent == self.literal.text.len() {
            return true;
        }

        let expected = if self.radix == 10 { 'e' } else { 'p' };
        if self.literal.text.as_bytes()[self.literal.exponent] != expected as u8 {
            self.error_at(
                INVALID_NUMBER,
                format!("expected '{expected}' to introduce exponent"),
                self.literal.exponent,
                1,
            );
            return false;
        }

        let result =
            self.check_digit_sequence(self.exponent_part, self.exponent_start, 10, true);
        self.exponent_needs_cleaning = result.has_digit_separators;
        result.ok
    }

    /// Validates one run of digits in the given radix.
    ///
    /// Digit separators, when allowed, must not start or end the sequence
    /// or double up; if any are present and the radix has a grouping rule,
    /// placement is checked afterwards. Hexadecimal digits must be
    /// uppercase.
    fn check_digit_sequence(
        &mut self,
        text: &'src str,
        start: usize,
        radix: u32,
        allow_digit_separators: bool,
    ) -> DigitSequenceCheck {
        debug_assert!(matches!(radix, 2 | 10 | 16), "unknown radix");
        let valid_digit = match radix {
            2 => is_binary_digit,
            10 => is_decimal_digit,
            _ => is_upper_hex_digit,
        };

        let bytes = text.as_bytes();
        let mut num_digit_separators = 0usize;

        for (i, &byte) in bytes.iter().enumerate() {
            if valid_digit(byte) {
                continue;
            }

            if byte == b'_' {
                if !allow_digit_separators
                    || i == 0
                    || bytes[i - 1] == b'_'
                    || i + 1 == bytes.len()
                {
                    self.error_at(
                        INVALID_NUMBER,
                        "misplaced digit separator in numeric literal".to_string(),
                        start + i,
                        1,
                    );
                }
                num_digit_separators += 1;
                continue;
            }

            let radix_name = match radix {
                2 => "binary",
                10 => "decimal",
                _ => "hexadecimal",
            };
            self.error_at(
                INVALID_NUMBER,
                format!("invalid digit '{}' in {radix_name} numeric literal", byte as char),
                start + i,
                1,
            );
            return DigitSequenceCheck {
                ok: false,
                has_digit_separators: false,
            };
        }

        if num_digit_separators == bytes.len() {
            self.error_at(
                INVALID_NUMBER,
                "empty digit sequence in numeric literal".to_string(),
                start,
                bytes.len().max(1),
            );
            return DigitSequenceCheck {
                ok: false,
                has_digit_separators: false,
            };
        }

        if num_digit_separators > 0 {
            self.check_digit_separator_placement(text, start, radix, num_digit_separators);
        }

        DigitSequenceCheck {
            ok: true,
            has_digit_separators: num_digit_separators > 0,
        }
    }

    /// Checks that separators group digits regularly from the right: every
    /// 3 digits in decimal (stride 4 with the separator), every 4 in
    /// hexadecimal (stride 5). Binary has no grouping rule.
    fn check_digit_separator_placement(
        &mut self,
        text: &'src str,
        start: usize,
        radix: u32,
        num_digit_separators: usize,
    ) {
        if radix == 2 {
            return;
        }
        debug_assert!(
            matches!(radix, 10 | 16),
            "unexpected radix for digit separator checks"
        );
        debug_assert_eq!(
            text.bytes().filter(|&b| b == b'_').count(),
            num_digit_separators,
            "given wrong number of digit separators"
        );

        let (radix_name, group) = if radix == 10 {
            ("decimal", "3")
        } else {
            ("hexadecimal", "4")
        };
        let message = format!(
            "digit separators in {radix_name} number should appear every {group} characters \
             from the right"
        );

        let stride = if radix == 10 { 4 } else { 5 };
        let bytes = text.as_bytes();
        let mut remaining = num_digit_separators;
        let mut pos = bytes.len();
        while pos >= stride {
            pos -= stride;
            if bytes[pos] != b'_' {
                self.error_at(IRREGULAR_SEPARATORS, message, start, text.len());
                return;
            }
            remaining -= 1;
        }

        if remaining != 0 {
            self.error_at(IRREGULAR_SEPARATORS, message, start, text.len());
        }
    }

    /// Decodes the mantissa: the integer and fractional digits, separators
    /// and radix point stripped, in the literal's radix.
    fn mantissa(&self) -> BigUint {
        let digits = if self.is_integer() {
            self.int_part.to_string()
        } else {
            self.literal.text[self.int_start..self.literal.exponent].to_string()
        };
        let digits: String = if self.mantissa_needs_cleaning {
            digits.chars().filter(|&c| c != '_' && c != '.').collect()
        } else {
            digits
        };
        parse_digits(&digits, self.radix)
    }

    /// Decodes the exponent, negated if introduced by `-`, then shifted
    /// down by the excess exponent the fractional digits represent: one
    /// per decimal fractional digit, four per hexadecimal one.
    fn exponent(&self) -> BigInt {
        let mut exponent = if self.exponent_part.is_empty() {
            BigInt::ZERO
        } else {
            let digits: String = if self.exponent_needs_cleaning {
                self.exponent_part.chars().filter(|&c| c != '_').collect()
            } else {
                self.exponent_part.to_string()
            };
            BigInt::from(parse_digits(&digits, 10))
        };

        if self.exponent_is_negative {
            exponent = -exponent;
        }

        let mut excess_exponent = self.fract_part.len();
        if self.radix == 16 {
            excess_exponent *= 4;
        }
        exponent - BigInt::from(excess_exponent)
    }
}

/// Parses a pre-validated digit string. Failure here is a lexer bug.
fn parse_digits(digits: &str, radix: u32) -> BigUint {
    match BigUint::parse_bytes(digits.as_bytes(), radix) {
        Some(value) => value,
        None => unreachable!("digit sequence {digits:?} was validated for radix {radix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticList;

    fn lex(text: &str) -> LexedNumericLiteral<'_> {
        LexedNumericLiteral::lex(text).expect("should recognize a numeric literal")
    }

    /// Decodes a literal, returning the value and any diagnostic codes.
    fn decode(text: &str) -> (NumericValue, Vec<&'static str>) {
        let literal = lex(text);
        assert_eq!(literal.text(), text, "test input should be one literal");
        let mut diagnostics = DiagnosticList::new();
        let value = literal.compute_value(0, &mut diagnostics);
        let codes = diagnostics.iter().map(|d| d.code).collect();
        (value, codes)
    }

    fn integer(value: u64) -> NumericValue {
        NumericValue::Integer(BigUint::from(value))
    }

    fn real(radix: u32, mantissa: u64, exponent: i64) -> NumericValue {
        NumericValue::Real(RealValue {
            radix,
            mantissa: BigUint::from(mantissa),
            exponent: BigInt::from(exponent),
        })
    }

    #[test]
    fn lex_requires_leading_digit() {
        assert!(LexedNumericLiteral::lex("x10").is_none());
        assert!(LexedNumericLiteral::lex("").is_none());
        assert!(LexedNumericLiteral::lex(".5").is_none());
    }

    #[test]
    fn lex_stops_at_token_boundary() {
        assert_eq!(lex("42 + 7").text(), "42");
        assert_eq!(lex("42+7").text(), "42");
        assert_eq!(lex("1.5;").text(), "1.5");
        // `.` not followed by an alphanumeric byte ends the literal.
        assert_eq!(lex("42.foo").text(), "42.foo");
        assert_eq!(lex("42. ").text(), "42");
    }

    #[test]
    fn lex_absorbs_sign_only_after_exponent() {
        assert_eq!(lex("1.5e+2").text(), "1.5e+2");
        assert_eq!(lex("1.5e-2").text(), "1.5e-2");
        // No radix point means no exponent introducer, so `+` stays out.
        assert_eq!(lex("1e+2").text(), "1e");
        // A sign not directly after the introducer stays out.
        assert_eq!(lex("1.5e2+3").text(), "1.5e2");
    }

    #[test]
    fn lex_records_radix_point_and_exponent() {
        let literal = lex("1.5e+2");
        assert_eq!(literal.radix_point, 1);
        assert_eq!(literal.exponent, 3);

        let literal = lex("42");
        assert_eq!(literal.radix_point, 2);
        assert_eq!(literal.exponent, 2);
    }

    #[test]
    fn is_integer_follows_the_radix_point() {
        assert!(lex("42").is_integer());
        assert!(lex("0x1F").is_integer());
        assert!(!lex("1.5").is_integer());
        assert!(!lex("0x1.8p+0").is_integer());
    }

    #[test]
    fn decode_simple_integer() {
        assert_eq!(decode("42"), (integer(42), vec![]));
        assert_eq!(decode("0"), (integer(0), vec![]));
    }

    #[test]
    fn decode_radix_prefixes() {
        assert_eq!(decode("0x1F"), (integer(31), vec![]));
        assert_eq!(decode("0b1010"), (integer(10), vec![]));
    }

    #[test]
    fn decode_well_placed_separators() {
        assert_eq!(decode("1_000"), (integer(1000), vec![]));
        assert_eq!(decode("12_345_678"), (integer(12_345_678), vec![]));
        // Hexadecimal groups four digits per separator.
        assert_eq!(decode("0x1_F000"), (integer(0x1_F000), vec![]));
        assert_eq!(decode("0xBEEF_F00D"), (integer(0xBEEF_F00D), vec![]));
        // Binary has no placement rule.
        assert_eq!(decode("0b10_1_0"), (integer(10), vec![]));
    }

    #[test]
    fn decode_irregular_separators_still_produces_value() {
        let (value, codes) = decode("1_00");
        assert_eq!(value, integer(100));
        assert_eq!(codes, vec!["syntax-irregular-digit-separators"]);

        let (value, codes) = decode("0x12_34");
        assert_eq!(value, integer(0x1234));
        assert_eq!(codes, vec!["syntax-irregular-digit-separators"]);

        // A hex separator with only three digits after it is irregular
        // too; the value still decodes.
        let (value, codes) = decode("0x1_F00");
        assert_eq!(value, integer(0x1F00));
        assert_eq!(codes, vec!["syntax-irregular-digit-separators"]);
    }

    #[test]
    fn decode_misplaced_separator() {
        let (value, codes) = decode("1__000_000");
        assert_eq!(value, integer(1_000_000));
        assert!(codes.contains(&"syntax-invalid-number"));
    }

    #[test]
    fn decode_leading_zero_is_unknown_base() {
        let (value, codes) = decode("0123");
        assert_eq!(value, NumericValue::Error);
        assert_eq!(codes, vec!["syntax-invalid-number"]);
    }

    #[test]
    fn decode_empty_digit_sequence() {
        let (value, codes) = decode("0x");
        assert_eq!(value, NumericValue::Error);
        assert_eq!(codes, vec!["syntax-invalid-number"]);
    }

    #[test]
    fn decode_invalid_digit() {
        let (value, codes) = decode("123abc");
        assert_eq!(value, NumericValue::Error);
        assert_eq!(codes, vec!["syntax-invalid-number"]);

        // Hexadecimal digits must be uppercase.
        let (value, codes) = decode("0x1f");
        assert_eq!(value, NumericValue::Error);
        assert_eq!(codes, vec!["syntax-invalid-number"]);

        let (value, codes) = decode("0b102");
        assert_eq!(value, NumericValue::Error);
        assert_eq!(codes, vec!["syntax-invalid-number"]);
    }

    #[test]
    fn decode_decimal_real() {
        assert_eq!(decode("1.5"), (real(10, 15, -1), vec![]));
        assert_eq!(decode("1.5e+2"), (real(10, 15, 1), vec![]));
        assert_eq!(decode("1.5e-2"), (real(10, 15, -3), vec![]));
        assert_eq!(decode("3.14159"), (real(10, 314_159, -5), vec![]));
    }

    #[test]
    fn decode_hex_real_scales_to_binary() {
        // 0x1.8 = 1.5: mantissa 0x18, one fractional hex digit = 4 binary
        // exponent positions.
        assert_eq!(decode("0x1.8p+0"), (real(2, 0x18, -4), vec![]));
        assert_eq!(decode("0x1.8p+4"), (real(2, 0x18, 0), vec![]));
        assert_eq!(decode("0x1.8"), (real(2, 0x18, -4), vec![]));
    }

    #[test]
    fn decode_binary_real_is_rejected() {
        let (value, codes) = decode("0b1.0");
        assert_eq!(value, NumericValue::Error);
        assert_eq!(codes, vec!["syntax-invalid-number"]);
    }

    #[test]
    fn decode_wrong_exponent_introducer() {
        // Decimal reals take `e`, hexadecimal take `p`.
        let (value, codes) = decode("0x1.8e+0");
        assert_eq!(value, NumericValue::Error);
        assert_eq!(codes, vec!["syntax-invalid-number"]);

        let (value, codes) = decode("1.5p+2");
        assert_eq!(value, NumericValue::Error);
        assert_eq!(codes, vec!["syntax-invalid-number"]);
    }

    #[test]
    fn decode_exponent_separators() {
        assert_eq!(decode("1.5e1_000"), (real(10, 15, 999), vec![]));
    }

    #[test]
    fn decode_matches_separator_free_spelling() {
        // Deleting legal separators never changes the value.
        let cases = [("1_000", "1000"), ("0x1_F000", "0x1F000"), ("0b10_10", "0b1010")];
        for (with, without) in cases {
            let (a, a_codes) = decode(with);
            let (b, b_codes) = decode(without);
            assert_eq!(a, b, "{with} should equal {without}");
            assert!(a_codes.is_empty() && b_codes.is_empty());
        }
    }

    #[test]
    fn diagnostic_positions_are_offset() {
        let literal = lex("0b1.0");
        let mut diagnostics = DiagnosticList::new();
        let _ = literal.compute_value(10, &mut diagnostics);
        let diagnostic = diagnostics.iter().next().expect("one diagnostic");
        // The radix point is at index 3 of the literal, offset by 10.
        assert_eq!(diagnostic.span.start(), 13);
    }

    #[test]
    fn large_values_do_not_overflow() {
        let (value, codes) = decode("340_282_366_920_938_463_463_374_607_431_768_211_456");
        assert!(codes.is_empty());
        let expected = BigUint::from(2u32).pow(128);
        assert_eq!(value, NumericValue::Integer(expected));
    }
}
