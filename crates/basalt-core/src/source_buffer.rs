// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source buffers: the text handed to the lexer.
//!
//! A [`SourceBuffer`] owns a filename and the complete source text. The
//! front-end requires offsets to fit in 31 bits, so construction rejects
//! content of `i32::MAX` bytes or more up front; everything downstream can
//! then store offsets as `u32` without checking.

use std::fs;
use std::io;

use miette::Diagnostic;
use thiserror::Error;

/// A fatal, buffer-level problem. Unlike lexical and parse diagnostics,
/// these abort the run before any analysis happens.
#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    /// The content is too large for 31-bit byte offsets.
    #[error("input too large: {size} bytes in {filename}")]
    #[diagnostic(code(basalt::input_too_large))]
    TooLarge {
        /// The offending file.
        filename: String,
        /// Its size in bytes.
        size: u64,
    },

    /// The file could not be read.
    #[error("could not read {filename}")]
    #[diagnostic(code(basalt::unreadable_input))]
    Unreadable {
        /// The offending file.
        filename: String,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// An owned filename plus source text.
///
/// # Examples
///
/// ```
/// use basalt_core::source_buffer::SourceBuffer;
///
/// let buffer = SourceBuffer::from_text("fn f() {}", "main.bst").unwrap();
/// assert_eq!(buffer.filename(), "main.bst");
/// assert_eq!(buffer.text(), "fn f() {}");
/// ```
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    filename: String,
    text: String,
}

/// Offsets must fit in 31 bits.
const MAX_CONTENT_SIZE: u64 = i32::MAX as u64;

impl SourceBuffer {
    /// Creates a buffer from in-memory text.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::TooLarge`] if the text has `i32::MAX` bytes
    /// or more.
    pub fn from_text(
        text: impl Into<String>,
        filename: impl Into<String>,
    ) -> Result<Self, SourceError> {
        let text = text.into();
        let filename = filename.into();
        if text.len() as u64 >= MAX_CONTENT_SIZE {
            return Err(SourceError::TooLarge {
                filename,
                size: text.len() as u64,
            });
        }
        Ok(Self { filename, text })
    }

    /// Reads a buffer from a file.
    ///
    /// The size check runs against file metadata before the read so an
    /// oversized file is rejected without loading it. The file must be
    /// valid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unreadable`] if the file cannot be read and
    /// [`SourceError::TooLarge`] if it has `i32::MAX` bytes or more.
    pub fn from_file(filename: impl Into<String>) -> Result<Self, SourceError> {
        let filename = filename.into();

        let metadata = fs::metadata(&filename).map_err(|source| SourceError::Unreadable {
            filename: filename.clone(),
            source,
        })?;
        if metadata.len() >= MAX_CONTENT_SIZE {
            return Err(SourceError::TooLarge {
                filename,
                size: metadata.len(),
            });
        }

        let text = fs::read_to_string(&filename).map_err(|source| SourceError::Unreadable {
            filename: filename.clone(),
            source,
        })?;
        Self::from_text(text, filename)
    }

    /// Returns the filename the buffer was created with.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_accepts_empty() {
        let buffer = SourceBuffer::from_text("", "empty.bst").unwrap();
        assert_eq!(buffer.text(), "");
    }

    #[test]
    fn from_text_keeps_content() {
        let buffer = SourceBuffer::from_text("var x: i32 = 0;", "x.bst").unwrap();
        assert_eq!(buffer.text(), "var x: i32 = 0;");
        assert_eq!(buffer.filename(), "x.bst");
    }

    #[test]
    fn from_file_missing_is_unreadable() {
        let err = SourceBuffer::from_file("/no/such/file.bst").unwrap_err();
        assert!(matches!(err, SourceError::Unreadable { .. }));
    }

    #[test]
    fn too_large_error_reports_size() {
        // Constructing a 2 GiB string in a unit test is not practical, so
        // exercise the error type directly.
        let err = SourceError::TooLarge {
            filename: "big.bst".into(),
            size: MAX_CONTENT_SIZE,
        };
        assert!(err.to_string().contains("input too large"));
    }
}
