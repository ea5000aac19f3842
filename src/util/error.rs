//! Error types for the PLY library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for PLY operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Malformed or incomplete header line
    #[error("Header line {line}: {reason}")]
    HeaderParse { line: usize, reason: String },

    /// Type token that is not part of the PLY type table
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Element not declared in the header
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Property not declared on the element
    #[error("Property not found: {element}.{property}")]
    PropertyNotFound { element: String, property: String },

    /// Request that contradicts the declared schema or element order
    #[error("Schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    /// Payload ended before the declared record count was reached
    #[error("Truncated element '{element}': expected {expected} records, got {actual}")]
    Truncated {
        element: String,
        expected: usize,
        actual: usize,
    },

    /// ASCII token that does not parse as the declared type
    #[error("Invalid value '{token}' in element '{element}'")]
    InvalidValue { element: String, token: String },

    /// Write session closed before every declared record was written
    #[error("Element '{element}' incomplete: declared {expected} records, wrote {actual}")]
    IncompleteElement {
        element: String,
        expected: usize,
        actual: usize,
    },

    /// Header already written, schema can no longer change
    #[error("Header is frozen and cannot be modified")]
    Frozen,

    /// Records written before the header
    #[error("Header has not been written yet")]
    HeaderNotWritten,

    /// Read session left mid-record by an earlier failure
    #[error("Session stopped inside element '{0}' after a failed read")]
    Poisoned(String),

    /// Session already closed
    #[error("Session is closed")]
    Closed,

    /// Stream ended at the given byte position
    #[error("Unexpected end of file at position {0}")]
    UnexpectedEof(u64),

    /// Invalid data structure in file
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a header parse error for a 1-based header line.
    pub fn header(line: usize, reason: impl Into<String>) -> Self {
        Self::HeaderParse {
            line,
            reason: reason.into(),
        }
    }

    /// Create a schema mismatch error.
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Result type alias for PLY operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::header(4, "unsupported type 'quux'");
        assert!(e.to_string().contains("line 4"));
        assert!(e.to_string().contains("quux"));

        let e = Error::Truncated {
            element: "vertex".to_string(),
            expected: 5,
            actual: 3,
        };
        let msg = e.to_string();
        assert!(msg.contains("vertex"));
        assert!(msg.contains('5'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
