//! Error types for xmlforge

use std::fmt;
use thiserror::Error;

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A pre-built element was attached under a key naming a different element
    MismatchedName { expected: String, actual: String },
    /// Not a valid element or attribute name
    InvalidName { name: String },
    /// A `#ns` value that cannot be used as a namespace URI
    InvalidNamespace { found: String },
    /// Text or attribute content holding a character XML cannot represent
    InvalidCharacter { ch: char },
    /// A structured value where only a scalar is allowed
    UnexpectedValue { key: String, found: &'static str },
    /// The root structure did not produce exactly one element
    InvalidRoot { count: usize },
    MaxDepthExceeded { max: u16 },
    UnknownEncoding { label: String },
    /// An element or attribute name the output encoding cannot carry
    UnrepresentableName { name: String, encoding: String },
    Io,
    Json,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MismatchedName { expected, actual } => write!(
                f,
                "element with name '{actual}' was added where name '{expected}' was expected"
            ),
            Self::InvalidName { name } => write!(f, "invalid name: '{name}'"),
            Self::InvalidNamespace { found } => write!(f, "invalid namespace: {found}"),
            Self::InvalidCharacter { ch } => {
                write!(f, "character U+{:04X} is not allowed in XML", u32::from(*ch))
            }
            Self::UnexpectedValue { key, found } => {
                write!(f, "expected a scalar for '{key}', found {found}")
            }
            Self::InvalidRoot { count } => {
                write!(f, "root must produce exactly one element, produced {count}")
            }
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::UnknownEncoding { label } => write!(f, "unknown encoding: {label}"),
            Self::UnrepresentableName { name, encoding } => {
                write!(f, "name '{name}' cannot be written in {encoding}")
            }
            Self::Io => write!(f, "i/o error"),
            Self::Json => write!(f, "invalid json"),
        }
    }
}

/// Main error type for xmlforge
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        let message = kind.to_string();
        Self { kind, message }
    }

    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn mismatched_name(expected: &str, actual: &str) -> Self {
        Self::new(ErrorKind::MismatchedName {
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }

    pub(crate) fn invalid_name(name: &str) -> Self {
        Self::new(ErrorKind::InvalidName {
            name: name.to_string(),
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::with_message(ErrorKind::Io, format!("i/o error: {err}"))
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::with_message(ErrorKind::Json, format!("invalid json: {err}"))
    }
}

/// Result type alias for xmlforge
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_name_display() {
        let err = Error::mismatched_name("expected", "actual");
        assert_eq!(
            err.to_string(),
            "element with name 'actual' was added where name 'expected' was expected"
        );
        assert_eq!(
            err.kind(),
            &ErrorKind::MismatchedName {
                expected: "expected".to_string(),
                actual: "actual".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_character_display() {
        let err = Error::new(ErrorKind::InvalidCharacter { ch: '\u{1}' });
        assert_eq!(err.message(), "character U+0001 is not allowed in XML");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = Error::from(io);
        assert_eq!(err.kind(), &ErrorKind::Io);
        assert!(err.message().contains("disk on fire"));
    }
}
