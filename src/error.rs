//! Typed error taxonomy shared by every fallible operation in this crate.
//!
//! Each failure category gets its own variant carrying the structured data a
//! caller would want (offending key, index, expected/found type names) in
//! addition to a human-readable `Display` message, so failures can be
//! `match`ed on rather than just printed.

use std::fmt;

/// A value's logical type, used in [`Error::Type`] to report what was expected
/// versus what was actually found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TypeName {
    Object,
    Array,
    String,
    Integer,
    Decimal,
    Boolean,
    Null,
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeName::Object => "object",
            TypeName::Array => "array",
            TypeName::String => "string",
            TypeName::Integer => "integer",
            TypeName::Decimal => "decimal",
            TypeName::Boolean => "boolean",
            TypeName::Null => "null",
        };
        f.write_str(name)
    }
}

/// Every fallible operation in this crate returns this error type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// An operation was attempted on a value of an incompatible logical type
    /// (a numeric accessor on a string, key lookup on a non-object, inserting
    /// an incompatible child).
    Type {
        /// What the operation required.
        expected: TypeName,
        /// What the value actually was.
        found: TypeName,
    },
    /// An operation is illegal in the value's current lifecycle state
    /// (mutating an immutable buffer, or reaching for the mutable
    /// representation of a value that is currently a buffer).
    State(&'static str),
    /// Byte-level validation failed while constructing a buffer from
    /// untrusted bytes.
    Parse(ParseFailure),
    /// Caller misuse: an out-of-range array index via a strict accessor, or a
    /// duplicate key passed to `insert`.
    Logic(LogicFailure),
    /// Allocation failure or an I/O failure surfaced by a parser adapter.
    Runtime(&'static str),
}

/// The specific reason a [`Error::Parse`] failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ParseFailure {
    /// The slice is shorter than the header claims.
    TruncatedHeader,
    /// A child offset points outside its parent's extent.
    OffsetOutOfBounds,
    /// A key offset does not point to a valid length-prefixed key within the
    /// object's extent.
    MalformedKey,
    /// Object keys as found in the payload are not strictly ascending.
    KeysNotSorted,
    /// The leading byte is not a recognized raw type.
    UnknownRawType(u8),
    /// A declared length does not fit the remaining slice.
    LengthOutOfBounds,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailure::TruncatedHeader => write!(f, "buffer shorter than its header declares"),
            ParseFailure::OffsetOutOfBounds => write!(f, "child offset points outside its parent's extent"),
            ParseFailure::MalformedKey => write!(f, "key length/bytes do not fit within the object's extent"),
            ParseFailure::KeysNotSorted => write!(f, "object keys are not strictly ascending"),
            ParseFailure::UnknownRawType(tag) => write!(f, "unrecognized raw type byte {tag:#04x}"),
            ParseFailure::LengthOutOfBounds => write!(f, "declared length does not fit the remaining bytes"),
        }
    }
}

/// The specific reason a [`Error::Logic`] failed.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum LogicFailure {
    /// `insert` was called with a key that already exists.
    DuplicateKey(Box<str>),
    /// A strict array accessor (`at`) was called with an out-of-range index.
    IndexOutOfRange { index: usize, len: usize },
    /// A strict object accessor was called with a key that does not exist.
    KeyNotFound(Box<str>),
}

impl fmt::Display for LogicFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicFailure::DuplicateKey(key) => write!(f, "key {key:?} already exists"),
            LogicFailure::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for array of length {len}")
            }
            LogicFailure::KeyNotFound(key) => write!(f, "key {key:?} not found"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Type { expected, found } => {
                write!(f, "type error: expected {expected}, found {found}")
            }
            Error::State(reason) => write!(f, "state error: {reason}"),
            Error::Parse(reason) => write!(f, "parse error: {reason}"),
            Error::Logic(reason) => write!(f, "logic error: {reason}"),
            Error::Runtime(reason) => write!(f, "runtime error: {reason}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Shorthand for [`Error::Type`].
    pub fn type_error(expected: TypeName, found: TypeName) -> Self {
        Error::Type { expected, found }
    }
}

#[test]
fn messages_are_human_readable() {
    let err = Error::type_error(TypeName::Integer, TypeName::String);
    assert_eq!(err.to_string(), "type error: expected integer, found string");

    let err = Error::Logic(LogicFailure::DuplicateKey("a".into()));
    assert_eq!(err.to_string(), "logic error: key \"a\" already exists");

    let err = Error::Parse(ParseFailure::KeysNotSorted);
    assert_eq!(err.to_string(), "parse error: object keys are not strictly ascending");
}
