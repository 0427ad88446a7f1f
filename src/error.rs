//!
//! Error types for the writer.
//!
//! Every check happens before any byte is committed to the output buffer, so an
//! `Err` never leaves a partially written token behind.
//!

use std::fmt;
use thiserror::Error;

///
/// The kind of token that was written last.
///
/// Used by the structural validator and by the indentation logic to decide whether
/// a separator or line break precedes the next token.
///
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TokenType {
    /// Nothing has been written yet.
    #[default]
    None,
    /// `{`
    BeginObject,
    /// `}`
    EndObject,
    /// `[`
    BeginArray,
    /// `]`
    EndArray,
    /// A member name including its `:`.
    PropertyName,
    /// A string value, including base64, GUID and date/time values.
    String,
    /// A number value.
    Number,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::None => "none",
            TokenType::BeginObject => "start of object",
            TokenType::EndObject => "end of object",
            TokenType::BeginArray => "start of array",
            TokenType::EndArray => "end of array",
            TokenType::PropertyName => "property name",
            TokenType::String => "string",
            TokenType::Number => "number",
            TokenType::True => "true",
            TokenType::False => "false",
            TokenType::Null => "null",
        };
        f.write_str(name)
    }
}

///
/// Which structural rule a call violated.
///
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StructuralErrorKind {
    /// Object or array started inside an object without a preceding property name.
    CannotStartContainerWithoutProperty,
    /// Object or array started at the root after a complete value.
    CannotStartContainerAfterPrimitiveOrClose,
    /// Property name written inside an array or at the root.
    CannotWritePropertyWithinArray,
    /// Two property names in a row.
    CannotWritePropertyAfterProperty,
    /// Value written inside an object without a preceding property name.
    CannotWriteValueWithinObject,
    /// Second value written at the root.
    CannotWriteValueAfterPrimitiveOrClose,
    /// End token does not match the innermost open container, or nothing is open,
    /// or a property name is still waiting for its value.
    MismatchedObjectArray,
}

impl fmt::Display for StructuralErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            StructuralErrorKind::CannotStartContainerWithoutProperty => {
                "cannot start an object or array inside an object without a property name"
            }
            StructuralErrorKind::CannotStartContainerAfterPrimitiveOrClose => {
                "cannot start an object or array after a complete top-level value"
            }
            StructuralErrorKind::CannotWritePropertyWithinArray => {
                "cannot write a property name outside of an object"
            }
            StructuralErrorKind::CannotWritePropertyAfterProperty => {
                "cannot write a property name directly after another property name"
            }
            StructuralErrorKind::CannotWriteValueWithinObject => {
                "cannot write a value within an object without a property name"
            }
            StructuralErrorKind::CannotWriteValueAfterPrimitiveOrClose => {
                "cannot write a value after a complete top-level value"
            }
            StructuralErrorKind::MismatchedObjectArray => {
                "end token does not match the innermost open container"
            }
        };
        f.write_str(message)
    }
}

///
/// All errors the writer can report.
///
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Growing the buffer would overflow `usize`.
    #[error("buffer capacity overflow: cannot grow {capacity} units by {requested}")]
    CapacityOverflow {
        /// Current capacity in code units.
        capacity: usize,
        /// Requested additional code units.
        requested: usize,
    },

    /// Illegal call sequence while validation is enabled.
    #[error("{kind} (last token: {token})")]
    Structural {
        /// The rule that was violated.
        kind: StructuralErrorKind,
        /// The token written before the offending call.
        token: TokenType,
    },

    /// Starting a container would exceed the maximum nesting depth.
    #[error("depth {depth} exceeds the maximum nesting depth of {max}")]
    DepthTooLarge {
        /// Depth the container would have had.
        depth: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Property name longer than the maximum token size.
    #[error("property name of {len} code units exceeds the maximum of {max}")]
    PropertyNameTooLarge {
        /// Length of the rejected name.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// String or binary value longer than the maximum token size.
    #[error("value of {len} units exceeds the maximum of {max}")]
    ValueTooLarge {
        /// Length of the rejected value.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// NaN or infinity has no JSON representation.
    #[error("non-finite number {0} cannot be written as JSON")]
    NonFiniteNumber(String),

    /// Pre-formatted number token does not follow the JSON number grammar.
    #[error("invalid JSON number: {0}")]
    InvalidNumber(String),

    /// Comment text contains the `*/` close delimiter.
    #[error("comment value must not contain '*/'")]
    InvalidComment,

    /// Byte input is not valid UTF-8.
    #[error("invalid UTF-8 input after {valid_up_to} valid bytes")]
    InvalidUtf8 {
        /// Number of valid leading bytes.
        valid_up_to: usize,
    },

    /// UTF-16 input contains an unpaired surrogate.
    #[error("invalid UTF-16 input: unpaired surrogate at index {index}")]
    InvalidUtf16 {
        /// Index of the offending code unit.
        index: usize,
    },

    /// Date/time outside the four-digit year range.
    #[error("year {0} cannot be written in round-trip date format")]
    DateTimeOutOfRange(i32),

    /// UTC offset with a seconds part, which `±hh:mm` cannot represent.
    #[error("UTC offset of {0} seconds is not a whole number of minutes")]
    OffsetNotWholeMinutes(i32),
}

impl Error {
    ///
    /// True for errors caused by an illegal call sequence.
    ///
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::Structural { .. } | Error::DepthTooLarge { .. })
    }

    ///
    /// True for errors caused by the content of an argument.
    ///
    pub fn is_argument(&self) -> bool {
        matches!(
            self,
            Error::PropertyNameTooLarge { .. }
                | Error::ValueTooLarge { .. }
                | Error::NonFiniteNumber(_)
                | Error::InvalidNumber(_)
                | Error::InvalidComment
                | Error::InvalidUtf8 { .. }
                | Error::InvalidUtf16 { .. }
                | Error::DateTimeOutOfRange(_)
                | Error::OffsetNotWholeMinutes(_)
        )
    }

    pub(crate) fn structural(kind: StructuralErrorKind, token: TokenType) -> Self {
        Error::Structural { kind, token }
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::InvalidUtf8 {
            valid_up_to: err.valid_up_to(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
