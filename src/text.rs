//!
//! Text accepted for property names, string values and comments.
//!
//! [`Text`] borrows UTF-8 (`&str` or raw bytes) or UTF-16 input, or a pre-escaped
//! [`EncodedText`]. Any of them can be written by either writer width.
//!

use crate::error::{Error, Result};
use crate::escape;
use crate::options::EscapeHandling;
use crate::writer::MAX_UNESCAPED_TOKEN_SIZE;
use std::fmt;

///
/// Borrowed text in one of the supported input forms.
///
#[derive(Debug, Copy, Clone)]
pub enum Text<'a> {
    /// UTF-8 text.
    Str(&'a str),
    /// UTF-8 bytes, validated when written.
    Utf8(&'a [u8]),
    /// UTF-16 units, rejected when written if a surrogate is unpaired.
    Utf16(&'a [u16]),
    /// Already escaped; copied verbatim.
    Encoded(&'a EncodedText),
}

impl<'a> Text<'a> {
    ///
    /// Length in code units of the input's own width.
    ///
    pub fn len(&self) -> usize {
        match self {
            Text::Str(text) => text.len(),
            Text::Utf8(bytes) => bytes.len(),
            Text::Utf16(units) => units.len(),
            Text::Encoded(encoded) => encoded.escaped.len(),
        }
    }

    /// True for empty text.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn resolve(self) -> Result<Resolved<'a>> {
        Ok(match self {
            Text::Str(text) => Resolved::Utf8 {
                bytes: text.as_bytes(),
                escaped: false,
            },
            Text::Utf8(bytes) => {
                std::str::from_utf8(bytes)?;
                Resolved::Utf8 {
                    bytes,
                    escaped: false,
                }
            }
            Text::Utf16(units) => Resolved::Utf16(units),
            Text::Encoded(encoded) => Resolved::Utf8 {
                bytes: encoded.escaped.as_bytes(),
                escaped: true,
            },
        })
    }
}

///
/// Text after UTF-8 validation, split by source width.
///
#[derive(Debug, Copy, Clone)]
pub(crate) enum Resolved<'a> {
    Utf8 { bytes: &'a [u8], escaped: bool },
    Utf16(&'a [u16]),
}

impl<'a> From<&'a str> for Text<'a> {
    fn from(text: &'a str) -> Self {
        Text::Str(text)
    }
}

impl<'a> From<&'a String> for Text<'a> {
    fn from(text: &'a String) -> Self {
        Text::Str(text)
    }
}

impl<'a> From<&'a [u8]> for Text<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Text::Utf8(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Text<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Text::Utf8(bytes)
    }
}

impl<'a> From<&'a [u16]> for Text<'a> {
    fn from(units: &'a [u16]) -> Self {
        Text::Utf16(units)
    }
}

impl<'a> From<&'a Vec<u16>> for Text<'a> {
    fn from(units: &'a Vec<u16>) -> Self {
        Text::Utf16(units)
    }
}

impl<'a> From<&'a EncodedText> for Text<'a> {
    fn from(encoded: &'a EncodedText) -> Self {
        Text::Encoded(encoded)
    }
}

///
/// A property name or string value escaped once, to be written many times.
///
/// ```
/// use json_emit::{EncodedText, JsonWriter, WriterOptions};
///
/// let name = EncodedText::encode("id\n")?;
/// assert_eq!(name.as_escaped(), "id\\n");
///
/// let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
/// writer.write_start_object()?;
/// writer.write_number(&name, 1)?;
/// writer.write_end_object()?;
/// assert_eq!(writer.into_string()?, "{\"id\\n\":1}");
/// # Ok::<(), json_emit::Error>(())
/// ```
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedText {
    value: Box<str>,
    escaped: Box<str>,
}

impl EncodedText {
    ///
    /// Escapes `text` with the minimal policy.
    ///
    pub fn encode<'a>(text: impl Into<Text<'a>>) -> Result<Self> {
        Self::encode_with(text, &EscapeHandling::Minimal)
    }

    ///
    /// Escapes `text` with the given policy.
    ///
    pub fn encode_with<'a>(text: impl Into<Text<'a>>, policy: &EscapeHandling) -> Result<Self> {
        let value: String = match text.into() {
            Text::Encoded(encoded) => return Ok(encoded.clone()),
            Text::Str(text) => text.to_owned(),
            Text::Utf8(bytes) => std::str::from_utf8(bytes)?.to_owned(),
            Text::Utf16(units) => String::from_utf16(units).map_err(|_| {
                crate::code_unit::validate_utf16(units)
                    .err()
                    .unwrap_or(Error::InvalidUtf16 { index: 0 })
            })?,
        };
        if value.len() > MAX_UNESCAPED_TOKEN_SIZE {
            return Err(Error::ValueTooLarge {
                len: value.len(),
                max: MAX_UNESCAPED_TOKEN_SIZE,
            });
        }

        let bytes = value.as_bytes();
        let escaped = match escape::needs_escaping(bytes, policy) {
            None => value.clone(),
            Some(first) => {
                let escaped = escape::escape(bytes, first, policy)?;
                std::str::from_utf8(escaped.units())?.to_owned()
            }
        };
        Ok(EncodedText {
            value: value.into_boxed_str(),
            escaped: escaped.into_boxed_str(),
        })
    }

    /// The original, unescaped text.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The escaped form, without surrounding quotes.
    pub fn as_escaped(&self) -> &str {
        &self.escaped
    }
}

impl fmt::Display for EncodedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.escaped)
    }
}
