//!
//! Property names, string values and comments.
//!

use super::{JsonWriter, MAX_TOKEN_SIZE, MAX_UNESCAPED_TOKEN_SIZE};
use crate::buffer::Cursor;
use crate::code_unit::{validate_utf16, CodeUnit};
use crate::error::{Error, Result, TokenType};
use crate::escape::{self, Escaped};
use crate::options::EscapeHandling;
use crate::text::{Resolved, Text};

///
/// A string body ready to be copied between quotes.
///
/// Clean input is borrowed as it is; input that needs escaping is escaped into
/// call-local scratch that is released when the body is dropped.
///
pub(crate) enum Body<'a> {
    Utf8(&'a [u8]),
    Utf16(&'a [u16]),
    EscapedUtf8(Escaped<u8>),
    EscapedUtf16(Escaped<u16>),
}

impl<'a> Body<'a> {
    pub(crate) fn name(text: Text<'a>, policy: &EscapeHandling) -> Result<Self> {
        Self::prepare(text, policy, |len, max| Error::PropertyNameTooLarge { len, max })
    }

    pub(crate) fn value(text: Text<'a>, policy: &EscapeHandling) -> Result<Self> {
        Self::prepare(text, policy, |len, max| Error::ValueTooLarge { len, max })
    }

    fn prepare(
        text: Text<'a>,
        policy: &EscapeHandling,
        too_large: fn(usize, usize) -> Error,
    ) -> Result<Self> {
        let max = match text {
            Text::Encoded(_) => MAX_TOKEN_SIZE,
            _ => MAX_UNESCAPED_TOKEN_SIZE,
        };
        if text.len() > max {
            return Err(too_large(text.len(), max));
        }

        Ok(match text.resolve()? {
            Resolved::Utf8 {
                bytes,
                escaped: true,
            } => Body::Utf8(bytes),
            Resolved::Utf8 { bytes, .. } => match escape::needs_escaping(bytes, policy) {
                None => Body::Utf8(bytes),
                Some(first) => Body::EscapedUtf8(escape::escape(bytes, first, policy)?),
            },
            Resolved::Utf16(units) => match escape::needs_escaping(units, policy) {
                None => Body::Utf16(units),
                Some(first) => Body::EscapedUtf16(escape::escape(units, first, policy)?),
            },
        })
    }

    /// Upper bound of units in the output width `T`.
    pub(crate) fn max_units<T: CodeUnit>(&self) -> usize {
        match self {
            Body::Utf8(bytes) => u8::max_units_in::<T>(bytes.len()),
            Body::Utf16(units) => u16::max_units_in::<T>(units.len()),
            Body::EscapedUtf8(escaped) => u8::max_units_in::<T>(escaped.units().len()),
            Body::EscapedUtf16(escaped) => u16::max_units_in::<T>(escaped.units().len()),
        }
    }

    pub(crate) fn write<T: CodeUnit>(&self, cursor: &mut Cursor<'_, T>) -> Result<()> {
        match self {
            Body::Utf8(bytes) => cursor.push_text(*bytes),
            Body::Utf16(units) => cursor.push_text(*units),
            Body::EscapedUtf8(escaped) => cursor.push_text(escaped.units()),
            Body::EscapedUtf16(escaped) => cursor.push_text(escaped.units()),
        }
    }

    fn write_quoted<T: CodeUnit>(&self, cursor: &mut Cursor<'_, T>) -> Result<()> {
        cursor.push(b'"');
        self.write(cursor)?;
        cursor.push(b'"');
        Ok(())
    }
}

fn check_comment<S: CodeUnit>(text: &[S]) -> Result<()> {
    let closes = text
        .windows(2)
        .any(|pair| pair[0].to_u32() == b'*' as u32 && pair[1].to_u32() == b'/' as u32);
    if closes {
        Err(Error::InvalidComment)
    } else {
        Ok(())
    }
}

impl<T: CodeUnit> JsonWriter<T> {
    ///
    /// Writes a property name and its `:`. The value must follow.
    ///
    /// ```
    /// use json_emit::{JsonWriter, WriterOptions};
    ///
    /// let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
    /// writer.write_start_object()?;
    /// writer.write_property_name("a")?;
    /// writer.write_number_value(1)?;
    /// writer.write_end_object()?;
    /// assert_eq!(writer.into_string()?, r#"{"a":1}"#);
    /// # Ok::<(), json_emit::Error>(())
    /// ```
    ///
    pub fn write_property_name<'a>(&mut self, name: impl Into<Text<'a>>) -> Result<()> {
        let name = Body::name(name.into(), &self.options.escape_handling)?;
        self.validate_property()?;
        let prefix = self.prefix();
        self.write_token(prefix, Some(&name), 0, |_| Ok(()))?;
        self.needs_separator = false;
        self.token_type = TokenType::PropertyName;
        Ok(())
    }

    ///
    /// Writes a quoted, escaped string value.
    ///
    pub fn write_string_value<'a>(&mut self, value: impl Into<Text<'a>>) -> Result<()> {
        let value = Body::value(value.into(), &self.options.escape_handling)?;
        let len = value.max_units::<T>().saturating_add(2);
        self.write_value_token(None, TokenType::String, len, |cursor| {
            value.write_quoted(cursor)
        })
    }

    ///
    /// Writes a property name followed by a string value.
    ///
    /// Name and value may come in different widths; both are transcoded to the
    /// writer's width.
    ///
    pub fn write_string<'a, 'b>(
        &mut self,
        name: impl Into<Text<'a>>,
        value: impl Into<Text<'b>>,
    ) -> Result<()> {
        let name = Body::name(name.into(), &self.options.escape_handling)?;
        let value = Body::value(value.into(), &self.options.escape_handling)?;
        let len = value.max_units::<T>().saturating_add(2);
        self.write_value_token(Some(&name), TokenType::String, len, |cursor| {
            value.write_quoted(cursor)
        })
    }

    ///
    /// Writes `/*comment*/`.
    ///
    /// The text is copied as it is, without escaping, and must not contain `*/`.
    /// Comments are not tokens: they take no separator and do not change what may
    /// be written next.
    ///
    pub fn write_comment_value<'a>(&mut self, comment: impl Into<Text<'a>>) -> Result<()> {
        let comment = comment.into();
        if comment.len() > MAX_UNESCAPED_TOKEN_SIZE {
            return Err(Error::ValueTooLarge {
                len: comment.len(),
                max: MAX_UNESCAPED_TOKEN_SIZE,
            });
        }
        match comment.resolve()? {
            Resolved::Utf8 { bytes, .. } => {
                check_comment(bytes)?;
                self.write_comment(bytes)
            }
            Resolved::Utf16(units) => {
                validate_utf16(units)?;
                check_comment(units)?;
                self.write_comment(units)
            }
        }
    }

    fn write_comment<S: CodeUnit>(&mut self, text: &[S]) -> Result<()> {
        let mut prefix = self.prefix();
        prefix.separator = false;
        let len = S::max_units_in::<T>(text.len()).saturating_add(4);
        self.write_token(prefix, None, len, |cursor| {
            cursor.push_ascii(b"/*");
            cursor.push_text(text)?;
            cursor.push_ascii(b"*/");
            Ok(())
        })
    }
}
