//!
//! Numbers, literals, date/times, GUIDs and base64 values.
//!

use super::strings::Body;
use super::{JsonWriter, MAX_BASE64_VALUE_TOKEN_SIZE, MAX_TOKEN_SIZE};
use crate::buffer::Cursor;
use crate::code_unit::CodeUnit;
use crate::datetime::{JsonDateTime, MAX_DATE_TIME_LEN};
use crate::error::{Error, Result, TokenType};
use crate::escape::EscapeScratch;
use crate::number::{validate_number, JsonNumber};
use crate::text::{Resolved, Text};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use uuid::Uuid;

/// Hyphenated GUID length without quotes.
const GUID_LEN: usize = uuid::fmt::Hyphenated::LENGTH;

///
/// Pre-formatted number token after validation.
///
enum RawNumber<'a> {
    Utf8(&'a [u8]),
    Utf16(&'a [u16]),
}

impl<'a> RawNumber<'a> {
    fn parse(token: Text<'a>) -> Result<Self> {
        if token.len() > MAX_TOKEN_SIZE {
            return Err(Error::ValueTooLarge {
                len: token.len(),
                max: MAX_TOKEN_SIZE,
            });
        }
        Ok(match token.resolve()? {
            Resolved::Utf8 { bytes, .. } => {
                validate_number(bytes)?;
                RawNumber::Utf8(bytes)
            }
            Resolved::Utf16(units) => {
                validate_number(units)?;
                RawNumber::Utf16(units)
            }
        })
    }

    fn len(&self) -> usize {
        match self {
            RawNumber::Utf8(bytes) => bytes.len(),
            RawNumber::Utf16(units) => units.len(),
        }
    }

    fn write<T: CodeUnit>(&self, cursor: &mut Cursor<'_, T>) -> Result<()> {
        match self {
            RawNumber::Utf8(bytes) => cursor.push_text(*bytes),
            RawNumber::Utf16(units) => cursor.push_text(*units),
        }
    }
}

///
/// Base64 of `bytes` between quotes, encoded in place when the output is bytes.
///
fn write_base64<T: CodeUnit>(cursor: &mut Cursor<'_, T>, bytes: &[u8], encoded_len: usize) -> Result<()> {
    let overflow = || Error::CapacityOverflow {
        capacity: bytes.len(),
        requested: encoded_len,
    };
    cursor.push(b'"');
    match T::as_bytes_mut(cursor.free()) {
        Some(out) => {
            let written = BASE64_STANDARD
                .encode_slice(bytes, &mut out[..encoded_len])
                .map_err(|_| overflow())?;
            cursor.advance(written);
        }
        None => {
            let mut scratch = EscapeScratch::<u8>::new(encoded_len);
            let out = &mut scratch.as_mut_slice()[..encoded_len];
            let written = BASE64_STANDARD
                .encode_slice(bytes, out)
                .map_err(|_| overflow())?;
            cursor.push_ascii(&out[..written]);
        }
    }
    cursor.push(b'"');
    Ok(())
}

fn write_guid<T: CodeUnit>(cursor: &mut Cursor<'_, T>, value: &Uuid) {
    cursor.push(b'"');
    match T::as_bytes_mut(cursor.free()) {
        Some(out) => {
            value.hyphenated().encode_lower(&mut out[..GUID_LEN]);
            cursor.advance(GUID_LEN);
        }
        None => {
            let mut buf = [0u8; GUID_LEN];
            value.hyphenated().encode_lower(&mut buf);
            cursor.push_ascii(&buf);
        }
    }
    cursor.push(b'"');
}

fn base64_len(bytes: &[u8]) -> Result<usize> {
    if bytes.len() > MAX_BASE64_VALUE_TOKEN_SIZE {
        return Err(Error::ValueTooLarge {
            len: bytes.len(),
            max: MAX_BASE64_VALUE_TOKEN_SIZE,
        });
    }
    base64::encoded_len(bytes.len(), true).ok_or(Error::CapacityOverflow {
        capacity: bytes.len(),
        requested: bytes.len(),
    })
}

fn literal(value: bool) -> (&'static [u8], TokenType) {
    if value {
        (b"true", TokenType::True)
    } else {
        (b"false", TokenType::False)
    }
}

impl<T: CodeUnit> JsonWriter<T> {
    fn name_body<'a>(&self, name: impl Into<Text<'a>>) -> Result<Body<'a>> {
        Body::name(name.into(), &self.options.escape_handling)
    }

    fn write_number_token<N: JsonNumber>(&mut self, name: Option<&Body<'_>>, value: N) -> Result<()> {
        value.with_ascii(|ascii| {
            debug_assert!(ascii.len() <= N::MAX_LEN);
            self.write_value_token(name, TokenType::Number, N::MAX_LEN, |cursor| {
                cursor.push_ascii(ascii);
                Ok(())
            })
        })?
    }

    ///
    /// Writes an integer, float or decimal.
    ///
    /// NaN and infinities are rejected before anything is written.
    ///
    /// ```
    /// use json_emit::{Error, JsonWriter, WriterOptions};
    ///
    /// let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
    /// assert!(matches!(writer.write_number_value(f64::NAN), Err(Error::NonFiniteNumber(_))));
    /// assert_eq!(writer.written_count(), 0);
    /// writer.write_number_value(-1.5e-7)?;
    /// assert_eq!(writer.written(), b"-1.5e-7");
    /// # Ok::<(), json_emit::Error>(())
    /// ```
    ///
    pub fn write_number_value<N: JsonNumber>(&mut self, value: N) -> Result<()> {
        self.write_number_token(None, value)
    }

    /// Writes a property name followed by a number.
    pub fn write_number<'a, N: JsonNumber>(&mut self, name: impl Into<Text<'a>>, value: N) -> Result<()> {
        let name = self.name_body(name)?;
        self.write_number_token(Some(&name), value)
    }

    fn write_raw_number_token(&mut self, name: Option<&Body<'_>>, token: RawNumber<'_>) -> Result<()> {
        let len = match &token {
            RawNumber::Utf8(bytes) => u8::max_units_in::<T>(bytes.len()),
            RawNumber::Utf16(units) => u16::max_units_in::<T>(units.len()),
        };
        debug_assert!(len >= token.len());
        self.write_value_token(name, TokenType::Number, len, |cursor| token.write(cursor))
    }

    ///
    /// Writes a caller-formatted number token as it is, after checking it against
    /// the JSON number grammar.
    ///
    pub fn write_raw_number_value<'a>(&mut self, token: impl Into<Text<'a>>) -> Result<()> {
        let token = RawNumber::parse(token.into())?;
        self.write_raw_number_token(None, token)
    }

    /// Writes a property name followed by a caller-formatted number token.
    pub fn write_raw_number<'a, 'b>(
        &mut self,
        name: impl Into<Text<'a>>,
        token: impl Into<Text<'b>>,
    ) -> Result<()> {
        let name = self.name_body(name)?;
        let token = RawNumber::parse(token.into())?;
        self.write_raw_number_token(Some(&name), token)
    }

    /// Writes `true` or `false`.
    pub fn write_bool_value(&mut self, value: bool) -> Result<()> {
        let (text, token) = literal(value);
        self.write_value_token(None, token, text.len(), |cursor| {
            cursor.push_ascii(text);
            Ok(())
        })
    }

    /// Writes a property name followed by `true` or `false`.
    pub fn write_bool<'a>(&mut self, name: impl Into<Text<'a>>, value: bool) -> Result<()> {
        let name = self.name_body(name)?;
        let (text, token) = literal(value);
        self.write_value_token(Some(&name), token, text.len(), |cursor| {
            cursor.push_ascii(text);
            Ok(())
        })
    }

    /// Writes `null`.
    pub fn write_null_value(&mut self) -> Result<()> {
        self.write_value_token(None, TokenType::Null, 4, |cursor| {
            cursor.push_ascii(b"null");
            Ok(())
        })
    }

    /// Writes a property name followed by `null`.
    pub fn write_null<'a>(&mut self, name: impl Into<Text<'a>>) -> Result<()> {
        let name = self.name_body(name)?;
        self.write_value_token(Some(&name), TokenType::Null, 4, |cursor| {
            cursor.push_ascii(b"null");
            Ok(())
        })
    }

    fn write_date_time_token(&mut self, name: Option<&Body<'_>>, value: impl JsonDateTime) -> Result<()> {
        let mut buf = [0u8; MAX_DATE_TIME_LEN];
        let len = value.format_round_trip(&mut buf)?;
        let formatted = &buf[..len];
        self.write_value_token(name, TokenType::String, len + 2, |cursor| {
            cursor.push(b'"');
            cursor.push_ascii(formatted);
            cursor.push(b'"');
            Ok(())
        })
    }

    ///
    /// Writes a date/time as a round-trip ISO 8601 string.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use json_emit::{JsonWriter, WriterOptions};
    ///
    /// let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
    /// writer.write_date_time_value(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())?;
    /// assert_eq!(writer.written(), b"\"2024-05-01T12:30:00Z\"");
    /// # Ok::<(), json_emit::Error>(())
    /// ```
    ///
    pub fn write_date_time_value(&mut self, value: impl JsonDateTime) -> Result<()> {
        self.write_date_time_token(None, value)
    }

    /// Writes a property name followed by a date/time string.
    pub fn write_date_time<'a>(&mut self, name: impl Into<Text<'a>>, value: impl JsonDateTime) -> Result<()> {
        let name = self.name_body(name)?;
        self.write_date_time_token(Some(&name), value)
    }

    /// Writes a GUID as a lowercase hyphenated string.
    pub fn write_guid_value(&mut self, value: &Uuid) -> Result<()> {
        self.write_value_token(None, TokenType::String, GUID_LEN + 2, |cursor| {
            write_guid(cursor, value);
            Ok(())
        })
    }

    /// Writes a property name followed by a GUID string.
    pub fn write_guid<'a>(&mut self, name: impl Into<Text<'a>>, value: &Uuid) -> Result<()> {
        let name = self.name_body(name)?;
        self.write_value_token(Some(&name), TokenType::String, GUID_LEN + 2, |cursor| {
            write_guid(cursor, value);
            Ok(())
        })
    }

    ///
    /// Writes bytes as a standard, padded base64 string.
    ///
    pub fn write_base64_string_value(&mut self, bytes: &[u8]) -> Result<()> {
        let encoded_len = base64_len(bytes)?;
        self.write_value_token(None, TokenType::String, encoded_len + 2, |cursor| {
            write_base64(cursor, bytes, encoded_len)
        })
    }

    /// Writes a property name followed by a base64 string.
    pub fn write_base64_string<'a>(&mut self, name: impl Into<Text<'a>>, bytes: &[u8]) -> Result<()> {
        let name = self.name_body(name)?;
        let encoded_len = base64_len(bytes)?;
        self.write_value_token(Some(&name), TokenType::String, encoded_len + 2, |cursor| {
            write_base64(cursor, bytes, encoded_len)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StructuralErrorKind;
    use crate::options::{NewLine, WriterOptions};
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_object_with_number() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_start_object()?;
        writer.write_property_name("a")?;
        writer.write_number_value(1)?;
        writer.write_end_object()?;
        assert_eq!(writer.written(), br#"{"a":1}"#);
        Ok(())
    }

    #[test]
    fn test_nested_array() -> Result<()> {
        let mut writer = JsonWriter::<u16>::new(WriterOptions::new());
        writer.write_start_array()?;
        writer.write_number_value(1)?;
        writer.write_start_array()?;
        writer.write_number_value(2)?;
        writer.write_number_value(3)?;
        writer.write_end_array()?;
        writer.write_end_array()?;
        assert_eq!(writer.into_string()?, "[1,[2,3]]");
        Ok(())
    }

    #[test]
    fn test_value_without_name_in_object() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_start_object()?;
        assert_eq!(
            writer.write_number_value(1),
            Err(Error::structural(
                StructuralErrorKind::CannotWriteValueWithinObject,
                TokenType::BeginObject
            ))
        );
        assert_eq!(writer.written(), b"{");
        Ok(())
    }

    #[test]
    fn test_second_root_value() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_null_value()?;
        assert_eq!(
            writer.write_bool_value(true),
            Err(Error::structural(
                StructuralErrorKind::CannotWriteValueAfterPrimitiveOrClose,
                TokenType::Null
            ))
        );
        Ok(())
    }

    #[test]
    fn test_nan_writes_nothing() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_start_object()?;
        let before = writer.written_count();
        let err = writer.write_number("x", f64::NAN).unwrap_err();
        assert!(err.is_argument());
        assert_eq!(writer.written_count(), before);
        assert_eq!(writer.token_type(), TokenType::BeginObject);
        Ok(())
    }

    #[test]
    fn test_numbers() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_start_array()?;
        writer.write_number_value(u64::MAX)?;
        writer.write_number_value(i128::MIN)?;
        writer.write_number_value(0.1f32)?;
        writer.write_number_value(2.0f64)?;
        writer.write_number_value(Decimal::from_str("10.50").unwrap())?;
        writer.write_end_array()?;
        assert_eq!(
            writer.into_string()?,
            "[18446744073709551615,-170141183460469231731687303715884105728,0.1,2,10.50]"
        );
        Ok(())
    }

    #[test]
    fn test_number_reserves_max_len() -> Result<()> {
        let mut writer = JsonWriter::<u8>::with_capacity(WriterOptions::new(), 16);
        let capacity = writer.capacity();
        writer.write_start_array()?;
        let digits = "1".repeat(capacity - 6);
        writer.write_raw_number_value(digits.as_str())?;
        assert_eq!(writer.free_capacity(), 5);

        // ",7" fits, but the reservation covers the longest u64
        writer.write_number_value(7u64)?;
        assert!(writer.capacity() >= capacity + 1 + u64::MAX_LEN);
        writer.write_end_array()?;
        assert_eq!(writer.into_string()?, format!("[{digits},7]"));
        Ok(())
    }

    #[test]
    fn test_raw_numbers() -> Result<()> {
        let mut writer = JsonWriter::<u16>::new(WriterOptions::new());
        writer.write_start_object()?;
        writer.write_raw_number("big", "123456789012345678901234567890")?;
        let units: Vec<u16> = "-0.5e+3".encode_utf16().collect();
        writer.write_raw_number("exp", &units)?;
        assert_eq!(
            writer.write_raw_number("bad", "01"),
            Err(Error::InvalidNumber("01".to_owned()))
        );
        assert_eq!(
            writer.write_raw_number("bad", "1."),
            Err(Error::InvalidNumber("1.".to_owned()))
        );
        writer.write_end_object()?;
        assert_eq!(
            writer.into_string()?,
            r#"{"big":123456789012345678901234567890,"exp":-0.5e+3}"#
        );

        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_raw_number_value("0")?;
        assert_eq!(writer.written(), b"0");
        Ok(())
    }

    #[test]
    fn test_literals() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_start_object()?;
        writer.write_bool("t", true)?;
        writer.write_bool("f", false)?;
        writer.write_null("n")?;
        writer.write_start_array_named("a")?;
        writer.write_bool_value(false)?;
        writer.write_null_value()?;
        assert_eq!(writer.token_type(), TokenType::Null);
        writer.write_end_array()?;
        writer.write_end_object()?;
        assert_eq!(
            writer.into_string()?,
            r#"{"t":true,"f":false,"n":null,"a":[false,null]}"#
        );
        Ok(())
    }

    #[test]
    fn test_date_times() -> Result<()> {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let with_offset = offset.with_ymd_and_hms(2023, 10, 1, 9, 0, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2023, 10, 1).unwrap();

        let mut writer = JsonWriter::<u16>::new(WriterOptions::new());
        writer.write_start_object()?;
        writer.write_date_time("at", with_offset)?;
        writer.write_date_time("on", date)?;
        writer.write_end_object()?;
        assert_eq!(
            writer.into_string()?,
            r#"{"at":"2023-10-01T09:00:00+02:00","on":"2023-10-01"}"#
        );
        Ok(())
    }

    #[test]
    fn test_date_time_out_of_range() -> Result<()> {
        let date = NaiveDate::from_ymd_opt(12_000, 1, 1).unwrap();
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        assert_eq!(
            writer.write_date_time_value(date),
            Err(Error::DateTimeOutOfRange(12_000))
        );
        assert_eq!(writer.written_count(), 0);
        Ok(())
    }

    #[test]
    fn test_date_time_offset_seconds() -> Result<()> {
        let offset = FixedOffset::east_opt(3630).unwrap();
        let value = offset.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_start_object()?;
        assert_eq!(
            writer.write_date_time("at", value),
            Err(Error::OffsetNotWholeMinutes(3630))
        );
        assert_eq!(writer.written(), b"{");
        writer.write_date_time("at", value.with_timezone(&Utc))?;
        writer.write_end_object()?;
        assert_eq!(writer.into_string()?, r#"{"at":"2019-12-31T22:59:30Z"}"#);
        Ok(())
    }

    #[test]
    fn test_guids() -> Result<()> {
        let id = Uuid::from_u128(0x67e5_5044_10b1_426f_9247_bb68_0e5f_e0c8);
        let expected = r#"{"id":"67e55044-10b1-426f-9247-bb680e5fe0c8"}"#;

        let mut bytes = JsonWriter::<u8>::new(WriterOptions::new());
        bytes.write_start_object()?;
        bytes.write_guid("id", &id)?;
        bytes.write_end_object()?;
        assert_eq!(bytes.into_string()?, expected);

        let mut units = JsonWriter::<u16>::new(WriterOptions::new());
        units.write_start_object()?;
        units.write_guid("id", &id)?;
        units.write_end_object()?;
        assert_eq!(units.into_string()?, expected);
        Ok(())
    }

    #[test]
    fn test_base64() -> Result<()> {
        let mut bytes = JsonWriter::<u8>::new(WriterOptions::new());
        bytes.write_start_array()?;
        bytes.write_base64_string_value(b"")?;
        bytes.write_base64_string_value(b"f")?;
        bytes.write_base64_string_value(b"foobar")?;
        bytes.write_end_array()?;
        assert_eq!(bytes.into_string()?, r#"["","Zg==","Zm9vYmFy"]"#);

        let payload: Vec<u8> = (0..=255).collect();
        let mut units = JsonWriter::<u16>::new(WriterOptions::new());
        units.write_start_object()?;
        units.write_base64_string("data", &payload)?;
        units.write_end_object()?;
        let expected = format!(r#"{{"data":"{}"}}"#, BASE64_STANDARD.encode(&payload));
        assert_eq!(units.into_string()?, expected);
        Ok(())
    }

    #[test]
    fn test_indented_values() -> Result<()> {
        let options = WriterOptions::indented().with_new_line(NewLine::Lf);
        let mut writer = JsonWriter::<u8>::new(options);
        writer.write_start_object()?;
        writer.write_number("a", 1)?;
        writer.write_start_array_named("b")?;
        writer.write_bool_value(true)?;
        writer.write_null_value()?;
        writer.write_end_array()?;
        writer.write_end_object()?;
        assert_eq!(
            writer.into_string()?,
            "{\n  \"a\": 1,\n  \"b\": [\n    true,\n    null\n  ]\n}"
        );
        Ok(())
    }

    #[test]
    fn test_growth_keeps_output() -> Result<()> {
        let mut writer = JsonWriter::<u8>::with_capacity(WriterOptions::new(), 16);
        writer.write_start_array()?;
        let mut expected = String::from("[");
        for i in 0..2000u32 {
            if i > 0 {
                expected.push(',');
            }
            expected.push_str(&i.to_string());
            writer.write_number_value(i)?;
            assert!(writer.written_count() <= writer.capacity());
        }
        writer.write_end_array()?;
        expected.push(']');
        assert_eq!(writer.into_vec(), expected.into_bytes());
        Ok(())
    }
}
