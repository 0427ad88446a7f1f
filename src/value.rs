//!
//! Values that know how to write themselves.
//!

use crate::code_unit::CodeUnit;
use crate::error::Result;
use crate::options::WriterOptions;
use crate::text::{EncodedText, Text};
use crate::writer::JsonWriter;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

///
/// Types that can be written as a JSON value.
///
pub trait JsonValue {
    ///
    /// Writes `self` as one complete value.
    ///
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()>;
}

///
/// Represents the null value in json.
///
/// **Note**: [`Option::None`] may be used instead in most cases.
///
#[derive(Debug, Copy, Clone)]
pub struct Null;

///
/// Bytes written as a base64 string.
///
/// ```
/// use json_emit::{to_json_string, Base64};
///
/// assert_eq!(to_json_string(Base64(b"hi"))?, "\"aGk=\"");
/// # Ok::<(), json_emit::Error>(())
/// ```
///
#[derive(Debug, Copy, Clone)]
pub struct Base64<'a>(pub &'a [u8]);

impl JsonValue for &str {
    #[inline(always)]
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
        writer.write_string_value(self)
    }
}

impl JsonValue for &String {
    #[inline(always)]
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
        writer.write_string_value(self)
    }
}

impl JsonValue for &EncodedText {
    #[inline(always)]
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
        writer.write_string_value(self)
    }
}

macro_rules! impl_json_value_for_number {
    ($($ty:ty),* $(,)?) => {
        $(
            impl JsonValue for $ty {
                #[inline(always)]
                fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
                    writer.write_number_value(self)
                }
            }
        )*
    };
}

impl_json_value_for_number!(
    u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize, f32, f64, Decimal
);

impl JsonValue for bool {
    #[inline(always)]
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
        writer.write_bool_value(self)
    }
}

impl JsonValue for Null {
    #[inline(always)]
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
        writer.write_null_value()
    }
}

impl JsonValue for Uuid {
    #[inline(always)]
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
        writer.write_guid_value(&self)
    }
}

impl JsonValue for Base64<'_> {
    #[inline(always)]
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
        writer.write_base64_string_value(self.0)
    }
}

macro_rules! impl_json_value_for_date_time {
    ($($ty:ty),* $(,)?) => {
        $(
            impl JsonValue for $ty {
                #[inline(always)]
                fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
                    writer.write_date_time_value(self)
                }
            }
        )*
    };
}

impl_json_value_for_date_time!(
    DateTime<Utc>,
    DateTime<FixedOffset>,
    DateTime<Local>,
    NaiveDateTime,
    NaiveDate
);

impl<V: JsonValue + Copy> JsonValue for &V {
    #[inline(always)]
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
        (*self).write_json(writer)
    }
}

impl<V: JsonValue> JsonValue for Option<V> {
    #[inline(always)]
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
        match self {
            None => writer.write_null_value(),
            Some(value) => value.write_json(writer),
        }
    }
}

impl<Item> JsonValue for &Vec<Item>
where
    for<'b> &'b Item: JsonValue,
{
    #[inline(always)]
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
        self.as_slice().write_json(writer)
    }
}

impl<Item> JsonValue for &[Item]
where
    for<'b> &'b Item: JsonValue,
{
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
        writer.write_start_array()?;
        for item in self.iter() {
            item.write_json(writer)?;
        }
        writer.write_end_array()
    }
}

impl<Key: AsRef<str>, Item> JsonValue for &HashMap<Key, Item>
where
    for<'b> &'b Item: JsonValue,
{
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
        writer.write_start_object()?;
        for (key, value) in self.iter() {
            let key: &str = key.as_ref();
            writer.write_member(key, value)?;
        }
        writer.write_end_object()
    }
}

impl<Key: AsRef<str>, Item> JsonValue for &BTreeMap<Key, Item>
where
    for<'b> &'b Item: JsonValue,
{
    fn write_json<T: CodeUnit>(self, writer: &mut JsonWriter<T>) -> Result<()> {
        writer.write_start_object()?;
        for (key, value) in self.iter() {
            let key: &str = key.as_ref();
            writer.write_member(key, value)?;
        }
        writer.write_end_object()
    }
}

impl<T: CodeUnit> JsonWriter<T> {
    ///
    /// Writes any [`JsonValue`].
    ///
    #[inline]
    pub fn write_value<V: JsonValue>(&mut self, value: V) -> Result<()> {
        value.write_json(self)
    }

    ///
    /// Writes a property name followed by any [`JsonValue`].
    ///
    /// If the value fails its checks the property name has already been written.
    ///
    #[inline]
    pub fn write_member<'a, V: JsonValue>(
        &mut self,
        name: impl Into<Text<'a>>,
        value: V,
    ) -> Result<()> {
        self.write_property_name(name)?;
        value.write_json(self)
    }
}

///
/// Serializes the given `value` to a JSON string.
///
/// Fails for values without a JSON representation, like NaN.
///
#[inline]
pub fn to_json_string<V: JsonValue>(value: V) -> Result<String> {
    let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
    value.write_json(&mut writer)?;
    writer.into_string()
}

///
/// Serializes the given `value` to UTF-8 bytes.
///
#[inline]
pub fn to_json_vec<V: JsonValue>(value: V) -> Result<Vec<u8>> {
    let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
    value.write_json(&mut writer)?;
    Ok(writer.into_vec())
}
