//!
//! Number formatting and validation of pre-formatted number tokens.
//!

use crate::code_unit::CodeUnit;
use crate::error::{Error, Result};
use rust_decimal::Decimal;
use std::fmt::{self, Write as _};

///
/// Types that can be written as a JSON number.
///
pub trait JsonNumber: Copy {
    /// Longest ASCII form. The writer reserves this much before copying the number.
    const MAX_LEN: usize;

    ///
    /// Formats `self` and hands the ASCII bytes to `f`.
    ///
    /// Fails for values without a JSON representation (NaN, infinity).
    ///
    fn with_ascii<R>(self, f: impl FnOnce(&[u8]) -> R) -> Result<R>;
}

macro_rules! impl_json_number_for_int {
    ($($ty:ty => $max:expr),* $(,)?) => {
        $(
            impl JsonNumber for $ty {
                const MAX_LEN: usize = $max;

                #[inline(always)]
                fn with_ascii<R>(self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
                    let mut buf = itoa::Buffer::new();
                    Ok(f(buf.format(self).as_bytes()))
                }
            }
        )*
    };
}

impl_json_number_for_int! {
    u8 => 3,
    i8 => 4,
    u16 => 5,
    i16 => 6,
    u32 => 10,
    i32 => 11,
    u64 => 20,
    i64 => 20,
    u128 => 39,
    i128 => 40,
    usize => 20,
    isize => 20,
}

///
/// Shortest round-trip form without a trailing `.0`.
///
#[inline]
fn trim_float(formatted: &str) -> &str {
    formatted.strip_suffix(".0").unwrap_or(formatted)
}

impl JsonNumber for f64 {
    const MAX_LEN: usize = 24;

    #[inline]
    fn with_ascii<R>(self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        if !self.is_finite() {
            // JSON does not allow infinite or nan values
            return Err(Error::NonFiniteNumber(self.to_string()));
        }
        let mut buf = ryu::Buffer::new();
        Ok(f(trim_float(buf.format_finite(self)).as_bytes()))
    }
}

impl JsonNumber for f32 {
    const MAX_LEN: usize = 16;

    #[inline]
    fn with_ascii<R>(self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        if !self.is_finite() {
            return Err(Error::NonFiniteNumber(self.to_string()));
        }
        let mut buf = ryu::Buffer::new();
        Ok(f(trim_float(buf.format_finite(self)).as_bytes()))
    }
}

const DECIMAL_BUFFER_LEN: usize = 64;

///
/// Fixed stack buffer for `Display`-formatted decimals.
///
struct DecimalBuffer {
    bytes: [u8; DECIMAL_BUFFER_LEN],
    len: usize,
}

impl fmt::Write for DecimalBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        if end > DECIMAL_BUFFER_LEN {
            return Err(fmt::Error);
        }
        self.bytes[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

impl JsonNumber for Decimal {
    const MAX_LEN: usize = DECIMAL_BUFFER_LEN;

    fn with_ascii<R>(self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let mut buf = DecimalBuffer {
            bytes: [0; DECIMAL_BUFFER_LEN],
            len: 0,
        };
        write!(buf, "{self}").map_err(|_| Error::InvalidNumber(self.to_string()))?;
        Ok(f(&buf.bytes[..buf.len]))
    }
}

///
/// Checks the JSON number grammar: optional `-`, no leading zero unless the
/// integer part is exactly `0`, optional fraction with at least one digit,
/// optional exponent with at least one digit.
///
pub fn is_valid_number<S: CodeUnit>(token: &[S]) -> bool {
    #[inline(always)]
    fn is_digit(unit: u32) -> bool {
        (b'0' as u32..=b'9' as u32).contains(&unit)
    }

    let at = |index: usize| token.get(index).map(|unit| unit.to_u32());
    let mut index = 0;

    if at(index) == Some(b'-' as u32) {
        index += 1;
    }

    match at(index) {
        Some(unit) if unit == b'0' as u32 => index += 1,
        Some(unit) if is_digit(unit) => {
            while at(index).map_or(false, is_digit) {
                index += 1;
            }
        }
        _ => return false,
    }

    if at(index) == Some(b'.' as u32) {
        index += 1;
        if !at(index).map_or(false, is_digit) {
            return false;
        }
        while at(index).map_or(false, is_digit) {
            index += 1;
        }
    }

    if matches!(at(index), Some(unit) if unit == b'e' as u32 || unit == b'E' as u32) {
        index += 1;
        if matches!(at(index), Some(unit) if unit == b'+' as u32 || unit == b'-' as u32) {
            index += 1;
        }
        if !at(index).map_or(false, is_digit) {
            return false;
        }
        while at(index).map_or(false, is_digit) {
            index += 1;
        }
    }

    index == token.len()
}

///
/// Rejects tokens that are not valid JSON numbers.
///
pub(crate) fn validate_number<S: CodeUnit>(token: &[S]) -> Result<()> {
    if is_valid_number(token) {
        Ok(())
    } else {
        let shown: String = token
            .iter()
            .map(|unit| char::from_u32(unit.to_u32()).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        Err(Error::InvalidNumber(shown))
    }
}
