//!
//! Round-trip date/time formatting.
//!
//! Values are formatted into a fixed stack buffer as
//! `YYYY-MM-DDTHH:MM:SS[.fffffffff][Z|±hh:mm]`, with redundant trailing zeros of the
//! fractional second trimmed, and then copied into the output inside quotes.
//!

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, Timelike, Utc};

/// Longest round-trip form, `YYYY-MM-DDTHH:MM:SS.fffffffff+hh:mm`.
pub const MAX_DATE_TIME_LEN: usize = 35;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

///
/// Date/time types that can be written as a JSON string.
///
pub trait JsonDateTime {
    ///
    /// Formats `self` into `buf` and returns the length used.
    ///
    /// Fails for years outside `0..=9999`.
    ///
    fn format_round_trip(&self, buf: &mut [u8; MAX_DATE_TIME_LEN]) -> Result<usize>;
}

#[inline(always)]
fn put_digits(buf: &mut [u8], mut value: u32) {
    for slot in buf.iter_mut().rev() {
        *slot = b'0' + (value % 10) as u8;
        value /= 10;
    }
}

fn write_date(buf: &mut [u8], date: &impl Datelike) -> Result<usize> {
    let year = date.year();
    if !(0..=9999).contains(&year) {
        return Err(Error::DateTimeOutOfRange(year));
    }
    put_digits(&mut buf[0..4], year as u32);
    buf[4] = b'-';
    put_digits(&mut buf[5..7], date.month());
    buf[7] = b'-';
    put_digits(&mut buf[8..10], date.day());
    Ok(10)
}

///
/// Writes `THH:MM:SS` plus the trimmed fraction, returning the length.
///
fn write_time(buf: &mut [u8], time: &impl Timelike) -> usize {
    let mut second = time.second();
    let mut nanos = time.nanosecond();
    if nanos >= NANOS_PER_SECOND {
        // leap second
        second += 1;
        nanos -= NANOS_PER_SECOND;
    }

    buf[0] = b'T';
    put_digits(&mut buf[1..3], time.hour());
    buf[3] = b':';
    put_digits(&mut buf[4..6], time.minute());
    buf[6] = b':';
    put_digits(&mut buf[7..9], second);
    if nanos == 0 {
        return 9;
    }

    let mut digits = 9;
    while nanos % 10 == 0 {
        nanos /= 10;
        digits -= 1;
    }
    buf[9] = b'.';
    put_digits(&mut buf[10..10 + digits], nanos);
    10 + digits
}

fn write_offset(buf: &mut [u8], offset: &FixedOffset) -> Result<usize> {
    let seconds = offset.local_minus_utc();
    if seconds % 60 != 0 {
        return Err(Error::OffsetNotWholeMinutes(seconds));
    }
    buf[0] = if seconds < 0 { b'-' } else { b'+' };
    let minutes = seconds.unsigned_abs() / 60;
    put_digits(&mut buf[1..3], minutes / 60);
    buf[3] = b':';
    put_digits(&mut buf[4..6], minutes % 60);
    Ok(6)
}

fn write_naive(buf: &mut [u8; MAX_DATE_TIME_LEN], value: &NaiveDateTime) -> Result<usize> {
    let date = write_date(&mut buf[..], value)?;
    let time = write_time(&mut buf[date..], value);
    Ok(date + time)
}

impl JsonDateTime for NaiveDateTime {
    fn format_round_trip(&self, buf: &mut [u8; MAX_DATE_TIME_LEN]) -> Result<usize> {
        write_naive(buf, self)
    }
}

impl JsonDateTime for NaiveDate {
    fn format_round_trip(&self, buf: &mut [u8; MAX_DATE_TIME_LEN]) -> Result<usize> {
        write_date(&mut buf[..], self)
    }
}

impl JsonDateTime for DateTime<Utc> {
    fn format_round_trip(&self, buf: &mut [u8; MAX_DATE_TIME_LEN]) -> Result<usize> {
        let len = write_naive(buf, &self.naive_utc())?;
        buf[len] = b'Z';
        Ok(len + 1)
    }
}

impl JsonDateTime for DateTime<FixedOffset> {
    fn format_round_trip(&self, buf: &mut [u8; MAX_DATE_TIME_LEN]) -> Result<usize> {
        let len = write_naive(buf, &self.naive_local())?;
        Ok(len + write_offset(&mut buf[len..], self.offset())?)
    }
}

impl JsonDateTime for DateTime<Local> {
    fn format_round_trip(&self, buf: &mut [u8; MAX_DATE_TIME_LEN]) -> Result<usize> {
        self.fixed_offset().format_round_trip(buf)
    }
}

impl<D: JsonDateTime + ?Sized> JsonDateTime for &D {
    fn format_round_trip(&self, buf: &mut [u8; MAX_DATE_TIME_LEN]) -> Result<usize> {
        (**self).format_round_trip(buf)
    }
}
