//!
//! JSON string escaping for both code-unit widths.
//!
//! The hot path is [`needs_escaping`] returning `None`: the text is then copied
//! verbatim. Otherwise [`escape`] copies the clean prefix and escapes the rest into
//! call-local scratch, on the stack below [`STACK_ESCAPE_THRESHOLD`] units and
//! rented from the shared pool above it.
//!

use crate::code_unit::CodeUnit;
use crate::error::{Error, Result};
use crate::options::EscapeHandling;
use std::fmt;

/// Longest escape sequence, `\uXXXX`.
pub(crate) const MAX_EXPANSION_FACTOR: usize = 6;

/// Scratch sizes below this many units stay on the stack.
pub(crate) const STACK_ESCAPE_THRESHOLD: usize = 256;

///
/// Pluggable escaper.
///
/// Consulted for every character that JSON does not force to be escaped anyway.
/// Characters it selects are written as `\uXXXX`.
///
pub trait JsonEncoder: Send + Sync + fmt::Debug {
    ///
    /// Returns true if `c` must be written as an escape sequence.
    ///
    fn will_escape(&self, c: char) -> bool;
}

///
/// Escapes characters with special meaning in HTML: `<`, `>`, `&`, `'`, `+` and `` ` ``.
///
/// ```
/// use json_emit::{HtmlSafeEncoder, JsonEncoder};
///
/// assert!(HtmlSafeEncoder.will_escape('<'));
/// assert!(!HtmlSafeEncoder.will_escape('a'));
/// ```
///
#[derive(Debug, Copy, Clone, Default)]
pub struct HtmlSafeEncoder;

impl JsonEncoder for HtmlSafeEncoder {
    fn will_escape(&self, c: char) -> bool {
        matches!(c, '<' | '>' | '&' | '\'' | '+' | '`')
    }
}

const fn get_replacements() -> [u8; 256] {
    // NOTE: only characters smaller than 128 are allowed here
    // see https://www.json.org/json-en.html
    let mut result = [0u8; 256];
    result[b'"' as usize] = b'"';
    result[b'\\' as usize] = b'\\';

    let mut c: u8 = 0x00;
    while c < 0x20 {
        // mark all control characters 0x00 <= c < 0x20 as being replaced by a unicode escape
        result[c as usize] = b'u';
        c += 1;
    }

    // overwrite characters that have shorter escapes
    result[0x08] = b'b';
    result[0x0c] = b'f';
    result[b'\n' as usize] = b'n';
    result[b'\r' as usize] = b'r';
    result[b'\t' as usize] = b't';

    let mut c: u8 = 0x80;
    loop {
        if result[c as usize] != 0 {
            panic!("bytes from 0x80 to 0xFF are parts of UTF-8 multi-byte characters and must not be modified");
        }
        c = match c.checked_add(1) {
            Some(c) => c,
            None => break,
        };
    }

    result
}
static REPLACEMENTS: [u8; 256] = get_replacements();
static HEX: [u8; 16] = *b"0123456789ABCDEF";

///
/// Index of the first unit that cannot be copied verbatim, or `None`.
///
/// For UTF-16 input an unpaired surrogate is reported as needing escape; [`escape`]
/// then rejects it.
///
#[inline]
pub fn needs_escaping<S: CodeUnit>(text: &[S], policy: &EscapeHandling) -> Option<usize> {
    match policy {
        EscapeHandling::Minimal if S::WIDTH == 1 => text
            .iter()
            .position(|unit| REPLACEMENTS[unit.to_u32() as usize] != 0),
        EscapeHandling::Minimal => scan(text, false, None),
        EscapeHandling::NonAscii => scan(text, true, None),
        EscapeHandling::Custom(encoder) => scan(text, false, Some(encoder.as_ref())),
    }
}

fn scan<S: CodeUnit>(
    text: &[S],
    escape_non_ascii: bool,
    encoder: Option<&dyn JsonEncoder>,
) -> Option<usize> {
    let mut index = 0;
    while index < text.len() {
        let unit = text[index].to_u32();
        if unit < 0x80 {
            if REPLACEMENTS[unit as usize] != 0
                || encoder.map_or(false, |encoder| encoder.will_escape(unit as u8 as char))
            {
                return Some(index);
            }
            index += 1;
            continue;
        }
        if escape_non_ascii {
            return Some(index);
        }
        if S::WIDTH == 1 && encoder.is_none() {
            // Continuation and lead bytes of valid UTF-8 are copied as they are.
            index += 1;
            continue;
        }
        match S::decode_scalar(text, index) {
            Some((c, len)) => {
                if encoder.map_or(false, |encoder| encoder.will_escape(c)) {
                    return Some(index);
                }
                index += len;
            }
            None => return Some(index),
        }
    }
    None
}

///
/// Worst-case length after escaping: the clean prefix plus six units for every
/// remaining unit.
///
#[inline]
pub fn max_escaped_len(len: usize, first_escape: usize) -> Result<usize> {
    debug_assert!(first_escape <= len);
    (len - first_escape)
        .checked_mul(MAX_EXPANSION_FACTOR)
        .and_then(|tail| tail.checked_add(first_escape))
        .ok_or(Error::CapacityOverflow {
            capacity: len,
            requested: len,
        })
}

///
/// Escapes `text` into `dst`, starting at `first_escape`, and returns the units written.
///
/// `dst` must hold at least [`max_escaped_len`] units.
///
pub fn escape_into<S: CodeUnit>(
    text: &[S],
    dst: &mut [S],
    first_escape: usize,
    policy: &EscapeHandling,
) -> Result<usize> {
    let (escape_non_ascii, encoder) = match policy {
        EscapeHandling::Minimal => (false, None),
        EscapeHandling::NonAscii => (true, None),
        EscapeHandling::Custom(encoder) => (false, Some(encoder.as_ref())),
    };

    dst[..first_escape].copy_from_slice(&text[..first_escape]);
    let mut written = first_escape;
    let mut index = first_escape;
    while index < text.len() {
        let unit = text[index].to_u32();
        if unit < 0x80 {
            let replacement = REPLACEMENTS[unit as usize];
            if replacement == b'u'
                || (replacement == 0
                    && encoder.map_or(false, |encoder| encoder.will_escape(unit as u8 as char)))
            {
                written += write_unicode_escape(&mut dst[written..], unit);
            } else if replacement != 0 {
                dst[written] = S::from_ascii(b'\\');
                dst[written + 1] = S::from_ascii(replacement);
                written += 2;
            } else {
                dst[written] = text[index];
                written += 1;
            }
            index += 1;
            continue;
        }

        let (c, len) = S::decode_scalar(text, index).ok_or(if S::WIDTH == 1 {
            Error::InvalidUtf8 { valid_up_to: index }
        } else {
            Error::InvalidUtf16 { index }
        })?;
        if escape_non_ascii || encoder.map_or(false, |encoder| encoder.will_escape(c)) {
            let mut pair = [0u16; 2];
            for unit in c.encode_utf16(&mut pair) {
                written += write_unicode_escape(&mut dst[written..], *unit as u32);
            }
        } else {
            dst[written..written + len].copy_from_slice(&text[index..index + len]);
            written += len;
        }
        index += len;
    }
    Ok(written)
}

#[inline(always)]
fn write_unicode_escape<S: CodeUnit>(dst: &mut [S], unit: u32) -> usize {
    let bytes: [u8; 6] = [
        b'\\',
        b'u',
        HEX[((unit >> 12) & 0xF) as usize],
        HEX[((unit >> 8) & 0xF) as usize],
        HEX[((unit >> 4) & 0xF) as usize],
        HEX[(unit & 0xF) as usize],
    ];
    S::copy_ascii(&bytes, dst);
    bytes.len()
}

///
/// Call-local scratch for escaped text.
///
pub(crate) enum EscapeScratch<S: CodeUnit> {
    Stack([S; STACK_ESCAPE_THRESHOLD]),
    Pooled(Vec<S>),
}

impl<S: CodeUnit> EscapeScratch<S> {
    pub(crate) fn new(len: usize) -> Self {
        if len < STACK_ESCAPE_THRESHOLD {
            EscapeScratch::Stack([S::default(); STACK_ESCAPE_THRESHOLD])
        } else {
            EscapeScratch::Pooled(S::shared_pool().rent(len))
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [S] {
        match self {
            EscapeScratch::Stack(array) => &mut array[..],
            EscapeScratch::Pooled(array) => &mut array[..],
        }
    }

    pub(crate) fn as_slice(&self) -> &[S] {
        match self {
            EscapeScratch::Stack(array) => &array[..],
            EscapeScratch::Pooled(array) => &array[..],
        }
    }
}

impl<S: CodeUnit> Drop for EscapeScratch<S> {
    fn drop(&mut self) {
        if let EscapeScratch::Pooled(array) = self {
            S::shared_pool().return_array(std::mem::take(array));
        }
    }
}

///
/// Escaped copy of a text, alive for one encoder call.
///
pub(crate) struct Escaped<S: CodeUnit> {
    scratch: EscapeScratch<S>,
    len: usize,
}

impl<S: CodeUnit> Escaped<S> {
    pub(crate) fn units(&self) -> &[S] {
        &self.scratch.as_slice()[..self.len]
    }
}

///
/// Escapes `text` from `first_escape` on into fresh scratch.
///
pub(crate) fn escape<S: CodeUnit>(
    text: &[S],
    first_escape: usize,
    policy: &EscapeHandling,
) -> Result<Escaped<S>> {
    let max = max_escaped_len(text.len(), first_escape)?;
    let mut scratch = EscapeScratch::new(max);
    let len = escape_into(text, scratch.as_mut_slice(), first_escape, policy)?;
    Ok(Escaped { scratch, len })
}
