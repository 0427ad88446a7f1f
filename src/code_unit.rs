//!
//! Code-unit widths the writer can emit: UTF-8 bytes (`u8`) and UTF-16 units (`u16`).
//!
//! All encoder logic is written once against [`CodeUnit`]; the two implementations
//! only differ in how text of either width is copied or transcoded into them.
//!

use crate::error::{Error, Result};
use crate::pool::ArrayPool;
use log::trace;
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

mod private {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
}

/// Size of the per-thread scratch buffer in bytes.
const THREAD_SCRATCH_BYTES: usize = 64 * 1024;

///
/// One storage element of the output encoding.
///
/// Sealed: implemented for `u8` (UTF-8 output) and `u16` (UTF-16 output).
///
pub trait CodeUnit:
    private::Sealed + Copy + Default + Eq + fmt::Debug + Send + Sync + 'static
{
    /// Bytes per code unit.
    const WIDTH: usize;

    /// Widens an ASCII byte.
    fn from_ascii(byte: u8) -> Self;

    /// Numeric value of the unit.
    fn to_u32(self) -> u32;

    /// Copies ASCII bytes into `dst[..src.len()]`.
    fn copy_ascii(src: &[u8], dst: &mut [Self]);

    /// The units themselves when they are bytes, so encoders can write in place.
    fn as_bytes_mut(units: &mut [Self]) -> Option<&mut [u8]>;

    ///
    /// Decodes the scalar value starting at `index`.
    ///
    /// Returns the character and the number of units it occupies, or `None` for
    /// malformed input (truncated UTF-8, unpaired surrogate).
    ///
    fn decode_scalar(text: &[Self], index: usize) -> Option<(char, usize)>;

    /// Upper bound of units needed to hold `len` UTF-8 bytes in this width.
    fn max_units_from_utf8(len: usize) -> usize;

    /// Upper bound of units needed to hold `len` UTF-16 units in this width.
    fn max_units_from_utf16(len: usize) -> usize;

    /// Writes well-formed UTF-8 into `dst`, returning the units written.
    fn write_utf8(src: &[u8], dst: &mut [Self]) -> Result<usize>;

    /// Writes UTF-16 into `dst`, returning the units written.
    fn write_utf16(src: &[u16], dst: &mut [Self]) -> Result<usize>;

    /// Upper bound of units needed in width `D` for `len` units of this width.
    fn max_units_in<D: CodeUnit>(len: usize) -> usize;

    /// Copies or transcodes `src` into `dst`, returning the units written.
    fn transcode_into<D: CodeUnit>(src: &[Self], dst: &mut [D]) -> Result<usize>;

    /// Decodes written output into a `String`.
    fn to_string(units: &[Self]) -> Result<String>;

    /// Process-wide pool for this width.
    fn shared_pool() -> &'static ArrayPool<Self>;

    /// Takes this thread's scratch buffer, if it is not lent out already.
    fn take_thread_scratch() -> Option<(Vec<Self>, ScratchLease)>;

    /// Gives this thread's scratch buffer back.
    fn restore_thread_scratch(array: Vec<Self>);
}

///
/// Claim on a thread's scratch buffer, held by whoever borrowed it.
///
/// The borrower may end up on another thread; the lent flag is shared so the
/// owning slot can be freed from there.
///
#[derive(Debug)]
pub struct ScratchLease {
    owner: ThreadId,
    lent: Arc<AtomicBool>,
}

impl ScratchLease {
    /// True on the thread the scratch buffer belongs to.
    pub(crate) fn is_home(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Frees the owner's slot without handing the array back.
    pub(crate) fn forfeit(&self) {
        self.lent.store(false, Ordering::Release);
    }
}

///
/// Per-thread scratch slot. At most one writer borrows it at a time.
///
struct ScratchSlot<T> {
    array: Option<Vec<T>>,
    lent: Option<Arc<AtomicBool>>,
}

impl<T: Copy + Default> ScratchSlot<T> {
    const fn new() -> Self {
        ScratchSlot {
            array: None,
            lent: None,
        }
    }

    fn take(&mut self, units: usize) -> Option<(Vec<T>, ScratchLease)> {
        let lent = self
            .lent
            .get_or_insert_with(|| Arc::new(AtomicBool::new(false)));
        if lent.swap(true, Ordering::AcqRel) {
            return None;
        }
        let lease = ScratchLease {
            owner: thread::current().id(),
            lent: Arc::clone(lent),
        };
        // empty after a lease was forfeited elsewhere
        let array = self
            .array
            .take()
            .unwrap_or_else(|| vec![T::default(); units]);
        Some((array, lease))
    }

    fn restore(&mut self, array: Vec<T>) {
        self.array = Some(array);
        if let Some(lent) = &self.lent {
            lent.store(false, Ordering::Release);
        }
    }
}

thread_local! {
    static BYTE_SCRATCH: RefCell<ScratchSlot<u8>> = const { RefCell::new(ScratchSlot::new()) };
    static CHAR_SCRATCH: RefCell<ScratchSlot<u16>> = const { RefCell::new(ScratchSlot::new()) };
}

static BYTE_POOL: OnceLock<ArrayPool<u8>> = OnceLock::new();
static CHAR_POOL: OnceLock<ArrayPool<u16>> = OnceLock::new();

#[inline]
fn utf8_sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        _ => 4,
    }
}

fn first_unpaired_surrogate(src: &[u16]) -> usize {
    let mut index = 0;
    for decoded in char::decode_utf16(src.iter().copied()) {
        match decoded {
            Ok(c) => index += c.len_utf16(),
            Err(_) => return index,
        }
    }
    index
}

impl CodeUnit for u8 {
    const WIDTH: usize = 1;

    #[inline(always)]
    fn from_ascii(byte: u8) -> Self {
        byte
    }

    #[inline(always)]
    fn to_u32(self) -> u32 {
        self as u32
    }

    #[inline(always)]
    fn copy_ascii(src: &[u8], dst: &mut [Self]) {
        dst[..src.len()].copy_from_slice(src);
    }

    #[inline(always)]
    fn as_bytes_mut(units: &mut [Self]) -> Option<&mut [u8]> {
        Some(units)
    }

    fn decode_scalar(text: &[Self], index: usize) -> Option<(char, usize)> {
        let len = utf8_sequence_len(*text.get(index)?);
        let sequence = text.get(index..index + len)?;
        let c = std::str::from_utf8(sequence).ok()?.chars().next()?;
        Some((c, len))
    }

    #[inline(always)]
    fn max_units_from_utf8(len: usize) -> usize {
        len
    }

    #[inline(always)]
    fn max_units_from_utf16(len: usize) -> usize {
        // Astral pairs take 4 bytes for 2 units; BMP units take at most 3.
        len.saturating_mul(3)
    }

    #[inline]
    fn write_utf8(src: &[u8], dst: &mut [Self]) -> Result<usize> {
        dst[..src.len()].copy_from_slice(src);
        Ok(src.len())
    }

    fn write_utf16(src: &[u16], dst: &mut [Self]) -> Result<usize> {
        let mut written = 0;
        let mut index = 0;
        for decoded in char::decode_utf16(src.iter().copied()) {
            let c = decoded.map_err(|_| Error::InvalidUtf16 { index })?;
            written += c.encode_utf8(&mut dst[written..]).len();
            index += c.len_utf16();
        }
        debug_assert_eq!(index, src.len());
        Ok(written)
    }

    #[inline(always)]
    fn max_units_in<D: CodeUnit>(len: usize) -> usize {
        D::max_units_from_utf8(len)
    }

    #[inline(always)]
    fn transcode_into<D: CodeUnit>(src: &[Self], dst: &mut [D]) -> Result<usize> {
        D::write_utf8(src, dst)
    }

    fn to_string(units: &[Self]) -> Result<String> {
        Ok(std::str::from_utf8(units)?.to_owned())
    }

    fn shared_pool() -> &'static ArrayPool<Self> {
        BYTE_POOL.get_or_init(ArrayPool::new)
    }

    fn take_thread_scratch() -> Option<(Vec<Self>, ScratchLease)> {
        BYTE_SCRATCH
            .try_with(|slot| slot.borrow_mut().take(THREAD_SCRATCH_BYTES))
            .ok()
            .flatten()
    }

    fn restore_thread_scratch(array: Vec<Self>) {
        if BYTE_SCRATCH
            .try_with(|slot| slot.borrow_mut().restore(array))
            .is_err()
        {
            trace!("thread scratch dropped during thread teardown");
        }
    }
}

impl CodeUnit for u16 {
    const WIDTH: usize = 2;

    #[inline(always)]
    fn from_ascii(byte: u8) -> Self {
        byte as u16
    }

    #[inline(always)]
    fn to_u32(self) -> u32 {
        self as u32
    }

    #[inline(always)]
    fn copy_ascii(src: &[u8], dst: &mut [Self]) {
        for (unit, &byte) in dst.iter_mut().zip(src) {
            *unit = byte as u16;
        }
    }

    #[inline(always)]
    fn as_bytes_mut(_units: &mut [Self]) -> Option<&mut [u8]> {
        None
    }

    fn decode_scalar(text: &[Self], index: usize) -> Option<(char, usize)> {
        let first = *text.get(index)?;
        match first {
            0xd800..=0xdbff => {
                let second = *text.get(index + 1)?;
                if !(0xdc00..=0xdfff).contains(&second) {
                    return None;
                }
                let scalar = 0x10000 + (((first as u32) - 0xd800) << 10) + ((second as u32) - 0xdc00);
                Some((char::from_u32(scalar)?, 2))
            }
            0xdc00..=0xdfff => None,
            _ => Some((char::from_u32(first as u32)?, 1)),
        }
    }

    #[inline(always)]
    fn max_units_from_utf8(len: usize) -> usize {
        len
    }

    #[inline(always)]
    fn max_units_from_utf16(len: usize) -> usize {
        len
    }

    fn write_utf8(src: &[u8], dst: &mut [Self]) -> Result<usize> {
        let text = std::str::from_utf8(src)?;
        let mut written = 0;
        for unit in text.encode_utf16() {
            dst[written] = unit;
            written += 1;
        }
        Ok(written)
    }

    #[inline]
    fn write_utf16(src: &[u16], dst: &mut [Self]) -> Result<usize> {
        dst[..src.len()].copy_from_slice(src);
        Ok(src.len())
    }

    #[inline(always)]
    fn max_units_in<D: CodeUnit>(len: usize) -> usize {
        D::max_units_from_utf16(len)
    }

    #[inline(always)]
    fn transcode_into<D: CodeUnit>(src: &[Self], dst: &mut [D]) -> Result<usize> {
        D::write_utf16(src, dst)
    }

    fn to_string(units: &[Self]) -> Result<String> {
        String::from_utf16(units).map_err(|_| Error::InvalidUtf16 {
            index: first_unpaired_surrogate(units),
        })
    }

    fn shared_pool() -> &'static ArrayPool<Self> {
        CHAR_POOL.get_or_init(ArrayPool::new)
    }

    fn take_thread_scratch() -> Option<(Vec<Self>, ScratchLease)> {
        CHAR_SCRATCH
            .try_with(|slot| slot.borrow_mut().take(THREAD_SCRATCH_BYTES / 2))
            .ok()
            .flatten()
    }

    fn restore_thread_scratch(array: Vec<Self>) {
        if CHAR_SCRATCH
            .try_with(|slot| slot.borrow_mut().restore(array))
            .is_err()
        {
            trace!("thread scratch dropped during thread teardown");
        }
    }
}

///
/// Checks that UTF-16 text contains no unpaired surrogates.
///
pub(crate) fn validate_utf16(src: &[u16]) -> Result<()> {
    let index = first_unpaired_surrogate(src);
    if index == src.len() {
        Ok(())
    } else {
        Err(Error::InvalidUtf16 { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_scalar_utf8() {
        let text = "aé€😀".as_bytes();
        assert_eq!(u8::decode_scalar(text, 0), Some(('a', 1)));
        assert_eq!(u8::decode_scalar(text, 1), Some(('é', 2)));
        assert_eq!(u8::decode_scalar(text, 3), Some(('€', 3)));
        assert_eq!(u8::decode_scalar(text, 6), Some(('😀', 4)));
        assert_eq!(u8::decode_scalar(&text[..8], 6), None);
    }

    #[test]
    fn test_decode_scalar_utf16() {
        let text: Vec<u16> = "a😀".encode_utf16().collect();
        assert_eq!(u16::decode_scalar(&text, 0), Some(('a', 1)));
        assert_eq!(u16::decode_scalar(&text, 1), Some(('😀', 2)));
        assert_eq!(u16::decode_scalar(&text, 2), None);
        assert_eq!(u16::decode_scalar(&[0xdc00], 0), None);
        assert_eq!(u16::decode_scalar(&[0xd800, 0x41], 0), None);
    }

    #[test]
    fn test_transcode_utf16_to_utf8() -> Result<()> {
        let src: Vec<u16> = "ä€😀x".encode_utf16().collect();
        let mut dst = vec![0u8; u16::max_units_in::<u8>(src.len())];
        let written = u16::transcode_into::<u8>(&src, &mut dst)?;
        assert_eq!(&dst[..written], "ä€😀x".as_bytes());
        Ok(())
    }

    #[test]
    fn test_transcode_utf8_to_utf16() -> Result<()> {
        let src = "ä€😀x".as_bytes();
        let mut dst = vec![0u16; u8::max_units_in::<u16>(src.len())];
        let written = u8::transcode_into::<u16>(src, &mut dst)?;
        let expected: Vec<u16> = "ä€😀x".encode_utf16().collect();
        assert_eq!(&dst[..written], &expected[..]);
        Ok(())
    }

    #[test]
    fn test_transcode_rejects_lone_surrogate() {
        let src = [0x41u16, 0xd800, 0x42];
        let mut dst = vec![0u8; 9];
        assert_eq!(
            u16::transcode_into::<u8>(&src, &mut dst),
            Err(Error::InvalidUtf16 { index: 1 })
        );
        assert_eq!(validate_utf16(&src), Err(Error::InvalidUtf16 { index: 1 }));
        assert_eq!(validate_utf16(&[0x41, 0xd83d, 0xde00]), Ok(()));
    }

    #[test]
    fn test_copy_ascii_widens() {
        let mut dst = [0u16; 4];
        u16::copy_ascii(b"null", &mut dst);
        assert_eq!(dst, [b'n' as u16, b'u' as u16, b'l' as u16, b'l' as u16]);
    }

    #[test]
    fn test_thread_scratch_is_lent_once() {
        let (first, lease) = u8::take_thread_scratch().expect("scratch available");
        assert_eq!(first.len(), THREAD_SCRATCH_BYTES);
        assert!(lease.is_home());
        assert!(u8::take_thread_scratch().is_none());
        u8::restore_thread_scratch(first);
        let (again, _lease) = u8::take_thread_scratch().expect("scratch restored");
        u8::restore_thread_scratch(again);
    }

    #[test]
    fn test_forfeited_lease_frees_slot() {
        let (array, lease) = u16::take_thread_scratch().expect("scratch available");
        assert!(u16::take_thread_scratch().is_none());
        drop(array);
        lease.forfeit();

        // a fresh array replaces the one that never came back
        let (again, _lease) = u16::take_thread_scratch().expect("slot freed");
        assert_eq!(again.len(), THREAD_SCRATCH_BYTES / 2);
        u16::restore_thread_scratch(again);
    }

    #[test]
    fn test_to_string() -> Result<()> {
        let units: Vec<u16> = "{\"a\":1}".encode_utf16().collect();
        assert_eq!(<u16 as CodeUnit>::to_string(&units)?, "{\"a\":1}");
        assert_eq!(<u8 as CodeUnit>::to_string(b"[]")?, "[]");
        Ok(())
    }
}
