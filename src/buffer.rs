//!
//! Growable output buffer over a rented array.
//!
//! Writes go through [`Cursor`]: one capacity check up front via
//! [`GrowableBuffer::reserve`], plain slice stores afterwards, and a single
//! position update in [`Cursor::commit`]. A cursor dropped without `commit`
//! leaves the buffer untouched.
//!

use crate::code_unit::{CodeUnit, ScratchLease};
use crate::error::{Error, Result};
use log::trace;

/// Growth floor, and the size used for degenerate size hints.
pub(crate) const MIN_BUFFER_SIZE: usize = 256;

#[derive(Debug)]
enum Origin {
    /// A thread's scratch buffer; goes back to that thread's slot.
    ThreadScratch(ScratchLease),
    /// Rented from the shared pool.
    Pool,
    /// Already handed back.
    Released,
}

///
/// Rented array plus write position.
///
/// Invariant: `position <= array.len()`.
///
#[derive(Debug)]
pub(crate) struct GrowableBuffer<T: CodeUnit> {
    array: Vec<T>,
    position: usize,
    origin: Origin,
}

impl<T: CodeUnit> GrowableBuffer<T> {
    ///
    /// Borrows this thread's scratch buffer, or rents from the pool when a
    /// writer on this thread already holds it.
    ///
    pub(crate) fn from_thread_scratch() -> Self {
        match T::take_thread_scratch() {
            Some((array, lease)) => GrowableBuffer {
                array,
                position: 0,
                origin: Origin::ThreadScratch(lease),
            },
            None => {
                trace!("thread scratch in use, renting from pool");
                Self::with_capacity(MIN_BUFFER_SIZE)
            }
        }
    }

    ///
    /// Rents an array of at least `capacity` units.
    ///
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        GrowableBuffer {
            array: T::shared_pool().rent(capacity.max(1)),
            position: 0,
            origin: Origin::Pool,
        }
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.array.len()
    }

    #[inline(always)]
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    #[inline(always)]
    pub(crate) fn free_capacity(&self) -> usize {
        self.array.len() - self.position
    }

    #[inline(always)]
    pub(crate) fn written(&self) -> &[T] {
        &self.array[..self.position]
    }

    /// Forgets everything written, keeping the array.
    pub(crate) fn clear(&mut self) {
        self.position = 0;
    }

    ///
    /// Makes sure at least `size_hint` units are free.
    ///
    #[inline]
    pub(crate) fn ensure(&mut self, size_hint: usize) -> Result<()> {
        if self.free_capacity() < size_hint {
            self.grow(size_hint)?;
        }
        Ok(())
    }

    #[cold]
    #[inline(never)]
    fn grow(&mut self, size_hint: usize) -> Result<()> {
        let capacity = self.capacity();
        let new_capacity = grown_capacity(capacity, size_hint)?;
        trace!("growing buffer from {capacity} to {new_capacity} units");

        let mut array = T::shared_pool().rent(new_capacity);
        array[..self.position].copy_from_slice(&self.array[..self.position]);
        let old = std::mem::replace(&mut self.array, array);
        self.hand_back(old);
        self.origin = Origin::Pool;
        Ok(())
    }

    ///
    /// Reserves exactly `len` units after the current position.
    ///
    /// Grows first if needed; the returned cursor never writes past `len`.
    ///
    #[inline]
    pub(crate) fn reserve(&mut self, len: usize) -> Result<Cursor<'_, T>> {
        self.ensure(len)?;
        let GrowableBuffer {
            array, position, ..
        } = self;
        let start = *position;
        Ok(Cursor {
            out: &mut array[start..start + len],
            written: 0,
            position,
        })
    }

    ///
    /// Copies out exactly the written prefix and releases the array.
    ///
    pub(crate) fn take_written(&mut self) -> Vec<T> {
        let written = self.written().to_vec();
        self.release();
        written
    }

    ///
    /// Hands the array back to where it came from. Idempotent.
    ///
    pub(crate) fn release(&mut self) {
        let array = std::mem::take(&mut self.array);
        self.hand_back(array);
        self.position = 0;
        self.origin = Origin::Released;
    }

    fn hand_back(&self, array: Vec<T>) {
        match &self.origin {
            Origin::ThreadScratch(lease) if lease.is_home() => T::restore_thread_scratch(array),
            Origin::ThreadScratch(lease) => {
                trace!("thread scratch released on another thread, returning it to the pool");
                T::shared_pool().return_array(array);
                lease.forfeit();
            }
            Origin::Pool => T::shared_pool().return_array(array),
            Origin::Released => {}
        }
    }
}

impl<T: CodeUnit> Drop for GrowableBuffer<T> {
    fn drop(&mut self) {
        self.release();
    }
}

///
/// New capacity: `capacity + max(size_hint, capacity)`, at least [`MIN_BUFFER_SIZE`].
///
pub(crate) fn grown_capacity(capacity: usize, size_hint: usize) -> Result<usize> {
    let size_hint = if size_hint == 0 {
        MIN_BUFFER_SIZE
    } else {
        size_hint
    };
    let growth = size_hint.max(capacity).max(MIN_BUFFER_SIZE);
    capacity
        .checked_add(growth)
        .ok_or(Error::CapacityOverflow {
            capacity,
            requested: size_hint,
        })
}

///
/// Write window over reserved buffer space.
///
pub(crate) struct Cursor<'a, T> {
    out: &'a mut [T],
    written: usize,
    position: &'a mut usize,
}

impl<'a, T: CodeUnit> Cursor<'a, T> {
    #[inline(always)]
    pub(crate) fn push(&mut self, byte: u8) {
        self.out[self.written] = T::from_ascii(byte);
        self.written += 1;
    }

    #[inline(always)]
    pub(crate) fn push_ascii(&mut self, bytes: &[u8]) {
        T::copy_ascii(bytes, &mut self.out[self.written..]);
        self.written += bytes.len();
    }

    #[inline(always)]
    pub(crate) fn push_units(&mut self, units: &[T]) {
        self.out[self.written..self.written + units.len()].copy_from_slice(units);
        self.written += units.len();
    }

    ///
    /// Copies text of either width, transcoding when widths differ.
    ///
    #[inline]
    pub(crate) fn push_text<S: CodeUnit>(&mut self, text: &[S]) -> Result<()> {
        let written = S::transcode_into::<T>(text, &mut self.out[self.written..])?;
        self.written += written;
        Ok(())
    }

    /// Unwritten part of the reservation.
    #[inline(always)]
    pub(crate) fn free(&mut self) -> &mut [T] {
        &mut self.out[self.written..]
    }

    /// Marks `count` units of [`free`](Self::free) as written.
    #[inline(always)]
    pub(crate) fn advance(&mut self, count: usize) {
        debug_assert!(self.written + count <= self.out.len());
        self.written += count;
    }

    #[inline(always)]
    pub(crate) fn written(&self) -> usize {
        self.written
    }

    /// Moves the buffer position past everything written through this cursor.
    #[inline(always)]
    pub(crate) fn commit(self) {
        debug_assert!(self.written <= self.out.len());
        *self.position += self.written;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_policy() -> Result<()> {
        assert_eq!(grown_capacity(0, 0)?, MIN_BUFFER_SIZE);
        assert_eq!(grown_capacity(1024, 10)?, 2048);
        assert_eq!(grown_capacity(1024, 5000)?, 6024);
        assert_eq!(
            grown_capacity(usize::MAX - 10, 100),
            Err(Error::CapacityOverflow {
                capacity: usize::MAX - 10,
                requested: 100
            })
        );
        Ok(())
    }

    #[test]
    fn test_reserve_and_commit() -> Result<()> {
        let mut buffer = GrowableBuffer::<u8>::with_capacity(16);
        let mut cursor = buffer.reserve(8)?;
        cursor.push(b'[');
        cursor.push_ascii(b"12");
        cursor.push(b']');
        assert_eq!(cursor.written(), 4);
        cursor.commit();
        assert_eq!(buffer.written(), b"[12]");
        assert_eq!(buffer.position(), 4);
        Ok(())
    }

    #[test]
    fn test_uncommitted_cursor_writes_nothing() -> Result<()> {
        let mut buffer = GrowableBuffer::<u8>::with_capacity(16);
        let mut cursor = buffer.reserve(4)?;
        cursor.push_ascii(b"null");
        drop(cursor);
        assert_eq!(buffer.position(), 0);
        Ok(())
    }

    #[test]
    fn test_growth_keeps_prefix() -> Result<()> {
        let mut buffer = GrowableBuffer::<u16>::with_capacity(16);
        let mut expected = Vec::new();
        for i in 0..200u16 {
            let mut cursor = buffer.reserve(3)?;
            cursor.push_units(&[i, i + 1, i + 2]);
            cursor.commit();
            expected.extend_from_slice(&[i, i + 1, i + 2]);
            assert!(buffer.position() <= buffer.capacity());
        }
        assert_eq!(buffer.take_written(), expected);
        assert_eq!(buffer.capacity(), 0);
        Ok(())
    }

    #[test]
    fn test_thread_scratch_flips_to_pool_on_growth() -> Result<()> {
        let mut buffer = GrowableBuffer::<u8>::from_thread_scratch();
        assert!(matches!(buffer.origin, Origin::ThreadScratch(_)));
        let capacity = buffer.capacity();
        let mut cursor = buffer.reserve(capacity + 1)?;
        cursor.push(b'x');
        cursor.commit();
        assert!(matches!(buffer.origin, Origin::Pool));
        assert_eq!(buffer.written(), b"x");

        // The scratch went back to the thread slot when the buffer grew.
        let (scratch, _lease) = u8::take_thread_scratch().expect("scratch restored on growth");
        u8::restore_thread_scratch(scratch);
        Ok(())
    }

    #[test]
    fn test_second_buffer_on_thread_uses_pool() {
        let first = GrowableBuffer::<u8>::from_thread_scratch();
        let second = GrowableBuffer::<u8>::from_thread_scratch();
        assert!(matches!(first.origin, Origin::ThreadScratch(_)));
        assert!(matches!(second.origin, Origin::Pool));
    }

    #[test]
    fn test_scratch_dropped_on_other_thread() {
        let mut buffer = GrowableBuffer::<u8>::from_thread_scratch();
        assert!(matches!(buffer.origin, Origin::ThreadScratch(_)));
        let mut cursor = buffer.reserve(1).unwrap();
        cursor.push(b'x');
        cursor.commit();

        std::thread::spawn(move || {
            let own = GrowableBuffer::<u8>::from_thread_scratch();
            assert!(matches!(own.origin, Origin::ThreadScratch(_)));
            drop(buffer);
            // this thread's scratch is still lent to `own`
            let other = GrowableBuffer::<u8>::from_thread_scratch();
            assert!(matches!(other.origin, Origin::Pool));
        })
        .join()
        .unwrap();

        let again = GrowableBuffer::<u8>::from_thread_scratch();
        assert!(matches!(again.origin, Origin::ThreadScratch(_)));
        assert_eq!(again.position(), 0);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut buffer = GrowableBuffer::<u8>::with_capacity(64);
        buffer.release();
        buffer.release();
        assert_eq!(buffer.capacity(), 0);
        assert_eq!(buffer.free_capacity(), 0);
    }
}
