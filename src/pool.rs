//!
//! Thread-safe pool of code-unit arrays.
//!
//! Arrays are grouped in power-of-two size buckets. A rented array is exclusively
//! owned by its renter until it is handed back with [`ArrayPool::return_array`].
//!

use log::trace;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Smallest bucket size.
const MIN_ARRAY_LENGTH: usize = 16;
/// Arrays above this length are allocated exactly and never pooled.
const MAX_POOLED_LENGTH: usize = 1 << 24;
/// Number of idle arrays kept per bucket.
const ARRAYS_PER_BUCKET: usize = 32;

///
/// A pool of reusable `Vec<T>` with `len() == capacity` semantics.
///
/// Every rented array is fully initialized; its contents are whatever the previous
/// renter left behind.
///
#[derive(Debug)]
pub struct ArrayPool<T> {
    buckets: Vec<Mutex<Vec<Vec<T>>>>,
}

impl<T: Copy + Default> Default for ArrayPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default> ArrayPool<T> {
    ///
    /// Creates an empty pool.
    ///
    pub fn new() -> Self {
        let count = bucket_index(MAX_POOLED_LENGTH).map_or(0, |index| index + 1);
        ArrayPool {
            buckets: (0..count).map(|_| Mutex::new(Vec::new())).collect(),
        }
    }

    ///
    /// Rents an array of at least `min_len` units.
    ///
    pub fn rent(&self, min_len: usize) -> Vec<T> {
        match bucket_index(min_len) {
            Some(index) => {
                if let Some(array) = self.bucket(index).pop() {
                    return array;
                }
                vec![T::default(); bucket_size(index)]
            }
            None => {
                trace!("renting unpooled array of {min_len} units");
                vec![T::default(); min_len]
            }
        }
    }

    ///
    /// Hands an array back to the pool.
    ///
    /// Arrays that did not come from a bucket, or that would overfill one, are dropped.
    ///
    pub fn return_array(&self, array: Vec<T>) {
        let len = array.len();
        let index = match bucket_index(len) {
            Some(index) if bucket_size(index) == len => index,
            _ => return,
        };
        let mut bucket = self.bucket(index);
        if bucket.len() < ARRAYS_PER_BUCKET {
            bucket.push(array);
        }
    }

    ///
    /// Number of idle arrays currently held by the pool.
    ///
    pub fn idle_count(&self) -> usize {
        (0..self.buckets.len())
            .map(|index| self.bucket(index).len())
            .sum()
    }

    fn bucket(&self, index: usize) -> MutexGuard<'_, Vec<Vec<T>>> {
        // A renter panicking while holding the lock cannot corrupt a Vec of Vecs.
        self.buckets[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[inline]
fn bucket_index(len: usize) -> Option<usize> {
    if len > MAX_POOLED_LENGTH {
        return None;
    }
    let size = len.max(MIN_ARRAY_LENGTH).next_power_of_two();
    Some((size.trailing_zeros() - MIN_ARRAY_LENGTH.trailing_zeros()) as usize)
}

#[inline]
fn bucket_size(index: usize) -> usize {
    MIN_ARRAY_LENGTH << index
}
