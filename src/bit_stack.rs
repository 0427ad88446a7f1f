//!
//! One bit per open container: `true` for an object, `false` for an array.
//!
//! The first 64 levels live in a single word; deeper levels spill into a vector.
//!

const INLINE_BITS: usize = u64::BITS as usize;

#[derive(Debug, Default, Clone)]
pub(crate) struct BitStack {
    inline: u64,
    spilled: Vec<u64>,
    depth: usize,
}

impl BitStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub(crate) fn push(&mut self, bit: bool) {
        let index = self.depth;
        if index < INLINE_BITS {
            let mask = 1u64 << index;
            if bit {
                self.inline |= mask;
            } else {
                self.inline &= !mask;
            }
        } else {
            let (word, offset) = spill_position(index);
            if word == self.spilled.len() {
                self.spilled.push(0);
            }
            let mask = 1u64 << offset;
            if bit {
                self.spilled[word] |= mask;
            } else {
                self.spilled[word] &= !mask;
            }
        }
        self.depth += 1;
    }

    ///
    /// Removes the innermost bit and returns the bit that is on top afterwards
    /// (`false` once the stack is empty).
    ///
    #[inline]
    pub(crate) fn pop(&mut self) -> bool {
        debug_assert!(self.depth > 0, "pop on empty bit stack");
        self.depth = self.depth.saturating_sub(1);
        self.peek()
    }

    /// Top bit, `false` when empty.
    #[inline]
    pub(crate) fn peek(&self) -> bool {
        match self.depth {
            0 => false,
            depth => self.get(depth - 1),
        }
    }

    fn get(&self, index: usize) -> bool {
        if index < INLINE_BITS {
            self.inline & (1u64 << index) != 0
        } else {
            let (word, offset) = spill_position(index);
            self.spilled[word] & (1u64 << offset) != 0
        }
    }

    pub(crate) fn clear(&mut self) {
        self.inline = 0;
        self.spilled.clear();
        self.depth = 0;
    }
}

#[inline(always)]
fn spill_position(index: usize) -> (usize, usize) {
    let spilled = index - INLINE_BITS;
    (spilled / INLINE_BITS, spilled % INLINE_BITS)
}
