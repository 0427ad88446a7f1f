//!
//! Separator, line break and indentation written in front of a token.
//!

use crate::buffer::Cursor;
use crate::code_unit::CodeUnit;

/// Spaces per nesting level.
pub(crate) const INDENT_SIZE: usize = 2;

/// Indent runs shorter than this are written pairwise, longer ones with `fill`.
const FILL_THRESHOLD: usize = 8;

///
/// Everything that goes in front of a token, computed before the buffer is reserved.
///
#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct Prefix {
    pub(crate) separator: bool,
    pub(crate) new_line: Option<&'static [u8]>,
    pub(crate) indent: usize,
}

impl Prefix {
    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        let line = match self.new_line {
            Some(new_line) => new_line.len() + self.indent,
            None => 0,
        };
        self.separator as usize + line
    }

    #[inline]
    pub(crate) fn write<T: CodeUnit>(&self, cursor: &mut Cursor<'_, T>) {
        if self.separator {
            cursor.push(b',');
        }
        if let Some(new_line) = self.new_line {
            cursor.push_ascii(new_line);
            write_indent(cursor, self.indent);
        }
    }
}

///
/// Writes `count` spaces.
///
#[inline]
pub(crate) fn write_indent<T: CodeUnit>(cursor: &mut Cursor<'_, T>, count: usize) {
    let space = T::from_ascii(b' ');
    let slots = &mut cursor.free()[..count];
    if count < FILL_THRESHOLD {
        let mut index = 0;
        while index + 1 < count {
            slots[index] = space;
            slots[index + 1] = space;
            index += 2;
        }
        if index < count {
            slots[index] = space;
        }
    } else {
        slots.fill(space);
    }
    cursor.advance(count);
}
