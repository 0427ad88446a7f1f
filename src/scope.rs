//!
//! Borrow-checked object and array scopes over a [`JsonWriter`].
//!

use crate::code_unit::CodeUnit;
use crate::error::Result;
use crate::text::Text;
use crate::value::JsonValue;
use crate::writer::JsonWriter;

///
/// Helper for writing a JSON object to the borrowed writer.
///
/// Can be created with [`write_object`].
///
/// Writes '{' on creation.
/// Writes '}' when closed.
///
pub struct ObjectScope<'a, T: CodeUnit> {
    writer: &'a mut JsonWriter<T>,
}

///
/// Helper for writing a JSON array to the borrowed writer.
///
/// Can be created with [`write_array`].
///
/// Writes '[' on creation.
/// Writes ']' when closed.
///
pub struct ArrayScope<'a, T: CodeUnit> {
    writer: &'a mut JsonWriter<T>,
}

impl<'a, T: CodeUnit> ObjectScope<'a, T> {
    #[inline(always)]
    fn new(writer: &'a mut JsonWriter<T>) -> Result<ObjectScope<'a, T>> {
        writer.write_start_object()?;
        Ok(ObjectScope { writer })
    }

    #[inline(always)]
    fn named(writer: &'a mut JsonWriter<T>, key: Text<'_>) -> Result<ObjectScope<'a, T>> {
        writer.write_start_object_named(key)?;
        Ok(ObjectScope { writer })
    }

    ///
    /// Starts writing a nested object with given key.
    ///
    #[inline(always)]
    pub fn object<'b, 'k>(&'b mut self, key: impl Into<Text<'k>>) -> Result<ObjectScope<'b, T>> {
        ObjectScope::named(&mut *self.writer, key.into())
    }

    ///
    /// Starts writing a nested array with given key.
    ///
    #[inline(always)]
    pub fn array<'b, 'k>(&'b mut self, key: impl Into<Text<'k>>) -> Result<ArrayScope<'b, T>> {
        ArrayScope::named(&mut *self.writer, key.into())
    }

    ///
    /// Writes the key and the value.
    ///
    #[inline(always)]
    pub fn member<'k, V: JsonValue>(&mut self, key: impl Into<Text<'k>>, value: V) -> Result<()> {
        self.writer.write_member(key, value)
    }

    ///
    /// The underlying writer.
    ///
    #[inline(always)]
    pub fn writer(&self) -> &JsonWriter<T> {
        self.writer
    }

    ///
    /// Writes '}' and consumes the scope.
    ///
    /// Prefer this over dropping the scope because dropping ignores errors.
    ///
    #[inline(always)]
    pub fn end(self) -> Result<()> {
        let result = self.writer.write_end_object();
        // make sure we don't write it twice
        std::mem::forget(self);
        result
    }
}

///
/// Dropping ignores any errors of the writer.
///
impl<T: CodeUnit> Drop for ObjectScope<'_, T> {
    #[inline(always)]
    fn drop(&mut self) {
        let _ignored = self.writer.write_end_object();
    }
}

impl<'a, T: CodeUnit> ArrayScope<'a, T> {
    #[inline(always)]
    fn new(writer: &'a mut JsonWriter<T>) -> Result<ArrayScope<'a, T>> {
        writer.write_start_array()?;
        Ok(ArrayScope { writer })
    }

    #[inline(always)]
    fn named(writer: &'a mut JsonWriter<T>, key: Text<'_>) -> Result<ArrayScope<'a, T>> {
        writer.write_start_array_named(key)?;
        Ok(ArrayScope { writer })
    }

    ///
    /// Starts writing a nested object as array entry.
    ///
    #[inline(always)]
    pub fn object(&mut self) -> Result<ObjectScope<'_, T>> {
        ObjectScope::new(&mut *self.writer)
    }

    ///
    /// Starts writing a nested array as array entry.
    ///
    #[inline(always)]
    pub fn array(&mut self) -> Result<ArrayScope<'_, T>> {
        ArrayScope::new(&mut *self.writer)
    }

    ///
    /// Writes the value as array entry.
    ///
    #[inline(always)]
    pub fn value<V: JsonValue>(&mut self, value: V) -> Result<()> {
        self.writer.write_value(value)
    }

    ///
    /// The underlying writer.
    ///
    #[inline(always)]
    pub fn writer(&self) -> &JsonWriter<T> {
        self.writer
    }

    ///
    /// Writes ']' and consumes the scope.
    ///
    /// Prefer this over dropping the scope because dropping ignores errors.
    ///
    #[inline(always)]
    pub fn end(self) -> Result<()> {
        let result = self.writer.write_end_array();
        // make sure we don't write it twice
        std::mem::forget(self);
        result
    }
}

///
/// Dropping ignores any errors of the writer.
///
impl<T: CodeUnit> Drop for ArrayScope<'_, T> {
    #[inline(always)]
    fn drop(&mut self) {
        let _ignored = self.writer.write_end_array();
    }
}

///
/// Borrows the `writer` and starts writing an object.
///
/// Writes '{' immediately and returns an [`ObjectScope`] to add members and
/// close the object.
///
pub fn write_object<T: CodeUnit>(writer: &mut JsonWriter<T>) -> Result<ObjectScope<'_, T>> {
    ObjectScope::new(writer)
}

///
/// Borrows the `writer` and starts writing an array.
///
/// Writes '[' immediately and returns an [`ArrayScope`] to add values and
/// close the array.
///
pub fn write_array<T: CodeUnit>(writer: &mut JsonWriter<T>) -> Result<ArrayScope<'_, T>> {
    ArrayScope::new(writer)
}
