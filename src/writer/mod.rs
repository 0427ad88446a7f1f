//!
//! The writer façade.
//!
//! [`JsonWriter`] is generic over the output code unit: `JsonWriter<u8>` produces
//! UTF-8, `JsonWriter<u16>` produces UTF-16. Every write follows the same steps:
//! validate the content, validate the structure, reserve the worst-case length once,
//! write separator, line break, indentation and payload through a cursor, commit,
//! then update the structural state. A failing step leaves the output untouched.
//!

mod indent;
mod strings;
mod values;

use crate::bit_stack::BitStack;
use crate::buffer::{Cursor, GrowableBuffer};
use crate::code_unit::CodeUnit;
use crate::error::{Error, Result, StructuralErrorKind, TokenType};
use crate::escape::MAX_EXPANSION_FACTOR;
use crate::options::WriterOptions;
use crate::text::Text;
use indent::{Prefix, INDENT_SIZE};
use log::debug;
use strings::Body;

/// Largest property name or value, in code units after escaping.
pub const MAX_TOKEN_SIZE: usize = 1_000_000_000;

/// Largest property name or string value before escaping.
pub const MAX_UNESCAPED_TOKEN_SIZE: usize = MAX_TOKEN_SIZE / MAX_EXPANSION_FACTOR;

/// Largest binary value accepted by the base64 writers.
pub const MAX_BASE64_VALUE_TOKEN_SIZE: usize = (MAX_TOKEN_SIZE / 4) * 3;

///
/// Forward-only JSON writer over a pooled buffer.
///
/// ```
/// use json_emit::{JsonWriter, WriterOptions};
///
/// let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
/// writer.write_start_array()?;
/// writer.write_number_value(1)?;
/// writer.write_start_array()?;
/// writer.write_number_value(2)?;
/// writer.write_number_value(3)?;
/// writer.write_end_array()?;
/// writer.write_end_array()?;
/// assert_eq!(writer.into_vec(), b"[1,[2,3]]");
/// # Ok::<(), json_emit::Error>(())
/// ```
///
#[derive(Debug)]
pub struct JsonWriter<T: CodeUnit = u8> {
    buffer: GrowableBuffer<T>,
    options: WriterOptions,
    depth: usize,
    needs_separator: bool,
    in_object: bool,
    bit_stack: BitStack,
    token_type: TokenType,
}

impl<T: CodeUnit> Default for JsonWriter<T> {
    fn default() -> Self {
        Self::new(WriterOptions::default())
    }
}

impl<T: CodeUnit> JsonWriter<T> {
    ///
    /// Creates a writer over this thread's scratch buffer.
    ///
    /// If another writer on this thread holds the scratch buffer, a buffer is
    /// rented from the shared pool instead.
    ///
    pub fn new(options: WriterOptions) -> Self {
        Self::with_buffer(options, GrowableBuffer::from_thread_scratch())
    }

    ///
    /// Creates a writer over a pooled buffer of at least `initial_capacity` units.
    ///
    pub fn with_capacity(options: WriterOptions, initial_capacity: usize) -> Self {
        Self::with_buffer(options, GrowableBuffer::with_capacity(initial_capacity))
    }

    fn with_buffer(options: WriterOptions, buffer: GrowableBuffer<T>) -> Self {
        JsonWriter {
            buffer,
            options,
            depth: 0,
            needs_separator: false,
            in_object: false,
            bit_stack: BitStack::new(),
            token_type: TokenType::None,
        }
    }

    /// The options this writer was created with.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Code units written so far.
    #[inline]
    pub fn written_count(&self) -> usize {
        self.buffer.position()
    }

    /// Current buffer length in code units.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Units that can be written before the buffer grows.
    #[inline]
    pub fn free_capacity(&self) -> usize {
        self.buffer.free_capacity()
    }

    /// Everything written so far.
    #[inline]
    pub fn written(&self) -> &[T] {
        self.buffer.written()
    }

    /// Number of open objects and arrays.
    #[inline]
    pub fn current_depth(&self) -> usize {
        self.depth
    }

    /// The last token written.
    #[inline]
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    ///
    /// Forgets the written output and the structural state. The buffer is kept.
    ///
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.depth = 0;
        self.needs_separator = false;
        self.in_object = false;
        self.bit_stack.clear();
        self.token_type = TokenType::None;
    }

    ///
    /// Copies out exactly the written units and releases the buffer.
    ///
    pub fn into_vec(mut self) -> Vec<T> {
        self.buffer.take_written()
    }

    ///
    /// Decodes the written units into a `String` and releases the buffer.
    ///
    pub fn into_string(self) -> Result<String> {
        T::to_string(self.buffer.written())
    }

    ///
    /// Releases the buffer without copying anything out.
    ///
    pub fn dispose(mut self) {
        let written = self.buffer.position();
        if written > 0 {
            debug!("disposing writer with {written} unread code units");
        }
        self.buffer.release();
    }

    //
    // Structural validation
    //

    ///
    /// Checks a container start. A `named` start writes its own property name, so
    /// it follows the property rules instead of the value rules.
    ///
    fn validate_start(&self, named: bool) -> Result<()> {
        if self.depth >= self.options.max_depth {
            return Err(Error::DepthTooLarge {
                depth: self.depth + 1,
                max: self.options.max_depth,
            });
        }
        if named {
            return self.validate_property();
        }
        if !self.options.validates() {
            return Ok(());
        }
        if self.in_object {
            if self.token_type != TokenType::PropertyName {
                return Err(self.structural(
                    StructuralErrorKind::CannotStartContainerWithoutProperty,
                ));
            }
        } else if self.depth == 0 && self.token_type != TokenType::None {
            return Err(self.structural(
                StructuralErrorKind::CannotStartContainerAfterPrimitiveOrClose,
            ));
        }
        Ok(())
    }

    fn validate_property(&self) -> Result<()> {
        if !self.options.validates() {
            return Ok(());
        }
        if !self.in_object {
            return Err(self.structural(StructuralErrorKind::CannotWritePropertyWithinArray));
        }
        if self.token_type == TokenType::PropertyName {
            return Err(self.structural(StructuralErrorKind::CannotWritePropertyAfterProperty));
        }
        Ok(())
    }

    fn validate_value(&self) -> Result<()> {
        if !self.options.validates() {
            return Ok(());
        }
        if self.in_object {
            if self.token_type != TokenType::PropertyName {
                return Err(self.structural(StructuralErrorKind::CannotWriteValueWithinObject));
            }
        } else if self.depth == 0 && self.token_type != TokenType::None {
            return Err(self.structural(
                StructuralErrorKind::CannotWriteValueAfterPrimitiveOrClose,
            ));
        }
        Ok(())
    }

    fn validate_end(&self, object: bool) -> Result<()> {
        if !self.options.validates() {
            return Ok(());
        }
        if self.bit_stack.depth() == 0
            || self.token_type == TokenType::PropertyName
            || self.in_object != object
        {
            return Err(self.structural(StructuralErrorKind::MismatchedObjectArray));
        }
        Ok(())
    }

    #[cold]
    fn structural(&self, kind: StructuralErrorKind) -> Error {
        Error::structural(kind, self.token_type)
    }

    //
    // Token plumbing
    //

    ///
    /// What precedes a property name, value or container start.
    ///
    fn prefix(&self) -> Prefix {
        let mut prefix = Prefix {
            separator: self.needs_separator,
            ..Prefix::default()
        };
        if self.options.indented
            && !matches!(self.token_type, TokenType::None | TokenType::PropertyName)
        {
            prefix.new_line = Some(self.options.new_line.as_bytes());
            prefix.indent = self.depth * INDENT_SIZE;
        }
        prefix
    }

    ///
    /// Writes one token: prefix, then the optional property name, then `payload`.
    ///
    /// `payload_len` must bound what `payload` writes. Nothing is committed unless
    /// every part succeeds.
    ///
    fn write_token(
        &mut self,
        prefix: Prefix,
        name: Option<&Body<'_>>,
        payload_len: usize,
        payload: impl FnOnce(&mut Cursor<'_, T>) -> Result<()>,
    ) -> Result<()> {
        let indented = self.options.indented;
        let name_len = name.map_or(0, |name| {
            // quotes, colon and the space after it
            name.max_units::<T>().saturating_add(3 + indented as usize)
        });
        let total = prefix
            .len()
            .saturating_add(name_len)
            .saturating_add(payload_len);

        let mut cursor = self.buffer.reserve(total)?;
        prefix.write(&mut cursor);
        if let Some(name) = name {
            cursor.push(b'"');
            name.write(&mut cursor)?;
            cursor.push(b'"');
            cursor.push(b':');
            if indented {
                cursor.push(b' ');
            }
        }
        payload(&mut cursor)?;
        cursor.commit();
        Ok(())
    }

    ///
    /// Writes a value token, either bare or after a property name.
    ///
    fn write_value_token(
        &mut self,
        name: Option<&Body<'_>>,
        token: TokenType,
        payload_len: usize,
        payload: impl FnOnce(&mut Cursor<'_, T>) -> Result<()>,
    ) -> Result<()> {
        match name {
            Some(_) => self.validate_property()?,
            None => self.validate_value()?,
        }
        let prefix = self.prefix();
        self.write_token(prefix, name, payload_len, payload)?;
        self.needs_separator = true;
        self.token_type = token;
        Ok(())
    }

    //
    // Containers
    //

    fn write_start(&mut self, name: Option<&Body<'_>>, object: bool) -> Result<()> {
        self.validate_start(name.is_some())?;
        let prefix = self.prefix();
        let open = if object { b'{' } else { b'[' };
        self.write_token(prefix, name, 1, |cursor| {
            cursor.push(open);
            Ok(())
        })?;

        self.depth += 1;
        if self.options.validates() {
            self.bit_stack.push(object);
            self.in_object = object;
        }
        self.needs_separator = false;
        self.token_type = if object {
            TokenType::BeginObject
        } else {
            TokenType::BeginArray
        };
        Ok(())
    }

    fn write_end(&mut self, object: bool) -> Result<()> {
        self.validate_end(object)?;
        let (open_token, close) = if object {
            (TokenType::BeginObject, b'}')
        } else {
            (TokenType::BeginArray, b']')
        };

        let mut prefix = Prefix::default();
        if self.options.indented && self.token_type != open_token {
            prefix.new_line = Some(self.options.new_line.as_bytes());
            prefix.indent = self.depth.saturating_sub(1) * INDENT_SIZE;
        }
        self.write_token(prefix, None, 1, |cursor| {
            cursor.push(close);
            Ok(())
        })?;

        self.depth = self.depth.saturating_sub(1);
        if self.options.validates() {
            self.in_object = self.bit_stack.pop();
        }
        self.needs_separator = true;
        self.token_type = if object {
            TokenType::EndObject
        } else {
            TokenType::EndArray
        };
        Ok(())
    }

    /// Writes `{`.
    pub fn write_start_object(&mut self) -> Result<()> {
        self.write_start(None, true)
    }

    /// Writes `[`.
    pub fn write_start_array(&mut self) -> Result<()> {
        self.write_start(None, false)
    }

    ///
    /// Writes `"name":{`.
    ///
    pub fn write_start_object_named<'a>(&mut self, name: impl Into<Text<'a>>) -> Result<()> {
        let name = Body::name(name.into(), &self.options.escape_handling)?;
        self.write_start(Some(&name), true)
    }

    ///
    /// Writes `"name":[`.
    ///
    pub fn write_start_array_named<'a>(&mut self, name: impl Into<Text<'a>>) -> Result<()> {
        let name = Body::name(name.into(), &self.options.escape_handling)?;
        self.write_start(Some(&name), false)
    }

    /// Writes `}`.
    pub fn write_end_object(&mut self) -> Result<()> {
        self.write_end(true)
    }

    /// Writes `]`.
    pub fn write_end_array(&mut self) -> Result<()> {
        self.write_end(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::NewLine;

    fn indented() -> WriterOptions {
        WriterOptions::indented().with_new_line(NewLine::Lf)
    }

    #[test]
    fn test_empty_object() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_start_object()?;
        writer.write_end_object()?;
        assert_eq!(writer.written(), b"{}");
        assert_eq!(writer.token_type(), TokenType::EndObject);
        Ok(())
    }

    #[test]
    fn test_nested_containers() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_start_object()?;
        writer.write_start_array_named("a")?;
        writer.write_start_object()?;
        writer.write_end_object()?;
        writer.write_start_array()?;
        writer.write_end_array()?;
        writer.write_end_array()?;
        writer.write_start_object_named("b")?;
        assert_eq!(writer.current_depth(), 2);
        writer.write_end_object()?;
        writer.write_end_object()?;
        assert_eq!(writer.current_depth(), 0);
        assert_eq!(writer.into_string()?, r#"{"a":[{},[]],"b":{}}"#);
        Ok(())
    }

    #[test]
    fn test_indented_containers() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(indented());
        writer.write_start_object()?;
        writer.write_start_array_named("a")?;
        writer.write_start_object()?;
        writer.write_end_object()?;
        writer.write_end_array()?;
        writer.write_start_object_named("b")?;
        writer.write_end_object()?;
        writer.write_end_object()?;
        assert_eq!(
            writer.into_string()?,
            "{\n  \"a\": [\n    {}\n  ],\n  \"b\": {}\n}"
        );
        Ok(())
    }

    #[test]
    fn test_mismatched_end() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_start_array()?;
        assert_eq!(
            writer.write_end_object(),
            Err(Error::structural(
                StructuralErrorKind::MismatchedObjectArray,
                TokenType::BeginArray
            ))
        );
        assert_eq!(writer.written(), b"[");

        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        assert!(writer.write_end_array().unwrap_err().is_structural());
        Ok(())
    }

    #[test]
    fn test_second_root_container() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_start_array()?;
        writer.write_end_array()?;
        assert_eq!(
            writer.write_start_object(),
            Err(Error::structural(
                StructuralErrorKind::CannotStartContainerAfterPrimitiveOrClose,
                TokenType::EndArray
            ))
        );
        Ok(())
    }

    #[test]
    fn test_container_in_object_needs_name() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_start_object()?;
        assert_eq!(
            writer.write_start_array(),
            Err(Error::structural(
                StructuralErrorKind::CannotStartContainerWithoutProperty,
                TokenType::BeginObject
            ))
        );
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_start_array()?;
        assert_eq!(
            writer.write_start_object_named("x"),
            Err(Error::structural(
                StructuralErrorKind::CannotWritePropertyWithinArray,
                TokenType::BeginArray
            ))
        );
        Ok(())
    }

    #[test]
    fn test_named_containers_in_object() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
        writer.write_start_object()?;
        writer.write_start_array_named("a")?;
        writer.write_end_array()?;
        writer.write_number("n", 1)?;
        writer.write_start_object_named("b")?;
        writer.write_start_object_named("c")?;
        writer.write_end_object()?;
        writer.write_end_object()?;

        writer.write_property_name("d")?;
        assert_eq!(
            writer.write_start_array_named("e"),
            Err(Error::structural(
                StructuralErrorKind::CannotWritePropertyAfterProperty,
                TokenType::PropertyName
            ))
        );
        writer.write_start_array()?;
        writer.write_end_array()?;
        writer.write_end_object()?;
        assert_eq!(
            writer.into_string()?,
            r#"{"a":[],"n":1,"b":{"c":{}},"d":[]}"#
        );
        Ok(())
    }

    #[test]
    fn test_named_container_depth_limit() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new().with_max_depth(1));
        writer.write_start_object()?;
        assert_eq!(
            writer.write_start_object_named("x"),
            Err(Error::DepthTooLarge { depth: 2, max: 1 })
        );
        assert_eq!(writer.written(), b"{");
        Ok(())
    }

    #[test]
    fn test_depth_limit_always_enforced() -> Result<()> {
        let options = WriterOptions::new()
            .with_max_depth(3)
            .with_skip_validation(true);
        let mut writer = JsonWriter::<u8>::new(options);
        for _ in 0..3 {
            writer.write_start_array()?;
        }
        assert_eq!(
            writer.write_start_array(),
            Err(Error::DepthTooLarge { depth: 4, max: 3 })
        );
        assert_eq!(writer.written(), b"[[[");
        Ok(())
    }

    #[test]
    fn test_skip_validation_trusts_caller() -> Result<()> {
        let mut writer = JsonWriter::<u8>::new(WriterOptions::new().with_skip_validation(true));
        writer.write_start_array()?;
        writer.write_end_object()?;
        writer.write_end_array()?;
        assert_eq!(writer.written(), b"[}]");
        assert_eq!(writer.current_depth(), 0);
        Ok(())
    }

    #[test]
    fn test_reset_keeps_buffer() -> Result<()> {
        let mut writer = JsonWriter::<u16>::with_capacity(WriterOptions::new(), 64);
        writer.write_start_object()?;
        let capacity = writer.capacity();
        writer.reset();
        assert_eq!(writer.written_count(), 0);
        assert_eq!(writer.capacity(), capacity);
        assert_eq!(writer.current_depth(), 0);
        assert_eq!(writer.token_type(), TokenType::None);
        writer.write_start_array()?;
        writer.write_end_array()?;
        assert_eq!(writer.into_string()?, "[]");
        Ok(())
    }

    #[test]
    fn test_introspection() -> Result<()> {
        let mut writer = JsonWriter::<u8>::with_capacity(WriterOptions::new(), 100);
        let capacity = writer.capacity();
        assert!(capacity >= 100);
        writer.write_start_array()?;
        assert_eq!(writer.written_count(), 1);
        assert_eq!(writer.free_capacity(), capacity - 1);
        writer.dispose();
        Ok(())
    }
}
