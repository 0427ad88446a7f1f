#![warn(missing_docs)]

//!
//! Fast forward-only JSON writer that writes UTF-8 or UTF-16 directly into pooled
//! buffers, without creating intermediate objects.
//!
//! # Usage
//!
//! Basic usage:
//! ```
//! use json_emit::{JsonWriter, WriterOptions};
//!
//! let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
//! writer.write_start_object()?;
//! writer.write_number("number", 42)?;
//! writer.write_string("text", "he said \"hi\"")?;
//! writer.write_end_object()?;
//!
//! assert_eq!(writer.into_string()?, r#"{"number":42,"text":"he said \"hi\""}"#);
//! # Ok::<(), json_emit::Error>(())
//! ```
//!
//! The same calls produce UTF-16 with `JsonWriter<u16>`, and property names and
//! values may be given in either width:
//! ```
//! use json_emit::{Utf16JsonWriter, WriterOptions};
//!
//! let name: Vec<u16> = "ä".encode_utf16().collect();
//! let mut writer = Utf16JsonWriter::new(WriterOptions::new());
//! writer.write_start_object()?;
//! writer.write_bool(&name, true)?;
//! writer.write_end_object()?;
//!
//! let expected: Vec<u16> = r#"{"ä":true}"#.encode_utf16().collect();
//! assert_eq!(writer.into_vec(), expected);
//! # Ok::<(), json_emit::Error>(())
//! ```
//!
//! Various values:
//!
//! ```
//! use json_emit::{Null, to_json_string, write_object, JsonWriter, WriterOptions};
//!
//! // Values
//! assert_eq!(to_json_string("Hello World\n")?, "\"Hello World\\n\"");
//! assert_eq!(to_json_string(3.141592653589793f64)?, "3.141592653589793");
//! assert_eq!(to_json_string(true)?, "true");
//! assert_eq!(to_json_string(Null)?, "null");
//!
//! // Options of values
//! assert_eq!(to_json_string(Option::<u8>::Some(42))?, "42");
//! assert_eq!(to_json_string(Option::<u8>::None)?, "null");
//!
//! // Slices and vectors
//! let numbers: [u8; 4] = [1,2,3,4];
//! assert_eq!(to_json_string(&numbers[..])?, "[1,2,3,4]");
//! let numbers_vec: Vec<u8> = vec!(1u8,2u8,3u8,4u8);
//! assert_eq!(to_json_string(&numbers_vec)?, "[1,2,3,4]");
//!
//! // Hash-maps:
//! let mut map = std::collections::HashMap::<String,String>::new();
//! map.insert("Hello".to_owned(), "World".to_owned());
//! assert_eq!(to_json_string(&map)?, "{\"Hello\":\"World\"}");
//!
//! // Scopes:
//! let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
//! let mut object = write_object(&mut writer)?;
//! object.member("number", 42i32)?;
//! object.member("slice", &numbers[..])?;
//!
//! let mut nested_array = object.array("array")?;
//! nested_array.value(42u32)?;
//! nested_array.value("?")?;
//! nested_array.end()?;
//!
//! let nested_object = object.object("object")?;
//! nested_object.end()?;
//!
//! object.end()?;
//! assert_eq!(writer.into_string()?, "{\"number\":42,\"slice\":[1,2,3,4],\"array\":[42,\"?\"],\"object\":{}}");
//! # Ok::<(), json_emit::Error>(())
//! ```
//!
//! # Validation
//!
//! Unless [`WriterOptions::skip_validation`] is set, every call is checked against
//! the JSON grammar before anything is written:
//!
//! ```
//! use json_emit::{Error, JsonWriter, StructuralErrorKind, WriterOptions};
//!
//! let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
//! writer.write_start_object()?;
//! let err = writer.write_number_value(1).unwrap_err();
//! assert!(matches!(
//!     err,
//!     Error::Structural { kind: StructuralErrorKind::CannotWriteValueWithinObject, .. }
//! ));
//! assert_eq!(writer.written(), b"{");
//! # Ok::<(), json_emit::Error>(())
//! ```
//!
//! # Limitations
//!
//! Because there is no intermediate representation, all values must be written in
//! the order they appear in the JSON output.
//! The borrow checker ensures nested scopes are closed before anything else can be
//! written after them.
//! ```compile_fail
//! use json_emit::{write_object, JsonWriter, WriterOptions};
//!
//! let mut writer = JsonWriter::<u8>::new(WriterOptions::new());
//! let mut object = write_object(&mut writer).unwrap();
//! let mut nested_a = object.object("a").unwrap();
//! let mut nested_b = object.object("b").unwrap();
//!
//! // Compile error: only one nested scope can be open at a time.
//! nested_a.member("id", "a").unwrap();
//! nested_b.member("id", "b").unwrap();
//! ```
//!
//! The writer does **not** check for duplicate keys.
//!

mod bit_stack;
mod buffer;
mod code_unit;
mod datetime;
mod error;
pub mod escape;
mod number;
mod options;
mod pool;
mod scope;
mod text;
mod value;
mod writer;

pub use code_unit::CodeUnit;
pub use datetime::{JsonDateTime, MAX_DATE_TIME_LEN};
pub use error::{Error, Result, StructuralErrorKind, TokenType};
pub use escape::{HtmlSafeEncoder, JsonEncoder};
pub use number::{is_valid_number, JsonNumber};
pub use options::{EscapeHandling, NewLine, WriterOptions, DEFAULT_MAX_DEPTH};
pub use pool::ArrayPool;
pub use scope::{write_array, write_object, ArrayScope, ObjectScope};
pub use text::{EncodedText, Text};
pub use value::{to_json_string, to_json_vec, Base64, JsonValue, Null};
pub use writer::{JsonWriter, MAX_BASE64_VALUE_TOKEN_SIZE, MAX_TOKEN_SIZE, MAX_UNESCAPED_TOKEN_SIZE};

/// Writer producing UTF-8 bytes.
pub type Utf8JsonWriter = JsonWriter<u8>;

/// Writer producing UTF-16 code units.
pub type Utf16JsonWriter = JsonWriter<u16>;
