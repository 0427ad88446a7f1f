//!
//! Writer configuration.
//!
//! ```
//! use json_emit::{EscapeHandling, NewLine, WriterOptions};
//!
//! let options = WriterOptions::new()
//!     .with_indented(true)
//!     .with_new_line(NewLine::Lf)
//!     .with_escape_handling(EscapeHandling::NonAscii);
//! assert!(options.indented);
//! ```
//!

use crate::escape::JsonEncoder;
use std::sync::Arc;

/// Default maximum nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

///
/// Which characters beyond the RFC 8259 minimum are escaped.
///
/// `"`, `\` and the control characters U+0000 to U+001F are always escaped.
///
#[derive(Clone, Debug, Default)]
pub enum EscapeHandling {
    /// Only what JSON requires.
    #[default]
    Minimal,
    /// Additionally every non-ASCII character, as `\uXXXX` (surrogate pairs for astral characters).
    NonAscii,
    /// Additionally every character the encoder asks for.
    Custom(Arc<dyn JsonEncoder>),
}

///
/// Line ending used by indented output.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NewLine {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
}

impl NewLine {
    ///
    /// The line ending of the platform the crate was compiled for.
    ///
    pub const fn platform() -> Self {
        if cfg!(windows) {
            NewLine::CrLf
        } else {
            NewLine::Lf
        }
    }

    /// Bytes of the line ending.
    pub const fn as_bytes(&self) -> &'static [u8] {
        match self {
            NewLine::Lf => b"\n",
            NewLine::CrLf => b"\r\n",
        }
    }
}

impl Default for NewLine {
    fn default() -> Self {
        NewLine::platform()
    }
}

///
/// Options for a [`JsonWriter`](crate::JsonWriter).
///
/// Options are fixed for the lifetime of a writer.
///
#[derive(Clone, Debug)]
pub struct WriterOptions {
    /// Pretty print with line breaks and two spaces per nesting level.
    pub indented: bool,
    /// Trust the caller and skip the structural state machine.
    /// The depth limit is still enforced.
    pub skip_validation: bool,
    /// Escaping policy for property names and string values.
    pub escape_handling: EscapeHandling,
    /// Maximum nesting depth of objects and arrays.
    pub max_depth: usize,
    /// Line ending for indented output.
    pub new_line: NewLine,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            indented: false,
            skip_validation: false,
            escape_handling: EscapeHandling::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            new_line: NewLine::default(),
        }
    }
}

impl WriterOptions {
    /// Minimized output, validation on, minimal escaping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Indented output.
    ///
    /// ```
    /// use json_emit::WriterOptions;
    ///
    /// assert!(WriterOptions::indented().indented);
    /// ```
    ///
    #[must_use]
    pub fn indented() -> Self {
        WriterOptions {
            indented: true,
            ..Default::default()
        }
    }

    /// Sets whether output is indented.
    #[must_use]
    pub fn with_indented(mut self, indented: bool) -> Self {
        self.indented = indented;
        self
    }

    /// Sets whether structural validation is skipped.
    #[must_use]
    pub fn with_skip_validation(mut self, skip_validation: bool) -> Self {
        self.skip_validation = skip_validation;
        self
    }

    /// Sets the escaping policy.
    #[must_use]
    pub fn with_escape_handling(mut self, escape_handling: EscapeHandling) -> Self {
        self.escape_handling = escape_handling;
        self
    }

    /// Installs a custom escaper.
    #[must_use]
    pub fn with_encoder<E: JsonEncoder + 'static>(mut self, encoder: E) -> Self {
        self.escape_handling = EscapeHandling::Custom(Arc::new(encoder));
        self
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the line ending for indented output.
    #[must_use]
    pub fn with_new_line(mut self, new_line: NewLine) -> Self {
        self.new_line = new_line;
        self
    }

    /// True when structural validation runs.
    #[inline(always)]
    pub(crate) fn validates(&self) -> bool {
        !self.skip_validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::HtmlSafeEncoder;

    #[test]
    fn test_defaults() {
        let options = WriterOptions::default();
        assert!(!options.indented);
        assert!(!options.skip_validation);
        assert!(options.validates());
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert!(matches!(options.escape_handling, EscapeHandling::Minimal));
    }

    #[test]
    fn test_builder() {
        let options = WriterOptions::indented()
            .with_skip_validation(true)
            .with_max_depth(4)
            .with_new_line(NewLine::CrLf)
            .with_encoder(HtmlSafeEncoder);
        assert!(options.indented);
        assert!(!options.validates());
        assert_eq!(options.max_depth, 4);
        assert_eq!(options.new_line.as_bytes(), b"\r\n");
        assert!(matches!(options.escape_handling, EscapeHandling::Custom(_)));
    }
}
