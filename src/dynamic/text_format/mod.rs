//! Parsing and formatting for the protobuf [text format](https://developers.google.com/protocol-buffers/docs/text-format-spec).
//!
//! This module contains options for customizing the text format output. See
//! the associated functions [`DynamicMessage::parse_text_format()`] and
//! [`DynamicMessage::to_text_format()`].

mod format;
mod parse;

use std::fmt;

pub use self::parse::ParseError;

use crate::{DescriptorPool, DynamicMessage, MessageDescriptor, Value};

/// Options to control printing of the protobuf text format.
///
/// Used by [`DynamicMessage::to_text_format_with_options()`].
#[derive(Debug, Clone)]
pub struct FormatOptions {
    pretty: bool,
    indent: Box<str>,
    skip_unknown_fields: bool,
    expand_any: bool,
    resolver: Option<DescriptorPool>,
}

impl DynamicMessage {
    /// Parses a [`DynamicMessage`] from the text format.
    ///
    /// Unknown field names are always rejected, and a value may be given at
    /// most once for each non-repeated field or oneof.
    pub fn parse_text_format(desc: MessageDescriptor, input: &str) -> Result<Self, ParseError> {
        let mut message = DynamicMessage::new(desc);
        message.merge_text_format(input)?;
        Ok(message)
    }

    /// Parses the given text format input and merges it into this message.
    pub fn merge_text_format(&mut self, input: &str) -> Result<(), ParseError> {
        parse::Parser::new(input)
            .parse_message(self)
            .map_err(ParseError::new)
    }

    /// Formats this message using the protobuf text format, with default options.
    pub fn to_text_format(&self) -> String {
        self.to_text_format_with_options(&FormatOptions::new())
    }

    /// Formats this message using the protobuf text format, with custom options.
    pub fn to_text_format_with_options(&self, options: &FormatOptions) -> String {
        let mut result = String::new();
        format::Writer::new(options.clone(), &mut result)
            .fmt_message(self)
            .expect("writing to string cannot fail");
        result
    }
}

impl FormatOptions {
    /// Creates new instance of [`FormatOptions`] with default options.
    pub fn new() -> Self {
        FormatOptions::default()
    }

    /// Whether to prettify the format output.
    ///
    /// If set to `true`, each field is printed on a new line, and nested
    /// messages are indented.
    ///
    /// The default value is `false`.
    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    /// Sets the string written per indentation level in pretty output.
    ///
    /// Only spaces and tabs are permitted. The default is two spaces.
    ///
    /// # Panics
    ///
    /// Panics if the indent contains characters other than spaces and tabs.
    pub fn indent(mut self, indent: impl Into<Box<str>>) -> Self {
        let indent = indent.into();
        assert!(
            indent.bytes().all(|b| b == b' ' || b == b'\t'),
            "indent may only contain spaces and tabs"
        );
        self.indent = indent;
        self
    }

    /// Whether to skip unknown fields in the output.
    ///
    /// If set to `false`, unknown fields are printed by number. The wire data
    /// carries no type information, so the formatter infers a plausible type
    /// for each record.
    ///
    /// The default value is `true`.
    pub fn skip_unknown_fields(mut self, yes: bool) -> Self {
        self.skip_unknown_fields = yes;
        self
    }

    /// Whether to use the expanded form for `google.protobuf.Any`.
    ///
    /// If set to `true`, `Any` messages whose payload type can be resolved
    /// are written with a bracketed type URL key:
    ///
    /// ```textproto
    /// [type.googleapis.com/package.MyMessage] {
    ///   foo: 150
    /// }
    /// ```
    ///
    /// If set to `false`, the plain representation is used:
    ///
    /// ```textproto
    /// type_url: "type.googleapis.com/package.MyMessage"
    /// value: "\x08\x96\x01"
    /// ```
    ///
    /// The default value is `true`.
    pub fn expand_any(mut self, yes: bool) -> Self {
        self.expand_any = yes;
        self
    }

    /// Sets the pool used to resolve `Any` payload types when expanding.
    ///
    /// If unset, types are resolved through the pool containing the message's
    /// descriptor, falling back to the global pool.
    pub fn resolver(mut self, resolver: DescriptorPool) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            pretty: false,
            indent: "  ".into(),
            skip_unknown_fields: true,
            expand_any: true,
            resolver: None,
        }
    }
}

impl fmt::Display for DynamicMessage {
    /// Formats this message using the protobuf text format.
    ///
    /// The alternate format specifier produces pretty output, e.g.
    /// `format!("{:#}", message)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format::Writer::new(FormatOptions::new().pretty(f.alternate()), f).fmt_message(self)
    }
}

impl fmt::Display for Value {
    /// Formats this value using the protobuf text format.
    ///
    /// The alternate format specifier produces pretty output, e.g.
    /// `format!("{:#}", value)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format::Writer::new(FormatOptions::new().pretty(f.alternate()), f).fmt_value(self, None)
    }
}
