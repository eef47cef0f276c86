pub mod text_format;

mod fields;
mod message;
mod serde;
mod unknown;

use std::{borrow::Cow, collections::HashMap, error::Error, fmt};

pub use self::serde::{DeserializeOptions, SerializeOptions};
pub use self::unknown::{UnknownField, UnknownFieldValue};

pub(crate) use self::fields::FieldDescriptorLike;

use prost::{
    bytes::{Buf, BufMut, Bytes},
    encoding::{decode_key, DecodeContext},
    DecodeError, Message,
};

use self::fields::DynamicMessageFieldSet;
use crate::{
    descriptor::Kind, DescriptorPool, ExtensionDescriptor, FieldDescriptor, MessageDescriptor,
    OneofDescriptor, ReflectMessage,
};

/// [`DynamicMessage`] is a protobuf message whose type is only known at
/// runtime, described by a [`MessageDescriptor`].
///
/// It stores a [`Value`] for each populated field and preserves unknown
/// fields, and provides the reflection surface used by the binary, JSON and
/// text format codecs. It also implements [`Message`][prost::Message], so it
/// interoperates with generated prost types.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    desc: MessageDescriptor,
    fields: DynamicMessageFieldSet,
}

/// A dynamically-typed protobuf value.
///
/// A value does not know which wire representation its field uses, so it must
/// be encoded as part of a [`DynamicMessage`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean value, encoded as the `bool` protobuf type.
    Bool(bool),
    /// A 32-bit signed integer, encoded as one of the `int32`, `sint32` or `sfixed32` protobuf types.
    I32(i32),
    /// A 64-bit signed integer, encoded as one of the `int64`, `sint64` or `sfixed64` protobuf types.
    I64(i64),
    /// A 32-bit unsigned integer, encoded as one of the `uint32` or `fixed32` protobuf types.
    U32(u32),
    /// A 64-bit unsigned integer, encoded as one of the `uint64` or `fixed64` protobuf types.
    U64(u64),
    /// A 32-bit floating point number, encoded as the `float` protobuf type.
    F32(f32),
    /// A 64-bit floating point number, encoded as the `double` protobuf type.
    F64(f64),
    /// A string, encoded as the `string` protobuf type.
    String(String),
    /// A byte string, encoded as the `bytes` protobuf type.
    Bytes(Bytes),
    /// An enumeration value, encoded as a protobuf enum.
    EnumNumber(i32),
    /// A protobuf message.
    Message(DynamicMessage),
    /// A list of values, encoded as a protobuf repeated field.
    List(Vec<Value>),
    /// A map of values, encoded as a protobuf map field.
    Map(HashMap<MapKey, Value>),
}

/// A dynamically-typed key for a protobuf map.
///
/// Keys are totally ordered, so map entries can be emitted deterministically:
/// integers sort numerically, strings lexicographically by their bytes, and
/// `false` sorts before `true`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    /// A boolean value, encoded as the `bool` protobuf type.
    Bool(bool),
    /// A 32-bit signed integer, encoded as one of the `int32`, `sint32` or `sfixed32` protobuf types.
    I32(i32),
    /// A 64-bit signed integer, encoded as one of the `int64`, `sint64` or `sfixed64` protobuf types.
    I64(i64),
    /// A 32-bit unsigned integer, encoded as one of the `uint32` or `fixed32` protobuf types.
    U32(u32),
    /// A 64-bit unsigned integer, encoded as one of the `uint64` or `fixed64` protobuf types.
    U64(u64),
    /// A string, encoded as the `string` protobuf type.
    String(String),
}

/// Error type returned by [`DynamicMessage::try_set_field()`].
#[derive(Debug, Clone, PartialEq)]
pub enum SetFieldError {
    /// The field was not found.
    NotFound,
    /// The value type is not compatible with the field type (see
    /// [`Value::is_valid_for_field`]).
    InvalidType {
        /// The descriptor of the field which could not be set.
        field: FieldDescriptor,
        /// The invalid value.
        value: Value,
    },
}

/// Options for encoding a message to the binary wire format.
///
/// Used by [`DynamicMessage::encode_with_options`].
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    allow_partial: bool,
    deterministic: bool,
}

/// Options for decoding a message from the binary wire format.
///
/// Used by [`DynamicMessage::decode_with_options`].
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    allow_partial: bool,
    discard_unknown: bool,
    resolver: Option<DescriptorPool>,
}

/// An error that may occur when encoding a message to the binary wire format.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// One or more required fields are unset. Every missing field reachable
    /// through populated fields is listed.
    MissingRequiredFields {
        /// Paths of the missing fields, relative to the root message.
        paths: Vec<String>,
    },
    /// The output buffer did not have enough capacity for the encoded message.
    InsufficientCapacity {
        /// The number of bytes required.
        required: usize,
        /// The number of bytes remaining in the buffer.
        remaining: usize,
    },
}

impl EncodeOptions {
    /// Creates an [`EncodeOptions`] with default options: required fields are
    /// enforced and output is not deterministic.
    pub const fn new() -> Self {
        EncodeOptions {
            allow_partial: false,
            deterministic: false,
        }
    }

    /// Whether to skip the required fields check.
    ///
    /// If `false` (the default), encoding fails with
    /// [`EncodeError::MissingRequiredFields`] when any proto2 `required`
    /// field reachable through populated fields is unset.
    pub const fn allow_partial(mut self, yes: bool) -> Self {
        self.allow_partial = yes;
        self
    }

    /// Whether to produce deterministic output.
    ///
    /// When enabled, map entries are written in ascending key order. Two
    /// deterministic encodings of equal messages are byte-identical.
    /// Otherwise the order of map entries is unspecified, though it is stable
    /// within a single call.
    pub const fn deterministic(mut self, yes: bool) -> Self {
        self.deterministic = yes;
        self
    }
}

impl DecodeOptions {
    /// Creates a [`DecodeOptions`] with default options: required fields are
    /// enforced and unknown fields are preserved.
    pub const fn new() -> Self {
        DecodeOptions {
            allow_partial: false,
            discard_unknown: false,
            resolver: None,
        }
    }

    /// Whether to skip the required fields check after decoding.
    pub const fn allow_partial(mut self, yes: bool) -> Self {
        self.allow_partial = yes;
        self
    }

    /// Whether to discard unknown fields instead of preserving them.
    pub const fn discard_unknown(mut self, yes: bool) -> Self {
        self.discard_unknown = yes;
        self
    }

    /// Sets the pool used to resolve extensions by (extendee, number).
    ///
    /// If unset, extensions are resolved through the pool containing the
    /// message's descriptor.
    pub fn resolver(mut self, resolver: DescriptorPool) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub(crate) fn find_extension(
        &self,
        desc: &MessageDescriptor,
        number: u32,
    ) -> Option<ExtensionDescriptor> {
        match &self.resolver {
            Some(resolver) => resolver.get_extension_by_number(desc.full_name(), number),
            None => desc.get_extension(number),
        }
    }

    pub(crate) fn is_discard_unknown(&self) -> bool {
        self.discard_unknown
    }
}

impl DynamicMessage {
    /// Creates a new, empty instance of the message type specified by the
    /// [`MessageDescriptor`], with all fields unset.
    pub fn new(desc: MessageDescriptor) -> Self {
        DynamicMessage {
            fields: DynamicMessageFieldSet::default(),
            desc,
        }
    }

    /// Decodes an instance of the message type specified by the
    /// [`MessageDescriptor`] from the buffer.
    ///
    /// Unlike [`merge`][Message::merge], this fails if a required field is
    /// unset; use [`decode_with_options`][Self::decode_with_options] with
    /// [`DecodeOptions::allow_partial`] to permit that.
    pub fn decode<B>(desc: MessageDescriptor, buf: B) -> Result<Self, DecodeError>
    where
        B: Buf,
    {
        Self::decode_with_options(desc, buf, &DecodeOptions::new())
    }

    /// Decodes an instance of the message type specified by the
    /// [`MessageDescriptor`] from the buffer, with the given options.
    pub fn decode_with_options<B>(
        desc: MessageDescriptor,
        buf: B,
        options: &DecodeOptions,
    ) -> Result<Self, DecodeError>
    where
        B: Buf,
    {
        let mut message = DynamicMessage::new(desc);
        message.merge_with_options(buf, options)?;
        Ok(message)
    }

    /// Decodes the buffer and merges its fields into this message, with the
    /// given options.
    ///
    /// Scalar fields are overwritten, messages are merged recursively, and
    /// repeated fields are appended.
    pub fn merge_with_options<B>(
        &mut self,
        mut buf: B,
        options: &DecodeOptions,
    ) -> Result<(), DecodeError>
    where
        B: Buf,
    {
        let ctx = DecodeContext::default();
        while buf.has_remaining() {
            let (number, wire_type) = decode_key(&mut buf)?;
            self.merge_field_with_options(number, wire_type, &mut buf, ctx.clone(), options)?;
        }

        if !options.allow_partial {
            let missing = self.missing_fields();
            if !missing.is_empty() {
                return Err(DecodeError::new(format!(
                    "missing required fields: {}",
                    missing.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Encodes this message to the binary wire format, appending it to `buf`.
    pub fn encode<B>(&self, buf: &mut B) -> Result<(), EncodeError>
    where
        B: BufMut,
    {
        self.encode_with_options(buf, &EncodeOptions::new())
    }

    /// Encodes this message to the binary wire format with the given options,
    /// appending it to `buf`.
    pub fn encode_with_options<B>(
        &self,
        buf: &mut B,
        options: &EncodeOptions,
    ) -> Result<(), EncodeError>
    where
        B: BufMut,
    {
        if !options.allow_partial {
            self.is_initialized()?;
        }
        let required = Message::encoded_len(self);
        let remaining = buf.remaining_mut();
        if required > remaining {
            return Err(EncodeError::InsufficientCapacity {
                required,
                remaining,
            });
        }
        self.encode_raw_with_options(buf, options);
        Ok(())
    }

    /// Encodes this message to a newly allocated buffer.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        self.encode_to_vec_with_options(&EncodeOptions::new())
    }

    /// Encodes this message to a newly allocated buffer, with the given options.
    pub fn encode_to_vec_with_options(
        &self,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::with_capacity(Message::encoded_len(self));
        self.encode_with_options(&mut buf, options)?;
        Ok(buf)
    }

    /// Checks that every `required` field reachable through populated fields
    /// is set, including fields of messages inside lists and maps.
    ///
    /// On failure the returned error lists every missing field, rather than
    /// stopping at the first.
    pub fn is_initialized(&self) -> Result<(), EncodeError> {
        let paths = self.missing_fields();
        if paths.is_empty() {
            Ok(())
        } else {
            Err(EncodeError::MissingRequiredFields { paths })
        }
    }

    fn missing_fields(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.append_missing_fields("", &mut paths);
        paths
    }

    fn append_missing_fields(&self, prefix: &str, paths: &mut Vec<String>) {
        for &number in self.desc.required_numbers() {
            let field = self.desc.get_field(number).expect("required field exists");
            if !self.fields.has(&field) {
                paths.push(join_path(prefix, field.name()));
            }
        }

        for (field, value) in self.fields.iter_fields(&self.desc) {
            append_missing_in_value(&join_path(prefix, field.name()), &field, value, paths);
        }
        for (extension, value) in self.fields.iter_extensions() {
            append_missing_in_value(
                &join_path(prefix, extension.json_name()),
                &extension,
                value,
                paths,
            );
        }
    }

    /// Gets the [`MessageDescriptor`] describing the type of this message.
    pub fn descriptor(&self) -> MessageDescriptor {
        self.desc.clone()
    }

    /// Returns `true` if this message has the given field set.
    ///
    /// For fields that track presence explicitly (see
    /// [`supports_presence`][FieldDescriptor::supports_presence]) this
    /// returns `true` only if a value was set. For other fields it returns
    /// `true` if the value differs from the default.
    pub fn has_field(&self, field_desc: &FieldDescriptor) -> bool {
        self.fields.has(field_desc)
    }

    /// Gets the value of the given field, or its default value if unset.
    pub fn get_field(&self, field_desc: &FieldDescriptor) -> Cow<'_, Value> {
        self.fields.get(field_desc)
    }

    /// Gets a mutable reference to the value of the given field, inserting
    /// its default value if unset.
    ///
    /// For fields contained in a oneof, this clears any other member of the
    /// oneof. The returned reference stays valid (and is returned again by
    /// [`get_field`][Self::get_field]) until the field is cleared.
    pub fn get_field_mut(&mut self, field_desc: &FieldDescriptor) -> &mut Value {
        self.fields.get_mut(field_desc)
    }

    /// Sets the value of the given field.
    ///
    /// For fields contained in a oneof, any other member of the oneof is
    /// cleared.
    ///
    /// # Panics
    ///
    /// May panic if the value type is not compatible with the field type, as
    /// defined by [`Value::is_valid_for_field`]. Consider using
    /// [`try_set_field()`](DynamicMessage::try_set_field) for a non-panicking
    /// version.
    pub fn set_field(&mut self, field_desc: &FieldDescriptor, value: Value) {
        self.try_set_field(field_desc, value).unwrap()
    }

    /// Sets the value of the given field, returning an error if the value has
    /// an invalid type.
    pub fn try_set_field(
        &mut self,
        field_desc: &FieldDescriptor,
        value: Value,
    ) -> Result<(), SetFieldError> {
        if value.is_valid_for_field(field_desc) {
            self.fields.set(field_desc, value);
            Ok(())
        } else {
            Err(SetFieldError::InvalidType {
                field: field_desc.clone(),
                value,
            })
        }
    }

    /// Clears the given field.
    pub fn clear_field(&mut self, field_desc: &FieldDescriptor) {
        self.fields.clear(field_desc);
    }

    /// Clears the given field and returns its value, or `None` if
    /// [`has_field`](Self::has_field) was `false`.
    pub fn take_field(&mut self, field_desc: &FieldDescriptor) -> Option<Value> {
        self.fields.take(field_desc)
    }

    /// Returns `true` if the field with the given number is set.
    pub fn has_field_by_number(&self, number: u32) -> bool {
        self.desc
            .get_field(number)
            .is_some_and(|field_desc| self.has_field(&field_desc))
    }

    /// Gets the value of the field with the given number, or `None` if the
    /// message has no such field.
    pub fn get_field_by_number(&self, number: u32) -> Option<Cow<'_, Value>> {
        self.desc
            .get_field(number)
            .map(|field_desc| self.get_field(&field_desc))
    }

    /// Gets a mutable reference to the value of the field with the given
    /// number, or `None` if the message has no such field.
    pub fn get_field_by_number_mut(&mut self, number: u32) -> Option<&mut Value> {
        self.desc
            .get_field(number)
            .map(move |field_desc| self.get_field_mut(&field_desc))
    }

    /// Sets the value of the field with the given number, or does nothing if
    /// the message has no such field.
    pub fn set_field_by_number(&mut self, number: u32, value: Value) {
        if let Some(field_desc) = self.desc.get_field(number) {
            self.set_field(&field_desc, value)
        }
    }

    /// Sets the value of the field with the given number, returning an error
    /// if the field does not exist or the value has an invalid type.
    pub fn try_set_field_by_number(
        &mut self,
        number: u32,
        value: Value,
    ) -> Result<(), SetFieldError> {
        match self.desc.get_field(number) {
            Some(field_desc) => self.try_set_field(&field_desc, value),
            None => Err(SetFieldError::NotFound),
        }
    }

    /// Clears the field with the given number, or does nothing if the message
    /// has no such field.
    pub fn clear_field_by_number(&mut self, number: u32) {
        if let Some(field_desc) = self.desc.get_field(number) {
            self.clear_field(&field_desc);
        }
    }

    /// Returns `true` if the field with the given name is set.
    pub fn has_field_by_name(&self, name: &str) -> bool {
        self.desc
            .get_field_by_name(name)
            .is_some_and(|field_desc| self.has_field(&field_desc))
    }

    /// Gets the value of the field with the given name, or `None` if the
    /// message has no such field.
    pub fn get_field_by_name(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.desc
            .get_field_by_name(name)
            .map(|field_desc| self.get_field(&field_desc))
    }

    /// Gets a mutable reference to the value of the field with the given
    /// name, or `None` if the message has no such field.
    pub fn get_field_by_name_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.desc
            .get_field_by_name(name)
            .map(move |field_desc| self.get_field_mut(&field_desc))
    }

    /// Sets the value of the field with the given name, or does nothing if
    /// the message has no such field.
    pub fn set_field_by_name(&mut self, name: &str, value: Value) {
        if let Some(field_desc) = self.desc.get_field_by_name(name) {
            self.set_field(&field_desc, value)
        }
    }

    /// Sets the value of the field with the given name, returning an error if
    /// the field does not exist or the value has an invalid type.
    pub fn try_set_field_by_name(&mut self, name: &str, value: Value) -> Result<(), SetFieldError> {
        match self.desc.get_field_by_name(name) {
            Some(field_desc) => self.try_set_field(&field_desc, value),
            None => Err(SetFieldError::NotFound),
        }
    }

    /// Clears the field with the given name, or does nothing if the message
    /// has no such field.
    pub fn clear_field_by_name(&mut self, name: &str) {
        if let Some(field_desc) = self.desc.get_field_by_name(name) {
            self.clear_field(&field_desc);
        }
    }

    /// Gets the member of the given oneof that is currently set, or `None` if
    /// no member is set.
    pub fn oneof_field(&self, oneof_desc: &OneofDescriptor) -> Option<FieldDescriptor> {
        oneof_desc.fields().find(|field| self.has_field(field))
    }

    /// Returns `true` if this message has the given extension field set.
    pub fn has_extension(&self, extension_desc: &ExtensionDescriptor) -> bool {
        self.fields.has(extension_desc)
    }

    /// Gets the value of the given extension field, or its default value if unset.
    pub fn get_extension(&self, extension_desc: &ExtensionDescriptor) -> Cow<'_, Value> {
        self.fields.get(extension_desc)
    }

    /// Gets a mutable reference to the value of the given extension field,
    /// inserting its default value if unset.
    pub fn get_extension_mut(&mut self, extension_desc: &ExtensionDescriptor) -> &mut Value {
        self.fields.get_mut(extension_desc)
    }

    /// Sets the value of the given extension field.
    pub fn set_extension(&mut self, extension_desc: &ExtensionDescriptor, value: Value) {
        self.fields.set(extension_desc, value)
    }

    /// Clears the given extension field.
    pub fn clear_extension(&mut self, extension_desc: &ExtensionDescriptor) {
        self.fields.clear(extension_desc)
    }

    /// Clears the given extension field and returns its value, or `None` if
    /// [`has_extension`](Self::has_extension) was `false`.
    pub fn take_extension(&mut self, extension_desc: &ExtensionDescriptor) -> Option<Value> {
        self.fields.take(extension_desc)
    }

    /// Gets an iterator over the set fields of this message, in ascending
    /// number order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldDescriptor, &'_ Value)> {
        self.fields.iter_fields(&self.desc)
    }

    /// Gets an iterator over the set extension fields of this message, in
    /// ascending number order.
    pub fn extensions(&self) -> impl Iterator<Item = (ExtensionDescriptor, &'_ Value)> {
        self.fields.iter_extensions()
    }

    /// Gets an iterator over the unknown fields of this message, in ascending
    /// number order with records of equal number in their original order.
    pub fn unknown_fields(&self) -> impl Iterator<Item = &'_ UnknownField> {
        self.fields.iter_unknown()
    }

    /// Replaces the unknown fields of this message.
    pub fn set_unknown_fields(&mut self, unknown: impl IntoIterator<Item = UnknownField>) {
        self.fields.clear_unknown();
        for field in unknown {
            self.fields.add_unknown(field);
        }
    }

    /// Removes all unknown fields from this message.
    pub fn clear_unknown_fields(&mut self) {
        self.fields.clear_unknown();
    }

    /// Merges a strongly-typed message into this one, going through the
    /// binary wire format.
    ///
    /// The message should be compatible with the type specified by
    /// [`descriptor`][Self::descriptor], or the merge will likely fail with
    /// a [`DecodeError`].
    pub fn transcode_from<T>(&mut self, value: &T) -> Result<(), DecodeError>
    where
        T: Message,
    {
        let buf = value.encode_to_vec();
        Message::merge(self, buf.as_slice())
    }

    /// Converts this dynamic message into a strongly typed value, going
    /// through the binary wire format.
    pub fn transcode_to<T>(&self) -> Result<T, DecodeError>
    where
        T: Message + Default,
    {
        let buf = Message::encode_to_vec(self);
        T::decode(buf.as_slice())
    }
}

impl ReflectMessage for DynamicMessage {
    fn descriptor(&self) -> MessageDescriptor {
        self.desc.clone()
    }

    fn transcode_to_dynamic(&self) -> DynamicMessage
    where
        Self: Sized,
    {
        self.clone()
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn append_missing_in_value(
    path: &str,
    desc: &impl FieldDescriptorLike,
    value: &Value,
    paths: &mut Vec<String>,
) {
    match value {
        Value::Message(message) => message.append_missing_fields(path, paths),
        Value::List(values) => {
            if matches!(desc.kind(), Kind::Message(_)) {
                for (index, value) in values.iter().enumerate() {
                    if let Value::Message(message) = value {
                        message.append_missing_fields(&format!("{}[{}]", path, index), paths);
                    }
                }
            }
        }
        Value::Map(values) => {
            for (key, value) in values {
                if let Value::Message(message) = value {
                    message.append_missing_fields(&format!("{}[{}]", path, fmt_map_key(key)), paths);
                }
            }
        }
        _ => (),
    }
}

fn fmt_map_key(key: &MapKey) -> String {
    match key {
        MapKey::Bool(value) => value.to_string(),
        MapKey::I32(value) => value.to_string(),
        MapKey::I64(value) => value.to_string(),
        MapKey::U32(value) => value.to_string(),
        MapKey::U64(value) => value.to_string(),
        MapKey::String(value) => value.clone(),
    }
}

impl Value {
    /// Returns the default value for the given protobuf field.
    ///
    /// This is equivalent to [`default_value`][Value::default_value] except
    /// for the following cases:
    ///
    /// * If the field is a map, an empty map is returned.
    /// * If the field is `repeated`, an empty list is returned.
    /// * If the field has a custom default value specified, that is returned
    ///   (proto2 only).
    pub fn default_value_for_field(field_desc: &FieldDescriptor) -> Self {
        if field_desc.is_list() {
            Value::List(Vec::default())
        } else if field_desc.is_map() {
            Value::Map(HashMap::default())
        } else if let Some(default_value) = field_desc.default_value() {
            default_value.clone()
        } else {
            Self::default_value(&field_desc.kind())
        }
    }

    /// Returns the default value for the given protobuf extension field.
    ///
    /// See [`default_value_for_field`][Value::default_value_for_field] for
    /// more details.
    pub fn default_value_for_extension(extension_desc: &ExtensionDescriptor) -> Self {
        if extension_desc.is_list() {
            Value::List(Vec::default())
        } else if extension_desc.is_map() {
            Value::Map(HashMap::default())
        } else if let Some(default_value) = extension_desc.default_value() {
            default_value.clone()
        } else {
            Self::default_value(&extension_desc.kind())
        }
    }

    /// Returns the zero value for the given protobuf type `kind`.
    pub fn default_value(kind: &Kind) -> Self {
        match kind {
            Kind::Message(desc) => Value::Message(DynamicMessage::new(desc.clone())),
            Kind::Enum(enum_ty) => Value::EnumNumber(enum_ty.default_value().number()),
            Kind::Double => Value::F64(0.0),
            Kind::Float => Value::F32(0.0),
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Value::I32(0),
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Value::I64(0),
            Kind::Uint32 | Kind::Fixed32 => Value::U32(0),
            Kind::Uint64 | Kind::Fixed64 => Value::U64(0),
            Kind::Bool => Value::Bool(false),
            Kind::String => Value::String(String::default()),
            Kind::Bytes => Value::Bytes(Bytes::default()),
        }
    }

    /// Returns `true` if this is the default value for the given protobuf field.
    pub fn is_default_for_field(&self, field_desc: &FieldDescriptor) -> bool {
        *self == Value::default_value_for_field(field_desc)
    }

    /// Returns `true` if this is the default value for the given protobuf extension field.
    pub fn is_default_for_extension(&self, extension_desc: &ExtensionDescriptor) -> bool {
        *self == Value::default_value_for_extension(extension_desc)
    }

    /// Returns `true` if this is the default value for the given protobuf type `kind`.
    pub fn is_default(&self, kind: &Kind) -> bool {
        *self == Value::default_value(kind)
    }

    /// Returns `true` if this value can be set for a given field.
    ///
    /// This only checks that the value can be encoded; it does not, for
    /// example, check that enum values are in the defined range.
    pub fn is_valid_for_field(&self, field_desc: &FieldDescriptor) -> bool {
        match (self, field_desc.kind()) {
            (Value::List(list), kind) if field_desc.is_list() => {
                list.iter().all(|value| value.is_valid(&kind))
            }
            (Value::Map(map), Kind::Message(message_desc)) if field_desc.is_map() => {
                let key_desc = message_desc.map_entry_key_field().kind();
                let value_desc = message_desc.map_entry_value_field();
                map.iter().all(|(key, value)| {
                    key.is_valid(&key_desc) && value.is_valid_for_field(&value_desc)
                })
            }
            (value, kind) => value.is_valid(&kind),
        }
    }

    /// Returns `true` if this value can be set for a given extension field.
    ///
    /// See [`is_valid_for_field`][Value::is_valid_for_field] for more details.
    pub fn is_valid_for_extension(&self, extension_desc: &ExtensionDescriptor) -> bool {
        match (self, extension_desc.kind()) {
            (Value::List(list), kind) if extension_desc.is_list() => {
                list.iter().all(|value| value.is_valid(&kind))
            }
            (Value::Map(map), Kind::Message(message_desc)) if extension_desc.is_map() => {
                let key_desc = message_desc.map_entry_key_field().kind();
                let value_desc = message_desc.map_entry_value_field();
                map.iter().all(|(key, value)| {
                    key.is_valid(&key_desc) && value.is_valid_for_field(&value_desc)
                })
            }
            (value, kind) => value.is_valid(&kind),
        }
    }

    /// Returns `true` if this value can be encoded as the given [`Kind`].
    ///
    /// Unlike [`is_valid_for_field`](Value::is_valid_for_field), this method
    /// does not look at field cardinality, so it never returns `true` for
    /// lists or maps.
    pub fn is_valid(&self, kind: &Kind) -> bool {
        matches!(
            (self, kind),
            (Value::Bool(_), Kind::Bool)
                | (Value::I32(_), Kind::Int32 | Kind::Sint32 | Kind::Sfixed32)
                | (Value::I64(_), Kind::Int64 | Kind::Sint64 | Kind::Sfixed64)
                | (Value::U32(_), Kind::Uint32 | Kind::Fixed32)
                | (Value::U64(_), Kind::Uint64 | Kind::Fixed64)
                | (Value::F32(_), Kind::Float)
                | (Value::F64(_), Kind::Double)
                | (Value::String(_), Kind::String)
                | (Value::Bytes(_), Kind::Bytes)
                | (Value::EnumNumber(_), Kind::Enum(_))
                | (Value::Message(_), Kind::Message(_))
        )
    }

    /// Returns the value if it is a `Value::Bool`, or `None` otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::I32`, or `None` otherwise.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::I32(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::I64`, or `None` otherwise.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I64(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::U32`, or `None` otherwise.
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Value::U32(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::U64`, or `None` otherwise.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U64(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::F32`, or `None` otherwise.
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::F32(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::F64`, or `None` otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F64(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::EnumNumber`, or `None` otherwise.
    pub fn as_enum_number(&self) -> Option<i32> {
        match *self {
            Value::EnumNumber(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::String`, or `None` otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value if it is a `Value::String`,
    /// or `None` otherwise.
    pub fn as_string_mut(&mut self) -> Option<&mut String> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::Bytes`, or `None` otherwise.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a reference to the value if it is a `Value::Message`, or `None` otherwise.
    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value if it is a `Value::Message`,
    /// or `None` otherwise.
    pub fn as_message_mut(&mut self) -> Option<&mut DynamicMessage> {
        match self {
            Value::Message(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a reference to the value if it is a `Value::List`, or `None` otherwise.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value if it is a `Value::List`, or
    /// `None` otherwise.
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a reference to the value if it is a `Value::Map`, or `None` otherwise.
    pub fn as_map(&self) -> Option<&HashMap<MapKey, Value>> {
        match self {
            Value::Map(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value if it is a `Value::Map`, or
    /// `None` otherwise.
    pub fn as_map_mut(&mut self) -> Option<&mut HashMap<MapKey, Value>> {
        match self {
            Value::Map(value) => Some(value),
            _ => None,
        }
    }

    /// Converts this value into a [`MapKey`], or `None` if it is not a valid
    /// map key type.
    pub fn into_map_key(self) -> Option<MapKey> {
        match self {
            Value::Bool(value) => Some(MapKey::Bool(value)),
            Value::I32(value) => Some(MapKey::I32(value)),
            Value::I64(value) => Some(MapKey::I64(value)),
            Value::U32(value) => Some(MapKey::U32(value)),
            Value::U64(value) => Some(MapKey::U64(value)),
            Value::String(value) => Some(MapKey::String(value)),
            _ => None,
        }
    }
}

impl MapKey {
    /// Returns the zero value for the given protobuf type `kind`.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not a valid map key type.
    pub fn default_value(kind: &Kind) -> Self {
        match *kind {
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => MapKey::I32(0),
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => MapKey::I64(0),
            Kind::Uint32 | Kind::Fixed32 => MapKey::U32(0),
            Kind::Uint64 | Kind::Fixed64 => MapKey::U64(0),
            Kind::Bool => MapKey::Bool(false),
            Kind::String => MapKey::String(String::default()),
            _ => panic!("invalid type for map key"),
        }
    }

    /// Returns `true` if this is the default value for the given protobuf type `kind`.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not a valid map key type.
    pub fn is_default(&self, kind: &Kind) -> bool {
        *self == MapKey::default_value(kind)
    }

    /// Returns `true` if this map key can be encoded as the given [`Kind`].
    pub fn is_valid(&self, kind: &Kind) -> bool {
        matches!(
            (self, kind),
            (MapKey::Bool(_), Kind::Bool)
                | (MapKey::I32(_), Kind::Int32 | Kind::Sint32 | Kind::Sfixed32)
                | (MapKey::I64(_), Kind::Int64 | Kind::Sint64 | Kind::Sfixed64)
                | (MapKey::U32(_), Kind::Uint32 | Kind::Fixed32)
                | (MapKey::U64(_), Kind::Uint64 | Kind::Fixed64)
                | (MapKey::String(_), Kind::String)
        )
    }
}

impl From<MapKey> for Value {
    fn from(value: MapKey) -> Self {
        match value {
            MapKey::Bool(value) => Value::Bool(value),
            MapKey::I32(value) => Value::I32(value),
            MapKey::I64(value) => Value::I64(value),
            MapKey::U32(value) => Value::U32(value),
            MapKey::U64(value) => Value::U64(value),
            MapKey::String(value) => Value::String(value),
        }
    }
}

impl fmt::Display for SetFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetFieldError::NotFound => write!(f, "field not found"),
            SetFieldError::InvalidType { field, value } => {
                write!(f, "expected a value of type '")?;
                if field.is_map() {
                    let entry = field.kind();
                    let entry = entry.as_message().unwrap();
                    write!(
                        f,
                        "map<{:?}, {:?}>",
                        entry.map_entry_key_field().kind(),
                        entry.map_entry_value_field().kind()
                    )?;
                } else if field.is_list() {
                    write!(f, "repeated {:?}", field.kind())?;
                } else {
                    write!(f, "{:?}", field.kind())?;
                }
                write!(f, "', but found '{}'", value)
            }
        }
    }
}

impl Error for SetFieldError {}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::MissingRequiredFields { paths } => {
                write!(f, "missing required fields: {}", paths.join(", "))
            }
            EncodeError::InsufficientCapacity {
                required,
                remaining,
            } => write!(
                f,
                "the buffer has insufficient capacity (required: {}, remaining: {})",
                required, remaining
            ),
        }
    }
}

impl Error for EncodeError {}

/// Writes `bytes` as a quoted string with C-style escapes, the way the text
/// format and `Debug` output quote strings and bytes.
pub(crate) fn fmt_string(f: &mut impl fmt::Write, bytes: &[u8]) -> fmt::Result {
    f.write_char('"')?;
    for &ch in bytes {
        match ch {
            b'\t' => f.write_str("\\t")?,
            b'\r' => f.write_str("\\r")?,
            b'\n' => f.write_str("\\n")?,
            b'\\' => f.write_str("\\\\")?,
            b'\'' => f.write_str("\\'")?,
            b'"' => f.write_str("\\\"")?,
            b'\x20'..=b'\x7e' => f.write_char(ch as char)?,
            _ => {
                write!(f, "\\{:03o}", ch)?;
            }
        }
    }
    f.write_char('"')
}

/// Extracts the fully qualified message name from a type URL: everything
/// after the last `/`.
pub(crate) fn get_type_url_message_name(type_url: &str) -> Option<&str> {
    match type_url.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => Some(name),
        _ => None,
    }
}
