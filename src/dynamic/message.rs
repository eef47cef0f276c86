use prost::{
    bytes::{Buf, BufMut},
    encoding::{self, DecodeContext, WireType},
    DecodeError, Message,
};

use crate::{
    descriptor::{Kind, MAP_ENTRY_KEY_NUMBER, MAP_ENTRY_VALUE_NUMBER},
    DecodeOptions, DynamicMessage, EncodeOptions, FieldDescriptor, MapKey, Value,
};

use super::{
    fields::{FieldDescriptorLike, ValueAndDescriptor},
    unknown::UnknownField,
};

/// Wraps a message reference so nested encoding performed through prost's
/// helpers keeps carrying the encode options.
struct EncodeWithOptions<'a> {
    message: &'a DynamicMessage,
    options: &'a EncodeOptions,
}

/// Counterpart of [`EncodeWithOptions`] for decoding.
struct MergeWithOptions<'a> {
    message: &'a mut DynamicMessage,
    options: &'a DecodeOptions,
}

impl std::fmt::Debug for EncodeWithOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.message, f)
    }
}

impl std::fmt::Debug for MergeWithOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.message, f)
    }
}

impl Message for EncodeWithOptions<'_> {
    fn encode_raw(&self, buf: &mut impl BufMut)
    where
        Self: Sized,
    {
        self.message.encode_raw_with_options(buf, self.options)
    }

    fn encoded_len(&self) -> usize {
        Message::encoded_len(self.message)
    }

    fn merge_field(
        &mut self,
        _: u32,
        _: WireType,
        _: &mut impl Buf,
        _: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        unreachable!("EncodeWithOptions is never decoded")
    }

    fn clear(&mut self) {
        unreachable!("EncodeWithOptions is never decoded")
    }
}

impl Message for MergeWithOptions<'_> {
    fn encode_raw(&self, _: &mut impl BufMut)
    where
        Self: Sized,
    {
        unreachable!("MergeWithOptions is never encoded")
    }

    fn encoded_len(&self) -> usize {
        0
    }

    fn merge_field(
        &mut self,
        number: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        self.message
            .merge_field_with_options(number, wire_type, buf, ctx, self.options)
    }

    fn clear(&mut self) {
        Message::clear(self.message)
    }
}

impl DynamicMessage {
    /// Writes every populated field: known fields in ascending number order,
    /// then extensions in ascending number order, then unknown records in
    /// their stored order.
    pub(crate) fn encode_raw_with_options(&self, buf: &mut impl BufMut, options: &EncodeOptions) {
        for field in self.fields.iter(&self.desc) {
            match field {
                ValueAndDescriptor::Field(value, field_desc) => {
                    value.encode_field(&field_desc, buf, options)
                }
                ValueAndDescriptor::Extension(value, extension_desc) => {
                    value.encode_field(&extension_desc, buf, options)
                }
                ValueAndDescriptor::Unknown(unknowns) => {
                    for unknown in unknowns.iter() {
                        unknown.encode(buf);
                    }
                }
            }
        }
    }

    pub(crate) fn merge_field_with_options(
        &mut self,
        number: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
        options: &DecodeOptions,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        if let Some(field_desc) = self.desc.get_field(number) {
            self.fields
                .get_mut(&field_desc)
                .merge_field(&field_desc, wire_type, buf, ctx, options)
        } else if let Some(extension_desc) = options.find_extension(&self.desc, number) {
            self.fields
                .get_mut(&extension_desc)
                .merge_field(&extension_desc, wire_type, buf, ctx, options)
        } else if options.is_discard_unknown() {
            encoding::skip_field(wire_type, number, buf, ctx)
        } else {
            let field = UnknownField::decode_value(number, wire_type, buf, ctx)?;
            self.fields.add_unknown(field);
            Ok(())
        }
    }
}

impl Message for DynamicMessage {
    fn encode_raw(&self, buf: &mut impl BufMut)
    where
        Self: Sized,
    {
        self.encode_raw_with_options(buf, &EncodeOptions::new())
    }

    fn merge_field(
        &mut self,
        number: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        self.merge_field_with_options(number, wire_type, buf, ctx, &DecodeOptions::new())
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        for field in self.fields.iter(&self.desc) {
            match field {
                ValueAndDescriptor::Field(value, field_desc) => {
                    len += value.encoded_len(&field_desc);
                }
                ValueAndDescriptor::Extension(value, extension_desc) => {
                    len += value.encoded_len(&extension_desc);
                }
                ValueAndDescriptor::Unknown(unknowns) => {
                    len += unknowns.iter().map(UnknownField::encoded_len).sum::<usize>();
                }
            }
        }
        len
    }

    fn clear(&mut self) {
        self.fields.clear_all();
    }
}

impl Value {
    pub(super) fn encode_field<B>(
        &self,
        field_desc: &impl FieldDescriptorLike,
        buf: &mut B,
        options: &EncodeOptions,
    ) where
        B: BufMut,
    {
        if !field_desc.supports_presence() && field_desc.is_default_value(self) {
            return;
        }

        let number = field_desc.number();
        match (self, field_desc.kind()) {
            (Value::Bool(value), Kind::Bool) => encoding::bool::encode(number, value, buf),
            (Value::I32(value), Kind::Int32) => encoding::int32::encode(number, value, buf),
            (Value::I32(value), Kind::Sint32) => encoding::sint32::encode(number, value, buf),
            (Value::I32(value), Kind::Sfixed32) => encoding::sfixed32::encode(number, value, buf),
            (Value::I64(value), Kind::Int64) => encoding::int64::encode(number, value, buf),
            (Value::I64(value), Kind::Sint64) => encoding::sint64::encode(number, value, buf),
            (Value::I64(value), Kind::Sfixed64) => encoding::sfixed64::encode(number, value, buf),
            (Value::U32(value), Kind::Uint32) => encoding::uint32::encode(number, value, buf),
            (Value::U32(value), Kind::Fixed32) => encoding::fixed32::encode(number, value, buf),
            (Value::U64(value), Kind::Uint64) => encoding::uint64::encode(number, value, buf),
            (Value::U64(value), Kind::Fixed64) => encoding::fixed64::encode(number, value, buf),
            (Value::F32(value), Kind::Float) => encoding::float::encode(number, value, buf),
            (Value::F64(value), Kind::Double) => encoding::double::encode(number, value, buf),
            (Value::String(value), Kind::String) => encoding::string::encode(number, value, buf),
            (Value::Bytes(value), Kind::Bytes) => encoding::bytes::encode(number, value, buf),
            (Value::EnumNumber(value), Kind::Enum(_)) => {
                encoding::int32::encode(number, value, buf)
            }
            (Value::Message(message), Kind::Message(_)) => {
                let message = EncodeWithOptions { message, options };
                if field_desc.is_group() {
                    encoding::group::encode(number, &message, buf)
                } else {
                    encoding::message::encode(number, &message, buf)
                }
            }
            (Value::List(values), _) if field_desc.is_list() => {
                if field_desc.is_packed() {
                    encode_packed_list(number, values, &field_desc.kind(), buf);
                } else {
                    for value in values {
                        value.encode_field(field_desc, buf, options);
                    }
                }
            }
            (Value::Map(values), Kind::Message(map_entry)) if field_desc.is_map() => {
                let key_desc = map_entry.map_entry_key_field();
                let value_desc = map_entry.map_entry_value_field();

                let encode_entry = |key: &MapKey, value: &Value, buf: &mut B| {
                    let len = key.encoded_len(&key_desc) + value.encoded_len(&value_desc);

                    encoding::encode_key(number, WireType::LengthDelimited, buf);
                    encoding::encode_varint(len as u64, buf);

                    key.encode_field(&key_desc, buf);
                    value.encode_field(&value_desc, buf, options);
                };

                if options.deterministic {
                    let mut entries: Vec<_> = values.iter().collect();
                    entries.sort_by(|(left, _), (right, _)| left.cmp(right));
                    for (key, value) in entries {
                        encode_entry(key, value, buf);
                    }
                } else {
                    for (key, value) in values {
                        encode_entry(key, value, buf);
                    }
                }
            }
            (value, kind) => panic!(
                "mismatch between dynamic value {:?} and field type {:?}",
                value, kind
            ),
        }
    }

    pub(super) fn merge_field<B>(
        &mut self,
        field_desc: &impl FieldDescriptorLike,
        wire_type: WireType,
        buf: &mut B,
        ctx: DecodeContext,
        options: &DecodeOptions,
    ) -> Result<(), DecodeError>
    where
        B: Buf,
    {
        match (self, field_desc.kind()) {
            (Value::Bool(value), Kind::Bool) => encoding::bool::merge(wire_type, value, buf, ctx),
            (Value::I32(value), Kind::Int32) => encoding::int32::merge(wire_type, value, buf, ctx),
            (Value::I32(value), Kind::Sint32) => {
                encoding::sint32::merge(wire_type, value, buf, ctx)
            }
            (Value::I32(value), Kind::Sfixed32) => {
                encoding::sfixed32::merge(wire_type, value, buf, ctx)
            }
            (Value::I64(value), Kind::Int64) => encoding::int64::merge(wire_type, value, buf, ctx),
            (Value::I64(value), Kind::Sint64) => {
                encoding::sint64::merge(wire_type, value, buf, ctx)
            }
            (Value::I64(value), Kind::Sfixed64) => {
                encoding::sfixed64::merge(wire_type, value, buf, ctx)
            }
            (Value::U32(value), Kind::Uint32) => {
                encoding::uint32::merge(wire_type, value, buf, ctx)
            }
            (Value::U32(value), Kind::Fixed32) => {
                encoding::fixed32::merge(wire_type, value, buf, ctx)
            }
            (Value::U64(value), Kind::Uint64) => {
                encoding::uint64::merge(wire_type, value, buf, ctx)
            }
            (Value::U64(value), Kind::Fixed64) => {
                encoding::fixed64::merge(wire_type, value, buf, ctx)
            }
            (Value::F32(value), Kind::Float) => encoding::float::merge(wire_type, value, buf, ctx),
            (Value::F64(value), Kind::Double) => {
                encoding::double::merge(wire_type, value, buf, ctx)
            }
            (Value::String(value), Kind::String) => {
                encoding::string::merge(wire_type, value, buf, ctx)
            }
            (Value::Bytes(value), Kind::Bytes) => {
                encoding::bytes::merge(wire_type, value, buf, ctx)
            }
            (Value::EnumNumber(value), Kind::Enum(_)) => {
                encoding::int32::merge(wire_type, value, buf, ctx)
            }
            (Value::Message(message), Kind::Message(_)) => {
                let mut message = MergeWithOptions { message, options };
                if field_desc.is_group() {
                    encoding::group::merge(field_desc.number(), wire_type, &mut message, buf, ctx)
                } else {
                    encoding::message::merge(wire_type, &mut message, buf, ctx)
                }
            }
            (Value::List(values), field_kind) if field_desc.is_list() => {
                // Both packed and unpacked representations are accepted for
                // packable fields, whichever way the field is declared.
                if wire_type == WireType::LengthDelimited && field_desc.is_packable() {
                    encoding::merge_loop(values, buf, ctx, |values, buf, ctx| {
                        let mut value = Value::default_value(&field_kind);
                        value.merge_field(field_desc, field_kind.wire_type(), buf, ctx, options)?;
                        values.push(value);
                        Ok(())
                    })
                } else {
                    let mut value = Value::default_value(&field_kind);
                    value.merge_field(field_desc, wire_type, buf, ctx, options)?;
                    values.push(value);
                    Ok(())
                }
            }
            (Value::Map(values), Kind::Message(map_entry)) if field_desc.is_map() => {
                let key_desc = map_entry.map_entry_key_field();
                let value_desc = map_entry.map_entry_value_field();

                let mut key = MapKey::default_value(&key_desc.kind());
                let mut value = Value::default_value_for_field(&value_desc);
                encoding::merge_loop(
                    &mut (&mut key, &mut value),
                    buf,
                    ctx,
                    |(key, value), buf, ctx| {
                        let (number, wire_type) = encoding::decode_key(buf)?;
                        match number {
                            MAP_ENTRY_KEY_NUMBER => key.merge_field(&key_desc, wire_type, buf, ctx),
                            MAP_ENTRY_VALUE_NUMBER => {
                                value.merge_field(&value_desc, wire_type, buf, ctx, options)
                            }
                            _ => encoding::skip_field(wire_type, number, buf, ctx),
                        }
                    },
                )?;
                // A duplicate key overwrites the earlier entry.
                values.insert(key, value);

                Ok(())
            }
            (value, kind) => panic!(
                "mismatch between dynamic value {:?} and field type {:?}",
                value, kind
            ),
        }
    }

    pub(super) fn encoded_len(&self, field_desc: &impl FieldDescriptorLike) -> usize {
        if !field_desc.supports_presence() && field_desc.is_default_value(self) {
            return 0;
        }

        let number = field_desc.number();
        match (self, field_desc.kind()) {
            (Value::Bool(value), Kind::Bool) => encoding::bool::encoded_len(number, value),
            (Value::I32(value), Kind::Int32) => encoding::int32::encoded_len(number, value),
            (Value::I32(value), Kind::Sint32) => encoding::sint32::encoded_len(number, value),
            (Value::I32(value), Kind::Sfixed32) => encoding::sfixed32::encoded_len(number, value),
            (Value::I64(value), Kind::Int64) => encoding::int64::encoded_len(number, value),
            (Value::I64(value), Kind::Sint64) => encoding::sint64::encoded_len(number, value),
            (Value::I64(value), Kind::Sfixed64) => encoding::sfixed64::encoded_len(number, value),
            (Value::U32(value), Kind::Uint32) => encoding::uint32::encoded_len(number, value),
            (Value::U32(value), Kind::Fixed32) => encoding::fixed32::encoded_len(number, value),
            (Value::U64(value), Kind::Uint64) => encoding::uint64::encoded_len(number, value),
            (Value::U64(value), Kind::Fixed64) => encoding::fixed64::encoded_len(number, value),
            (Value::F32(value), Kind::Float) => encoding::float::encoded_len(number, value),
            (Value::F64(value), Kind::Double) => encoding::double::encoded_len(number, value),
            (Value::String(value), Kind::String) => encoding::string::encoded_len(number, value),
            (Value::Bytes(value), Kind::Bytes) => encoding::bytes::encoded_len(number, value),
            (Value::EnumNumber(value), Kind::Enum(_)) => {
                encoding::int32::encoded_len(number, value)
            }
            (Value::Message(message), Kind::Message(_)) => {
                if field_desc.is_group() {
                    encoding::group::encoded_len(number, message)
                } else {
                    encoding::message::encoded_len(number, message)
                }
            }
            (Value::List(values), _) if field_desc.is_list() => {
                if field_desc.is_packed() {
                    packed_list_encoded_len(number, values, &field_desc.kind())
                } else {
                    values
                        .iter()
                        .map(|value| value.encoded_len(field_desc))
                        .sum()
                }
            }
            (Value::Map(values), Kind::Message(map_entry)) if field_desc.is_map() => {
                let key_desc = map_entry.map_entry_key_field();
                let value_desc = map_entry.map_entry_value_field();

                let key_len = encoding::key_len(number);
                values
                    .iter()
                    .map(|(key, value)| {
                        let len = key.encoded_len(&key_desc) + value.encoded_len(&value_desc);

                        key_len + encoding::encoded_len_varint(len as u64) + len
                    })
                    .sum::<usize>()
            }
            (value, kind) => panic!(
                "mismatch between dynamic value {:?} and field type {:?}",
                value, kind
            ),
        }
    }
}

impl MapKey {
    fn encode_field<B>(&self, field_desc: &FieldDescriptor, buf: &mut B)
    where
        B: BufMut,
    {
        if !field_desc.supports_presence() && self.is_default(&field_desc.kind()) {
            return;
        }

        let number = field_desc.number();
        match (self, field_desc.kind()) {
            (MapKey::Bool(value), Kind::Bool) => encoding::bool::encode(number, value, buf),
            (MapKey::I32(value), Kind::Int32) => encoding::int32::encode(number, value, buf),
            (MapKey::I32(value), Kind::Sint32) => encoding::sint32::encode(number, value, buf),
            (MapKey::I32(value), Kind::Sfixed32) => encoding::sfixed32::encode(number, value, buf),
            (MapKey::I64(value), Kind::Int64) => encoding::int64::encode(number, value, buf),
            (MapKey::I64(value), Kind::Sint64) => encoding::sint64::encode(number, value, buf),
            (MapKey::I64(value), Kind::Sfixed64) => encoding::sfixed64::encode(number, value, buf),
            (MapKey::U32(value), Kind::Uint32) => encoding::uint32::encode(number, value, buf),
            (MapKey::U32(value), Kind::Fixed32) => encoding::fixed32::encode(number, value, buf),
            (MapKey::U64(value), Kind::Uint64) => encoding::uint64::encode(number, value, buf),
            (MapKey::U64(value), Kind::Fixed64) => encoding::fixed64::encode(number, value, buf),
            (MapKey::String(value), Kind::String) => encoding::string::encode(number, value, buf),
            (value, kind) => panic!(
                "mismatch between dynamic map key {:?} and field type {:?}",
                value, kind
            ),
        }
    }

    fn merge_field<B>(
        &mut self,
        field_desc: &FieldDescriptor,
        wire_type: WireType,
        buf: &mut B,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        B: Buf,
    {
        match (self, field_desc.kind()) {
            (MapKey::Bool(value), Kind::Bool) => encoding::bool::merge(wire_type, value, buf, ctx),
            (MapKey::I32(value), Kind::Int32) => {
                encoding::int32::merge(wire_type, value, buf, ctx)
            }
            (MapKey::I32(value), Kind::Sint32) => {
                encoding::sint32::merge(wire_type, value, buf, ctx)
            }
            (MapKey::I32(value), Kind::Sfixed32) => {
                encoding::sfixed32::merge(wire_type, value, buf, ctx)
            }
            (MapKey::I64(value), Kind::Int64) => {
                encoding::int64::merge(wire_type, value, buf, ctx)
            }
            (MapKey::I64(value), Kind::Sint64) => {
                encoding::sint64::merge(wire_type, value, buf, ctx)
            }
            (MapKey::I64(value), Kind::Sfixed64) => {
                encoding::sfixed64::merge(wire_type, value, buf, ctx)
            }
            (MapKey::U32(value), Kind::Uint32) => {
                encoding::uint32::merge(wire_type, value, buf, ctx)
            }
            (MapKey::U32(value), Kind::Fixed32) => {
                encoding::fixed32::merge(wire_type, value, buf, ctx)
            }
            (MapKey::U64(value), Kind::Uint64) => {
                encoding::uint64::merge(wire_type, value, buf, ctx)
            }
            (MapKey::U64(value), Kind::Fixed64) => {
                encoding::fixed64::merge(wire_type, value, buf, ctx)
            }
            (MapKey::String(value), Kind::String) => {
                encoding::string::merge(wire_type, value, buf, ctx)
            }
            (value, kind) => panic!(
                "mismatch between dynamic map key {:?} and field type {:?}",
                value, kind
            ),
        }
    }

    fn encoded_len(&self, field_desc: &FieldDescriptor) -> usize {
        if !field_desc.supports_presence() && self.is_default(&field_desc.kind()) {
            return 0;
        }

        let number = field_desc.number();
        match (self, field_desc.kind()) {
            (MapKey::Bool(value), Kind::Bool) => encoding::bool::encoded_len(number, value),
            (MapKey::I32(value), Kind::Int32) => encoding::int32::encoded_len(number, value),
            (MapKey::I32(value), Kind::Sint32) => encoding::sint32::encoded_len(number, value),
            (MapKey::I32(value), Kind::Sfixed32) => encoding::sfixed32::encoded_len(number, value),
            (MapKey::I64(value), Kind::Int64) => encoding::int64::encoded_len(number, value),
            (MapKey::I64(value), Kind::Sint64) => encoding::sint64::encoded_len(number, value),
            (MapKey::I64(value), Kind::Sfixed64) => encoding::sfixed64::encoded_len(number, value),
            (MapKey::U32(value), Kind::Uint32) => encoding::uint32::encoded_len(number, value),
            (MapKey::U32(value), Kind::Fixed32) => encoding::fixed32::encoded_len(number, value),
            (MapKey::U64(value), Kind::Uint64) => encoding::uint64::encoded_len(number, value),
            (MapKey::U64(value), Kind::Fixed64) => encoding::fixed64::encoded_len(number, value),
            (MapKey::String(value), Kind::String) => encoding::string::encoded_len(number, value),
            (value, kind) => panic!(
                "mismatch between dynamic map key {:?} and field type {:?}",
                value, kind
            ),
        }
    }
}

/// Encodes a packed repeated field: a single key with the concatenated
/// values in one length-delimited payload.
fn encode_packed_list(number: u32, values: &[Value], kind: &Kind, buf: &mut impl BufMut) {
    encoding::encode_key(number, WireType::LengthDelimited, buf);
    let len = packed_list_body_len(values, kind);
    encoding::encode_varint(len as u64, buf);

    for value in values {
        match (value, kind) {
            (Value::Bool(value), Kind::Bool) => {
                encoding::encode_varint(*value as u64, buf);
            }
            (Value::I32(value), Kind::Int32) | (Value::EnumNumber(value), Kind::Enum(_)) => {
                encoding::encode_varint(*value as u64, buf);
            }
            (Value::I64(value), Kind::Int64) => encoding::encode_varint(*value as u64, buf),
            (Value::U32(value), Kind::Uint32) => encoding::encode_varint(*value as u64, buf),
            (Value::U64(value), Kind::Uint64) => encoding::encode_varint(*value, buf),
            (Value::I32(value), Kind::Sint32) => {
                encoding::encode_varint(from_sint32(*value) as u64, buf)
            }
            (Value::I64(value), Kind::Sint64) => encoding::encode_varint(from_sint64(*value), buf),
            (Value::U32(value), Kind::Fixed32) => buf.put_u32_le(*value),
            (Value::U64(value), Kind::Fixed64) => buf.put_u64_le(*value),
            (Value::I32(value), Kind::Sfixed32) => buf.put_i32_le(*value),
            (Value::I64(value), Kind::Sfixed64) => buf.put_i64_le(*value),
            (Value::F32(value), Kind::Float) => buf.put_f32_le(*value),
            (Value::F64(value), Kind::Double) => buf.put_f64_le(*value),
            (value, kind) => panic!(
                "mismatch between dynamic value {:?} and packed field type {:?}",
                value, kind
            ),
        }
    }
}

fn packed_list_encoded_len(number: u32, values: &[Value], kind: &Kind) -> usize {
    let len = packed_list_body_len(values, kind);
    encoding::key_len(number) + encoding::encoded_len_varint(len as u64) + len
}

fn packed_list_body_len(values: &[Value], kind: &Kind) -> usize {
    match kind {
        Kind::Float | Kind::Fixed32 | Kind::Sfixed32 => values.len() * 4,
        Kind::Double | Kind::Fixed64 | Kind::Sfixed64 => values.len() * 8,
        _ => values
            .iter()
            .map(|value| match (value, kind) {
                (Value::Bool(value), Kind::Bool) => {
                    encoding::encoded_len_varint(*value as u64)
                }
                (Value::I32(value), Kind::Int32)
                | (Value::EnumNumber(value), Kind::Enum(_)) => {
                    encoding::encoded_len_varint(*value as u64)
                }
                (Value::I64(value), Kind::Int64) => encoding::encoded_len_varint(*value as u64),
                (Value::U32(value), Kind::Uint32) => encoding::encoded_len_varint(*value as u64),
                (Value::U64(value), Kind::Uint64) => encoding::encoded_len_varint(*value),
                (Value::I32(value), Kind::Sint32) => {
                    encoding::encoded_len_varint(from_sint32(*value) as u64)
                }
                (Value::I64(value), Kind::Sint64) => {
                    encoding::encoded_len_varint(from_sint64(*value))
                }
                (value, kind) => panic!(
                    "mismatch between dynamic value {:?} and packed field type {:?}",
                    value, kind
                ),
            })
            .sum(),
    }
}

fn from_sint32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

fn from_sint64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}
