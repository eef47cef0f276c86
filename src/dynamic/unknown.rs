use std::slice;

use prost::{
    bytes::{Buf, BufMut, Bytes},
    encoding::{self, DecodeContext, WireType},
    DecodeError, Message,
};

/// A field of a protobuf message that was not recognized by the decoding
/// message's descriptor.
///
/// Unknown fields typically appear when decoding data written with a newer
/// version of the schema. They are preserved so that re-encoding the message
/// reproduces them byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownField {
    number: u32,
    value: UnknownFieldValue,
}

/// The value of an [`UnknownField`], classified by wire type.
#[derive(Debug, Clone, PartialEq)]
pub enum UnknownFieldValue {
    /// A value with the `Varint` wire type.
    Varint(u64),
    /// A value with the `ThirtyTwoBit` wire type, as little-endian bytes.
    ThirtyTwoBit([u8; 4]),
    /// A value with the `SixtyFourBit` wire type, as little-endian bytes.
    SixtyFourBit([u8; 8]),
    /// A value with the `LengthDelimited` wire type.
    LengthDelimited(Bytes),
    /// A group of values bracketed by start-group and end-group records.
    Group(UnknownFieldSet),
}

/// An ordered collection of unknown fields.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UnknownFieldSet {
    fields: Vec<UnknownField>,
}

impl UnknownField {
    /// Creates an unknown field record with the given number and value.
    pub fn new(number: u32, value: UnknownFieldValue) -> Self {
        UnknownField { number, value }
    }

    /// Gets the field number of this record.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Gets the value of this record.
    pub fn value(&self) -> &UnknownFieldValue {
        &self.value
    }

    /// Consumes a single value of the given wire type from `buf`.
    pub(crate) fn decode_value(
        number: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<Self, DecodeError> {
        let value = match wire_type {
            WireType::Varint => UnknownFieldValue::Varint(encoding::decode_varint(buf)?),
            WireType::ThirtyTwoBit => {
                let mut value = [0; 4];
                if buf.remaining() < value.len() {
                    return Err(DecodeError::new("buffer underflow"));
                }
                buf.copy_to_slice(&mut value);
                UnknownFieldValue::ThirtyTwoBit(value)
            }
            WireType::SixtyFourBit => {
                let mut value = [0; 8];
                if buf.remaining() < value.len() {
                    return Err(DecodeError::new("buffer underflow"));
                }
                buf.copy_to_slice(&mut value);
                UnknownFieldValue::SixtyFourBit(value)
            }
            WireType::LengthDelimited => {
                let mut value = Bytes::default();
                encoding::bytes::merge(wire_type, &mut value, buf, ctx)?;
                UnknownFieldValue::LengthDelimited(value)
            }
            WireType::StartGroup => {
                let mut value = UnknownFieldSet::default();
                encoding::group::merge(number, wire_type, &mut value, buf, ctx)?;
                UnknownFieldValue::Group(value)
            }
            WireType::EndGroup => {
                return Err(DecodeError::new("unexpected end group tag"));
            }
        };

        Ok(UnknownField { number, value })
    }

    pub(crate) fn encode(&self, buf: &mut impl BufMut) {
        match &self.value {
            UnknownFieldValue::Varint(value) => {
                encoding::encode_key(self.number, WireType::Varint, buf);
                encoding::encode_varint(*value, buf);
            }
            UnknownFieldValue::ThirtyTwoBit(value) => {
                encoding::encode_key(self.number, WireType::ThirtyTwoBit, buf);
                buf.put_slice(value);
            }
            UnknownFieldValue::SixtyFourBit(value) => {
                encoding::encode_key(self.number, WireType::SixtyFourBit, buf);
                buf.put_slice(value);
            }
            UnknownFieldValue::LengthDelimited(value) => {
                encoding::bytes::encode(self.number, value, buf);
            }
            UnknownFieldValue::Group(value) => {
                encoding::group::encode(self.number, value, buf);
            }
        }
    }

    pub(crate) fn encoded_len(&self) -> usize {
        match &self.value {
            UnknownFieldValue::Varint(value) => {
                encoding::key_len(self.number) + encoding::encoded_len_varint(*value)
            }
            UnknownFieldValue::ThirtyTwoBit(value) => encoding::key_len(self.number) + value.len(),
            UnknownFieldValue::SixtyFourBit(value) => encoding::key_len(self.number) + value.len(),
            UnknownFieldValue::LengthDelimited(value) => {
                encoding::bytes::encoded_len(self.number, value)
            }
            UnknownFieldValue::Group(value) => encoding::group::encoded_len(self.number, value),
        }
    }
}

impl UnknownFieldSet {
    pub(crate) fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn push(&mut self, field: UnknownField) {
        self.fields.push(field);
    }

    pub(crate) fn iter(&self) -> slice::Iter<'_, UnknownField> {
        self.fields.iter()
    }
}

impl FromIterator<UnknownField> for UnknownFieldSet {
    fn from_iter<T: IntoIterator<Item = UnknownField>>(iter: T) -> Self {
        UnknownFieldSet {
            fields: Vec::from_iter(iter),
        }
    }
}

impl IntoIterator for UnknownFieldSet {
    type Item = UnknownField;
    type IntoIter = std::vec::IntoIter<UnknownField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// The [`Message`] impl allows unknown groups to reuse prost's group
/// bracketing, and lets the text formatter speculatively decode
/// length-delimited payloads as messages.
impl Message for UnknownFieldSet {
    fn encode_raw(&self, buf: &mut impl BufMut)
    where
        Self: Sized,
    {
        for field in &self.fields {
            field.encode(buf);
        }
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
        let field = UnknownField::decode_value(number, wire_type, buf, ctx)?;
        self.fields.push(field);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        self.fields.iter().map(UnknownField::encoded_len).sum()
    }

    fn clear(&mut self) {
        self.fields.clear();
    }
}
