use std::fmt::{self, Write};

use prost::Message;

use crate::{
    dynamic::{
        fields::ValueAndDescriptor,
        fmt_string, get_type_url_message_name,
        text_format::FormatOptions,
        unknown::{UnknownField, UnknownFieldSet, UnknownFieldValue},
    },
    DescriptorPool, DynamicMessage, Kind, MapKey, Value,
};

pub(super) struct Writer<'a, W> {
    options: FormatOptions,
    f: &'a mut W,
    indent_level: usize,
}

impl<'a, W> Writer<'a, W>
where
    W: Write,
{
    pub fn new(options: FormatOptions, f: &'a mut W) -> Self {
        Writer {
            options,
            f,
            indent_level: 0,
        }
    }

    pub fn fmt_message(&mut self, message: &DynamicMessage) -> fmt::Result {
        if self.options.expand_any {
            if let Some((type_url, body)) = self.as_expanded_any(message) {
                self.f.write_char('[')?;
                self.f.write_str(&type_url)?;
                self.f.write_str("]")?;
                self.fmt_field_value(&Value::Message(body), None)?;
                return Ok(());
            }
        }

        let skip_unknown = self.options.skip_unknown_fields;
        self.fmt_delimited(
            message
                .fields
                .iter(&message.desc)
                .filter(|f| !(skip_unknown && matches!(f, ValueAndDescriptor::Unknown(..)))),
            Writer::fmt_message_field,
        )
    }

    pub fn fmt_value(&mut self, value: &Value, kind: Option<&Kind>) -> fmt::Result {
        match value {
            Value::Bool(value) => write!(self.f, "{value}"),
            Value::I32(value) => write!(self.f, "{value}"),
            Value::I64(value) => write!(self.f, "{value}"),
            Value::U32(value) => write!(self.f, "{value}"),
            Value::U64(value) => write!(self.f, "{value}"),
            Value::F32(value) => self.fmt_float(*value as f64),
            Value::F64(value) => self.fmt_float(*value),
            Value::String(s) => self.fmt_string(s.as_bytes()),
            Value::Bytes(s) => self.fmt_string(s.as_ref()),
            Value::EnumNumber(value) => {
                if let Some(Kind::Enum(desc)) = kind {
                    if let Some(value) = desc.get_value(*value) {
                        return self.f.write_str(value.name());
                    }
                }
                write!(self.f, "{value}")
            }
            Value::Message(message) => {
                let skip_unknown = self.options.skip_unknown_fields;
                let mut fields = message.fields.iter(&message.desc);

                if fields.all(|f| skip_unknown && matches!(f, ValueAndDescriptor::Unknown(..))) {
                    self.f.write_str("{}")
                } else if self.options.pretty {
                    self.f.write_char('{')?;
                    self.indent_level += 1;
                    self.fmt_newline()?;
                    self.fmt_message(message)?;
                    self.indent_level -= 1;
                    self.fmt_newline()?;
                    self.f.write_char('}')
                } else {
                    self.f.write_char('{')?;
                    self.fmt_message(message)?;
                    self.f.write_char('}')
                }
            }
            Value::List(list) => {
                self.fmt_bracketed(list.iter(), |this, value| this.fmt_value(value, kind))
            }
            Value::Map(map) => {
                let value_kind = kind
                    .and_then(|k| k.as_message())
                    .map(|m| m.map_entry_value_field().kind());
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|(left, _), (right, _)| left.cmp(right));
                self.fmt_bracketed(entries.into_iter(), |this, (key, value)| {
                    this.fmt_map_entry(key, value, value_kind.as_ref())
                })
            }
        }
    }

    fn fmt_float(&mut self, value: f64) -> fmt::Result {
        if value.is_nan() {
            self.f.write_str("nan")
        } else if value == f64::INFINITY {
            self.f.write_str("inf")
        } else if value == f64::NEG_INFINITY {
            self.f.write_str("-inf")
        } else if value.fract() == 0.0 {
            write!(self.f, "{value:.1}")
        } else {
            write!(self.f, "{value}")
        }
    }

    fn fmt_map_key(&mut self, value: &MapKey) -> fmt::Result {
        match value {
            MapKey::Bool(value) => write!(self.f, "{value}"),
            MapKey::I32(value) => write!(self.f, "{value}"),
            MapKey::I64(value) => write!(self.f, "{value}"),
            MapKey::U32(value) => write!(self.f, "{value}"),
            MapKey::U64(value) => write!(self.f, "{value}"),
            MapKey::String(s) => self.fmt_string(s.as_bytes()),
        }
    }

    fn fmt_message_field(&mut self, field: ValueAndDescriptor) -> fmt::Result {
        match field {
            ValueAndDescriptor::Field(value, desc) => {
                // Groups are keyed by the type name rather than the
                // lowercased field name.
                let kind = desc.kind();
                let name: &str = if desc.is_group() {
                    kind.as_message().unwrap().name()
                } else {
                    desc.name()
                };
                self.fmt_keyed_value(name, value.as_ref(), &kind)
            }
            ValueAndDescriptor::Extension(value, desc) => {
                let kind = desc.kind();
                self.fmt_keyed_value(desc.json_name(), value.as_ref(), &kind)
            }
            ValueAndDescriptor::Unknown(values) => {
                self.fmt_delimited(values.iter(), Writer::fmt_unknown_field)
            }
        }
    }

    /// Repeated fields print one `name: value` entry per element, and maps
    /// one `name { key: k value: v }` entry per element.
    fn fmt_keyed_value(&mut self, name: &str, value: &Value, kind: &Kind) -> fmt::Result {
        match value {
            Value::List(values) => self.fmt_delimited(values.iter(), |this, value| {
                this.f.write_str(name)?;
                this.fmt_field_value(value, Some(kind))
            }),
            Value::Map(map) => {
                let value_kind = kind
                    .as_message()
                    .map(|entry| entry.map_entry_value_field().kind());
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|(left, _), (right, _)| left.cmp(right));
                self.fmt_delimited(entries.into_iter(), |this, (key, value)| {
                    this.f.write_str(name)?;
                    this.fmt_padding()?;
                    this.fmt_map_entry(key, value, value_kind.as_ref())
                })
            }
            value => {
                self.f.write_str(name)?;
                self.fmt_field_value(value, Some(kind))
            }
        }
    }

    fn fmt_map_entry(&mut self, key: &MapKey, value: &Value, kind: Option<&Kind>) -> fmt::Result {
        if self.options.pretty {
            self.f.write_char('{')?;
            self.indent_level += 1;
            self.fmt_newline()?;
            self.f.write_str("key: ")?;
            self.fmt_map_key(key)?;
            self.fmt_newline()?;
            self.f.write_str("value")?;
            self.fmt_field_value(value, kind)?;
            self.indent_level -= 1;
            self.fmt_newline()?;
            self.f.write_char('}')
        } else {
            self.f.write_str("{key:")?;
            self.fmt_map_key(key)?;
            self.f.write_str(",value")?;
            self.fmt_field_value(value, kind)?;
            self.f.write_char('}')
        }
    }

    fn fmt_field_value(&mut self, value: &Value, kind: Option<&Kind>) -> fmt::Result {
        if !matches!(value, Value::Message(_)) {
            self.f.write_char(':')?;
        }
        self.fmt_padding()?;
        self.fmt_value(value, kind)
    }

    fn fmt_unknown_field(&mut self, field: &UnknownField) -> fmt::Result {
        write!(self.f, "{}", field.number())?;
        match field.value() {
            UnknownFieldValue::Varint(int) => {
                self.f.write_char(':')?;
                self.fmt_padding()?;
                write!(self.f, "{int}")
            }
            UnknownFieldValue::ThirtyTwoBit(bytes) => {
                self.f.write_char(':')?;
                self.fmt_padding()?;
                write!(self.f, "0x{:08x}", u32::from_le_bytes(*bytes))
            }
            UnknownFieldValue::SixtyFourBit(bytes) => {
                self.f.write_char(':')?;
                self.fmt_padding()?;
                write!(self.f, "0x{:016x}", u64::from_le_bytes(*bytes))
            }
            UnknownFieldValue::LengthDelimited(bytes) => {
                // Length-delimited values carry no type information; try to
                // render them as a nested message before falling back to a
                // string.
                if !bytes.is_empty() {
                    if let Ok(set) = UnknownFieldSet::decode(bytes.clone()) {
                        self.fmt_padding()?;
                        return self.fmt_unknown_field_set(&set);
                    }
                }

                self.f.write_char(':')?;
                self.fmt_padding()?;
                self.fmt_string(bytes.as_ref())
            }
            UnknownFieldValue::Group(set) => {
                self.fmt_padding()?;
                self.fmt_unknown_field_set(set)
            }
        }
    }

    fn fmt_unknown_field_set(&mut self, set: &UnknownFieldSet) -> fmt::Result {
        if set.is_empty() {
            self.f.write_str("{}")
        } else if self.options.pretty {
            self.f.write_char('{')?;
            self.indent_level += 1;
            self.fmt_newline()?;
            self.fmt_delimited(set.iter(), Writer::fmt_unknown_field)?;
            self.indent_level -= 1;
            self.fmt_newline()?;
            self.f.write_char('}')
        } else {
            self.f.write_char('{')?;
            self.fmt_delimited(set.iter(), Writer::fmt_unknown_field)?;
            self.f.write_char('}')
        }
    }

    fn fmt_string(&mut self, bytes: &[u8]) -> fmt::Result {
        fmt_string(&mut self.f, bytes)
    }

    fn fmt_delimited<T>(
        &mut self,
        mut iter: impl Iterator<Item = T>,
        f: impl Fn(&mut Self, T) -> fmt::Result,
    ) -> fmt::Result {
        if let Some(first) = iter.next() {
            f(self, first)?;
        }
        for item in iter {
            if self.options.pretty {
                self.fmt_newline()?;
            } else {
                self.f.write_char(',')?;
            }
            f(self, item)?;
        }

        Ok(())
    }

    fn fmt_bracketed<I>(
        &mut self,
        mut iter: impl Iterator<Item = I>,
        f: impl Fn(&mut Self, I) -> fmt::Result,
    ) -> fmt::Result {
        self.f.write_char('[')?;
        if let Some(first) = iter.next() {
            f(self, first)?;
        }
        for item in iter {
            self.f.write_char(',')?;
            self.fmt_padding()?;
            f(self, item)?;
        }
        self.f.write_char(']')
    }

    fn fmt_padding(&mut self) -> fmt::Result {
        if self.options.pretty {
            self.f.write_char(' ')?;
        }
        Ok(())
    }

    fn fmt_newline(&mut self) -> fmt::Result {
        self.f.write_char('\n')?;
        for _ in 0..self.indent_level {
            self.f.write_str(&self.options.indent)?;
        }
        Ok(())
    }

    fn as_expanded_any(&self, message: &DynamicMessage) -> Option<(String, DynamicMessage)> {
        if message.desc.full_name() != "google.protobuf.Any" {
            return None;
        }

        let any = message.transcode_to::<prost_types::Any>().ok()?;
        let message_name = get_type_url_message_name(&any.type_url)?;

        let desc = match &self.options.resolver {
            Some(resolver) => resolver.get_message_by_name(message_name)?,
            None => message
                .desc
                .parent_pool()
                .get_message_by_name(message_name)
                .or_else(|| DescriptorPool::global().get_message_by_name(message_name))?,
        };
        let body = DynamicMessage::decode_with_options(
            desc,
            any.value.as_slice(),
            &crate::DecodeOptions::new().allow_partial(true),
        )
        .ok()?;
        Some((any.type_url, body))
    }
}
