mod wkt;

use base64::{display::Base64Display, prelude::BASE64_STANDARD};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::{
    descriptor::Kind,
    dynamic::{serde::SerializeOptions, DynamicMessage, MapKey, Value},
};

pub(super) struct SerializeWrapper<'a, T> {
    value: &'a T,
    options: &'a SerializeOptions,
}

pub(super) fn serialize_message<S>(
    message: &DynamicMessage,
    serializer: S,
    options: &SerializeOptions,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    SerializeWrapper {
        value: message,
        options,
    }
    .serialize(serializer)
}

impl Serialize for SerializeWrapper<'_, DynamicMessage> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let message_desc = self.value.descriptor();
        if let Some(serialize) = wkt::get_well_known_type_serializer(message_desc.full_name()) {
            serialize(self.value, serializer, self.options)
        } else {
            let mut map = serializer.serialize_map(None)?;
            serialize_dynamic_message_fields(&mut map, self.value, self.options)?;
            map.end()
        }
    }
}

pub(super) fn serialize_dynamic_message_fields<S>(
    map: &mut S,
    message: &DynamicMessage,
    options: &SerializeOptions,
) -> Result<(), S::Error>
where
    S: SerializeMap,
{
    for (field_desc, value) in message.fields() {
        map.serialize_entry(
            field_desc.json_name(),
            &SerializeWrapper {
                value: &ValueAndKind {
                    value,
                    kind: &field_desc.kind(),
                },
                options,
            },
        )?;
    }

    // Extension keys are bracketed full names, or the message type name for
    // MessageSet extensions.
    for (extension_desc, value) in message.extensions() {
        map.serialize_entry(
            extension_desc.json_name(),
            &SerializeWrapper {
                value: &ValueAndKind {
                    value,
                    kind: &extension_desc.kind(),
                },
                options,
            },
        )?;
    }
    Ok(())
}

struct ValueAndKind<'a> {
    value: &'a Value,
    kind: &'a Kind,
}

impl Serialize for SerializeWrapper<'_, ValueAndKind<'_>> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.value.value {
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::I32(value) => serializer.serialize_i32(*value),
            // 64-bit integers are encoded as strings to avoid silent loss of
            // precision in readers that parse numbers as doubles.
            Value::I64(value) => serializer.collect_str(value),
            Value::U32(value) => serializer.serialize_u32(*value),
            Value::U64(value) => serializer.collect_str(value),
            Value::F32(value) => serialize_float(serializer, *value),
            Value::F64(value) => serialize_double(serializer, *value),
            Value::String(value) => serializer.serialize_str(value),
            Value::Bytes(value) => {
                serializer.collect_str(&Base64Display::new(value, &BASE64_STANDARD))
            }
            Value::EnumNumber(number) => {
                let enum_ty = match self.value.kind {
                    Kind::Enum(enum_ty) => enum_ty,
                    kind => panic!(
                        "mismatch between dynamic value {:?} and field type {:?}",
                        self.value.value, kind
                    ),
                };

                if enum_ty.full_name() == "google.protobuf.NullValue" {
                    serializer.serialize_none()
                } else if let Some(enum_value) = enum_ty.get_value(*number) {
                    serializer.serialize_str(enum_value.name())
                } else {
                    serializer.serialize_i32(*number)
                }
            }
            Value::Message(message) => SerializeWrapper {
                value: message,
                options: self.options,
            }
            .serialize(serializer),
            Value::List(values) => {
                let mut list = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    list.serialize_element(&SerializeWrapper {
                        value: &ValueAndKind {
                            value,
                            kind: self.value.kind,
                        },
                        options: self.options,
                    })?;
                }
                list.end()
            }
            Value::Map(values) => {
                let value_kind = match self.value.kind {
                    Kind::Message(message) if message.is_map_entry() => {
                        message.map_entry_value_field().kind()
                    }
                    kind => panic!(
                        "mismatch between dynamic value {:?} and field type {:?}",
                        self.value.value, kind
                    ),
                };

                // Entries are written in ascending key order so the output is
                // deterministic.
                let mut entries: Vec<_> = values.iter().collect();
                entries.sort_by(|(left, _), (right, _)| left.cmp(right));

                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(
                        &SerializeWrapper {
                            value: key,
                            options: self.options,
                        },
                        &SerializeWrapper {
                            value: &ValueAndKind {
                                value,
                                kind: &value_kind,
                            },
                            options: self.options,
                        },
                    )?;
                }
                map.end()
            }
        }
    }
}

impl Serialize for SerializeWrapper<'_, MapKey> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.value {
            MapKey::Bool(value) => serializer.collect_str(value),
            MapKey::I32(value) => serializer.collect_str(value),
            MapKey::I64(value) => serializer.collect_str(value),
            MapKey::U32(value) => serializer.collect_str(value),
            MapKey::U64(value) => serializer.collect_str(value),
            MapKey::String(value) => serializer.serialize_str(value),
        }
    }
}

pub(super) fn serialize_float<S>(serializer: S, value: f32) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() {
        serializer.serialize_f32(value)
    } else if value == f32::INFINITY {
        serializer.serialize_str("Infinity")
    } else if value == f32::NEG_INFINITY {
        serializer.serialize_str("-Infinity")
    } else {
        debug_assert!(value.is_nan());
        serializer.serialize_str("NaN")
    }
}

pub(super) fn serialize_double<S>(serializer: S, value: f64) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() {
        serializer.serialize_f64(value)
    } else if value == f64::INFINITY {
        serializer.serialize_str("Infinity")
    } else if value == f64::NEG_INFINITY {
        serializer.serialize_str("-Infinity")
    } else {
        debug_assert!(value.is_nan());
        serializer.serialize_str("NaN")
    }
}
