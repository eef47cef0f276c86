use std::{borrow::Cow, collections::BTreeMap, fmt, str::FromStr};

use serde::de::{
    DeserializeSeed, Deserializer, Error, IgnoredAny, MapAccess, SeqAccess, Visitor,
};

use crate::{
    dynamic::{
        get_type_url_message_name,
        serde::{
            case::camel_case_to_snake_case, find_message_descriptor, is_well_known_type,
            DeserializeOptions, MAX_DURATION_SECONDS, MAX_TIMESTAMP_SECONDS,
            MIN_TIMESTAMP_SECONDS,
        },
        DynamicMessage, EncodeOptions,
    },
    MessageDescriptor,
};

use super::{deserialize_message, kind::MessageVisitorInner};

pub(super) struct GoogleProtobufAnyVisitor<'a>(
    pub &'a MessageDescriptor,
    pub &'a DeserializeOptions,
);
pub(super) struct GoogleProtobufNullVisitor;
pub(super) struct GoogleProtobufTimestampVisitor;
pub(super) struct GoogleProtobufDurationVisitor;
pub(super) struct GoogleProtobufFieldMaskVisitor;
pub(super) struct GoogleProtobufListVisitor;
pub(super) struct GoogleProtobufStructVisitor;
pub(super) struct GoogleProtobufValueVisitor;
pub(super) struct GoogleProtobufEmptyVisitor<'a>(pub &'a DeserializeOptions);

impl<'de> Visitor<'de> for GoogleProtobufAnyVisitor<'_> {
    type Value = prost_types::Any;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a map")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        // Members may appear in any order, and `@type` may appear more than
        // once only as an error, so everything is buffered before the payload
        // type is known.
        let mut buffered = serde_json::Map::new();
        let mut type_url: Option<String> = None;

        while let Some(key) = map.next_key::<Cow<str>>()? {
            if key == "@type" {
                if type_url.is_some() {
                    return Err(Error::custom("duplicate '@type' field"));
                }
                type_url = Some(map.next_value::<String>()?);
            } else if buffered
                .insert(key.clone().into_owned(), map.next_value()?)
                .is_some()
            {
                return Err(Error::custom(format!("duplicate field '{}'", key)));
            }
        }

        let type_url = match type_url {
            Some(type_url) if !type_url.is_empty() => type_url,
            Some(_) => return Err(Error::custom("empty '@type' field")),
            // An empty object is an empty Any.
            None if buffered.is_empty() => return Ok(prost_types::Any::default()),
            None => return Err(Error::custom("expected '@type' field")),
        };

        let message_name = get_type_url_message_name(&type_url)
            .ok_or_else(|| Error::custom(format!("unsupported type url '{}'", type_url)))?;

        let message_desc =
            find_message_descriptor(&self.1.resolver, self.0.parent_pool(), message_name)
                .ok_or_else(|| Error::custom(format!("message '{}' not found", message_name)))?;

        let payload_message = if is_well_known_type(message_name) {
            let payload = match buffered.remove("value") {
                Some(value) => value,
                None => return Err(Error::custom("expected 'value' field")),
            };

            if self.1.is_deny_unknown_fields() {
                if let Some(key) = buffered.keys().next() {
                    return Err(Error::custom(format!("unrecognized field name '{}'", key)));
                }
            }

            deserialize_message(&message_desc, payload, self.1).map_err(Error::custom)?
        } else {
            let mut payload_message = DynamicMessage::new(message_desc);

            serde_json::Value::Object(buffered)
                .deserialize_map(MessageVisitorInner(&mut payload_message, self.1))
                .map_err(Error::custom)?;

            payload_message
        };

        // The payload is re-encoded deterministically, so equal messages
        // produce identical Any values.
        let value = payload_message
            .encode_to_vec_with_options(
                &EncodeOptions::new().allow_partial(true).deterministic(true),
            )
            .expect("vec has sufficient capacity");
        Ok(prost_types::Any { type_url, value })
    }
}

impl<'de> Visitor<'de> for GoogleProtobufNullVisitor {
    type Value = i32;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "null")
    }

    #[inline]
    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        if v == "NULL_VALUE" {
            Ok(0)
        } else {
            Err(Error::custom("expected null"))
        }
    }

    #[inline]
    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(0)
    }
}

impl<'de> Visitor<'de> for GoogleProtobufTimestampVisitor {
    type Value = prost_types::Timestamp;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an rfc3339 timestamp string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        let mut timestamp = prost_types::Timestamp::from_str(v).map_err(Error::custom)?;
        timestamp.normalize();

        if timestamp.seconds < MIN_TIMESTAMP_SECONDS || timestamp.seconds > MAX_TIMESTAMP_SECONDS {
            return Err(Error::custom("timestamp out of range"));
        }

        Ok(timestamp)
    }
}

impl<'de> Visitor<'de> for GoogleProtobufDurationVisitor {
    type Value = prost_types::Duration;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a duration string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        let v = v
            .strip_suffix('s')
            .ok_or_else(|| Error::custom("invalid duration string"))?;

        let (negative, v) = match v.strip_prefix('-') {
            Some(v) => (true, v),
            None => (false, v),
        };

        let (seconds, nanos) = if let Some((seconds_str, nanos_str)) = v.split_once('.') {
            let seconds = u64::from_str(seconds_str).map_err(Error::custom)?;
            let nanos = match nanos_str.len() {
                0 => 0,
                len @ 1..=9 => {
                    let mut nanos = u32::from_str(nanos_str).map_err(Error::custom)?;
                    for _ in 0..9 - len {
                        nanos *= 10;
                    }
                    nanos
                }
                _ => return Err(Error::custom("too many fractional digits for duration")),
            };

            (seconds, nanos)
        } else {
            let seconds = u64::from_str(v).map_err(Error::custom)?;

            (seconds, 0)
        };

        if seconds > MAX_DURATION_SECONDS as u64 {
            return Err(Error::custom("duration out of range"));
        }
        debug_assert!(nanos < 1_000_000_000);

        if negative {
            Ok(prost_types::Duration {
                seconds: -(seconds as i64),
                nanos: -(nanos as i32),
            })
        } else {
            Ok(prost_types::Duration {
                seconds: seconds as i64,
                nanos: nanos as i32,
            })
        }
    }
}

impl<'de> Visitor<'de> for GoogleProtobufFieldMaskVisitor {
    type Value = prost_types::FieldMask;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a field mask string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        let paths = v
            .split(',')
            .filter(|path| !path.is_empty())
            .map(|path| {
                let mut result = String::new();
                let mut parts = path.split('.');

                if let Some(part) = parts.next() {
                    camel_case_to_snake_case(&mut result, part)?;
                }
                for part in parts {
                    result.push('.');
                    camel_case_to_snake_case(&mut result, part)?;
                }

                Ok(result)
            })
            .collect::<Result<_, ()>>()
            .map_err(|()| Error::custom("invalid field mask"))?;

        Ok(prost_types::FieldMask { paths })
    }
}

impl<'de> DeserializeSeed<'de> for GoogleProtobufValueVisitor {
    type Value = prost_types::Value;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for GoogleProtobufListVisitor {
    type Value = prost_types::ListValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a list")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(value) = seq.next_element_seed(GoogleProtobufValueVisitor)? {
            values.push(value);
        }
        Ok(prost_types::ListValue { values })
    }
}

impl<'de> Visitor<'de> for GoogleProtobufStructVisitor {
    type Value = prost_types::Struct;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a map")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut fields = BTreeMap::new();
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value_seed(GoogleProtobufValueVisitor)?;
            fields.insert(key, value);
        }
        Ok(prost_types::Struct { fields })
    }
}

impl<'de> Visitor<'de> for GoogleProtobufValueVisitor {
    type Value = prost_types::Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(prost_types::Value {
            kind: Some(prost_types::value::Kind::BoolValue(v)),
        })
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        self.visit_f64(v as f64)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        self.visit_f64(v as f64)
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(prost_types::Value {
            kind: Some(prost_types::value::Kind::NumberValue(v)),
        })
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        self.visit_string(v.to_owned())
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(prost_types::Value {
            kind: Some(prost_types::value::Kind::StringValue(v)),
        })
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(prost_types::Value {
            kind: Some(prost_types::value::Kind::NullValue(0)),
        })
    }

    fn visit_seq<A>(self, seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        GoogleProtobufListVisitor
            .visit_seq(seq)
            .map(|l| prost_types::Value {
                kind: Some(prost_types::value::Kind::ListValue(l)),
            })
    }

    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        GoogleProtobufStructVisitor
            .visit_map(map)
            .map(|s| prost_types::Value {
                kind: Some(prost_types::value::Kind::StructValue(s)),
            })
    }
}

impl<'de> Visitor<'de> for GoogleProtobufEmptyVisitor<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an empty map")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        if self.0.is_deny_unknown_fields() {
            if let Some((key, _)) = map.next_entry::<String, IgnoredAny>()? {
                return Err(Error::custom(format!("unrecognized field name '{}'", key)));
            }
        } else {
            while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        }

        Ok(())
    }
}
