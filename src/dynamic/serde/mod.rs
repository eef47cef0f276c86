mod case;
mod de;
mod ser;

use serde::{
    de::{DeserializeSeed, Deserializer, Error},
    ser::{Serialize, Serializer},
};

use crate::{DescriptorPool, DynamicMessage, MessageDescriptor};

pub(crate) const MIN_TIMESTAMP_SECONDS: i64 = -62_135_596_800;
pub(crate) const MAX_TIMESTAMP_SECONDS: i64 = 253_402_300_799;
pub(crate) const MAX_DURATION_SECONDS: i64 = 315_576_000_000;
pub(crate) const MAX_NANOS: i32 = 999_999_999;

/// Options to control serialization of messages to JSON.
#[derive(Debug, Clone, Default)]
pub struct SerializeOptions {
    allow_partial: bool,
    indent: Option<Box<str>>,
    resolver: Option<DescriptorPool>,
}

/// Options to control deserialization of messages from JSON.
#[derive(Debug, Clone)]
pub struct DeserializeOptions {
    allow_partial: bool,
    deny_unknown_fields: bool,
    resolver: Option<DescriptorPool>,
}

impl Serialize for DynamicMessage {
    /// Serialize this message into `serializer` using the [canonical JSON encoding](https://developers.google.com/protocol-buffers/docs/proto3#json).
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.serialize_with_options(serializer, &Default::default())
    }
}

impl<'de> DeserializeSeed<'de> for MessageDescriptor {
    type Value = DynamicMessage;

    /// Deserialize a [`DynamicMessage`] from `deserializer` using the [canonical JSON encoding](https://developers.google.com/protocol-buffers/docs/proto3#json).
    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        DynamicMessage::deserialize(self, deserializer)
    }
}

impl DynamicMessage {
    /// Serialize this message into `serializer` using the encoding specified by `options`.
    pub fn serialize_with_options<S>(
        &self,
        serializer: S,
        options: &SerializeOptions,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::Error;

        if !options.allow_partial {
            self.is_initialized().map_err(S::Error::custom)?;
        }
        ser::serialize_message(self, serializer, options)
    }

    /// Serialize this message to a JSON string.
    ///
    /// If [`SerializeOptions::indent`] is set, the output is pretty-printed
    /// with that indent, otherwise it is compact.
    pub fn to_json_string_with_options(
        &self,
        options: &SerializeOptions,
    ) -> Result<String, serde_json::Error> {
        use serde::ser::Error;
        use serde_json::ser::{PrettyFormatter, Serializer};

        let mut buf = Vec::new();
        match &options.indent {
            Some(indent) => {
                if indent.bytes().any(|b| b != b' ' && b != b'\t') {
                    return Err(Error::custom(
                        "indent may only contain spaces and tabs",
                    ));
                }
                let formatter = PrettyFormatter::with_indent(indent.as_bytes());
                let mut serializer = Serializer::with_formatter(&mut buf, formatter);
                self.serialize_with_options(&mut serializer, options)?;
            }
            None => {
                let mut serializer = Serializer::new(&mut buf);
                self.serialize_with_options(&mut serializer, options)?;
            }
        }
        Ok(String::from_utf8(buf).expect("serde_json writes valid utf-8"))
    }

    /// Serialize this message to a compact JSON string with default options.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        self.to_json_string_with_options(&SerializeOptions::new())
    }

    /// Deserialize an instance of the message type described by `desc` from `deserializer`.
    pub fn deserialize<'de, D>(desc: MessageDescriptor, deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Self::deserialize_with_options(desc, deserializer, &Default::default())
    }

    /// Deserialize an instance of the message type described by `desc` from
    /// `deserializer`, using the encoding specified by `options`.
    pub fn deserialize_with_options<'de, D>(
        desc: MessageDescriptor,
        deserializer: D,
        options: &DeserializeOptions,
    ) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let message = de::deserialize_message(&desc, deserializer, options)?;
        if !options.allow_partial {
            message.is_initialized().map_err(D::Error::custom)?;
        }
        Ok(message)
    }

    /// Deserialize an instance of the message type described by `desc` from a
    /// JSON string.
    pub fn from_json_str(desc: MessageDescriptor, json: &str) -> Result<Self, serde_json::Error> {
        Self::from_json_str_with_options(desc, json, &DeserializeOptions::new())
    }

    /// Deserialize an instance of the message type described by `desc` from a
    /// JSON string, using the encoding specified by `options`.
    pub fn from_json_str_with_options(
        desc: MessageDescriptor,
        json: &str,
        options: &DeserializeOptions,
    ) -> Result<Self, serde_json::Error> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let message = Self::deserialize_with_options(desc, &mut deserializer, options)?;
        deserializer.end()?;
        Ok(message)
    }
}

impl DeserializeOptions {
    /// Creates a new instance of [`DeserializeOptions`], with the default
    /// options chosen to conform to the standard JSON mapping.
    pub const fn new() -> Self {
        DeserializeOptions {
            allow_partial: false,
            deny_unknown_fields: true,
            resolver: None,
        }
    }

    /// Whether to skip the required fields check after deserializing.
    ///
    /// The default value is `false`.
    pub const fn allow_partial(mut self, yes: bool) -> Self {
        self.allow_partial = yes;
        self
    }

    /// Whether to error when encountering unknown message fields.
    ///
    /// The default value is `true`.
    pub const fn deny_unknown_fields(mut self, yes: bool) -> Self {
        self.deny_unknown_fields = yes;
        self
    }

    /// Sets the pool used to resolve `Any` payload types.
    ///
    /// If unset, types are resolved through the pool containing the message's
    /// descriptor, falling back to the global pool.
    pub fn resolver(mut self, resolver: DescriptorPool) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub(crate) fn is_deny_unknown_fields(&self) -> bool {
        self.deny_unknown_fields
    }
}

impl Default for DeserializeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializeOptions {
    /// Creates a new instance of [`SerializeOptions`], with the default
    /// options chosen to conform to the standard JSON mapping.
    pub const fn new() -> Self {
        SerializeOptions {
            allow_partial: false,
            indent: None,
            resolver: None,
        }
    }

    /// Whether to skip the required fields check before serializing.
    ///
    /// The default value is `false`.
    pub const fn allow_partial(mut self, yes: bool) -> Self {
        self.allow_partial = yes;
        self
    }

    /// Sets the indent used by [`DynamicMessage::to_json_string_with_options`].
    ///
    /// Only spaces and tabs are permitted.
    pub fn indent(mut self, indent: impl Into<Box<str>>) -> Self {
        self.indent = Some(indent.into());
        self
    }

    /// Sets the pool used to resolve `Any` payload types.
    ///
    /// If unset, types are resolved through the pool containing the message's
    /// descriptor, falling back to the global pool.
    pub fn resolver(mut self, resolver: DescriptorPool) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

/// Looks up the message type an `Any` payload refers to: through the explicit
/// resolver if one is set, else the message's own pool, else the global
/// registry.
fn find_message_descriptor(
    resolver: &Option<DescriptorPool>,
    parent: &DescriptorPool,
    name: &str,
) -> Option<MessageDescriptor> {
    match resolver {
        Some(resolver) => resolver.get_message_by_name(name),
        None => parent
            .get_message_by_name(name)
            .or_else(|| DescriptorPool::global().get_message_by_name(name)),
    }
}

fn is_well_known_type(full_name: &str) -> bool {
    matches!(
        full_name,
        "google.protobuf.Any"
            | "google.protobuf.Timestamp"
            | "google.protobuf.Duration"
            | "google.protobuf.Struct"
            | "google.protobuf.FloatValue"
            | "google.protobuf.DoubleValue"
            | "google.protobuf.Int32Value"
            | "google.protobuf.Int64Value"
            | "google.protobuf.UInt32Value"
            | "google.protobuf.UInt64Value"
            | "google.protobuf.BoolValue"
            | "google.protobuf.StringValue"
            | "google.protobuf.BytesValue"
            | "google.protobuf.FieldMask"
            | "google.protobuf.ListValue"
            | "google.protobuf.Value"
            | "google.protobuf.Empty"
    )
}

/// Timestamps must lie in `0001-01-01T00:00:00Z..=9999-12-31T23:59:59.999999999Z`.
fn check_timestamp(timestamp: &prost_types::Timestamp) -> Result<(), String> {
    if timestamp.seconds < MIN_TIMESTAMP_SECONDS || timestamp.seconds > MAX_TIMESTAMP_SECONDS {
        Err(format!(
            "timestamp out of range: {} seconds",
            timestamp.seconds
        ))
    } else if timestamp.nanos < 0 || timestamp.nanos > MAX_NANOS {
        Err(format!("timestamp out of range: {} nanos", timestamp.nanos))
    } else {
        Ok(())
    }
}

/// Durations are limited to roughly ±10000 years, and the signs of the
/// seconds and nanos parts must agree.
fn check_duration(duration: &prost_types::Duration) -> Result<(), String> {
    if duration.seconds.abs() > MAX_DURATION_SECONDS {
        Err(format!(
            "duration out of range: {} seconds",
            duration.seconds
        ))
    } else if duration.nanos.abs() > MAX_NANOS {
        Err(format!("duration out of range: {} nanos", duration.nanos))
    } else if (duration.seconds > 0 && duration.nanos < 0)
        || (duration.seconds < 0 && duration.nanos > 0)
    {
        Err("duration seconds and nanos have different signs".to_owned())
    } else {
        Ok(())
    }
}

/// Formats a duration with 0, 3, 6 or 9 fractional digits.
fn fmt_duration(duration: &prost_types::Duration) -> String {
    use std::fmt::Write;

    let mut result = String::new();
    if duration.seconds < 0 || duration.nanos < 0 {
        result.push('-');
    }
    write!(result, "{}", duration.seconds.unsigned_abs()).unwrap();

    let nanos = duration.nanos.unsigned_abs();
    if nanos != 0 {
        if nanos % 1_000_000 == 0 {
            write!(result, ".{:03}", nanos / 1_000_000).unwrap();
        } else if nanos % 1_000 == 0 {
            write!(result, ".{:06}", nanos / 1_000).unwrap();
        } else {
            write!(result, ".{:09}", nanos).unwrap();
        }
    }
    result.push('s');
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formatting() {
        let duration = |seconds, nanos| prost_types::Duration { seconds, nanos };

        assert_eq!(fmt_duration(&duration(1, 0)), "1s");
        assert_eq!(fmt_duration(&duration(0, -500_000_000)), "-0.500s");
        assert_eq!(fmt_duration(&duration(-123, -450)), "-123.000000450s");
        assert_eq!(fmt_duration(&duration(3, 1_000)), "3.000001s");
        assert_eq!(
            fmt_duration(&duration(315_576_000_000, 999_999_999)),
            "315576000000.999999999s"
        );
    }

    #[test]
    fn duration_sign_agreement() {
        assert!(check_duration(&prost_types::Duration {
            seconds: 1,
            nanos: -1
        })
        .is_err());
        assert!(check_duration(&prost_types::Duration {
            seconds: -1,
            nanos: 1
        })
        .is_err());
        assert!(check_duration(&prost_types::Duration {
            seconds: 0,
            nanos: -1
        })
        .is_ok());
    }

    #[test]
    fn timestamp_range() {
        assert!(check_timestamp(&prost_types::Timestamp {
            seconds: MAX_TIMESTAMP_SECONDS,
            nanos: 999_999_999
        })
        .is_ok());
        assert!(check_timestamp(&prost_types::Timestamp {
            seconds: MAX_TIMESTAMP_SECONDS + 1,
            nanos: 0
        })
        .is_err());
        assert!(check_timestamp(&prost_types::Timestamp {
            seconds: 0,
            nanos: -1
        })
        .is_err());
    }
}
