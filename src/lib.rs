//! `protodyn` is a dynamic protocol buffers runtime.
//!
//! It models protobuf schemas as an immutable [`DescriptorPool`] built from
//! decoded `FileDescriptorProto`s, represents messages of any schema as
//! [`DynamicMessage`] values that can be inspected and mutated through
//! reflection, and converts messages to and from the binary wire format, the
//! protobuf text format, and the canonical JSON mapping.
//!
//! # Example
//!
//! ```
//! use protodyn::{DescriptorPool, DynamicMessage, Value};
//! use prost_types::{
//!     field_descriptor_proto, DescriptorProto, FieldDescriptorProto, FileDescriptorProto,
//! };
//!
//! let mut pool = DescriptorPool::new();
//! pool.add_file_descriptor_proto(FileDescriptorProto {
//!     name: Some("example.proto".to_owned()),
//!     syntax: Some("proto3".to_owned()),
//!     message_type: vec![DescriptorProto {
//!         name: Some("Greeting".to_owned()),
//!         field: vec![FieldDescriptorProto {
//!             name: Some("text".to_owned()),
//!             number: Some(1),
//!             r#type: Some(field_descriptor_proto::Type::String as i32),
//!             label: Some(field_descriptor_proto::Label::Optional as i32),
//!             ..Default::default()
//!         }],
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let desc = pool.get_message_by_name("Greeting").unwrap();
//! let mut message = DynamicMessage::new(desc);
//! message.set_field_by_name("text", Value::String("hello".to_owned()));
//! assert_eq!(message.encode_to_vec().unwrap(), b"\x0a\x05hello");
//! ```
#![warn(missing_debug_implementations, missing_docs)]
#![deny(unsafe_code)]

mod descriptor;
mod dynamic;
mod reflect;

pub use {prost, prost::bytes, prost_types};

pub use self::descriptor::{
    Cardinality, DescriptorError, DescriptorPool, EnumDescriptor, EnumValueDescriptor,
    ExtensionDescriptor, FieldDescriptor, FileDescriptor, Kind, MessageDescriptor,
    MethodDescriptor, OneofDescriptor, ServiceDescriptor, Syntax,
};
pub use self::dynamic::{
    text_format, DecodeOptions, DeserializeOptions, DynamicMessage, EncodeError, EncodeOptions,
    MapKey, SerializeOptions, SetFieldError, UnknownField, UnknownFieldValue, Value,
};
pub use self::reflect::ReflectMessage;
