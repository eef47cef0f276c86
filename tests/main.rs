use std::collections::HashMap;

use once_cell::sync::Lazy;
use protodyn::{
    DecodeOptions, DescriptorPool, DeserializeOptions, DynamicMessage, EncodeOptions, MapKey,
    SerializeOptions, Value,
};

static TEST_POOL: Lazy<DescriptorPool> = Lazy::new(|| {
    let mut compiler =
        protox::Compiler::new([concat!(env!("CARGO_MANIFEST_DIR"), "/tests/protos")])
            .expect("failed to create compiler");
    compiler.include_imports(true);
    compiler.open_file("test.proto").expect("failed to compile test.proto");
    compiler.open_file("test2.proto").expect("failed to compile test2.proto");
    DescriptorPool::from_file_descriptor_set(compiler.file_descriptor_set())
        .expect("failed to build descriptor pool")
});

fn test_pool() -> DescriptorPool {
    TEST_POOL.clone()
}

fn new_message(name: &str) -> DynamicMessage {
    DynamicMessage::new(
        test_pool()
            .get_message_by_name(name)
            .unwrap_or_else(|| panic!("message {} not found", name)),
    )
}

mod binary {
    use super::*;

    #[test]
    fn point_wire_format() {
        let mut point = new_message("test.Point");
        point.set_field_by_name("x", Value::I32(7));
        point.set_field_by_name("y", Value::String("hello".to_owned()));

        let bytes = point.encode_to_vec().unwrap();
        assert_eq!(bytes, b"\x08\x07\x12\x05hello");

        let decoded = DynamicMessage::decode(point.descriptor(), bytes.as_slice()).unwrap();
        assert_eq!(decoded.get_field_by_name("x").unwrap().as_ref(), &Value::I32(7));
        assert_eq!(
            decoded.get_field_by_name("y").unwrap().as_ref(),
            &Value::String("hello".to_owned())
        );
        assert_eq!(decoded, point);
    }

    #[test]
    fn scalars_roundtrip() {
        let mut message = new_message("test.Scalars");
        message.set_field_by_name("double", Value::F64(1.5));
        message.set_field_by_name("float", Value::F32(-2.25));
        message.set_field_by_name("int32", Value::I32(-3));
        message.set_field_by_name("int64", Value::I64(i64::MIN));
        message.set_field_by_name("uint32", Value::U32(u32::MAX));
        message.set_field_by_name("uint64", Value::U64(u64::MAX));
        message.set_field_by_name("sint32", Value::I32(-7));
        message.set_field_by_name("sint64", Value::I64(-8));
        message.set_field_by_name("fixed32", Value::U32(9));
        message.set_field_by_name("fixed64", Value::U64(10));
        message.set_field_by_name("sfixed32", Value::I32(-11));
        message.set_field_by_name("sfixed64", Value::I64(-12));
        message.set_field_by_name("bool", Value::Bool(true));
        message.set_field_by_name("string", Value::String("÷ string".to_owned()));
        message.set_field_by_name("bytes", Value::Bytes(b"\x00\x01\xff".as_ref().into()));

        let bytes = message.encode_to_vec().unwrap();
        let decoded = DynamicMessage::decode(message.descriptor(), bytes.as_slice()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn packed_and_unpacked_interop() {
        let desc = test_pool().get_message_by_name("test.ComplexType").unwrap();
        let values = Value::List(vec![Value::I32(1), Value::I32(2), Value::I32(150)]);

        // Both representations decode identically, whichever way the field
        // is declared.
        let packed_field_1: &[u8] = b"\x0a\x04\x01\x02\x96\x01";
        let unpacked_field_1: &[u8] = b"\x08\x01\x08\x02\x08\x96\x01";
        let packed_field_2: &[u8] = b"\x12\x04\x01\x02\x96\x01";
        let unpacked_field_2: &[u8] = b"\x10\x01\x10\x02\x10\x96\x01";

        for bytes in [packed_field_1, unpacked_field_1] {
            let decoded = DynamicMessage::decode(desc.clone(), bytes).unwrap();
            assert_eq!(decoded.get_field_by_name("packed_ints").unwrap().as_ref(), &values);
        }
        for bytes in [packed_field_2, unpacked_field_2] {
            let decoded = DynamicMessage::decode(desc.clone(), bytes).unwrap();
            assert_eq!(
                decoded.get_field_by_name("unpacked_ints").unwrap().as_ref(),
                &values
            );
        }

        // The declared packedness decides the encoded form.
        let mut message = DynamicMessage::new(desc);
        message.set_field_by_name("packed_ints", values.clone());
        assert_eq!(message.encode_to_vec().unwrap(), packed_field_1);
        message.clear_field_by_name("packed_ints");
        message.set_field_by_name("unpacked_ints", values);
        assert_eq!(message.encode_to_vec().unwrap(), unpacked_field_2);
    }

    #[test]
    fn map_duplicate_key_overwrites() {
        let desc = test_pool().get_message_by_name("test.ComplexType").unwrap();

        // Two entries for key 1; the later value wins.
        let bytes: &[u8] = b"\x1a\x05\x08\x01\x12\x01a\x1a\x05\x08\x01\x12\x01b";
        let decoded = DynamicMessage::decode(desc, bytes).unwrap();
        let map = decoded.get_field_by_name("int_map").unwrap();
        assert_eq!(
            map.as_ref().as_map().unwrap(),
            &HashMap::from([(MapKey::I32(1), Value::String("b".to_owned()))])
        );
    }

    #[test]
    fn unknown_fields_preserved() {
        let mut writer = new_message("test2.Writer");
        writer.set_field_by_name("a", Value::I32(1));
        writer.set_field_by_name("extra", Value::String("preserved".to_owned()));
        writer.set_field_by_name("more", Value::List(vec![Value::I64(-5), Value::I64(6)]));
        let bytes = writer.encode_to_vec().unwrap();

        let reader_desc = test_pool().get_message_by_name("test2.Reader").unwrap();
        let reader = DynamicMessage::decode(reader_desc, bytes.as_slice()).unwrap();
        assert_eq!(reader.get_field_by_name("a").unwrap().as_ref(), &Value::I32(1));
        assert!(reader.unknown_fields().next().is_some());

        assert_eq!(reader.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn unknown_fields_discarded_on_request() {
        let mut writer = new_message("test2.Writer");
        writer.set_field_by_name("extra", Value::String("dropped".to_owned()));
        let bytes = writer.encode_to_vec().unwrap();

        let reader_desc = test_pool().get_message_by_name("test2.Reader").unwrap();
        let reader = DynamicMessage::decode_with_options(
            reader_desc,
            bytes.as_slice(),
            &DecodeOptions::new().discard_unknown(true),
        )
        .unwrap();
        assert_eq!(reader.unknown_fields().count(), 0);
        assert!(reader.encode_to_vec().unwrap().is_empty());
    }

    #[test]
    fn required_fields_are_checked() {
        let desc = test_pool()
            .get_message_by_name("test2.RequiredFields")
            .unwrap();

        let err = DynamicMessage::decode(desc.clone(), &[] as &[u8]).unwrap_err();
        assert!(err.to_string().contains("required_int"), "{}", err);

        let message = DynamicMessage::decode_with_options(
            desc.clone(),
            &[] as &[u8],
            &DecodeOptions::new().allow_partial(true),
        )
        .unwrap();
        assert!(message.encode_to_vec().is_err());
        assert!(message
            .encode_to_vec_with_options(&EncodeOptions::new().allow_partial(true))
            .is_ok());

        // Every missing field is reported, including inside sub-messages.
        let mut message = DynamicMessage::new(desc);
        message
            .get_field_by_name_mut("inner")
            .unwrap()
            .as_message_mut()
            .unwrap();
        let err = message.is_initialized().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("required_int"), "{}", text);
        assert!(text.contains("inner.flag"), "{}", text);
    }

    #[test]
    fn deterministic_encoding_is_stable() {
        let desc = test_pool().get_message_by_name("test.ComplexType").unwrap();
        let options = EncodeOptions::new().deterministic(true);

        let build = |entries: &[(i32, &str)]| {
            let mut message = DynamicMessage::new(desc.clone());
            let map = message
                .get_field_by_name_mut("int_map")
                .unwrap()
                .as_map_mut()
                .unwrap();
            for &(key, value) in entries {
                map.insert(MapKey::I32(key), Value::String(value.to_owned()));
            }
            message
        };

        let left = build(&[(-101, "a"), (0, "b"), (255, "c")]);
        let right = build(&[(255, "c"), (-101, "a"), (0, "b")]);
        assert_eq!(
            left.encode_to_vec_with_options(&options).unwrap(),
            right.encode_to_vec_with_options(&options).unwrap(),
        );
    }

    #[test]
    fn groups_roundtrip() {
        let mut message = new_message("test2.GroupHolder");
        message
            .get_field_by_name_mut("mygroup")
            .unwrap()
            .as_message_mut()
            .unwrap()
            .set_field_by_name("a", Value::I32(5));

        let bytes = message.encode_to_vec().unwrap();
        // start group (field 1), a = 5, end group
        assert_eq!(bytes, b"\x0b\x08\x05\x0c");

        let decoded = DynamicMessage::decode(message.descriptor(), bytes.as_slice()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn extensions_roundtrip() {
        let pool = test_pool();
        let desc = pool.get_message_by_name("test2.Extendee").unwrap();
        let ext_string = pool.get_extension_by_name("test2.ext_string").unwrap();
        let ext_ints = pool.get_extension_by_name("test2.ext_ints").unwrap();
        assert_eq!(
            pool.get_extension_by_number("test2.Extendee", 100),
            Some(ext_string.clone())
        );

        let mut message = DynamicMessage::new(desc.clone());
        message.set_field_by_name("base", Value::I32(1));
        message.set_extension(&ext_string, Value::String("extended".to_owned()));
        message.set_extension(&ext_ints, Value::List(vec![Value::I32(3), Value::I32(4)]));

        let bytes = message.encode_to_vec().unwrap();
        let decoded = DynamicMessage::decode(desc.clone(), bytes.as_slice()).unwrap();
        assert!(decoded.has_extension(&ext_string));
        assert_eq!(
            decoded.get_extension(&ext_string).as_ref(),
            &Value::String("extended".to_owned())
        );
        assert_eq!(decoded, message);

        // Extensions may also be resolved through an explicit resolver pool,
        // in which case the stored descriptors come from that pool.
        let mut resolver_pool = DescriptorPool::new();
        resolver_pool
            .add_file_descriptor_protos(pool.file_descriptor_protos().cloned())
            .unwrap();
        let foreign = DynamicMessage::decode_with_options(
            desc,
            bytes.as_slice(),
            &DecodeOptions::new().resolver(resolver_pool.clone()),
        )
        .unwrap();
        assert!(foreign.has_extension(
            &resolver_pool
                .get_extension_by_name("test2.ext_string")
                .unwrap()
        ));
    }

    #[test]
    fn proto2_defaults() {
        let message = new_message("test2.Defaults");
        assert!(!message.has_field_by_name("answer"));
        assert_eq!(
            message.get_field_by_name("answer").unwrap().as_ref(),
            &Value::I32(42)
        );
        assert_eq!(
            message.get_field_by_name("greeting").unwrap().as_ref(),
            &Value::String("hello".to_owned())
        );
        assert_eq!(
            message.get_field_by_name("ratio").unwrap().as_ref(),
            &Value::F32(f32::INFINITY)
        );
    }

    #[test]
    fn presence_laws() {
        let mut message = new_message("test.ComplexType");
        let desc = message.descriptor();
        let tracked = desc.get_field_by_name("tracked").unwrap();
        let choice = desc.oneofs().find(|o| o.name() == "choice").unwrap();

        // Proto3 scalars equal to their default are not considered set.
        message.set_field_by_name("enum_value", Value::EnumNumber(0));
        assert!(!message.has_field_by_name("enum_value"));
        message.set_field_by_name("enum_value", Value::EnumNumber(1));
        assert!(message.has_field_by_name("enum_value"));

        // Explicit presence fields track the zero value.
        message.set_field(&tracked, Value::String(String::new()));
        assert!(message.has_field(&tracked));
        message.clear_field(&tracked);
        assert!(!message.has_field(&tracked));

        // Setting one oneof member clears the others.
        assert_eq!(message.oneof_field(&choice), None);
        message.set_field_by_name("choice_int", Value::I32(0));
        assert_eq!(
            message.oneof_field(&choice).map(|f| f.name().to_owned()),
            Some("choice_int".to_owned())
        );
        message.set_field_by_name("choice_string", Value::String("s".to_owned()));
        assert!(!message.has_field_by_name("choice_int"));
        assert!(message.has_field_by_name("choice_string"));

        // Mutable access returns the same handle as a subsequent get.
        let nested = message
            .get_field_by_name_mut("nested")
            .unwrap()
            .as_message_mut()
            .unwrap();
        nested.set_field_by_name("value", Value::String("v".to_owned()));
        assert_eq!(
            message
                .get_field_by_name("nested")
                .unwrap()
                .as_message()
                .unwrap()
                .get_field_by_name("value")
                .unwrap()
                .as_ref(),
            &Value::String("v".to_owned())
        );
    }
}

mod json {
    use super::*;

    fn to_json(message: &DynamicMessage) -> String {
        message.to_json_string().unwrap()
    }

    fn from_json(name: &str, json: &str) -> DynamicMessage {
        DynamicMessage::from_json_str(
            test_pool().get_message_by_name(name).unwrap(),
            json,
        )
        .unwrap()
    }

    #[test]
    fn scalars() {
        let mut message = new_message("test.Scalars");
        message.set_field_by_name("int64", Value::I64(-123456789012345678));
        message.set_field_by_name("uint64", Value::U64(u64::MAX));
        message.set_field_by_name("double", Value::F64(f64::NEG_INFINITY));
        message.set_field_by_name("float", Value::F32(f32::NAN));
        message.set_field_by_name("bytes", Value::Bytes(b"\x00\xff".as_ref().into()));

        let json = to_json(&message);
        assert_eq!(
            json,
            r#"{"double":"-Infinity","float":"NaN","int64":"-123456789012345678","uint64":"18446744073709551615","bytes":"AP8="}"#
        );

        let decoded = from_json("test.Scalars", &json);
        assert_eq!(
            decoded.get_field_by_name("int64").unwrap().as_ref(),
            &Value::I64(-123456789012345678)
        );
        assert_eq!(
            decoded.get_field_by_name("double").unwrap().as_ref(),
            &Value::F64(f64::NEG_INFINITY)
        );
        assert!(decoded
            .get_field_by_name("float")
            .unwrap()
            .as_f32()
            .unwrap()
            .is_nan());
    }

    #[test]
    fn sixty_four_bit_integers_accept_scientific_strings() {
        let decoded = from_json("test.Scalars", r#"{"int64":"1e3","uint64":1000}"#);
        assert_eq!(
            decoded.get_field_by_name("int64").unwrap().as_ref(),
            &Value::I64(1000)
        );
        assert_eq!(
            decoded.get_field_by_name("uint64").unwrap().as_ref(),
            &Value::U64(1000)
        );

        let desc = test_pool().get_message_by_name("test.Scalars").unwrap();
        assert!(DynamicMessage::from_json_str(desc, r#"{"int64":"1.5"}"#).is_err());
    }

    #[test]
    fn field_names() {
        // Both the JSON name and the original name are accepted.
        let decoded = from_json("test.ComplexType", r#"{"enumValue":"ONE"}"#);
        assert_eq!(
            decoded.get_field_by_name("enum_value").unwrap().as_ref(),
            &Value::EnumNumber(1)
        );
        let decoded = from_json("test.ComplexType", r#"{"enum_value":"ONE"}"#);
        assert_eq!(
            decoded.get_field_by_name("enum_value").unwrap().as_ref(),
            &Value::EnumNumber(1)
        );

        let desc = test_pool().get_message_by_name("test.ComplexType").unwrap();
        let err = DynamicMessage::from_json_str(
            desc.clone(),
            r#"{"enumValue":"ONE","enum_value":"TWO"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"), "{}", err);

        let err = DynamicMessage::from_json_str(desc.clone(), r#"{"nope":1}"#).unwrap_err();
        assert!(err.to_string().contains("nope"), "{}", err);
        DynamicMessage::from_json_str_with_options(
            desc,
            r#"{"nope":1}"#,
            &DeserializeOptions::new().deny_unknown_fields(false),
        )
        .unwrap();
    }

    #[test]
    fn enums() {
        let mut message = new_message("test.ComplexType");
        message.set_field_by_name("enum_value", Value::EnumNumber(2));
        assert_eq!(to_json(&message), r#"{"enumValue":"TWO"}"#);

        // Unnamed numbers are written numerically, and numbers are accepted
        // on input - but not number-valued strings.
        message.set_field_by_name("enum_value", Value::EnumNumber(42));
        assert_eq!(to_json(&message), r#"{"enumValue":42}"#);

        let decoded = from_json("test.ComplexType", r#"{"enumValue":2}"#);
        assert_eq!(
            decoded.get_field_by_name("enum_value").unwrap().as_ref(),
            &Value::EnumNumber(2)
        );
        let desc = test_pool().get_message_by_name("test.ComplexType").unwrap();
        assert!(DynamicMessage::from_json_str(desc, r#"{"enumValue":"2"}"#).is_err());
    }

    #[test]
    fn null_is_unset() {
        let decoded = from_json("test.ComplexType", r#"{"nested":null,"tracked":null}"#);
        assert!(!decoded.has_field_by_name("nested"));
        assert!(!decoded.has_field_by_name("tracked"));
    }

    #[test]
    fn duration_edge_cases() {
        let desc = test_pool()
            .get_message_by_name("google.protobuf.Duration")
            .unwrap();

        let decoded =
            DynamicMessage::from_json_str(desc.clone(), r#""-123.000000450s""#).unwrap();
        let duration: prost_types::Duration = decoded.transcode_to().unwrap();
        assert_eq!(duration, prost_types::Duration { seconds: -123, nanos: -450 });
        assert_eq!(decoded.to_json_string().unwrap(), r#""-123.000000450s""#);

        let decoded =
            DynamicMessage::from_json_str(desc.clone(), r#""315576000000.999999999s""#).unwrap();
        let duration: prost_types::Duration = decoded.transcode_to().unwrap();
        assert_eq!(
            duration,
            prost_types::Duration {
                seconds: 315_576_000_000,
                nanos: 999_999_999
            }
        );

        assert!(DynamicMessage::from_json_str(desc.clone(), r#""315576000001s""#).is_err());

        // Disagreeing signs cannot be serialized.
        let mut invalid = DynamicMessage::new(desc);
        invalid
            .transcode_from(&prost_types::Duration { seconds: 1, nanos: -1 })
            .unwrap();
        assert!(invalid.to_json_string().is_err());
    }

    #[test]
    fn timestamp_edge_cases() {
        let desc = test_pool()
            .get_message_by_name("google.protobuf.Timestamp")
            .unwrap();

        let mut message = DynamicMessage::new(desc.clone());
        message
            .transcode_from(&prost_types::Timestamp {
                seconds: 1553036601,
                nanos: 0,
            })
            .unwrap();
        assert_eq!(message.to_json_string().unwrap(), r#""2019-03-19T23:03:21Z""#);

        let decoded =
            DynamicMessage::from_json_str(desc.clone(), r#""2019-03-19T23:03:21Z""#).unwrap();
        assert_eq!(decoded, message);

        // Any timezone offset is accepted on input.
        let decoded =
            DynamicMessage::from_json_str(desc.clone(), r#""1970-01-01T00:00:00+01:00""#).unwrap();
        let timestamp: prost_types::Timestamp = decoded.transcode_to().unwrap();
        assert_eq!(timestamp.seconds, -3600);

        // ... but the result must stay within the representable range.
        assert!(
            DynamicMessage::from_json_str(desc, r#""9999-12-31T23:59:59-01:00""#).is_err()
        );
    }

    #[test]
    fn any_with_wrapper() {
        let pool = test_pool();
        let desc = pool.get_message_by_name("google.protobuf.Any").unwrap();

        let mut any = DynamicMessage::new(desc.clone());
        any.transcode_from(&prost_types::Any {
            type_url: "type.googleapis.com/google.protobuf.BoolValue".to_owned(),
            value: vec![0x08, 0x01],
        })
        .unwrap();

        let json = any.to_json_string().unwrap();
        assert_eq!(
            json,
            r#"{"@type":"type.googleapis.com/google.protobuf.BoolValue","value":true}"#
        );

        let decoded = DynamicMessage::from_json_str(desc.clone(), &json).unwrap();
        assert_eq!(decoded, any);

        // An empty object decodes to a fully empty Any.
        let empty = DynamicMessage::from_json_str(desc.clone(), "{}").unwrap();
        let raw: prost_types::Any = empty.transcode_to().unwrap();
        assert_eq!(raw, prost_types::Any::default());

        assert!(DynamicMessage::from_json_str(desc.clone(), r#"{"value":true}"#).is_err());
        assert!(DynamicMessage::from_json_str(
            desc,
            r#"{"@type":"type.googleapis.com/test.Point","@type":"type.googleapis.com/test.Point"}"#
        )
        .is_err());
    }

    #[test]
    fn any_with_message() {
        let pool = test_pool();
        let desc = pool.get_message_by_name("google.protobuf.Any").unwrap();

        let json = r#"{"@type":"type.googleapis.com/test.Point","x":7,"y":"hello"}"#;
        let any = DynamicMessage::from_json_str_with_options(
            desc.clone(),
            json,
            &DeserializeOptions::new().resolver(pool.clone()),
        )
        .unwrap();
        let raw: prost_types::Any = any.transcode_to().unwrap();
        assert_eq!(raw.type_url, "type.googleapis.com/test.Point");
        assert_eq!(raw.value, b"\x08\x07\x12\x05hello");

        let output = any
            .to_json_string_with_options(&SerializeOptions::new().resolver(pool))
            .unwrap();
        assert_eq!(output, json);
    }

    #[test]
    fn field_mask_roundtrip() {
        let desc = test_pool()
            .get_message_by_name("google.protobuf.FieldMask")
            .unwrap();

        let mut mask = DynamicMessage::new(desc.clone());
        mask.transcode_from(&prost_types::FieldMask {
            paths: vec![
                "foo".to_owned(),
                "foo_bar".to_owned(),
                "foo.bar_qux".to_owned(),
                "_foo".to_owned(),
            ],
        })
        .unwrap();

        let json = mask.to_json_string().unwrap();
        assert_eq!(json, r#""foo,fooBar,foo.barQux,Foo""#);
        assert_eq!(DynamicMessage::from_json_str(desc.clone(), &json).unwrap(), mask);

        // No snake <-> camel roundtrip exists for consecutive underscores.
        let mut invalid = DynamicMessage::new(desc);
        invalid
            .transcode_from(&prost_types::FieldMask {
                paths: vec!["foo__bar".to_owned()],
            })
            .unwrap();
        assert!(invalid.to_json_string().is_err());
    }

    #[test]
    fn map_keys_are_sorted() {
        let mut message = new_message("test.ComplexType");
        let map = message
            .get_field_by_name_mut("int_map")
            .unwrap()
            .as_map_mut()
            .unwrap();
        map.insert(MapKey::I32(255), Value::String("c".to_owned()));
        map.insert(MapKey::I32(-101), Value::String("a".to_owned()));
        map.insert(MapKey::I32(0), Value::String("b".to_owned()));

        assert_eq!(
            to_json(&message),
            r#"{"intMap":{"-101":"a","0":"b","255":"c"}}"#
        );
    }

    #[test]
    fn map_duplicate_keys_are_rejected() {
        let desc = test_pool().get_message_by_name("test.ComplexType").unwrap();
        let err = DynamicMessage::from_json_str(desc, r#"{"intMap":{"1":"a","1":"b"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"), "{}", err);
    }

    #[test]
    fn wrappers_and_well_known_types_roundtrip() {
        let mut message = new_message("test.WellKnownTypes");
        message
            .get_field_by_name_mut("timestamp")
            .unwrap()
            .as_message_mut()
            .unwrap()
            .transcode_from(&prost_types::Timestamp {
                seconds: 1553036601,
                nanos: 500_000_000,
            })
            .unwrap();
        message
            .get_field_by_name_mut("duration")
            .unwrap()
            .as_message_mut()
            .unwrap()
            .transcode_from(&prost_types::Duration {
                seconds: 1,
                nanos: 500,
            })
            .unwrap();
        message
            .get_field_by_name_mut("bool_wrapper")
            .unwrap()
            .as_message_mut()
            .unwrap()
            .set_field_by_number(1, Value::Bool(true));
        message
            .get_field_by_name_mut("double_wrapper")
            .unwrap()
            .as_message_mut()
            .unwrap()
            .set_field_by_number(1, Value::F64(f64::INFINITY));
        message
            .get_field_by_name_mut("value")
            .unwrap()
            .as_message_mut()
            .unwrap()
            .transcode_from(&prost_types::Value {
                kind: Some(prost_types::value::Kind::StructValue(prost_types::Struct {
                    fields: [(
                        "nested".to_owned(),
                        prost_types::Value {
                            kind: Some(prost_types::value::Kind::NumberValue(3.5)),
                        },
                    )]
                    .into_iter()
                    .collect(),
                })),
            })
            .unwrap();
        message
            .get_field_by_name_mut("empty")
            .unwrap()
            .as_message_mut()
            .unwrap();

        let json = message.to_json_string().unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":"2019-03-19T23:03:21.500Z","duration":"1.000000500s","value":{"nested":3.5},"boolWrapper":true,"empty":{},"doubleWrapper":"Infinity"}"#
        );

        // The JSON representation survives a round trip through the binary
        // format and back.
        let decoded = from_json("test.WellKnownTypes", &json);
        let bytes = decoded.encode_to_vec().unwrap();
        let from_binary =
            DynamicMessage::decode(message.descriptor(), bytes.as_slice()).unwrap();
        assert_eq!(from_binary, message);
    }

    #[test]
    fn extension_keys() {
        let pool = test_pool();
        let desc = pool.get_message_by_name("test2.Extendee").unwrap();
        let ext = pool.get_extension_by_name("test2.ext_string").unwrap();

        let mut message = DynamicMessage::new(desc.clone());
        message.set_extension(&ext, Value::String("extended".to_owned()));
        let json = message.to_json_string().unwrap();
        assert_eq!(json, r#"{"[test2.ext_string]":"extended"}"#);

        let decoded = DynamicMessage::from_json_str(desc, &json).unwrap();
        assert_eq!(decoded.get_extension(&ext).as_ref(), &Value::String("extended".to_owned()));
    }

    #[test]
    fn indented_output() {
        let mut message = new_message("test.Point");
        message.set_field_by_name("x", Value::I32(7));

        let json = message
            .to_json_string_with_options(&SerializeOptions::new().indent("  "))
            .unwrap();
        assert_eq!(json, "{\n  \"x\": 7\n}");

        assert!(message
            .to_json_string_with_options(&SerializeOptions::new().indent("xx"))
            .is_err());
    }

    #[test]
    fn trailing_list_nulls_are_rejected() {
        let desc = test_pool().get_message_by_name("test.ComplexType").unwrap();
        assert!(
            DynamicMessage::from_json_str(desc, r#"{"packedInts":[1,2,null]}"#).is_err()
        );
    }
}

mod text {
    use super::*;

    #[test]
    fn format_and_parse() {
        let mut point = new_message("test.Point");
        point.set_field_by_name("x", Value::I32(7));
        point.set_field_by_name("y", Value::String("hello".to_owned()));

        assert_eq!(point.to_text_format(), r#"x:7,y:"hello""#);
        assert_eq!(format!("{:#}", point), "x: 7\ny: \"hello\"");

        let parsed =
            DynamicMessage::parse_text_format(point.descriptor(), "x: 7 y: 'hello'").unwrap();
        assert_eq!(parsed, point);
    }

    #[test]
    fn repeated_fields_print_one_entry_per_line() {
        let mut message = new_message("test.ComplexType");
        message.set_field_by_name(
            "packed_ints",
            Value::List(vec![Value::I32(1), Value::I32(2), Value::I32(150)]),
        );

        assert_eq!(
            message.to_text_format(),
            "packed_ints:1,packed_ints:2,packed_ints:150"
        );

        // Bracketed lists are accepted on input.
        let parsed = DynamicMessage::parse_text_format(
            message.descriptor(),
            "packed_ints: [1, 2] packed_ints: 150",
        )
        .unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn nested_messages_and_enums() {
        let mut message = new_message("test.ComplexType");
        message
            .get_field_by_name_mut("nested")
            .unwrap()
            .as_message_mut()
            .unwrap()
            .set_field_by_name("value", Value::String("v".to_owned()));
        message.set_field_by_name("enum_value", Value::EnumNumber(1));

        assert_eq!(message.to_text_format(), r#"nested{value:"v"},enum_value:ONE"#);

        let parsed = DynamicMessage::parse_text_format(
            message.descriptor(),
            "nested { value: \"v\" } enum_value: ONE",
        )
        .unwrap();
        assert_eq!(parsed, message);

        let err = DynamicMessage::parse_text_format(
            message.descriptor(),
            "enum_value: UNDECLARED",
        )
        .unwrap_err();
        assert!(err.to_string().contains("UNDECLARED"), "{}", err);
    }

    #[test]
    fn maps_print_entry_messages() {
        let mut message = new_message("test.ComplexType");
        let map = message
            .get_field_by_name_mut("int_map")
            .unwrap()
            .as_map_mut()
            .unwrap();
        map.insert(MapKey::I32(2), Value::String("b".to_owned()));
        map.insert(MapKey::I32(1), Value::String("a".to_owned()));

        assert_eq!(
            message.to_text_format(),
            r#"int_map{key:1,value:"a"},int_map{key:2,value:"b"}"#
        );

        let parsed = DynamicMessage::parse_text_format(
            message.descriptor(),
            "int_map { key: 1 value: \"a\" } int_map { key: 2 value: \"b\" }",
        )
        .unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let desc = test_pool().get_message_by_name("test.Point").unwrap();
        let err = DynamicMessage::parse_text_format(desc, "x: 1 x: 2").unwrap_err();
        assert!(err.to_string().contains("already set"), "{}", err);

        let desc = test_pool().get_message_by_name("test.ComplexType").unwrap();
        let err =
            DynamicMessage::parse_text_format(desc, "choice_int: 1 choice_string: 's'")
                .unwrap_err();
        assert!(err.to_string().contains("oneof"), "{}", err);
    }

    #[test]
    fn groups_use_the_type_name() {
        let mut message = new_message("test2.GroupHolder");
        message
            .get_field_by_name_mut("mygroup")
            .unwrap()
            .as_message_mut()
            .unwrap()
            .set_field_by_name("a", Value::I32(5));

        assert_eq!(message.to_text_format(), "MyGroup{a:5}");

        let parsed =
            DynamicMessage::parse_text_format(message.descriptor(), "MyGroup { a: 5 }").unwrap();
        assert_eq!(parsed, message);

        // The lowercased field name is not a valid key for a group.
        assert!(
            DynamicMessage::parse_text_format(message.descriptor(), "mygroup { a: 5 }").is_err()
        );
    }

    #[test]
    fn expanded_any() {
        let pool = test_pool();
        let desc = pool.get_message_by_name("google.protobuf.Any").unwrap();

        let mut any = DynamicMessage::new(desc.clone());
        any.transcode_from(&prost_types::Any {
            type_url: "type.googleapis.com/test.Point".to_owned(),
            value: b"\x08\x07\x12\x05hello".to_vec(),
        })
        .unwrap();

        assert_eq!(
            any.to_text_format(),
            r#"[type.googleapis.com/test.Point]{x:7,y:"hello"}"#
        );
        assert_eq!(
            any.to_text_format_with_options(
                &protodyn::text_format::FormatOptions::new().expand_any(false)
            ),
            r#"type_url:"type.googleapis.com/test.Point",value:"\010\007\022\005hello""#
        );

        let parsed = DynamicMessage::parse_text_format(
            desc,
            "[type.googleapis.com/test.Point] { x: 7 y: \"hello\" }",
        )
        .unwrap();
        assert_eq!(parsed, any);
    }

    #[test]
    fn extensions_use_bracketed_names() {
        let pool = test_pool();
        let desc = pool.get_message_by_name("test2.Extendee").unwrap();
        let ext = pool.get_extension_by_name("test2.ext_string").unwrap();

        let mut message = DynamicMessage::new(desc.clone());
        message.set_extension(&ext, Value::String("extended".to_owned()));

        assert_eq!(message.to_text_format(), r#"[test2.ext_string]:"extended""#);

        let parsed =
            DynamicMessage::parse_text_format(desc, "[test2.ext_string]: 'extended'").unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn unknown_fields_print_by_number() {
        let mut writer = new_message("test2.Writer");
        writer.set_field_by_name("extra", Value::String("u".to_owned()));
        let bytes = writer.encode_to_vec().unwrap();

        let reader_desc = test_pool().get_message_by_name("test2.Reader").unwrap();
        let reader = DynamicMessage::decode(reader_desc, bytes.as_slice()).unwrap();

        assert_eq!(reader.to_text_format(), "");
        assert_eq!(
            reader.to_text_format_with_options(
                &protodyn::text_format::FormatOptions::new().skip_unknown_fields(false)
            ),
            r#"1000:"u""#
        );
    }

    #[test]
    fn floats() {
        let mut message = new_message("test.Scalars");
        message.set_field_by_name("double", Value::F64(2.0));
        message.set_field_by_name("float", Value::F32(f32::NEG_INFINITY));

        assert_eq!(message.to_text_format(), "double:2.0,float:-inf");

        let parsed = DynamicMessage::parse_text_format(
            message.descriptor(),
            "double: 2.0 float: -Infinity",
        )
        .unwrap();
        assert_eq!(parsed, message);

        let parsed =
            DynamicMessage::parse_text_format(message.descriptor(), "double: nan").unwrap();
        assert!(parsed
            .get_field_by_name("double")
            .unwrap()
            .as_f64()
            .unwrap()
            .is_nan());
    }
}
