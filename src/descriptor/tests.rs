use prost_types::{
    field_descriptor_proto::{Label, Type},
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MessageOptions,
};

use crate::{Cardinality, DescriptorPool, Kind};

fn scalar_field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        r#type: Some(ty as i32),
        label: Some(Label::Optional as i32),
        ..Default::default()
    }
}

fn message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        r#type: Some(Type::Message as i32),
        type_name: Some(type_name.to_owned()),
        label: Some(Label::Optional as i32),
        ..Default::default()
    }
}

fn test_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("test.proto".to_owned()),
        package: Some("my.package".to_owned()),
        syntax: Some("proto3".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("MyMessage".to_owned()),
            field: vec![
                scalar_field("foo", 1, Type::Int32),
                scalar_field("bar_baz", 2, Type::String),
                message_field("nested", 3, ".my.package.MyMessage.Nested"),
            ],
            nested_type: vec![DescriptorProto {
                name: Some("Nested".to_owned()),
                field: vec![scalar_field("value", 1, Type::Uint64)],
                ..Default::default()
            }],
            ..Default::default()
        }],
        enum_type: vec![EnumDescriptorProto {
            name: Some("MyEnum".to_owned()),
            value: vec![
                EnumValueDescriptorProto {
                    name: Some("MY_ENUM_UNSPECIFIED".to_owned()),
                    number: Some(0),
                    ..Default::default()
                },
                EnumValueDescriptorProto {
                    name: Some("MY_ENUM_ONE".to_owned()),
                    number: Some(1),
                    ..Default::default()
                },
                EnumValueDescriptorProto {
                    name: Some("MY_ENUM_ALIAS".to_owned()),
                    number: Some(1),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }],
        ..Default::default()
    }
}

#[test]
fn build_and_look_up() {
    let pool = DescriptorPool::from_file_descriptor_set(prost_types::FileDescriptorSet {
        file: vec![test_file()],
    })
    .unwrap();

    let message = pool.get_message_by_name("my.package.MyMessage").unwrap();
    assert_eq!(message.name(), "MyMessage");
    assert_eq!(message.full_name(), "my.package.MyMessage");
    assert_eq!(message.package_name(), "my.package");
    assert_eq!(message.parent_file().name(), "test.proto");

    let foo = message.get_field(1).unwrap();
    assert_eq!(foo.name(), "foo");
    assert_eq!(foo.kind(), Kind::Int32);
    assert_eq!(foo.cardinality(), Cardinality::Optional);
    assert!(!foo.supports_presence());

    let bar = message.get_field_by_name("bar_baz").unwrap();
    assert_eq!(bar.json_name(), "barBaz");
    assert_eq!(message.get_field_by_json_name("barBaz").unwrap(), bar);
    assert_eq!(message.get_field_by_json_name("bar_baz"), None);

    let nested = message.get_field_by_name("nested").unwrap();
    assert!(nested.supports_presence());
    match nested.kind() {
        Kind::Message(nested) => assert_eq!(nested.full_name(), "my.package.MyMessage.Nested"),
        kind => panic!("unexpected kind {:?}", kind),
    }
    assert_eq!(
        nested.kind().as_message().unwrap().parent_message(),
        Some(message.clone())
    );
}

#[test]
fn message_type_url() {
    let pool = DescriptorPool::from_file_descriptor_set(prost_types::FileDescriptorSet {
        file: vec![test_file()],
    })
    .unwrap();

    let message = pool
        .get_message_by_type_url("type.googleapis.com/my.package.MyMessage")
        .unwrap();
    assert_eq!(message.full_name(), "my.package.MyMessage");
    assert!(pool.get_message_by_type_url("my.package.MyMessage").is_none());
}

#[test]
fn enum_alias_reverse_lookup_returns_first_declared() {
    let pool = DescriptorPool::from_file_descriptor_set(prost_types::FileDescriptorSet {
        file: vec![test_file()],
    })
    .unwrap();

    let enum_ = pool.get_enum_by_name("my.package.MyEnum").unwrap();
    assert_eq!(enum_.get_value(1).unwrap().name(), "MY_ENUM_ONE");
    assert_eq!(
        enum_.get_value_by_name("MY_ENUM_ALIAS").unwrap().number(),
        1
    );
    assert_eq!(enum_.default_value().name(), "MY_ENUM_UNSPECIFIED");
}

#[test]
fn conflicting_file_rejected() {
    let mut pool = DescriptorPool::new();
    pool.add_file_descriptor_proto(test_file()).unwrap();

    // Re-adding the identical file is a no-op.
    pool.add_file_descriptor_proto(test_file()).unwrap();

    let mut conflicting = test_file();
    conflicting.package = Some("other.package".to_owned());
    let err = pool.add_file_descriptor_proto(conflicting).unwrap_err();
    assert!(err.to_string().contains("test.proto"));
}

#[test]
fn name_collision_names_both_files() {
    let mut pool = DescriptorPool::new();
    pool.add_file_descriptor_proto(test_file()).unwrap();

    let mut duplicate = test_file();
    duplicate.name = Some("test2.proto".to_owned());
    let err = pool.add_file_descriptor_proto(duplicate).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("my.package.MyMessage"), "{}", message);
    assert!(message.contains("test.proto"), "{}", message);
    assert!(message.contains("test2.proto"), "{}", message);

    // The failed registration must leave the pool untouched.
    assert_eq!(pool.files().len(), 1);
    assert!(pool.get_message_by_name("my.package.MyMessage").is_some());
}

#[test]
fn missing_import_rejected() {
    let file = FileDescriptorProto {
        name: Some("importer.proto".to_owned()),
        dependency: vec!["missing.proto".to_owned()],
        ..Default::default()
    };

    let err = DescriptorPool::from_file_descriptor_set(prost_types::FileDescriptorSet {
        file: vec![file],
    })
    .unwrap_err();
    assert!(err.to_string().contains("missing.proto"));
}

#[test]
fn reference_requires_import() {
    let dep = FileDescriptorProto {
        name: Some("dep.proto".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("Dep".to_owned()),
            ..Default::default()
        }],
        ..Default::default()
    };
    let importer = FileDescriptorProto {
        name: Some("importer.proto".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("Importer".to_owned()),
            field: vec![message_field("dep", 1, ".Dep")],
            ..Default::default()
        }],
        ..Default::default()
    };

    let mut pool = DescriptorPool::new();
    pool.add_file_descriptor_proto(dep.clone()).unwrap();
    let err = pool.add_file_descriptor_proto(importer.clone()).unwrap_err();
    assert!(err.to_string().contains("not imported"), "{}", err);

    let importer = FileDescriptorProto {
        dependency: vec!["dep.proto".to_owned()],
        ..importer
    };
    pool.add_file_descriptor_proto(importer).unwrap();
    let message = pool.get_message_by_name("Importer").unwrap();
    assert_eq!(
        message.get_field(1).unwrap().kind().as_message().unwrap().full_name(),
        "Dep"
    );
}

#[test]
fn transitive_public_imports_are_visible() {
    let root = FileDescriptorProto {
        name: Some("root.proto".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("Root".to_owned()),
            ..Default::default()
        }],
        ..Default::default()
    };
    let middle = FileDescriptorProto {
        name: Some("middle.proto".to_owned()),
        dependency: vec!["root.proto".to_owned()],
        public_dependency: vec![0],
        ..Default::default()
    };
    let leaf = FileDescriptorProto {
        name: Some("leaf.proto".to_owned()),
        dependency: vec!["middle.proto".to_owned()],
        message_type: vec![DescriptorProto {
            name: Some("Leaf".to_owned()),
            field: vec![message_field("root", 1, ".Root")],
            ..Default::default()
        }],
        ..Default::default()
    };

    let mut pool = DescriptorPool::new();
    pool.add_file_descriptor_protos([root, middle, leaf]).unwrap();
    assert!(pool.get_message_by_name("Leaf").is_some());
}

#[test]
fn map_fields() {
    let file = FileDescriptorProto {
        name: Some("map.proto".to_owned()),
        syntax: Some("proto3".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("WithMap".to_owned()),
            field: vec![FieldDescriptorProto {
                name: Some("values".to_owned()),
                number: Some(1),
                r#type: Some(Type::Message as i32),
                type_name: Some(".WithMap.ValuesEntry".to_owned()),
                label: Some(Label::Repeated as i32),
                ..Default::default()
            }],
            nested_type: vec![DescriptorProto {
                name: Some("ValuesEntry".to_owned()),
                field: vec![
                    scalar_field("key", 1, Type::Int32),
                    scalar_field("value", 2, Type::String),
                ],
                options: Some(MessageOptions {
                    map_entry: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };

    let pool =
        DescriptorPool::from_file_descriptor_set(prost_types::FileDescriptorSet { file: vec![file] })
            .unwrap();
    let message = pool.get_message_by_name("WithMap").unwrap();
    let field = message.get_field_by_name("values").unwrap();
    assert!(field.is_map());
    assert!(!field.is_list());

    let entry = field.kind().as_message().unwrap().clone();
    assert!(entry.is_map_entry());
    assert_eq!(entry.map_entry_key_field().kind(), Kind::Int32);
    assert_eq!(entry.map_entry_value_field().kind(), Kind::String);
}

#[test]
fn field_number_validation() {
    let mut invalid = test_file();
    invalid.message_type[0].field[0].number = Some(19_500);
    let err = DescriptorPool::from_file_descriptor_set(prost_types::FileDescriptorSet {
        file: vec![invalid],
    })
    .unwrap_err();
    assert!(err.to_string().contains("19500"), "{}", err);

    let mut duplicate = test_file();
    duplicate.message_type[0].field[1].number = Some(1);
    let err = DescriptorPool::from_file_descriptor_set(prost_types::FileDescriptorSet {
        file: vec![duplicate],
    })
    .unwrap_err();
    assert!(err.to_string().contains("already used"), "{}", err);
}

#[test]
fn global_pool_contains_well_known_types() {
    let pool = DescriptorPool::global();
    for name in [
        "google.protobuf.Any",
        "google.protobuf.Timestamp",
        "google.protobuf.Duration",
        "google.protobuf.Struct",
        "google.protobuf.Value",
        "google.protobuf.ListValue",
        "google.protobuf.Empty",
        "google.protobuf.FieldMask",
        "google.protobuf.BoolValue",
        "google.protobuf.BytesValue",
        "google.protobuf.FileDescriptorProto",
    ] {
        assert!(pool.get_message_by_name(name).is_some(), "{} missing", name);
    }
    assert!(pool.get_enum_by_name("google.protobuf.NullValue").is_some());

    let timestamp = pool
        .get_message_by_name("google.protobuf.Timestamp")
        .unwrap();
    assert_eq!(timestamp.parent_file().syntax(), crate::Syntax::Proto3);
    assert_eq!(timestamp.get_field(1).unwrap().name(), "seconds");
    assert_eq!(timestamp.get_field(2).unwrap().name(), "nanos");
}
