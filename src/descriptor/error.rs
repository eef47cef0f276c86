use std::fmt;

/// An error that may occur while building a [`DescriptorPool`][crate::DescriptorPool].
#[derive(Debug)]
pub struct DescriptorError {
    kind: DescriptorErrorKind,
}

#[derive(Debug)]
enum DescriptorErrorKind {
    DecodeFileDescriptorSet {
        err: prost::DecodeError,
    },
    FileAlreadyExists {
        name: String,
    },
    NameAlreadyExists {
        name: String,
        file: String,
        other_file: String,
    },
    ImportNotFound {
        name: String,
        file: String,
    },
    NameNotFound {
        name: String,
        file: String,
    },
    NameNotVisible {
        name: String,
        file: String,
        defining_file: String,
    },
    InvalidType {
        name: String,
        expected: String,
        file: String,
    },
    UnknownSyntax {
        syntax: String,
        file: String,
    },
    InvalidFieldNumber {
        number: i32,
        field: String,
    },
    DuplicateFieldNumber {
        number: u32,
        field: String,
        other_field: String,
    },
    ReservedFieldNumber {
        number: u32,
        field: String,
    },
    ReservedFieldName {
        field: String,
    },
    InvalidExtensionNumber {
        number: u32,
        extension: String,
        extendee: String,
    },
    InvalidMapEntry {
        name: String,
    },
    InvalidDefaultValue {
        field: String,
        value: String,
    },
    InvalidOneofIndex {
        field: String,
    },
    EmptyEnum {
        name: String,
    },
}

impl DescriptorError {
    fn new(kind: DescriptorErrorKind) -> Self {
        DescriptorError { kind }
    }

    pub(super) fn decode_file_descriptor_set(err: prost::DecodeError) -> Self {
        Self::new(DescriptorErrorKind::DecodeFileDescriptorSet { err })
    }

    pub(super) fn file_already_exists(name: impl ToString) -> Self {
        Self::new(DescriptorErrorKind::FileAlreadyExists {
            name: name.to_string(),
        })
    }

    pub(super) fn name_already_exists(
        name: impl ToString,
        file: impl ToString,
        other_file: impl ToString,
    ) -> Self {
        Self::new(DescriptorErrorKind::NameAlreadyExists {
            name: name.to_string(),
            file: file.to_string(),
            other_file: other_file.to_string(),
        })
    }

    pub(super) fn import_not_found(name: impl ToString, file: impl ToString) -> Self {
        Self::new(DescriptorErrorKind::ImportNotFound {
            name: name.to_string(),
            file: file.to_string(),
        })
    }

    pub(super) fn name_not_found(name: impl ToString, file: impl ToString) -> Self {
        Self::new(DescriptorErrorKind::NameNotFound {
            name: name.to_string(),
            file: file.to_string(),
        })
    }

    pub(super) fn name_not_visible(
        name: impl ToString,
        file: impl ToString,
        defining_file: impl ToString,
    ) -> Self {
        Self::new(DescriptorErrorKind::NameNotVisible {
            name: name.to_string(),
            file: file.to_string(),
            defining_file: defining_file.to_string(),
        })
    }

    pub(super) fn invalid_type(
        name: impl ToString,
        expected: impl ToString,
        file: impl ToString,
    ) -> Self {
        Self::new(DescriptorErrorKind::InvalidType {
            name: name.to_string(),
            expected: expected.to_string(),
            file: file.to_string(),
        })
    }

    pub(super) fn unknown_syntax(syntax: impl ToString, file: impl ToString) -> Self {
        Self::new(DescriptorErrorKind::UnknownSyntax {
            syntax: syntax.to_string(),
            file: file.to_string(),
        })
    }

    pub(super) fn invalid_field_number(number: i32, field: impl ToString) -> Self {
        Self::new(DescriptorErrorKind::InvalidFieldNumber {
            number,
            field: field.to_string(),
        })
    }

    pub(super) fn duplicate_field_number(
        number: u32,
        field: impl ToString,
        other_field: impl ToString,
    ) -> Self {
        Self::new(DescriptorErrorKind::DuplicateFieldNumber {
            number,
            field: field.to_string(),
            other_field: other_field.to_string(),
        })
    }

    pub(super) fn reserved_field_number(number: u32, field: impl ToString) -> Self {
        Self::new(DescriptorErrorKind::ReservedFieldNumber {
            number,
            field: field.to_string(),
        })
    }

    pub(super) fn reserved_field_name(field: impl ToString) -> Self {
        Self::new(DescriptorErrorKind::ReservedFieldName {
            field: field.to_string(),
        })
    }

    pub(super) fn invalid_extension_number(
        number: u32,
        extension: impl ToString,
        extendee: impl ToString,
    ) -> Self {
        Self::new(DescriptorErrorKind::InvalidExtensionNumber {
            number,
            extension: extension.to_string(),
            extendee: extendee.to_string(),
        })
    }

    pub(super) fn invalid_map_entry(name: impl ToString) -> Self {
        Self::new(DescriptorErrorKind::InvalidMapEntry {
            name: name.to_string(),
        })
    }

    pub(super) fn invalid_default_value(field: impl ToString, value: impl ToString) -> Self {
        Self::new(DescriptorErrorKind::InvalidDefaultValue {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    pub(super) fn invalid_oneof_index(field: impl ToString) -> Self {
        Self::new(DescriptorErrorKind::InvalidOneofIndex {
            field: field.to_string(),
        })
    }

    pub(super) fn empty_enum(name: impl ToString) -> Self {
        Self::new(DescriptorErrorKind::EmptyEnum {
            name: name.to_string(),
        })
    }
}

impl std::error::Error for DescriptorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            DescriptorErrorKind::DecodeFileDescriptorSet { err } => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DescriptorErrorKind::DecodeFileDescriptorSet { .. } => {
                write!(f, "failed to decode file descriptor set")
            }
            DescriptorErrorKind::FileAlreadyExists { name } => {
                write!(
                    f,
                    "a different file named '{}' is already registered; duplicate files must match exactly",
                    name
                )
            }
            DescriptorErrorKind::NameAlreadyExists {
                name,
                file,
                other_file,
            } => write!(
                f,
                "the name '{}' in '{}' conflicts with an existing definition in '{}'",
                name, file, other_file
            ),
            DescriptorErrorKind::ImportNotFound { name, file } => {
                write!(f, "the import '{}' of '{}' was not found", name, file)
            }
            DescriptorErrorKind::NameNotFound { name, file } => {
                write!(f, "the name '{}' referenced in '{}' was not found", name, file)
            }
            DescriptorErrorKind::NameNotVisible {
                name,
                file,
                defining_file,
            } => write!(
                f,
                "'{}' is defined in '{}', which is not imported by '{}'",
                name, defining_file, file
            ),
            DescriptorErrorKind::InvalidType {
                name,
                expected,
                file,
            } => write!(
                f,
                "'{}' referenced in '{}' is not {}",
                name, file, expected
            ),
            DescriptorErrorKind::UnknownSyntax { syntax, file } => {
                write!(f, "the syntax '{}' of '{}' is not recognized", syntax, file)
            }
            DescriptorErrorKind::InvalidFieldNumber { number, field } => {
                write!(f, "the number {} of field '{}' is invalid", number, field)
            }
            DescriptorErrorKind::DuplicateFieldNumber {
                number,
                field,
                other_field,
            } => write!(
                f,
                "the number {} of field '{}' is already used by '{}'",
                number, field, other_field
            ),
            DescriptorErrorKind::ReservedFieldNumber { number, field } => {
                write!(f, "the number {} of field '{}' is reserved", number, field)
            }
            DescriptorErrorKind::ReservedFieldName { field } => {
                write!(f, "the name of field '{}' is reserved", field)
            }
            DescriptorErrorKind::InvalidExtensionNumber {
                number,
                extension,
                extendee,
            } => write!(
                f,
                "the number {} of extension '{}' is not in an extension range of '{}'",
                number, extension, extendee
            ),
            DescriptorErrorKind::InvalidMapEntry { name } => {
                write!(f, "the map entry message '{}' is invalid", name)
            }
            DescriptorErrorKind::InvalidDefaultValue { field, value } => {
                write!(
                    f,
                    "the default value '{}' of field '{}' is invalid",
                    value, field
                )
            }
            DescriptorErrorKind::InvalidOneofIndex { field } => {
                write!(f, "the oneof index of field '{}' is invalid", field)
            }
            DescriptorErrorKind::EmptyEnum { name } => {
                write!(f, "the enum '{}' must have at least one value", name)
            }
        }
    }
}
