use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap, HashSet},
    iter,
    sync::Arc,
};

use prost_types::{
    field_descriptor_proto, DescriptorProto, EnumDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, ServiceDescriptorProto,
};

use crate::{
    descriptor::{
        to_index, Definition, DefinitionKind, DescriptorPoolInner, EnumDescriptorInner, EnumIndex,
        EnumValueDescriptorInner, ExtensionDescriptorInner, ExtensionIndex, FieldDescriptorInner,
        FileDescriptorInner, FileIndex, Identity, KindIndex, MessageDescriptorInner, MessageIndex,
        MethodDescriptorInner, OneofDescriptorInner, ServiceDescriptorInner, ServiceIndex,
        MAP_ENTRY_KEY_NUMBER, MAP_ENTRY_VALUE_NUMBER, RESERVED_FIELD_NUMBERS, VALID_FIELD_NUMBERS,
    },
    Cardinality, DescriptorError, DescriptorPool, Syntax, Value,
};

#[derive(Clone, Copy)]
struct DescriptorPoolOffsets {
    file: FileIndex,
    message: MessageIndex,
    enum_: EnumIndex,
    extension: ExtensionIndex,
    service: ServiceIndex,
}

impl DescriptorPoolOffsets {
    fn new(inner: &DescriptorPoolInner) -> Self {
        DescriptorPoolOffsets {
            file: to_index(inner.files.len()),
            message: to_index(inner.messages.len()),
            enum_: to_index(inner.enums.len()),
            extension: to_index(inner.extensions.len()),
            service: to_index(inner.services.len()),
        }
    }

    fn rollback(&self, inner: &mut DescriptorPoolInner) {
        inner.files.truncate(self.file as usize);
        inner.messages.truncate(self.message as usize);
        inner.enums.truncate(self.enum_ as usize);
        inner.extensions.truncate(self.extension as usize);
        inner.services.truncate(self.service as usize);
        let offsets = *self;
        inner.names.retain(|_, def| match def.kind {
            DefinitionKind::Package => def.file < offsets.file,
            DefinitionKind::Message(index)
            | DefinitionKind::Field(index)
            | DefinitionKind::Oneof(index) => index < offsets.message,
            DefinitionKind::Enum(index) | DefinitionKind::EnumValue(index) => index < offsets.enum_,
            DefinitionKind::Extension(index) => index < offsets.extension,
            DefinitionKind::Service(index) | DefinitionKind::Method(index) => {
                index < offsets.service
            }
        });
        inner.file_names.retain(|_, &mut file| file < offsets.file);
        for message in &mut inner.messages {
            message.extensions.retain(|&ext| ext < offsets.extension);
            message
                .extension_numbers
                .retain(|_, &mut ext| ext < offsets.extension);
        }
    }
}

/// Work items deferred to the resolution pass, in declaration order.
#[derive(Default)]
struct ResolveQueue {
    fields: Vec<FieldToResolve>,
    extensions: Vec<ExtensionToResolve>,
    methods: Vec<MethodToResolve>,
}

struct FieldToResolve {
    file: FileIndex,
    message: MessageIndex,
    scope: String,
    field: FieldDescriptorProto,
}

struct ExtensionToResolve {
    file: FileIndex,
    index: ExtensionIndex,
    scope: String,
    field: FieldDescriptorProto,
}

struct MethodToResolve {
    file: FileIndex,
    service: ServiceIndex,
    scope: String,
    name: String,
    input: String,
    output: String,
    client_streaming: bool,
    server_streaming: bool,
}

impl DescriptorPool {
    pub(super) fn build_files<I>(&mut self, files: I) -> Result<(), DescriptorError>
    where
        I: IntoIterator<Item = FileDescriptorProto>,
    {
        let mut deduped = Vec::new();
        let mut batch_names = HashSet::new();
        for file in files {
            if let Some(&existing) = self.inner.file_names.get(file.name()) {
                if self.inner.files[existing as usize].raw != file {
                    return Err(DescriptorError::file_already_exists(file.name()));
                }
            } else if batch_names.insert(file.name().to_owned()) {
                deduped.push(file);
            }
        }

        if deduped.is_empty() {
            return Ok(());
        }

        let offsets = DescriptorPoolOffsets::new(&self.inner);
        let inner = Arc::make_mut(&mut self.inner);
        let result = build_deduped_files(inner, offsets, deduped);
        if result.is_err() {
            offsets.rollback(inner);
        }
        result
    }
}

fn build_deduped_files(
    inner: &mut DescriptorPoolInner,
    offsets: DescriptorPoolOffsets,
    files: Vec<FileDescriptorProto>,
) -> Result<(), DescriptorError> {
    let mut queue = ResolveQueue::default();
    for file in files {
        collect_file(inner, file, &mut queue)?;
    }

    resolve_dependencies(inner, offsets.file)?;

    for item in queue.fields {
        resolve_field(inner, item)?;
    }
    for item in queue.extensions {
        resolve_extension(inner, item)?;
    }
    for item in queue.methods {
        resolve_method(inner, item)?;
    }

    // Map entry shapes can only be checked once every field is resolved,
    // since the synthetic entry message is collected after the field that
    // references it.
    check_map_entries(inner, offsets.message)?;

    Ok(())
}

/// First pass: allocate descriptors for every definition in the file and
/// claim their fully qualified names. Cross-references are resolved later, so
/// mutually recursive messages need no special treatment.
fn collect_file(
    inner: &mut DescriptorPoolInner,
    file: FileDescriptorProto,
    queue: &mut ResolveQueue,
) -> Result<(), DescriptorError> {
    let file_index = to_index(inner.files.len());
    let syntax = match file.syntax.as_deref() {
        None | Some("") | Some("proto2") => Syntax::Proto2,
        Some("proto3") => Syntax::Proto3,
        Some(other) => return Err(DescriptorError::unknown_syntax(other, file.name())),
    };

    inner.file_names.insert(file.name().into(), file_index);
    inner.files.push(FileDescriptorInner {
        syntax,
        raw: file,
        dependencies: HashSet::new(),
        public_dependencies: Vec::new(),
        weak_dependencies: Vec::new(),
    });

    let raw = inner.files[file_index as usize].raw.clone();
    add_package_names(inner, file_index, raw.package())?;
    for message in &raw.message_type {
        collect_message(inner, file_index, raw.package(), message, None, queue)?;
    }
    for enum_ in &raw.enum_type {
        collect_enum(inner, file_index, raw.package(), enum_, None)?;
    }
    for extension in &raw.extension {
        collect_extension(inner, file_index, raw.package(), extension, None, queue)?;
    }
    for service in &raw.service {
        collect_service(inner, file_index, raw.package(), service, queue)?;
    }
    Ok(())
}

fn add_package_names(
    inner: &mut DescriptorPoolInner,
    file: FileIndex,
    package: &str,
) -> Result<(), DescriptorError> {
    if package.is_empty() {
        return Ok(());
    }

    let mut end = 0;
    loop {
        end = match package[end..].find('.') {
            Some(dot) => end + dot,
            None => package.len(),
        };
        let name = &package[..end];
        match inner.names.get(name) {
            None => {
                inner.names.insert(
                    name.into(),
                    Definition {
                        file,
                        kind: DefinitionKind::Package,
                    },
                );
            }
            Some(def) => {
                if !matches!(def.kind, DefinitionKind::Package) {
                    let other = def.file;
                    return Err(DescriptorError::name_already_exists(
                        name,
                        file_name(inner, file),
                        file_name(inner, other),
                    ));
                }
            }
        }
        if end == package.len() {
            return Ok(());
        }
        end += 1;
    }
}

fn add_name(
    inner: &mut DescriptorPoolInner,
    file: FileIndex,
    full_name: &str,
    kind: DefinitionKind,
) -> Result<(), DescriptorError> {
    if let Some(def) = inner.names.get(full_name) {
        let other = def.file;
        return Err(DescriptorError::name_already_exists(
            full_name,
            file_name(inner, file),
            file_name(inner, other),
        ));
    }
    inner.names.insert(full_name.into(), Definition { file, kind });
    Ok(())
}

fn file_name(inner: &DescriptorPoolInner, file: FileIndex) -> &str {
    inner.files[file as usize].raw.name()
}

fn collect_message(
    inner: &mut DescriptorPoolInner,
    file: FileIndex,
    scope: &str,
    message: &DescriptorProto,
    parent: Option<MessageIndex>,
    queue: &mut ResolveQueue,
) -> Result<(), DescriptorError> {
    let full_name = join_name(scope, message.name());
    let message_index = to_index(inner.messages.len());
    add_name(inner, file, &full_name, DefinitionKind::Message(message_index))?;

    let mut oneofs = Vec::with_capacity(message.oneof_decl.len());
    for oneof in &message.oneof_decl {
        let oneof_full_name = join_name(&full_name, oneof.name());
        add_name(
            inner,
            file,
            &oneof_full_name,
            DefinitionKind::Oneof(message_index),
        )?;
        oneofs.push(OneofDescriptorInner {
            id: Identity::new(file, &oneof_full_name, oneof.name()),
            fields: Vec::new(),
        });
    }

    let options = message.options.as_ref();
    inner.messages.push(MessageDescriptorInner {
        id: Identity::new(file, &full_name, message.name()),
        parent,
        fields: Vec::new(),
        field_numbers: BTreeMap::new(),
        field_names: HashMap::new(),
        field_json_names: HashMap::new(),
        oneofs,
        extensions: Vec::new(),
        extension_numbers: HashMap::new(),
        extension_ranges: message
            .extension_range
            .iter()
            .map(|range| range.start() as u32..range.end() as u32)
            .collect(),
        reserved_ranges: message
            .reserved_range
            .iter()
            .map(|range| range.start() as u32..range.end() as u32)
            .collect(),
        reserved_names: message
            .reserved_name
            .iter()
            .map(|n| n.as_str().into())
            .collect(),
        required_numbers: Vec::new(),
        is_map_entry: options.map(|o| o.map_entry()).unwrap_or(false),
        is_message_set: options.map(|o| o.message_set_wire_format()).unwrap_or(false),
    });

    for field in &message.field {
        add_name(
            inner,
            file,
            &join_name(&full_name, field.name()),
            DefinitionKind::Field(message_index),
        )?;
        queue.fields.push(FieldToResolve {
            file,
            message: message_index,
            scope: full_name.clone(),
            field: field.clone(),
        });
    }

    for nested in &message.nested_type {
        collect_message(inner, file, &full_name, nested, Some(message_index), queue)?;
    }
    for enum_ in &message.enum_type {
        collect_enum(inner, file, &full_name, enum_, Some(message_index))?;
    }
    for extension in &message.extension {
        collect_extension(inner, file, &full_name, extension, Some(message_index), queue)?;
    }

    Ok(())
}

/// Enums carry no cross-references, so they are built in full during the
/// collect pass. Values are scoped to the enum's *parent*, following the C++
/// scoping rule.
fn collect_enum(
    inner: &mut DescriptorPoolInner,
    file: FileIndex,
    scope: &str,
    enum_: &EnumDescriptorProto,
    parent: Option<MessageIndex>,
) -> Result<(), DescriptorError> {
    let full_name = join_name(scope, enum_.name());
    let enum_index = to_index(inner.enums.len());
    add_name(inner, file, &full_name, DefinitionKind::Enum(enum_index))?;

    if enum_.value.is_empty() {
        return Err(DescriptorError::empty_enum(&full_name));
    }

    let mut values = Vec::with_capacity(enum_.value.len());
    let mut value_names = HashMap::with_capacity(enum_.value.len());
    for value in &enum_.value {
        let value_full_name = join_name(scope, value.name());
        add_name(
            inner,
            file,
            &value_full_name,
            DefinitionKind::EnumValue(enum_index),
        )?;
        value_names.insert(value.name().into(), to_index(values.len()));
        values.push(EnumValueDescriptorInner {
            id: Identity::new(file, &value_full_name, value.name()),
            number: value.number(),
        });
    }

    // A stable sort keeps aliases in declaration order, so reverse lookups
    // return the first declared name for a number.
    let mut value_numbers: Vec<(i32, u32)> = values
        .iter()
        .enumerate()
        .map(|(index, value)| (value.number, to_index(index)))
        .collect();
    value_numbers.sort_by_key(|&(number, _)| number);

    inner.enums.push(EnumDescriptorInner {
        id: Identity::new(file, &full_name, enum_.name()),
        parent,
        values,
        value_numbers,
        value_names,
        reserved_ranges: enum_
            .reserved_range
            .iter()
            .map(|range| range.start()..=range.end())
            .collect(),
        reserved_names: enum_
            .reserved_name
            .iter()
            .map(|n| n.as_str().into())
            .collect(),
    });
    Ok(())
}

fn collect_extension(
    inner: &mut DescriptorPoolInner,
    file: FileIndex,
    scope: &str,
    extension: &FieldDescriptorProto,
    parent: Option<MessageIndex>,
    queue: &mut ResolveQueue,
) -> Result<(), DescriptorError> {
    let full_name = join_name(scope, extension.name());
    let extension_index = to_index(inner.extensions.len());
    add_name(
        inner,
        file,
        &full_name,
        DefinitionKind::Extension(extension_index),
    )?;

    // The kind and extendee are placeholders until the resolve pass.
    inner.extensions.push(ExtensionDescriptorInner {
        id: Identity::new(file, &full_name, extension.name()),
        parent,
        number: extension.number() as u32,
        json_name: format!("[{}]", full_name).into(),
        extendee: 0,
        kind: KindIndex::Bool,
        is_packed: false,
        cardinality: Cardinality::Optional,
        default: None,
    });
    queue.extensions.push(ExtensionToResolve {
        file,
        index: extension_index,
        scope: scope.to_owned(),
        field: extension.clone(),
    });
    Ok(())
}

fn collect_service(
    inner: &mut DescriptorPoolInner,
    file: FileIndex,
    scope: &str,
    service: &ServiceDescriptorProto,
    queue: &mut ResolveQueue,
) -> Result<(), DescriptorError> {
    let full_name = join_name(scope, service.name());
    let service_index = to_index(inner.services.len());
    add_name(inner, file, &full_name, DefinitionKind::Service(service_index))?;

    for method in &service.method {
        let method_full_name = join_name(&full_name, method.name());
        add_name(
            inner,
            file,
            &method_full_name,
            DefinitionKind::Method(service_index),
        )?;
        queue.methods.push(MethodToResolve {
            file,
            service: service_index,
            scope: full_name.clone(),
            name: method.name().to_owned(),
            input: method.input_type().to_owned(),
            output: method.output_type().to_owned(),
            client_streaming: method.client_streaming(),
            server_streaming: method.server_streaming(),
        });
    }

    inner.services.push(ServiceDescriptorInner {
        id: Identity::new(file, &full_name, service.name()),
        methods: Vec::new(),
    });
    Ok(())
}

/// Resolve import paths to file indexes, then compute each new file's visible
/// set: itself, its direct imports, and the transitive public imports of
/// those.
fn resolve_dependencies(
    inner: &mut DescriptorPoolInner,
    first_file: FileIndex,
) -> Result<(), DescriptorError> {
    for index in first_file as usize..inner.files.len() {
        let mut dependencies = Vec::with_capacity(inner.files[index].raw.dependency.len());
        for import in &inner.files[index].raw.dependency {
            match inner.file_names.get(import.as_str()) {
                Some(&dependency) => dependencies.push(dependency),
                None => {
                    return Err(DescriptorError::import_not_found(
                        import,
                        inner.files[index].raw.name(),
                    ))
                }
            }
        }

        let public_dependencies = inner.files[index]
            .raw
            .public_dependency
            .iter()
            .filter_map(|&i| dependencies.get(i as usize).copied())
            .collect();
        let weak_dependencies = inner.files[index]
            .raw
            .weak_dependency
            .iter()
            .filter_map(|&i| dependencies.get(i as usize).copied())
            .collect();

        inner.files[index].public_dependencies = public_dependencies;
        inner.files[index].weak_dependencies = weak_dependencies;
        inner.files[index].dependencies = iter::once(to_index(index))
            .chain(dependencies.iter().copied())
            .collect();
    }

    for index in first_file as usize..inner.files.len() {
        let mut visible = inner.files[index].dependencies.clone();
        let mut stack: Vec<FileIndex> = visible.iter().copied().collect();
        while let Some(next) = stack.pop() {
            for &public in &inner.files[next as usize].public_dependencies {
                if visible.insert(public) {
                    stack.push(public);
                }
            }
        }
        inner.files[index].dependencies = visible;
    }

    Ok(())
}

fn resolve_field(
    inner: &mut DescriptorPoolInner,
    item: FieldToResolve,
) -> Result<(), DescriptorError> {
    let FieldToResolve {
        file,
        message,
        scope,
        field,
    } = item;
    let syntax = inner.files[file as usize].syntax;
    let full_name = join_name(&scope, field.name());

    let number = field.number() as u32;
    if !VALID_FIELD_NUMBERS.contains(&number) || RESERVED_FIELD_NUMBERS.contains(&number) {
        return Err(DescriptorError::invalid_field_number(
            field.number(),
            &full_name,
        ));
    }

    let kind = resolve_field_kind(inner, file, &scope, &field)?;
    let cardinality = cardinality(&field);

    check_reserved(inner, message, number, field.name(), &full_name)?;

    let oneof = match field.oneof_index {
        Some(index) => {
            if index < 0 || index as usize >= inner.messages[message as usize].oneofs.len() {
                return Err(DescriptorError::invalid_oneof_index(&full_name));
            }
            Some(index as u32)
        }
        None => None,
    };

    let default = match field.default_value.as_deref() {
        Some(value) => Some(
            parse_default_value(inner, kind, value)
                .ok_or_else(|| DescriptorError::invalid_default_value(&full_name, value))?,
        ),
        None => None,
    };

    let json_name: Box<str> = match field.json_name.as_deref() {
        Some(json_name) => json_name.into(),
        None => to_json_name(field.name()).into(),
    };

    let supports_presence = cardinality != Cardinality::Repeated
        && (syntax == Syntax::Proto2 || oneof.is_some() || kind.is_message());
    let is_packed = cardinality == Cardinality::Repeated
        && kind.is_packable()
        && field
            .options
            .as_ref()
            .and_then(|options| options.packed)
            .unwrap_or(syntax == Syntax::Proto3);

    let field_index = to_index(inner.messages[message as usize].fields.len());
    let message_inner = &mut inner.messages[message as usize];
    if let Some(&other) = message_inner.field_numbers.get(&number) {
        let other_name = message_inner.fields[other as usize]
            .id
            .full_name()
            .to_owned();
        return Err(DescriptorError::duplicate_field_number(
            number, &full_name, other_name,
        ));
    }
    message_inner.field_numbers.insert(number, field_index);
    message_inner
        .field_names
        .insert(field.name().into(), field_index);
    message_inner
        .field_json_names
        .entry(json_name.clone())
        .or_insert(field_index);
    if let Some(oneof) = oneof {
        message_inner.oneofs[oneof as usize].fields.push(field_index);
    }
    if cardinality == Cardinality::Required {
        message_inner.required_numbers.push(number);
        message_inner.required_numbers.sort_unstable();
    }
    message_inner.fields.push(FieldDescriptorInner {
        id: Identity::new(file, &full_name, field.name()),
        number,
        json_name,
        kind,
        oneof,
        is_packed,
        supports_presence,
        cardinality,
        default,
    });
    Ok(())
}

fn resolve_extension(
    inner: &mut DescriptorPoolInner,
    item: ExtensionToResolve,
) -> Result<(), DescriptorError> {
    let ExtensionToResolve {
        file,
        index,
        scope,
        field,
    } = item;
    let syntax = inner.files[file as usize].syntax;
    let full_name = join_name(&scope, field.name());
    let number = field.number() as u32;

    let kind = resolve_field_kind(inner, file, &scope, &field)?;
    let cardinality = cardinality(&field);

    let extendee = match resolve_name(inner, file, &scope, field.extendee())? {
        DefinitionKind::Message(message) => message,
        _ => {
            return Err(DescriptorError::invalid_type(
                field.extendee(),
                "a message type",
                file_name(inner, file),
            ))
        }
    };

    if !inner.messages[extendee as usize]
        .extension_ranges
        .iter()
        .any(|range| range.contains(&number))
    {
        return Err(DescriptorError::invalid_extension_number(
            number,
            &full_name,
            inner.messages[extendee as usize].id.full_name(),
        ));
    }

    let default = match field.default_value.as_deref() {
        Some(value) => Some(
            parse_default_value(inner, kind, value)
                .ok_or_else(|| DescriptorError::invalid_default_value(&full_name, value))?,
        ),
        None => None,
    };

    // MessageSet extensions are keyed by their message type name in JSON.
    let parent = inner.extensions[index as usize].parent;
    let json_name: Box<str> = match parent {
        Some(parent)
            if field.name() == "message_set_extension"
                && inner.messages[extendee as usize].is_message_set =>
        {
            format!("[{}]", inner.messages[parent as usize].id.full_name()).into()
        }
        _ => format!("[{}]", full_name).into(),
    };

    let is_packed = cardinality == Cardinality::Repeated
        && kind.is_packable()
        && field
            .options
            .as_ref()
            .and_then(|options| options.packed)
            .unwrap_or(syntax == Syntax::Proto3);

    if let Some(&other) = inner.messages[extendee as usize]
        .extension_numbers
        .get(&number)
    {
        let other_name = inner.extensions[other as usize].id.full_name().to_owned();
        return Err(DescriptorError::duplicate_field_number(
            number, &full_name, other_name,
        ));
    }
    inner.messages[extendee as usize].extensions.push(index);
    inner.messages[extendee as usize]
        .extension_numbers
        .insert(number, index);

    let extension = &mut inner.extensions[index as usize];
    extension.extendee = extendee;
    extension.kind = kind;
    extension.is_packed = is_packed;
    extension.cardinality = cardinality;
    extension.default = default;
    extension.json_name = json_name;
    Ok(())
}

fn resolve_method(
    inner: &mut DescriptorPoolInner,
    item: MethodToResolve,
) -> Result<(), DescriptorError> {
    let MethodToResolve {
        file,
        service,
        scope,
        name,
        input,
        output,
        client_streaming,
        server_streaming,
    } = item;

    let input = match resolve_name(inner, file, &scope, &input)? {
        DefinitionKind::Message(message) => message,
        _ => {
            return Err(DescriptorError::invalid_type(
                input,
                "a message type",
                file_name(inner, file),
            ))
        }
    };
    let output = match resolve_name(inner, file, &scope, &output)? {
        DefinitionKind::Message(message) => message,
        _ => {
            return Err(DescriptorError::invalid_type(
                output,
                "a message type",
                file_name(inner, file),
            ))
        }
    };

    let full_name = join_name(&scope, &name);
    inner.services[service as usize]
        .methods
        .push(MethodDescriptorInner {
            id: Identity::new(file, &full_name, &name),
            input,
            output,
            client_streaming,
            server_streaming,
        });
    Ok(())
}

fn resolve_field_kind(
    inner: &DescriptorPoolInner,
    file: FileIndex,
    scope: &str,
    field: &FieldDescriptorProto,
) -> Result<KindIndex, DescriptorError> {
    use field_descriptor_proto::Type;

    let scalar = match field.r#type {
        None => None,
        Some(_) => match field.r#type() {
            Type::Double => Some(KindIndex::Double),
            Type::Float => Some(KindIndex::Float),
            Type::Int64 => Some(KindIndex::Int64),
            Type::Uint64 => Some(KindIndex::Uint64),
            Type::Int32 => Some(KindIndex::Int32),
            Type::Fixed64 => Some(KindIndex::Fixed64),
            Type::Fixed32 => Some(KindIndex::Fixed32),
            Type::Bool => Some(KindIndex::Bool),
            Type::String => Some(KindIndex::String),
            Type::Bytes => Some(KindIndex::Bytes),
            Type::Uint32 => Some(KindIndex::Uint32),
            Type::Sfixed32 => Some(KindIndex::Sfixed32),
            Type::Sfixed64 => Some(KindIndex::Sfixed64),
            Type::Sint32 => Some(KindIndex::Sint32),
            Type::Sint64 => Some(KindIndex::Sint64),
            Type::Group | Type::Message | Type::Enum => None,
        },
    };
    if let Some(scalar) = scalar {
        return Ok(scalar);
    }

    // Either the type is left unset (descriptors produced by some tools omit
    // it for message and enum fields), or it names a message, group or enum.
    match (field.r#type.map(|_| field.r#type()), resolve_name(inner, file, scope, field.type_name())?) {
        (Some(Type::Group), DefinitionKind::Message(message)) => Ok(KindIndex::Group(message)),
        (Some(Type::Message) | None, DefinitionKind::Message(message)) => {
            Ok(KindIndex::Message(message))
        }
        (Some(Type::Enum) | None, DefinitionKind::Enum(enum_)) => Ok(KindIndex::Enum(enum_)),
        (Some(Type::Enum), _) => Err(DescriptorError::invalid_type(
            field.type_name(),
            "an enum type",
            file_name(inner, file),
        )),
        (Some(Type::Group) | Some(Type::Message), _) => Err(DescriptorError::invalid_type(
            field.type_name(),
            "a message type",
            file_name(inner, file),
        )),
        (None, _) => Err(DescriptorError::invalid_type(
            field.type_name(),
            "a message or enum type",
            file_name(inner, file),
        )),
        _ => unreachable!("scalar kinds are handled above"),
    }
}

/// Resolve a type reference the way protoc does: fully qualified names (with
/// a leading dot) resolve directly; relative names walk outwards through the
/// enclosing scopes. The definition must be visible through the referring
/// file's import closure.
fn resolve_name(
    inner: &DescriptorPoolInner,
    file: FileIndex,
    scope: &str,
    name: &str,
) -> Result<DefinitionKind, DescriptorError> {
    let def = match name.strip_prefix('.') {
        Some(full_name) => inner.names.get(full_name),
        None => relative_name_candidates(scope, name)
            .find_map(|candidate| inner.names.get(candidate.as_ref())),
    };

    match def {
        Some(def) => {
            if inner.files[file as usize].dependencies.contains(&def.file) {
                Ok(def.kind)
            } else {
                Err(DescriptorError::name_not_visible(
                    name,
                    file_name(inner, file),
                    file_name(inner, def.file),
                ))
            }
        }
        None => Err(DescriptorError::name_not_found(name, file_name(inner, file))),
    }
}

fn relative_name_candidates<'a>(
    scope: &'a str,
    relative_name: &'a str,
) -> impl Iterator<Item = Cow<'a, str>> + 'a {
    iter::once(())
        .filter(|_| !scope.is_empty())
        .map(move |_| Cow::Owned(format!("{}.{}", scope, relative_name)))
        .chain(
            scope
                .rmatch_indices('.')
                .map(move |(i, _)| Cow::Owned(format!("{}.{}", &scope[..i], relative_name))),
        )
        .chain(iter::once(Cow::Borrowed(relative_name)))
}

fn cardinality(field: &FieldDescriptorProto) -> Cardinality {
    match field.label() {
        field_descriptor_proto::Label::Optional => Cardinality::Optional,
        field_descriptor_proto::Label::Required => Cardinality::Required,
        field_descriptor_proto::Label::Repeated => Cardinality::Repeated,
    }
}

fn check_reserved(
    inner: &DescriptorPoolInner,
    message: MessageIndex,
    number: u32,
    name: &str,
    full_name: &str,
) -> Result<(), DescriptorError> {
    let message = &inner.messages[message as usize];
    if message
        .reserved_ranges
        .iter()
        .any(|range| range.contains(&number))
    {
        return Err(DescriptorError::reserved_field_number(number, full_name));
    }
    if message.reserved_names.iter().any(|n| n.as_ref() == name) {
        return Err(DescriptorError::reserved_field_name(full_name));
    }
    Ok(())
}

/// Map entries are synthetic messages with a key field numbered 1 of
/// integral, bool or string type, and a value field numbered 2 of any
/// non-repeated, non-group type.
fn check_map_entries(
    inner: &DescriptorPoolInner,
    first_message: MessageIndex,
) -> Result<(), DescriptorError> {
    for message in &inner.messages[first_message as usize..] {
        if !message.is_map_entry {
            continue;
        }

        let key = message
            .field_numbers
            .get(&MAP_ENTRY_KEY_NUMBER)
            .map(|&index| &message.fields[index as usize]);
        let value = message
            .field_numbers
            .get(&MAP_ENTRY_VALUE_NUMBER)
            .map(|&index| &message.fields[index as usize]);
        let valid = match (key, value) {
            (Some(key), Some(value)) if message.fields.len() == 2 => {
                let key_ok = key.cardinality == Cardinality::Optional
                    && matches!(
                        key.kind,
                        KindIndex::Int32
                            | KindIndex::Int64
                            | KindIndex::Uint32
                            | KindIndex::Uint64
                            | KindIndex::Sint32
                            | KindIndex::Sint64
                            | KindIndex::Fixed32
                            | KindIndex::Fixed64
                            | KindIndex::Sfixed32
                            | KindIndex::Sfixed64
                            | KindIndex::Bool
                            | KindIndex::String
                    );
                let value_ok = value.cardinality == Cardinality::Optional
                    && !matches!(value.kind, KindIndex::Group(_));
                key_ok && value_ok
            }
            _ => false,
        };
        if !valid {
            return Err(DescriptorError::invalid_map_entry(message.id.full_name()));
        }
    }
    Ok(())
}

fn parse_default_value(
    inner: &DescriptorPoolInner,
    kind: KindIndex,
    value: &str,
) -> Option<Value> {
    match kind {
        KindIndex::Double => Some(Value::F64(parse_default_float(value)?)),
        KindIndex::Float => Some(Value::F32(parse_default_float(value)? as f32)),
        KindIndex::Int32 | KindIndex::Sint32 | KindIndex::Sfixed32 => {
            Some(Value::I32(value.parse().ok()?))
        }
        KindIndex::Int64 | KindIndex::Sint64 | KindIndex::Sfixed64 => {
            Some(Value::I64(value.parse().ok()?))
        }
        KindIndex::Uint32 | KindIndex::Fixed32 => Some(Value::U32(value.parse().ok()?)),
        KindIndex::Uint64 | KindIndex::Fixed64 => Some(Value::U64(value.parse().ok()?)),
        KindIndex::Bool => Some(Value::Bool(value.parse().ok()?)),
        KindIndex::String => Some(Value::String(value.to_owned())),
        KindIndex::Bytes => Some(Value::Bytes(unescape_bytes(value)?.into())),
        KindIndex::Enum(enum_) => {
            let enum_ = &inner.enums[enum_ as usize];
            let &index = enum_.value_names.get(value)?;
            Some(Value::EnumNumber(enum_.values[index as usize].number))
        }
        KindIndex::Message(_) | KindIndex::Group(_) => None,
    }
}

fn parse_default_float(value: &str) -> Option<f64> {
    match value {
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        "nan" => Some(f64::NAN),
        _ => value.parse().ok(),
    }
}

/// Unescape the C-style escapes protoc uses for `bytes` default values.
fn unescape_bytes(value: &str) -> Option<Vec<u8>> {
    let mut result = Vec::with_capacity(value.len());
    let mut bytes = value.bytes().peekable();
    while let Some(byte) = bytes.next() {
        if byte != b'\\' {
            result.push(byte);
            continue;
        }
        match bytes.next()? {
            b'a' => result.push(0x07),
            b'b' => result.push(0x08),
            b'f' => result.push(0x0c),
            b'n' => result.push(b'\n'),
            b'r' => result.push(b'\r'),
            b't' => result.push(b'\t'),
            b'v' => result.push(0x0b),
            b'\\' => result.push(b'\\'),
            b'\'' => result.push(b'\''),
            b'"' => result.push(b'"'),
            digit @ b'0'..=b'7' => {
                let mut octal = (digit - b'0') as u32;
                for _ in 0..2 {
                    match bytes.peek() {
                        Some(&digit @ b'0'..=b'7') => {
                            octal = octal * 8 + (digit - b'0') as u32;
                            bytes.next();
                        }
                        _ => break,
                    }
                }
                result.push(u8::try_from(octal).ok()?);
            }
            _ => return None,
        }
    }
    Some(result)
}

pub(super) fn to_json_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut uppercase_next = false;

    for ch in name.chars() {
        if ch == '_' {
            uppercase_next = true
        } else if uppercase_next {
            result.push(ch.to_ascii_uppercase());
            uppercase_next = false;
        } else {
            result.push(ch);
        }
    }

    result
}

pub(super) fn join_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_owned()
    } else {
        format!("{}.{}", namespace, name)
    }
}
