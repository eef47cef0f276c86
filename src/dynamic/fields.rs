use std::{
    borrow::Cow,
    collections::btree_map::{self, BTreeMap},
    fmt,
};

use crate::{
    ExtensionDescriptor, FieldDescriptor, Kind, MessageDescriptor, OneofDescriptor, Value,
};

use super::unknown::{UnknownField, UnknownFieldSet};

/// Abstraction over plain fields and extension fields, so the codecs can
/// treat them uniformly.
pub(crate) trait FieldDescriptorLike: fmt::Debug + Clone {
    fn text_name(&self) -> &str;
    fn number(&self) -> u32;
    fn default_value(&self) -> Value;
    fn is_default_value(&self, value: &Value) -> bool;
    fn is_valid(&self, value: &Value) -> bool;
    fn containing_oneof(&self) -> Option<OneofDescriptor>;
    fn supports_presence(&self) -> bool;
    fn kind(&self) -> Kind;
    fn is_group(&self) -> bool;
    fn is_list(&self) -> bool;
    fn is_map(&self) -> bool;
    fn is_packed(&self) -> bool;
    fn is_packable(&self) -> bool;
    fn entry(&self, value: Value) -> FieldEntry;
    fn has(&self, value: &Value) -> bool {
        self.supports_presence() || !self.is_default_value(value)
    }
}

/// Storage for the fields of a dynamic message, keyed by number.
///
/// Extension entries carry their descriptor, since extensions registered in a
/// foreign pool cannot be recovered from the message's own descriptor.
#[derive(Default, Debug, Clone, PartialEq)]
pub(crate) struct DynamicMessageFieldSet {
    entries: BTreeMap<u32, FieldEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldEntry {
    Field(Value),
    Extension(ExtensionDescriptor, Value),
    Unknown(UnknownFieldSet),
}

pub(crate) enum ValueAndDescriptor<'a> {
    Field(Cow<'a, Value>, FieldDescriptor),
    Extension(Cow<'a, Value>, ExtensionDescriptor),
    Unknown(&'a UnknownFieldSet),
}

impl FieldEntry {
    fn value(&self) -> Option<&Value> {
        match self {
            FieldEntry::Field(value) | FieldEntry::Extension(_, value) => Some(value),
            FieldEntry::Unknown(_) => None,
        }
    }

    fn value_mut(&mut self) -> Option<&mut Value> {
        match self {
            FieldEntry::Field(value) | FieldEntry::Extension(_, value) => Some(value),
            FieldEntry::Unknown(_) => None,
        }
    }
}

impl DynamicMessageFieldSet {
    fn get_value(&self, number: u32) -> Option<&Value> {
        self.entries.get(&number).and_then(FieldEntry::value)
    }

    pub(crate) fn has(&self, desc: &impl FieldDescriptorLike) -> bool {
        self.get_value(desc.number())
            .map(|value| desc.has(value))
            .unwrap_or(false)
    }

    pub(crate) fn get(&self, desc: &impl FieldDescriptorLike) -> Cow<'_, Value> {
        match self.get_value(desc.number()) {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(desc.default_value()),
        }
    }

    pub(crate) fn get_mut(&mut self, desc: &impl FieldDescriptorLike) -> &mut Value {
        self.clear_oneof_fields(desc);
        let entry = self
            .entries
            .entry(desc.number())
            .and_modify(|entry| {
                if entry.value().is_none() {
                    *entry = desc.entry(desc.default_value());
                }
            })
            .or_insert_with(|| desc.entry(desc.default_value()));
        entry.value_mut().expect("entry holds a value")
    }

    pub(crate) fn set(&mut self, desc: &impl FieldDescriptorLike, value: Value) {
        debug_assert!(
            desc.is_valid(&value),
            "invalid value {:?} for field {:?}",
            value,
            desc,
        );

        self.clear_oneof_fields(desc);
        self.entries.insert(desc.number(), desc.entry(value));
    }

    /// Setting a member of a oneof clears every other member.
    fn clear_oneof_fields(&mut self, desc: &impl FieldDescriptorLike) {
        if let Some(oneof_desc) = desc.containing_oneof() {
            for oneof_field in oneof_desc.fields() {
                if oneof_field.number() != desc.number() {
                    self.clear(&oneof_field);
                }
            }
        }
    }

    pub(crate) fn add_unknown(&mut self, unknown: UnknownField) {
        match self.entries.entry(unknown.number()) {
            btree_map::Entry::Occupied(mut entry) => match entry.get_mut() {
                FieldEntry::Unknown(unknowns) => unknowns.push(unknown),
                FieldEntry::Field(_) | FieldEntry::Extension(..) => {
                    panic!("field with number {} is known", unknown.number())
                }
            },
            btree_map::Entry::Vacant(entry) => {
                entry.insert(FieldEntry::Unknown(UnknownFieldSet::from_iter([unknown])));
            }
        }
    }

    pub(crate) fn clear(&mut self, desc: &impl FieldDescriptorLike) {
        self.entries.remove(&desc.number());
    }

    pub(crate) fn take(&mut self, desc: &impl FieldDescriptorLike) -> Option<Value> {
        match self.entries.remove(&desc.number()) {
            Some(FieldEntry::Field(value)) | Some(FieldEntry::Extension(_, value))
                if desc.has(&value) =>
            {
                Some(value)
            }
            _ => None,
        }
    }

    /// Iterates the populated entries: known fields first, then extensions,
    /// then unknown fields, each group in ascending number order.
    pub(crate) fn iter<'a>(
        &'a self,
        message: &'a MessageDescriptor,
    ) -> impl Iterator<Item = ValueAndDescriptor<'a>> + 'a {
        self.iter_fields(message)
            .map(|(field, value)| ValueAndDescriptor::Field(Cow::Borrowed(value), field))
            .chain(
                self.iter_extensions()
                    .map(|(ext, value)| ValueAndDescriptor::Extension(Cow::Borrowed(value), ext)),
            )
            .chain(self.iter_unknown_sets().map(ValueAndDescriptor::Unknown))
    }

    pub(crate) fn iter_fields<'a>(
        &'a self,
        message: &'a MessageDescriptor,
    ) -> impl Iterator<Item = (FieldDescriptor, &'a Value)> + 'a {
        self.entries.iter().filter_map(move |(&number, entry)| {
            let value = match entry {
                FieldEntry::Field(value) => value,
                _ => return None,
            };
            let field = message
                .get_field(number)
                .expect("field entries have a known number");
            if field.has(value) {
                Some((field, value))
            } else {
                None
            }
        })
    }

    pub(crate) fn iter_extensions(
        &self,
    ) -> impl Iterator<Item = (ExtensionDescriptor, &'_ Value)> + '_ {
        self.entries.values().filter_map(|entry| match entry {
            FieldEntry::Extension(ext, value) if ext.has(value) => Some((ext.clone(), value)),
            _ => None,
        })
    }

    pub(crate) fn iter_unknown_sets(&self) -> impl Iterator<Item = &'_ UnknownFieldSet> {
        self.entries.values().filter_map(|entry| match entry {
            FieldEntry::Unknown(unknowns) => Some(unknowns),
            _ => None,
        })
    }

    pub(crate) fn iter_unknown(&self) -> impl Iterator<Item = &'_ UnknownField> {
        self.iter_unknown_sets().flat_map(UnknownFieldSet::iter)
    }

    pub(crate) fn clear_unknown(&mut self) {
        self.entries
            .retain(|_, entry| !matches!(entry, FieldEntry::Unknown(_)));
    }

    pub(crate) fn clear_all(&mut self) {
        self.entries.clear();
    }
}

impl FieldDescriptorLike for FieldDescriptor {
    fn text_name(&self) -> &str {
        self.name()
    }

    fn number(&self) -> u32 {
        self.number()
    }

    fn default_value(&self) -> Value {
        Value::default_value_for_field(self)
    }

    fn is_default_value(&self, value: &Value) -> bool {
        value.is_default_for_field(self)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.is_valid_for_field(self)
    }

    fn containing_oneof(&self) -> Option<OneofDescriptor> {
        self.containing_oneof()
    }

    fn supports_presence(&self) -> bool {
        self.supports_presence()
    }

    fn kind(&self) -> Kind {
        self.kind()
    }

    fn is_group(&self) -> bool {
        self.is_group()
    }

    fn is_list(&self) -> bool {
        self.is_list()
    }

    fn is_map(&self) -> bool {
        self.is_map()
    }

    fn is_packed(&self) -> bool {
        self.is_packed()
    }

    fn is_packable(&self) -> bool {
        self.is_packable()
    }

    fn entry(&self, value: Value) -> FieldEntry {
        FieldEntry::Field(value)
    }
}

impl FieldDescriptorLike for ExtensionDescriptor {
    fn text_name(&self) -> &str {
        self.json_name()
    }

    fn number(&self) -> u32 {
        self.number()
    }

    fn default_value(&self) -> Value {
        Value::default_value_for_extension(self)
    }

    fn is_default_value(&self, value: &Value) -> bool {
        value.is_default_for_extension(self)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.is_valid_for_extension(self)
    }

    fn containing_oneof(&self) -> Option<OneofDescriptor> {
        None
    }

    fn supports_presence(&self) -> bool {
        self.supports_presence()
    }

    fn kind(&self) -> Kind {
        self.kind()
    }

    fn is_group(&self) -> bool {
        self.is_group()
    }

    fn is_list(&self) -> bool {
        self.is_list()
    }

    fn is_map(&self) -> bool {
        self.is_map()
    }

    fn is_packed(&self) -> bool {
        self.is_packed()
    }

    fn is_packable(&self) -> bool {
        self.is_packable()
    }

    fn entry(&self, value: Value) -> FieldEntry {
        FieldEntry::Extension(self.clone(), value)
    }
}
