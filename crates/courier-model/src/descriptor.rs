//! Immutable reflective descriptors for every type kind.
//!
//! Descriptors are built once by schema tooling and shared read-only after
//! that. Struct-like descriptors precompute key and name lookup tables so
//! generic field access stays O(1) on large schemas.

use std::collections::HashMap;
use std::sync::Arc;

use crate::builder::MessageBuilder;
use crate::error::DefinitionError;
use crate::kind::TypeKind;
use crate::provider::DescriptorProvider;
use crate::value::Value;

/// Collection discipline for sets and maps, chosen by the schema and fixed
/// for the lifetime of the descriptor.
///
/// Builders and codecs honor the discipline: iteration (and therefore text
/// output) order is sorted for `SortedByNaturalOrder`, insertion order for
/// `InsertionOrderPreserving`, and unspecified for `Unordered`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CollectionOrder {
    #[default]
    Unordered,
    SortedByNaturalOrder,
    InsertionOrderPreserving,
}

/// A reference to a type. Cheap to clone; named and container descriptors
/// are shared behind `Arc`.
#[derive(Clone, Debug)]
pub enum TypeDescriptor {
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    String,
    Binary,
    Enum(Arc<EnumDescriptor>),
    List(Arc<ListDescriptor>),
    Set(Arc<SetDescriptor>),
    Map(Arc<MapDescriptor>),
    /// Struct, union or exception; distinguished by
    /// [`StructDescriptor::variant`].
    Message(Arc<StructDescriptor>),
}

impl TypeDescriptor {
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Bool => TypeKind::Bool,
            Self::Byte => TypeKind::Byte,
            Self::I16 => TypeKind::I16,
            Self::I32 => TypeKind::I32,
            Self::I64 => TypeKind::I64,
            Self::Double => TypeKind::Double,
            Self::String => TypeKind::String,
            Self::Binary => TypeKind::Binary,
            Self::Enum(_) => TypeKind::Enum,
            Self::List(_) => TypeKind::List,
            Self::Set(_) => TypeKind::Set,
            Self::Map(_) => TypeKind::Map,
            Self::Message(m) => m.variant().kind(),
        }
    }

    /// Bare type name: the kind keyword for primitives and containers, the
    /// declared name for enums and messages.
    pub fn name(&self) -> String {
        match self {
            Self::Enum(e) => e.name().to_owned(),
            Self::Message(m) => m.name().to_owned(),
            other => other.kind().name().to_owned(),
        }
    }

    /// `package.Name` for named types, the kind keyword otherwise.
    pub fn qualified_name(&self) -> String {
        match self {
            Self::Enum(e) => e.qualified_name(),
            Self::Message(m) => m.qualified_name(),
            other => other.kind().name().to_owned(),
        }
    }

    /// Zero value for the fixed-width scalar kinds, used as the synthesized
    /// default for `Default`-tier fields without a declared one.
    pub fn zero_value(&self) -> Option<Value> {
        match self {
            Self::Bool => Some(Value::Bool(false)),
            Self::Byte => Some(Value::Byte(0)),
            Self::I16 => Some(Value::I16(0)),
            Self::I32 => Some(Value::I32(0)),
            Self::I64 => Some(Value::I64(0)),
            Self::Double => Some(Value::Double(0.0)),
            _ => None,
        }
    }
}

/// `list<item>`.
#[derive(Debug)]
pub struct ListDescriptor {
    item: DescriptorProvider,
}

impl ListDescriptor {
    pub fn new(item: DescriptorProvider) -> Self {
        Self { item }
    }

    pub fn item(&self) -> Result<TypeDescriptor, DefinitionError> {
        self.item.resolve()
    }
}

/// `set<item>` with a declared collection discipline.
#[derive(Debug)]
pub struct SetDescriptor {
    item: DescriptorProvider,
    order: CollectionOrder,
}

impl SetDescriptor {
    pub fn new(item: DescriptorProvider, order: CollectionOrder) -> Self {
        Self { item, order }
    }

    pub fn item(&self) -> Result<TypeDescriptor, DefinitionError> {
        self.item.resolve()
    }

    pub fn order(&self) -> CollectionOrder {
        self.order
    }
}

/// `map<key, value>` with a declared collection discipline.
#[derive(Debug)]
pub struct MapDescriptor {
    key: DescriptorProvider,
    value: DescriptorProvider,
    order: CollectionOrder,
}

impl MapDescriptor {
    pub fn new(key: DescriptorProvider, value: DescriptorProvider, order: CollectionOrder) -> Self {
        Self { key, value, order }
    }

    pub fn key(&self) -> Result<TypeDescriptor, DefinitionError> {
        self.key.resolve()
    }

    pub fn value(&self) -> Result<TypeDescriptor, DefinitionError> {
        self.value.resolve()
    }

    pub fn order(&self) -> CollectionOrder {
        self.order
    }
}

/// A closed set of named integer constants with bidirectional lookup.
#[derive(Debug)]
pub struct EnumDescriptor {
    package: String,
    name: String,
    documentation: Option<String>,
    members: Box<[(i32, String)]>,
    by_value: HashMap<i32, usize>,
    by_name: HashMap<String, usize>,
}

impl EnumDescriptor {
    pub fn new(
        package: &str,
        name: &str,
        members: Vec<(i32, &str)>,
    ) -> Result<Arc<Self>, DefinitionError> {
        Self::documented(package, name, None, members)
    }

    /// Like [`new`](Self::new), carrying the schema's declared doc comment
    /// for introspection tooling.
    pub fn documented(
        package: &str,
        name: &str,
        documentation: Option<&str>,
        members: Vec<(i32, &str)>,
    ) -> Result<Arc<Self>, DefinitionError> {
        let mut by_value = HashMap::with_capacity(members.len());
        let mut by_name = HashMap::with_capacity(members.len());
        for (index, (value, member)) in members.iter().enumerate() {
            if by_value.insert(*value, index).is_some() {
                return Err(DefinitionError::DuplicateEnumValue {
                    value: *value,
                    enum_name: name.to_owned(),
                });
            }
            if by_name.insert((*member).to_owned(), index).is_some() {
                return Err(DefinitionError::DuplicateEnumName {
                    name: (*member).to_owned(),
                    enum_name: name.to_owned(),
                });
            }
        }
        Ok(Arc::new(Self {
            package: package.to_owned(),
            name: name.to_owned(),
            documentation: documentation.map(str::to_owned),
            members: members
                .into_iter()
                .map(|(v, n)| (v, n.to_owned()))
                .collect(),
            by_value,
            by_name,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    /// Doc comment declared on the enum, if any.
    pub fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    /// Declared members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (i32, &str)> {
        self.members.iter().map(|(v, n)| (*v, n.as_str()))
    }

    pub fn name_of(&self, value: i32) -> Option<&str> {
        self.by_value.get(&value).map(|&i| self.members[i].1.as_str())
    }

    /// Look up a member by name. Accepts both the bare member name and the
    /// `"TypeName.NAME"` qualified form; the type-name prefix is stripped
    /// when it matches this enum.
    pub fn value_of(&self, name: &str) -> Option<i32> {
        let bare = name
            .strip_prefix(&self.name)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name);
        self.by_name.get(bare).map(|&i| self.members[i].0)
    }

    pub fn descriptor(self: &Arc<Self>) -> TypeDescriptor {
        TypeDescriptor::Enum(self.clone())
    }
}

/// Field requirement tier, governing presence and default-fallback
/// semantics.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Requirement {
    /// Must be present for the message to build.
    Required,
    /// Logically always has a value. Fixed-width scalars get the default
    /// materialized into fresh builders; reference kinds fall back on `get`
    /// without reporting presence.
    Default,
    /// Absent unless explicitly set.
    Optional,
}

/// One named, numbered, typed slot of a struct-like descriptor.
#[derive(Debug)]
pub struct Field {
    key: u16,
    name: String,
    requirement: Requirement,
    descriptor: DescriptorProvider,
    default: Option<Value>,
}

impl Field {
    pub fn new(
        key: u16,
        name: &str,
        requirement: Requirement,
        descriptor: DescriptorProvider,
        default: Option<Value>,
    ) -> Self {
        Self {
            key,
            name: name.to_owned(),
            requirement,
            descriptor,
            default,
        }
    }

    pub fn key(&self) -> u16 {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requirement(&self) -> Requirement {
        self.requirement
    }

    pub fn descriptor(&self) -> Result<TypeDescriptor, DefinitionError> {
        self.descriptor.resolve()
    }

    pub fn declared_default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The declared default, or the kind's zero value for `Default`-tier
    /// scalar fields. `None` for anything else.
    pub fn effective_default(&self) -> Option<Value> {
        if let Some(default) = &self.default {
            return Some(default.clone());
        }
        if self.requirement == Requirement::Default {
            return self.descriptor.resolve().ok()?.zero_value();
        }
        None
    }

    /// Whether a fresh builder materializes this field's default eagerly.
    pub fn materializes_default(&self) -> bool {
        self.requirement == Requirement::Default
            && self
                .descriptor
                .resolve()
                .map(|d| d.kind().is_primitive())
                .unwrap_or(false)
    }
}

/// Which message shape a [`StructDescriptor`] describes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MessageVariant {
    Struct,
    Union,
    Exception,
}

impl MessageVariant {
    pub fn kind(self) -> TypeKind {
        match self {
            Self::Struct => TypeKind::Struct,
            Self::Union => TypeKind::Union,
            Self::Exception => TypeKind::Exception,
        }
    }
}

/// Descriptor for a struct, union or exception type.
///
/// Owns the ordered field list plus precomputed key and name tables. Also
/// plays the builder-factory role: [`StructDescriptor::builder`] yields a
/// fresh [`MessageBuilder`] for this type.
#[derive(Debug)]
pub struct StructDescriptor {
    package: String,
    name: String,
    documentation: Option<String>,
    variant: MessageVariant,
    fields: Box<[Field]>,
    by_key: HashMap<u16, usize>,
    by_name: HashMap<String, usize>,
}

impl StructDescriptor {
    pub fn new(
        package: &str,
        name: &str,
        variant: MessageVariant,
        fields: Vec<Field>,
    ) -> Result<Arc<Self>, DefinitionError> {
        Self::documented(package, name, None, variant, fields)
    }

    /// Like [`new`](Self::new), carrying the schema's declared doc comment
    /// for introspection tooling.
    pub fn documented(
        package: &str,
        name: &str,
        documentation: Option<&str>,
        variant: MessageVariant,
        fields: Vec<Field>,
    ) -> Result<Arc<Self>, DefinitionError> {
        let mut by_key = HashMap::with_capacity(fields.len());
        let mut by_name = HashMap::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            if field.key() == 0 {
                return Err(DefinitionError::ReservedKey {
                    type_name: name.to_owned(),
                    field: field.name().to_owned(),
                });
            }
            if by_key.insert(field.key(), index).is_some() {
                return Err(DefinitionError::DuplicateKey {
                    key: field.key(),
                    type_name: name.to_owned(),
                });
            }
            if by_name.insert(field.name().to_owned(), index).is_some() {
                return Err(DefinitionError::DuplicateFieldName {
                    name: field.name().to_owned(),
                    type_name: name.to_owned(),
                });
            }
        }
        Ok(Arc::new(Self {
            package: package.to_owned(),
            name: name.to_owned(),
            documentation: documentation.map(str::to_owned),
            variant,
            fields: fields.into(),
            by_key,
            by_name,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    /// Doc comment declared on the type, if any.
    pub fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    pub fn variant(&self) -> MessageVariant {
        self.variant
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_by_key(&self, key: u16) -> Option<&Field> {
        self.by_key.get(&key).map(|&i| &self.fields[i])
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Position of a field within the declared order, used as the index
    /// into message value storage and builder presence bits.
    pub fn position_of(&self, key: u16) -> Option<usize> {
        self.by_key.get(&key).copied()
    }

    pub fn descriptor(self: &Arc<Self>) -> TypeDescriptor {
        TypeDescriptor::Message(self.clone())
    }

    /// A fresh builder for this type, `Default`-tier scalars pre-populated.
    pub fn builder(self: &Arc<Self>) -> MessageBuilder {
        MessageBuilder::new(self.clone())
    }
}
