//! Generic runtime values.
//!
//! A [`Value`] is one element of the reflective data model: a scalar, a
//! string/binary blob, an enum constant, a container, or a nested message.
//!
//! Equality and hashing are defined so that separately-constructed equal
//! values always agree: doubles compare and hash by bit pattern (NaN equals
//! itself, `+0.0` differs from `-0.0`), and container hashes are wrapping
//! sums of entry hashes so they do not depend on iteration order.

use std::cmp::Ordering;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::descriptor::{CollectionOrder, EnumDescriptor};
use crate::kind::TypeKind;
use crate::message::Message;

/// One value of any type kind.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    Enum(EnumValue),
    List(Vec<Value>),
    Set(SetValue),
    Map(MapValue),
    Message(Message),
}

impl Value {
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Bool(_) => TypeKind::Bool,
            Self::Byte(_) => TypeKind::Byte,
            Self::I16(_) => TypeKind::I16,
            Self::I32(_) => TypeKind::I32,
            Self::I64(_) => TypeKind::I64,
            Self::Double(_) => TypeKind::Double,
            Self::String(_) => TypeKind::String,
            Self::Binary(_) => TypeKind::Binary,
            Self::Enum(_) => TypeKind::Enum,
            Self::List(_) => TypeKind::List,
            Self::Set(_) => TypeKind::Set,
            Self::Map(_) => TypeKind::Map,
            Self::Message(m) => m.descriptor().variant().kind(),
        }
    }

    /// Element count for containers, 1 for everything else.
    pub fn num(&self) -> usize {
        match self {
            Self::List(items) => items.len(),
            Self::Set(set) => set.len(),
            Self::Map(map) => map.len(),
            _ => 1,
        }
    }

    /// Deterministic content hash, shared by value hashing and the
    /// hash-based container ordering.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn rank(&self) -> u8 {
        self.kind() as u8
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::I16(a), Self::I16(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Message(a), Self::Message(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.rank());
        match self {
            Self::Bool(v) => v.hash(state),
            Self::Byte(v) => v.hash(state),
            Self::I16(v) => v.hash(state),
            Self::I32(v) => v.hash(state),
            Self::I64(v) => v.hash(state),
            Self::Double(v) => v.to_bits().hash(state),
            Self::String(v) => v.hash(state),
            Self::Binary(v) => v.hash(state),
            Self::Enum(v) => v.hash(state),
            Self::List(items) => {
                for item in items {
                    item.hash(state);
                }
            }
            Self::Set(set) => set.hash(state),
            Self::Map(map) => map.hash(state),
            Self::Message(m) => m.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    /// Total order: kind rank first, then natural value order. Lists compare
    /// element-wise (their order is canonical); sets and maps compare by
    /// content hash since no canonical entry order is guaranteed.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Byte(a), Self::Byte(b)) => a.cmp(b),
            (Self::I16(a), Self::I16(b)) => a.cmp(b),
            (Self::I32(a), Self::I32(b)) => a.cmp(b),
            (Self::I64(a), Self::I64(b)) => a.cmp(b),
            (Self::Double(a), Self::Double(b)) => a.total_cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Binary(a), Self::Binary(b)) => a.cmp(b),
            (Self::Enum(a), Self::Enum(b)) => a.value().cmp(&b.value()),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            (Self::Set(a), Self::Set(b)) => a.content_hash().cmp(&b.content_hash()),
            (Self::Map(a), Self::Map(b)) => a.content_hash().cmp(&b.content_hash()),
            (Self::Message(a), Self::Message(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl std::fmt::Display for Value {
    /// Compact single-line rendering for logs and diagnostics. Not a wire
    /// format: binary renders as hex, containers and messages recurse.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Binary(v) => {
                for byte in v {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::Enum(v) => f.write_str(v.name()),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Set(set) => {
                f.write_str("[")?;
                for (i, item) in set.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{key}:{value}")?;
                }
                f.write_str("}")
            }
            Self::Message(m) => write!(f, "{m}"),
        }
    }
}

/// A resolved enum constant: the owning descriptor plus the numeric value.
#[derive(Clone, Debug)]
pub struct EnumValue {
    descriptor: Arc<EnumDescriptor>,
    value: i32,
}

impl EnumValue {
    /// Construct from a known member value; `None` for values outside the
    /// closed set.
    pub fn from_value(descriptor: &Arc<EnumDescriptor>, value: i32) -> Option<Self> {
        descriptor.name_of(value)?;
        Some(Self {
            descriptor: descriptor.clone(),
            value,
        })
    }

    /// Construct from a member name, bare or `"TypeName.NAME"` qualified.
    pub fn from_name(descriptor: &Arc<EnumDescriptor>, name: &str) -> Option<Self> {
        let value = descriptor.value_of(name)?;
        Some(Self {
            descriptor: descriptor.clone(),
            value,
        })
    }

    pub fn descriptor(&self) -> &Arc<EnumDescriptor> {
        &self.descriptor
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn name(&self) -> &str {
        // Membership was checked at construction.
        self.descriptor.name_of(self.value).unwrap_or("")
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && self.descriptor.qualified_name() == other.descriptor.qualified_name()
    }
}

impl Eq for EnumValue {}

impl Hash for EnumValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

/// A set value carrying its declared collection discipline.
///
/// Backed by an [`IndexSet`] for every discipline: insertion order is kept
/// as-is for `Unordered` and `InsertionOrderPreserving`, and maintained
/// sorted for `SortedByNaturalOrder`.
#[derive(Clone, Debug)]
pub struct SetValue {
    order: CollectionOrder,
    items: IndexSet<Value>,
}

impl SetValue {
    pub fn new(order: CollectionOrder) -> Self {
        Self {
            order,
            items: IndexSet::new(),
        }
    }

    pub fn order(&self) -> CollectionOrder {
        self.order
    }

    /// Insert one element, de-duplicating. Returns whether it was new.
    pub fn insert(&mut self, value: Value) -> bool {
        match self.order {
            CollectionOrder::SortedByNaturalOrder => self.items.insert_sorted(value).1,
            _ => self.items.insert(value),
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.items.contains(value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in the discipline's order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }

    /// Order-independent content hash.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for SetValue {
    /// Content equality; discipline and iteration order do not participate.
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for SetValue {}

impl Hash for SetValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut sum = 0u64;
        for item in &self.items {
            sum = sum.wrapping_add(item.content_hash());
        }
        state.write_u64(sum);
        state.write_usize(self.items.len());
    }
}

/// A map value carrying its declared collection discipline.
#[derive(Clone, Debug)]
pub struct MapValue {
    order: CollectionOrder,
    entries: IndexMap<Value, Value>,
}

impl MapValue {
    pub fn new(order: CollectionOrder) -> Self {
        Self {
            order,
            entries: IndexMap::new(),
        }
    }

    pub fn order(&self) -> CollectionOrder {
        self.order
    }

    /// Insert or overwrite one entry, returning the previous value if any.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.order {
            CollectionOrder::SortedByNaturalOrder => self.entries.insert_sorted(key, value).1,
            _ => self.entries.insert(key, value),
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in the discipline's order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter()
    }

    /// Order-independent content hash.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for MapValue {
    /// Content equality; discipline and iteration order do not participate.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for MapValue {}

impl Hash for MapValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut sum = 0u64;
        for (key, value) in &self.entries {
            let mut entry = DefaultHasher::new();
            key.hash(&mut entry);
            value.hash(&mut entry);
            sum = sum.wrapping_add(entry.finish());
        }
        state.write_u64(sum);
        state.write_usize(self.entries.len());
    }
}
