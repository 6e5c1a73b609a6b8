//! Mutable staging builders for messages.
//!
//! A [`MessageBuilder`] is a single-writer object: created empty (with
//! `Default`-tier scalars pre-populated) or from an existing message via
//! [`Message::mutate`], mutated through field-key-addressed operations, and
//! consumed exactly once by [`MessageBuilder::build`].
//!
//! Presence is tracked in an explicit bit-vector indexed by field position,
//! kept orthogonal to value storage. A nested message field holds either an
//! already-built message or a live child builder, never both; the duality is
//! structural in [`Slot`].

use std::sync::Arc;

use crate::descriptor::{
    CollectionOrder, MessageVariant, Requirement, StructDescriptor, TypeDescriptor,
};
use crate::error::ValidationError;
use crate::kind::TypeKind;
use crate::message::Message;
use crate::value::{MapValue, SetValue, Value};

/// Fixed-size presence bit-vector, one bit per field position.
#[derive(Clone, Debug)]
struct FieldBits {
    words: Box<[u64]>,
}

impl FieldBits {
    fn new(len: usize) -> Self {
        Self {
            words: vec![0u64; len.div_ceil(64)].into(),
        }
    }

    fn set(&mut self, index: usize) {
        self.words[index / 64] |= 1 << (index % 64);
    }

    fn clear(&mut self, index: usize) {
        self.words[index / 64] &= !(1 << (index % 64));
    }

    fn get(&self, index: usize) -> bool {
        self.words[index / 64] & (1 << (index % 64)) != 0
    }

    fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Storage for one field: absent, an owned value, or a live child builder
/// for a message field under mutation.
#[derive(Clone, Debug)]
enum Slot {
    Empty,
    Value(Value),
    Building(Box<MessageBuilder>),
}

/// Mutable, single-writer staging object producing one immutable [`Message`].
#[derive(Clone, Debug)]
pub struct MessageBuilder {
    descriptor: Arc<StructDescriptor>,
    bits: FieldBits,
    slots: Box<[Slot]>,
}

impl MessageBuilder {
    /// Fresh builder. `Default`-tier scalar fields are materialized up
    /// front so their presence reads true before any `set`; unions are left
    /// entirely empty since pre-population would fake a choice.
    pub fn new(descriptor: Arc<StructDescriptor>) -> Self {
        let len = descriptor.fields().len();
        let mut builder = Self {
            bits: FieldBits::new(len),
            slots: vec![Slot::Empty; len].into(),
            descriptor,
        };
        if builder.descriptor.variant() != MessageVariant::Union {
            let descriptor = builder.descriptor.clone();
            for (position, field) in descriptor.fields().iter().enumerate() {
                if field.materializes_default() {
                    if let Some(default) = field.effective_default() {
                        builder.slots[position] = Slot::Value(default);
                        builder.bits.set(position);
                    }
                }
            }
        }
        builder
    }

    /// Builder seeded from an existing message: presence and values copied,
    /// nothing promoted yet.
    pub(crate) fn from_message(message: &Message) -> Self {
        let descriptor = message.descriptor().clone();
        let len = descriptor.fields().len();
        let mut bits = FieldBits::new(len);
        let slots = (0..len)
            .map(|position| match message.stored_at(position) {
                Some(value) => {
                    bits.set(position);
                    Slot::Value(value.clone())
                }
                None => Slot::Empty,
            })
            .collect();
        Self {
            descriptor,
            bits,
            slots,
        }
    }

    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.descriptor
    }

    /// Raw presence by field key; unknown keys report `false`.
    pub fn has(&self, key: u16) -> bool {
        self.descriptor
            .position_of(key)
            .is_some_and(|i| self.bits.get(i))
    }

    /// Replace a field's value wholesale. Unknown keys are ignored (the
    /// read-side mirror of "unknown field id is ignored"). On a union,
    /// setting any field clears every sibling first.
    pub fn set(&mut self, key: u16, value: Value) -> Result<&mut Self, ValidationError> {
        let Some(position) = self.descriptor.position_of(key) else {
            return Ok(self);
        };
        let declared = self.descriptor.fields()[position].descriptor()?;
        self.check_assignable(position, &declared, &value)?;
        self.select(position);
        self.slots[position] = Slot::Value(value);
        self.bits.set(position);
        Ok(self)
    }

    /// Append to a list field or insert into a set field, creating the
    /// empty container on first use. The distinguished additive operation:
    /// `set` on a container key is whole-field replacement.
    pub fn add_to(&mut self, key: u16, value: Value) -> Result<&mut Self, ValidationError> {
        let Some(position) = self.descriptor.position_of(key) else {
            return Ok(self);
        };
        let declared = self.descriptor.fields()[position].descriptor()?;
        match declared {
            TypeDescriptor::List(list) => {
                let item = list.item()?;
                Self::check_element(&self.descriptor, position, &item, &value)?;
                self.select(position);
                if let Slot::Value(Value::List(items)) = &mut self.slots[position] {
                    items.push(value);
                } else {
                    self.slots[position] = Slot::Value(Value::List(vec![value]));
                }
                self.bits.set(position);
                Ok(self)
            }
            TypeDescriptor::Set(set) => {
                let item = set.item()?;
                Self::check_element(&self.descriptor, position, &item, &value)?;
                self.select(position);
                if !matches!(&self.slots[position], Slot::Value(Value::Set(_))) {
                    self.slots[position] = Slot::Value(Value::Set(SetValue::new(set.order())));
                }
                if let Slot::Value(Value::Set(items)) = &mut self.slots[position] {
                    items.insert(value);
                }
                self.bits.set(position);
                Ok(self)
            }
            other => Err(ValidationError::NotAContainer {
                type_name: self.descriptor.qualified_name(),
                field: self.descriptor.fields()[position].name().to_owned(),
                expected: other.kind(),
            }),
        }
    }

    /// Insert or overwrite one entry of a map field, creating the empty map
    /// on first use.
    pub fn put_in(
        &mut self,
        key: u16,
        entry_key: Value,
        entry_value: Value,
    ) -> Result<&mut Self, ValidationError> {
        let Some(position) = self.descriptor.position_of(key) else {
            return Ok(self);
        };
        let declared = self.descriptor.fields()[position].descriptor()?;
        let TypeDescriptor::Map(map) = declared else {
            return Err(ValidationError::NotAContainer {
                type_name: self.descriptor.qualified_name(),
                field: self.descriptor.fields()[position].name().to_owned(),
                expected: declared.kind(),
            });
        };
        Self::check_element(&self.descriptor, position, &map.key()?, &entry_key)?;
        Self::check_element(&self.descriptor, position, &map.value()?, &entry_value)?;
        self.select(position);
        if !matches!(&self.slots[position], Slot::Value(Value::Map(_))) {
            self.slots[position] = Slot::Value(Value::Map(MapValue::new(map.order())));
        }
        if let Slot::Value(Value::Map(entries)) = &mut self.slots[position] {
            entries.insert(entry_key, entry_value);
        }
        self.bits.set(position);
        Ok(self)
    }

    /// Reset a field. A `Default`-tier scalar is restored to its
    /// materialized default (still present), everything else becomes
    /// absent. Unknown keys are ignored.
    pub fn clear(&mut self, key: u16) -> &mut Self {
        let Some(position) = self.descriptor.position_of(key) else {
            return self;
        };
        self.slots[position] = Slot::Empty;
        self.bits.clear(position);
        let field = &self.descriptor.fields()[position];
        if self.descriptor.variant() != MessageVariant::Union && field.materializes_default() {
            if let Some(default) = field.effective_default() {
                self.slots[position] = Slot::Value(default);
                self.bits.set(position);
            }
        }
        self
    }

    /// Live child builder for a message-typed field.
    ///
    /// Promotes an owned child message into a builder via the child's own
    /// `mutate()` on first mutating access; an absent field gets a fresh
    /// child builder. Calling this for a non-message field (or an unknown
    /// key) is a programming error and is signaled.
    pub fn mutator(&mut self, key: u16) -> Result<&mut MessageBuilder, ValidationError> {
        let Some(position) = self.descriptor.position_of(key) else {
            return Err(ValidationError::NotAMessage {
                type_name: self.descriptor.qualified_name(),
                field: format!("#{key}"),
            });
        };
        let declared = self.descriptor.fields()[position].descriptor()?;
        let TypeDescriptor::Message(child_descriptor) = declared else {
            return Err(ValidationError::NotAMessage {
                type_name: self.descriptor.qualified_name(),
                field: self.descriptor.fields()[position].name().to_owned(),
            });
        };
        self.select(position);
        let current = std::mem::replace(&mut self.slots[position], Slot::Empty);
        let child = match current {
            Slot::Building(builder) => builder,
            Slot::Value(Value::Message(message)) => Box::new(message.mutate()),
            _ => Box::new(child_descriptor.builder()),
        };
        self.slots[position] = Slot::Building(child);
        self.bits.set(position);
        match &mut self.slots[position] {
            Slot::Building(builder) => Ok(builder),
            _ => unreachable!("slot was just set to Building"),
        }
    }

    /// Overlay every field present on `other`: sets are unioned, map
    /// entries put-overwritten, nested messages merged recursively, and
    /// everything else (scalars, strings, lists) replaced.
    pub fn merge(&mut self, other: &Message) -> Result<&mut Self, ValidationError> {
        let source = other.descriptor().clone();
        for field in source.fields() {
            let key = field.key();
            if !other.has(key) {
                continue;
            }
            let Some(value) = other.get(key) else {
                continue;
            };
            let Some(position) = self.descriptor.position_of(key) else {
                continue;
            };
            let declared = self.descriptor.fields()[position].descriptor()?;
            match (declared.kind(), value) {
                (TypeKind::Struct | TypeKind::Union | TypeKind::Exception, Value::Message(child)) => {
                    self.mutator(key)?.merge(&child)?;
                }
                (TypeKind::Set, Value::Set(items)) => {
                    for item in items.iter() {
                        self.add_to(key, item.clone())?;
                    }
                }
                (TypeKind::Map, Value::Map(entries)) => {
                    for (entry_key, entry_value) in entries.iter() {
                        self.put_in(key, entry_key.clone(), entry_value.clone())?;
                    }
                }
                (_, value) => {
                    self.set(key, value)?;
                }
            }
        }
        Ok(self)
    }

    /// Pure validity check: all `Required` fields present, a union has
    /// exactly one field present, and every live child builder is valid.
    pub fn is_valid(&self) -> bool {
        let own = if self.descriptor.variant() == MessageVariant::Union {
            self.bits.count() == 1
        } else {
            self.descriptor
                .fields()
                .iter()
                .enumerate()
                .all(|(i, f)| f.requirement() != Requirement::Required || self.bits.get(i))
        };
        own && self.slots.iter().all(|slot| match slot {
            Slot::Building(builder) => builder.is_valid(),
            _ => true,
        })
    }

    /// Like [`is_valid`](Self::is_valid), but raises an error enumerating
    /// every missing required field by name, suitable for diagnostics.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.descriptor.variant() == MessageVariant::Union {
            let found = self.bits.count();
            if found != 1 {
                return Err(ValidationError::UnionCardinality {
                    type_name: self.descriptor.qualified_name(),
                    found,
                });
            }
        } else {
            let missing: Vec<String> = self
                .descriptor
                .fields()
                .iter()
                .enumerate()
                .filter(|(i, f)| f.requirement() == Requirement::Required && !self.bits.get(*i))
                .map(|(_, f)| f.name().to_owned())
                .collect();
            if !missing.is_empty() {
                return Err(ValidationError::MissingRequired {
                    type_name: self.descriptor.qualified_name(),
                    missing,
                });
            }
        }
        for slot in &self.slots {
            if let Slot::Building(builder) = slot {
                builder.validate()?;
            }
        }
        Ok(())
    }

    /// Validate, resolve every live child builder into an immutable child
    /// message, and produce the built message. Consumes the builder.
    pub fn build(self) -> Result<Message, ValidationError> {
        self.validate()?;
        let descriptor = self.descriptor;
        let values = self
            .slots
            .into_vec()
            .into_iter()
            .map(|slot| match slot {
                Slot::Empty => Ok(None),
                Slot::Value(value) => Ok(Some(value)),
                Slot::Building(builder) => builder.build().map(|m| Some(Value::Message(m))),
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;
        Ok(Message::from_parts(descriptor, values.into_boxed_slice()))
    }

    /// On a union, any mutation of one field is a choice: drop every
    /// sibling. No-op for structs and exceptions.
    fn select(&mut self, position: usize) {
        if self.descriptor.variant() != MessageVariant::Union {
            return;
        }
        for i in 0..self.slots.len() {
            if i != position {
                self.slots[i] = Slot::Empty;
                self.bits.clear(i);
            }
        }
    }

    fn check_assignable(
        &self,
        position: usize,
        declared: &TypeDescriptor,
        value: &Value,
    ) -> Result<(), ValidationError> {
        if Self::assignable(declared, value) {
            Ok(())
        } else {
            Err(ValidationError::WrongKind {
                type_name: self.descriptor.qualified_name(),
                field: self.descriptor.fields()[position].name().to_owned(),
                expected: declared.kind(),
                found: value.kind(),
            })
        }
    }

    fn check_element(
        descriptor: &StructDescriptor,
        position: usize,
        declared: &TypeDescriptor,
        value: &Value,
    ) -> Result<(), ValidationError> {
        if Self::assignable(declared, value) {
            Ok(())
        } else {
            Err(ValidationError::WrongKind {
                type_name: descriptor.qualified_name(),
                field: descriptor.fields()[position].name().to_owned(),
                expected: declared.kind(),
                found: value.kind(),
            })
        }
    }

    /// Shallow kind check; named types additionally compare qualified
    /// names. Container elements are checked when inserted, not re-walked.
    fn assignable(declared: &TypeDescriptor, value: &Value) -> bool {
        match (declared, value) {
            (TypeDescriptor::Enum(descriptor), Value::Enum(value)) => {
                descriptor.qualified_name() == value.descriptor().qualified_name()
            }
            (TypeDescriptor::Message(descriptor), Value::Message(message)) => {
                descriptor.qualified_name() == message.descriptor().qualified_name()
            }
            _ => declared.kind() == value.kind(),
        }
    }
}
