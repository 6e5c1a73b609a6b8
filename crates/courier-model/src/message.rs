//! Immutable, field-key-addressable messages.
//!
//! A [`Message`] is produced by [`MessageBuilder::build`] and never mutated
//! afterwards; it is cheap to clone and safe to share across threads. Reads
//! by unknown field key return a neutral result instead of failing, so the
//! generic `has`/`num`/`get` contract never panics for any key.

use std::cmp::Ordering;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::builder::MessageBuilder;
use crate::descriptor::StructDescriptor;
use crate::value::Value;

#[derive(Debug)]
struct Inner {
    descriptor: Arc<StructDescriptor>,
    /// Stored values, indexed by field position (not key). `None` means the
    /// field is absent; `Default`-tier reference fields stay `None` until
    /// explicitly set even though `get` falls back to their default.
    values: Box<[Option<Value>]>,
    /// Memoized content hash. Computation is pure, so racing readers that
    /// both compute it agree on the result.
    hash: OnceLock<u64>,
}

/// An immutable structured value addressed generically by field key.
#[derive(Clone, Debug)]
pub struct Message {
    inner: Arc<Inner>,
}

impl Message {
    pub(crate) fn from_parts(
        descriptor: Arc<StructDescriptor>,
        values: Box<[Option<Value>]>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                descriptor,
                values,
                hash: OnceLock::new(),
            }),
        }
    }

    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.inner.descriptor
    }

    /// Raw presence of a field. Unknown keys report `false`.
    pub fn has(&self, key: u16) -> bool {
        self.inner
            .descriptor
            .position_of(key)
            .is_some_and(|i| self.inner.values[i].is_some())
    }

    /// Element count: 0 when absent, container length for containers,
    /// 1 for present scalars. Unknown keys report 0.
    pub fn num(&self, key: u16) -> usize {
        self.inner
            .descriptor
            .position_of(key)
            .and_then(|i| self.inner.values[i].as_ref())
            .map_or(0, Value::num)
    }

    /// The *logical* value of a field: the stored value, or the field's
    /// effective default when unset. Unknown keys yield `None`.
    pub fn get(&self, key: u16) -> Option<Value> {
        let position = self.inner.descriptor.position_of(key)?;
        self.logical(position)
    }

    /// Stored value at a field position, without default fallback. This is
    /// the view codecs serialize: absent fields are omitted on the wire.
    pub fn stored_at(&self, position: usize) -> Option<&Value> {
        self.inner.values.get(position)?.as_ref()
    }

    fn logical(&self, position: usize) -> Option<Value> {
        if let Some(value) = &self.inner.values[position] {
            return Some(value.clone());
        }
        self.inner.descriptor.fields()[position].effective_default()
    }

    /// A builder seeded with this message's presence and values.
    pub fn mutate(&self) -> MessageBuilder {
        MessageBuilder::from_message(self)
    }

    /// Deterministic hash over the logical field values, memoized on first
    /// access.
    pub fn content_hash(&self) -> u64 {
        *self.inner.hash.get_or_init(|| {
            let mut hasher = DefaultHasher::new();
            self.inner.descriptor.qualified_name().hash(&mut hasher);
            for (position, field) in self.inner.descriptor.fields().iter().enumerate() {
                if let Some(value) = self.logical(position) {
                    hasher.write_u16(field.key());
                    value.hash(&mut hasher);
                }
            }
            hasher.finish()
        })
    }
}

impl std::fmt::Display for Message {
    /// `package.Name{field:value,...}` over the stored (not logical)
    /// fields, for logs and diagnostics.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{", self.inner.descriptor.qualified_name())?;
        let mut first = true;
        for (position, field) in self.inner.descriptor.fields().iter().enumerate() {
            let Some(value) = self.stored_at(position) else {
                continue;
            };
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{}:{}", field.name(), value)?;
        }
        f.write_str("}")
    }
}

impl PartialEq for Message {
    /// Structural equality over *logical* field values: a field explicitly
    /// set to its declared default equals the same field left unset.
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        let fields = self.inner.descriptor.fields();
        if self.inner.descriptor.qualified_name() != other.inner.descriptor.qualified_name()
            || fields.len() != other.inner.descriptor.fields().len()
        {
            return false;
        }
        (0..fields.len()).all(|i| self.logical(i) == other.logical(i))
    }
}

impl Eq for Message {}

impl Hash for Message {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.content_hash());
    }
}

impl PartialOrd for Message {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Message {
    /// Lexicographic walk over fields in declared order: logical presence
    /// first (absent sorts before present), then the value itself.
    fn cmp(&self, other: &Self) -> Ordering {
        let by_name = self
            .inner
            .descriptor
            .qualified_name()
            .cmp(&other.inner.descriptor.qualified_name());
        if by_name != Ordering::Equal {
            return by_name;
        }
        let positions = self
            .inner
            .descriptor
            .fields()
            .len()
            .min(other.inner.descriptor.fields().len());
        for i in 0..positions {
            let ordering = match (self.logical(i), other.logical(i)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(&b),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.inner
            .descriptor
            .fields()
            .len()
            .cmp(&other.inner.descriptor.fields().len())
    }
}
