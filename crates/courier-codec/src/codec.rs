//! The common serializer interface.

use std::io::{Read, Write};
use std::sync::Arc;

use courier_model::{Message, StructDescriptor};

use crate::error::{DecodeError, EncodeError};

/// A message serializer/deserializer over byte streams.
///
/// Implementations are stateless and object-safe; callers pick a format at
/// runtime and pass `&dyn Codec` around.
pub trait Codec {
    /// Write one message, returning the number of bytes written.
    fn serialize(&self, out: &mut dyn Write, message: &Message) -> Result<usize, EncodeError>;

    /// Read one message of the given type. A decode failure anywhere in the
    /// value tree fails the whole call; no partial message escapes.
    fn deserialize(
        &self,
        input: &mut dyn Read,
        descriptor: &Arc<StructDescriptor>,
    ) -> Result<Message, DecodeError>;
}
