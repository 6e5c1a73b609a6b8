//! Human-oriented debug format.
//!
//! Bare field names, two-space indentation, enum members by bare name.
//! Reads back through the same relaxed grammar as JSON, so the format
//! round-trips; it is meant for logs, diffs and config files rather than
//! interchange.

use std::io::{Read, Write};
use std::sync::Arc;

use courier_model::{Message, StructDescriptor};

use crate::codec::Codec;
use crate::error::{DecodeError, EncodeError};
use crate::text::writer::PRETTY;
use crate::text::{decode_text, writer};

/// The pretty codec. Stateless.
#[derive(Clone, Copy, Default, Debug)]
pub struct PrettyCodec;

impl PrettyCodec {
    pub fn new() -> Self {
        Self
    }

    /// Render straight to a string.
    pub fn to_string(&self, message: &Message) -> String {
        writer::write_message(message, PRETTY)
    }
}

impl Codec for PrettyCodec {
    fn serialize(&self, out: &mut dyn Write, message: &Message) -> Result<usize, EncodeError> {
        let text = writer::write_message(message, PRETTY);
        out.write_all(text.as_bytes())?;
        Ok(text.len())
    }

    fn deserialize(
        &self,
        input: &mut dyn Read,
        descriptor: &Arc<StructDescriptor>,
    ) -> Result<Message, DecodeError> {
        decode_text(input, descriptor)
    }
}
