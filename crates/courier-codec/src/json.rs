//! JSON codec.
//!
//! Output is plain JSON: quoted field names, enum members as quoted name
//! strings, binary as base64 strings, map keys rendered as strings so the
//! document stays valid regardless of the key kind. Decoding accepts the
//! relaxed shared text grammar, so everything the pretty format emits is
//! also readable here.

use std::io::{Read, Write};
use std::sync::Arc;

use courier_model::{Message, StructDescriptor};

use crate::codec::Codec;
use crate::error::{DecodeError, EncodeError};
use crate::text::writer::{JSON_COMPACT, JSON_PRETTY};
use crate::text::{decode_text, writer};

/// The JSON codec, compact by default.
#[derive(Clone, Copy, Default, Debug)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Indented, human-oriented output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Codec for JsonCodec {
    fn serialize(&self, out: &mut dyn Write, message: &Message) -> Result<usize, EncodeError> {
        let style = if self.pretty { JSON_PRETTY } else { JSON_COMPACT };
        let text = writer::write_message(message, style);
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
