//! Shared machinery of the textual formats.
//!
//! JSON and pretty output differ only in styling; both decode through the
//! same lexer and descriptor-directed reader.

pub(crate) mod lexer;
pub(crate) mod reader;
pub(crate) mod writer;

use std::io::Read;
use std::sync::Arc;

use courier_model::{Message, StructDescriptor};

use crate::error::DecodeError;
use lexer::Tokenizer;

/// Decode one message from a text source. Trailing garbage after the
/// closing brace is an error.
pub(crate) fn decode_text(
    input: &mut dyn Read,
    descriptor: &Arc<StructDescriptor>,
) -> Result<Message, DecodeError> {
    let mut source = String::new();
    input
        .read_to_string(&mut source)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => DecodeError::InvalidUtf8 {
                context: "reading text input",
            },
            _ => DecodeError::Io(e),
        })?;
    let mut tokens = Tokenizer::new(&source);
    let message = reader::read_message(&mut tokens, descriptor)?;
    if let Some(extra) = tokens.next("parsing end of input")? {
        return Err(DecodeError::UnexpectedToken {
            token: extra.text.to_owned(),
            context: "parsing end of input",
        });
    }
    Ok(message)
}
