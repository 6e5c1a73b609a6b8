//! Descriptor-directed serialization for courier messages.
//!
//! Three formats share one [`Codec`] interface:
//!
//! - [`BinaryCodec`]: compact big-endian wire format with structural skip
//!   of unknown fields,
//! - [`JsonCodec`]: valid JSON, compact or indented,
//! - [`PrettyCodec`]: human-oriented text with bare names.
//!
//! All decoding is directed by the target's [`StructDescriptor`]; there is
//! no self-describing mode. The two text formats parse through a shared
//! relaxed grammar, so each can read the other's output.
//!
//! [`StructDescriptor`]: courier_model::StructDescriptor

mod binary;
mod codec;
mod error;
mod json;
mod pretty;
mod text;

#[cfg(test)]
mod test_schemas;

#[cfg(test)]
mod binary_tests;
#[cfg(test)]
mod pretty_tests;

pub use binary::BinaryCodec;
pub use codec::Codec;
pub use error::{DecodeError, EncodeError};
pub use json::JsonCodec;
pub use pretty::PrettyCodec;
