//! Store failure modes.

use std::io;

use courier_codec::{DecodeError, EncodeError};

/// Anything that can go wrong reading or writing a record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not a record store: bad file magic")]
    BadFileMagic,

    #[error("corrupt store: bad record {boundary} magic")]
    BadRecordMagic { boundary: &'static str },

    #[error("corrupt store: record digest {actual} does not match stored {expected}")]
    DigestMismatch { expected: String, actual: String },

    #[error("truncated store while {context}")]
    Truncated { context: &'static str },

    #[error("record store is closed")]
    Closed,

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
