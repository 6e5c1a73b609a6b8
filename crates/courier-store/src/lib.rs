//! Append-only record files with per-record integrity digests.
//!
//! A store file is the file magic followed by zero or more framed records:
//!
//! ```text
//! record := RECORD_START_MAGIC  binary-encoded message  RECORD_END_MAGIC  sha1-digest
//! ```
//!
//! The digest covers the encoded message bytes, so any bit flip inside a
//! record is caught on read. Readers fail closed: the first structural or
//! integrity error poisons the reader and every later call reports end of
//! stream.

mod digest;
mod error;
mod reader;
mod writer;

#[cfg(test)]
mod store_tests;

pub use error::StoreError;
pub use reader::{RecordReader, probe};
pub use writer::RecordWriter;

/// Identifies a record store file. The non-ASCII lead byte and the mixed
/// CRLF/LF tail catch text-mode transcoding at the first read.
pub const FILE_MAGIC: [u8; 8] = *b"\x89CRS\r\n\x1a\n";

/// Frames the start of every record.
pub const RECORD_START_MAGIC: [u8; 4] = [0xc5, 0x52, 0x45, 0x43];

/// Frames the end of every record, just before its digest.
pub const RECORD_END_MAGIC: [u8; 4] = [0xc5, 0x45, 0x4e, 0x44];

/// SHA-1 digest length in bytes.
pub const DIGEST_LEN: usize = 20;
