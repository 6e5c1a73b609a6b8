//! Appending records to a store file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use courier_codec::{BinaryCodec, Codec};
use courier_model::Message;

use crate::digest::digest_of;
use crate::error::StoreError;
use crate::{FILE_MAGIC, RECORD_END_MAGIC, RECORD_START_MAGIC};

/// Writes framed, digest-protected records. Safe to share across threads;
/// records from concurrent appends never interleave.
pub struct RecordWriter {
    out: Mutex<Option<BufWriter<File>>>,
}

impl RecordWriter {
    /// Create (or truncate) a store file and write the file magic.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(&FILE_MAGIC)?;
        Ok(Self {
            out: Mutex::new(Some(out)),
        })
    }

    /// Append one record, returning the number of bytes it occupies on
    /// disk including framing and digest.
    pub fn append(&self, message: &Message) -> Result<usize, StoreError> {
        let mut encoded = Vec::new();
        BinaryCodec::new().serialize(&mut encoded, message)?;
        let digest = digest_of(&encoded);

        let mut guard = self.out.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let out = guard.as_mut().ok_or(StoreError::Closed)?;
        out.write_all(&RECORD_START_MAGIC)?;
        out.write_all(&encoded)?;
        out.write_all(&RECORD_END_MAGIC)?;
        out.write_all(&digest)?;
        // Never leave a record on disk without its trailing digest.
        out.flush()?;
        Ok(RECORD_START_MAGIC.len() + encoded.len() + RECORD_END_MAGIC.len() + digest.len())
    }

    /// Flush and close. Appending afterwards reports [`StoreError::Closed`];
    /// closing twice is a no-op.
    pub fn close(&self) -> Result<(), StoreError> {
        let mut guard = self.out.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(mut out) = guard.take() {
            out.flush()?;
        }
        Ok(())
    }
}

impl Drop for RecordWriter {
    fn drop(&mut self) {
        // Flush failures on drop have nowhere to go.
        let _ = self.close();
    }
}
