//! Sequential reading of a store file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use courier_codec::{BinaryCodec, Codec};
use courier_model::{Message, StructDescriptor};

use crate::digest::Sha1Reader;
use crate::error::StoreError;
use crate::{DIGEST_LEN, FILE_MAGIC, RECORD_END_MAGIC, RECORD_START_MAGIC};

/// Whether the file at `path` starts with the record store magic. Short
/// and alien files answer `false`; only opening the file can fail.
pub fn probe(path: impl AsRef<Path>) -> std::io::Result<bool> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; FILE_MAGIC.len()];
    let mut filled = 0;
    while filled < magic.len() {
        let n = file.read(&mut magic[filled..])?;
        if n == 0 {
            return Ok(false);
        }
        filled += n;
    }
    Ok(magic == FILE_MAGIC)
}

enum State {
    /// File magic not verified yet.
    Unopened(BufReader<File>),
    /// Positioned at a record boundary.
    Ready(BufReader<File>),
    /// End of stream or a prior error; reads report end of stream.
    Closed,
}

/// Reads records in write order, verifying framing and digests.
///
/// Fail-closed: the first error of any kind closes the reader, so a
/// corrupt tail cannot be half-read by retrying.
pub struct RecordReader {
    state: Mutex<State>,
}

impl RecordReader {
    /// Open a store file. The file magic is checked on the first read, not
    /// here.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let file = BufReader::new(File::open(path)?);
        Ok(Self {
            state: Mutex::new(State::Unopened(file)),
        })
    }

    /// Read the next record, or `None` at a clean end of stream.
    pub fn read_next(
        &self,
        descriptor: &Arc<StructDescriptor>,
    ) -> Result<Option<Message>, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = match std::mem::replace(&mut *state, State::Closed) {
            State::Closed => return Ok(None),
            State::Unopened(mut file) => {
                check_file_magic(&mut file)?;
                file
            }
            State::Ready(file) => file,
        };
        // The state is already Closed; only a fully read record re-arms it.
        match read_record(&mut file, descriptor)? {
            Some(message) => {
                *state = State::Ready(file);
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    /// Drop the underlying file early. Later reads report end of stream.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = State::Closed;
    }
}

fn check_file_magic(file: &mut BufReader<File>) -> Result<(), StoreError> {
    let mut magic = [0u8; FILE_MAGIC.len()];
    file.read_exact(&mut magic).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => StoreError::BadFileMagic,
        _ => StoreError::Io(e),
    })?;
    if magic != FILE_MAGIC {
        return Err(StoreError::BadFileMagic);
    }
    Ok(())
}

fn read_record(
    file: &mut BufReader<File>,
    descriptor: &Arc<StructDescriptor>,
) -> Result<Option<Message>, StoreError> {
    match read_start_magic(file)? {
        BoundaryRead::End => return Ok(None),
        BoundaryRead::Present => {}
    }

    let mut tap = Sha1Reader::new(&mut *file);
    let message = BinaryCodec::new().deserialize(&mut tap, descriptor)?;
    let computed = tap.digest();

    let mut end = [0u8; RECORD_END_MAGIC.len()];
    read_exact(file, &mut end, "reading record end magic")?;
    if end != RECORD_END_MAGIC {
        return Err(StoreError::BadRecordMagic { boundary: "end" });
    }

    let mut stored = [0u8; DIGEST_LEN];
    read_exact(file, &mut stored, "reading record digest")?;
    if stored != computed {
        return Err(StoreError::DigestMismatch {
            expected: hex(&stored),
            actual: hex(&computed),
        });
    }
    Ok(Some(message))
}

fn hex(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

enum BoundaryRead {
    Present,
    End,
}

/// Zero bytes at a record boundary is the clean end of the stream; a
/// partial or wrong magic is corruption.
fn read_start_magic(file: &mut BufReader<File>) -> Result<BoundaryRead, StoreError> {
    let mut magic = [0u8; RECORD_START_MAGIC.len()];
    let mut filled = 0;
    while filled < magic.len() {
        let n = file.read(&mut magic[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(BoundaryRead::End);
            }
            return Err(StoreError::Truncated {
                context: "reading record start magic",
            });
        }
        filled += n;
    }
    if magic != RECORD_START_MAGIC {
        return Err(StoreError::BadRecordMagic { boundary: "start" });
    }
    Ok(BoundaryRead::Present)
}

fn read_exact(
    file: &mut BufReader<File>,
    buf: &mut [u8],
    context: &'static str,
) -> Result<(), StoreError> {
    file.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => StoreError::Truncated { context },
        _ => StoreError::Io(e),
    })
}
