//! SHA-1 tap over a byte stream.

use std::io::{self, Read};

use sha1::{Digest, Sha1};

use crate::DIGEST_LEN;

/// A `Read` adapter that hashes every byte passing through it. The decoder
/// pulls exactly one record's worth of bytes, so the final digest covers
/// precisely the encoded message.
pub(crate) struct Sha1Reader<R> {
    inner: R,
    hasher: Sha1,
}

impl<R: Read> Sha1Reader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha1::new(),
        }
    }

    /// Digest of everything read so far.
    pub fn digest(self) -> [u8; DIGEST_LEN] {
        self.hasher.finalize().into()
    }
}

impl<R: Read> Read for Sha1Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

/// Digest of a complete in-memory buffer.
pub(crate) fn digest_of(bytes: &[u8]) -> [u8; DIGEST_LEN] {
    Sha1::digest(bytes).into()
}
