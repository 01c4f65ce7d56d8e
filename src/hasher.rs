//! Streaming SHA-2 hashing
//!
//! Files are read in bounded chunks and fed to a fresh hasher per call, so
//! memory use is independent of file size and no state leaks between files.
//! The digest of a stream does not depend on the chunk size.
//!
//! ```rust
//! use dirdigest::hasher::{hash_bytes, ChunkedHasher};
//! use dirdigest::DigestWidth;
//!
//! let hasher = ChunkedHasher::new(DigestWidth::Sha256).with_chunk_size(2);
//! let digest = hasher.hash_reader(&b"hello"[..]).unwrap();
//! assert_eq!(digest, hash_bytes(DigestWidth::Sha256, b"hello"));
//! ```

use crate::error::{DigestError, Result};
use crate::types::{DigestWidth, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Incremental hasher state for one of the supported widths
#[derive(Clone)]
pub(crate) enum DigestState {
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl DigestState {
    pub(crate) fn new(width: DigestWidth) -> Self {
        match width {
            DigestWidth::Sha256 => DigestState::Sha256(Sha256::new()),
            DigestWidth::Sha384 => DigestState::Sha384(Sha384::new()),
            DigestWidth::Sha512 => DigestState::Sha512(Sha512::new()),
        }
    }

    pub(crate) fn update(&mut self, data: &[u8]) {
        match self {
            DigestState::Sha256(h) => h.update(data),
            DigestState::Sha384(h) => h.update(data),
            DigestState::Sha512(h) => h.update(data),
        }
    }

    /// Consume the state and return the lowercase hex digest
    pub(crate) fn finalize_hex(self) -> String {
        match self {
            DigestState::Sha256(h) => hex::encode(h.finalize()),
            DigestState::Sha384(h) => hex::encode(h.finalize()),
            DigestState::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

/// Streams byte sources through a SHA-2 function in bounded reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkedHasher {
    width: DigestWidth,
    chunk_size: usize,
}

impl ChunkedHasher {
    /// Create a hasher for the given width with the default 1 MiB chunk size
    pub fn new(width: DigestWidth) -> Self {
        Self {
            width,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the read size, clamped to `1..=MAX_CHUNK_SIZE`
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    /// Width of the digests produced
    pub fn width(&self) -> DigestWidth {
        self.width
    }

    /// Read size in bytes
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Hash everything readable from `reader`
    ///
    /// The reader is consumed to EOF. Interrupted reads are retried.
    pub fn hash_reader<R: Read>(&self, reader: R) -> io::Result<String> {
        self.hash_reader_counted(reader).map(|(digest, _)| digest)
    }

    /// Hash a reader and report how many bytes were consumed
    pub(crate) fn hash_reader_counted<R: Read>(&self, mut reader: R) -> io::Result<(String, u64)> {
        let mut state = DigestState::new(self.width);
        let mut buffer = vec![0u8; self.chunk_size];
        let mut total = 0u64;

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..bytes_read]);
            total += bytes_read as u64;
        }

        Ok((state.finalize_hex(), total))
    }

    /// Hash a file's content
    ///
    /// # Errors
    ///
    /// - [`DigestError::UnreadableFile`] naming `path` if the file cannot be
    ///   opened or a read fails part way through
    pub fn hash_file(&self, path: &Path) -> Result<String> {
        self.hash_file_counted(path).map(|(digest, _)| digest)
    }

    pub(crate) fn hash_file_counted(&self, path: &Path) -> Result<(String, u64)> {
        let file = File::open(path).map_err(|e| DigestError::unreadable(path, e))?;
        self.hash_reader_counted(file)
            .map_err(|e| DigestError::unreadable(path, e))
    }
}

/// Hash an in-memory byte slice
pub fn hash_bytes(width: DigestWidth, data: &[u8]) -> String {
    let mut state = DigestState::new(width);
    state.update(data);
    state.finalize_hex()
}
