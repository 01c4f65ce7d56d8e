//! Directory scanning and index assembly
//!
//! [`IndexBuilder`] enumerates every regular file under a root (hidden
//! entries included, symlinks and special files skipped), hashes each one
//! with a [`ChunkedHasher`], and folds the results into a [`DirectoryIndex`].
//!
//! ## Aggregate digest
//!
//! The aggregate is computed over the per-file digest *values* only: they are
//! sorted as plain strings and fed, in that order, into a fresh hasher of the
//! configured aggregate width. Traversal order therefore never affects it,
//! and a pure rename leaves it unchanged.
//!
//! ## Parallelism
//!
//! Files are hashed on a dedicated rayon pool of `parallel_workers` threads.
//! The aggregate is only computed once every file has been hashed, and the
//! first failure stops the remaining work and is returned as-is; a partial
//! index is never produced.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dirdigest::{DigestWidth, IndexBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let index = IndexBuilder::new("./release")
//!     .with_file_digest(DigestWidth::Sha256)
//!     .with_aggregate_digest(DigestWidth::Sha512)
//!     .with_parallel_workers(4)
//!     .with_progress(|p| eprintln!("{}/{:?}", p.processed, p.total))
//!     .build()?;
//!
//! println!("{} files, digest {}", index.len(), index.aggregate_digest());
//! # Ok(())
//! # }
//! ```

use crate::error::{DigestError, Result};
use crate::hasher::{ChunkedHasher, DigestState};
use crate::index::DirectoryIndex;
use crate::types::{DigestWidth, IndexOptions, ProgressCallback, ProgressInfo};
use crate::utils::relative_key;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};
use walkdir::WalkDir;

/// Hash a set of per-file digests into one directory digest
///
/// The digests are sorted lexicographically before hashing, so the result
/// depends only on the multiset of values.
pub fn aggregate_digest<'a, I>(width: DigestWidth, digests: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sorted: Vec<&str> = digests.into_iter().collect();
    sorted.sort_unstable();

    let mut state = DigestState::new(width);
    for digest in sorted {
        state.update(digest.as_bytes());
    }
    state.finalize_hex()
}

/// Builds a [`DirectoryIndex`] for one root directory
///
/// Defaults come from [`IndexOptions::default`]: SHA-256 per file, SHA-512
/// aggregate, 1 MiB reads, one worker per CPU core.
pub struct IndexBuilder {
    root: PathBuf,
    options: IndexOptions,
    progress: Option<ProgressCallback>,
}

impl fmt::Debug for IndexBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("root", &self.root)
            .field("options", &self.options)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl IndexBuilder {
    /// Create a builder for `root` with default options
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: IndexOptions::default(),
            progress: None,
        }
    }

    /// Replace all options at once
    pub fn with_options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the width used for each file's digest
    pub fn with_file_digest(mut self, width: DigestWidth) -> Self {
        self.options.file_digest = width;
        self
    }

    /// Set the width used for the aggregate digest
    pub fn with_aggregate_digest(mut self, width: DigestWidth) -> Self {
        self.options.aggregate_digest = width;
        self
    }

    /// Set the read size used while streaming files
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.options.chunk_size = chunk_size;
        self
    }

    /// Set the number of hashing threads (minimum 1)
    pub fn with_parallel_workers(mut self, workers: usize) -> Self {
        self.options.parallel_workers = workers.max(1);
        self
    }

    /// Observe each completed file
    ///
    /// The callback runs on worker threads, once per file, after that file
    /// has been hashed.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressInfo) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Root directory this builder scans
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current options
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Scan the root and build its index
    ///
    /// # Errors
    ///
    /// - [`DigestError::InvalidConfiguration`] for a zero chunk size or worker count
    /// - [`DigestError::InvalidPath`] if the root is not an existing directory
    /// - [`DigestError::Walk`] if a directory under the root cannot be listed
    /// - [`DigestError::UnreadableFile`] if any file cannot be read
    /// - [`DigestError::PathConversion`] for a path that is not valid UTF-8
    pub fn build(&self) -> Result<DirectoryIndex> {
        self.options.validate()?;

        if !self.root.is_dir() {
            return Err(DigestError::invalid_path(&self.root, "directory not found"));
        }

        let start = Instant::now();
        let files = self.enumerate_files()?;
        let total = files.len();
        debug!("Found {} regular files under {:?}", total, self.root);

        let (file_digests, bytes) = self.hash_files(&files)?;
        let index = DirectoryIndex::from_file_digests(
            self.root.clone(),
            file_digests,
            self.options.aggregate_digest,
        );

        info!(
            "Indexed {} files ({} bytes) under {:?} in {:?}",
            index.len(),
            bytes,
            self.root,
            start.elapsed()
        );

        Ok(index)
    }

    /// Hash `files` on a pool of `parallel_workers` threads
    ///
    /// Returns the digest table keyed by path relative to the root and the
    /// total number of bytes read. The first failure stops the remaining
    /// work and is returned; no partial table escapes.
    fn hash_files(&self, files: &[PathBuf]) -> Result<(BTreeMap<String, String>, u64)> {
        let total = files.len();
        let hasher = ChunkedHasher::new(self.options.file_digest)
            .with_chunk_size(self.options.chunk_size);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.parallel_workers)
            .build()
            .map_err(|e| DigestError::ThreadPool(e.to_string()))?;

        let processed = AtomicUsize::new(0);
        let bytes_processed = AtomicU64::new(0);

        let records: Vec<(String, String)> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    let key = relative_key(path, &self.root)?;
                    let (digest, bytes) = hasher.hash_file_counted(path)?;
                    trace!("Hashed {} ({} bytes)", key, bytes);

                    let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    let bytes_done = bytes_processed.fetch_add(bytes, Ordering::Relaxed) + bytes;
                    if let Some(ref callback) = self.progress {
                        callback(ProgressInfo {
                            operation: "Hashing files".to_string(),
                            current_item: Some(key.clone()),
                            processed: done,
                            total: Some(total),
                            bytes_processed: bytes_done,
                        });
                    }

                    Ok((key, digest))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        Ok((records.into_iter().collect(), bytes_processed.into_inner()))
    }

    /// List every regular file under the root
    ///
    /// Hidden entries are included. Symlinks are not followed and are not
    /// themselves indexed.
    fn enumerate_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(false).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }
}

/// Build an index for `root` with the given options
pub fn build_index(root: impl Into<PathBuf>, options: IndexOptions) -> Result<DirectoryIndex> {
    IndexBuilder::new(root).with_options(options).build()
}
