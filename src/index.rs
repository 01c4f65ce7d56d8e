//! Directory index and its persisted form
//!
//! A [`DirectoryIndex`] pairs a scanned root with the hex digest of every
//! regular file under it and one aggregate digest over the whole set. It is
//! produced by [`IndexBuilder`](crate::builder::IndexBuilder) and never
//! mutated afterwards.
//!
//! ## Persisted format
//!
//! ```text
//! {
//!   "directory": "/srv/backup",
//!   "directory_hexdigest": "<aggregate digest, lowercase hex>",
//!   "file_hexdigest_table": { "<path>": "<hex digest>", ... }
//! }
//! ```
//!
//! Field names are fixed so indexes written by earlier tools keep loading.
//! The table is written with keys in sorted order.

use crate::builder::aggregate_digest;
use crate::error::{DigestError, Result};
use crate::types::DigestWidth;
use crate::utils::{atomic_write, is_lower_hex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source name used in errors for indexes parsed from memory
const IN_MEMORY_SOURCE: &str = "<memory>";

/// Content fingerprint of a directory tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryIndex {
    /// Root that was scanned
    #[serde(rename = "directory")]
    root: PathBuf,
    /// Digest over the sorted per-file digests
    #[serde(rename = "directory_hexdigest")]
    aggregate_digest: String,
    /// Relative path -> hex digest
    #[serde(rename = "file_hexdigest_table")]
    file_digests: BTreeMap<String, String>,
}

impl DirectoryIndex {
    /// Assemble an index, computing the aggregate digest from `file_digests`
    pub fn from_file_digests(
        root: impl Into<PathBuf>,
        file_digests: BTreeMap<String, String>,
        aggregate_width: DigestWidth,
    ) -> Self {
        let aggregate = aggregate_digest(aggregate_width, file_digests.values().map(String::as_str));
        Self {
            root: root.into(),
            aggregate_digest: aggregate,
            file_digests,
        }
    }

    /// Assemble an index from already computed parts without recomputing
    /// the aggregate
    ///
    /// Used when the parts come from elsewhere (a foreign tool, a test
    /// fixture). The result is not checked against `file_digests`.
    pub fn from_raw_parts(
        root: impl Into<PathBuf>,
        aggregate_digest: impl Into<String>,
        file_digests: BTreeMap<String, String>,
    ) -> Self {
        Self {
            root: root.into(),
            aggregate_digest: aggregate_digest.into(),
            file_digests,
        }
    }

    /// Root directory that was scanned
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Aggregate digest of the whole tree
    pub fn aggregate_digest(&self) -> &str {
        &self.aggregate_digest
    }

    /// Per-file digests keyed by path relative to the root
    pub fn file_digests(&self) -> &BTreeMap<String, String> {
        &self.file_digests
    }

    /// Digest recorded for a path
    pub fn get(&self, path: &str) -> Option<&str> {
        self.file_digests.get(path).map(String::as_str)
    }

    /// Number of files indexed
    pub fn len(&self) -> usize {
        self.file_digests.len()
    }

    /// Whether no files were indexed
    pub fn is_empty(&self) -> bool {
        self.file_digests.is_empty()
    }

    /// Width of the per-file digests, inferred from their length
    ///
    /// Returns `None` for an empty index.
    pub fn file_digest_width(&self) -> Option<DigestWidth> {
        self.file_digests
            .values()
            .next()
            .and_then(|digest| DigestWidth::from_hex_len(digest.len()))
    }

    /// Width of the aggregate digest, inferred from its length
    pub fn aggregate_digest_width(&self) -> Option<DigestWidth> {
        DigestWidth::from_hex_len(self.aggregate_digest.len())
    }

    /// Check that every digest is lowercase hex of a supported width and
    /// that all per-file digests share one width
    ///
    /// Every entry is checked, so a table whose first digest is already
    /// unusable is rejected rather than skipped. `source` names the index in
    /// the returned error.
    pub fn validate(&self, source: &Path) -> Result<()> {
        if !is_lower_hex(&self.aggregate_digest) || self.aggregate_digest_width().is_none() {
            return Err(DigestError::malformed(
                source,
                format!("directory_hexdigest '{}' is not a SHA-2 hex digest", self.aggregate_digest),
            ));
        }

        let mut table_width: Option<DigestWidth> = None;
        for (path, digest) in &self.file_digests {
            if path.is_empty() {
                return Err(DigestError::malformed(source, "file_hexdigest_table has an empty path"));
            }

            let width = match DigestWidth::from_hex_len(digest.len()) {
                Some(width) if is_lower_hex(digest) => width,
                _ => {
                    return Err(DigestError::malformed(
                        source,
                        format!("digest for '{}' is not a SHA-2 hex digest", path),
                    ))
                }
            };

            match table_width {
                None => table_width = Some(width),
                Some(expected) if expected != width => {
                    return Err(DigestError::malformed(
                        source,
                        format!("digest for '{}' is {}, the rest of the table is {}", path, width, expected),
                    ));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Serialize to the pretty-printed persisted format
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate an index from its persisted form
    pub fn from_json(json: &str) -> Result<Self> {
        Self::parse(json, Path::new(IN_MEMORY_SOURCE))
    }

    fn parse(json: &str, source: &Path) -> Result<Self> {
        let index: Self = serde_json::from_str(json)
            .map_err(|e| DigestError::malformed(source, e.to_string()))?;
        index.validate(source)?;
        Ok(index)
    }

    /// Load an index file
    ///
    /// # Errors
    ///
    /// - [`DigestError::InvalidPath`] if `path` is not an existing file
    /// - [`DigestError::UnreadableFile`] if it cannot be read
    /// - [`DigestError::MalformedIndex`] if it does not hold a valid index
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DigestError::invalid_path(path, "index file does not exist"));
        }

        let json = fs::read_to_string(path).map_err(|e| DigestError::unreadable(path, e))?;
        let index = Self::parse(&json, path)?;

        debug!("Loaded index of {} files from {:?}", index.len(), path);
        Ok(index)
    }

    /// Write the index to `path` atomically
    ///
    /// On failure the index is untouched and may be saved again elsewhere.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut json = self.to_json()?;
        json.push('\n');
        atomic_write(path, json.as_bytes())?;

        debug!("Wrote index of {} files to {:?}", self.len(), path);
        Ok(())
    }

    /// Write the persisted form to an arbitrary writer (e.g. stdout)
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let json = self.to_json()?;
        writeln!(writer, "{}", json).map_err(|e| DigestError::WriteFailure {
            path: PathBuf::from("<stream>"),
            source: e,
        })
    }
}
