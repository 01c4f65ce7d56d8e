//! Index comparison
//!
//! [`compare`] turns an old and a new [`DirectoryIndex`] into a [`DiffResult`]
//! listing added, removed and modified files.
//!
//! Equal aggregate digests short-circuit the comparison: the result is empty
//! and the per-file tables are not inspected at all. Otherwise every path is
//! classified by key lookup. All three collections are ordered by path.
//!
//! Renames are not detected. A file moved without changing its bytes shows up
//! as one removal and one addition carrying the same digest.
//!
//! ```rust
//! use dirdigest::{compare, DigestWidth, DirectoryIndex};
//! use std::collections::BTreeMap;
//!
//! let mut old_files = BTreeMap::new();
//! old_files.insert("a.txt".to_string(), "aa".repeat(32));
//! old_files.insert("b.txt".to_string(), "bb".repeat(32));
//! let mut new_files = old_files.clone();
//! new_files.remove("b.txt");
//!
//! let old = DirectoryIndex::from_file_digests("/d", old_files, DigestWidth::Sha256);
//! let new = DirectoryIndex::from_file_digests("/d", new_files, DigestWidth::Sha256);
//!
//! let diff = compare(&old, &new);
//! assert_eq!(diff.removed.keys().collect::<Vec<_>>(), vec!["b.txt"]);
//! assert!(diff.added.is_empty() && diff.modified.is_empty());
//! ```

use crate::index::DirectoryIndex;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Old and new digest of a file present in both indexes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifiedDigest {
    /// Digest in the old index
    pub old: String,
    /// Digest in the new index
    pub new: String,
}

/// Kind of change recorded for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Present only in the new index
    Added,
    /// Present only in the old index
    Removed,
    /// Present in both with different digests
    Modified,
}

/// Result of comparing two directory indexes
///
/// A path appears in at most one of `added`, `removed` and `modified`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    /// Path -> digest for files only in the new index
    pub added: BTreeMap<String, String>,
    /// Path -> digest for files only in the old index
    pub removed: BTreeMap<String, String>,
    /// Path -> old/new digests for files whose content changed
    pub modified: BTreeMap<String, ModifiedDigest>,
    /// Whether the aggregate digests matched (and the tables were skipped)
    pub aggregates_match: bool,
}

impl DiffResult {
    /// Result for two indexes with equal aggregate digests
    fn matching() -> Self {
        Self {
            aggregates_match: true,
            ..Self::default()
        }
    }

    /// Whether no differences were found
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Number of changed paths across all three collections
    pub fn total_changes(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    /// Every changed path with its kind, ordered by path
    pub fn changes(&self) -> Vec<(&str, ChangeKind)> {
        let mut changes: Vec<(&str, ChangeKind)> = self
            .added
            .keys()
            .map(|p| (p.as_str(), ChangeKind::Added))
            .chain(self.removed.keys().map(|p| (p.as_str(), ChangeKind::Removed)))
            .chain(self.modified.keys().map(|p| (p.as_str(), ChangeKind::Modified)))
            .collect();
        changes.sort_by(|a, b| a.0.cmp(b.0));
        changes
    }
}

/// Compare an old index against a new one
pub fn compare(old: &DirectoryIndex, new: &DirectoryIndex) -> DiffResult {
    if old.aggregate_digest() == new.aggregate_digest() {
        debug!("Aggregate digests match, skipping per-file comparison");
        return DiffResult::matching();
    }

    let old_files = old.file_digests();
    let new_files = new.file_digests();
    let mut result = DiffResult::default();

    for (path, new_digest) in new_files {
        match old_files.get(path) {
            None => {
                result.added.insert(path.clone(), new_digest.clone());
            }
            Some(old_digest) if old_digest != new_digest => {
                result.modified.insert(
                    path.clone(),
                    ModifiedDigest {
                        old: old_digest.clone(),
                        new: new_digest.clone(),
                    },
                );
            }
            Some(_) => {}
        }
    }

    for (path, old_digest) in old_files {
        if !new_files.contains_key(path) {
            result.removed.insert(path.clone(), old_digest.clone());
        }
    }

    debug!(
        "Compared {} old and {} new files: {} added, {} removed, {} modified",
        old_files.len(),
        new_files.len(),
        result.added.len(),
        result.removed.len(),
        result.modified.len()
    );

    result
}
