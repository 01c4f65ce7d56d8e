//! Re-checking a saved index against the current state of its root
//!
//! The persisted format carries no width field, so the widths that produced
//! a saved index are read back from the length of its digests. Chunk size and
//! worker count come from the caller's options; they do not affect digests.

use crate::builder::IndexBuilder;
use crate::diff::{compare, DiffResult};
use crate::error::Result;
use crate::index::DirectoryIndex;
use crate::types::IndexOptions;
use std::path::Path;
use tracing::{info, warn};

/// Options that reproduce the digest widths of `saved`
///
/// An empty table gives no per-file width; `base.file_digest` is used then.
pub fn options_for(saved: &DirectoryIndex, base: &IndexOptions) -> Result<IndexOptions> {
    saved.validate(Path::new("<saved index>"))?;

    let mut options = base.clone();
    if let Some(width) = saved.file_digest_width() {
        options.file_digest = width;
    }
    if let Some(width) = saved.aggregate_digest_width() {
        options.aggregate_digest = width;
    }
    Ok(options)
}

/// Builder that rescans the root of `saved` with matching widths
pub fn rebuild_builder(saved: &DirectoryIndex, base: &IndexOptions) -> Result<IndexBuilder> {
    let options = options_for(saved, base)?;
    Ok(IndexBuilder::new(saved.root()).with_options(options))
}

/// Rebuild the index of `saved.root()` and compare the saved index against it
///
/// # Errors
///
/// - [`DigestError::MalformedIndex`](crate::DigestError::MalformedIndex) if the
///   saved digests are not valid SHA-2 hex
/// - any error of [`IndexBuilder::build`], e.g. the root no longer exists
pub fn reevaluate(saved: &DirectoryIndex, base: &IndexOptions) -> Result<DiffResult> {
    let fresh = rebuild_builder(saved, base)?.build()?;
    Ok(compare_with_fresh(saved, &fresh))
}

/// Load an index file and reevaluate it
pub fn reevaluate_file(index_path: &Path, base: &IndexOptions) -> Result<DiffResult> {
    let saved = DirectoryIndex::load(index_path)?;
    reevaluate(&saved, base)
}

/// Compare a saved index with a freshly built one, logging the outcome
pub fn compare_with_fresh(saved: &DirectoryIndex, fresh: &DirectoryIndex) -> DiffResult {
    if fresh.is_empty() && !saved.is_empty() {
        warn!("{:?} no longer contains any files", saved.root());
    }

    let diff = compare(saved, fresh);
    info!(
        "Reevaluated {:?}: {} changes",
        saved.root(),
        diff.total_changes()
    );
    diff
}
