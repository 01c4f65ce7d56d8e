//! # dirdigest - content fingerprints for directory trees
//!
//! Computes a deterministic digest for an entire directory tree and compares
//! two such fingerprints to report which files were added, removed or
//! changed. Useful for detecting drift in backups, deployed artifact trees
//! and archives without keeping a full copy around.
//!
//! ## Overview
//!
//! - [`ChunkedHasher`] streams one file through SHA-256/384/512 in bounded reads
//! - [`IndexBuilder`] hashes every regular file under a root and produces a
//!   [`DirectoryIndex`] with one aggregate digest over the sorted file digests
//! - [`compare`] diffs two indexes into a [`DiffResult`], returning early when
//!   the aggregate digests match
//! - [`reevaluate`] rebuilds the index of a saved root and diffs it against
//!   the saved copy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dirdigest::{compare, DirectoryIndex, IndexBuilder};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let before = IndexBuilder::new("/srv/www").build()?;
//! before.save(Path::new("www.index.json"))?;
//!
//! // ... time passes ...
//!
//! let saved = DirectoryIndex::load(Path::new("www.index.json"))?;
//! let after = IndexBuilder::new("/srv/www").build()?;
//! let diff = compare(&saved, &after);
//!
//! for (path, digest) in &diff.added {
//!     println!("new file {} ({})", path, digest);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Determinism
//!
//! The aggregate digest depends only on the set of per-file digest values,
//! never on the order the filesystem returns entries in or the number of
//! worker threads. Paths are not part of it, so a rename with unchanged
//! content leaves the aggregate untouched.
//!
//! ## Error Handling
//!
//! All operations return `Result<T, DigestError>`. Nothing is skipped or
//! retried: an unreadable file aborts the whole build and no partial index
//! is ever returned.

pub mod builder;
pub mod diff;
pub mod error;
pub mod hasher;
pub mod index;
pub mod reevaluate;
pub mod types;

mod utils;

pub use builder::{aggregate_digest, build_index, IndexBuilder};
pub use diff::{compare, ChangeKind, DiffResult, ModifiedDigest};
pub use error::{DigestError, Result};
pub use hasher::{hash_bytes, ChunkedHasher};
pub use index::DirectoryIndex;
pub use reevaluate::{reevaluate, reevaluate_file};
pub use types::*;
pub use utils::format_bytes;
