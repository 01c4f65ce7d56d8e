//! Common types for dirdigest
//!
//! Configuration records and progress reporting types shared by the index
//! builder, the reevaluation workflow and the command line tools.

use crate::error::{DigestError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Default read size for streaming a file through a hasher (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Largest accepted read size (1 GiB); each worker allocates one buffer of this size
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024 * 1024;

/// Output width of the SHA-2 function used for a digest
///
/// Parses from `"256"`, `"384"`, `"512"` (optionally prefixed with `sha`)
/// and serializes as the bit count.
///
/// # Examples
///
/// ```rust
/// use dirdigest::DigestWidth;
///
/// let width: DigestWidth = "384".parse().unwrap();
/// assert_eq!(width, DigestWidth::Sha384);
/// assert_eq!(width.hex_len(), 96);
/// assert!("128".parse::<DigestWidth>().is_err());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum DigestWidth {
    /// SHA-256
    #[default]
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl DigestWidth {
    /// All supported widths, narrowest first
    pub const ALL: [DigestWidth; 3] = [DigestWidth::Sha256, DigestWidth::Sha384, DigestWidth::Sha512];

    /// Digest size in bits
    pub fn bits(self) -> u16 {
        match self {
            DigestWidth::Sha256 => 256,
            DigestWidth::Sha384 => 384,
            DigestWidth::Sha512 => 512,
        }
    }

    /// Length of the lowercase hex encoding of a digest of this width
    pub fn hex_len(self) -> usize {
        self.bits() as usize / 4
    }

    /// Find the width whose hex encoding has the given length
    pub fn from_hex_len(len: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|width| width.hex_len() == len)
    }
}

impl fmt::Display for DigestWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA-{}", self.bits())
    }
}

impl TryFrom<u16> for DigestWidth {
    type Error = DigestError;

    fn try_from(bits: u16) -> Result<Self> {
        match bits {
            256 => Ok(DigestWidth::Sha256),
            384 => Ok(DigestWidth::Sha384),
            512 => Ok(DigestWidth::Sha512),
            other => Err(DigestError::InvalidDigestWidth(other.to_string())),
        }
    }
}

impl From<DigestWidth> for u16 {
    fn from(width: DigestWidth) -> Self {
        width.bits()
    }
}

impl FromStr for DigestWidth {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let digits = lower
            .strip_prefix("sha-")
            .or_else(|| lower.strip_prefix("sha"))
            .unwrap_or(&lower);

        digits
            .parse::<u16>()
            .map_err(|_| DigestError::InvalidDigestWidth(trimmed.to_string()))
            .and_then(|bits| {
                DigestWidth::try_from(bits)
                    .map_err(|_| DigestError::InvalidDigestWidth(trimmed.to_string()))
            })
    }
}

/// Configuration for building a directory index
///
/// The per-file and aggregate widths are independent. The defaults
/// (SHA-256 per file, SHA-512 aggregate) match indexes produced by earlier
/// versions of the index tool, so a reevaluated index keeps its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    /// Width used to hash each file's content
    pub file_digest: DigestWidth,
    /// Width used to hash the sorted per-file digests
    pub aggregate_digest: DigestWidth,
    /// Bytes read per chunk while streaming a file
    pub chunk_size: usize,
    /// Number of worker threads hashing files
    pub parallel_workers: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            file_digest: DigestWidth::Sha256,
            aggregate_digest: DigestWidth::Sha512,
            chunk_size: DEFAULT_CHUNK_SIZE,
            parallel_workers: num_cpus::get(),
        }
    }
}

impl IndexOptions {
    /// Options using the same width for files and the aggregate
    pub fn uniform(width: DigestWidth) -> Self {
        Self {
            file_digest: width,
            aggregate_digest: width,
            ..Self::default()
        }
    }

    /// Check that the options can drive a build
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(DigestError::InvalidConfiguration(
                "chunk size must be at least 1 byte".to_string(),
            ));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(DigestError::InvalidConfiguration(format!(
                "chunk size {} exceeds the maximum of {} bytes",
                self.chunk_size, MAX_CHUNK_SIZE
            )));
        }
        if self.parallel_workers == 0 {
            return Err(DigestError::InvalidConfiguration(
                "at least one worker thread is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Progress callback for long-running operations
pub type ProgressCallback = Arc<dyn Fn(ProgressInfo) + Send + Sync>;

/// Information passed to progress callbacks
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Operation being performed
    pub operation: String,
    /// Current item being processed
    pub current_item: Option<String>,
    /// Items processed so far
    pub processed: usize,
    /// Total items to process (if known)
    pub total: Option<usize>,
    /// Bytes processed so far
    pub bytes_processed: u64,
}

impl ProgressInfo {
    /// Get progress as a percentage (0-100)
    pub fn percentage(&self) -> Option<f32> {
        match self.total {
            Some(total) if total > 0 => Some((self.processed as f32 / total as f32) * 100.0),
            _ => None,
        }
    }
}
