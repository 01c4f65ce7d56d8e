//! Utility functions for dirdigest
//!
//! Path-key normalisation, atomic index writes, hex checks and byte formatting.

use crate::error::{DigestError, Result};
use std::io::Write;
use std::path::{Component, Path};
use tempfile::NamedTempFile;

/// Turn a path found under `root` into an index key
///
/// Keys are relative to `root` and always use `/` as the separator so an
/// index built on one platform compares cleanly with one built on another.
///
/// # Errors
///
/// - [`DigestError::InvalidPath`] if `path` is not under `root`
/// - [`DigestError::PathConversion`] if a component is not valid UTF-8
///
/// # Example
///
/// ```rust,ignore
/// use crate::utils::relative_key;
/// use std::path::Path;
///
/// let key = relative_key(Path::new("/srv/site/css/main.css"), Path::new("/srv/site"))?;
/// assert_eq!(key, "css/main.css");
/// ```
pub fn relative_key(path: &Path, root: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| DigestError::invalid_path(path, format!("not under {}", root.display())))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| DigestError::PathConversion(part.to_os_string()))?;
                parts.push(part);
            }
            Component::CurDir => {}
            other => {
                return Err(DigestError::invalid_path(
                    path,
                    format!("unexpected path component {:?}", other.as_os_str()),
                ))
            }
        }
    }

    Ok(parts.join("/"))
}

/// Whether `s` is a non-empty lowercase hexadecimal string
pub fn is_lower_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Atomic file write (write to temp file then rename)
///
/// The temporary file is created next to `path` so the final rename never
/// crosses filesystems. Either the complete content lands at `path` or the
/// previous file (if any) is left untouched.
///
/// # Errors
///
/// - [`DigestError::WriteFailure`] naming `path` for any step that fails
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let write_failure = |source: std::io::Error| DigestError::WriteFailure {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(parent).map_err(write_failure)?;
    temp.write_all(content).map_err(write_failure)?;
    temp.as_file().sync_all().map_err(write_failure)?;
    temp.persist(path).map_err(|e| write_failure(e.error))?;

    Ok(())
}

/// Format a byte count with binary (IEC) units, e.g. `1.50 KiB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    // floor(log2) / 10 picks the largest unit that keeps the value >= 1
    let exponent = ((63 - bytes.leading_zeros()) / 10).min(UNITS.len() as u32 - 1);
    let value = bytes as f64 / (1u64 << (10 * exponent)) as f64;
    format!("{:.2} {}", value, UNITS[exponent as usize])
}
