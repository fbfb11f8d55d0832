//! Derives canonical resource identifiers from sharded storage paths.
//!
//! On disk, resources are sharded two directory levels deep to keep sibling
//! counts small:
//!
//! ```text
//! <root>/
//!   abc/
//!     def/
//!       1234-resource      <- file
//! ```
//!
//! The catalog identifier is the plain concatenation of the two immediate
//! parent directory names with the file name, `abcdef1234-resource` above.
//! No separator is inserted; this matches the identifiers existing catalogs
//! were populated with, ambiguous boundaries and all. No format validation
//! happens here either: malformed components yield malformed identifiers,
//! which reconciliation later reports as not found.

use std::fmt;
use std::path::{Component, Path, PathBuf};

#[derive(Debug)]
pub enum ResolveError {
    /// The file sits fewer than two directory levels beneath the root, so no
    /// shard names exist to derive an identifier from.
    PathStructure { path: PathBuf },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::PathStructure { path } => write!(
                f,
                "path `{}` is not nested two shard levels beneath the storage root",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Derive the catalog identifier for `file`, which must live beneath `root`.
///
/// Trees nested deeper than two levels are tolerated: only the two immediate
/// parent directories contribute, whatever sits above them.
pub fn derive_id(root: &Path, file: &Path) -> Result<String, ResolveError> {
    let structure_error = || ResolveError::PathStructure {
        path: file.to_path_buf(),
    };

    let relative = file.strip_prefix(root).map_err(|_| structure_error())?;
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    // shard1 / shard2 / filename at minimum
    if segments.len() < 3 {
        return Err(structure_error());
    }

    let tail = &segments[segments.len() - 3..];
    Ok(format!("{}{}{}", tail[0], tail[1], tail[2]))
}
