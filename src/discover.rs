//! Walks the local storage tree and builds the batch of migration candidates.
//!
//! Only leaf directories hold files; every other level is sharding structure
//! and contributes nothing by itself. Directory entries are visited in sorted
//! order so that collision resolution (last writer wins) is reproducible
//! across runs on the same tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::resolver;

/// A file found during discovery, paired with the identifier derived from
/// its path. Ephemeral: exists only for the duration of one migration run.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub derived_id: String,
    pub absolute_path: PathBuf,
}

/// One migration run's candidates, keyed by derived identifier. Each key maps
/// to exactly one source path at upload time.
pub type MigrationBatch = BTreeMap<String, PathBuf>;

/// Enumerate every file beneath `root` in deterministic (sorted) order.
///
/// An unreadable root aborts the run; unreadable subtrees and files with too
/// few ancestor directories are warned about and skipped.
pub fn discover_files(root: &Path) -> std::io::Result<Vec<DiscoveredFile>> {
    let mut found = Vec::new();
    for path in sorted_entries(root)? {
        descend(root, path, &mut found);
    }
    Ok(found)
}

/// Fold discovered files into a batch. On identifier collision the
/// last-discovered file wins.
pub fn into_batch(files: Vec<DiscoveredFile>) -> MigrationBatch {
    let mut batch = MigrationBatch::new();
    for file in files {
        if let Some(previous) = batch.insert(file.derived_id.clone(), file.absolute_path) {
            warn!(
                id = %file.derived_id,
                displaced = %previous.display(),
                "identifier collision, keeping last-discovered file"
            );
        }
    }
    batch
}

/// Walk `root` and return the resulting batch.
pub fn discover(root: &Path) -> std::io::Result<MigrationBatch> {
    let files = discover_files(root)?;
    debug!(count = files.len(), root = %root.display(), "discovery complete");
    Ok(into_batch(files))
}

fn descend(root: &Path, path: PathBuf, found: &mut Vec<DiscoveredFile>) {
    if path.is_dir() {
        let children = match sorted_entries(&path) {
            Ok(children) => children,
            Err(e) => {
                warn!(dir = %path.display(), error = ?e, "skipping unreadable directory");
                return;
            }
        };
        for child in children {
            descend(root, child, found);
        }
    } else if path.is_file() {
        match resolver::derive_id(root, &path) {
            Ok(derived_id) => {
                debug!(id = %derived_id, path = %path.display(), "discovered file");
                found.push(DiscoveredFile {
                    derived_id,
                    absolute_path: path,
                });
            }
            Err(e) => {
                warn!(error = %e, "skipping file outside the sharding structure");
            }
        }
    }
}

fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!(dir = %dir.display(), error = ?e, "skipping unreadable directory entry");
                None
            }
        })
        .collect();
    entries.sort();
    Ok(entries)
}
