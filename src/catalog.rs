use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;
use walkdir::WalkDir;

use crate::{extension_of, IMAGE_EXTENSIONS};

/// Scan `roots` for allow-listed image files.
///
/// Entries come out grouped by root, then by extension in `IMAGE_EXTENSIONS`
/// order, then in walk order. Roots that are missing, unreadable or not
/// directories contribute nothing.
pub fn build(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut entries = Vec::new();

    for root in roots {
        if !root.is_dir() {
            debug!(root = %root.display(), "skipping root: not a readable directory");
            continue;
        }

        // One walk per root, bucketed by extension
        let mut buckets: Vec<Vec<PathBuf>> = vec![Vec::new(); IMAGE_EXTENSIONS.len()];

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(root = %root.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(slot) = extension_of(entry.path())
                .and_then(|ext| IMAGE_EXTENSIONS.iter().position(|&valid_ext| valid_ext == ext))
            else {
                continue;
            };

            match absolute(entry.path()) {
                Some(path) => buckets[slot].push(path),
                None => debug!(path = %entry.path().display(), "could not make path absolute"),
            }
        }

        entries.extend(buckets.into_iter().flatten());
    }

    entries
}

fn absolute(path: &Path) -> Option<PathBuf> {
    std::path::absolute(path).ok()
}

/// The set of image paths found under a fixed list of roots.
///
/// Readers always observe a complete list: `refresh` builds the new list
/// off to the side and swaps it in under the write lock.
pub struct Catalog {
    roots: Vec<PathBuf>,
    entries: RwLock<Arc<Vec<PathBuf>>>,
    refresh_guard: Mutex<()>,
}

impl Catalog {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        let entries = build(&roots);
        debug!(roots = roots.len(), entries = entries.len(), "catalog built");

        Self {
            roots,
            entries: RwLock::new(Arc::new(entries)),
            refresh_guard: Mutex::new(()),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Re-scan the roots and replace the entries wholesale.
    pub fn refresh(&self) {
        // At most one scan in flight per catalog
        let _guard = self.refresh_guard.lock().unwrap_or_else(PoisonError::into_inner);

        let fresh = Arc::new(build(&self.roots));
        let count = fresh.len();

        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        debug!(entries = count, "catalog refreshed");
    }

    /// A consistent view of the entries as of the last completed scan.
    pub fn snapshot(&self) -> Arc<Vec<PathBuf>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*entries)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
