//! Scoped search path for package resolution
//!
//! A provider pushes its root onto the search path for the duration of one
//! discovery call. The [`UsePath`] guard removes the entry again when dropped,
//! so a failed discovery cannot leave stale roots behind.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Ordered list of directories packages are resolved against; earlier
/// entries win.
#[derive(Debug, Default)]
pub struct SearchPath {
    entries: Mutex<Vec<PathBuf>>,
}

impl SearchPath {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put `path` first on the search path until the returned guard drops
    pub fn use_path(&self, path: impl Into<PathBuf>) -> UsePath<'_> {
        let path = path.into();
        self.lock().insert(0, path.clone());
        tracing::trace!(path = %path.display(), "Search path entry added");
        UsePath {
            search_path: self,
            path,
        }
    }

    /// First `<entry>/<relative>` that is an existing directory
    pub fn resolve(&self, relative: impl AsRef<Path>) -> Option<PathBuf> {
        let relative = relative.as_ref();
        self.lock()
            .iter()
            .map(|entry| entry.join(relative))
            .find(|candidate| candidate.is_dir())
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.lock().iter().any(|entry| entry == path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Guard returned by [`SearchPath::use_path`].
#[must_use = "the path is removed as soon as the guard is dropped"]
#[derive(Debug)]
pub struct UsePath<'a> {
    search_path: &'a SearchPath,
    path: PathBuf,
}

impl Drop for UsePath<'_> {
    fn drop(&mut self) {
        let mut entries = self.search_path.lock();
        if let Some(index) = entries.iter().position(|entry| *entry == self.path) {
            entries.remove(index);
        }
        tracing::trace!(path = %self.path.display(), "Search path entry released");
    }
}
