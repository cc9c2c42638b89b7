//! Memoized table loading keyed by path and modification time.
//!
//! A normalized table is immutable once built, so a cached entry is handed
//! out as an `Arc` and shared read-only. An entry is reused only while the
//! file's modification time and the [`LoadOptions`] it was normalized with are
//! unchanged; [`TableCache::invalidate`] drops it unconditionally.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use log::debug;

use crate::{
    error::LoadError,
    loader::{self, LoadOptions, SalesTable},
};

#[derive(Debug)]
struct CachedTable {
    modified: Option<SystemTime>,
    options: LoadOptions,
    table: Arc<SalesTable>,
}

#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<PathBuf, CachedTable>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &mut self,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<Arc<SalesTable>, LoadError> {
        let modified = modification_time(path)?;
        if let Some(entry) = self.entries.get(path)
            && entry.modified == modified
            && entry.options == *options
        {
            debug!("Cache hit for '{}'", path.display());
            return Ok(Arc::clone(&entry.table));
        }
        debug!("Cache miss for '{}'", path.display());
        let table = Arc::new(loader::load(path, options)?);
        self.entries.insert(
            path.to_path_buf(),
            CachedTable {
                modified,
                options: options.clone(),
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    pub fn invalidate(&mut self, path: &Path) -> bool {
        let removed = self.entries.remove(path).is_some();
        if removed {
            debug!("Invalidated cached table for '{}'", path.display());
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Filesystems without mtime support report `None`; such entries are still
// cached and refresh only on explicit invalidation.
fn modification_time(path: &Path) -> Result<Option<SystemTime>, LoadError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.modified().ok()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(LoadError::SourceNotFound(path.to_path_buf()))
        }
        Err(source) => Err(LoadError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
