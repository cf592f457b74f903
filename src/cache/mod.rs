//! Index caching
//!
//! By default every request rebuilds the content index from disk. In watch
//! mode the index is kept in memory and dropped wholesale whenever anything
//! in the content directory changes; the next reader rebuilds it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::content::ContentIndex;

/// Where request handlers get their index from
#[derive(Debug, Clone)]
pub enum IndexSource {
    /// Rebuild from disk on every call
    Fresh(PathBuf),
    /// Share one index until invalidated
    Cached(Arc<IndexCache>),
}

impl IndexSource {
    pub fn fresh<P: Into<PathBuf>>(dir: P) -> Self {
        IndexSource::Fresh(dir.into())
    }

    pub fn cached<P: Into<PathBuf>>(dir: P) -> Self {
        IndexSource::Cached(Arc::new(IndexCache::new(dir)))
    }

    /// Current index; blocking, since it may read the content directory
    pub fn load(&self) -> Arc<ContentIndex> {
        match self {
            IndexSource::Fresh(dir) => Arc::new(ContentIndex::load(dir)),
            IndexSource::Cached(cache) => cache.get(),
        }
    }

    pub fn dir(&self) -> &Path {
        match self {
            IndexSource::Fresh(dir) => dir,
            IndexSource::Cached(cache) => cache.dir(),
        }
    }
}

/// Read-mostly holder of the last built index
#[derive(Debug)]
pub struct IndexCache {
    dir: PathBuf,
    slot: RwLock<Option<Arc<ContentIndex>>>,
}

impl IndexCache {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            slot: RwLock::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Return the cached index, building it first if needed
    pub fn get(&self) -> Arc<ContentIndex> {
        if let Some(index) = self.read_slot().as_ref() {
            return Arc::clone(index);
        }

        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        // Another writer may have filled it while we waited
        if let Some(index) = slot.as_ref() {
            return Arc::clone(index);
        }

        let index = Arc::new(ContentIndex::load(&self.dir));
        tracing::info!("Built content index ({} updates)", index.len());
        *slot = Some(Arc::clone(&index));
        index
    }

    /// Drop the cached index
    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        if slot.take().is_some() {
            tracing::debug!("Content index invalidated");
        }
    }

    #[cfg(test)]
    pub(crate) fn is_loaded(&self) -> bool {
        self.read_slot().is_some()
    }

    fn read_slot(&self) -> std::sync::RwLockReadGuard<'_, Option<Arc<ContentIndex>>> {
        self.slot.read().unwrap_or_else(|e| e.into_inner())
    }
}
