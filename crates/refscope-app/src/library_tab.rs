use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use refscope_core::{DatabaseMode, Entry, Library};
use tracing::debug;

/// An open library shared between the interactive side, which mutates it,
/// and background tasks, which only read it.
#[derive(Clone, Default)]
pub struct LibraryTab {
    library: Arc<RwLock<Library>>,
    modified: Arc<AtomicBool>,
}

impl LibraryTab {
    pub fn new(library: Library) -> Self {
        Self {
            library: Arc::new(RwLock::new(library)),
            modified: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn mode(&self) -> DatabaseMode {
        self.read().mode
    }

    /// Read access for checks run off the interactive thread. Do not hold the
    /// guard across an `.await`.
    pub fn read(&self) -> RwLockReadGuard<'_, Library> {
        self.library.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_entry(&self, entry: Entry) -> usize {
        let mut library = self.library.write().unwrap_or_else(PoisonError::into_inner);
        debug!(id = %entry.id, entry_type = %entry.entry_type, "inserting entry");
        let index = library.insert_entry(entry);
        self.modified.store(true, Ordering::Release);
        index
    }

    pub fn snapshot(&self) -> Library {
        self.read().clone()
    }

    /// Whether an entry was inserted since the tab was opened.
    pub fn is_modified(&self) -> bool {
        self.modified.load(Ordering::Acquire)
    }
}
