//! Per-repository serialisation.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Held for the duration of one repository-scoped request.
pub type RepoGuard = OwnedMutexGuard<()>;

/// One async mutex per repository root.
///
/// Requests against the same root queue behind each other; requests against
/// different roots never contend. Entries are created on first use and kept
/// for the life of the daemon.
#[derive(Debug, Default)]
pub struct RepoLocks {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl RepoLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `root`.
    pub async fn lock(&self, root: &Path) -> RepoGuard {
        let mutex = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(root.to_path_buf()).or_default())
        };
        mutex.lock_owned().await
    }

    /// Number of roots seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Returns true if no root has been locked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}
