//! Per-document build serialization
//!
//! Index builds for the same derived name must not overlap; builds for
//! different names may run concurrently. Readers never take these locks.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-name async lock manager for index builds.
///
/// Locks are created on first use and kept for the process lifetime; the set
/// of names is bounded by the documents directory.
pub struct BuildLockManager {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl BuildLockManager {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the build lock for `name`.
    pub fn get_lock(&self, name: &str) -> Arc<Mutex<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(name) {
                return lock.clone();
            }
        }

        let mut map = self.locks.write();
        // Another task may have inserted it between the two guards.
        map.entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for BuildLockManager {
    fn default() -> Self {
        Self::new()
    }
}
