// File: giveabot-core/src/services/claim_lock.rs
//
// Per-drop mutual exclusion for claim processing. Purely in-process: a
// crash mid-claim is recovered from the durable `claimed`/state columns,
// the lock only prevents concurrent double-delivery.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Map of drop ids currently being processed. Acquisition is try-only:
/// a second caller gets `None` immediately and should answer "being
/// processed" rather than queue up.
#[derive(Default)]
pub struct ClaimLocks {
    locks: Arc<DashMap<String, ()>>,
}

impl ClaimLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a guard when this call won the lock for `drop_id`. The
    /// guard releases on drop, so every exit path (success, denial,
    /// error, panic unwound into a caught task) releases.
    pub fn try_acquire(&self, drop_id: &str) -> Option<ClaimGuard> {
        match self.locks.entry(drop_id.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(v) => {
                v.insert(());
                Some(ClaimGuard {
                    locks: Arc::clone(&self.locks),
                    key: drop_id.to_string(),
                })
            }
        }
    }

    /// Whether some caller currently holds the lock (mostly for tests).
    pub fn is_held(&self, drop_id: &str) -> bool {
        self.locks.contains_key(drop_id)
    }
}

pub struct ClaimGuard {
    locks: Arc<DashMap<String, ()>>,
    key: String,
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        self.locks.remove(&self.key);
    }
}
