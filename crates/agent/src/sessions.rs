//! Per-session turn serialization.
//!
//! Two concurrent messages for one (profile, visitor session) must not both
//! load the same resumable conversation, race to append, or double-commit
//! quota. Each key gets one async mutex held for the whole turn; turns for
//! different keys proceed concurrently.
//!
//! The registry holds weak references: once every in-flight turn for a key
//! has dropped its handle the entry is dead, and dead entries are pruned on
//! the next lookup. Session ids are per-visitor UUIDs, so the map must not
//! retain a slot for every session ever seen.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use cardesk_core::domain::profile::ProfileId;

#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Weak<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, profile_id: &ProfileId, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let key = format!("{}:{}", profile_id.0, session_id);
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            // A panic while holding this registry lock leaves the map intact.
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.retain(|_, slot| slot.strong_count() > 0);

        if let Some(existing) = locks.get(&key).and_then(Weak::upgrade) {
            return existing;
        }
        let fresh = Arc::new(tokio::sync::Mutex::new(()));
        locks.insert(key, Arc::downgrade(&fresh));
        fresh
    }
}
