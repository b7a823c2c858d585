//! Key-scoped creation lock
//!
//! At most one creation attempt may be in flight per (requester, category).
//! Acquisition hands out a [`CreationGuard`]; dropping the guard releases the
//! key, so every exit from the creation sequence (early return, error, or a
//! cancelled future) clears it.

use crate::types::TicketKey;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Set of keys with a creation attempt in flight
#[derive(Debug, Clone, Default)]
pub struct CreationLocks {
    inner: Arc<Mutex<HashSet<TicketKey>>>,
}

impl CreationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn keys(&self) -> MutexGuard<'_, HashSet<TicketKey>> {
        // The set stays consistent even if a holder panicked mid-insert.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim `key`, or `None` if an attempt for it is already in flight
    pub fn try_acquire(&self, key: TicketKey) -> Option<CreationGuard> {
        if self.keys().insert(key) {
            Some(CreationGuard {
                locks: self.clone(),
                key,
            })
        } else {
            None
        }
    }

    pub fn is_locked(&self, key: &TicketKey) -> bool {
        self.keys().contains(key)
    }

    pub fn in_flight(&self) -> usize {
        self.keys().len()
    }
}

/// Proof of an in-flight creation; releases its key on drop
#[derive(Debug)]
pub struct CreationGuard {
    locks: CreationLocks,
    key: TicketKey,
}

impl CreationGuard {
    pub fn key(&self) -> TicketKey {
        self.key
    }
}

impl Drop for CreationGuard {
    fn drop(&mut self) {
        self.locks.keys().remove(&self.key);
    }
}
