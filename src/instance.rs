//! Tracked instances and their creation-ordered ledger.

use std::any::Any;
use std::rc::{Rc, Weak};

use crate::error::{RegistryError, RegistryResult};
use crate::key::Key;
use crate::policy::Policy;
use crate::registration::{AnyRc, KeyMap};

/// Storage for one tracked value.
pub(crate) enum Slot {
    /// Registry-owned; released at teardown.
    Owned(AnyRc),
    /// Caller-owned; the registry only observes it.
    Supplied(Weak<dyn Any>),
}

pub(crate) struct TrackedInstance {
    pub(crate) key: Key,
    pub(crate) policy: Policy,
    slot: Slot,
}

impl TrackedInstance {
    pub(crate) fn owned(key: Key, policy: Policy, value: AnyRc) -> Self {
        debug_assert!(policy.is_owned());
        Self { key, policy, slot: Slot::Owned(value) }
    }

    pub(crate) fn supplied(key: Key, value: Weak<dyn Any>) -> Self {
        Self { key, policy: Policy::Supplied, slot: Slot::Supplied(value) }
    }

    /// A strong handle to the value, if it is still alive.
    pub(crate) fn handle(&self) -> RegistryResult<AnyRc> {
        match &self.slot {
            Slot::Owned(value) => Ok(value.clone()),
            Slot::Supplied(weak) => weak
                .upgrade()
                .ok_or(RegistryError::Released(self.key.display_name())),
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        match &self.slot {
            Slot::Owned(_) => true,
            Slot::Supplied(weak) => weak.strong_count() > 0,
        }
    }
}

/// All tracked instances in creation order.
///
/// Reusable entries (exclusive, supplied) are indexed by key; the index
/// keeps the first entry recorded for a key. Per-request entries are only
/// appended.
#[derive(Default)]
pub(crate) struct InstanceLedger {
    entries: Vec<TrackedInstance>,
    reusable: KeyMap<usize>,
}

impl InstanceLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, instance: TrackedInstance) {
        if instance.policy.is_reusable() && !self.reusable.contains_key(&instance.key) {
            self.reusable.insert(instance.key, self.entries.len());
        }
        self.entries.push(instance);
    }

    #[inline]
    pub(crate) fn find_reusable(&self, key: &Key) -> Option<&TrackedInstance> {
        self.reusable.get(key).map(|&i| &self.entries[i])
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn count_of(&self, key: &Key) -> usize {
        self.entries.iter().filter(|e| &e.key == key).count()
    }

    /// Like [`count_of`](Self::count_of), skipping supplied entries whose
    /// value is gone.
    pub(crate) fn live_count_of(&self, key: &Key) -> usize {
        self.entries
            .iter()
            .filter(|e| &e.key == key && e.is_alive())
            .count()
    }

    /// Empties the ledger newest-first. `on_release` sees each owned entry
    /// right before its handle is dropped; supplied entries are discarded
    /// without touching the value.
    pub(crate) fn release_all<F>(&mut self, mut on_release: F)
    where
        F: FnMut(&TrackedInstance),
    {
        self.reusable.clear();
        while let Some(instance) = self.entries.pop() {
            if instance.policy.is_owned() {
                on_release(&instance);
            }
        }
    }
}
