//! Observation hooks for registry events.
//!
//! Observers see every registration decision, build, reuse, miss and
//! release as it happens. The registry also emits `tracing` events for the
//! same moments; observers are for code that wants to react rather than log.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::error::RegistryError;
use crate::key::Key;
use crate::policy::Policy;

/// Observer for registry events.
///
/// All methods have empty defaults, so implementors pick what they need.
/// Calls are made synchronously on the registry's thread; keep them cheap.
///
/// # Examples
///
/// ```rust
/// use ferrous_registry::{Key, Policy, Registry, RegistryObserver, Resolver};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// #[derive(Default)]
/// struct BuildLog(RefCell<Vec<&'static str>>);
///
/// impl RegistryObserver for BuildLog {
///     fn built(&self, key: &Key, _policy: Policy, _elapsed: std::time::Duration) {
///         self.0.borrow_mut().push(key.short_name());
///     }
/// }
///
/// let log = Rc::new(BuildLog::default());
/// let mut registry = Registry::new();
/// registry.add_observer(log.clone());
/// registry.register_factory::<u32, _>(Policy::PerRequest, |_| 7);
/// registry.retrieve::<u32>();
/// registry.retrieve::<u32>();
/// assert_eq!(*log.0.borrow(), vec!["u32", "u32"]);
/// ```
pub trait RegistryObserver {
    /// A binding was stored.
    fn registered(&self, _key: &Key, _policy: Policy) {}

    /// A registration was dropped (sealed registry or duplicate binding).
    fn ignored(&self, _key: &Key, _reason: &RegistryError) {}

    /// A build is about to run for `key`.
    fn building(&self, _key: &Key) {}

    /// A new instance of `key` was built and tracked.
    fn built(&self, _key: &Key, _policy: Policy, _elapsed: Duration) {}

    /// An existing instance was handed out again.
    fn reused(&self, _key: &Key, _policy: Policy) {}

    /// A retrieval produced nothing.
    fn unresolved(&self, _key: &Key, _reason: &RegistryError) {}

    /// An owned instance is being released during teardown.
    fn released(&self, _key: &Key, _policy: Policy) {}
}

/// Registered observers, notified in registration order.
#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<Rc<dyn RegistryObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Rc<dyn RegistryObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn registered(&self, key: &Key, policy: Policy) {
        for observer in &self.observers {
            observer.registered(key, policy);
        }
    }

    pub(crate) fn ignored(&self, key: &Key, reason: &RegistryError) {
        for observer in &self.observers {
            observer.ignored(key, reason);
        }
    }

    #[inline]
    pub(crate) fn building(&self, key: &Key) {
        for observer in &self.observers {
            observer.building(key);
        }
    }

    #[inline]
    pub(crate) fn built(&self, key: &Key, policy: Policy, elapsed: Duration) {
        for observer in &self.observers {
            observer.built(key, policy, elapsed);
        }
    }

    #[inline]
    pub(crate) fn reused(&self, key: &Key, policy: Policy) {
        for observer in &self.observers {
            observer.reused(key, policy);
        }
    }

    pub(crate) fn unresolved(&self, key: &Key, reason: &RegistryError) {
        for observer in &self.observers {
            observer.unresolved(key, reason);
        }
    }

    pub(crate) fn released(&self, key: &Key, policy: Policy) {
        for observer in &self.observers {
            observer.released(key, policy);
        }
    }
}

/// Built-in observer keeping running counters.
///
/// # Examples
///
/// ```rust
/// use ferrous_registry::{MetricsObserver, Policy, Registry, Resolver};
/// use std::rc::Rc;
///
/// let metrics = Rc::new(MetricsObserver::new());
/// {
///     let mut registry = Registry::new();
///     registry.add_observer(metrics.clone());
///     registry.register_factory::<String, _>(Policy::Exclusive, |_| "db".to_string());
///     registry.retrieve::<String>();
///     registry.retrieve::<u8>();
/// }
/// assert_eq!(metrics.build_count(), 1);
/// assert_eq!(metrics.reuse_count(), 1);
/// assert_eq!(metrics.miss_count(), 1);
/// assert_eq!(metrics.release_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MetricsObserver {
    registrations: Cell<u64>,
    ignored: Cell<u64>,
    builds: Cell<u64>,
    reuses: Cell<u64>,
    misses: Cell<u64>,
    releases: Cell<u64>,
    total_build_time: Cell<Duration>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registration_count(&self) -> u64 {
        self.registrations.get()
    }

    pub fn ignored_count(&self) -> u64 {
        self.ignored.get()
    }

    pub fn build_count(&self) -> u64 {
        self.builds.get()
    }

    pub fn reuse_count(&self) -> u64 {
        self.reuses.get()
    }

    pub fn miss_count(&self) -> u64 {
        self.misses.get()
    }

    pub fn release_count(&self) -> u64 {
        self.releases.get()
    }

    /// Wall time spent in builds, nested builds counted in their parents too.
    pub fn total_build_time(&self) -> Duration {
        self.total_build_time.get()
    }

    pub fn average_build_time(&self) -> Option<Duration> {
        let count = self.build_count();
        if count == 0 {
            return None;
        }
        let nanos = self.total_build_time().as_nanos() / u128::from(count);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }

    pub fn reset(&self) {
        self.registrations.set(0);
        self.ignored.set(0);
        self.builds.set(0);
        self.reuses.set(0);
        self.misses.set(0);
        self.releases.set(0);
        self.total_build_time.set(Duration::ZERO);
    }
}

fn bump(counter: &Cell<u64>) {
    counter.set(counter.get().saturating_add(1));
}

impl RegistryObserver for MetricsObserver {
    fn registered(&self, _key: &Key, _policy: Policy) {
        bump(&self.registrations);
    }

    fn ignored(&self, _key: &Key, _reason: &RegistryError) {
        bump(&self.ignored);
    }

    fn built(&self, _key: &Key, _policy: Policy, elapsed: Duration) {
        bump(&self.builds);
        self.total_build_time.set(self.total_build_time.get().saturating_add(elapsed));
    }

    fn reused(&self, _key: &Key, _policy: Policy) {
        bump(&self.reuses);
    }

    fn unresolved(&self, _key: &Key, _reason: &RegistryError) {
        bump(&self.misses);
    }

    fn released(&self, _key: &Key, _policy: Policy) {
        bump(&self.releases);
    }
}
