//! Binding descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::policy::Policy;

/// Snapshot of one binding.
///
/// Produced by [`Registry::descriptors`](crate::Registry::descriptors), in
/// registration order. Changing the registry afterwards does not update an
/// existing descriptor.
///
/// # Examples
///
/// ```rust
/// use ferrous_registry::{Construct, Dep, Key, Policy, Registry};
///
/// struct Database;
/// impl Construct for Database {
///     fn construct(_: ()) -> Self { Database }
/// }
///
/// struct Repository { db: Dep<Database> }
/// impl Construct<(Database,)> for Repository {
///     fn construct((db,): (Dep<Database>,)) -> Self { Repository { db } }
/// }
///
/// let mut registry = Registry::new();
/// registry.register::<Database, ()>(Policy::Exclusive);
/// registry.register::<Repository, (Database,)>(Policy::PerRequest);
///
/// let descriptors = registry.descriptors();
/// let repo = descriptors.iter().find(|d| d.key == Key::of::<Repository>()).unwrap();
/// assert_eq!(repo.dependencies, vec![Key::of::<Database>()]);
/// assert!(repo.depends_on(&Key::of::<Database>()));
/// assert_eq!(repo.live_instances, 0);
///
/// let db = descriptors.iter().find(|d| d.key == Key::of::<Database>()).unwrap();
/// assert_eq!(db.live_instances, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDescriptor {
    /// The bound type
    pub key: Key,
    /// Policy given at registration
    pub policy: Policy,
    /// Declared dependencies, in constructor order. Closure and supplied
    /// bindings declare none.
    pub dependencies: Vec<Key>,
    /// Tracked instances of this type that are still alive
    pub live_instances: usize,
}

impl BindingDescriptor {
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    pub fn depends_on(&self, key: &Key) -> bool {
        self.dependencies.contains(key)
    }

    /// A supplied binding whose value is missing or already dropped.
    pub fn is_vacant(&self) -> bool {
        self.policy == Policy::Supplied && self.live_instances == 0
    }
}
