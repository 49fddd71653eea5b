//! Resolver context handed to recipes.
//!
//! Constructors and factory closures resolve their dependencies through a
//! [`ResolverContext`], which forwards to the registry doing the build.

use std::any::Any;
use std::rc::Rc;

use crate::error::RegistryResult;
use crate::key::Key;
use crate::registry::Registry;
use crate::traits::ResolverCore;

/// Context passed to recipes while one binding is being built.
///
/// Every retrieval made through the context goes back to the same
/// registry. A dependency that cannot be produced is logged against the
/// binding being built and comes back as `None`; construction carries on.
///
/// # Examples
///
/// ```
/// use ferrous_registry::{Policy, Registry, Resolver};
/// use std::rc::Rc;
///
/// struct Database { url: String }
/// struct UserService { db: Option<Rc<Database>> }
///
/// let mut registry = Registry::new();
/// registry.register_factory::<Database, _>(Policy::Exclusive, |_| Database {
///     url: "postgres://localhost".to_string(),
/// });
/// registry.register_factory::<UserService, _>(Policy::PerRequest, |ctx| UserService {
///     db: ctx.retrieve::<Database>(),
/// });
///
/// let service = registry.retrieve::<UserService>().unwrap();
/// assert_eq!(service.db.as_ref().unwrap().url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    registry: &'a Registry,
    building: Key,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(registry: &'a Registry, building: Key) -> Self {
        Self { registry, building }
    }

    /// Key of the binding whose instance is being built.
    pub fn building(&self) -> Key {
        self.building
    }

    /// The registry doing the build.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, key: &Key) -> RegistryResult<Rc<dyn Any>> {
        let result = self.registry.resolve_any(key);
        if let Err(error) = &result {
            tracing::warn!(
                dependent = self.building.display_name(),
                dependency = key.display_name(),
                %error,
                "dependency unresolved, passing absent handle"
            );
        }
        result
    }
}
