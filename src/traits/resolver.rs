//! Resolver traits for retrieval.

use std::any::Any;
use std::rc::Rc;

use crate::error::{RegistryError, RegistryResult};
use crate::key::Key;

/// Object-safe core of retrieval.
///
/// Implemented by [`Registry`](crate::Registry) and by the
/// [`ResolverContext`](crate::ResolverContext) handed to recipes. Most code
/// uses the typed methods of [`Resolver`] instead.
pub trait ResolverCore {
    /// Returns a reusable instance for `key`, or builds (and tracks) a new one.
    fn resolve_any(&self, key: &Key) -> RegistryResult<Rc<dyn Any>>;
}

/// Typed retrieval on top of [`ResolverCore`].
///
/// Blanket-implemented for every `ResolverCore`, trait objects included.
///
/// # Examples
///
/// ```rust
/// use ferrous_registry::{Policy, Registry, Resolver};
///
/// let mut registry = Registry::new();
/// registry.register_factory::<String, _>(Policy::Exclusive, |_| "configuration".to_string());
///
/// let config = registry.retrieve::<String>().unwrap();
/// assert_eq!(config.as_str(), "configuration");
/// assert!(registry.retrieve::<u64>().is_none());
/// ```
pub trait Resolver: ResolverCore {
    /// Retrieves `T`, reporting why it could not be produced.
    fn try_retrieve<T: 'static>(&self) -> RegistryResult<Rc<T>> {
        let key = Key::of::<T>();
        let any = self.resolve_any(&key)?;
        any.downcast::<T>()
            .map_err(|_| RegistryError::TypeMismatch(key.display_name()))
    }

    /// Retrieves `T`, or `None` when it cannot be resolved.
    fn retrieve<T: 'static>(&self) -> Option<Rc<T>> {
        self.try_retrieve::<T>().ok()
    }

    /// Retrieves `T`, panicking when it cannot be resolved.
    ///
    /// # Panics
    ///
    /// Panics with the resolution error when `T` is unbound, released, or
    /// rejected by the configured cycle and depth checks.
    fn retrieve_required<T: 'static>(&self) -> Rc<T> {
        self.try_retrieve::<T>()
            .unwrap_or_else(|e| panic!("Failed to retrieve {}: {}", std::any::type_name::<T>(), e))
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
