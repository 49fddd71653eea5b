//! Error types for the registry.

use thiserror::Error;

/// Registry errors.
///
/// The plain registry surface (`register*`, `retrieve`) never reports these:
/// a rejected registration is a silent no-op and an unresolvable request is
/// `None`. The `try_*` methods, [`Registry::validate`](crate::Registry::validate)
/// and configuration parsing expose the underlying reason.
///
/// # Examples
///
/// ```rust
/// use ferrous_registry::{Registry, RegistryError, Resolver};
///
/// struct Unbound;
///
/// let registry = Registry::new();
/// match registry.try_retrieve::<Unbound>() {
///     Err(RegistryError::NotFound(name)) => assert!(name.ends_with("Unbound")),
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_registry::RegistryError;
///
/// let circular = RegistryError::Circular(vec!["A", "B", "A"]);
/// assert_eq!(circular.to_string(), "circular dependency: A -> B -> A");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Registration attempted after [`seal`](crate::Registry::seal).
    #[error("registry is sealed, binding for {0} ignored")]
    Sealed(&'static str),
    /// The type already has a binding; the first one stays in effect.
    #[error("{0} is already bound")]
    AlreadyBound(&'static str),
    /// Neither a reusable instance nor a binding exists for the type.
    #[error("no binding for {0}")]
    NotFound(&'static str),
    /// The supplied value was never provided or its owner has dropped it.
    #[error("supplied instance of {0} is not available")]
    Released(&'static str),
    /// A stored instance did not downcast to the requested type.
    #[error("type mismatch for {0}")]
    TypeMismatch(&'static str),
    /// The type was requested again while it was still being built.
    #[error("circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Nested construction went deeper than the configured limit.
    #[error("max resolution depth {0} exceeded")]
    DepthExceeded(usize),
    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A dependency graph could not be serialized.
    #[error("graph export failed: {0}")]
    Export(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
