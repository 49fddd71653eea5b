//! Construction contract for bound types.

use std::rc::Rc;

use crate::key::Key;
use crate::registry::ResolverContext;
use crate::traits::Resolver;

/// Handle passed to a constructor for one dependency.
///
/// `None` means the registry could not resolve the dependency. The
/// constructor still runs; what it does with a missing dependency is up to
/// the type.
pub type Dep<T> = Option<Rc<T>>;

/// Ordered dependency key list stored with each binding.
#[cfg(feature = "smallvec")]
pub type DependencyKeys = smallvec::SmallVec<[Key; 4]>;
#[cfg(not(feature = "smallvec"))]
pub type DependencyKeys = Vec<Key>;

/// An ordered list of dependency types, written as a tuple.
///
/// Implemented for `()` and for tuples of up to eight `'static` types.
/// Resolution runs left to right, each element being retrieved from the same
/// registry that is building the dependent.
pub trait Dependencies: 'static {
    /// The resolved handles, one [`Dep`] per tuple element, in order.
    type Resolved;

    /// Keys of the dependency types, in constructor argument order.
    fn keys() -> DependencyKeys;

    /// Retrieves every dependency through `ctx`.
    fn resolve(ctx: &ResolverContext<'_>) -> Self::Resolved;
}

impl Dependencies for () {
    type Resolved = ();

    fn keys() -> DependencyKeys {
        DependencyKeys::new()
    }

    fn resolve(_ctx: &ResolverContext<'_>) -> Self::Resolved {}
}

macro_rules! impl_dependencies {
    ($($dep:ident),+) => {
        impl<$($dep: 'static),+> Dependencies for ($($dep,)+) {
            type Resolved = ($(Dep<$dep>,)+);

            fn keys() -> DependencyKeys {
                let mut keys = DependencyKeys::new();
                $(keys.push(Key::of::<$dep>());)+
                keys
            }

            fn resolve(ctx: &ResolverContext<'_>) -> Self::Resolved {
                ($(ctx.retrieve::<$dep>(),)+)
            }
        }
    };
}

impl_dependencies!(A);
impl_dependencies!(A, B);
impl_dependencies!(A, B, C);
impl_dependencies!(A, B, C, D);
impl_dependencies!(A, B, C, D, E);
impl_dependencies!(A, B, C, D, E, F);
impl_dependencies!(A, B, C, D, E, F, G);
impl_dependencies!(A, B, C, D, E, F, G, H);

/// Types the registry can build from a list of dependencies.
///
/// `D` is the dependency tuple given at registration; the constructor
/// receives one [`Dep`] per element, in the same order.
///
/// # Examples
///
/// ```rust
/// use ferrous_registry::{Construct, Dep, Policy, Registry, Resolver};
/// use std::rc::Rc;
///
/// struct Config { url: &'static str }
/// impl Construct for Config {
///     fn construct(_: ()) -> Self { Config { url: "postgres://localhost" } }
/// }
///
/// struct Pool { config: Dep<Config> }
/// impl Construct<(Config,)> for Pool {
///     fn construct((config,): (Dep<Config>,)) -> Self { Pool { config } }
/// }
///
/// let mut registry = Registry::new();
/// registry.register::<Config, ()>(Policy::Exclusive);
/// registry.register::<Pool, (Config,)>(Policy::Exclusive);
///
/// let pool = registry.retrieve::<Pool>().unwrap();
/// let config = registry.retrieve::<Config>().unwrap();
/// assert!(Rc::ptr_eq(pool.config.as_ref().unwrap(), &config));
/// assert_eq!(config.url, "postgres://localhost");
/// ```
pub trait Construct<D: Dependencies = ()>: Sized + 'static {
    /// Builds a new value from resolved dependencies.
    fn construct(deps: D::Resolved) -> Self;
}
