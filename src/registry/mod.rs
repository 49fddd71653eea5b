//! The registry: bindings, tracked instances, retrieval and teardown.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use crate::config::RegistryConfig;
use crate::descriptors::BindingDescriptor;
use crate::error::{RegistryError, RegistryResult};
use crate::instance::{InstanceLedger, TrackedInstance};
use crate::internal::ResolutionStack;
use crate::key::Key;
use crate::observer::{Observers, RegistryObserver};
use crate::policy::Policy;
use crate::registration::{AnyRc, ConstructorRecipe, FactoryRecipe, Recipe, RecipeTable, SuppliedRecipe};
use crate::traits::{Construct, Dependencies, ResolverCore};

pub mod context;
pub use context::ResolverContext;

/// Object registry that builds instances on demand and owns what it builds.
///
/// A registry maps each bound type to one recipe and keeps every instance
/// it hands out in creation order. Retrieval reuses an exclusive or supplied
/// instance when one exists; otherwise it runs the recipe, which retrieves
/// each dependency from the same registry first. Dropping the registry
/// releases owned instances newest-first, so an instance is always released
/// before the instances it was built from. Supplied instances are left to
/// their owner.
///
/// The registry is an ordinary value with a single owner. It is not `Send`
/// and has no global instance; pass it (or a reference to it) to whatever
/// needs it.
///
/// # Failure handling
///
/// Registering a type that is already bound, or registering into a sealed
/// registry, does nothing. Retrieving a type that cannot be produced returns
/// `None`, and a constructor whose dependency cannot be produced receives
/// `None` for it. The `try_*` methods report the reason instead.
///
/// # Examples
///
/// ```
/// use ferrous_registry::{Construct, Dep, Policy, Registry, Resolver};
/// use std::rc::Rc;
///
/// struct A;
/// impl Construct for A {
///     fn construct(_: ()) -> Self { A }
/// }
///
/// struct B;
/// impl Construct for B {
///     fn construct(_: ()) -> Self { B }
/// }
///
/// struct C { a: Dep<A>, b: Dep<B> }
/// impl Construct<(A, B)> for C {
///     fn construct((a, b): (Dep<A>, Dep<B>)) -> Self { C { a, b } }
/// }
///
/// let mut registry = Registry::new();
/// registry.register::<A, ()>(Policy::Exclusive);
/// registry.register::<B, ()>(Policy::PerRequest);
/// registry.register::<C, (A, B)>(Policy::Exclusive);
///
/// let a1 = registry.retrieve::<A>().unwrap();
/// let a2 = registry.retrieve::<A>().unwrap();
/// assert!(Rc::ptr_eq(&a1, &a2));
///
/// let b1 = registry.retrieve::<B>().unwrap();
/// let b2 = registry.retrieve::<B>().unwrap();
/// assert!(!Rc::ptr_eq(&b1, &b2));
///
/// let c1 = registry.retrieve::<C>().unwrap();
/// assert!(Rc::ptr_eq(c1.a.as_ref().unwrap(), &a1));
/// assert!(c1.b.is_some());
/// let c2 = registry.retrieve::<C>().unwrap();
/// assert!(Rc::ptr_eq(&c1, &c2));
/// ```
pub struct Registry {
    recipes: RecipeTable,
    instances: RefCell<InstanceLedger>,
    stack: ResolutionStack,
    observers: Observers,
    config: RegistryConfig,
    sealed: bool,
}

impl Registry {
    /// Creates an open registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an open registry with `config`. A `max_depth` of `Some(0)`
    /// is treated as unlimited.
    pub fn with_config(mut config: RegistryConfig) -> Self {
        config.max_depth = config.max_depth.filter(|&depth| depth > 0);
        Self {
            recipes: RecipeTable::new(),
            instances: RefCell::new(InstanceLedger::new()),
            stack: ResolutionStack::new(),
            observers: Observers::new(),
            config,
            sealed: false,
        }
    }

    /// Configuration in effect for this registry.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Adds an observer. Observers are not bindings, so this works on a
    /// sealed registry too.
    pub fn add_observer(&mut self, observer: Rc<dyn RegistryObserver>) {
        self.observers.add(observer);
    }

    // ----- Registration -----

    /// Binds `T`, built from the dependency tuple `D`, under `policy`.
    ///
    /// With [`Policy::Exclusive`] the instance is built right away (unless
    /// the registry is configured for lazy exclusive builds). With
    /// [`Policy::PerRequest`] only the binding is stored. [`Policy::Supplied`]
    /// without a value binds a vacant entry that always retrieves as `None`;
    /// use [`register_with`](Self::register_with) or
    /// [`register_supplied`](Self::register_supplied) to pass the value.
    ///
    /// Does nothing if `T` is already bound or the registry is sealed.
    pub fn register<T, D>(&mut self, policy: Policy)
    where
        T: Construct<D>,
        D: Dependencies,
    {
        self.register_with::<T, D>(policy, None);
    }

    /// Binds `T` with an optional caller-owned value.
    ///
    /// `supplied` is only used when `policy` is [`Policy::Supplied`]; the
    /// registry keeps a weak handle to it and never destroys it. Dependents
    /// the registry builds do keep it alive; see
    /// [`register_supplied`](Self::register_supplied).
    pub fn register_with<T, D>(&mut self, policy: Policy, supplied: Option<&Rc<T>>)
    where
        T: Construct<D>,
        D: Dependencies,
    {
        let _ = self.try_register_with::<T, D>(policy, supplied);
    }

    /// Like [`register_with`](Self::register_with), reporting why a
    /// registration was ignored.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Sealed`] after [`seal`](Self::seal), and
    /// [`RegistryError::AlreadyBound`] if `T` already has a binding. In both
    /// cases the registry is unchanged.
    pub fn try_register_with<T, D>(&mut self, policy: Policy, supplied: Option<&Rc<T>>) -> RegistryResult<()>
    where
        T: Construct<D>,
        D: Dependencies,
    {
        let supplied = supplied.map(|value| Rc::downgrade(value) as Weak<dyn Any>);
        self.bind(Box::new(ConstructorRecipe::<T, D>::new(policy)), supplied)
    }

    /// Binds a caller-owned value of `T`. `T` needs no constructor.
    ///
    /// The registry itself only keeps a weak handle, but dependents it builds
    /// hold strong ones. If the caller drops its handle while such a
    /// dependent is alive, the value stays retrievable and is destroyed
    /// along with the last dependent, which may be during teardown.
    ///
    /// ```
    /// use ferrous_registry::{Registry, Resolver};
    /// use std::rc::Rc;
    ///
    /// struct Settings { verbose: bool }
    ///
    /// let settings = Rc::new(Settings { verbose: true });
    /// let mut registry = Registry::new();
    /// registry.register_supplied(&settings);
    ///
    /// let found = registry.retrieve::<Settings>().unwrap();
    /// assert!(Rc::ptr_eq(&found, &settings));
    /// assert!(found.verbose);
    /// ```
    pub fn register_supplied<T: 'static>(&mut self, value: &Rc<T>) {
        let _ = self.try_register_supplied(value);
    }

    /// Like [`register_supplied`](Self::register_supplied), reporting why a
    /// registration was ignored.
    pub fn try_register_supplied<T: 'static>(&mut self, value: &Rc<T>) -> RegistryResult<()> {
        let weak = Rc::downgrade(value) as Weak<dyn Any>;
        self.bind(Box::new(SuppliedRecipe::<T>::new()), Some(weak))
    }

    /// Binds `T` to a closure recipe. The closure resolves whatever it needs
    /// through the [`ResolverContext`] it receives.
    ///
    /// ```
    /// use ferrous_registry::{Policy, Registry, Resolver};
    ///
    /// let mut registry = Registry::new();
    /// registry.register_factory::<u16, _>(Policy::Exclusive, |_| 8080);
    /// registry.register_factory::<String, _>(Policy::PerRequest, |ctx| {
    ///     let port = ctx.retrieve::<u16>().map(|p| *p).unwrap_or(80);
    ///     format!("listening on {}", port)
    /// });
    ///
    /// assert_eq!(registry.retrieve::<String>().unwrap().as_str(), "listening on 8080");
    /// ```
    pub fn register_factory<T, F>(&mut self, policy: Policy, factory: F)
    where
        T: 'static,
        F: Fn(&ResolverContext<'_>) -> T + 'static,
    {
        let _ = self.try_register_factory(policy, factory);
    }

    /// Like [`register_factory`](Self::register_factory), reporting why a
    /// registration was ignored.
    pub fn try_register_factory<T, F>(&mut self, policy: Policy, factory: F) -> RegistryResult<()>
    where
        T: 'static,
        F: Fn(&ResolverContext<'_>) -> T + 'static,
    {
        self.bind(Box::new(FactoryRecipe::new(policy, factory)), None)
    }

    fn bind(&mut self, recipe: Box<dyn Recipe>, supplied: Option<Weak<dyn Any>>) -> RegistryResult<()> {
        let key = recipe.key();
        let policy = recipe.policy();

        if self.sealed {
            return Err(self.ignore(key, RegistryError::Sealed(key.display_name())));
        }
        if self.recipes.contains(&key) {
            return Err(self.ignore(key, RegistryError::AlreadyBound(key.display_name())));
        }

        tracing::debug!(
            ty = key.display_name(),
            %policy,
            dependencies = ?recipe.dependencies(),
            "binding stored"
        );
        self.recipes.insert(recipe);
        self.observers.registered(&key, policy);

        match policy {
            Policy::Exclusive if self.config.eager_exclusive => {
                // Failures were already logged and observed.
                let _ = self.resolve_any(&key);
            }
            Policy::Supplied => {
                let vacant: Weak<dyn Any> = Weak::<()>::new();
                let value = supplied.unwrap_or(vacant);
                if value.strong_count() == 0 {
                    tracing::warn!(ty = key.display_name(), "supplied binding has no live value");
                }
                self.instances.get_mut().push(TrackedInstance::supplied(key, value));
            }
            _ => {}
        }

        Ok(())
    }

    fn ignore(&self, key: Key, reason: RegistryError) -> RegistryError {
        tracing::debug!(ty = key.display_name(), %reason, "registration ignored");
        self.observers.ignored(&key, &reason);
        reason
    }

    /// Closes the registry to further registration. Irreversible.
    ///
    /// Retrieval is unaffected, including builds of bindings registered
    /// before sealing.
    ///
    /// ```
    /// use ferrous_registry::{Policy, Registry, Resolver};
    ///
    /// let mut registry = Registry::new();
    /// registry.seal();
    /// registry.register_factory::<u8, _>(Policy::Exclusive, |_| 1);
    /// assert!(registry.is_sealed());
    /// assert!(registry.retrieve::<u8>().is_none());
    /// ```
    pub fn seal(&mut self) {
        if !self.sealed {
            self.sealed = true;
            tracing::debug!(bindings = self.recipes.len(), "registry sealed");
        }
    }

    /// Whether [`seal`](Self::seal) has been called.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    // ----- Retrieval -----

    fn resolve_tracked(&self, key: &Key) -> RegistryResult<AnyRc> {
        let existing = self
            .instances
            .borrow()
            .find_reusable(key)
            .map(|instance| (instance.policy, instance.handle()));
        if let Some((policy, handle)) = existing {
            let value = handle?;
            self.observers.reused(key, policy);
            return Ok(value);
        }

        let recipe = self
            .recipes
            .get(key)
            .ok_or(RegistryError::NotFound(key.display_name()))?;

        let _guard = if self.config.tracks_stack() {
            Some(self.stack.enter(*key, self.config.detect_cycles, self.config.max_depth)?)
        } else {
            None
        };

        self.build(key, recipe)
    }

    fn build(&self, key: &Key, recipe: &dyn Recipe) -> RegistryResult<AnyRc> {
        let policy = recipe.policy();
        if !policy.is_owned() {
            return Err(RegistryError::Released(key.display_name()));
        }

        self.observers.building(key);
        let started = self.observers.has_observers().then(Instant::now);

        let ctx = ResolverContext::new(self, *key);
        let value = recipe
            .build(&ctx)
            .ok_or(RegistryError::Released(key.display_name()))?;

        self.instances
            .borrow_mut()
            .push(TrackedInstance::owned(*key, policy, value.clone()));

        tracing::debug!(ty = key.display_name(), %policy, depth = self.stack.depth(), "instance built");
        let elapsed = started.map(|s| s.elapsed()).unwrap_or(Duration::ZERO);
        self.observers.built(key, policy, elapsed);
        Ok(value)
    }

    // ----- Introspection -----

    pub fn is_bound<T: 'static>(&self) -> bool {
        self.recipes.contains(&Key::of::<T>())
    }

    pub fn binding_count(&self) -> usize {
        self.recipes.len()
    }

    /// Number of tracked instances, supplied ones included.
    pub fn instance_count(&self) -> usize {
        self.instances.borrow().len()
    }

    /// Number of tracked instances of `T`.
    pub fn instance_count_of<T: 'static>(&self) -> usize {
        self.instances.borrow().count_of(&Key::of::<T>())
    }

    /// Describes every binding, in registration order.
    ///
    /// ```
    /// use ferrous_registry::{Policy, Registry};
    ///
    /// let mut registry = Registry::new();
    /// registry.register_factory::<u32, _>(Policy::PerRequest, |_| 1);
    ///
    /// let descriptors = registry.descriptors();
    /// assert_eq!(descriptors.len(), 1);
    /// assert_eq!(descriptors[0].policy, Policy::PerRequest);
    /// assert_eq!(descriptors[0].type_name(), "u32");
    /// assert_eq!(descriptors[0].live_instances, 0);
    /// ```
    pub fn descriptors(&self) -> Vec<BindingDescriptor> {
        let instances = self.instances.borrow();
        self.recipes
            .iter()
            .map(|recipe| {
                let key = recipe.key();
                BindingDescriptor {
                    key,
                    policy: recipe.policy(),
                    dependencies: recipe.dependencies().to_vec(),
                    live_instances: instances.live_count_of(&key),
                }
            })
            .collect()
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Registry Debug ===\n");
        s.push_str(&format!("Sealed: {}\n", self.sealed));
        s.push_str("Bindings:\n");
        for d in self.descriptors() {
            let deps: Vec<&str> = d.dependencies.iter().map(|k| k.display_name()).collect();
            s.push_str(&format!(
                "  {} [{}] deps=[{}] live={}\n",
                d.type_name(),
                d.policy,
                deps.join(", "),
                d.live_instances
            ));
        }
        s.push_str(&format!("Tracked instances: {}\n", self.instance_count()));
        s
    }
}

impl ResolverCore for Registry {
    fn resolve_any(&self, key: &Key) -> RegistryResult<Rc<dyn Any>> {
        let result = self.resolve_tracked(key);
        if let Err(reason) = &result {
            tracing::debug!(ty = key.display_name(), %reason, "retrieval produced nothing");
            self.observers.unresolved(key, reason);
        }
        result
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("bindings", &self.recipes.len())
            .field("instances", &self.instance_count())
            .field("observers", &self.observers.len())
            .field("sealed", &self.sealed)
            .field("config", &self.config)
            .finish()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        let observers = &self.observers;
        let ledger = self.instances.get_mut();
        tracing::debug!(
            instances = ledger.len(),
            bindings = self.recipes.len(),
            "tearing down registry"
        );
        ledger.release_all(|instance| {
            tracing::trace!(ty = instance.key.display_name(), policy = %instance.policy, "releasing instance");
            observers.released(&instance.key, instance.policy);
        });
    }
}
