//! Binding recipes and the table that stores them.

use std::any::Any;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::key::Key;
use crate::policy::Policy;
use crate::registry::ResolverContext;
use crate::traits::{Construct, Dependencies, DependencyKeys};

#[cfg(feature = "ahash")]
pub(crate) type KeyMap<V> = ahash::AHashMap<Key, V>;
#[cfg(not(feature = "ahash"))]
pub(crate) type KeyMap<V> = std::collections::HashMap<Key, V>;

// Type-erased handle for storage
pub(crate) type AnyRc = Rc<dyn Any>;

/// How to produce values of one bound type.
pub(crate) trait Recipe {
    fn key(&self) -> Key;

    /// Policy recorded at registration time.
    fn policy(&self) -> Policy;

    /// Dependency keys in constructor argument order. Empty for closure
    /// recipes, which resolve inside the closure.
    fn dependencies(&self) -> &[Key];

    /// Builds one new instance. `None` when the binding has no way to build
    /// (supplied-only bindings).
    fn build(&self, ctx: &ResolverContext<'_>) -> Option<AnyRc>;
}

/// Recipe backed by a [`Construct`] implementation.
pub(crate) struct ConstructorRecipe<T, D> {
    policy: Policy,
    dependencies: DependencyKeys,
    _marker: PhantomData<fn() -> (T, D)>,
}

impl<T, D> ConstructorRecipe<T, D>
where
    T: Construct<D>,
    D: Dependencies,
{
    pub(crate) fn new(policy: Policy) -> Self {
        Self {
            policy,
            dependencies: D::keys(),
            _marker: PhantomData,
        }
    }
}

impl<T, D> Recipe for ConstructorRecipe<T, D>
where
    T: Construct<D>,
    D: Dependencies,
{
    fn key(&self) -> Key {
        Key::of::<T>()
    }

    fn policy(&self) -> Policy {
        self.policy
    }

    fn dependencies(&self) -> &[Key] {
        &self.dependencies
    }

    fn build(&self, ctx: &ResolverContext<'_>) -> Option<AnyRc> {
        let value = T::construct(D::resolve(ctx));
        Some(Rc::new(value))
    }
}

/// Recipe backed by a closure.
pub(crate) struct FactoryRecipe<T, F> {
    policy: Policy,
    factory: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> FactoryRecipe<T, F>
where
    T: 'static,
    F: Fn(&ResolverContext<'_>) -> T + 'static,
{
    pub(crate) fn new(policy: Policy, factory: F) -> Self {
        Self {
            policy,
            factory,
            _marker: PhantomData,
        }
    }
}

impl<T, F> Recipe for FactoryRecipe<T, F>
where
    T: 'static,
    F: Fn(&ResolverContext<'_>) -> T + 'static,
{
    fn key(&self) -> Key {
        Key::of::<T>()
    }

    fn policy(&self) -> Policy {
        self.policy
    }

    fn dependencies(&self) -> &[Key] {
        &[]
    }

    fn build(&self, ctx: &ResolverContext<'_>) -> Option<AnyRc> {
        Some(Rc::new((self.factory)(ctx)))
    }
}

/// Recipe for a type that is only ever supplied by the caller.
pub(crate) struct SuppliedRecipe<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> SuppliedRecipe<T> {
    pub(crate) fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T: 'static> Recipe for SuppliedRecipe<T> {
    fn key(&self) -> Key {
        Key::of::<T>()
    }

    fn policy(&self) -> Policy {
        Policy::Supplied
    }

    fn dependencies(&self) -> &[Key] {
        &[]
    }

    fn build(&self, _ctx: &ResolverContext<'_>) -> Option<AnyRc> {
        None
    }
}

/// Binding recipes in registration order, at most one per key.
#[derive(Default)]
pub(crate) struct RecipeTable {
    entries: Vec<Box<dyn Recipe>>,
    index: KeyMap<usize>,
}

impl RecipeTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores `recipe` unless its key is already bound. Returns whether it
    /// was stored.
    pub(crate) fn insert(&mut self, recipe: Box<dyn Recipe>) -> bool {
        let key = recipe.key();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(recipe);
        true
    }

    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<&dyn Recipe> {
        self.index.get(key).map(|&i| self.entries[i].as_ref())
    }

    #[inline]
    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Recipes in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &dyn Recipe> {
        self.entries.iter().map(|r| r.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Engine;
    struct Wheel;

    impl Construct for Engine {
        fn construct(_: ()) -> Self {
            Engine
        }
    }

    #[test]
    fn first_insert_wins() {
        let mut table = RecipeTable::new();
        assert!(table.insert(Box::new(ConstructorRecipe::<Engine, ()>::new(Policy::Exclusive))));
        assert!(!table.insert(Box::new(ConstructorRecipe::<Engine, ()>::new(Policy::PerRequest))));

        assert_eq!(table.len(), 1);
        let recipe = table.get(&Key::of::<Engine>()).unwrap();
        assert_eq!(recipe.policy(), Policy::Exclusive);
    }

    #[test]
    fn iteration_keeps_registration_order() {
        let mut table = RecipeTable::new();
        table.insert(Box::new(SuppliedRecipe::<Wheel>::new()));
        table.insert(Box::new(FactoryRecipe::new(Policy::PerRequest, |_: &ResolverContext<'_>| Engine)));

        let keys: Vec<Key> = table.iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec![Key::of::<Wheel>(), Key::of::<Engine>()]);
        assert!(table.contains(&Key::of::<Wheel>()));
    }

    #[test]
    fn constructor_recipe_records_dependency_order() {
        struct Car;
        impl Construct<(Engine, Wheel)> for Car {
            fn construct(_: (Option<Rc<Engine>>, Option<Rc<Wheel>>)) -> Self {
                Car
            }
        }

        let recipe = ConstructorRecipe::<Car, (Engine, Wheel)>::new(Policy::Exclusive);
        assert_eq!(recipe.dependencies(), &[Key::of::<Engine>(), Key::of::<Wheel>()]);
        assert_eq!(recipe.key(), Key::of::<Car>());
    }
}
