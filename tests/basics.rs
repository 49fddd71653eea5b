use ferrous_registry::{Construct, Dep, Policy, Registry, RegistryError, Resolver};
use std::cell::Cell;
use std::rc::Rc;

struct A;
impl Construct for A {
    fn construct(_: ()) -> Self {
        A
    }
}

struct B;
impl Construct for B {
    fn construct(_: ()) -> Self {
        B
    }
}

struct C {
    a: Dep<A>,
    b: Dep<B>,
}
impl Construct<(A, B)> for C {
    fn construct((a, b): (Dep<A>, Dep<B>)) -> Self {
        C { a, b }
    }
}

#[test]
fn test_exclusive_identity() {
    let mut registry = Registry::new();
    registry.register::<A, ()>(Policy::Exclusive);

    let a1 = registry.retrieve::<A>().unwrap();
    let a2 = registry.retrieve::<A>().unwrap();
    assert!(Rc::ptr_eq(&a1, &a2));
    assert_eq!(registry.instance_count_of::<A>(), 1);
}

#[test]
fn test_per_request_distinct() {
    let mut registry = Registry::new();
    registry.register::<B, ()>(Policy::PerRequest);
    assert_eq!(registry.instance_count_of::<B>(), 0);

    let b1 = registry.retrieve::<B>().unwrap();
    let b2 = registry.retrieve::<B>().unwrap();
    assert!(!Rc::ptr_eq(&b1, &b2));
    assert_eq!(registry.instance_count_of::<B>(), 2);
}

#[test]
fn test_supplied_passthrough() {
    struct Settings {
        name: &'static str,
    }

    let settings = Rc::new(Settings { name: "prod" });
    let mut registry = Registry::new();
    registry.register_supplied(&settings);

    let found = registry.retrieve::<Settings>().unwrap();
    assert!(Rc::ptr_eq(&found, &settings));
    assert_eq!(found.name, "prod");
}

#[test]
fn test_supplied_through_register_with() {
    let a = Rc::new(A);
    let mut registry = Registry::new();
    registry.register_with::<A, ()>(Policy::Supplied, Some(&a));

    assert!(Rc::ptr_eq(&registry.retrieve::<A>().unwrap(), &a));
    // Supplied bindings never run the constructor.
    assert_eq!(registry.instance_count_of::<A>(), 1);
}

#[test]
fn test_dependency_wiring_scenario() {
    let mut registry = Registry::new();
    registry.register::<A, ()>(Policy::Exclusive);
    registry.register::<B, ()>(Policy::PerRequest);
    registry.register::<C, (A, B)>(Policy::Exclusive);

    let a1 = registry.retrieve::<A>().unwrap();
    let a2 = registry.retrieve::<A>().unwrap();
    assert!(Rc::ptr_eq(&a1, &a2));

    let b1 = registry.retrieve::<B>().unwrap();
    let b2 = registry.retrieve::<B>().unwrap();
    assert!(!Rc::ptr_eq(&b1, &b2));

    let c1 = registry.retrieve::<C>().unwrap();
    assert!(Rc::ptr_eq(c1.a.as_ref().unwrap(), &a1));
    let c1_b = c1.b.as_ref().unwrap();
    assert!(!Rc::ptr_eq(c1_b, &b1));
    assert!(!Rc::ptr_eq(c1_b, &b2));

    let c2 = registry.retrieve::<C>().unwrap();
    assert!(Rc::ptr_eq(&c1, &c2));
    assert!(Rc::ptr_eq(c2.b.as_ref().unwrap(), c1_b));
}

#[test]
fn test_first_registration_wins() {
    let mut registry = Registry::new();
    registry.register::<A, ()>(Policy::PerRequest);
    registry.register::<A, ()>(Policy::Exclusive);

    let a1 = registry.retrieve::<A>().unwrap();
    let a2 = registry.retrieve::<A>().unwrap();
    assert!(!Rc::ptr_eq(&a1, &a2));
    assert_eq!(registry.binding_count(), 1);
    assert_eq!(registry.descriptors()[0].policy, Policy::PerRequest);
}

#[test]
fn test_first_factory_wins() {
    let mut registry = Registry::new();
    registry.register_factory::<String, _>(Policy::Exclusive, |_| "first".to_string());
    registry.register_factory::<String, _>(Policy::Exclusive, |_| "second".to_string());

    assert_eq!(registry.retrieve::<String>().unwrap().as_str(), "first");
}

#[test]
fn test_seal_blocks_registration() {
    let mut registry = Registry::new();
    registry.register::<A, ()>(Policy::Exclusive);
    registry.seal();
    registry.register::<B, ()>(Policy::Exclusive);

    assert!(registry.is_sealed());
    assert!(registry.retrieve::<B>().is_none());
    assert!(!registry.is_bound::<B>());
    // Retrieval of earlier bindings is unaffected.
    assert!(registry.retrieve::<A>().is_some());
}

#[test]
fn test_seal_still_builds_per_request() {
    let mut registry = Registry::new();
    registry.register::<B, ()>(Policy::PerRequest);
    registry.seal();
    registry.seal();

    assert!(registry.retrieve::<B>().is_some());
    assert!(registry.retrieve::<B>().is_some());
    assert_eq!(registry.instance_count_of::<B>(), 2);
}

#[test]
fn test_missing_binding_is_absent() {
    let registry = Registry::new();
    assert!(registry.retrieve::<A>().is_none());
    assert_eq!(
        registry.try_retrieve::<A>().err(),
        Some(RegistryError::NotFound(std::any::type_name::<A>()))
    );
}

#[test]
fn test_missing_dependency_is_passed_as_none() {
    let mut registry = Registry::new();
    registry.register::<A, ()>(Policy::Exclusive);
    registry.register::<C, (A, B)>(Policy::PerRequest);

    let c = registry.retrieve::<C>().unwrap();
    assert!(c.a.is_some());
    assert!(c.b.is_none());
}

#[test]
fn test_exclusive_built_once_at_registration() {
    let builds = Rc::new(Cell::new(0));
    let counter = builds.clone();

    let mut registry = Registry::new();
    registry.register_factory::<u64, _>(Policy::Exclusive, move |_| {
        counter.set(counter.get() + 1);
        99
    });
    assert_eq!(builds.get(), 1);

    for _ in 0..3 {
        assert_eq!(*registry.retrieve::<u64>().unwrap(), 99);
    }
    assert_eq!(builds.get(), 1);
}

#[test]
fn test_vacant_supplied_is_absent() {
    let mut registry = Registry::new();
    registry.register::<A, ()>(Policy::Supplied);

    assert!(registry.is_bound::<A>());
    assert!(registry.retrieve::<A>().is_none());
    assert_eq!(
        registry.try_retrieve::<A>().err(),
        Some(RegistryError::Released(std::any::type_name::<A>()))
    );
}

#[test]
fn test_dropped_supplied_value_is_absent() {
    let value = Rc::new(B);
    let mut registry = Registry::new();
    registry.register_with::<B, ()>(Policy::Supplied, Some(&value));
    assert!(registry.retrieve::<B>().is_some());

    drop(value);
    assert!(registry.retrieve::<B>().is_none());
}

#[test]
fn test_retrieve_required_returns_value() {
    let mut registry = Registry::new();
    registry.register_factory::<u32, _>(Policy::Exclusive, |_| 7);
    assert_eq!(*registry.retrieve_required::<u32>(), 7);
}

#[test]
#[should_panic(expected = "Failed to retrieve")]
fn test_retrieve_required_panics_when_unbound() {
    let registry = Registry::new();
    let _ = registry.retrieve_required::<u32>();
}

#[test]
fn test_factory_resolves_through_context() {
    struct Port(u16);
    struct Endpoint(String);

    let mut registry = Registry::new();
    registry.register_factory::<Port, _>(Policy::Exclusive, |_| Port(8080));
    registry.register_factory::<Endpoint, _>(Policy::PerRequest, |ctx| {
        assert!(ctx.building().display_name().ends_with("Endpoint"));
        let port = ctx.retrieve::<Port>().map(|p| p.0).unwrap_or(0);
        Endpoint(format!("http://localhost:{}", port))
    });

    assert_eq!(registry.retrieve::<Endpoint>().unwrap().0, "http://localhost:8080");
}
