use ferrous_registry::{Construct, Dep, MetricsObserver, Policy, Registry, Resolver};
use serial_test::serial;
use std::rc::Rc;
use std::sync::Mutex;

static DROP_LOG: Mutex<Vec<String>> = Mutex::new(Vec::new());

fn log_drop(name: impl Into<String>) {
    DROP_LOG.lock().unwrap().push(name.into());
}

fn take_log() -> Vec<String> {
    std::mem::take(&mut *DROP_LOG.lock().unwrap())
}

struct X;
impl Construct for X {
    fn construct(_: ()) -> Self {
        X
    }
}
impl Drop for X {
    fn drop(&mut self) {
        log_drop("X");
    }
}

struct Y;
impl Construct for Y {
    fn construct(_: ()) -> Self {
        Y
    }
}
impl Drop for Y {
    fn drop(&mut self) {
        log_drop("Y");
    }
}

struct Z {
    x: Dep<X>,
    y: Dep<Y>,
}
impl Construct<(X, Y)> for Z {
    fn construct((x, y): (Dep<X>, Dep<Y>)) -> Self {
        Z { x, y }
    }
}
impl Drop for Z {
    fn drop(&mut self) {
        // Dependencies must still be alive while a dependent is dropped.
        assert!(self.x.is_some());
        assert!(self.y.is_some());
        log_drop("Z");
    }
}

struct Ticket(u32);
impl Drop for Ticket {
    fn drop(&mut self) {
        log_drop(format!("Ticket{}", self.0));
    }
}

#[test]
#[serial]
fn test_reverse_creation_order() {
    take_log();
    {
        let mut registry = Registry::new();
        registry.register::<X, ()>(Policy::Exclusive);
        registry.register::<Y, ()>(Policy::Exclusive);
        registry.register::<Z, (X, Y)>(Policy::Exclusive);
        assert!(take_log().is_empty());
    }
    assert_eq!(take_log(), vec!["Z", "Y", "X"]);
}

#[test]
#[serial]
fn test_lazy_order_follows_creation_not_registration() {
    take_log();
    {
        let mut registry = Registry::new();
        registry.register::<X, ()>(Policy::PerRequest);
        registry.register::<Y, ()>(Policy::PerRequest);
        registry.register::<Z, (X, Y)>(Policy::PerRequest);

        // Creation order: X, Y (dependencies first), then Z, then a lone Y.
        registry.retrieve::<Z>();
        registry.retrieve::<Y>();
        assert_eq!(registry.instance_count(), 4);
    }
    assert_eq!(take_log(), vec!["Y", "Z", "Y", "X"]);
}

#[test]
#[serial]
fn test_every_per_request_instance_is_released() {
    take_log();
    let metrics = Rc::new(MetricsObserver::new());
    {
        let mut registry = Registry::new();
        registry.add_observer(metrics.clone());
        let next = std::cell::Cell::new(0u32);
        registry.register_factory::<Ticket, _>(Policy::PerRequest, move |_| {
            next.set(next.get() + 1);
            Ticket(next.get())
        });

        for _ in 0..3 {
            registry.retrieve::<Ticket>();
        }
        // Callers dropped their handles; the registry still owns all three.
        assert!(take_log().is_empty());
    }
    assert_eq!(take_log(), vec!["Ticket3", "Ticket2", "Ticket1"]);
    assert_eq!(metrics.release_count(), 3);
}

#[test]
#[serial]
fn test_supplied_instance_outlives_registry() {
    take_log();
    let x = Rc::new(X);
    {
        let mut registry = Registry::new();
        registry.register_with::<X, ()>(Policy::Supplied, Some(&x));
        registry.register::<Y, ()>(Policy::Exclusive);
        assert!(Rc::ptr_eq(&registry.retrieve::<X>().unwrap(), &x));
    }
    assert_eq!(take_log(), vec!["Y"]);
    assert_eq!(Rc::strong_count(&x), 1);

    drop(x);
    assert_eq!(take_log(), vec!["X"]);
}

#[test]
#[serial]
fn test_supplied_dependency_is_not_released_with_dependent() {
    take_log();
    let x = Rc::new(X);
    {
        let mut registry = Registry::new();
        registry.register_with::<X, ()>(Policy::Supplied, Some(&x));
        registry.register::<Y, ()>(Policy::PerRequest);
        registry.register::<Z, (X, Y)>(Policy::Exclusive);
    }
    assert_eq!(take_log(), vec!["Z", "Y"]);
    drop(x);
    assert_eq!(take_log(), vec!["X"]);
}

#[test]
#[serial]
fn test_dependent_keeps_supplied_value_alive_until_teardown() {
    take_log();
    let x = Rc::new(X);
    let mut registry = Registry::new();
    registry.register_with::<X, ()>(Policy::Supplied, Some(&x));
    registry.register::<Y, ()>(Policy::PerRequest);
    registry.register::<Z, (X, Y)>(Policy::Exclusive);

    // The exclusive Z holds the last strong handle once the caller lets go.
    drop(x);
    assert!(take_log().is_empty());
    let still_there = registry.retrieve::<X>().unwrap();
    drop(still_there);
    assert!(take_log().is_empty());

    drop(registry);
    assert_eq!(take_log(), vec!["Z", "X", "Y"]);
}

#[test]
#[serial]
fn test_caller_held_handle_outlives_teardown() {
    take_log();
    let held = {
        let mut registry = Registry::new();
        registry.register::<X, ()>(Policy::Exclusive);
        registry.register::<Y, ()>(Policy::Exclusive);
        registry.retrieve::<X>().unwrap()
    };
    // Y had no other owner; X is still held here.
    assert_eq!(take_log(), vec!["Y"]);
    drop(held);
    assert_eq!(take_log(), vec!["X"]);
}
