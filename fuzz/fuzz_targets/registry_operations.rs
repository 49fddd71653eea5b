#![no_main]

use ferrous_registry::{Construct, Dep, Policy, Registry, RegistryConfig, Resolver};
use libfuzzer_sys::fuzz_target;
use std::rc::Rc;

struct Base;
impl Construct for Base {
    fn construct(_: ()) -> Self {
        Base
    }
}

struct Service(Dep<Base>);
impl Construct<(Base,)> for Service {
    fn construct((base,): (Dep<Base>,)) -> Self {
        Service(base)
    }
}

struct Handler(Dep<Base>, Dep<Service>);
impl Construct<(Base, Service)> for Handler {
    fn construct((base, service): (Dep<Base>, Dep<Service>)) -> Self {
        Handler(base, service)
    }
}

struct Looped(Dep<Looped>);
impl Construct<(Looped,)> for Looped {
    fn construct((inner,): (Dep<Looped>,)) -> Self {
        Looped(inner)
    }
}

fn policy(byte: u8) -> Policy {
    match byte % 3 {
        0 => Policy::Exclusive,
        1 => Policy::PerRequest,
        _ => Policy::Supplied,
    }
}

fn check_reuse<T: 'static>(registry: &Registry) {
    let first = registry.retrieve::<T>();
    let second = registry.retrieve::<T>();
    if let (Some(a), Some(b)) = (&first, &second) {
        let exclusive = registry
            .descriptors()
            .iter()
            .any(|d| d.key == ferrous_registry::Key::of::<T>() && d.policy != Policy::PerRequest);
        assert_eq!(Rc::ptr_eq(a, b), exclusive);
    }
}

fuzz_target!(|data: &[u8]| {
    let config = RegistryConfig::default()
        .with_cycle_detection(true)
        .with_max_depth(16)
        .with_eager_exclusive(data.first().map_or(true, |b| b & 1 == 0));
    let mut registry = Registry::with_config(config);
    let supplied = Rc::new(Base);

    for pair in data.chunks(2) {
        let op = pair[0];
        let arg = pair.get(1).copied().unwrap_or(0);
        let before = registry.binding_count();

        match op % 8 {
            0 => registry.register_with::<Base, ()>(policy(arg), Some(&supplied)),
            1 => registry.register::<Service, (Base,)>(policy(arg)),
            2 => registry.register::<Handler, (Base, Service)>(policy(arg)),
            3 => registry.register::<Looped, (Looped,)>(policy(arg)),
            4 => registry.seal(),
            5 => check_reuse::<Base>(&registry),
            6 => check_reuse::<Handler>(&registry),
            _ => {
                let _ = registry.retrieve::<Looped>();
                let _ = registry.validate();
                let _ = registry.dependency_graph().to_dot();
            }
        }

        if registry.is_sealed() {
            assert_eq!(registry.binding_count(), before);
        }
    }

    drop(registry);
    assert_eq!(Rc::strong_count(&supplied), 1);
});
