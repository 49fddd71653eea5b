//! Core traits for the registry.

mod construct;
mod resolver;

pub use construct::{Construct, Dep, Dependencies, DependencyKeys};
pub use resolver::{Resolver, ResolverCore};
