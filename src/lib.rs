//! # ferrous-registry
//!
//! A small in-process object registry: bind types to construction recipes,
//! retrieve them by type, and let the registry own and tear down what it
//! built.
//!
//! ## Features
//!
//! - **Three policies**: exclusive (one shared instance), per-request (fresh
//!   instance every retrieval) and supplied (caller-owned value)
//! - **Recursive construction**: a binding lists its dependency types and the
//!   registry retrieves them before calling the constructor
//! - **Ordered teardown**: owned instances are released newest-first when the
//!   registry is dropped; supplied values are never touched
//! - **Quiet failure**: duplicate or late registrations are no-ops and
//!   unresolvable requests are `None`, with `try_*` variants that say why
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_registry::{Construct, Dep, Policy, Registry, Resolver};
//! use std::rc::Rc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Dep<Database>,
//! }
//!
//! impl Construct<(Database,)> for UserService {
//!     fn construct((db,): (Dep<Database>,)) -> Self {
//!         UserService { db }
//!     }
//! }
//!
//! let db = Rc::new(Database { url: "postgres://localhost".to_string() });
//!
//! let mut registry = Registry::new();
//! registry.register_supplied(&db);
//! registry.register::<UserService, (Database,)>(Policy::PerRequest);
//! registry.seal();
//!
//! let users = registry.retrieve::<UserService>().unwrap();
//! assert_eq!(users.db.as_ref().unwrap().url, "postgres://localhost");
//! ```
//!
//! ## Policies
//!
//! - **Exclusive**: built once (at registration by default) and shared
//! - **PerRequest**: built on every retrieval; every instance is tracked
//!   until teardown
//! - **Supplied**: the caller keeps ownership; the registry holds a weak
//!   handle and hands the same value out
//!
//! ## Cargo features
//!
//! - `config`: JSON (de)serialization of [`RegistryConfig`]
//! - `graph-export`: JSON and YAML export of [`DependencyGraph`]
//! - `diagnostics`: [`Registry::to_debug_string`]
//! - `performance`: `ahash` maps and `smallvec` dependency lists

pub mod config;
pub mod descriptors;
pub mod error;
pub mod graph_export;
pub mod key;
pub mod observer;
pub mod policy;
pub mod registry;
pub mod traits;
pub mod validation;

// Internal modules
mod instance;
mod internal;
mod registration;

pub use config::RegistryConfig;
pub use descriptors::BindingDescriptor;
pub use error::{RegistryError, RegistryResult};
pub use graph_export::{DependencyGraph, ExportFormat, GraphEdge, GraphMetadata, GraphNode};
pub use key::{key_of_type, Key};
pub use observer::{MetricsObserver, RegistryObserver};
pub use policy::Policy;
pub use registry::{Registry, ResolverContext};
pub use traits::{Construct, Dep, Dependencies, DependencyKeys, Resolver, ResolverCore};
pub use validation::{ValidationError, ValidationReport, ValidationWarning};
