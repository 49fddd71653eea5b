//! Binding graph validation.
//!
//! The registry itself never complains about a missing dependency or a
//! cyclic binding graph; the first shows up as a `None` handed to a
//! constructor, the second as unbounded recursion. [`Registry::validate`]
//! inspects the declared dependencies up front so such configurations can be
//! caught before the first retrieval. It only reads bindings and never builds
//! anything.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::descriptors::BindingDescriptor;
use crate::key::Key;
use crate::policy::Policy;
use crate::registry::Registry;

/// Outcome of [`Registry::validate`].
///
/// # Examples
///
/// ```
/// use ferrous_registry::{Construct, Dep, Policy, Registry, ValidationError};
///
/// struct Engine;
/// struct Car { engine: Dep<Engine> }
/// impl Construct<(Engine,)> for Car {
///     fn construct((engine,): (Dep<Engine>,)) -> Self { Car { engine } }
/// }
///
/// let mut registry = Registry::new();
/// registry.register::<Car, (Engine,)>(Policy::PerRequest);
///
/// let report = registry.validate();
/// assert!(!report.is_valid());
/// assert!(matches!(
///     &report.errors[0],
///     ValidationError::MissingDependency { dependency, .. } if dependency.ends_with("Engine")
/// ));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Configurations that will misbehave at retrieval time
    pub errors: Vec<ValidationError>,
    /// Configurations that work but are probably not what was meant
    pub warnings: Vec<ValidationWarning>,
}

/// A binding graph problem that affects retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A declared dependency has no binding; the dependent's constructor will
    /// receive `None` for it.
    #[error("{service} depends on unbound {dependency}")]
    MissingDependency {
        service: &'static str,
        dependency: &'static str,
    },
    /// Declared dependencies form a cycle; the first element is repeated at
    /// the end.
    #[error("circular dependency: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<&'static str> },
}

/// A binding that works but is likely a mistake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// An exclusive binding holds a per-request dependency, so that one
    /// per-request instance lives as long as the exclusive one.
    ExclusiveCapturesPerRequest {
        exclusive: &'static str,
        per_request: &'static str,
    },
    /// A supplied binding without a live value; it retrieves as `None`.
    VacantSupplied { service: &'static str },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::ExclusiveCapturesPerRequest { exclusive, per_request } => write!(
                f,
                "exclusive {} captures per-request {} for its whole lifetime",
                exclusive, per_request
            ),
            ValidationWarning::VacantSupplied { service } => {
                write!(f, "supplied binding {} has no live value", service)
            }
        }
    }
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Validates a set of descriptors, as returned by
    /// [`Registry::descriptors`].
    pub fn from_descriptors(descriptors: &[BindingDescriptor]) -> Self {
        let index: HashMap<Key, usize> = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.key, i))
            .collect();

        let mut report = ValidationReport::default();

        for descriptor in descriptors {
            if descriptor.is_vacant() {
                report.warnings.push(ValidationWarning::VacantSupplied {
                    service: descriptor.type_name(),
                });
            }

            for dependency in &descriptor.dependencies {
                match index.get(dependency) {
                    None => report.errors.push(ValidationError::MissingDependency {
                        service: descriptor.type_name(),
                        dependency: dependency.display_name(),
                    }),
                    Some(&i) => {
                        if descriptor.policy == Policy::Exclusive
                            && descriptors[i].policy == Policy::PerRequest
                        {
                            report.warnings.push(ValidationWarning::ExclusiveCapturesPerRequest {
                                exclusive: descriptor.type_name(),
                                per_request: dependency.display_name(),
                            });
                        }
                    }
                }
            }
        }

        for cycle in find_cycles(descriptors, &index) {
            report.errors.push(ValidationError::CircularDependency { cycle });
        }

        report
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Depth-first search over declared dependencies. Every back edge yields
/// one cycle, reported from the re-entered binding around to itself.
fn find_cycles(descriptors: &[BindingDescriptor], index: &HashMap<Key, usize>) -> Vec<Vec<&'static str>> {
    fn visit(
        node: usize,
        descriptors: &[BindingDescriptor],
        index: &HashMap<Key, usize>,
        marks: &mut [Mark],
        path: &mut Vec<usize>,
        cycles: &mut Vec<Vec<&'static str>>,
    ) {
        marks[node] = Mark::InProgress;
        path.push(node);

        for dependency in &descriptors[node].dependencies {
            let Some(&next) = index.get(dependency) else {
                continue;
            };
            match marks[next] {
                Mark::Unvisited => visit(next, descriptors, index, marks, path, cycles),
                Mark::InProgress => {
                    if let Some(start) = path.iter().position(|&n| n == next) {
                        let mut cycle: Vec<&'static str> =
                            path[start..].iter().map(|&n| descriptors[n].type_name()).collect();
                        cycle.push(descriptors[next].type_name());
                        cycles.push(cycle);
                    }
                }
                Mark::Done => {}
            }
        }

        path.pop();
        marks[node] = Mark::Done;
    }

    let mut marks = vec![Mark::Unvisited; descriptors.len()];
    let mut path = Vec::new();
    let mut cycles = Vec::new();
    for node in 0..descriptors.len() {
        if marks[node] == Mark::Unvisited {
            visit(node, descriptors, index, &mut marks, &mut path, &mut cycles);
        }
    }
    cycles
}

impl Registry {
    /// Checks declared dependencies for missing bindings and cycles.
    ///
    /// Closure bindings declare no dependencies, so they are only checked as
    /// dependencies of others.
    pub fn validate(&self) -> ValidationReport {
        ValidationReport::from_descriptors(&self.descriptors())
    }
}
