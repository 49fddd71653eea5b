//! Instantiation policies.

use std::fmt;

#[cfg(any(feature = "config", feature = "graph-export"))]
use serde::{Deserialize, Serialize};

/// Instantiation policy chosen when a type is bound.
///
/// The policy decides whether retrievals share one value, whether the
/// registry owns what it hands out, and whether teardown destroys it.
///
/// | Policy       | Built by registry | Reused | Destroyed at teardown |
/// |--------------|-------------------|--------|-----------------------|
/// | `Exclusive`  | once              | yes    | yes                   |
/// | `PerRequest` | every retrieval   | no     | yes, each one         |
/// | `Supplied`   | never             | yes    | never                 |
///
/// # Examples
///
/// ```rust
/// use ferrous_registry::{Construct, Policy, Registry, Resolver};
/// use std::rc::Rc;
///
/// #[derive(Default)]
/// struct Clock;
/// impl Construct for Clock {
///     fn construct(_: ()) -> Self { Clock }
/// }
///
/// struct Ticket;
/// impl Construct for Ticket {
///     fn construct(_: ()) -> Self { Ticket }
/// }
///
/// let mut registry = Registry::new();
/// registry.register::<Clock, ()>(Policy::Exclusive);
/// registry.register::<Ticket, ()>(Policy::PerRequest);
///
/// let a = registry.retrieve::<Clock>().unwrap();
/// let b = registry.retrieve::<Clock>().unwrap();
/// assert!(Rc::ptr_eq(&a, &b));
///
/// let t1 = registry.retrieve::<Ticket>().unwrap();
/// let t2 = registry.retrieve::<Ticket>().unwrap();
/// assert!(!Rc::ptr_eq(&t1, &t2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(any(feature = "config", feature = "graph-export"), derive(Serialize, Deserialize))]
#[cfg_attr(any(feature = "config", feature = "graph-export"), serde(rename_all = "kebab-case"))]
pub enum Policy {
    /// One registry-owned instance, reused by every retrieval.
    #[default]
    Exclusive,
    /// A fresh registry-owned instance per retrieval. Every instance is
    /// tracked and destroyed at teardown.
    PerRequest,
    /// A caller-owned instance handed to the registry. The registry only
    /// keeps a weak handle and never destroys it.
    Supplied,
}

impl Policy {
    /// Whether an existing instance under this policy is handed out again.
    #[inline]
    pub fn is_reusable(self) -> bool {
        !matches!(self, Policy::PerRequest)
    }

    /// Whether the registry owns (and eventually destroys) instances under
    /// this policy.
    #[inline]
    pub fn is_owned(self) -> bool {
        !matches!(self, Policy::Supplied)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Policy::Exclusive => "exclusive",
            Policy::PerRequest => "per-request",
            Policy::Supplied => "supplied",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
