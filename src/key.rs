//! Type keys for binding and instance lookup.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Key identifying a bound type inside a [`Registry`](crate::Registry).
///
/// Equality, ordering and hashing use only the [`TypeId`]. The type name is
/// carried along for log lines, error messages and exports, and never takes
/// part in lookup, so two keys compare equal exactly when they denote the
/// same type.
///
/// # Examples
///
/// ```rust
/// use ferrous_registry::{Key, key_of_type};
///
/// struct Database;
/// struct Cache;
///
/// let db = Key::of::<Database>();
/// assert_eq!(db, key_of_type::<Database>());
/// assert_ne!(db, Key::of::<Cache>());
/// assert!(db.display_name().ends_with("Database"));
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Builds the key for `T`.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The [`TypeId`] this key compares by.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name, as reported by `std::any::type_name`.
    ///
    /// The exact text is not stable across compiler versions; use it for
    /// diagnostics only.
    #[inline]
    pub fn display_name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, generics included.
    ///
    /// ```rust
    /// use ferrous_registry::Key;
    ///
    /// assert_eq!(Key::of::<String>().short_name(), "String");
    /// assert_eq!(Key::of::<u32>().short_name(), "u32");
    /// ```
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Shorthand for [`Key::of`].
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
