//! Service lifetimes.
//!
//! A lifetime determines how long a resolved service lives:
//! - [`Lifetime::Singleton`]: one instance per container registry
//! - [`Lifetime::Scoped`]: one instance per [`ScopedView`](crate::container::ScopedView)
//! - [`Lifetime::Transient`]: new instance every time
//!
//! # Ordering
//! Lifetimes are ordered `Singleton > Scoped > Transient`; a longer-lived
//! service must not capture a shorter-lived one.

use std::fmt;

/// Defines how long a registered service lives.
///
/// # Examples
/// ```
/// use arbor_container::lifetime::Lifetime;
///
/// assert!(Lifetime::Singleton > Lifetime::Scoped);
/// assert!(Lifetime::Scoped > Lifetime::Transient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance shared by every resolve against the owning container
    /// and its descendants.
    ///
    /// Created on first resolve, released when the container is disposed.
    ///
    /// # When to use
    /// - Save systems, audio managers
    /// - Configuration objects
    /// - Caches shared by a whole scene
    Singleton,

    /// One instance per scoped view.
    ///
    /// Created on first resolve within a scope, released when the scope is
    /// disposed. Resolved straight from a container it behaves like a
    /// container-level singleton unless scope validation is enabled.
    Scoped,

    /// New instance created on every resolve call and owned by the caller.
    Transient,
}

impl Lifetime {
    #[inline]
    fn rank(&self) -> u8 {
        match self {
            Lifetime::Singleton => 2,
            Lifetime::Scoped => 1,
            Lifetime::Transient => 0,
        }
    }
}

impl PartialOrd for Lifetime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Lifetime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifetime::Singleton => "Singleton",
            Lifetime::Scoped => "Scoped",
            Lifetime::Transient => "Transient",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_ordering() {
        assert!(Lifetime::Singleton > Lifetime::Scoped);
        assert!(Lifetime::Scoped > Lifetime::Transient);
        assert!(Lifetime::Singleton > Lifetime::Transient);
    }

    #[test]
    fn lifetime_display() {
        assert_eq!(Lifetime::Singleton.to_string(), "Singleton");
        assert_eq!(Lifetime::Scoped.to_string(), "Scoped");
        assert_eq!(Lifetime::Transient.to_string(), "Transient");
    }
}
