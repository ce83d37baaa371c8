//! Service identification keys.
//!
//! [`DependencyKey`] identifies a service within a registry by its
//! [`TypeId`]; the type name travels along for diagnostics and error
//! messages.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use arbor_support::rendering::shorten_type_name;

/// Identifies a service in a container.
///
/// # Examples
/// ```
/// use arbor_container::key::DependencyKey;
///
/// let key = DependencyKey::of::<String>();
/// assert_eq!(key.type_name(), "alloc::string::String");
/// assert_eq!(key.short_name(), "String");
/// ```
#[derive(Clone, Copy)]
pub struct DependencyKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl DependencyKey {
    /// Creates a key for type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name, as reported by [`std::any::type_name`].
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without module paths, e.g. `Arc<dyn AudioManager>`.
    pub fn short_name(&self) -> String {
        shorten_type_name(self.type_name)
    }
}

// type_name is not guaranteed unique, so identity is the TypeId only
impl PartialEq for DependencyKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for DependencyKey {}

impl Hash for DependencyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DependencyKey({})", self.type_name)
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Inventory;

    #[test]
    fn key_carries_type_name() {
        let key = DependencyKey::of::<Inventory>();
        assert!(key.type_name().ends_with("Inventory"));
        assert_eq!(key.short_name(), "Inventory");
    }

    #[test]
    fn keys_of_same_type_are_equal() {
        assert_eq!(DependencyKey::of::<Inventory>(), DependencyKey::of::<Inventory>());
        assert_ne!(DependencyKey::of::<Inventory>(), DependencyKey::of::<String>());
    }

    #[test]
    fn keys_deduplicate_in_sets() {
        let set: HashSet<_> = [
            DependencyKey::of::<Inventory>(),
            DependencyKey::of::<Inventory>(),
            DependencyKey::of::<u32>(),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn trait_object_keys() {
        trait AudioManager {}
        let key = DependencyKey::of::<std::sync::Arc<dyn AudioManager>>();
        assert!(key.short_name().starts_with("Arc<dyn"));
    }

    #[test]
    fn display_is_full_type_name() {
        let key = DependencyKey::of::<u8>();
        assert_eq!(key.to_string(), "u8");
        assert_eq!(format!("{key:?}"), "DependencyKey(u8)");
    }
}
