//! Dependency graph validation.
//!
//! Runs when a container is built with `validate_on_build`:
//! - Detects circular dependencies
//! - Checks that all declared dependencies are registered, either locally
//!   or somewhere in the ancestor chain
//! - Validates lifetime compatibility
//!
//! Only dependencies declared with
//! [`ContainerBuilder::depends_on`](crate::builder::ContainerBuilder::depends_on)
//! take part; factories are opaque closures.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, warn};

use crate::error::{ArborError, CircularDependencyError, NotRegisteredError, ScopeMismatchError};
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;
use crate::registry::suggestions_for;

/// What the validator needs to know about one registration.
#[derive(Debug, Clone)]
pub(crate) struct DependencyInfo {
    pub key: DependencyKey,
    pub dependencies: Vec<DependencyKey>,
    pub lifetime: Lifetime,
}

/// Validates the dependency graph of a single registration set.
///
/// # Algorithm
/// Depth-first search keeping the current path, so a cycle can be
/// reported as the exact chain that closes it.
pub(crate) struct GraphValidator {
    dependencies: HashMap<DependencyKey, DependencyInfo>,
    /// Keys provided by ancestor containers; treated as satisfied leaves.
    inherited: HashSet<DependencyKey>,
    visiting: HashSet<DependencyKey>,
    validated: HashSet<DependencyKey>,
    path: Vec<DependencyKey>,
}

impl GraphValidator {
    pub fn new(
        dependencies: HashMap<DependencyKey, DependencyInfo>,
        inherited: HashSet<DependencyKey>,
    ) -> Self {
        Self {
            dependencies,
            inherited,
            visiting: HashSet::new(),
            validated: HashSet::new(),
            path: Vec::new(),
        }
    }

    /// Validates the entire graph.
    ///
    /// # Errors
    /// - [`ArborError::CircularDependency`] — cycle detected
    /// - [`ArborError::NotRegistered`] — missing dependency
    /// - [`ArborError::ScopeMismatch`] — lifetime incompatibility
    #[instrument(skip(self), name = "graph_validation")]
    pub fn validate(&mut self) -> Result<(), ArborError> {
        let mut keys: Vec<DependencyKey> = self.dependencies.keys().copied().collect();
        // deterministic error reporting
        keys.sort_by_key(|k| k.type_name());

        debug!(
            dependency_count = keys.len(),
            inherited = self.inherited.len(),
            "Starting dependency graph validation"
        );

        for key in keys {
            self.validate_key(&key)?;
        }

        debug!("Dependency graph validation passed");
        Ok(())
    }

    fn validate_key(&mut self, key: &DependencyKey) -> Result<(), ArborError> {
        if self.validated.contains(key) {
            return Ok(());
        }

        if self.visiting.contains(key) {
            let cycle_start = self.path.iter().position(|k| k == key).unwrap_or(0);
            let mut chain: Vec<DependencyKey> = self.path[cycle_start..].to_vec();
            chain.push(*key);

            warn!(cycle = ?chain, "Circular dependency detected");
            return Err(ArborError::CircularDependency(CircularDependencyError { chain }));
        }

        let Some(info) = self.dependencies.get(key).cloned() else {
            if self.inherited.contains(key) {
                return Ok(());
            }
            let mut available: Vec<DependencyKey> = self.dependencies.keys().copied().collect();
            available.extend(self.inherited.iter().copied());

            return Err(ArborError::NotRegistered(NotRegisteredError {
                requested: *key,
                required_by: self.path.last().copied(),
                suggestions: suggestions_for(key, &available),
            }));
        };

        self.visiting.insert(*key);
        self.path.push(*key);

        for dep_key in &info.dependencies {
            if let Some(dep_info) = self.dependencies.get(dep_key) {
                check_lifetimes(&info, dep_info)?;
            }
            self.validate_key(dep_key)?;
        }

        self.path.pop();
        self.visiting.remove(key);
        self.validated.insert(*key);

        Ok(())
    }
}

/// A dependency must live at least as long as its consumer.
fn check_lifetimes(consumer: &DependencyInfo, dependency: &DependencyInfo) -> Result<(), ArborError> {
    if consumer.lifetime > dependency.lifetime {
        warn!(
            consumer = %consumer.key,
            consumer_lifetime = %consumer.lifetime,
            dependency = %dependency.key,
            dependency_lifetime = %dependency.lifetime,
            "Lifetime mismatch detected"
        );

        return Err(ArborError::ScopeMismatch(ScopeMismatchError {
            consumer: consumer.key,
            consumer_lifetime: consumer.lifetime,
            dependency: dependency.key,
            dependency_lifetime: dependency.lifetime,
        }));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(key: DependencyKey, lifetime: Lifetime, deps: Vec<DependencyKey>) -> DependencyInfo {
        DependencyInfo { key, dependencies: deps, lifetime }
    }

    fn graph(infos: Vec<DependencyInfo>) -> HashMap<DependencyKey, DependencyInfo> {
        infos.into_iter().map(|i| (i.key, i)).collect()
    }

    fn validate(infos: Vec<DependencyInfo>) -> Result<(), ArborError> {
        GraphValidator::new(graph(infos), HashSet::new()).validate()
    }

    struct SaveSystem;
    struct AudioManager;
    struct CombatSystem;
    struct LootTable;

    #[test]
    fn valid_simple_graph() {
        let result = validate(vec![
            info(DependencyKey::of::<SaveSystem>(), Lifetime::Singleton, vec![]),
            info(
                DependencyKey::of::<AudioManager>(),
                Lifetime::Singleton,
                vec![DependencyKey::of::<SaveSystem>()],
            ),
            info(
                DependencyKey::of::<CombatSystem>(),
                Lifetime::Scoped,
                vec![DependencyKey::of::<AudioManager>()],
            ),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn detect_circular_dependency() {
        struct A;
        struct B;
        struct C;

        let result = validate(vec![
            info(DependencyKey::of::<A>(), Lifetime::Transient, vec![DependencyKey::of::<B>()]),
            info(DependencyKey::of::<B>(), Lifetime::Transient, vec![DependencyKey::of::<C>()]),
            info(DependencyKey::of::<C>(), Lifetime::Transient, vec![DependencyKey::of::<A>()]),
        ]);

        match result {
            Err(ArborError::CircularDependency(err)) => {
                assert_eq!(err.chain.len(), 4);
                assert_eq!(err.chain.first(), err.chain.last());
            }
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }
    }

    #[test]
    fn detect_self_dependency() {
        struct A;
        let result = validate(vec![info(
            DependencyKey::of::<A>(),
            Lifetime::Transient,
            vec![DependencyKey::of::<A>()],
        )]);
        assert!(matches!(result, Err(ArborError::CircularDependency(_))));
    }

    #[test]
    fn detect_missing_dependency() {
        let result = validate(vec![info(
            DependencyKey::of::<CombatSystem>(),
            Lifetime::Transient,
            vec![DependencyKey::of::<LootTable>()],
        )]);

        match result {
            Err(ArborError::NotRegistered(err)) => {
                assert!(err.requested.type_name().contains("LootTable"));
                assert_eq!(err.required_by, Some(DependencyKey::of::<CombatSystem>()));
            }
            other => panic!("Expected NotRegistered, got: {other:?}"),
        }
    }

    #[test]
    fn inherited_keys_satisfy_dependencies() {
        let graph = graph(vec![info(
            DependencyKey::of::<LootTable>(),
            Lifetime::Singleton,
            vec![DependencyKey::of::<SaveSystem>()],
        )]);
        let inherited = [DependencyKey::of::<SaveSystem>()].into_iter().collect();

        assert!(GraphValidator::new(graph, inherited).validate().is_ok());
    }

    #[test]
    fn detect_lifetime_mismatch() {
        let result = validate(vec![
            info(DependencyKey::of::<LootTable>(), Lifetime::Transient, vec![]),
            info(
                DependencyKey::of::<CombatSystem>(),
                Lifetime::Singleton,
                vec![DependencyKey::of::<LootTable>()],
            ),
        ]);

        match result {
            Err(ArborError::ScopeMismatch(err)) => {
                assert_eq!(err.consumer_lifetime, Lifetime::Singleton);
                assert_eq!(err.dependency_lifetime, Lifetime::Transient);
            }
            other => panic!("Expected ScopeMismatch, got: {other:?}"),
        }
    }

    #[test]
    fn transient_depends_on_singleton_ok() {
        let result = validate(vec![
            info(DependencyKey::of::<SaveSystem>(), Lifetime::Singleton, vec![]),
            info(
                DependencyKey::of::<LootTable>(),
                Lifetime::Transient,
                vec![DependencyKey::of::<SaveSystem>()],
            ),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn diamond_dependency_ok() {
        //     A
        //    / \
        //   B   C
        //    \ /
        //     D
        struct A;
        struct B;
        struct C;
        struct D;

        let result = validate(vec![
            info(DependencyKey::of::<D>(), Lifetime::Singleton, vec![]),
            info(DependencyKey::of::<B>(), Lifetime::Singleton, vec![DependencyKey::of::<D>()]),
            info(DependencyKey::of::<C>(), Lifetime::Singleton, vec![DependencyKey::of::<D>()]),
            info(
                DependencyKey::of::<A>(),
                Lifetime::Singleton,
                vec![DependencyKey::of::<B>(), DependencyKey::of::<C>()],
            ),
        ]);
        assert!(result.is_ok());
    }
}
