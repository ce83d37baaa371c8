//! Named scene containers under a single root.
//!
//! [`ContainerRegistry`] owns the root container of an application and a
//! map from scene names to containers somewhere below it. Scenes are
//! created under the root or under another named scene, and unloaded by
//! name, which disposes their whole subtree.
//!
//! ```rust
//! use arbor_container::prelude::*;
//!
//! let scenes = ContainerRegistry::new();
//! scenes.initialize_root(Container::builder().singleton_value(60u32)).unwrap();
//!
//! let dungeon = scenes.create_named("Dungeon", Container::builder(), None).unwrap();
//! let floor1 = scenes.create_named("Floor1", Container::builder(), Some("Dungeon")).unwrap();
//! assert_eq!(floor1.hierarchy_path(), "Global → Dungeon → Floor1");
//!
//! scenes.unload("Dungeon").unwrap();
//! assert!(dungeon.is_disposed() && floor1.is_disposed());
//! assert!(scenes.list_names().is_empty());
//! ```

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{info, instrument, warn};

use crate::builder::ContainerBuilder;
use crate::container::Container;
use crate::diagnostics::Diagnostics;
use crate::error::{ArborError, Result};

/// Name of the root container created by [`ContainerRegistry::initialize_root`].
pub const ROOT_NAME: &str = "Global";

/// Manages the root container and the named scene containers below it.
pub struct ContainerRegistry {
    root: OnceCell<Container>,
    init_gate: Mutex<()>,
    named: DashMap<String, Container>,
    diagnostics: Diagnostics,
}

impl Default for ContainerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::with_diagnostics(Diagnostics::new())
    }

    /// Every container of this registry reports to `diagnostics`.
    pub fn with_diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            root: OnceCell::new(),
            init_gate: Mutex::new(()),
            named: DashMap::new(),
            diagnostics,
        }
    }

    /// Builds the root container, named [`ROOT_NAME`].
    ///
    /// The registry's diagnostics hub replaces any set on `services`.
    ///
    /// # Errors
    /// [`ArborError::AlreadyInitialized`] on every call after the first
    /// successful one.
    #[instrument(skip_all)]
    pub fn initialize_root(&self, services: ContainerBuilder) -> Result<Container> {
        let _gate = self.init_gate.lock();
        if self.root.get().is_some() {
            warn!("Root container already initialized");
            return Err(ArborError::AlreadyInitialized);
        }

        let root = services
            .diagnostics(self.diagnostics.clone())
            .build_root(Some(ROOT_NAME))?;
        self.root
            .set(root.clone())
            .map_err(|_| ArborError::AlreadyInitialized)?;

        info!(root = root.name(), "Root container initialized");
        Ok(root)
    }

    /// Creates a named container under `parent_name`, or under the root.
    ///
    /// # Errors
    /// - [`ArborError::NotInitialized`] — no root yet
    /// - [`ArborError::DuplicateName`] — `name` is taken
    /// - [`ArborError::ParentNotFound`] — `parent_name` is unknown
    /// - [`ArborError::ConcurrentRegistrationConflict`] — another caller
    ///   registered `name` while this container was being built
    /// - anything [`Container::create_child`] can return
    #[instrument(skip(self, services))]
    pub fn create_named(
        &self,
        name: &str,
        services: ContainerBuilder,
        parent_name: Option<&str>,
    ) -> Result<Container> {
        let root = self.root.get().ok_or(ArborError::NotInitialized)?;

        if self.named.contains_key(name) {
            return Err(ArborError::DuplicateName(name.to_string()));
        }

        let parent = match parent_name {
            Some(parent_name) => self
                .get_named(parent_name)
                .ok_or_else(|| ArborError::ParentNotFound(parent_name.to_string()))?,
            None => root.clone(),
        };

        let child = parent.create_child_from(services, Some(name))?;

        let inserted = match self.named.entry(name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(child.clone());
                true
            }
        };

        if !inserted {
            warn!(name, "Lost a concurrent registration race; disposing new container");
            child.dispose();
            return Err(ArborError::ConcurrentRegistrationConflict(name.to_string()));
        }

        info!(name, parent = parent.name(), depth = child.depth(), "Named container created");
        Ok(child)
    }

    pub fn get_named(&self, name: &str) -> Option<Container> {
        self.named.get(name).map(|entry| entry.value().clone())
    }

    /// Removes a named container and disposes its subtree.
    ///
    /// Named containers inside the subtree are forgotten as well.
    #[instrument(skip(self))]
    pub fn unload(&self, name: &str) -> Result<()> {
        let (_, container) = self
            .named
            .remove(name)
            .ok_or_else(|| ArborError::NameNotFound(name.to_string()))?;

        container.dispose();
        self.named.retain(|_, c| !c.is_disposed());

        info!(name, remaining = self.named.len(), "Named container unloaded");
        Ok(())
    }

    /// Snapshot of the registered names.
    pub fn list_names(&self) -> Vec<String> {
        self.named.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    pub fn root(&self) -> Option<Container> {
        self.root.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.root.get().is_some()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Disposes the root, and with it every named container.
    ///
    /// The registry stays initialized; it cannot be given a new root.
    pub fn shutdown(&self) {
        if let Some(root) = self.root.get() {
            root.dispose();
        }
        self.named.clear();
        info!("Container registry shut down");
    }
}

impl std::fmt::Debug for ContainerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerRegistry")
            .field("initialized", &self.is_initialized())
            .field("named", &self.named.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    struct SaveSystem;

    fn initialized() -> ContainerRegistry {
        let scenes = ContainerRegistry::new();
        scenes
            .initialize_root(
                Container::builder().singleton_with::<Arc<SaveSystem>>(|_| Ok(Arc::new(SaveSystem))),
            )
            .unwrap();
        scenes
    }

    #[test]
    fn root_is_named_global_and_set_once() {
        let scenes = ContainerRegistry::new();
        assert!(!scenes.is_initialized());

        let root = scenes.initialize_root(Container::builder()).unwrap();
        assert_eq!(root.name(), ROOT_NAME);
        assert_eq!(scenes.root(), Some(root));

        assert!(matches!(
            scenes.initialize_root(Container::builder()),
            Err(ArborError::AlreadyInitialized)
        ));
    }

    #[test]
    fn create_named_requires_root() {
        let scenes = ContainerRegistry::new();
        assert!(matches!(
            scenes.create_named("Dungeon", Container::builder(), None),
            Err(ArborError::NotInitialized)
        ));
    }

    #[test]
    fn named_containers_nest_under_parents() {
        let scenes = initialized();
        let dungeon = scenes.create_named("Dungeon", Container::builder(), None).unwrap();
        let floor1 = scenes
            .create_named("Floor1", Container::builder(), Some("Dungeon"))
            .unwrap();

        assert_eq!(dungeon.depth(), 1);
        assert_eq!(floor1.depth(), 2);
        assert_eq!(floor1.parent(), Some(dungeon));
        assert_eq!(scenes.get_named("Floor1"), Some(floor1.clone()));

        let save: Arc<SaveSystem> = floor1.resolve_required().unwrap();
        let from_root: Arc<SaveSystem> = scenes.root().unwrap().resolve_required().unwrap();
        assert!(Arc::ptr_eq(&save, &from_root));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let scenes = initialized();
        match scenes.create_named("Floor1", Container::builder(), Some("Dungeon")) {
            Err(ArborError::ParentNotFound(name)) => assert_eq!(name, "Dungeon"),
            other => panic!("Expected ParentNotFound, got: {other:?}"),
        }
        assert!(scenes.root().unwrap().children().is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let scenes = initialized();
        scenes.create_named("Town", Container::builder(), None).unwrap();
        assert!(matches!(
            scenes.create_named("Town", Container::builder(), None),
            Err(ArborError::DuplicateName(_))
        ));
        assert_eq!(scenes.root().unwrap().children().len(), 1);
    }

    #[test]
    fn unload_disposes_subtree_and_forgets_descendants() {
        let scenes = initialized();
        let menu = scenes.create_named("MainMenu", Container::builder(), None).unwrap();
        let dungeon = scenes.create_named("Dungeon", Container::builder(), None).unwrap();
        let floor1 = scenes
            .create_named("Floor1", Container::builder(), Some("Dungeon"))
            .unwrap();

        scenes.unload("Dungeon").unwrap();

        assert!(dungeon.is_disposed() && floor1.is_disposed());
        assert!(!menu.is_disposed());
        assert_eq!(scenes.list_names(), vec!["MainMenu".to_string()]);
        assert_eq!(scenes.root().unwrap().children(), vec![menu]);
    }

    #[test]
    fn unload_unknown_name_fails() {
        let scenes = initialized();
        assert!(matches!(scenes.unload("Nowhere"), Err(ArborError::NameNotFound(_))));
    }

    #[test]
    fn list_names_snapshots_keys() {
        let scenes = initialized();
        for name in ["Town", "Forest", "Castle"] {
            scenes.create_named(name, Container::builder(), None).unwrap();
        }
        let mut names = scenes.list_names();
        names.sort();
        assert_eq!(names, ["Castle", "Forest", "Town"]);
        assert!(scenes.contains("Forest"));
    }

    #[test]
    fn concurrent_same_name_has_one_winner() {
        let scenes = initialized();

        let outcomes: Vec<Result<Container>> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| scenes.create_named("Arena", Container::builder(), None)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<&Container> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(outcomes.iter().all(|r| matches!(
            r,
            Ok(_)
                | Err(ArborError::DuplicateName(_))
                | Err(ArborError::ConcurrentRegistrationConflict(_))
        )));

        // losers were disposed and detached from the root
        assert_eq!(scenes.root().unwrap().children(), vec![winners[0].clone()]);
        assert_eq!(scenes.get_named("Arena").as_ref(), Some(winners[0]));
    }

    #[test]
    fn concurrent_distinct_names_all_register() {
        let scenes = initialized();
        thread::scope(|s| {
            for i in 0..8 {
                let scenes = &scenes;
                s.spawn(move || {
                    scenes
                        .create_named(&format!("Scene{i}"), Container::builder(), None)
                        .unwrap();
                });
            }
        });
        assert_eq!(scenes.list_names().len(), 8);
        assert_eq!(scenes.root().unwrap().children().len(), 8);
    }

    #[test]
    fn shutdown_disposes_everything() {
        let scenes = initialized();
        let town = scenes.create_named("Town", Container::builder(), None).unwrap();

        scenes.shutdown();

        assert!(town.is_disposed());
        assert!(scenes.root().unwrap().is_disposed());
        assert!(scenes.list_names().is_empty());
        assert!(matches!(
            scenes.create_named("Town", Container::builder(), None),
            Err(ArborError::ContainerDisposed { .. })
        ));
    }

    #[test]
    fn registry_hub_sees_scene_events() {
        let scenes = ContainerRegistry::new();
        let mut events = scenes.diagnostics().subscribe();
        scenes.initialize_root(Container::builder()).unwrap();
        scenes.create_named("Town", Container::builder(), None).unwrap();

        let kinds: Vec<_> = events.drain().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, ["ContainerCreated", "ContainerCreated", "ChildAdded"]);
    }
}
