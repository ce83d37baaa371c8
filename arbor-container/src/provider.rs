//! Provider trait: a module of related service registrations.
//!
//! Providers group the services of one feature so a scene can pull them
//! in with a single call.
//!
//! # Examples
//! ```rust,ignore
//! struct CombatProvider;
//!
//! impl Provider for CombatProvider {
//!     fn register(&self, services: ContainerBuilder) -> ContainerBuilder {
//!         services
//!             .singleton_with::<Arc<CombatSystem>>(|_| Ok(Arc::new(CombatSystem::default())))
//!             .scoped_with::<Arc<Encounter>>(|r| Ok(Arc::new(Encounter::new(r.resolve()?))))
//!     }
//! }
//!
//! let dungeon = global.create_child(|s| s.add_provider(&CombatProvider), Some("Dungeon"))?;
//! ```

use crate::builder::ContainerBuilder;

/// A module that registers related services into a registration set.
pub trait Provider: Send + Sync {
    /// Adds this module's registrations.
    fn register(&self, services: ContainerBuilder) -> ContainerBuilder;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use std::sync::Arc;

    struct SaveSystem;
    struct AudioManager {
        volume: u8,
    }

    struct CoreProvider;

    impl Provider for CoreProvider {
        fn register(&self, services: ContainerBuilder) -> ContainerBuilder {
            services
                .singleton_with::<Arc<SaveSystem>>(|_| Ok(Arc::new(SaveSystem)))
                .singleton_value(Arc::new(AudioManager { volume: 80 }))
        }
    }

    #[test]
    fn provider_registers_services() {
        let services = Container::builder().add_provider(&CoreProvider);
        assert_eq!(services.len(), 2);

        let root = services.build().unwrap();
        let audio: Arc<AudioManager> = root.resolve().unwrap().unwrap();
        assert_eq!(audio.volume, 80);
        assert!(root.resolve::<Arc<SaveSystem>>().unwrap().is_some());
    }

    #[test]
    fn provider_feeds_child_containers() {
        let root = Container::builder().build_root(Some("Global")).unwrap();
        let child = root.create_child(|s| s.add_provider(&CoreProvider), Some("Town")).unwrap();

        assert!(child.resolve::<Arc<SaveSystem>>().unwrap().is_some());
        assert!(root.resolve::<Arc<SaveSystem>>().unwrap().is_none());
    }

    #[test]
    fn provider_has_name() {
        assert!(CoreProvider.name().contains("CoreProvider"));
    }
}
