//! # Arbor: hierarchical dependency injection for Rust
//!
//! A tree of service containers: children see everything their ancestors
//! register, may shadow it locally, and are disposed with their parent.
//! Built for scene-structured applications where each scene brings its
//! own services and unloading a scene releases exactly that subtree.
//!
//! ```rust
//! use arbor::prelude::*;
//! use std::sync::Arc;
//!
//! struct SaveSystem;
//!
//! let scenes = ContainerRegistry::new();
//! scenes
//!     .initialize_root(Container::builder().singleton_with::<Arc<SaveSystem>>(|_| Ok(Arc::new(SaveSystem))))
//!     .unwrap();
//!
//! let dungeon = scenes.create_named("Dungeon", Container::builder(), None).unwrap();
//! assert!(dungeon.resolve::<Arc<SaveSystem>>().unwrap().is_some());
//! ```

pub use arbor_container::*;
pub use arbor_support::*;
