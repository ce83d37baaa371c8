//! Core hierarchical container implementation for Arbor.

pub mod builder;
pub mod container;
pub mod diagnostics;
pub mod error;
mod graph;
pub mod key;
pub mod lifetime;
pub mod manager;
pub mod provider;
pub mod registry;

pub use container::{Container, MAX_DEPTH, ScopedView, prelude};
pub use error::{ArborError, Result};
pub use key::DependencyKey;
pub use lifetime::Lifetime;
