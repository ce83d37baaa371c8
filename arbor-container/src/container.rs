//! # The Container, a node of the scene hierarchy
//!
//! Each [`Container`] wraps one flat registry and a non-owning link to its
//! parent. Resolution looks in the local registry first, then walks up the
//! ancestor chain; it never looks at children or siblings.
//!
//! # Architecture
//! ```text
//!              Global (depth 0)
//!             /                \
//!   MainMenu (depth 1)    Dungeon (depth 1)
//!                          /            \
//!                 Floor1 (depth 2)   Floor2 (depth 2)
//!                        │
//!                  create_scope()
//!                        │
//!                        ▼
//!                  Floor1[Scope]
//! ```
//!
//! Parents own their children; children hold a weak link back. Disposing a
//! container disposes its whole subtree, deepest nodes first.
//!
//! # Examples
//! ```rust
//! use arbor_container::prelude::*;
//! use std::sync::Arc;
//!
//! struct SaveSystem;
//! struct LootTable {
//!     save: Arc<SaveSystem>,
//! }
//!
//! let global = Container::builder()
//!     .singleton_with::<Arc<SaveSystem>>(|_| Ok(Arc::new(SaveSystem)))
//!     .build_root(Some("Global"))
//!     .expect("Failed to build root");
//!
//! let dungeon = global
//!     .create_child(
//!         |s| s.transient_with::<LootTable>(|r| Ok(LootTable { save: r.resolve()? })),
//!         Some("Dungeon"),
//!     )
//!     .expect("Failed to create child");
//!
//! let loot: LootTable = dungeon.resolve_required().expect("Failed to resolve");
//! let save: Arc<SaveSystem> = global.resolve_required().unwrap();
//! assert!(Arc::ptr_eq(&loot.save, &save));
//! assert_eq!(dungeon.hierarchy_path(), "Global → Dungeon");
//! ```

use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use arbor_support::rendering::{TreeNode, extend_path, render_tree};
use parking_lot::Mutex;
use tracing::{debug, field, info, trace, trace_span, warn};

use crate::builder::{ContainerBuilder, ContainerOptions};
use crate::diagnostics::{ContainerEvent, Diagnostics, ResolveOutcome};
use crate::error::{ArborError, Result};
use crate::key::DependencyKey;
use crate::registry::{FlatRegistry, FlatScope, Instance, Resolver, downcast};

/// Deepest nesting level a container may have. The root is depth 0.
pub const MAX_DEPTH: usize = 10;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique container identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(u64);

impl ContainerId {
    fn next() -> Self {
        Self(NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Answer of [`Container::supports`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Support {
    pub supported: bool,
    /// `false` when some registry on the path could not answer statically
    /// and the service was instantiated to find out.
    pub exact: bool,
}

// lifecycle states
const LIVE: u8 = 0;
const DISPOSING: u8 = 1;
const DISPOSED: u8 = 2;

struct ParentLink {
    inner: Weak<ContainerInner>,
    id: ContainerId,
    name: Arc<str>,
}

struct ContainerInner {
    id: ContainerId,
    name: Arc<str>,
    depth: usize,
    parent: Option<ParentLink>,
    children: Mutex<Vec<Container>>,
    registry: Arc<dyn FlatRegistry>,
    state: AtomicU8,
    options: ContainerOptions,
    diagnostics: Diagnostics,
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        if *self.state.get_mut() == LIVE {
            debug!(container = %self.name, "Container dropped without dispose; releasing registry");
            if let Err(err) = self.registry.dispose() {
                warn!(container = %self.name, error = %err, "Registry disposal failed on drop");
            }
        }
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// A node of the container hierarchy.
///
/// Cheap to clone; clones are handles to the same node. Thread-safe.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Create a new registration set.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Wraps an arbitrary [`FlatRegistry`] as a root container.
    pub fn from_registry(
        registry: Arc<dyn FlatRegistry>,
        name: &str,
        diagnostics: Diagnostics,
    ) -> Container {
        Self::new_root(registry, name, ContainerOptions::default(), diagnostics)
    }

    pub(crate) fn new_root(
        registry: Arc<dyn FlatRegistry>,
        name: &str,
        options: ContainerOptions,
        diagnostics: Diagnostics,
    ) -> Container {
        Self::new_node(ContainerId::next(), registry, Arc::from(name), None, options, diagnostics)
    }

    fn new_node(
        id: ContainerId,
        registry: Arc<dyn FlatRegistry>,
        name: Arc<str>,
        parent: Option<&Container>,
        options: ContainerOptions,
        diagnostics: Diagnostics,
    ) -> Container {
        let depth = parent.map_or(0, |p| p.inner.depth + 1);
        let parent = parent.map(|p| ParentLink {
            inner: Arc::downgrade(&p.inner),
            id: p.inner.id,
            name: Arc::clone(&p.inner.name),
        });

        let container = Container {
            inner: Arc::new(ContainerInner {
                id,
                name,
                depth,
                parent,
                children: Mutex::new(Vec::new()),
                registry,
                state: AtomicU8::new(LIVE),
                options,
                diagnostics,
            }),
        };

        let inner = &container.inner;
        info!(container = %inner.name, container_id = %inner.id, depth, "Container created");
        inner.diagnostics.emit_with(|| ContainerEvent::ContainerCreated {
            id: inner.id,
            name: Arc::clone(&inner.name),
            depth,
            parent_id: inner.parent.as_ref().map(|p| p.id),
            parent_name: inner.parent.as_ref().map(|p| Arc::clone(&p.name)),
        });
        container
    }

    // ── Accessors ──

    pub fn id(&self) -> ContainerId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of edges from the root.
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// The parent, if it is still alive.
    pub fn parent(&self) -> Option<Container> {
        self.inner
            .parent
            .as_ref()
            .and_then(|link| link.inner.upgrade())
            .map(|inner| Container { inner })
    }

    /// Snapshot of the current children.
    pub fn children(&self) -> Vec<Container> {
        self.inner.children.lock().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == DISPOSED
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.inner.diagnostics
    }

    /// Names from the root down to this container, e.g.
    /// `Global → Dungeon → Floor1`.
    pub fn hierarchy_path(&self) -> String {
        match (&self.inner.parent, self.parent()) {
            (_, Some(parent)) => extend_path(&parent.hierarchy_path(), &self.inner.name),
            // parent already gone: the last known name still locates us
            (Some(link), None) => extend_path(&link.name, &self.inner.name),
            (None, None) => self.inner.name.to_string(),
        }
    }

    /// Renders this container and its descendants as a tree.
    pub fn render_tree(&self) -> String {
        render_tree(&self.tree_node())
    }

    fn tree_node(&self) -> TreeNode {
        self.children()
            .iter()
            .fold(TreeNode::new(self.name()), |node, child| node.with_child(child.tree_node()))
    }

    // ── Resolution ──

    /// Resolve a service by type, searching this container and then its
    /// ancestors.
    ///
    /// Returns `Ok(None)` if nothing in the chain provides it.
    ///
    /// ```rust,ignore
    /// let save: Option<Arc<SaveSystem>> = floor1.resolve()?;
    /// ```
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Option<T>> {
        let key = DependencyKey::of::<T>();
        self.resolve_key(&key)?
            .map(|instance| downcast(key, instance))
            .transpose()
    }

    /// Like [`resolve`](Container::resolve), but a miss is an error.
    pub fn resolve_required<T: Send + Sync + 'static>(&self) -> Result<T> {
        match self.resolve::<T>()? {
            Some(value) => Ok(value),
            None => Err(self.resolution_failed(type_name::<T>(), self.name().to_string())),
        }
    }

    /// Type-erased [`resolve`](Container::resolve).
    pub fn resolve_key(&self, key: &DependencyKey) -> Result<Option<Instance>> {
        self.ensure_live()?;
        let inner = &self.inner;

        inner.diagnostics.emit_with(|| ContainerEvent::ResolveStart {
            container_id: inner.id,
            name: Arc::clone(&inner.name),
            depth: inner.depth,
            type_name: key.type_name(),
        });

        let span = trace_span!(
            "resolve",
            container = %inner.name,
            container_id = %inner.id,
            depth = inner.depth,
            service = key.type_name(),
            outcome = field::Empty,
            resolved_depth = field::Empty,
        );
        let _entered = span.enter();
        let started = Instant::now();

        let result = self.resolve_internal(key);

        let (outcome, resolved_depth) = match &result {
            Ok(Some((_, depth))) if *depth == inner.depth => (ResolveOutcome::LocalHit, Some(*depth)),
            Ok(Some((_, depth))) => (ResolveOutcome::ParentHit, Some(*depth)),
            Ok(None) => (ResolveOutcome::NotFound, None),
            Err(_) => (ResolveOutcome::Faulted, None),
        };
        span.record("outcome", field::display(outcome));
        if let Some(depth) = resolved_depth {
            span.record("resolved_depth", depth);
        }
        trace!(%outcome, "Resolved");

        if let Err(err) = &result {
            warn!(container = %inner.name, service = key.type_name(), error = %err, "Resolution failed");
            inner.diagnostics.emit_with(|| ContainerEvent::ResolveFailure {
                container_id: inner.id,
                name: Arc::clone(&inner.name),
                depth: inner.depth,
                type_name: key.type_name(),
                error: err.to_string(),
            });
        }

        inner.diagnostics.emit_with(|| ContainerEvent::ResolveStop {
            container_id: inner.id,
            name: Arc::clone(&inner.name),
            depth: inner.depth,
            type_name: key.type_name(),
            outcome,
            resolved_depth,
            elapsed: started.elapsed(),
        });

        result.map(|found| found.map(|(instance, _)| instance))
    }

    /// Walks the ancestor chain without emitting diagnostics.
    ///
    /// Returns the instance together with the depth of the container whose
    /// registry produced it.
    fn resolve_internal(&self, key: &DependencyKey) -> Result<Option<(Instance, usize)>> {
        let resolver = ContainerResolver { container: self };
        if let Some(instance) = self.inner.registry.resolve_key(key, &resolver)? {
            return Ok(Some((instance, self.inner.depth)));
        }

        match self.live_parent()? {
            Some(parent) => parent.resolve_internal(key),
            None => Ok(None),
        }
    }

    /// Whether this container or an ancestor can provide `T`.
    ///
    /// Registries that cannot answer statically are probed by resolving,
    /// which may create a singleton early; such answers carry
    /// `exact == false`.
    pub fn supports<T: 'static>(&self) -> Result<Support> {
        self.supports_key(&DependencyKey::of::<T>())
    }

    pub fn supports_key(&self, key: &DependencyKey) -> Result<Support> {
        self.ensure_live()?;

        let local = match self.inner.registry.supports(key) {
            Some(supported) => Support { supported, exact: true },
            None => {
                warn!(
                    container = %self.inner.name,
                    service = key.type_name(),
                    "Registry has no static capability check; probing by instantiation"
                );
                let resolver = ContainerResolver { container: self };
                let supported = matches!(self.inner.registry.resolve_key(key, &resolver), Ok(Some(_)));
                Support { supported, exact: false }
            }
        };

        if local.supported {
            return Ok(local);
        }

        match self.live_parent()? {
            Some(parent) => {
                let upstream = parent.supports_key(key)?;
                Ok(Support {
                    supported: upstream.supported,
                    exact: local.exact && upstream.exact,
                })
            }
            None => Ok(local),
        }
    }

    // ── Hierarchy mutation ──

    /// Creates a child container whose registrations are added by
    /// `configure`.
    ///
    /// The child is named `name`, or `Child-<id>` when `None`.
    ///
    /// # Errors
    /// - [`ArborError::ContainerDisposed`] — this container is disposed,
    ///   or was disposed while the child was being built
    /// - [`ArborError::MaxDepthExceeded`] — this container is at [`MAX_DEPTH`]
    pub fn create_child(
        &self,
        configure: impl FnOnce(ContainerBuilder) -> ContainerBuilder,
        name: Option<&str>,
    ) -> Result<Container> {
        self.ensure_can_parent()?;
        self.create_child_from(configure(ContainerBuilder::new()), name)
    }

    pub(crate) fn create_child_from(
        &self,
        services: ContainerBuilder,
        name: Option<&str>,
    ) -> Result<Container> {
        self.ensure_can_parent()?;
        let inner = &self.inner;

        let id = ContainerId::next();
        let name: Arc<str> = match name {
            Some(name) => Arc::from(name),
            None => Arc::from(format!("Child-{id}")),
        };

        // built outside the children lock; only the append is serialized
        let registry = services.into_registry(&name, &inner.options, || {
            ContainerResolver { container: self }.visible_keys().into_iter().collect()
        })?;
        let child = Container::new_node(
            id,
            registry,
            name,
            Some(self),
            inner.options,
            inner.diagnostics.clone(),
        );

        {
            let mut children = inner.children.lock();
            if inner.state.load(Ordering::Acquire) != LIVE {
                drop(children);
                child.dispose();
                return Err(self.disposed_error());
            }
            children.push(child.clone());
        }

        debug!(parent = %inner.name, child = %child.inner.name, depth = child.inner.depth, "Child added");
        inner.diagnostics.emit_with(|| ContainerEvent::ChildAdded {
            child_id: child.inner.id,
            child_name: Arc::clone(&child.inner.name),
            parent_id: inner.id,
            parent_name: Arc::clone(&inner.name),
        });

        Ok(child)
    }

    /// Opens a scope for scoped-lifetime services.
    pub fn create_scope(&self) -> Result<ScopedView<'_>> {
        self.ensure_live()?;
        trace!(container = %self.inner.name, "Creating scope");
        Ok(ScopedView {
            flat: Arc::clone(&self.inner.registry).create_scope(),
            container: self,
            disposed: AtomicBool::new(false),
        })
    }

    // ── Disposal ──

    /// Disposes this container and its whole subtree.
    ///
    /// Children are disposed first, then this container's registry, then
    /// the container detaches from its parent. Idempotent; registry
    /// disposal failures are logged and reported as diagnostics events,
    /// never returned.
    pub fn dispose(&self) {
        let inner = &self.inner;
        if inner
            .state
            .compare_exchange(LIVE, DISPOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        // every child detaches itself from our list as it finishes
        let children = inner.children.lock().clone();
        for child in &children {
            child.dispose();
        }
        inner.children.lock().clear();

        if let Err(err) = inner.registry.dispose() {
            warn!(container = %inner.name, error = %err, "Registry disposal failed");
            inner.diagnostics.emit_with(|| ContainerEvent::DisposalFailed {
                container_id: inner.id,
                name: Arc::clone(&inner.name),
                error: err.to_string(),
            });
        }

        inner.state.store(DISPOSED, Ordering::Release);
        info!(container = %inner.name, container_id = %inner.id, depth = inner.depth, "Container disposed");
        inner.diagnostics.emit_with(|| ContainerEvent::ContainerDisposed {
            id: inner.id,
            name: Arc::clone(&inner.name),
            depth: inner.depth,
        });

        self.detach_from_parent();
    }

    fn detach_from_parent(&self) {
        let Some(link) = &self.inner.parent else {
            return;
        };
        let Some(parent) = link.inner.upgrade() else {
            return;
        };

        let removed = {
            let mut children = parent.children.lock();
            let before = children.len();
            children.retain(|c| c.inner.id != self.inner.id);
            children.len() != before
        };

        if removed {
            debug!(parent = %link.name, child = %self.inner.name, "Child removed");
            self.inner.diagnostics.emit_with(|| ContainerEvent::ChildRemoved {
                child_id: self.inner.id,
                child_name: Arc::clone(&self.inner.name),
                parent_id: link.id,
                parent_name: Arc::clone(&link.name),
            });
        }
    }

    // ── Internal ──

    fn ensure_live(&self) -> Result<()> {
        if self.inner.state.load(Ordering::Acquire) == LIVE {
            Ok(())
        } else {
            Err(self.disposed_error())
        }
    }

    fn ensure_can_parent(&self) -> Result<()> {
        self.ensure_live()?;
        if self.inner.depth >= MAX_DEPTH {
            return Err(ArborError::MaxDepthExceeded {
                limit: MAX_DEPTH,
                depth: self.inner.depth,
            });
        }
        Ok(())
    }

    fn disposed_error(&self) -> ArborError {
        ArborError::ContainerDisposed {
            name: self.inner.name.to_string(),
        }
    }

    /// The parent for fallback resolution. A parent that is gone or
    /// disposed is an error, not a miss.
    fn live_parent(&self) -> Result<Option<Container>> {
        let Some(link) = &self.inner.parent else {
            return Ok(None);
        };
        let Some(inner) = link.inner.upgrade() else {
            return Err(ArborError::ContainerDisposed {
                name: link.name.to_string(),
            });
        };
        let parent = Container { inner };
        parent.ensure_live()?;
        Ok(Some(parent))
    }

    /// Reports a `resolve_required` miss. `requester` is the name the error
    /// carries: the container's own, or that of a view over it.
    fn resolution_failed(&self, type_name: &'static str, requester: String) -> ArborError {
        let inner = &self.inner;
        warn!(container = %requester, service = type_name, "Required service not found");
        inner.diagnostics.emit_with(|| ContainerEvent::ResolveFailure {
            container_id: inner.id,
            name: Arc::clone(&inner.name),
            depth: inner.depth,
            type_name,
            error: "service not registered".to_string(),
        });
        ArborError::ServiceResolutionFailed {
            type_name,
            container: requester,
        }
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Container {}

impl Hash for Container {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("depth", &self.inner.depth)
            .field("children", &self.inner.children.lock().len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ═══════════════════════════════════════════
// ScopedView
// ═══════════════════════════════════════════

/// A resolution scope over one container.
///
/// Scoped services are cached per view; everything else falls back to the
/// container's own resolution, which walks the ancestor chain. Scopes do
/// not nest: a view never consults another view.
pub struct ScopedView<'a> {
    flat: Box<dyn FlatScope>,
    container: &'a Container,
    disposed: AtomicBool,
}

impl<'a> ScopedView<'a> {
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Option<T>> {
        let key = DependencyKey::of::<T>();
        self.resolve_key(&key)?
            .map(|instance| downcast(key, instance))
            .transpose()
    }

    pub fn resolve_required<T: Send + Sync + 'static>(&self) -> Result<T> {
        match self.resolve::<T>()? {
            Some(value) => Ok(value),
            None => Err(self.container.resolution_failed(type_name::<T>(), self.name())),
        }
    }

    pub fn resolve_key(&self, key: &DependencyKey) -> Result<Option<Instance>> {
        self.ensure_usable()?;
        if let Some(instance) = self.flat.resolve_key(key, &ScopeResolver { view: self })? {
            return Ok(Some(instance));
        }
        self.container.resolve_key(key)
    }

    /// Same lookup as [`resolve_key`](ScopedView::resolve_key), without
    /// diagnostics, for factories running inside this scope.
    fn resolve_quiet(&self, key: &DependencyKey) -> Result<Option<Instance>> {
        self.ensure_usable()?;
        if let Some(instance) = self.flat.resolve_key(key, &ScopeResolver { view: self })? {
            return Ok(Some(instance));
        }
        Ok(self.container.resolve_internal(key)?.map(|(instance, _)| instance))
    }

    /// Always fails: child containers hang off containers, not scopes.
    pub fn create_child(
        &self,
        _configure: impl FnOnce(ContainerBuilder) -> ContainerBuilder,
        _name: Option<&str>,
    ) -> Result<Container> {
        Err(ArborError::UnsupportedOperation(
            "Cannot create child containers from a scoped view; create child containers from the root container instead"
                .to_string(),
        ))
    }

    pub fn name(&self) -> String {
        format!("{}[Scope]", self.container.name())
    }

    pub fn depth(&self) -> usize {
        self.container.depth()
    }

    pub fn hierarchy_path(&self) -> String {
        format!("{}[Scope]", self.container.hierarchy_path())
    }

    /// The container this view was opened on.
    pub fn container(&self) -> &'a Container {
        self.container
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Releases the instances cached by this scope. Idempotent; the
    /// container is unaffected.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(err) = self.flat.dispose() {
            warn!(scope = %self.name(), error = %err, "Scope disposal failed");
        }
        trace!(scope = %self.name(), "Scope disposed");
    }

    fn ensure_usable(&self) -> Result<()> {
        self.container.ensure_live()?;
        if self.is_disposed() {
            return Err(ArborError::ContainerDisposed { name: self.name() });
        }
        Ok(())
    }
}

impl Drop for ScopedView<'_> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for ScopedView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedView")
            .field("container", &self.container.name())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Resolvers handed to factories
// ═══════════════════════════════════════════

struct ContainerResolver<'a> {
    container: &'a Container,
}

impl Resolver for ContainerResolver<'_> {
    fn try_resolve_key(&self, key: &DependencyKey) -> Result<Option<Instance>> {
        Ok(self.container.resolve_internal(key)?.map(|(instance, _)| instance))
    }

    fn visible_keys(&self) -> Vec<DependencyKey> {
        let mut keys = self.container.inner.registry.registered_keys();
        let mut next = self.container.parent();
        while let Some(ancestor) = next {
            keys.extend(ancestor.inner.registry.registered_keys());
            next = ancestor.parent();
        }
        keys
    }
}

struct ScopeResolver<'s, 'a> {
    view: &'s ScopedView<'a>,
}

impl Resolver for ScopeResolver<'_, '_> {
    fn try_resolve_key(&self, key: &DependencyKey) -> Result<Option<Instance>> {
        self.view.resolve_quiet(key)
    }

    fn visible_keys(&self) -> Vec<DependencyKey> {
        ContainerResolver { container: self.view.container }.visible_keys()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerId, MAX_DEPTH, ScopedView, Support};
    pub use crate::builder::{ContainerBuilder, ContainerOptions};
    pub use crate::diagnostics::{
        ContainerEvent, Diagnostics, DiagnosticsConfig, DiagnosticsSubscription, ResolveOutcome,
    };
    pub use crate::error::{ArborError, Result};
    pub use crate::key::DependencyKey;
    pub use crate::lifetime::Lifetime;
    pub use crate::manager::ContainerRegistry;
    pub use crate::provider::Provider;
    pub use crate::registry::{Disposable, Resolver, ResolverExt};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
