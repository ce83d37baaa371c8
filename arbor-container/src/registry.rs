//! Flat service registry: the per-container store of registrations.
//!
//! A [`FlatRegistry`] maps [`DependencyKey`]s to factories and caches the
//! instances their lifetimes ask for. It knows nothing about parents or
//! children; the hierarchical [`Container`](crate::container::Container)
//! wraps one and walks the ancestor chain on a miss.
//!
//! [`ServiceRegistry`] is the implementation built by
//! [`ContainerBuilder`](crate::builder::ContainerBuilder).

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arbor_support::rendering::suggest_similar;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::{
    AlreadyRegisteredError, ArborError, BoxError, CircularDependencyError, DisposalError,
    NotRegisteredError, Result,
};
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;

/// A type-erased service instance.
pub type Instance = Box<dyn Any + Send + Sync>;

/// Factory producing a service instance.
///
/// Factories receive a [`Resolver`] for their own dependencies. `Arc`
/// because registrations are shared between threads and scopes.
pub type FactoryFn = Arc<dyn Fn(&dyn Resolver) -> Result<Instance> + Send + Sync>;

/// Clones a cached instance out of the cache.
pub(crate) type ClonerFn = fn(&(dyn Any + Send + Sync)) -> Option<Instance>;

/// Runs the [`Disposable`] hook of a cached instance.
pub(crate) type DisposerFn = fn(&(dyn Any + Send + Sync)) -> std::result::Result<(), BoxError>;

/// Services that release resources when their owning container or scope
/// is disposed.
///
/// Only cached instances (singleton and scoped) are disposed by the
/// container; transient instances belong to the caller.
pub trait Disposable: Send + Sync {
    fn dispose(&self) -> std::result::Result<(), BoxError>;
}

impl<T: Disposable + ?Sized> Disposable for Arc<T> {
    fn dispose(&self) -> std::result::Result<(), BoxError> {
        (**self).dispose()
    }
}

/// Resolves dependencies from inside factories.
///
/// Separated from the container so factories can be handed a view that
/// resolves through a scope first.
pub trait Resolver: Send + Sync {
    /// Looks a key up, returning `None` when nothing in reach provides it.
    fn try_resolve_key(&self, key: &DependencyKey) -> Result<Option<Instance>>;

    /// Keys visible to this resolver, used for "did you mean?" hints.
    fn visible_keys(&self) -> Vec<DependencyKey> {
        Vec::new()
    }

    /// Like [`try_resolve_key`](Resolver::try_resolve_key), but a miss is
    /// a [`ArborError::NotRegistered`] error.
    fn resolve_key(&self, key: &DependencyKey) -> Result<Instance> {
        self.try_resolve_key(key)?.ok_or_else(|| {
            ArborError::NotRegistered(NotRegisteredError {
                requested: *key,
                required_by: None,
                suggestions: suggestions_for(key, &self.visible_keys()),
            })
        })
    }
}

/// Typed helpers over [`Resolver`], usable on `&dyn Resolver`.
///
/// ```rust,ignore
/// builder.singleton_with::<Arc<LootTable>>(|r| {
///     let rng: Arc<Rng> = r.resolve()?;
///     Ok(Arc::new(LootTable::new(rng)))
/// })
/// ```
pub trait ResolverExt {
    fn resolve<T: Send + Sync + 'static>(&self) -> Result<T>;
    fn try_resolve<T: Send + Sync + 'static>(&self) -> Result<Option<T>>;
}

impl<R: Resolver + ?Sized> ResolverExt for R {
    fn resolve<T: Send + Sync + 'static>(&self) -> Result<T> {
        let key = DependencyKey::of::<T>();
        downcast(key, self.resolve_key(&key)?)
    }

    fn try_resolve<T: Send + Sync + 'static>(&self) -> Result<Option<T>> {
        let key = DependencyKey::of::<T>();
        self.try_resolve_key(&key)?
            .map(|instance| downcast(key, instance))
            .transpose()
    }
}

/// Unboxes a type-erased instance.
pub(crate) fn downcast<T: 'static>(key: DependencyKey, instance: Instance) -> Result<T> {
    instance
        .downcast::<T>()
        .map(|b| *b)
        .map_err(|_| ArborError::ConstructionFailed {
            key,
            source: format!("Type mismatch: expected {}", type_name::<T>()).into(),
        })
}

pub(crate) fn suggestions_for(key: &DependencyKey, available: &[DependencyKey]) -> Vec<String> {
    let names: Vec<&str> = available.iter().map(DependencyKey::type_name).collect();
    suggest_similar(key.type_name(), &names, 3)
}

pub(crate) fn clone_instance<T: Clone + Send + Sync + 'static>(
    value: &(dyn Any + Send + Sync),
) -> Option<Instance> {
    value.downcast_ref::<T>().map(|v| Box::new(v.clone()) as Instance)
}

pub(crate) fn dispose_instance<T: Disposable + 'static>(
    value: &(dyn Any + Send + Sync),
) -> std::result::Result<(), BoxError> {
    match value.downcast_ref::<T>() {
        Some(v) => v.dispose(),
        None => Ok(()),
    }
}

// ═══════════════════════════════════════════
// Collaborator contract
// ═══════════════════════════════════════════

/// The non-hierarchical registry a container wraps.
pub trait FlatRegistry: Send + Sync {
    /// Produces an instance for `key`, or `None` if nothing is registered.
    fn resolve_key(&self, key: &DependencyKey, resolver: &dyn Resolver) -> Result<Option<Instance>>;

    /// Answers whether `key` is registered without instantiating anything.
    ///
    /// `None` means the registry cannot tell statically.
    fn supports(&self, _key: &DependencyKey) -> Option<bool> {
        None
    }

    /// Opens a resolution scope for scoped-lifetime services.
    fn create_scope(self: Arc<Self>) -> Box<dyn FlatScope>;

    /// Releases every cached instance.
    fn dispose(&self) -> Result<()>;

    fn registered_keys(&self) -> Vec<DependencyKey> {
        Vec::new()
    }
}

/// A short-lived resolution scope produced by a [`FlatRegistry`].
pub trait FlatScope: Send + Sync {
    fn resolve_key(&self, key: &DependencyKey, resolver: &dyn Resolver) -> Result<Option<Instance>>;

    /// Releases the instances cached by this scope.
    fn dispose(&self) -> Result<()>;
}

// ═══════════════════════════════════════════
// Registrations
// ═══════════════════════════════════════════

/// Registration entry for a single service.
#[derive(Clone)]
pub(crate) struct Registration {
    pub key: DependencyKey,
    pub factory: FactoryFn,
    pub lifetime: Lifetime,
    pub dependencies: Vec<DependencyKey>,
    /// Always set for cached lifetimes.
    pub cloner: Option<ClonerFn>,
    pub disposer: Option<DisposerFn>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("dependencies", &self.dependencies)
            .field("disposable", &self.disposer.is_some())
            .finish()
    }
}

thread_local! {
    /// Keys whose factories are running on this thread, outermost first.
    static BUILDING: RefCell<Vec<DependencyKey>> = const { RefCell::new(Vec::new()) };
}

/// Marks a key as under construction on the current thread until dropped.
///
/// Entering a key that is already under construction means a factory
/// resolved itself, directly or through other services.
struct Building;

impl Building {
    fn enter(key: DependencyKey) -> Result<Self> {
        BUILDING.with_borrow_mut(|stack| {
            if let Some(start) = stack.iter().position(|k| *k == key) {
                let mut chain = stack[start..].to_vec();
                chain.push(key);
                warn!(cycle = ?chain, "Circular dependency while resolving");
                return Err(ArborError::CircularDependency(CircularDependencyError { chain }));
            }
            stack.push(key);
            Ok(Building)
        })
    }
}

impl Drop for Building {
    fn drop(&mut self) {
        BUILDING.with_borrow_mut(|stack| {
            stack.pop();
        });
    }
}

/// Runs a factory that produces a fresh instance on every call.
fn build_transient(registration: &Registration, resolver: &dyn Resolver) -> Result<Instance> {
    let _building = Building::enter(registration.key)?;
    (registration.factory)(resolver)
}

/// Lazily created instances, one cell per key.
///
/// Creation order is recorded so disposal can run in reverse. Once
/// disposed the cache stays closed.
#[derive(Default)]
struct InstanceCache {
    cells: DashMap<DependencyKey, Arc<OnceCell<Instance>>>,
    created: Mutex<Vec<DependencyKey>>,
    closed: AtomicBool,
}

impl InstanceCache {
    fn get_or_create(
        &self,
        registration: &Registration,
        resolver: &dyn Resolver,
        owner: &str,
    ) -> Result<Instance> {
        let key = registration.key;
        if self.closed.load(Ordering::Acquire) {
            return Err(ArborError::ContainerDisposed { name: owner.to_string() });
        }

        // The map guard must be released before the factory runs; factories
        // resolve other keys from the same cache.
        let cell = Arc::clone(&self.cells.entry(key).or_default());

        let value = match cell.get() {
            Some(value) => value,
            None => {
                // checked before touching the cell, re-entering its init would block
                let _building = Building::enter(key)?;
                cell.get_or_try_init(|| {
                    trace!(key = %key, lifetime = %registration.lifetime, "Creating cached instance");
                    let instance = (registration.factory)(resolver)?;

                    let mut created = self.created.lock();
                    if self.closed.load(Ordering::Acquire) {
                        drop(created);
                        release_late(registration, &instance);
                        return Err(ArborError::ContainerDisposed { name: owner.to_string() });
                    }
                    created.push(key);
                    Ok::<_, ArborError>(instance)
                })?
            }
        };

        let cloner = registration.cloner.ok_or_else(|| ArborError::ConstructionFailed {
            key,
            source: "cached registration has no cloner".into(),
        })?;

        cloner(&**value).ok_or_else(|| ArborError::ConstructionFailed {
            key,
            source: format!("Type mismatch in cache for {}", key.type_name()).into(),
        })
    }

    /// Closes the cache, runs disposal hooks newest-first and drops every
    /// cached instance.
    fn dispose(&self, registrations: &HashMap<DependencyKey, Registration>) -> Result<()> {
        // Closing under the same lock that records creations: every instance
        // is either recorded here or released by the resolve that built it.
        let created = {
            let mut created = self.created.lock();
            self.closed.store(true, Ordering::Release);
            std::mem::take(&mut *created)
        };
        let mut failures = Vec::new();

        for key in created.iter().rev() {
            let Some((_, cell)) = self.cells.remove(key) else {
                continue;
            };
            let Some(hook) = registrations.get(key).and_then(|r| r.disposer) else {
                continue;
            };
            // recorded keys are stored as soon as their init returns
            if let Err(err) = hook(&**cell.wait()) {
                warn!(key = %key, error = %err, "Disposal hook failed");
                failures.push((*key, err));
            }
        }
        self.cells.clear();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ArborError::DisposalFailed(DisposalError { failures }))
        }
    }
}

/// Disposes an instance finished after its cache was closed.
fn release_late(registration: &Registration, instance: &Instance) {
    let Some(hook) = registration.disposer else {
        return;
    };
    debug!(key = %registration.key, "Releasing instance created during disposal");
    if let Err(err) = hook(&**instance) {
        warn!(key = %registration.key, error = %err, "Disposal hook failed");
    }
}

/// Stores the registrations of one container.
///
/// Populated during the build phase, immutable afterwards apart from its
/// instance cache.
#[derive(Default)]
pub struct ServiceRegistry {
    owner: String,
    registrations: HashMap<DependencyKey, Registration>,
    instances: InstanceCache,
    validate_scopes: bool,
}

impl ServiceRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for a key.
    ///
    /// # Errors
    /// Returns [`ArborError::AlreadyRegistered`] if the key is already
    /// registered and `allow_override` is false.
    pub(crate) fn register(&mut self, registration: Registration, allow_override: bool) -> Result<()> {
        let key = registration.key;

        if !allow_override && self.registrations.contains_key(&key) {
            return Err(ArborError::AlreadyRegistered(AlreadyRegisteredError { key }));
        }

        debug!(key = %key, lifetime = %registration.lifetime, "Registered service");
        self.registrations.insert(key, registration);
        Ok(())
    }

    pub(crate) fn get_mut(&mut self, key: &DependencyKey) -> Option<&mut Registration> {
        self.registrations.get_mut(key)
    }

    pub(crate) fn all_registrations(&self) -> &HashMap<DependencyKey, Registration> {
        &self.registrations
    }

    /// Seals the registry for use by a container.
    pub(crate) fn seal(mut self, owner: &str, validate_scopes: bool) -> Arc<Self> {
        self.owner = owner.to_string();
        self.validate_scopes = validate_scopes;
        Arc::new(self)
    }

    /// Returns the number of registered services.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("owner", &self.owner)
            .field("registered", &self.registrations.len())
            .finish()
    }
}

impl FlatRegistry for ServiceRegistry {
    fn resolve_key(&self, key: &DependencyKey, resolver: &dyn Resolver) -> Result<Option<Instance>> {
        let Some(registration) = self.registrations.get(key) else {
            return Ok(None);
        };

        let instance = match registration.lifetime {
            Lifetime::Transient => build_transient(registration, resolver)?,
            Lifetime::Scoped if self.validate_scopes => {
                return Err(ArborError::ScopedResolvedFromRoot {
                    key: *key,
                    container: self.owner.clone(),
                });
            }
            Lifetime::Singleton | Lifetime::Scoped => {
                self.instances.get_or_create(registration, resolver, &self.owner)?
            }
        };
        Ok(Some(instance))
    }

    fn supports(&self, key: &DependencyKey) -> Option<bool> {
        Some(self.registrations.contains_key(key))
    }

    fn create_scope(self: Arc<Self>) -> Box<dyn FlatScope> {
        trace!(owner = %self.owner, "Opening registry scope");
        Box::new(RegistryScope {
            registry: self,
            instances: InstanceCache::default(),
        })
    }

    fn dispose(&self) -> Result<()> {
        debug!(owner = %self.owner, "Disposing registry");
        self.instances.dispose(&self.registrations)
    }

    fn registered_keys(&self) -> Vec<DependencyKey> {
        self.registrations.keys().copied().collect()
    }
}

/// Scope over a [`ServiceRegistry`]: caches scoped services, builds
/// transients with the scope's resolver.
struct RegistryScope {
    registry: Arc<ServiceRegistry>,
    instances: InstanceCache,
}

impl FlatScope for RegistryScope {
    fn resolve_key(&self, key: &DependencyKey, resolver: &dyn Resolver) -> Result<Option<Instance>> {
        let Some(registration) = self.registry.registrations.get(key) else {
            return Ok(None);
        };

        match registration.lifetime {
            Lifetime::Scoped => self
                .instances
                .get_or_create(registration, resolver, &self.registry.owner)
                .map(Some),
            Lifetime::Transient => build_transient(registration, resolver).map(Some),
            // singletons live in the registry and are resolved through the container
            Lifetime::Singleton => Ok(None),
        }
    }

    fn dispose(&self) -> Result<()> {
        self.instances.dispose(&self.registry.registrations)
    }
}
