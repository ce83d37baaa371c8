//! Registration sets and root construction.
//!
//! A [`ContainerBuilder`] collects registrations. It becomes a root
//! container through one of the `build*` entry points, a child through
//! [`Container::create_child`], or a named scene through
//! [`ContainerRegistry::create_named`](crate::manager::ContainerRegistry::create_named).
//!
//! ```text
//! ContainerBuilder ──build_root()──> Container (depth 0)
//!                                        │
//!                                  create_child()
//!                                        │
//!                                        ▼
//!                                    Container (depth 1) ──create_scope()──> ScopedView
//! ```

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::container::Container;
use crate::diagnostics::Diagnostics;
use crate::error::{ArborError, NotRegisteredError, Result};
use crate::graph::{DependencyInfo, GraphValidator};
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;
use crate::provider::Provider;
use crate::registry::{
    Disposable, FactoryFn, Instance, Registration, Resolver, ServiceRegistry, clone_instance,
    dispose_instance,
};

/// Name given to a root container built without one.
pub const DEFAULT_ROOT_NAME: &str = "Root";

/// Resolution-time validation switches.
///
/// Set on the root; every descendant inherits the root's options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// Reject resolving scoped services outside of a scoped view.
    pub validate_scopes: bool,
    /// Validate declared dependencies when a container is built.
    pub validate_on_build: bool,
}

impl ContainerOptions {
    /// Both checks on or both off.
    pub fn validated(enabled: bool) -> Self {
        Self {
            validate_scopes: enabled,
            validate_on_build: enabled,
        }
    }
}

/// Collects the registrations of one container.
///
/// # Examples
/// ```rust
/// use arbor_container::prelude::*;
/// use std::sync::Arc;
///
/// struct SaveSystem;
///
/// let root = Container::builder()
///     .singleton_with::<Arc<SaveSystem>>(|_| Ok(Arc::new(SaveSystem)))
///     .build_root(Some("Global"))
///     .unwrap();
///
/// assert!(root.resolve::<Arc<SaveSystem>>().unwrap().is_some());
/// ```
pub struct ContainerBuilder {
    registry: ServiceRegistry,
    allow_override: bool,
    options: ContainerOptions,
    diagnostics: Option<Diagnostics>,
    /// First registration error, reported when the container is built.
    pending_error: Option<ArborError>,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            registry: ServiceRegistry::new(),
            allow_override: false,
            options: ContainerOptions::default(),
            diagnostics: None,
            pending_error: None,
        }
    }

    /// Allow later registrations to replace earlier ones for the same type.
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    /// Validation options. Ignored for child containers, which inherit
    /// their root's options.
    pub fn options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    /// Diagnostics hub for the whole tree. Ignored for child containers.
    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    // ── Singleton ──

    /// Register a pre-built value as a singleton.
    ///
    /// Cloned on every resolve; use `Arc<T>` to share one instance.
    pub fn singleton_value<T: Clone + Send + Sync + 'static>(self, value: T) -> Self {
        self.register_cached::<T>(
            Lifetime::Singleton,
            Arc::new(move |_: &dyn Resolver| Ok(Box::new(value.clone()) as Instance)),
        )
    }

    /// Register a singleton factory.
    ///
    /// Called once, on first resolve; the result is cloned on every
    /// resolve after that.
    pub fn singleton_with<T: Clone + Send + Sync + 'static>(
        self,
        factory: impl Fn(&dyn Resolver) -> Result<T> + Send + Sync + 'static,
    ) -> Self {
        self.register_cached::<T>(Lifetime::Singleton, boxed_factory(factory))
    }

    // ── Scoped ──

    /// Register a scoped factory: one instance per [`ScopedView`](crate::container::ScopedView).
    pub fn scoped_with<T: Clone + Send + Sync + 'static>(
        self,
        factory: impl Fn(&dyn Resolver) -> Result<T> + Send + Sync + 'static,
    ) -> Self {
        self.register_cached::<T>(Lifetime::Scoped, boxed_factory(factory))
    }

    // ── Transient ──

    /// Register a transient factory: a new instance on every resolve.
    pub fn transient_with<T: Send + Sync + 'static>(
        self,
        factory: impl Fn(&dyn Resolver) -> Result<T> + Send + Sync + 'static,
    ) -> Self {
        self.register(Registration {
            key: DependencyKey::of::<T>(),
            factory: boxed_factory(factory),
            lifetime: Lifetime::Transient,
            dependencies: vec![],
            cloner: None,
            disposer: None,
        })
    }

    // ── Registration modifiers ──

    /// Declares what the factory of `T` resolves, for build-time validation.
    pub fn depends_on<T: Send + Sync + 'static>(
        mut self,
        dependencies: impl IntoIterator<Item = DependencyKey>,
    ) -> Self {
        match self.registry.get_mut(&DependencyKey::of::<T>()) {
            Some(registration) => registration.dependencies.extend(dependencies),
            None => self.record_unknown::<T>(),
        }
        self
    }

    /// Runs [`Disposable::dispose`] on the cached instance of `T` when its
    /// container (or, for scoped services, its scope) is disposed.
    pub fn disposable<T: Disposable + 'static>(mut self) -> Self {
        match self.registry.get_mut(&DependencyKey::of::<T>()) {
            Some(registration) => registration.disposer = Some(dispose_instance::<T>),
            None => self.record_unknown::<T>(),
        }
        self
    }

    // ── Provider modules ──

    /// Add a [`Provider`] module.
    pub fn add_provider(self, provider: &dyn Provider) -> Self {
        debug!(provider = provider.name(), "Adding provider");
        provider.register(self)
    }

    /// Number of registrations collected so far.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // ── Build ──

    /// Builds a root container named [`DEFAULT_ROOT_NAME`].
    pub fn build(self) -> Result<Container> {
        self.build_root(None)
    }

    /// Builds a root container.
    #[instrument(skip(self), name = "container_build")]
    pub fn build_root(mut self, name: Option<&str>) -> Result<Container> {
        let name = name.unwrap_or(DEFAULT_ROOT_NAME);
        let diagnostics = self.diagnostics.take().unwrap_or_default();
        let options = self.options;
        info!(registered = self.registry.len(), ?options, "Building root container");

        let registry = self.into_registry(name, &options, HashSet::new)?;
        Ok(Container::new_root(registry, name, options, diagnostics))
    }

    /// Builds a root container with explicit validation options.
    pub fn build_with_options(self, options: ContainerOptions, name: Option<&str>) -> Result<Container> {
        self.options(options).build_root(name)
    }

    /// Builds a root container with scope and build validation switched
    /// on or off together.
    pub fn build_validated(self, validate_scopes: bool, name: Option<&str>) -> Result<Container> {
        self.build_with_options(ContainerOptions::validated(validate_scopes), name)
    }

    /// Seals the registrations into the registry of a container named
    /// `owner`, validating the graph first when the options ask for it.
    pub(crate) fn into_registry(
        self,
        owner: &str,
        options: &ContainerOptions,
        inherited: impl FnOnce() -> HashSet<DependencyKey>,
    ) -> Result<Arc<ServiceRegistry>> {
        if let Some(err) = self.pending_error {
            return Err(err);
        }

        if options.validate_on_build {
            let infos: HashMap<DependencyKey, DependencyInfo> = self
                .registry
                .all_registrations()
                .iter()
                .map(|(key, reg)| {
                    (
                        *key,
                        DependencyInfo {
                            key: *key,
                            dependencies: reg.dependencies.clone(),
                            lifetime: reg.lifetime,
                        },
                    )
                })
                .collect();
            GraphValidator::new(infos, inherited()).validate()?;
        }

        Ok(self.registry.seal(owner, options.validate_scopes))
    }

    // ── Internal ──

    fn register_cached<T: Clone + Send + Sync + 'static>(
        self,
        lifetime: Lifetime,
        factory: FactoryFn,
    ) -> Self {
        self.register(Registration {
            key: DependencyKey::of::<T>(),
            factory,
            lifetime,
            dependencies: vec![],
            cloner: Some(clone_instance::<T>),
            disposer: None,
        })
    }

    fn register(mut self, registration: Registration) -> Self {
        if let Err(err) = self.registry.register(registration, self.allow_override) {
            self.pending_error.get_or_insert(err);
        }
        self
    }

    fn record_unknown<T: ?Sized + 'static>(&mut self) {
        self.pending_error.get_or_insert_with(|| {
            ArborError::NotRegistered(NotRegisteredError {
                requested: DependencyKey::of::<T>(),
                required_by: None,
                suggestions: vec![],
            })
        });
    }
}

impl std::fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("registered", &self.registry.len())
            .field("allow_override", &self.allow_override)
            .field("options", &self.options)
            .finish()
    }
}

fn boxed_factory<T: Send + Sync + 'static>(
    factory: impl Fn(&dyn Resolver) -> Result<T> + Send + Sync + 'static,
) -> FactoryFn {
    Arc::new(move |resolver: &dyn Resolver| {
        Ok(Box::new(factory(resolver)?) as Box<dyn Any + Send + Sync>)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ResolverExt;
    use serde::de::value::{Error as ValueError, MapDeserializer};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Clone)]
    struct Config {
        difficulty: u8,
    }

    struct Inventory {
        slots: usize,
    }

    #[test]
    fn resolve_singleton_value() {
        let root = ContainerBuilder::new()
            .singleton_value(Config { difficulty: 3 })
            .build()
            .unwrap();

        let config: Config = root.resolve().unwrap().unwrap();
        assert_eq!(config.difficulty, 3);
        assert_eq!(root.name(), DEFAULT_ROOT_NAME);
        assert_eq!(root.depth(), 0);
    }

    #[test]
    fn singleton_factory_called_once() {
        let counter = Arc::new(AtomicU32::new(0));

        let root = Container::builder()
            .singleton_with::<Arc<u64>>({
                let counter = counter.clone();
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(42))
                }
            })
            .build()
            .unwrap();

        for _ in 0..3 {
            let _: Arc<u64> = root.resolve().unwrap().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transient_creates_new_each_time() {
        let counter = Arc::new(AtomicU32::new(0));

        let root = Container::builder()
            .transient_with::<u32>({
                let counter = counter.clone();
                move |_| Ok(counter.fetch_add(1, Ordering::SeqCst))
            })
            .build()
            .unwrap();

        let values: Vec<u32> = (0..3).map(|_| root.resolve().unwrap().unwrap()).collect();
        assert_eq!(values, [0, 1, 2]);
    }

    #[test]
    fn factories_resolve_their_dependencies() {
        let root = Container::builder()
            .singleton_value(Config { difficulty: 2 })
            .transient_with::<Inventory>(|r| {
                let config: Config = r.resolve()?;
                Ok(Inventory { slots: config.difficulty as usize * 10 })
            })
            .build()
            .unwrap();

        let inventory: Inventory = root.resolve().unwrap().unwrap();
        assert_eq!(inventory.slots, 20);
    }

    #[test]
    fn duplicate_registration_surfaces_at_build() {
        let result = Container::builder()
            .singleton_value(1u8)
            .singleton_value(2u8)
            .build();
        assert!(matches!(result, Err(ArborError::AlreadyRegistered(_))));
    }

    #[test]
    fn allow_override_keeps_last_registration() {
        let root = Container::builder()
            .allow_override(true)
            .singleton_value(1u8)
            .singleton_value(2u8)
            .build()
            .unwrap();
        assert_eq!(root.resolve::<u8>().unwrap(), Some(2));
    }

    #[test]
    fn modifiers_on_unregistered_type_fail_build() {
        let result = Container::builder().depends_on::<Config>([]).build();
        assert!(matches!(result, Err(ArborError::NotRegistered(_))));
    }

    #[test]
    fn validate_on_build_reports_missing_dependency() {
        let result = Container::builder()
            .transient_with::<Inventory>(|_| Ok(Inventory { slots: 0 }))
            .depends_on::<Inventory>([DependencyKey::of::<Config>()])
            .build_validated(true, Some("Global"));

        match result {
            Err(ArborError::NotRegistered(err)) => {
                assert_eq!(err.requested, DependencyKey::of::<Config>());
                assert_eq!(err.required_by, Some(DependencyKey::of::<Inventory>()));
            }
            other => panic!("Expected NotRegistered, got: {other:?}"),
        }
    }

    #[test]
    fn validate_on_build_rejects_captive_dependency() {
        let result = Container::builder()
            .transient_with::<Inventory>(|_| Ok(Inventory { slots: 0 }))
            .singleton_value(Config { difficulty: 1 })
            .depends_on::<Config>([DependencyKey::of::<Inventory>()])
            .build_with_options(
                ContainerOptions { validate_on_build: true, validate_scopes: false },
                None,
            );
        assert!(matches!(result, Err(ArborError::ScopeMismatch(_))));
    }

    #[test]
    fn validation_is_off_by_default() {
        let root = Container::builder()
            .transient_with::<Inventory>(|_| Ok(Inventory { slots: 0 }))
            .depends_on::<Inventory>([DependencyKey::of::<Config>()])
            .build();
        assert!(root.is_ok());
    }

    #[test]
    fn validated_options_toggle_both_checks() {
        let options = ContainerOptions::validated(true);
        assert!(options.validate_scopes && options.validate_on_build);
        assert_eq!(ContainerOptions::default(), ContainerOptions::validated(false));
    }

    #[test]
    fn options_fill_missing_fields_from_defaults() {
        let empty: MapDeserializer<'_, _, ValueError> =
            MapDeserializer::new(std::iter::empty::<(&str, bool)>());
        assert_eq!(ContainerOptions::deserialize(empty).unwrap(), ContainerOptions::default());

        let partial: MapDeserializer<'_, _, ValueError> =
            MapDeserializer::new([("validate_scopes", true)].into_iter());
        let options = ContainerOptions::deserialize(partial).unwrap();
        assert!(options.validate_scopes);
        assert!(!options.validate_on_build);
    }
}
