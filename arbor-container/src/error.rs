//! Error types for Arbor container operations.
//!
//! Errors name the container and the service involved so a failure deep
//! in a scene hierarchy can be traced back without a debugger.

use std::fmt;

use arbor_support::rendering::render_chain;

use crate::key::DependencyKey;
use crate::lifetime::Lifetime;

/// Boxed error returned by user factories and disposal hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all Arbor operations.
#[derive(Debug, thiserror::Error)]
pub enum ArborError {
    /// The container (or the container behind a scoped view) was disposed.
    #[error("Container '{name}' has been disposed")]
    ContainerDisposed { name: String },

    /// `resolve_required` found nothing anywhere in the ancestor chain.
    #[error("Failed to resolve service of type '{type_name}' in container '{container}'")]
    ServiceResolutionFailed {
        type_name: &'static str,
        container: String,
    },

    /// `create_child` attempted beyond the nesting limit.
    #[error(
        "Cannot create child container: maximum depth ({limit}) exceeded. Current depth: {depth}"
    )]
    MaxDepthExceeded { limit: usize, depth: usize },

    /// Structural misuse of the API.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// `initialize_root` was called a second time.
    #[error("Root container has already been initialized")]
    AlreadyInitialized,

    /// A named container was requested before `initialize_root`.
    #[error("Root container must be initialized before creating named containers")]
    NotInitialized,

    #[error("Parent container '{0}' not found; create the parent before its children")]
    ParentNotFound(String),

    #[error("Container name '{0}' already exists; names must be unique")]
    DuplicateName(String),

    #[error("Container '{0}' not found")]
    NameNotFound(String),

    /// Another caller registered the same name between the duplicate check
    /// and the insert.
    #[error("Failed to register container '{0}' due to concurrent modification")]
    ConcurrentRegistrationConflict(String),

    /// A dependency needed while building a service was never registered.
    #[error("{}", .0)]
    NotRegistered(NotRegisteredError),

    /// Circular dependency, found by build-time validation or while a
    /// factory was resolving its own dependencies.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A longer-lived service depends on a shorter-lived one.
    #[error("{}", .0)]
    ScopeMismatch(ScopeMismatchError),

    /// Factory returned an error, or produced a value of the wrong type.
    #[error("Failed to construct {key}: {source}")]
    ConstructionFailed {
        key: DependencyKey,
        #[source]
        source: BoxError,
    },

    /// Service registered twice in one registration set without override.
    #[error("{}", .0)]
    AlreadyRegistered(AlreadyRegisteredError),

    /// A scoped service was resolved outside of a scoped view while scope
    /// validation is enabled.
    #[error(
        "Cannot resolve scoped service {key} from container '{container}' directly; resolve it through create_scope()"
    )]
    ScopedResolvedFromRoot { key: DependencyKey, container: String },

    /// One or more disposal hooks failed. Every hook still ran.
    #[error("{}", .0)]
    DisposalFailed(DisposalError),
}

/// Error when a dependency was not registered.
///
/// Includes helpful hints about what went wrong.
#[derive(Debug)]
pub struct NotRegisteredError {
    /// The dependency that was requested
    pub requested: DependencyKey,
    /// What required this dependency (if known)
    pub required_by: Option<DependencyKey>,
    /// Similar types that ARE registered
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency not registered: {}", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: register {} in this container or one of its ancestors",
            self.requested.short_name()
        )
    }
}

/// Error when a circular dependency is detected.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// The chain of dependencies that forms the cycle, e.g. `[A, B, C, A]`.
    pub chain: Vec<DependencyKey>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.chain.iter().map(DependencyKey::short_name).collect();
        write!(f, "Circular dependency detected:\n  {}", render_chain(&names))?;
        write!(f, "\n  Hint: resolve one side lazily or restructure the services")
    }
}

/// Error when lifetime rules are violated.
///
/// A singleton that captures a transient would hold it forever.
#[derive(Debug)]
pub struct ScopeMismatchError {
    pub dependency: DependencyKey,
    pub dependency_lifetime: Lifetime,
    pub consumer: DependencyKey,
    pub consumer_lifetime: Lifetime,
}

impl fmt::Display for ScopeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scope mismatch: cannot inject {} ({}) into {} ({})",
            self.dependency, self.dependency_lifetime, self.consumer, self.consumer_lifetime,
        )?;
        write!(
            f,
            "\n  Hint: change {} to {} or longer",
            self.dependency.short_name(),
            self.consumer_lifetime,
        )
    }
}

/// Error when a registration set registers the same key twice.
#[derive(Debug)]
pub struct AlreadyRegisteredError {
    pub key: DependencyKey,
}

impl fmt::Display for AlreadyRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency already registered: {}", self.key)?;
        write!(
            f,
            "\n  Hint: call .allow_override(true) to replace it, or register it in a child container to shadow it"
        )
    }
}

/// Aggregated failures of disposal hooks.
#[derive(Debug)]
pub struct DisposalError {
    pub failures: Vec<(DependencyKey, BoxError)>,
}

impl fmt::Display for DisposalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} service(s) failed to dispose", self.failures.len())?;
        for (key, err) in &self.failures {
            write!(f, "\n  - {}: {err}", key.short_name())?;
        }
        Ok(())
    }
}

/// Convenient Result type for Arbor operations.
pub type Result<T> = std::result::Result<T, ArborError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_registered_error_display() {
        let err = ArborError::NotRegistered(NotRegisteredError {
            requested: DependencyKey::of::<String>(),
            required_by: Some(DependencyKey::of::<Vec<u8>>()),
            suggestions: vec!["alloc::string::Str".into()],
        });

        let msg = err.to_string();
        assert!(msg.contains("not registered"));
        assert!(msg.contains("Required by"));
        assert!(msg.contains("Did you mean"));
    }

    #[test]
    fn circular_dependency_error_display() {
        let err = ArborError::CircularDependency(CircularDependencyError {
            chain: vec![
                DependencyKey::of::<String>(),
                DependencyKey::of::<i32>(),
                DependencyKey::of::<String>(),
            ],
        });

        let msg = err.to_string();
        assert!(msg.contains("Circular"));
        assert!(msg.contains("String → i32 → String"));
    }

    #[test]
    fn scope_mismatch_error_display() {
        let err = ArborError::ScopeMismatch(ScopeMismatchError {
            dependency: DependencyKey::of::<String>(),
            dependency_lifetime: Lifetime::Transient,
            consumer: DependencyKey::of::<Vec<u8>>(),
            consumer_lifetime: Lifetime::Singleton,
        });

        let msg = err.to_string();
        assert!(msg.contains("Scope mismatch"));
        assert!(msg.contains("Singleton"));
        assert!(msg.contains("Transient"));
    }

    #[test]
    fn max_depth_message_names_limit_and_depth() {
        let msg = ArborError::MaxDepthExceeded { limit: 10, depth: 10 }.to_string();
        assert!(msg.contains("maximum depth (10)"));
        assert!(msg.contains("Current depth: 10"));
    }

    #[test]
    fn resolution_failure_names_type_and_container() {
        let msg = ArborError::ServiceResolutionFailed {
            type_name: "my_game::LootTable",
            container: "Floor1".into(),
        }
        .to_string();
        assert!(msg.contains("my_game::LootTable"));
        assert!(msg.contains("'Floor1'"));
    }

    #[test]
    fn disposal_error_lists_every_failure() {
        let err = DisposalError {
            failures: vec![
                (DependencyKey::of::<u8>(), "flush failed".into()),
                (DependencyKey::of::<u16>(), "socket closed".into()),
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 service(s)"));
        assert!(msg.contains("u8: flush failed"));
        assert!(msg.contains("u16: socket closed"));
    }
}
