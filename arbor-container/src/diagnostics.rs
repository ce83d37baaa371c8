//! Structured diagnostics for container lifecycle and resolution.
//!
//! A [`Diagnostics`] hub is handed to the root container when it is built
//! and shared by every descendant; there is no process-wide event source.
//! Subscribers receive [`ContainerEvent`]s over a broadcast channel.
//! Emission never blocks: a slow subscriber loses the oldest events.
//!
//! While nobody is subscribed, events are not even constructed, so the
//! resolve hot path pays one atomic load.
//!
//! ```
//! use arbor_container::prelude::*;
//!
//! let diagnostics = Diagnostics::new();
//! let mut events = diagnostics.subscribe();
//!
//! let root = Container::builder()
//!     .diagnostics(diagnostics.clone())
//!     .build_root(Some("Global"))
//!     .unwrap();
//! let _ = root.resolve::<u32>().unwrap();
//!
//! let kinds: Vec<_> = events.drain().iter().map(ContainerEvent::kind).collect();
//! assert_eq!(kinds, ["ContainerCreated", "ResolveStart", "ResolveStop"]);
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

use crate::container::ContainerId;

/// Where a resolution ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveOutcome {
    /// Found in the container the call was made on.
    LocalHit,
    /// Found in an ancestor.
    ParentHit,
    /// Not registered anywhere in the chain.
    NotFound,
    /// A factory or scope validation returned an error.
    Faulted,
}

impl fmt::Display for ResolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResolveOutcome::LocalHit => "LocalHit",
            ResolveOutcome::ParentHit => "ParentHit",
            ResolveOutcome::NotFound => "NotFound",
            ResolveOutcome::Faulted => "Faulted",
        })
    }
}

/// A structured diagnostics event.
#[derive(Debug, Clone)]
pub enum ContainerEvent {
    ContainerCreated {
        id: ContainerId,
        name: Arc<str>,
        depth: usize,
        parent_id: Option<ContainerId>,
        parent_name: Option<Arc<str>>,
    },
    ContainerDisposed {
        id: ContainerId,
        name: Arc<str>,
        depth: usize,
    },
    ChildAdded {
        child_id: ContainerId,
        child_name: Arc<str>,
        parent_id: ContainerId,
        parent_name: Arc<str>,
    },
    ChildRemoved {
        child_id: ContainerId,
        child_name: Arc<str>,
        parent_id: ContainerId,
        parent_name: Arc<str>,
    },
    ResolveStart {
        container_id: ContainerId,
        name: Arc<str>,
        depth: usize,
        type_name: &'static str,
    },
    ResolveStop {
        container_id: ContainerId,
        name: Arc<str>,
        depth: usize,
        type_name: &'static str,
        outcome: ResolveOutcome,
        /// Depth of the container whose registry produced the instance.
        resolved_depth: Option<usize>,
        elapsed: Duration,
    },
    ResolveFailure {
        container_id: ContainerId,
        name: Arc<str>,
        depth: usize,
        type_name: &'static str,
        error: String,
    },
    /// The registry's disposal hooks failed; the cascade still completed.
    DisposalFailed {
        container_id: ContainerId,
        name: Arc<str>,
        error: String,
    },
}

impl ContainerEvent {
    /// Event name, stable for filtering and assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            ContainerEvent::ContainerCreated { .. } => "ContainerCreated",
            ContainerEvent::ContainerDisposed { .. } => "ContainerDisposed",
            ContainerEvent::ChildAdded { .. } => "ChildAdded",
            ContainerEvent::ChildRemoved { .. } => "ChildRemoved",
            ContainerEvent::ResolveStart { .. } => "ResolveStart",
            ContainerEvent::ResolveStop { .. } => "ResolveStop",
            ContainerEvent::ResolveFailure { .. } => "ResolveFailure",
            ContainerEvent::DisposalFailed { .. } => "DisposalFailed",
        }
    }

    /// The container the event is about (the child, for child events).
    pub fn container_id(&self) -> ContainerId {
        match self {
            ContainerEvent::ContainerCreated { id, .. }
            | ContainerEvent::ContainerDisposed { id, .. } => *id,
            ContainerEvent::ChildAdded { child_id, .. }
            | ContainerEvent::ChildRemoved { child_id, .. } => *child_id,
            ContainerEvent::ResolveStart { container_id, .. }
            | ContainerEvent::ResolveStop { container_id, .. }
            | ContainerEvent::ResolveFailure { container_id, .. }
            | ContainerEvent::DisposalFailed { container_id, .. } => *container_id,
        }
    }

    /// Name of the container the event is about.
    pub fn container_name(&self) -> &str {
        match self {
            ContainerEvent::ContainerCreated { name, .. }
            | ContainerEvent::ContainerDisposed { name, .. }
            | ContainerEvent::ResolveStart { name, .. }
            | ContainerEvent::ResolveStop { name, .. }
            | ContainerEvent::ResolveFailure { name, .. }
            | ContainerEvent::DisposalFailed { name, .. } => name,
            ContainerEvent::ChildAdded { child_name, .. }
            | ContainerEvent::ChildRemoved { child_name, .. } => child_name,
        }
    }
}

/// Diagnostics channel settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Events buffered per subscriber before the oldest are dropped.
    pub capacity: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

struct Hub {
    sender: broadcast::Sender<ContainerEvent>,
    subscribers: AtomicUsize,
}

/// Handle to a diagnostics hub. Cloning shares the hub.
#[derive(Clone)]
pub struct Diagnostics {
    hub: Arc<Hub>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::with_config(&DiagnosticsConfig::default())
    }

    pub fn with_config(config: &DiagnosticsConfig) -> Self {
        let (sender, _) = broadcast::channel(config.capacity.max(1));
        Self {
            hub: Arc::new(Hub {
                sender,
                subscribers: AtomicUsize::new(0),
            }),
        }
    }

    /// Starts receiving events. Dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> DiagnosticsSubscription {
        self.hub.subscribers.fetch_add(1, Ordering::AcqRel);
        DiagnosticsSubscription {
            receiver: self.hub.sender.subscribe(),
            hub: Arc::clone(&self.hub),
        }
    }

    /// Whether any subscriber is listening.
    #[inline]
    pub fn is_observed(&self) -> bool {
        self.hub.subscribers.load(Ordering::Acquire) > 0
    }

    /// Builds and sends an event, only when someone is listening.
    #[inline]
    pub(crate) fn emit_with(&self, make: impl FnOnce() -> ContainerEvent) {
        if self.is_observed() {
            // no receiver left is not an error for a fire-and-forget sink
            let _ = self.hub.sender.send(make());
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("subscribers", &self.hub.subscribers.load(Ordering::Relaxed))
            .finish()
    }
}

/// Receiving end of a [`Diagnostics`] hub.
pub struct DiagnosticsSubscription {
    receiver: broadcast::Receiver<ContainerEvent>,
    hub: Arc<Hub>,
}

impl DiagnosticsSubscription {
    /// Next buffered event, without waiting.
    pub fn try_recv(&mut self) -> Option<ContainerEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Diagnostics subscriber lagged; events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Waits for the next event.
    pub async fn recv(&mut self) -> Option<ContainerEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Diagnostics subscriber lagged; events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// All events buffered so far.
    pub fn drain(&mut self) -> Vec<ContainerEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Drop for DiagnosticsSubscription {
    fn drop(&mut self) {
        self.hub.subscribers.fetch_sub(1, Ordering::AcqRel);
    }
}

impl fmt::Debug for DiagnosticsSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticsSubscription")
            .field("pending", &self.receiver.len())
            .finish()
    }
}
