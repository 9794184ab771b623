//! Resolution observers.
//!
//! Observers are notified for every resolution that passes the cache fast
//! path. With none registered the hooks cost a single branch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::DiError;
use crate::key::ServiceId;

/// Hooks invoked around each resolution.
///
/// # Examples
///
/// ```rust
/// use ferrous_autowire::{Container, ResolutionObserver, ServiceId};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl ResolutionObserver for Recorder {
///     fn resolved(&self, id: &ServiceId, _elapsed: Duration) {
///         self.0.lock().unwrap().push(id.to_string());
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let mut container = Container::new();
/// container.add_observer(recorder.clone());
/// container.factory("answer", |_, _| Ok(42u32)).unwrap();
/// container.resolve("answer").unwrap();
///
/// assert_eq!(*recorder.0.lock().unwrap(), ["answer"]);
/// ```
pub trait ResolutionObserver: Send + Sync {
    /// Called after the cycle check, before construction.
    fn resolving(&self, _id: &ServiceId) {}

    /// Called when construction, decoration and injection succeeded.
    fn resolved(&self, _id: &ServiceId, _elapsed: Duration) {}

    /// Called when the resolution of `id` failed.
    fn failed(&self, _id: &ServiceId, _error: &DiError) {}
}

#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ResolutionObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn ResolutionObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, id: &ServiceId) {
        for observer in &self.observers {
            observer.resolving(id);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, id: &ServiceId, elapsed: Duration) {
        for observer in &self.observers {
            observer.resolved(id, elapsed);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, id: &ServiceId, error: &DiError) {
        for observer in &self.observers {
            observer.failed(id, error);
        }
    }
}

/// Observer that forwards events to `tracing`.
///
/// ```rust
/// use ferrous_autowire::{Container, TracingObserver};
/// use std::sync::Arc;
///
/// let mut container = Container::new();
/// container.add_observer(Arc::new(TracingObserver::new()));
/// ```
#[derive(Debug, Default)]
pub struct TracingObserver {
    resolved: AtomicU64,
    failed: AtomicU64,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful resolutions seen so far.
    pub fn resolved_count(&self) -> u64 {
        self.resolved.load(Ordering::Relaxed)
    }

    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

impl ResolutionObserver for TracingObserver {
    fn resolving(&self, id: &ServiceId) {
        debug!(service = %id, "resolving");
    }

    fn resolved(&self, id: &ServiceId, elapsed: Duration) {
        self.resolved.fetch_add(1, Ordering::Relaxed);
        debug!(service = %id, elapsed = ?elapsed, "resolved");
    }

    fn failed(&self, id: &ServiceId, error: &DiError) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        warn!(service = %id, kind = %error.kind(), chain = ?error.chain(), "resolution failed: {error}");
    }
}
