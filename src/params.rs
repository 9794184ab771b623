//! Named resolution parameters and resolved argument lists.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::ServiceId;

/// Type-erased shared object handed out by the container.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Ordered named overrides passed to `resolve_with`.
///
/// Entries are matched against constructor parameters **by name only**,
/// never by position. A named entry is used verbatim, without type checks,
/// and takes precedence over autowiring. A `None` value is an explicit null.
///
/// # Examples
///
/// ```rust
/// use ferrous_autowire::Params;
///
/// let params = Params::new()
///     .with("dsn", "sqlite::memory:".to_string())
///     .with_null("pool");
///
/// assert_eq!(params.value::<String>("dsn").as_deref(), Some("sqlite::memory:"));
/// assert!(params.contains("pool"));
/// assert!(params.lookup("pool").unwrap().is_none());
/// assert!(params.lookup("missing").is_none());
/// ```
#[derive(Clone, Default)]
pub struct Params {
    entries: Vec<(String, Option<AnyArc>)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Any + Send + Sync>(self, name: impl Into<String>, value: T) -> Self {
        self.with_arc(name, Arc::new(value))
    }

    pub fn with_arc(mut self, name: impl Into<String>, value: AnyArc) -> Self {
        self.insert(name, Some(value));
        self
    }

    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.insert(name, None);
        self
    }

    /// Sets `name`, replacing an earlier entry of the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<AnyArc>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// `Some(value)` when `name` is present; the inner `None` is a null.
    pub fn lookup(&self, name: &str) -> Option<Option<AnyArc>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Clones a concrete value out of the entry, if present and of type `T`.
    pub fn value<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

impl std::fmt::Debug for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Resolved, ordered arguments handed to constructors and setter methods.
pub struct Arguments {
    owner: ServiceId,
    values: Vec<(&'static str, Option<AnyArc>)>,
}

impl Arguments {
    pub(crate) fn new(owner: ServiceId) -> Self {
        Self { owner, values: Vec::new() }
    }

    pub(crate) fn push(&mut self, name: &'static str, value: Option<AnyArc>) {
        self.values.push((name, value));
    }

    /// Type whose constructor or setter receives these arguments.
    pub fn owner(&self) -> &ServiceId {
        &self.owner
    }

    /// Raw slot: `None` when no such parameter, `Some(None)` for a null.
    pub fn raw(&self, name: &str) -> Option<&Option<AnyArc>> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Required concrete argument.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>> {
        self.optional(name)?
            .ok_or_else(|| self.missing(name))
    }

    /// Required interface argument (stored as `Arc<Arc<dyn Trait>>`).
    pub fn get_trait<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
        self.optional_trait(name)?
            .ok_or_else(|| self.missing(name))
    }

    /// Nullable concrete argument.
    pub fn optional<T: Any + Send + Sync>(&self, name: &str) -> DiResult<Option<Arc<T>>> {
        match self.slot(name)? {
            Some(value) => downcast_arc::<T>(value.clone(), &self.owner, name).map(Some),
            None => Ok(None),
        }
    }

    /// Nullable interface argument.
    pub fn optional_trait<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DiResult<Option<Arc<T>>> {
        match self.slot(name)? {
            Some(value) => downcast_trait::<T>(value.clone(), &self.owner, name).map(Some),
            None => Ok(None),
        }
    }

    /// Clones a built-in value (string, number, ...) out of the argument.
    pub fn value<T: Any + Send + Sync + Clone>(&self, name: &str) -> DiResult<T> {
        self.get::<T>(name).map(|v| (*v).clone())
    }

    pub fn optional_value<T: Any + Send + Sync + Clone>(&self, name: &str) -> DiResult<Option<T>> {
        Ok(self.optional::<T>(name)?.map(|v| (*v).clone()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(n, _)| *n)
    }

    fn slot(&self, name: &str) -> DiResult<Option<&AnyArc>> {
        self.raw(name)
            .map(Option::as_ref)
            .ok_or_else(|| {
                DiError::resolution(&self.owner, format!("no parameter named `{name}`"))
                    .with_context("parameter", name)
            })
    }

    fn missing(&self, name: &str) -> DiError {
        DiError::resolution(&self.owner, format!("parameter `{name}` is null"))
            .with_context("parameter", name)
    }
}

/// Downcasts a concrete object, reporting mismatches as resolution errors.
pub(crate) fn downcast_arc<T: Any + Send + Sync>(value: AnyArc, owner: &ServiceId, slot: &str) -> DiResult<Arc<T>> {
    value.downcast::<T>().map_err(|_| type_mismatch::<T>(owner, slot))
}

/// Downcasts an interface view stored as `Arc<Arc<dyn Trait>>`.
pub(crate) fn downcast_trait<T: ?Sized + Send + Sync + 'static>(value: AnyArc, owner: &ServiceId, slot: &str) -> DiResult<Arc<T>> {
    value
        .downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| type_mismatch::<T>(owner, slot))
}

fn type_mismatch<T: ?Sized>(owner: &ServiceId, slot: &str) -> DiError {
    DiError::resolution(owner, format!("type mismatch for `{slot}`"))
        .with_context("expected", std::any::type_name::<T>())
        .with_context("slot", slot.to_string())
}
