//! Binding registration types.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::error::DiResult;
use crate::internal::FastMap;
use crate::key::ServiceId;
use crate::lifetime::Lifetime;
use crate::params::{AnyArc, Params};

/// Factory invoked with the container and the caller's named parameters.
pub type Factory = Arc<dyn Fn(&Container, &Params) -> DiResult<AnyArc> + Send + Sync>;

/// Construction strategy of a binding or contextual override.
///
/// Either a reference to another id (a concrete type to autowire, or an
/// id bound elsewhere) or a factory function.
#[derive(Clone)]
pub enum Implementation {
    /// Delegate to another id
    Type(ServiceId),
    /// Invoke a factory
    Factory(Factory),
}

impl Implementation {
    /// Reference to type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Implementation::Type(ServiceId::of::<T>())
    }

    /// Reference to an arbitrary id.
    pub fn named(id: impl Into<ServiceId>) -> Self {
        Implementation::Type(id.into())
    }

    /// Factory returning an already type-erased value.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&Container, &Params) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        Implementation::Factory(Arc::new(factory))
    }

    /// Factory returning a concrete value.
    pub fn typed<T, F>(factory: F) -> Self
    where
        T: std::any::Any + Send + Sync,
        F: Fn(&Container, &Params) -> DiResult<T> + Send + Sync + 'static,
    {
        Implementation::Factory(Arc::new(move |c: &Container, p: &Params| {
            factory(c, p).map(|v| Arc::new(v) as AnyArc)
        }))
    }

    /// The referenced id, for reference implementations.
    pub fn reference(&self) -> Option<&ServiceId> {
        match self {
            Implementation::Type(id) => Some(id),
            Implementation::Factory(_) => None,
        }
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Implementation::Type(id) => f.debug_tuple("Type").field(id).finish(),
            Implementation::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl From<ServiceId> for Implementation {
    fn from(id: ServiceId) -> Self {
        Implementation::Type(id)
    }
}

impl From<&ServiceId> for Implementation {
    fn from(id: &ServiceId) -> Self {
        Implementation::Type(id.clone())
    }
}

impl From<&'static str> for Implementation {
    fn from(id: &'static str) -> Self {
        Implementation::Type(id.into())
    }
}

/// Binding with lifetime and construction strategy
#[derive(Clone, Debug)]
pub(crate) struct Binding {
    pub(crate) implementation: Implementation,
    pub(crate) lifetime: Lifetime,
}

/// Service id -> binding records
#[derive(Default)]
pub(crate) struct BindingRegistry {
    bindings: FastMap<ServiceId, Binding>,
}

impl BindingRegistry {
    pub(crate) fn insert(&mut self, id: ServiceId, binding: Binding) -> Option<Binding> {
        self.bindings.insert(id, binding)
    }

    #[inline]
    pub(crate) fn get(&self, id: &ServiceId) -> Option<&Binding> {
        self.bindings.get(id)
    }

    #[inline]
    pub(crate) fn contains(&self, id: &ServiceId) -> bool {
        self.bindings.contains_key(id)
    }

    pub(crate) fn remove(&mut self, id: &ServiceId) -> Option<Binding> {
        self.bindings.remove(id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&ServiceId, &Binding)> {
        self.bindings.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.bindings.clear();
    }
}

/// Cache of shared instances.
///
/// Entries are written lazily during resolution (through `&self`) or eagerly
/// by direct instance registration, and are returned verbatim afterwards.
/// Writes made during resolution are journaled so a failing resolution can
/// drop every instance it cached, including those of nested dependencies.
#[derive(Default)]
pub(crate) struct InstanceCache {
    instances: RefCell<FastMap<ServiceId, AnyArc>>,
    journal: RefCell<Vec<ServiceId>>,
}

impl InstanceCache {
    #[inline]
    pub(crate) fn get(&self, id: &ServiceId) -> Option<AnyArc> {
        self.instances.borrow().get(id).cloned()
    }

    #[inline]
    pub(crate) fn contains(&self, id: &ServiceId) -> bool {
        self.instances.borrow().contains_key(id)
    }

    pub(crate) fn insert(&mut self, id: ServiceId, instance: AnyArc) {
        self.instances.get_mut().insert(id, instance);
    }

    /// Caches an instance produced by an in-flight resolution.
    pub(crate) fn record(&self, id: ServiceId, instance: AnyArc) {
        self.journal.borrow_mut().push(id.clone());
        self.instances.borrow_mut().insert(id, instance);
    }

    /// Journal position to roll back to.
    pub(crate) fn mark(&self) -> usize {
        self.journal.borrow().len()
    }

    /// Drops every instance recorded since `mark`, returning how many.
    pub(crate) fn rollback(&self, mark: usize) -> usize {
        let dropped: Vec<ServiceId> = self.journal.borrow_mut().drain(mark..).collect();
        let mut instances = self.instances.borrow_mut();
        for id in &dropped {
            instances.remove(id);
        }
        dropped.len()
    }

    /// Ends a top-level resolution; recorded instances become permanent.
    pub(crate) fn settle(&self) {
        self.journal.borrow_mut().clear();
    }

    pub(crate) fn remove(&mut self, id: &ServiceId) -> Option<AnyArc> {
        self.instances.get_mut().remove(id)
    }

    pub(crate) fn ids(&self) -> Vec<ServiceId> {
        self.instances.borrow().keys().cloned().collect()
    }

    pub(crate) fn clear(&mut self) {
        self.instances.get_mut().clear();
        self.journal.get_mut().clear();
    }
}
