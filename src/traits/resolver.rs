//! Resolver traits for typed service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiResult, ErrorKind};
use crate::key::ServiceId;
use crate::params::{downcast_arc, downcast_trait, AnyArc, Params};
use crate::Container;

/// Object-safe resolution surface.
///
/// Most users should use the [`Resolver`] trait instead, which adds typed
/// generic helpers on top of this trait.
pub trait ResolverCore {
    /// Resolves `id` with named parameter overrides.
    fn resolve_any(&self, id: &ServiceId, params: &Params) -> DiResult<AnyArc>;

    /// Whether `id` is bound, registered or a constructible declared type.
    fn can_resolve(&self, id: &ServiceId) -> bool;

    /// Resolves every service under `tag`; unknown tags yield nothing.
    fn resolve_tagged_any(&self, tag: &str) -> DiResult<Vec<AnyArc>>;
}

impl ResolverCore for Container {
    fn resolve_any(&self, id: &ServiceId, params: &Params) -> DiResult<AnyArc> {
        self.resolve_with(id, params)
    }

    fn can_resolve(&self, id: &ServiceId) -> bool {
        self.has(id)
    }

    fn resolve_tagged_any(&self, tag: &str) -> DiResult<Vec<AnyArc>> {
        self.resolve_tagged(tag)
    }
}

/// Typed resolution helpers, available on every [`ResolverCore`].
///
/// Concrete services are served as `Arc<T>`; interfaces are stored as
/// `Arc<Arc<dyn Trait>>` and come back as `Arc<dyn Trait>`. A value of the
/// wrong shape is a `Resolution` error.
///
/// # Examples
///
/// ```rust
/// use ferrous_autowire::{Container, Params, Parameter, Resolver, TypeInfo};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync { fn now(&self) -> u64; }
/// struct Fixed(u64);
/// impl Clock for Fixed { fn now(&self) -> u64 { self.0 } }
///
/// struct Pool { size: usize }
///
/// let mut container = Container::new();
/// container.add_trait_instance::<dyn Clock>(Arc::new(Fixed(7))).unwrap();
/// container.declare(
///     TypeInfo::concrete::<Pool>()
///         .param(Parameter::builtin("size", "int").with_default(|| 4usize))
///         .constructor(|args| Ok(Pool { size: args.value("size")? })),
/// );
///
/// assert_eq!(container.get_trait::<dyn Clock>().unwrap().now(), 7);
/// assert_eq!(container.get::<Pool>().unwrap().size, 4);
/// assert_eq!(container.get_with::<Pool>(&Params::new().with("size", 16usize)).unwrap().size, 16);
/// assert!(container.get_optional::<String>().unwrap().is_none());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves concrete type `T` under its own id.
    fn get<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        self.get_named::<T>(ServiceId::of::<T>())
    }

    fn get_with<T: Any + Send + Sync>(&self, params: &Params) -> DiResult<Arc<T>> {
        let id = ServiceId::of::<T>();
        let any = self.resolve_any(&id, params)?;
        downcast_arc::<T>(any, &id, "resolved service")
    }

    /// Resolves the interface `T` (e.g. `dyn Logger`) under its own id.
    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get_named_trait::<T>(ServiceId::of::<T>())
    }

    /// Resolves an arbitrary id, expecting a `T`.
    fn get_named<T: Any + Send + Sync>(&self, id: impl Into<ServiceId>) -> DiResult<Arc<T>> {
        let id = id.into();
        let any = self.resolve_any(&id, &Params::new())?;
        downcast_arc::<T>(any, &id, "resolved service")
    }

    fn get_named_trait<T: ?Sized + Send + Sync + 'static>(&self, id: impl Into<ServiceId>) -> DiResult<Arc<T>> {
        let id = id.into();
        let any = self.resolve_any(&id, &Params::new())?;
        downcast_trait::<T>(any, &id, "resolved service")
    }

    /// `Ok(None)` when `T` cannot be resolved at all; nested failures still
    /// surface as errors.
    fn get_optional<T: Any + Send + Sync>(&self) -> DiResult<Option<Arc<T>>> {
        let id = ServiceId::of::<T>();
        if !self.can_resolve(&id) {
            return Ok(None);
        }
        match self.get::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is(ErrorKind::ServiceNotFound) && err.service() == Some(&id) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Resolves every service under `tag` as a `T`.
    fn tagged<T: Any + Send + Sync>(&self, tag: &str) -> DiResult<Vec<Arc<T>>> {
        let owner = ServiceId::from(tag.to_string());
        self.resolve_tagged_any(tag)?
            .into_iter()
            .map(|any| downcast_arc::<T>(any, &owner, "tagged service"))
            .collect()
    }

    fn tagged_trait<T: ?Sized + Send + Sync + 'static>(&self, tag: &str) -> DiResult<Vec<Arc<T>>> {
        let owner = ServiceId::from(tag.to_string());
        self.resolve_tagged_any(tag)?
            .into_iter()
            .map(|any| downcast_trait::<T>(any, &owner, "tagged service"))
            .collect()
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
