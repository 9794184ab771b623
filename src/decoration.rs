//! Post-construction decoration.
//!
//! Extensions run right after a service is built, in registration order,
//! each receiving the previous one's output. Because they run before the
//! instance is cached, a shared service is decorated exactly once.

use std::sync::Arc;

use crate::container::Container;
use crate::error::DiResult;
use crate::internal::FastMap;
use crate::key::ServiceId;
use crate::params::{downcast_arc, downcast_trait, AnyArc};

/// Type-erased extension function.
pub type Extension = Arc<dyn Fn(AnyArc, &Container) -> DiResult<AnyArc> + Send + Sync>;

/// Decorates a concrete service.
///
/// # Examples
///
/// ```rust
/// use ferrous_autowire::{Container, DiResult, Resolver, ServiceDecorator};
/// use std::sync::Arc;
///
/// struct ApiClient { base_url: String }
///
/// struct Versioned;
/// impl ServiceDecorator<ApiClient> for Versioned {
///     fn decorate(&self, original: Arc<ApiClient>, _: &Container) -> DiResult<Arc<ApiClient>> {
///         Ok(Arc::new(ApiClient { base_url: format!("{}/v2", original.base_url) }))
///     }
/// }
///
/// let mut container = Container::new();
/// container
///     .singleton_factory(ferrous_autowire::id_of::<ApiClient>(), |_, _| {
///         Ok(ApiClient { base_url: "https://api".into() })
///     })
///     .unwrap();
/// container.decorate::<ApiClient, _>(Versioned).unwrap();
///
/// assert_eq!(container.get::<ApiClient>().unwrap().base_url, "https://api/v2");
/// ```
pub trait ServiceDecorator<T: Send + Sync + 'static>: Send + Sync {
    fn decorate(&self, original: Arc<T>, container: &Container) -> DiResult<Arc<T>>;
}

/// Decorates an interface view (`Arc<dyn Trait>`).
///
/// ```rust
/// use ferrous_autowire::{Container, DiResult, Resolver, TraitDecorator};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct Plain;
/// impl Greeter for Plain { fn greet(&self) -> String { "hi".into() } }
/// struct Loud(Arc<dyn Greeter>);
/// impl Greeter for Loud { fn greet(&self) -> String { self.0.greet().to_uppercase() } }
///
/// struct Shout;
/// impl TraitDecorator<dyn Greeter> for Shout {
///     fn decorate(&self, inner: Arc<dyn Greeter>, _: &Container) -> DiResult<Arc<dyn Greeter>> {
///         Ok(Arc::new(Loud(inner)))
///     }
/// }
///
/// let mut container = Container::new();
/// container
///     .factory(ferrous_autowire::id_of::<dyn Greeter>(), |_, _| Ok(Arc::new(Plain) as Arc<dyn Greeter>))
///     .unwrap();
/// container.decorate_trait::<dyn Greeter, _>(Shout).unwrap();
///
/// assert_eq!(container.get_trait::<dyn Greeter>().unwrap().greet(), "HI");
/// ```
pub trait TraitDecorator<T: ?Sized + Send + Sync + 'static>: Send + Sync {
    fn decorate(&self, original: Arc<T>, container: &Container) -> DiResult<Arc<T>>;
}

/// Lifts a typed decorator into an [`Extension`] for the id of `T`.
pub(crate) fn service_extension<T, D>(decorator: D) -> Extension
where
    T: Send + Sync + 'static,
    D: ServiceDecorator<T> + 'static,
{
    Arc::new(move |value: AnyArc, container: &Container| {
        let typed = downcast_arc::<T>(value, &ServiceId::of::<T>(), "decorated service")?;
        decorator.decorate(typed, container).map(|v| v as AnyArc)
    })
}

pub(crate) fn trait_extension<T, D>(decorator: D) -> Extension
where
    T: ?Sized + Send + Sync + 'static,
    D: TraitDecorator<T> + 'static,
{
    Arc::new(move |value: AnyArc, container: &Container| {
        let typed = downcast_trait::<T>(value, &ServiceId::of::<T>(), "decorated service")?;
        decorator
            .decorate(typed, container)
            .map(|v| Arc::new(v) as AnyArc)
    })
}

/// Service id -> ordered extension list
#[derive(Default)]
pub(crate) struct ExtensionRegistry {
    extensions: FastMap<ServiceId, Vec<Extension>>,
}

impl ExtensionRegistry {
    pub(crate) fn add(&mut self, id: ServiceId, extension: Extension) {
        self.extensions.entry(id).or_default().push(extension);
    }

    pub(crate) fn remove(&mut self, id: &ServiceId) -> usize {
        self.extensions.remove(id).map_or(0, |list| list.len())
    }

    /// Threads `instance` through every extension of `id`.
    pub(crate) fn apply(&self, id: &ServiceId, instance: AnyArc, container: &Container) -> DiResult<AnyArc> {
        let Some(list) = self.extensions.get(id) else {
            return Ok(instance);
        };
        list.iter()
            .try_fold(instance, |current, extension| extension(current, container))
    }

    pub(crate) fn count(&self, id: &ServiceId) -> usize {
        self.extensions.get(id).map_or(0, Vec::len)
    }

    pub(crate) fn clear(&mut self) {
        self.extensions.clear();
    }
}
