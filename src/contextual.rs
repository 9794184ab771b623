//! Contextual bindings: per-consumer dependency overrides.

use crate::container::Container;
use crate::error::{DiError, DiResult, ErrorKind};
use crate::internal::FastMap;
use crate::key::ServiceId;
use crate::params::{AnyArc, Params};
use crate::registration::Implementation;

/// Overrides keyed by (consumer type, dependency id).
///
/// Keys are strictly the *direct* declaring type: an override for `A` never
/// applies while `A`'s dependencies are themselves being built.
#[derive(Default)]
pub(crate) struct ContextualBindingStore {
    overrides: FastMap<ServiceId, FastMap<ServiceId, Implementation>>,
}

impl ContextualBindingStore {
    pub(crate) fn add(&mut self, consumer: ServiceId, dependency: ServiceId, implementation: Implementation) {
        self.overrides
            .entry(consumer)
            .or_default()
            .insert(dependency, implementation);
    }

    pub(crate) fn get(&self, consumer: &ServiceId, dependency: &ServiceId) -> Option<&Implementation> {
        self.overrides.get(consumer)?.get(dependency)
    }

    pub(crate) fn contains(&self, consumer: &ServiceId, dependency: &ServiceId) -> bool {
        self.get(consumer, dependency).is_some()
    }

    /// Removes one override, or every override of `consumer` when
    /// `dependency` is `None`. Returns the number removed.
    pub(crate) fn forget(&mut self, consumer: &ServiceId, dependency: Option<&ServiceId>) -> usize {
        match dependency {
            None => self.overrides.remove(consumer).map_or(0, |deps| deps.len()),
            Some(dependency) => {
                let Some(deps) = self.overrides.get_mut(consumer) else {
                    return 0;
                };
                let removed = usize::from(deps.remove(dependency).is_some());
                if deps.is_empty() {
                    self.overrides.remove(consumer);
                }
                removed
            }
        }
    }

    /// Drops every override registered as a reference to `target`.
    ///
    /// Factory overrides are opaque and never purged.
    pub(crate) fn purge_references(&mut self, target: &ServiceId) -> usize {
        let mut removed = 0;
        self.overrides.retain(|_, deps| {
            let before = deps.len();
            deps.retain(|_, implementation| implementation.reference() != Some(target));
            removed += before - deps.len();
            !deps.is_empty()
        });
        removed
    }

    pub(crate) fn clear(&mut self) {
        self.overrides.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.overrides.values().map(|deps| deps.len()).sum()
    }
}

/// Fluent builder returned by [`Container::when`].
///
/// # Examples
///
/// ```rust
/// use ferrous_autowire::{Container, Implementation};
///
/// let mut container = Container::new();
/// container.factory("logger.console", |_, _| Ok("console".to_string())).unwrap();
/// container.factory("logger.file", |_, _| Ok("file".to_string())).unwrap();
///
/// container
///     .when("reports")
///     .needs("logger")
///     .give(Implementation::named("logger.file"))
///     .unwrap();
/// ```
#[must_use = "a contextual binding is only registered by `give`"]
pub struct ContextualBindingBuilder<'a> {
    container: &'a mut Container,
    consumers: Vec<ServiceId>,
    dependency: Option<ServiceId>,
}

impl<'a> ContextualBindingBuilder<'a> {
    pub(crate) fn new(container: &'a mut Container, consumers: Vec<ServiceId>) -> Self {
        Self { container, consumers, dependency: None }
    }

    /// Dependency id the override applies to.
    pub fn needs(mut self, dependency: impl Into<ServiceId>) -> Self {
        self.dependency = Some(dependency.into());
        self
    }

    /// Registers `implementation` for every consumer.
    pub fn give(self, implementation: impl Into<Implementation>) -> DiResult<&'a mut Container> {
        let ContextualBindingBuilder { container, consumers, dependency } = self;
        let dependency = dependency.ok_or_else(|| {
            DiError::new(ErrorKind::Binding, "contextual binding has no dependency; call `needs` first")
        })?;
        let implementation = implementation.into();
        for consumer in consumers {
            container.add_contextual_binding(consumer, dependency.clone(), implementation.clone())?;
        }
        Ok(container)
    }

    /// Registers a typed factory override.
    pub fn give_factory<T, F>(self, factory: F) -> DiResult<&'a mut Container>
    where
        T: std::any::Any + Send + Sync,
        F: Fn(&Container, &Params) -> DiResult<T> + Send + Sync + 'static,
    {
        self.give(Implementation::typed(factory))
    }

    /// Registers an override returning a fixed shared value.
    pub fn give_value(self, value: AnyArc) -> DiResult<&'a mut Container> {
        self.give(Implementation::factory(move |_, _| Ok(value.clone())))
    }
}
