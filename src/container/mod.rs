//! The autowiring container.
//!
//! [`Container`] owns every registry (bindings, instance cache, contextual
//! overrides, tags, extensions) plus the declared type table. Registration
//! goes through `&mut self`; resolution only needs `&self`, so factories,
//! extensions and constructors can resolve further services through the
//! container reference they are handed.
//!
//! Container instances are not thread-safe; confine a container to one
//! logical execution context or guard it externally. Resolved objects are
//! `Send + Sync` and may be shared freely.

use std::any::Any;
use std::sync::Arc;

use tracing::debug;

use crate::config::ContainerConfig;
use crate::contextual::{ContextualBindingBuilder, ContextualBindingStore};
use crate::decoration::{service_extension, trait_extension, ExtensionRegistry, ServiceDecorator, TraitDecorator};
use crate::descriptors::{BindingDescriptor, BindingSource};
use crate::error::{DiError, DiResult, ErrorKind};
use crate::internal::ResolutionStack;
use crate::introspection::{TypeInfo, TypeTable};
use crate::key::ServiceId;
use crate::lifetime::Lifetime;
use crate::observer::{Observers, ResolutionObserver};
use crate::params::{AnyArc, Params};
use crate::registration::{Binding, BindingRegistry, Implementation, InstanceCache};
use crate::tags::TagRegistry;

mod inject;
mod resolve;

/// Inversion-of-control container with autowiring.
///
/// # Examples
///
/// ```rust
/// use ferrous_autowire::{Container, Implementation, Parameter, Resolver, TypeInfo};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync { fn target(&self) -> &'static str; }
///
/// #[derive(Default)]
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger { fn target(&self) -> &'static str { "console" } }
///
/// struct Mailer { logger: Arc<dyn Logger> }
///
/// let mut container = Container::new();
/// container.declare(
///     TypeInfo::concrete::<ConsoleLogger>()
///         .default_constructor()
///         .implements::<dyn Logger>(|l| l),
/// );
/// container.declare(
///     TypeInfo::concrete::<Mailer>()
///         .param(Parameter::service::<dyn Logger>("logger"))
///         .constructor(|args| Ok(Mailer { logger: args.get_trait("logger")? })),
/// );
/// container
///     .singleton(ferrous_autowire::id_of::<dyn Logger>(), Implementation::of::<ConsoleLogger>())
///     .unwrap();
///
/// let mailer = container.get::<Mailer>().unwrap();
/// assert_eq!(mailer.logger.target(), "console");
/// ```
pub struct Container {
    config: ContainerConfig,
    types: TypeTable,
    bindings: BindingRegistry,
    instances: InstanceCache,
    contextual: ContextualBindingStore,
    tags: TagRegistry,
    extensions: ExtensionRegistry,
    stack: ResolutionStack,
    observers: Observers,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            config,
            types: TypeTable::default(),
            bindings: BindingRegistry::default(),
            instances: InstanceCache::default(),
            contextual: ContextualBindingStore::default(),
            tags: TagRegistry::default(),
            extensions: ExtensionRegistry::default(),
            stack: ResolutionStack::default(),
            observers: Observers::default(),
        }
    }

    /// Reserved id of the container itself.
    pub fn self_id() -> ServiceId {
        ServiceId::of::<Container>()
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Adds (or replaces) the metadata of a type.
    pub fn declare(&mut self, info: impl Into<TypeInfo>) -> &mut Self {
        let info = info.into();
        debug!(service = %info.id(), kind = ?info.kind(), "declared type");
        self.types.declare(info);
        self
    }

    pub fn is_declared(&self, id: impl Into<ServiceId>) -> bool {
        self.types.contains(&id.into())
    }

    /// Registers a binding.
    ///
    /// Fails with `ServiceAlreadyBound` when `id` already has a binding or an
    /// instance and `replace` is false. Replacing drops any cached instance.
    pub fn bind(
        &mut self,
        id: impl Into<ServiceId>,
        implementation: impl Into<Implementation>,
        lifetime: Lifetime,
        replace: bool,
    ) -> DiResult<&mut Self> {
        let id = id.into();
        let implementation = implementation.into();
        self.check_registrable(&id, replace)?;

        if let Implementation::Type(target) = &implementation {
            let delegates = *target != id && self.has_binding(target);
            if !delegates && !self.types.is_concrete(target) {
                return Err(DiError::binding(&id, format!("`{target}` is not a constructible type"))
                    .with_context("target", target.to_string()));
            }
        }

        if self.instances.remove(&id).is_some() {
            debug!(service = %id, "dropped cached instance of replaced binding");
        }
        debug!(service = %id, lifetime = ?lifetime, implementation = ?implementation, "bound service");
        self.bindings.insert(id, Binding { implementation, lifetime });
        Ok(self)
    }

    /// Shared binding.
    pub fn singleton(&mut self, id: impl Into<ServiceId>, implementation: impl Into<Implementation>) -> DiResult<&mut Self> {
        self.bind(id, implementation, Lifetime::Singleton, false)
    }

    /// Shared binding of declared type `T` to itself.
    pub fn singleton_type<T: Any + Send + Sync>(&mut self) -> DiResult<&mut Self> {
        self.singleton(ServiceId::of::<T>(), Implementation::of::<T>())
    }

    /// Transient binding of declared type `T` to itself.
    pub fn transient_type<T: Any + Send + Sync>(&mut self) -> DiResult<&mut Self> {
        self.bind(ServiceId::of::<T>(), Implementation::of::<T>(), Lifetime::Transient, false)
    }

    /// Transient factory binding.
    pub fn factory<T, F>(&mut self, id: impl Into<ServiceId>, factory: F) -> DiResult<&mut Self>
    where
        T: Any + Send + Sync,
        F: Fn(&Container, &Params) -> DiResult<T> + Send + Sync + 'static,
    {
        self.bind(id, Implementation::typed(factory), Lifetime::Transient, false)
    }

    /// Shared factory binding.
    pub fn singleton_factory<T, F>(&mut self, id: impl Into<ServiceId>, factory: F) -> DiResult<&mut Self>
    where
        T: Any + Send + Sync,
        F: Fn(&Container, &Params) -> DiResult<T> + Send + Sync + 'static,
    {
        self.bind(id, Implementation::typed(factory), Lifetime::Singleton, false)
    }

    /// Registers a pre-built shared object.
    pub fn instance(&mut self, id: impl Into<ServiceId>, instance: AnyArc) -> DiResult<&mut Self> {
        self.instance_with(id, instance, false)
    }

    pub fn instance_with(&mut self, id: impl Into<ServiceId>, instance: AnyArc, replace: bool) -> DiResult<&mut Self> {
        let id = id.into();
        self.check_registrable(&id, replace)?;
        if self.bindings.remove(&id).is_some() {
            debug!(service = %id, "instance replaces binding");
        }
        debug!(service = %id, "registered instance");
        self.instances.insert(id, instance);
        Ok(self)
    }

    /// Registers `value` as the shared instance of `T`.
    pub fn add_instance<T: Any + Send + Sync>(&mut self, value: T) -> DiResult<&mut Self> {
        self.instance(ServiceId::of::<T>(), Arc::new(value))
    }

    /// Registers a shared trait object under the id of `dyn T`.
    pub fn add_trait_instance<T: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<T>) -> DiResult<&mut Self> {
        self.instance(ServiceId::of::<T>(), Arc::new(value))
    }

    fn check_registrable(&self, id: &ServiceId, replace: bool) -> DiResult<()> {
        if *id == Self::self_id() {
            return Err(DiError::binding(id, "the container id is reserved"));
        }
        if id.is_empty() {
            return Err(DiError::binding(id, "empty service id"));
        }
        if !replace && (self.bindings.contains(id) || self.instances.contains(id)) {
            return Err(DiError::already_bound(id));
        }
        Ok(())
    }

    /// Bound, registered as an instance, or a constructible declared type.
    pub fn has(&self, id: impl Into<ServiceId>) -> bool {
        let id = id.into();
        self.has_binding(&id) || self.types.is_concrete(&id)
    }

    /// Explicitly registered (binding or instance).
    pub fn has_binding(&self, id: impl Into<ServiceId>) -> bool {
        let id = id.into();
        id == Self::self_id() || self.bindings.contains(&id) || self.instances.contains(&id)
    }

    pub fn is_shared(&self, id: impl Into<ServiceId>) -> bool {
        let id = id.into();
        self.instances.contains(&id)
            || self.bindings.get(&id).is_some_and(|b| b.lifetime.is_shared())
    }

    /// A shared instance is cached for `id`.
    pub fn is_resolved(&self, id: impl Into<ServiceId>) -> bool {
        self.instances.contains(&id.into())
    }

    /// Drops the cached instance of `id`, keeping its binding.
    pub fn forget_instance(&mut self, id: impl Into<ServiceId>) -> bool {
        let id = id.into();
        let removed = self.instances.remove(&id).is_some();
        if removed {
            debug!(service = %id, "forgot cached instance");
        }
        removed
    }

    /// Ids currently mid-resolution, outermost first.
    pub fn resolution_chain(&self) -> Vec<ServiceId> {
        self.stack.chain()
    }

    /// Starts a contextual binding for `consumer`.
    pub fn when(&mut self, consumer: impl Into<ServiceId>) -> ContextualBindingBuilder<'_> {
        ContextualBindingBuilder::new(self, vec![consumer.into()])
    }

    /// Starts a contextual binding shared by several consumers.
    pub fn when_any<I, S>(&mut self, consumers: I) -> ContextualBindingBuilder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<ServiceId>,
    {
        let consumers = consumers.into_iter().map(Into::into).collect();
        ContextualBindingBuilder::new(self, consumers)
    }

    /// Overrides `dependency` while building `consumer`.
    ///
    /// A reference implementation must name something the container can
    /// provide.
    pub fn add_contextual_binding(
        &mut self,
        consumer: impl Into<ServiceId>,
        dependency: impl Into<ServiceId>,
        implementation: impl Into<Implementation>,
    ) -> DiResult<&mut Self> {
        let consumer = consumer.into();
        let dependency = dependency.into();
        let implementation = implementation.into();

        if let Implementation::Type(target) = &implementation {
            if !self.has(target) {
                return Err(DiError::binding(&consumer, format!("contextual target `{target}` is not a constructible type"))
                    .with_context("dependency", dependency.to_string())
                    .with_context("target", target.to_string()));
            }
        }

        debug!(consumer = %consumer, dependency = %dependency, implementation = ?implementation, "added contextual binding");
        self.contextual.add(consumer, dependency, implementation);
        Ok(self)
    }

    /// Removes the override of `dependency` for `consumer`, or all of the
    /// consumer's overrides when `dependency` is `None`.
    pub fn forget_when(&mut self, consumer: impl Into<ServiceId>, dependency: Option<ServiceId>) -> &mut Self {
        let consumer = consumer.into();
        let removed = self.contextual.forget(&consumer, dependency.as_ref());
        debug!(consumer = %consumer, removed, "forgot contextual bindings");
        self
    }

    pub fn has_contextual_binding(&self, consumer: impl Into<ServiceId>, dependency: impl Into<ServiceId>) -> bool {
        self.contextual.contains(&consumer.into(), &dependency.into())
    }

    /// Adds `ids` to `tag`, merging with or replacing the existing set.
    ///
    /// ```rust
    /// use ferrous_autowire::{Container, ServiceId};
    ///
    /// let mut container = Container::new();
    /// for id in ["a", "b", "c", "d"] {
    ///     container.factory(id, move |_, _| Ok(id)).unwrap();
    /// }
    /// container.tag("t", ["a", "b"], true).unwrap();
    /// container.tag("t", ["b", "c"], true).unwrap();
    /// assert_eq!(container.resolve_tagged("t").unwrap().len(), 3);
    ///
    /// container.tag("t", ["d"], false).unwrap();
    /// assert_eq!(container.tagged_ids("t"), [ServiceId::from("d")]);
    /// ```
    pub fn tag<I, S>(&mut self, tag: &str, ids: I, merge: bool) -> DiResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<ServiceId>,
    {
        if tag.is_empty() {
            return Err(DiError::msg("tag name cannot be empty"));
        }
        let ids: Vec<ServiceId> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Ok(self);
        }
        if let Some(missing) = ids.iter().find(|id| !self.has(*id)) {
            return Err(DiError::not_found(missing).with_context("tag", tag));
        }
        debug!(tag, count = ids.len(), merge, "tagged services");
        self.tags.tag(tag, ids, merge);
        Ok(self)
    }

    pub fn untag<I, S>(&mut self, tag: &str, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ServiceId>,
    {
        let ids: Vec<ServiceId> = ids.into_iter().map(Into::into).collect();
        debug!(tag, count = ids.len(), "untagged services");
        self.tags.untag(tag, &ids);
        self
    }

    /// Ids under `tag`, in set order. Unknown tags are empty.
    pub fn tagged_ids(&self, tag: &str) -> Vec<ServiceId> {
        self.tags.get(tag).to_vec()
    }

    /// Known tag names, sorted.
    pub fn tags(&self) -> Vec<String> {
        self.tags.names()
    }

    /// Appends an extension to `id`.
    ///
    /// Extensions run in registration order on every fresh construction of
    /// `id`, before the instance is cached. When `id` already has a cached
    /// instance (a resolved singleton or a registered instance), the
    /// extension is applied to it immediately and the result replaces it.
    /// If that call fails, nothing is registered.
    pub fn extend<F>(&mut self, id: impl Into<ServiceId>, extension: F) -> DiResult<&mut Self>
    where
        F: Fn(AnyArc, &Container) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        let id = id.into();
        self.add_extension(id, Arc::new(extension))
    }

    /// Typed [`extend`](Self::extend) for the id of `T`.
    pub fn decorate<T, D>(&mut self, decorator: D) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        D: ServiceDecorator<T> + 'static,
    {
        self.add_extension(ServiceId::of::<T>(), service_extension::<T, D>(decorator))
    }

    /// Typed [`extend`](Self::extend) for the id of `dyn T`.
    pub fn decorate_trait<T, D>(&mut self, decorator: D) -> DiResult<&mut Self>
    where
        T: ?Sized + Send + Sync + 'static,
        D: TraitDecorator<T> + 'static,
    {
        self.add_extension(ServiceId::of::<T>(), trait_extension::<T, D>(decorator))
    }

    fn add_extension(&mut self, id: ServiceId, extension: crate::decoration::Extension) -> DiResult<&mut Self> {
        if id == Self::self_id() {
            return Err(DiError::binding(&id, "the container id is reserved"));
        }
        if !self.has(&id) {
            return Err(DiError::not_found(&id));
        }
        if let Some(cached) = self.instances.get(&id) {
            let extended = extension(cached, self).map_err(|err| err.or_service(&id))?;
            self.instances.insert(id.clone(), extended);
            debug!(service = %id, "extended cached instance");
        }
        self.extensions.add(id.clone(), extension);
        debug!(service = %id, count = self.extensions.count(&id), "extended service");
        Ok(self)
    }

    /// Removes the binding, cached instance and extensions of `id`, plus
    /// every contextual override that references `id` by name.
    pub fn unbind(&mut self, id: impl Into<ServiceId>) -> DiResult<&mut Self> {
        let id = id.into();
        if id == Self::self_id() {
            return Err(DiError::binding(&id, "the container id is reserved"));
        }
        if !self.bindings.contains(&id) && !self.instances.contains(&id) {
            return Err(DiError::not_found(&id));
        }
        self.bindings.remove(&id);
        self.instances.remove(&id);
        let extensions = self.extensions.remove(&id);
        let purged = self.contextual.purge_references(&id);
        debug!(service = %id, extensions, purged, "unbound service");
        Ok(self)
    }

    /// Clears bindings, instances, contextual overrides, tags and extensions.
    ///
    /// Declared types, configuration and observers are kept, and the
    /// container id stays reserved.
    pub fn reset(&mut self) -> &mut Self {
        self.bindings.clear();
        self.instances.clear();
        self.contextual.clear();
        self.tags.clear();
        self.extensions.clear();
        debug!(types = self.types.len(), "reset container");
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn ResolutionObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Registered services, sorted by id.
    pub fn descriptors(&self) -> Vec<BindingDescriptor> {
        let mut descriptors: Vec<BindingDescriptor> = self
            .bindings
            .iter()
            .map(|(id, binding)| BindingDescriptor {
                id: id.clone(),
                lifetime: binding.lifetime,
                source: match &binding.implementation {
                    Implementation::Type(target) => BindingSource::Reference(target.clone()),
                    Implementation::Factory(_) => BindingSource::Factory,
                },
                extensions: self.extensions.count(id),
                resolved: self.instances.contains(id),
            })
            .collect();

        descriptors.extend(
            self.instances
                .ids()
                .into_iter()
                .filter(|id| !self.bindings.contains(id))
                .map(|id| BindingDescriptor {
                    extensions: self.extensions.count(&id),
                    lifetime: Lifetime::Singleton,
                    source: BindingSource::Instance,
                    resolved: true,
                    id,
                }),
        );
        descriptors.sort_by(|a, b| a.id.cmp(&b.id));
        descriptors
    }

    /// Records the current dependency chain on an engine-created error.
    pub(crate) fn stamp(&self, err: DiError) -> DiError {
        err.in_chain(self.stack.chain())
    }

    /// Container-kind failures become `kind`; everything else propagates.
    pub(crate) fn escalate(&self, kind: ErrorKind, id: &ServiceId, reason: &str, err: DiError) -> DiError {
        if err.kind().is_rewrapped() {
            DiError::wrap(kind, id, reason, self.stamp(err))
        } else {
            err
        }
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("config", &self.config)
            .field("types", &self.types.len())
            .field("bindings", &self.descriptors().len())
            .field("contextual", &self.contextual.len())
            .field("tags", &self.tags.names())
            .field("observers", &!self.observers.is_empty())
            .finish()
    }
}
