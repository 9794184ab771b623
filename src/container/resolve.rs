//! Resolution engine.

use std::time::Instant;

use tracing::{debug, trace};

use super::Container;
use crate::error::{DiError, DiResult, ErrorKind};
use crate::introspection::analyzer::resolve_arguments;
use crate::introspection::TypeKind;
use crate::key::ServiceId;
use crate::params::{AnyArc, Params};
use crate::registration::Implementation;

/// Raw construction output before decoration.
struct Built {
    instance: AnyArc,
    /// Concrete value built here, when it differs in shape from `instance`
    origin: Option<AnyArc>,
    /// The value came out of a nested `resolve`, which already injected it
    delegated: bool,
    shared: bool,
}

impl Container {
    /// Resolves `id` with no named parameters.
    pub fn resolve(&self, id: impl Into<ServiceId>) -> DiResult<AnyArc> {
        self.resolve_with(id, &Params::new())
    }

    /// Resolves `id`, letting `params` override constructor parameters by
    /// name.
    ///
    /// A cached shared instance is returned as-is; `params` only matter for
    /// fresh constructions.
    pub fn resolve_with(&self, id: impl Into<ServiceId>, params: &Params) -> DiResult<AnyArc> {
        let id = id.into();

        if let Some(cached) = self.instances.get(&id) {
            trace!(service = %id, "instance cache hit");
            return Ok(cached);
        }

        if id == Self::self_id() {
            return Err(self.stamp(DiError::resolution(
                &id,
                "the container is not resolvable; use the `&Container` passed to factories",
            )));
        }

        let outermost = self.stack.depth() == 0;
        let _guard = self.stack.enter(&id, self.config.max_depth)?;
        let mark = self.instances.mark();

        let result = if self.observers.is_empty() {
            self.resolve_fresh(&id, params)
        } else {
            self.observers.resolving(&id);
            let started = Instant::now();
            let result = self.resolve_fresh(&id, params);
            match &result {
                Ok(_) => self.observers.resolved(&id, started.elapsed()),
                Err(err) => self.observers.failed(&id, err),
            }
            result
        };

        // Shared instances cached below a failed frame may hold references
        // to objects that were never handed out.
        if result.is_err() {
            let dropped = self.instances.rollback(mark);
            if dropped > 0 {
                debug!(service = %id, dropped, "rolled back cached instances");
            }
        }
        if outermost {
            self.instances.settle();
        }
        result
    }

    /// Steps 4 to 7 of a resolution; the caller holds the stack guard.
    fn resolve_fresh(&self, id: &ServiceId, params: &Params) -> DiResult<AnyArc> {
        let built = match self.bindings.get(id) {
            Some(binding) => {
                trace!(service = %id, lifetime = ?binding.lifetime, depth = self.stack.depth(), "constructing from binding");
                let mut built = self.construct_binding(id, &binding.implementation, params)?;
                built.shared = binding.lifetime.is_shared();
                built
            }
            None => {
                trace!(service = %id, depth = self.stack.depth(), "autowiring");
                let instance = self.build(id, params)?;
                Built { instance, origin: None, delegated: false, shared: false }
            }
        };

        let instance = self
            .extensions
            .apply(id, built.instance, self)
            .map_err(|err| self.stamp(err.or_service(id)))?;

        // Cached before injection so property cycles between shared services
        // see the same instance.
        if built.shared {
            self.instances.record(id.clone(), instance.clone());
            trace!(service = %id, "cached shared instance");
        }

        if !built.delegated {
            let target = if self.types.describe(&instance).is_some() {
                Some(&instance)
            } else {
                built.origin.as_ref()
            };
            if let Some(target) = target {
                self.inject(target)?;
            }
        }

        Ok(instance)
    }

    fn construct_binding(&self, id: &ServiceId, implementation: &Implementation, params: &Params) -> DiResult<Built> {
        match implementation {
            Implementation::Factory(factory) => {
                let instance = factory(self, params)
                    .map_err(|err| self.escalate(ErrorKind::Resolution, id, "binding factory failed", err))?;
                Ok(Built { instance, origin: None, delegated: false, shared: false })
            }
            Implementation::Type(target) if target == id || !self.has_binding(target) => {
                let concrete = self.build(target, params)?;
                let instance = self.types.coerce(concrete.clone(), target, id);
                Ok(Built { instance, origin: Some(concrete), delegated: false, shared: false })
            }
            Implementation::Type(target) => {
                let value = self.resolve_with(target, params)?;
                let instance = self.types.coerce(value, target, id);
                Ok(Built { instance, origin: None, delegated: true, shared: false })
            }
        }
    }

    /// Autowires a declared concrete type.
    fn build(&self, id: &ServiceId, params: &Params) -> DiResult<AnyArc> {
        let Some(info) = self.types.get(id) else {
            return Err(self.stamp(DiError::not_found(id)));
        };
        if info.kind() != TypeKind::Concrete {
            return Err(self.stamp(
                DiError::instantiation(id, "abstract and interface types cannot be instantiated")
                    .with_context("kind", format!("{:?}", info.kind())),
            ));
        }
        let Some(constructor) = info.constructor() else {
            return Err(self.stamp(DiError::instantiation(id, "no accessible constructor")));
        };

        let args = resolve_arguments(self, id, info.params(), params)?;
        constructor(&args).map_err(|err| self.escalate(ErrorKind::Resolution, id, "constructor failed", err))
    }

    /// Contextual override for `dependency` inside `consumer`, if any.
    pub(crate) fn contextual_override(&self, consumer: &ServiceId, dependency: &ServiceId) -> Option<Implementation> {
        self.contextual.get(consumer, dependency).cloned()
    }

    /// Produces a value from a contextual override.
    ///
    /// References resolve recursively (cached and cycle-tracked like any
    /// resolution); factories are invoked directly.
    pub(crate) fn resolve_override(&self, implementation: Implementation, dependency: &ServiceId) -> DiResult<AnyArc> {
        match implementation {
            Implementation::Type(target) => {
                trace!(dependency = %dependency, target = %target, "contextual reference");
                let value = self.resolve(&target)?;
                Ok(self.types.coerce(value, &target, dependency))
            }
            Implementation::Factory(factory) => {
                trace!(dependency = %dependency, "contextual factory");
                factory(self, &Params::new()).map_err(|err| self.stamp(err.or_service(dependency)))
            }
        }
    }

    /// Contextual override first, then a plain resolution of `dependency`.
    pub(crate) fn resolve_dependency(&self, consumer: &ServiceId, dependency: &ServiceId) -> DiResult<AnyArc> {
        match self.contextual_override(consumer, dependency) {
            Some(implementation) => self.resolve_override(implementation, dependency),
            None => self.resolve(dependency),
        }
    }

    /// Resolves every service under `tag`, in set order.
    pub fn resolve_tagged(&self, tag: &str) -> DiResult<Vec<AnyArc>> {
        self.tags
            .get(tag)
            .iter()
            .map(|id| self.resolve(id))
            .collect()
    }
}
