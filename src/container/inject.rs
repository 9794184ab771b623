//! Property and setter injection.
//!
//! Both passes run after construction on every freshly built instance whose
//! runtime type is declared, and stop at the first failure.

use tracing::trace;

use super::Container;
use crate::error::{DiError, DiResult, ErrorKind};
use crate::introspection::{Method, ParamType, Property};
use crate::key::ServiceId;
use crate::params::{AnyArc, Arguments};

impl Container {
    pub(super) fn inject(&self, target: &AnyArc) -> DiResult<()> {
        let Some(info) = self.types.describe(target) else {
            return Ok(());
        };
        let owner = info.id();

        for property in info.properties() {
            self.inject_property(owner, target, property)?;
        }
        for method in info.methods() {
            self.inject_setter(owner, target, method)?;
        }
        Ok(())
    }

    fn inject_property(&self, owner: &ServiceId, target: &AnyArc, property: &Property) -> DiResult<()> {
        let name = property.name();
        let Some(dependency) = property.target() else {
            return Err(self.stamp(DiError::injection(owner, "no type").with_context("property", name)));
        };
        if !property.is_public() {
            return Err(self.stamp(DiError::injection(owner, "not public").with_context("property", name)));
        }

        trace!(service = %owner, property = name, dependency = %dependency, "property injection");
        let value = self
            .resolve_dependency(owner, dependency)
            .map_err(|err| self.escalate(ErrorKind::Injection, owner, &format!("property `{name}` dependency failed"), err))?;

        // An explicit override may name a concrete type for an interface property.
        let value = match property.declared() {
            Some(declared) => self.types.coerce(value, dependency, declared),
            None => value,
        };

        property
            .write(target, value)
            .map_err(|err| self.escalate(ErrorKind::Injection, owner, &format!("property `{name}` write failed"), err))
    }

    fn inject_setter(&self, owner: &ServiceId, target: &AnyArc, method: &Method) -> DiResult<()> {
        if !method.is_public() || !method.name().starts_with(self.config.setter_prefix.as_str()) {
            return Ok(());
        }
        // Exactly one class/interface parameter, anything else is not an
        // injection point.
        let [param] = method.params() else {
            return Ok(());
        };
        let ParamType::Service(dependency) = param.ty() else {
            return Ok(());
        };

        let contextual = self.contextual_override(owner, dependency);
        if contextual.is_none() && param.is_optional() && !self.has(dependency) {
            trace!(service = %owner, method = method.name(), dependency = %dependency, "skipping optional setter");
            return Ok(());
        }

        trace!(service = %owner, method = method.name(), dependency = %dependency, "setter injection");
        let value = match contextual {
            Some(implementation) => self.resolve_override(implementation, dependency),
            None => self.resolve(dependency),
        }
        .map_err(|err| {
            self.escalate(ErrorKind::Injection, owner, &format!("setter `{}` dependency failed", method.name()), err)
        })?;

        let mut args = Arguments::new(owner.clone());
        args.push(param.name(), Some(value));
        method
            .invoke(target, &args)
            .map_err(|err| self.escalate(ErrorKind::Injection, owner, &format!("setter `{}` failed", method.name()), err))
    }
}
