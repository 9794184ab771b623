//! Constructor and setter parameter analysis.
//!
//! Each parameter is classified in declaration order and turned into an
//! argument value, falling back to defaults and nulls where allowed.

use tracing::trace;

use super::{ParamType, Parameter};
use crate::container::Container;
use crate::error::{DiError, DiResult, ErrorKind};
use crate::key::ServiceId;
use crate::params::{AnyArc, Arguments, Params};

/// How a parameter's value is determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A named entry in `Params`, used verbatim
    Override,
    /// No type hint
    Untyped,
    /// Union type
    Union,
    /// Built-in/primitive type
    Builtin,
    /// Class/interface dependency, resolved through the container
    Service(ServiceId),
}

/// Classifies `param`. Named overrides win over every declared type.
///
/// ```rust
/// use ferrous_autowire::{classify, Classification, Parameter, Params};
///
/// let port = Parameter::builtin("port", "int");
/// assert_eq!(classify(&port, &Params::new()), Classification::Builtin);
/// assert_eq!(classify(&port, &Params::new().with("port", 8080u16)), Classification::Override);
/// ```
pub fn classify(param: &Parameter, params: &Params) -> Classification {
    if params.contains(param.name()) {
        return Classification::Override;
    }
    match param.ty() {
        ParamType::Untyped => Classification::Untyped,
        ParamType::Union(_) => Classification::Union,
        ParamType::Builtin(_) => Classification::Builtin,
        ParamType::Service(dependency) => Classification::Service(dependency.clone()),
    }
}

/// Builds the ordered argument list for `declaring`'s constructor.
pub(crate) fn resolve_arguments(
    container: &Container,
    declaring: &ServiceId,
    parameters: &[Parameter],
    params: &Params,
) -> DiResult<Arguments> {
    let mut args = Arguments::new(declaring.clone());
    for param in parameters {
        let value = resolve_parameter(container, declaring, param, params)?;
        args.push(param.name(), value);
    }
    Ok(args)
}

fn resolve_parameter(
    container: &Container,
    declaring: &ServiceId,
    param: &Parameter,
    params: &Params,
) -> DiResult<Option<AnyArc>> {
    let name = param.name();
    match classify(param, params) {
        Classification::Override => {
            trace!(service = %declaring, parameter = name, "using named parameter");
            Ok(params.lookup(name).flatten())
        }
        Classification::Untyped => match param.default_value() {
            Some(value) => Ok(Some(value)),
            None => Err(container.stamp(
                DiError::autowiring(declaring, "no type hint").with_context("parameter", name),
            )),
        },
        Classification::Union => fallback(param).ok_or_else(|| {
            container.stamp(
                DiError::autowiring(declaring, "union type")
                    .with_context("parameter", name)
                    .with_context("members", param.ty().type_name()),
            )
        }),
        Classification::Builtin => fallback(param).ok_or_else(|| {
            container.stamp(
                DiError::autowiring(declaring, "builtin")
                    .with_context("parameter", name)
                    .with_context("type", param.ty().type_name()),
            )
        }),
        Classification::Service(dependency) => resolve_service(container, declaring, param, &dependency),
    }
}

/// Default value first, then null when allowed.
fn fallback(param: &Parameter) -> Option<Option<AnyArc>> {
    match param.default_value() {
        Some(value) => Some(Some(value)),
        None if param.is_nullable() => Some(None),
        None => None,
    }
}

fn resolve_service(
    container: &Container,
    declaring: &ServiceId,
    param: &Parameter,
    dependency: &ServiceId,
) -> DiResult<Option<AnyArc>> {
    // Contextual failures propagate without falling back to defaults.
    if let Some(implementation) = container.contextual_override(declaring, dependency) {
        return container
            .resolve_override(implementation, dependency)
            .map(Some)
            .map_err(|err| escalate(declaring, param, err));
    }

    match container.resolve(dependency) {
        Ok(value) => Ok(Some(value)),
        // Only a missing dependency falls back; a failure further down its
        // own graph surfaces unchanged.
        Err(err) if err.is(ErrorKind::ServiceNotFound) && err.service() == Some(dependency) => {
            match fallback(param) {
                Some(value) => {
                    trace!(service = %declaring, parameter = param.name(), "dependency not found, using fallback");
                    Ok(value)
                }
                None => Err(DiError::wrap(ErrorKind::Autowiring, declaring, "unresolvable dependency", err)
                    .with_context("parameter", param.name())
                    .with_context("dependency", dependency.to_string())),
            }
        }
        Err(err) => Err(escalate(declaring, param, err)),
    }
}

/// Generic container errors become autowiring errors; everything else
/// propagates unchanged.
fn escalate(declaring: &ServiceId, param: &Parameter, err: DiError) -> DiError {
    if err.kind().is_rewrapped() {
        DiError::wrap(ErrorKind::Autowiring, declaring, "dependency failed", err)
            .with_context("parameter", param.name())
    } else {
        err
    }
}
