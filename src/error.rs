//! Error types for the autowiring container.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::key::ServiceId;

/// Boxed foreign error retained as the cause of a [`DiError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structured context attached to every error.
pub type ErrorContext = BTreeMap<&'static str, String>;

/// Classification of container failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Id has no binding and is not a constructible type
    ServiceNotFound,
    /// Registration attempted without override on an occupied id
    ServiceAlreadyBound,
    /// Resolving-set re-entry; the chain carries the full cycle
    CircularDependency,
    /// A constructor parameter could not be determined
    Autowiring,
    /// Target type is abstract/interface or has no accessible constructor
    Instantiation,
    /// Property or setter injection failed
    Injection,
    /// A registered implementation does not name a constructible type
    Binding,
    /// Introspection and binding-factory failures
    Resolution,
    /// Catch-all for failures raised by user-supplied closures
    Container,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ServiceNotFound => "service not found",
            ErrorKind::ServiceAlreadyBound => "service already bound",
            ErrorKind::CircularDependency => "circular dependency",
            ErrorKind::Autowiring => "autowiring error",
            ErrorKind::Instantiation => "instantiation error",
            ErrorKind::Injection => "injection error",
            ErrorKind::Binding => "binding error",
            ErrorKind::Resolution => "resolution error",
            ErrorKind::Container => "container error",
        }
    }

    /// Generic failures that a nested resolution rewraps into the kind of
    /// the stage it happened in. Every other kind propagates unchanged.
    #[inline]
    pub fn is_rewrapped(&self) -> bool {
        matches!(self, ErrorKind::Container)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container errors
///
/// Every error carries its [`ErrorKind`], the failing service (when known),
/// the dependency chain at the time of failure and a structured context map.
/// Wrapped failures keep the original error as [`std::error::Error::source`].
///
/// # Examples
///
/// ```rust
/// use ferrous_autowire::{Container, ErrorKind};
///
/// let container = Container::new();
/// let err = container.resolve("missing").unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::ServiceNotFound);
/// assert_eq!(err.service().map(|s| s.as_str()), Some("missing"));
/// assert_eq!(err.to_string(), "service not found: missing");
/// ```
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct DiError {
    kind: ErrorKind,
    service: Option<ServiceId>,
    message: String,
    chain: Vec<ServiceId>,
    context: ErrorContext,
    #[source]
    source: Option<BoxError>,
}

impl DiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            service: None,
            message: message.into(),
            chain: Vec::new(),
            context: ErrorContext::new(),
            source: None,
        }
    }

    pub fn not_found(id: &ServiceId) -> Self {
        Self::new(ErrorKind::ServiceNotFound, id.to_string()).with_service(id)
    }

    pub fn already_bound(id: &ServiceId) -> Self {
        Self::new(ErrorKind::ServiceAlreadyBound, id.to_string()).with_service(id)
    }

    /// Cycle error. `chain` is the in-flight chain followed by the repeated id.
    pub fn circular(chain: Vec<ServiceId>) -> Self {
        let message = chain
            .iter()
            .map(ServiceId::as_str)
            .collect::<Vec<_>>()
            .join(" -> ");
        let mut err = Self::new(ErrorKind::CircularDependency, message);
        err.service = chain.last().cloned();
        err.chain = chain;
        err
    }

    pub fn autowiring(id: &ServiceId, reason: impl Into<String>) -> Self {
        Self::described(ErrorKind::Autowiring, id, reason)
    }

    pub fn instantiation(id: &ServiceId, reason: impl Into<String>) -> Self {
        Self::described(ErrorKind::Instantiation, id, reason)
    }

    pub fn injection(id: &ServiceId, reason: impl Into<String>) -> Self {
        Self::described(ErrorKind::Injection, id, reason)
    }

    pub fn binding(id: &ServiceId, reason: impl Into<String>) -> Self {
        Self::described(ErrorKind::Binding, id, reason)
    }

    pub fn resolution(id: &ServiceId, reason: impl Into<String>) -> Self {
        Self::described(ErrorKind::Resolution, id, reason)
    }

    /// Lifts a foreign error raised inside a factory, extension or writer.
    ///
    /// ```rust
    /// use ferrous_autowire::{DiError, ErrorKind};
    /// use std::error::Error;
    ///
    /// let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
    /// let err = DiError::custom(io);
    /// assert_eq!(err.kind(), ErrorKind::Container);
    /// assert!(err.source().is_some());
    /// ```
    pub fn custom(error: impl Into<BoxError>) -> Self {
        let source = error.into();
        let mut err = Self::new(ErrorKind::Container, source.to_string());
        err.source = Some(source);
        err
    }

    /// Container-kind error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Container, message)
    }

    fn described(kind: ErrorKind, id: &ServiceId, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(kind, format!("{id}: {reason}"))
            .with_service(id)
            .with_context("reason", reason)
    }

    /// Wraps `cause` into a new error of `kind`, retaining it as the source.
    pub(crate) fn wrap(kind: ErrorKind, id: &ServiceId, reason: impl Into<String>, cause: DiError) -> Self {
        let chain = cause.chain.clone();
        let mut err = Self::described(kind, id, reason);
        err.chain = chain;
        err.source = Some(Box::new(cause));
        err
    }

    pub fn with_service(mut self, id: &ServiceId) -> Self {
        self.service = Some(id.clone());
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.insert(key, value.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Records the chain unless one was recorded closer to the failure.
    pub(crate) fn in_chain(mut self, chain: Vec<ServiceId>) -> Self {
        if self.chain.is_empty() {
            self.chain = chain;
        }
        self
    }

    pub(crate) fn or_service(mut self, id: &ServiceId) -> Self {
        if self.service.is_none() {
            self.service = Some(id.clone());
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    pub fn service(&self) -> Option<&ServiceId> {
        self.service.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Dependency chain at the time of failure.
    pub fn chain(&self) -> &[ServiceId] {
        &self.chain
    }

    /// For cycle errors, the chain from the first occurrence of the repeated
    /// id through the repeat. Other kinds return the full chain.
    ///
    /// ```rust
    /// use ferrous_autowire::{DiError, ServiceId};
    ///
    /// let err = DiError::circular(vec!["root".into(), "a".into(), "b".into(), "a".into()]);
    /// let cycle: Vec<&str> = err.cycle().iter().map(ServiceId::as_str).collect();
    /// assert_eq!(cycle, ["a", "b", "a"]);
    /// ```
    pub fn cycle(&self) -> &[ServiceId] {
        if self.kind != ErrorKind::CircularDependency {
            return &self.chain;
        }
        match self.chain.last() {
            Some(repeat) => {
                let start = self.chain.iter().position(|id| id == repeat).unwrap_or(0);
                &self.chain[start..]
            }
            None => &self.chain,
        }
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// The wrapped cause as a container error, when it is one.
    pub fn cause(&self) -> Option<&DiError> {
        self.source.as_deref().and_then(|s| s.downcast_ref::<DiError>())
    }
}

/// Result type for container operations
pub type DiResult<T> = Result<T, DiError>;
