//! Binding lifetime definitions.

/// Binding lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use ferrous_autowire::{Container, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Clock;
///
/// let mut container = Container::new();
/// container
///     .singleton_factory("clock", |_, _| Ok(Clock))
///     .unwrap();
///
/// let a = container.resolve("clock").unwrap();
/// let b = container.resolve("clock").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// assert!(Lifetime::Singleton.is_shared());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Resolved once and cached for the container's lifetime
    ///
    /// Every later resolution returns the cached reference verbatim: the
    /// factory and the extensions are not invoked again.
    Singleton,
    /// New instance per resolution, never cached
    Transient,
}

impl Lifetime {
    /// Whether instances of this lifetime are stored in the instance cache.
    #[inline]
    pub fn is_shared(self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}

impl From<bool> for Lifetime {
    fn from(shared: bool) -> Self {
        if shared {
            Lifetime::Singleton
        } else {
            Lifetime::Transient
        }
    }
}
