//! Binding descriptors for introspection and diagnostics.

use crate::key::ServiceId;
use crate::lifetime::Lifetime;

/// How a registered service is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingSource {
    /// Delegates to another id (autowired type or alias)
    Reference(ServiceId),
    /// Factory function
    Factory,
    /// Pre-built instance registered directly
    Instance,
}

/// Snapshot of one registration.
///
/// # Examples
///
/// ```rust
/// use ferrous_autowire::{BindingSource, Container, Implementation, Lifetime};
///
/// let mut container = Container::new();
/// container.factory("clock", |_, _| Ok(0u64)).unwrap();
/// container.instance("version", std::sync::Arc::new("1.0")).unwrap();
///
/// let descriptors = container.descriptors();
/// assert_eq!(descriptors.len(), 2);
/// assert_eq!(descriptors[0].id.as_str(), "clock");
/// assert_eq!(descriptors[0].source, BindingSource::Factory);
/// assert_eq!(descriptors[0].lifetime, Lifetime::Transient);
/// assert_eq!(descriptors[1].source, BindingSource::Instance);
/// assert!(descriptors[1].resolved);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDescriptor {
    pub id: ServiceId,
    pub lifetime: Lifetime,
    pub source: BindingSource,
    /// Number of registered extensions
    pub extensions: usize,
    /// A shared instance is cached
    pub resolved: bool,
}

impl BindingDescriptor {
    pub fn is_shared(&self) -> bool {
        self.lifetime.is_shared()
    }

    pub fn is_decorated(&self) -> bool {
        self.extensions > 0
    }
}
