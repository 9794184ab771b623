//! Service identifiers for the container.

use std::borrow::{Borrow, Cow};
use std::fmt;

/// Identifier of a service in the container.
///
/// An id is either derived from a type (`ServiceId::of::<T>()`, which also
/// works for trait objects such as `dyn Logger`) or is an arbitrary string
/// such as `"logger"` used as an alias.
///
/// # Examples
///
/// ```rust
/// use ferrous_autowire::ServiceId;
///
/// trait Logger {}
///
/// let by_type = ServiceId::of::<String>();
/// assert_eq!(by_type.as_str(), "alloc::string::String");
///
/// let by_trait = ServiceId::of::<dyn Logger>();
/// assert!(by_trait.as_str().contains("Logger"));
///
/// let alias = ServiceId::from("logger");
/// assert_eq!(alias.to_string(), "logger");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId(Cow<'static, str>);

impl ServiceId {
    /// Id of a (possibly unsized) type, based on `std::any::type_name`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        ServiceId(Cow::Borrowed(std::any::type_name::<T>()))
    }

    /// Id from a static string without allocating.
    pub const fn from_static(name: &'static str) -> Self {
        ServiceId(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short name without module path, for log lines.
    ///
    /// ```rust
    /// use ferrous_autowire::ServiceId;
    ///
    /// assert_eq!(ServiceId::of::<String>().short_name(), "String");
    /// assert_eq!(ServiceId::from("logger").short_name(), "logger");
    /// ```
    pub fn short_name(&self) -> &str {
        let s = self.as_str();
        let s = s.strip_prefix("dyn ").unwrap_or(s);
        s.rsplit("::").next().unwrap_or(s)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ServiceId {
    fn from(name: &'static str) -> Self {
        ServiceId(Cow::Borrowed(name))
    }
}

impl From<String> for ServiceId {
    fn from(name: String) -> Self {
        ServiceId(Cow::Owned(name))
    }
}

impl From<&ServiceId> for ServiceId {
    fn from(id: &ServiceId) -> Self {
        id.clone()
    }
}

impl AsRef<str> for ServiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Cow<str> hashes like str, so lookups by &str are consistent.
impl Borrow<str> for ServiceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Helper for creating type ids
#[inline(always)]
pub fn id_of<T: ?Sized + 'static>() -> ServiceId {
    ServiceId::of::<T>()
}
