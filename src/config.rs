//! Container configuration.
//!
//! Defaults can be overridden programmatically, from environment variables
//! prefixed with `FERROUS_AUTOWIRE_`, or (with the `config` feature) from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::internal::circular::MAX_DEPTH;

/// Prefix of the environment variables read by [`ContainerConfig::from_env`].
pub const ENV_PREFIX: &str = "FERROUS_AUTOWIRE";

/// Tunables of a [`Container`](crate::Container).
///
/// # Examples
///
/// ```rust
/// use ferrous_autowire::{Container, ContainerConfig};
///
/// let config = ContainerConfig::default()
///     .with_setter_prefix("with")
///     .with_max_depth(64);
/// let container = Container::with_config(config);
/// assert_eq!(container.config().setter_prefix, "with");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerConfig {
    /// Method-name prefix that marks setter injection points
    pub setter_prefix: String,
    /// Bound on nested resolutions before failing (default 64, sized for a
    /// 2 MiB thread stack)
    pub max_depth: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            setter_prefix: "set".to_string(),
            max_depth: MAX_DEPTH,
        }
    }
}

impl ContainerConfig {
    pub fn with_setter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.setter_prefix = prefix.into();
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Defaults overridden by `FERROUS_AUTOWIRE_SETTER_PREFIX` and
    /// `FERROUS_AUTOWIRE_MAX_DEPTH`. Unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(prefix) = lookup(&format!("{ENV_PREFIX}_SETTER_PREFIX")) {
            config.setter_prefix = prefix;
        }
        if let Some(depth) = lookup(&format!("{ENV_PREFIX}_MAX_DEPTH")).and_then(|v| v.trim().parse().ok()) {
            config.max_depth = depth;
        }
        config
    }

    /// Parses a JSON document; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> crate::DiResult<Self> {
        serde_json::from_str(json).map_err(crate::DiError::custom)
    }
}
