//! Service providers for modular registration.
//!
//! A provider groups related registrations. The host drives it: `register`
//! first, then `boot` once every provider has registered. The container
//! never schedules or retries providers on its own.

use tracing::debug;

use crate::{Container, DiResult};

/// A unit of registration.
///
/// # Example
///
/// ```rust
/// use ferrous_autowire::{Container, ContainerModuleExt, DiResult, Resolver, ServiceProvider};
///
/// struct Settings { name: String }
///
/// struct SettingsProvider;
///
/// impl ServiceProvider for SettingsProvider {
///     fn register(&self, container: &mut Container) -> DiResult<()> {
///         container.add_instance(Settings { name: "app".into() })?;
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut container = Container::new();
/// container.add_provider(SettingsProvider)?;
/// assert_eq!(container.get::<Settings>()?.name, "app");
/// # Ok(())
/// # }
/// ```
pub trait ServiceProvider {
    /// Registers bindings, instances, tags and extensions.
    fn register(&self, container: &mut Container) -> DiResult<()>;

    /// Runs after registration; may resolve services.
    fn boot(&self, _container: &Container) -> DiResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Provider registration on [`Container`].
pub trait ContainerModuleExt {
    /// Registers then immediately boots `provider`.
    fn add_provider<P: ServiceProvider>(&mut self, provider: P) -> DiResult<&mut Self>;
}

impl ContainerModuleExt for Container {
    fn add_provider<P: ServiceProvider>(&mut self, provider: P) -> DiResult<&mut Self> {
        debug!(provider = provider.name(), "registering provider");
        provider.register(self)?;
        provider.boot(self)?;
        Ok(self)
    }
}

/// Registers every provider, then boots every provider, each exactly once
/// and in order. The first failure aborts.
pub fn bootstrap(container: &mut Container, providers: &[&dyn ServiceProvider]) -> DiResult<()> {
    for provider in providers {
        debug!(provider = provider.name(), "registering provider");
        provider.register(container)?;
    }
    for provider in providers {
        debug!(provider = provider.name(), "booting provider");
        provider.boot(container)?;
    }
    Ok(())
}
