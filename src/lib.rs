//! # ferrous-autowire
//!
//! Inversion-of-control container that builds fully wired object graphs on
//! demand. Dependencies are resolved from declared type metadata: constructor
//! parameters, injectable properties and setter methods.
//!
//! ## Features
//!
//! - **Bindings**: shared (singleton) or transient, by type reference or factory
//! - **Autowiring**: unbound concrete types are built from their declaration
//! - **Contextual overrides**: a different implementation per consuming type
//! - **Tags and extensions**: grouped resolution and post-construction decoration
//! - **Circular dependency detection**: with the full dependency chain in the error
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_autowire::{Container, Parameter, Resolver, TypeInfo};
//! use std::sync::Arc;
//!
//! struct Database {
//!     dsn: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut container = Container::new();
//! container.declare(
//!     TypeInfo::concrete::<Database>()
//!         .param(Parameter::builtin("dsn", "string").with_default(|| "postgres://localhost".to_string()))
//!         .constructor(|args| Ok(Database { dsn: args.value("dsn")? })),
//! );
//! container.declare(
//!     TypeInfo::concrete::<UserService>()
//!         .param(Parameter::service::<Database>("db"))
//!         .constructor(|args| Ok(UserService { db: args.get("db")? })),
//! );
//! container.singleton_type::<Database>().unwrap();
//!
//! let users = container.get::<UserService>().unwrap();
//! assert_eq!(users.db.dsn, "postgres://localhost");
//! assert!(Arc::ptr_eq(&users.db, &container.get::<Database>().unwrap()));
//! ```
//!
//! ## Contextual Bindings
//!
//! ```rust
//! use ferrous_autowire::{id_of, Container, Implementation, Parameter, Resolver, TypeInfo};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync { fn kind(&self) -> &'static str; }
//! #[derive(Default)]
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger { fn kind(&self) -> &'static str { "console" } }
//! #[derive(Default)]
//! struct FileLogger;
//! impl Logger for FileLogger { fn kind(&self) -> &'static str { "file" } }
//!
//! struct Reports { logger: Arc<dyn Logger> }
//!
//! let mut container = Container::new();
//! container.declare(TypeInfo::concrete::<ConsoleLogger>().default_constructor().implements::<dyn Logger>(|l| l));
//! container.declare(TypeInfo::concrete::<FileLogger>().default_constructor().implements::<dyn Logger>(|l| l));
//! container.declare(
//!     TypeInfo::concrete::<Reports>()
//!         .param(Parameter::service::<dyn Logger>("logger"))
//!         .constructor(|args| Ok(Reports { logger: args.get_trait("logger")? })),
//! );
//! container.singleton(id_of::<dyn Logger>(), Implementation::of::<ConsoleLogger>()).unwrap();
//! container
//!     .when(id_of::<Reports>())
//!     .needs(id_of::<dyn Logger>())
//!     .give(Implementation::of::<FileLogger>())
//!     .unwrap();
//!
//! assert_eq!(container.get::<Reports>().unwrap().logger.kind(), "file");
//! assert_eq!(container.get_trait::<dyn Logger>().unwrap().kind(), "console");
//! ```
//!
//! ## Thread safety
//!
//! Container instances are not thread-safe; confine a container to one
//! logical execution context or guard it externally. Resolved objects are
//! `Arc<dyn Any + Send + Sync>` and can be shared across threads.

pub mod config;
pub mod container;
pub mod contextual;
pub mod decoration;
pub mod descriptors;
pub mod error;
pub mod introspection;
pub mod key;
pub mod lifetime;
pub mod module_system;
pub mod observer;
pub mod params;
pub mod registration;
pub mod traits;

// Internal modules
mod internal;
mod tags;

pub use config::ContainerConfig;
pub use container::Container;
pub use contextual::ContextualBindingBuilder;
pub use decoration::{Extension, ServiceDecorator, TraitDecorator};
pub use descriptors::{BindingDescriptor, BindingSource};
pub use error::{BoxError, DiError, DiResult, ErrorContext, ErrorKind};
pub use introspection::{
    classify, Classification, Declaration, Method, ParamType, Parameter, Property, TypeInfo, TypeKind,
};
pub use key::{id_of, ServiceId};
pub use lifetime::Lifetime;
pub use module_system::{bootstrap, ContainerModuleExt, ServiceProvider};
pub use observer::{ResolutionObserver, TracingObserver};
pub use params::{AnyArc, Arguments, Params};
pub use registration::{Factory, Implementation};
pub use traits::{Resolver, ResolverCore};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counter(u32);

    #[test]
    fn singleton_factory_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let mut container = Container::new();
        container
            .singleton_factory(id_of::<Counter>(), move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(Counter(1))
            })
            .unwrap();

        let a = container.get::<Counter>().unwrap();
        let b = container.get::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transient_factory_runs_every_time() {
        let mut container = Container::new();
        container.factory(id_of::<Counter>(), |_, _| Ok(Counter(2))).unwrap();

        let a = container.get::<Counter>().unwrap();
        let b = container.get::<Counter>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn container_id_is_reserved() {
        let mut container = Container::new();
        assert!(container.has(Container::self_id()));
        assert!(container.has_binding(Container::self_id()));

        let err = container.factory(Container::self_id(), |_, _| Ok(1u8)).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Binding);

        let err = container.resolve(Container::self_id()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);

        container.reset();
        assert!(container.has_binding(Container::self_id()));
    }

    #[test]
    fn resolution_stack_is_idle_after_failure() {
        let mut container = Container::new();
        container
            .factory("broken", |c, _| c.resolve("missing").map(|_| ()))
            .unwrap();

        assert!(container.resolve("broken").is_err());
        assert!(container.resolution_chain().is_empty());
    }
}
