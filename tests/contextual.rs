use ferrous_autowire::{id_of, Container, DiError, ErrorKind, Implementation, Parameter, Resolver, TypeInfo};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Logger: Send + Sync {
    fn name(&self) -> &'static str;
}

#[derive(Default)]
struct ConsoleLogger;
impl Logger for ConsoleLogger {
    fn name(&self) -> &'static str {
        "console"
    }
}

#[derive(Default)]
struct FileLogger;
impl Logger for FileLogger {
    fn name(&self) -> &'static str {
        "file"
    }
}

struct NullLogger;
impl Logger for NullLogger {
    fn name(&self) -> &'static str {
        "null"
    }
}

struct Reports {
    logger: Arc<dyn Logger>,
}

struct Billing {
    logger: Arc<dyn Logger>,
}

/// Depends on `Reports`, never on a logger directly.
struct Dashboard {
    reports: Arc<Reports>,
}

fn consumer<T: Send + Sync + 'static>(build: fn(Arc<dyn Logger>) -> T) -> TypeInfo {
    TypeInfo::concrete::<T>()
        .param(Parameter::service::<dyn Logger>("logger"))
        .constructor(move |args| Ok(build(args.get_trait("logger")?)))
        .into()
}

fn logging_container() -> Container {
    let mut container = Container::new();
    container.declare(
        TypeInfo::concrete::<ConsoleLogger>()
            .default_constructor()
            .implements::<dyn Logger>(|l| l),
    );
    container.declare(
        TypeInfo::concrete::<FileLogger>()
            .default_constructor()
            .implements::<dyn Logger>(|l| l),
    );
    container.declare(consumer(|logger| Reports { logger }));
    container.declare(consumer(|logger| Billing { logger }));
    container.declare(
        TypeInfo::concrete::<Dashboard>()
            .param(Parameter::service::<Reports>("reports"))
            .constructor(|args| Ok(Dashboard { reports: args.get("reports")? })),
    );
    container
        .singleton(id_of::<dyn Logger>(), Implementation::of::<ConsoleLogger>())
        .unwrap();
    container
}

#[test]
fn test_override_applies_only_to_its_consumer() {
    let mut container = logging_container();
    container
        .when(id_of::<Reports>())
        .needs(id_of::<dyn Logger>())
        .give(Implementation::of::<FileLogger>())
        .unwrap();

    assert_eq!(container.get::<Reports>().unwrap().logger.name(), "file");
    assert_eq!(container.get::<Billing>().unwrap().logger.name(), "console");
    assert_eq!(container.get_trait::<dyn Logger>().unwrap().name(), "console");
    assert!(container.has_contextual_binding(id_of::<Reports>(), id_of::<dyn Logger>()));
}

#[test]
fn test_overrides_are_not_transitive() {
    let mut container = logging_container();
    container
        .when(id_of::<Dashboard>())
        .needs(id_of::<dyn Logger>())
        .give(Implementation::of::<FileLogger>())
        .unwrap();

    // Dashboard has no logger parameter; Reports is built with the default
    let dashboard = container.get::<Dashboard>().unwrap();
    assert_eq!(dashboard.reports.logger.name(), "console");
}

#[test]
fn test_when_any_registers_every_consumer() {
    let mut container = logging_container();
    container
        .when_any([id_of::<Reports>(), id_of::<Billing>()])
        .needs(id_of::<dyn Logger>())
        .give(Implementation::of::<FileLogger>())
        .unwrap();

    assert_eq!(container.get::<Reports>().unwrap().logger.name(), "file");
    assert_eq!(container.get::<Billing>().unwrap().logger.name(), "file");
}

#[test]
fn test_factory_override_runs_on_every_use() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();

    let mut container = logging_container();
    container
        .when(id_of::<Reports>())
        .needs(id_of::<dyn Logger>())
        .give_factory(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullLogger) as Arc<dyn Logger>)
        })
        .unwrap();

    assert_eq!(container.get::<Reports>().unwrap().logger.name(), "null");
    assert_eq!(container.get::<Reports>().unwrap().logger.name(), "null");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(container.resolution_chain().is_empty());
}

#[test]
fn test_give_value() {
    let logger: Arc<dyn Logger> = Arc::new(NullLogger);
    let mut container = logging_container();
    container
        .when(id_of::<Billing>())
        .needs(id_of::<dyn Logger>())
        .give_value(Arc::new(logger.clone()))
        .unwrap();

    let billing = container.get::<Billing>().unwrap();
    assert!(Arc::ptr_eq(&billing.logger, &logger));
}

#[test]
fn test_failing_override_does_not_fall_back() {
    let mut container = Container::new();
    container.declare(
        TypeInfo::concrete::<Reports>()
            .param(Parameter::service::<dyn Logger>("logger").nullable())
            .constructor(|args| {
                Ok(Reports {
                    logger: args
                        .optional_trait("logger")?
                        .unwrap_or_else(|| Arc::new(NullLogger) as Arc<dyn Logger>),
                })
            }),
    );
    container
        .when(id_of::<Reports>())
        .needs(id_of::<dyn Logger>())
        .give_factory(|_, _| -> ferrous_autowire::DiResult<Arc<dyn Logger>> { Err(DiError::msg("disk full")) })
        .unwrap();

    let err = container.get::<Reports>().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Autowiring);
    assert_eq!(err.cause().map(|c| c.message()), Some("disk full"));
}

#[test]
fn test_forget_when() {
    let mut container = logging_container();
    container
        .when(id_of::<Reports>())
        .needs(id_of::<dyn Logger>())
        .give(Implementation::of::<FileLogger>())
        .unwrap();

    container.forget_when(id_of::<Reports>(), Some(id_of::<dyn Logger>()));
    assert!(!container.has_contextual_binding(id_of::<Reports>(), id_of::<dyn Logger>()));
    assert_eq!(container.get::<Reports>().unwrap().logger.name(), "console");

    container
        .when(id_of::<Reports>())
        .needs(id_of::<dyn Logger>())
        .give(Implementation::of::<FileLogger>())
        .unwrap();
    container.forget_when(id_of::<Reports>(), None);
    assert_eq!(container.get::<Reports>().unwrap().logger.name(), "console");
}

#[test]
fn test_unbind_purges_reference_overrides() {
    let mut container = logging_container();
    container.singleton("logger.file", Implementation::of::<FileLogger>()).unwrap();
    container
        .when(id_of::<Reports>())
        .needs(id_of::<dyn Logger>())
        .give(Implementation::named("logger.file"))
        .unwrap();
    assert!(container.has_contextual_binding(id_of::<Reports>(), id_of::<dyn Logger>()));

    container.unbind("logger.file").unwrap();
    assert!(!container.has_contextual_binding(id_of::<Reports>(), id_of::<dyn Logger>()));
    assert_eq!(container.get::<Reports>().unwrap().logger.name(), "console");
}

#[test]
fn test_give_without_needs_is_binding_error() {
    let mut container = logging_container();
    let err = container
        .when(id_of::<Reports>())
        .give(Implementation::of::<FileLogger>())
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Binding);
}

#[test]
fn test_unknown_target_is_binding_error() {
    let mut container = logging_container();
    let err = container
        .when(id_of::<Reports>())
        .needs(id_of::<dyn Logger>())
        .give(Implementation::named("logger.nowhere"))
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Binding);
    assert_eq!(err.context().get("target").map(String::as_str), Some("logger.nowhere"));
    assert!(!container.has_contextual_binding(id_of::<Reports>(), id_of::<dyn Logger>()));
}
