use ferrous_autowire::{
    id_of, Arguments, Container, ContainerConfig, DiError, ErrorKind, Implementation, Method, Parameter, Property,
    Resolver, TypeInfo,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

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

#[derive(Default)]
struct Mailer;

#[derive(Default)]
struct Newsletter {
    logger: OnceLock<Arc<dyn Logger>>,
    mailer: OnceLock<Arc<Mailer>>,
    events: Mutex<Vec<&'static str>>,
}

fn base_container() -> Container {
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
    container.declare(TypeInfo::concrete::<Mailer>().default_constructor());
    container
        .singleton(id_of::<dyn Logger>(), Implementation::of::<ConsoleLogger>())
        .unwrap();
    container
}

fn logger_property() -> Property {
    Property::of_trait("logger", |s: &Newsletter, logger: Arc<dyn Logger>| {
        s.events.lock().unwrap().push("logger");
        let _ = s.logger.set(logger);
    })
}

fn mailer_setter(name: &'static str) -> Method {
    Method::new(name, |s: &Newsletter, args: &Arguments| {
        s.events.lock().unwrap().push("mailer");
        let _ = s.mailer.set(args.get::<Mailer>("mailer")?);
        Ok(())
    })
    .param(Parameter::service::<Mailer>("mailer"))
}

fn never(name: &'static str) -> Method {
    Method::new(name, |_: &Newsletter, _: &Arguments| Err(DiError::msg("must not be invoked")))
}

#[test]
fn test_property_injection() {
    let mut container = base_container();
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .property(logger_property()),
    );

    let newsletter = container.get::<Newsletter>().unwrap();
    let logger = newsletter.logger.get().unwrap();
    assert_eq!(logger.name(), "console");
    assert!(Arc::ptr_eq(logger, &container.get_trait::<dyn Logger>().unwrap()));
}

#[test]
fn test_explicit_property_override_is_coerced_to_declared_type() {
    let mut container = base_container();
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .property(logger_property().inject(id_of::<FileLogger>())),
    );

    let newsletter = container.get::<Newsletter>().unwrap();
    assert_eq!(newsletter.logger.get().unwrap().name(), "file");
}

#[test]
fn test_untyped_property_without_override_fails() {
    let mut container = base_container();
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .property(Property::untyped("anything", |_: &Newsletter, _| Ok(()))),
    );

    let err = container.get::<Newsletter>().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Injection);
    assert_eq!(err.context().get("reason").map(String::as_str), Some("no type"));
    assert_eq!(err.context().get("property").map(String::as_str), Some("anything"));
}

#[test]
fn test_private_property_fails() {
    let mut container = base_container();
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .property(logger_property().private()),
    );

    let err = container.get::<Newsletter>().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Injection);
    assert_eq!(err.context().get("reason").map(String::as_str), Some("not public"));
}

#[test]
fn test_failing_property_writer_is_injection_error() {
    let mut container = base_container();
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .property(
                Property::untyped("raw", |_: &Newsletter, _| Err(DiError::msg("read-only")))
                    .inject(id_of::<Mailer>()),
            ),
    );

    let err = container.get::<Newsletter>().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Injection);
    assert_eq!(err.cause().map(|c| c.message()), Some("read-only"));
}

#[test]
fn test_setter_injection_runs_after_properties() {
    let mut container = base_container();
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .method(mailer_setter("set_mailer"))
            .property(logger_property()),
    );

    let newsletter = container.get::<Newsletter>().unwrap();
    assert!(newsletter.mailer.get().is_some());
    assert_eq!(*newsletter.events.lock().unwrap(), ["logger", "mailer"]);
}

#[test]
fn test_non_injectable_methods_are_skipped() {
    let mut container = base_container();
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .method(never("configure").param(Parameter::service::<Mailer>("mailer")))
            .method(never("set_hidden").param(Parameter::service::<Mailer>("mailer")).private())
            .method(never("set_limit").param(Parameter::builtin("limit", "int")))
            .method(never("set_untyped").param(Parameter::untyped("value")))
            .method(
                never("set_pair")
                    .param(Parameter::service::<Mailer>("a"))
                    .param(Parameter::service::<Mailer>("b")),
            )
            .method(never("set_nothing")),
    );

    assert!(container.get::<Newsletter>().is_ok());
}

#[test]
fn test_optional_setter_with_unknown_dependency_is_skipped() {
    let mut container = base_container();
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .method(never("set_metrics").param(Parameter::service_id("metrics", "metrics").nullable())),
    );
    assert!(container.get::<Newsletter>().is_ok());

    // Required setter dependencies surface "not found" unchanged
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .method(never("set_metrics").param(Parameter::service_id("metrics", "metrics"))),
    );
    let err = container.get::<Newsletter>().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ServiceNotFound);
    assert_eq!(err.service().map(|s| s.as_str()), Some("metrics"));
}

#[test]
fn test_custom_setter_prefix() {
    let mut container = Container::with_config(ContainerConfig::default().with_setter_prefix("with_"));
    container.declare(TypeInfo::concrete::<Mailer>().default_constructor());
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .method(never("set_mailer").param(Parameter::service::<Mailer>("mailer")))
            .method(mailer_setter("with_mailer")),
    );

    let newsletter = container.get::<Newsletter>().unwrap();
    assert!(newsletter.mailer.get().is_some());
}

#[test]
fn test_failing_setter_is_injection_error() {
    let mut container = base_container();
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .method(never("set_mailer").param(Parameter::service::<Mailer>("mailer"))),
    );

    let err = container.get::<Newsletter>().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Injection);
    assert!(err.message().contains("set_mailer"));
    assert_eq!(err.cause().map(|c| c.kind()), Some(ErrorKind::Container));
}

#[test]
fn test_contextual_override_applies_to_properties() {
    let mut container = base_container();
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .property(logger_property()),
    );
    container
        .when(id_of::<Newsletter>())
        .needs(id_of::<dyn Logger>())
        .give(Implementation::of::<FileLogger>())
        .unwrap();

    let newsletter = container.get::<Newsletter>().unwrap();
    assert_eq!(newsletter.logger.get().unwrap().name(), "file");
    assert_eq!(container.get_trait::<dyn Logger>().unwrap().name(), "console");
}

#[test]
fn test_failed_injection_is_not_cached() {
    struct Missing;

    let mut container = base_container();
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .property(Property::new("missing", |_: &Newsletter, _: Arc<Missing>| {})),
    );
    container.singleton_type::<Newsletter>().unwrap();

    let err = container.get::<Newsletter>().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ServiceNotFound);
    assert!(!container.is_resolved(id_of::<Newsletter>()));

    container.add_instance(Missing).unwrap();
    assert!(container.get::<Newsletter>().is_ok());
    assert!(container.is_resolved(id_of::<Newsletter>()));
}

#[test]
fn test_failed_injection_drops_shared_instances_cached_on_the_way() {
    #[derive(Default)]
    struct Account {
        profile: OnceLock<Arc<Profile>>,
        quota: OnceLock<Arc<u8>>,
    }
    #[derive(Default)]
    struct Profile {
        account: OnceLock<Arc<Account>>,
    }

    let mut container = Container::new();
    container.declare(
        TypeInfo::concrete::<Account>()
            .default_constructor()
            .property(Property::new("profile", |s: &Account, profile: Arc<Profile>| {
                let _ = s.profile.set(profile);
            }))
            .property(Property::new("quota", |s: &Account, quota: Arc<u8>| {
                let _ = s.quota.set(quota);
            })),
    );
    container.declare(
        TypeInfo::concrete::<Profile>()
            .default_constructor()
            .property(Property::new("account", |s: &Profile, account: Arc<Account>| {
                let _ = s.account.set(account);
            })),
    );
    container.singleton_type::<Account>().unwrap();
    container.singleton_type::<Profile>().unwrap();

    // Profile is fully built against the first Account before quota fails
    let err = container.get::<Account>().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ServiceNotFound);
    assert!(!container.is_resolved(id_of::<Account>()));
    assert!(!container.is_resolved(id_of::<Profile>()));
    assert!(container.resolution_chain().is_empty());

    container.add_instance(7u8).unwrap();
    let account = container.get::<Account>().unwrap();
    let profile = container.get::<Profile>().unwrap();
    assert!(Arc::ptr_eq(account.profile.get().unwrap(), &profile));
    assert!(Arc::ptr_eq(profile.account.get().unwrap(), &account));
    assert_eq!(**account.quota.get().unwrap(), 7);
}

#[test]
fn test_alias_does_not_inject_twice() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();

    let mut container = base_container();
    container.declare(
        TypeInfo::concrete::<Newsletter>()
            .default_constructor()
            .method(
                Method::new("set_mailer", move |_: &Newsletter, _: &Arguments| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .param(Parameter::service::<Mailer>("mailer")),
            ),
    );
    container.singleton_type::<Newsletter>().unwrap();
    container.singleton("newsletter", Implementation::of::<Newsletter>()).unwrap();

    let via_alias = container.get_named::<Newsletter>("newsletter").unwrap();
    let direct = container.get::<Newsletter>().unwrap();
    assert!(Arc::ptr_eq(&via_alias, &direct));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
