// Unit tests for DiError and DiResult

use ferrous_autowire::{DiError, DiResult, ErrorKind, ServiceId};
use std::error::Error;

#[test]
fn test_error_display_not_found() {
    let err = DiError::not_found(&"TestService".into());
    assert_eq!(err.to_string(), "service not found: TestService");
    assert_eq!(err.kind(), ErrorKind::ServiceNotFound);
    assert_eq!(err.service().map(ServiceId::as_str), Some("TestService"));
}

#[test]
fn test_error_display_already_bound() {
    let err = DiError::already_bound(&"db".into());
    assert_eq!(err.to_string(), "service already bound: db");
    assert!(err.is(ErrorKind::ServiceAlreadyBound));
    assert!(!err.is(ErrorKind::Binding));
}

#[test]
fn test_error_display_circular() {
    let chain: Vec<ServiceId> = vec!["ServiceA".into(), "ServiceB".into(), "ServiceA".into()];
    let err = DiError::circular(chain);
    assert_eq!(err.to_string(), "circular dependency: ServiceA -> ServiceB -> ServiceA");
    assert_eq!(err.service().map(ServiceId::as_str), Some("ServiceA"));
    assert_eq!(err.chain().len(), 3);
    assert_eq!(err.cycle().len(), 3);
}

#[test]
fn test_cycle_of_non_circular_error_is_whole_chain() {
    let err = DiError::msg("boom");
    assert!(err.cycle().is_empty());
    assert!(err.chain().is_empty());
}

#[test]
fn test_described_errors_carry_reason() {
    let id = ServiceId::from("Mailer");
    let cases = [
        (DiError::autowiring(&id, "builtin"), ErrorKind::Autowiring, "autowiring error"),
        (DiError::instantiation(&id, "abstract"), ErrorKind::Instantiation, "instantiation error"),
        (DiError::injection(&id, "no type"), ErrorKind::Injection, "injection error"),
        (DiError::binding(&id, "not constructible"), ErrorKind::Binding, "binding error"),
        (DiError::resolution(&id, "factory failed"), ErrorKind::Resolution, "resolution error"),
    ];

    for (err, kind, label) in cases {
        assert_eq!(err.kind(), kind);
        assert!(err.to_string().starts_with(label));
        assert!(err.message().starts_with("Mailer: "));
        assert_eq!(err.service(), Some(&id));
        assert!(err.context().contains_key("reason"));
    }
}

#[test]
fn test_custom_error_keeps_source() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml");
    let err = DiError::custom(io);
    assert_eq!(err.kind(), ErrorKind::Container);
    assert_eq!(err.message(), "config.toml");
    assert!(err.source().is_some());
    // Foreign sources are not container errors
    assert!(err.cause().is_none());
}

#[test]
fn test_context_and_source_builders() {
    let err = DiError::new(ErrorKind::Resolution, "failed")
        .with_service(&"svc".into())
        .with_context("attempt", "2")
        .with_context("attempt", "3")
        .with_source(std::fmt::Error);

    assert_eq!(err.context().get("attempt").map(String::as_str), Some("3"));
    assert_eq!(err.context().len(), 1);
    assert!(err.source().is_some());
    assert_eq!(err.service().map(ServiceId::as_str), Some("svc"));
}

#[test]
fn test_kind_labels_and_rewrapped_kinds() {
    assert_eq!(ErrorKind::Container.to_string(), "container error");
    assert!(ErrorKind::Container.is_rewrapped());
    assert!(!ErrorKind::ServiceNotFound.is_rewrapped());
    assert!(!ErrorKind::CircularDependency.is_rewrapped());
    assert!(!ErrorKind::Autowiring.is_rewrapped());
}

#[test]
fn test_di_result_with_question_mark() {
    fn inner(fail: bool) -> DiResult<u8> {
        if fail {
            Err(DiError::msg("inner failed"))
        } else {
            Ok(1)
        }
    }

    fn outer(fail: bool) -> DiResult<u8> {
        Ok(inner(fail)? + 1)
    }

    assert_eq!(outer(false).unwrap(), 2);
    assert_eq!(outer(true).unwrap_err().message(), "inner failed");
}
