use ferrous_autowire::{id_of, Container, DiError, ErrorKind, Resolver, ServiceId, TypeInfo};
use std::sync::Arc;

trait Report: Send + Sync {
    fn title(&self) -> &'static str;
}

#[derive(Default)]
struct Sales;
impl Report for Sales {
    fn title(&self) -> &'static str {
        "sales"
    }
}

#[derive(Default)]
struct Stock;
impl Report for Stock {
    fn title(&self) -> &'static str {
        "stock"
    }
}

fn numbers() -> Container {
    let mut container = Container::new();
    for (id, value) in [("one", 1u32), ("two", 2), ("three", 3), ("four", 4)] {
        container.factory(id, move |_, _| Ok(value)).unwrap();
    }
    container
}

fn ids(container: &Container, tag: &str) -> Vec<String> {
    container.tagged_ids(tag).iter().map(ToString::to_string).collect()
}

#[test]
fn test_merge_appends_unseen_ids() {
    let mut container = numbers();
    container.tag("numbers", ["one", "two"], true).unwrap();
    container.tag("numbers", ["two", "three"], true).unwrap();

    assert_eq!(ids(&container, "numbers"), ["one", "two", "three"]);
    let values: Vec<u32> = container
        .tagged::<u32>("numbers")
        .unwrap()
        .into_iter()
        .map(|v| *v)
        .collect();
    assert_eq!(values, [1, 2, 3]);
}

#[test]
fn test_replace_swaps_the_set() {
    let mut container = numbers();
    container.tag("numbers", ["one", "two"], true).unwrap();
    container.tag("numbers", ["four"], false).unwrap();

    assert_eq!(ids(&container, "numbers"), ["four"]);
}

#[test]
fn test_unknown_tag_resolves_to_nothing() {
    let container = numbers();
    assert!(container.resolve_tagged("missing").unwrap().is_empty());
    assert!(container.tagged_ids("missing").is_empty());
}

#[test]
fn test_empty_tag_name_is_rejected() {
    let mut container = numbers();
    let err = container.tag("", ["one"], true).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Container);
    assert!(container.tags().is_empty());
}

#[test]
fn test_empty_id_list_is_a_no_op() {
    let mut container = numbers();
    container.tag("numbers", Vec::<ServiceId>::new(), true).unwrap();
    assert!(container.tags().is_empty());
}

#[test]
fn test_tagging_unknown_id_fails_without_partial_update() {
    let mut container = numbers();
    let err = container.tag("numbers", ["one", "ghost"], true).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ServiceNotFound);
    assert_eq!(err.service().map(|s| s.as_str()), Some("ghost"));
    assert_eq!(err.context().get("tag").map(String::as_str), Some("numbers"));
    assert!(container.tagged_ids("numbers").is_empty());
}

#[test]
fn test_first_failure_aborts_tagged_resolution() {
    let mut container = numbers();
    container
        .factory("broken", |_, _| -> ferrous_autowire::DiResult<u32> { Err(DiError::msg("offline")) })
        .unwrap();
    container.tag("numbers", ["one", "broken", "two"], true).unwrap();

    let err = container.resolve_tagged("numbers").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert_eq!(err.service().map(|s| s.as_str()), Some("broken"));
}

#[test]
fn test_tagged_interfaces() {
    let mut container = Container::new();
    container.declare(TypeInfo::concrete::<Sales>().default_constructor().implements::<dyn Report>(|r| r));
    container.declare(TypeInfo::concrete::<Stock>().default_constructor().implements::<dyn Report>(|r| r));
    container
        .factory("report.stock", |_, _| Ok(Arc::new(Stock) as Arc<dyn Report>))
        .unwrap();
    container.tag("reports", ["report.stock"], true).unwrap();

    let titles: Vec<&str> = container
        .tagged_trait::<dyn Report>("reports")
        .unwrap()
        .iter()
        .map(|r| r.title())
        .collect();
    assert_eq!(titles, ["stock"]);

    // Concrete types can be tagged without a binding
    container.tag("concrete", [id_of::<Sales>(), id_of::<Stock>()], true).unwrap();
    assert_eq!(container.resolve_tagged("concrete").unwrap().len(), 2);
}

#[test]
fn test_untag_and_tag_listing() {
    let mut container = numbers();
    container.tag("odd", ["one", "three"], true).unwrap();
    container.tag("even", ["two", "four"], true).unwrap();
    assert_eq!(container.tags(), ["even", "odd"]);

    container.untag("odd", ["one"]);
    assert_eq!(ids(&container, "odd"), ["three"]);

    container.untag("even", ["two", "four"]);
    assert_eq!(container.tags(), ["odd"]);
}

#[test]
fn test_unbind_keeps_tag_membership() {
    let mut container = numbers();
    container.tag("numbers", ["one", "two"], true).unwrap();
    container.unbind("two").unwrap();

    assert_eq!(ids(&container, "numbers"), ["one", "two"]);
    let err = container.resolve_tagged("numbers").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceNotFound);
}
