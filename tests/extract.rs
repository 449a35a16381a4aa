#![allow(dead_code)]

use entwine::{
    name, quick_panic, Component, Container, Dependency, FieldValues, Group, Inject, InstantiateErrorKind, Key, Named, ProvideOptions,
    ResolveErrorKind,
};
use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

name!(Primary = "primary");
name!(Plugins = "plugins");

#[derive(Debug)]
struct Biz {
    a: Arc<i32>,
    c: Vec<Arc<String>>,
}

impl Component for Biz {
    fn fields() -> Vec<Dependency> {
        vec![Dependency::named::<i32>("a"), Dependency::grouped::<String>("c")]
    }

    fn assemble(values: &mut FieldValues) -> Result<Self, InstantiateErrorKind> {
        Ok(Self {
            a: values.take(0)?,
            c: values.take_group(1)?,
        })
    }
}

#[test]
fn test_missing_component_field() {
    let container = Container::new();
    container.provide_component::<Biz>().unwrap();

    let err = container.extract::<Biz>().unwrap_err();

    assert!(matches!(err, ResolveErrorKind::ArgumentsFailed { .. }));
    assert!(matches!(
        err.root_cause(),
        ResolveErrorKind::MissingDependency { key, requested_by: Some(_) } if *key == Key::named::<i32>("a")
    ));
    assert!(err.to_string().contains("Missing dependency i32[name=\"a\"]"));
}

#[test]
fn test_component_fields() {
    let container = Container::new();
    container.provide_component::<Biz>().unwrap();
    container.supply_with_options(1i32, ProvideOptions::new().name("a")).unwrap();
    container.supply_with_options(String::from("x"), ProvideOptions::new().group("c")).unwrap();
    container.supply_with_options(String::from("y"), ProvideOptions::new().group("c")).unwrap();

    let biz = container.extract::<Biz>().unwrap();

    assert_eq!(*biz.a, 1);
    assert_eq!(biz.c.iter().map(|value| value.as_str()).collect::<Vec<_>>(), ["x", "y"]);
}

#[test]
fn test_extract_is_idempotent() {
    let call_count = Arc::new(AtomicU8::new(0));

    let container = Container::new();
    container
        .provide({
            let call_count = call_count.clone();
            move || {
                call_count.fetch_add(1, Ordering::SeqCst);
                Ok(String::from("value"))
            }
        })
        .unwrap();

    let values = (0..5).map(|_| container.extract::<String>().unwrap()).collect::<Vec<_>>();

    assert!(values.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert_eq!(call_count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_named_and_group_parameters() {
    let container = Container::new();
    container.supply_with_options(8080u16, ProvideOptions::new().name("primary")).unwrap();
    container.supply_with_options(String::from("auth"), ProvideOptions::new().group("plugins")).unwrap();
    container.supply_with_options(String::from("cache"), ProvideOptions::new().group("plugins")).unwrap();

    let description = container
        .invoke(
            |Named(port, _): Named<u16, Primary>, Group(plugins, _): Group<String, Plugins>, missing: Option<Inject<u8>>| {
                assert!(missing.is_none());
                Ok(format!("{port}: {}", plugins.iter().map(|plugin| plugin.as_str()).collect::<Vec<_>>().join(", ")))
            },
        )
        .unwrap();

    assert_eq!(description, "8080: auth, cache");
    assert_eq!(container.extract_by_group::<String>("plugins").unwrap().len(), 2);
}

#[test]
#[should_panic(expected = "[1]: Cannot provide i32")]
fn test_quick_panic() {
    let container = Container::new();
    quick_panic!(container.supply(1i32), container.supply(2i32));
}
