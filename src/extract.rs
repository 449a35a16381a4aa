use alloc::{borrow::Cow, sync::Arc, vec::Vec};
use core::panic::Location;
use tracing::{error, info_span};

use crate::{
    any::Instance,
    inject::downcast,
    key::Key,
    Container, ResolveErrorKind,
};

pub(crate) enum Resolved {
    Single(Instance),
    Group(Vec<Instance>),
}

impl Container {
    /// Resolves the key and fills the deferred fields reachable from it.
    /// Resolution errors are annotated with `location`.
    pub(crate) fn extract_instance(&self, key: &Key, location: &'static Location<'static>) -> Result<Resolved, ResolveErrorKind> {
        let resolved = if key.is_group() {
            self.resolve_group(key).map(Resolved::Group)
        } else {
            self.resolve_single(key).map(Resolved::Single)
        };
        let resolved = resolved.map_err(|err| err.with_caller(location))?;

        self.inject_with_caller(key, location)?;
        Ok(resolved)
    }

    /// Fills the deferred fields reachable from the key, annotating a failure with `location`.
    pub(crate) fn inject_with_caller(&self, key: &Key, location: &'static Location<'static>) -> Result<(), ResolveErrorKind> {
        self.inject_properties(key).map_err(|err| err.with_caller(location))
    }

    #[track_caller]
    fn extract_single<T: ?Sized + Send + Sync + 'static>(&self, key: &Key) -> Result<Arc<T>, ResolveErrorKind> {
        let location = Location::caller();
        let span = info_span!("extract", %key, %location);
        let _guard = span.enter();

        let instance = self
            .resolve_single(key)
            .map_err(|err| err.with_caller(location))
            .and_then(|instance| self.inject_with_caller(key, location).map(|()| instance))
            .inspect_err(|err| error!("{}", err))?;
        downcast(&instance)
    }

    /// Value of the default slot of `T`.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::MissingDependency`] with the caller location if `T` isn't provided,
    /// other errors are wrapped into [`ResolveErrorKind::ArgumentsFailed`] with the caller location.
    #[track_caller]
    pub fn extract<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.extract_single(&Key::of::<T>())
    }

    /// Value of the slot of `T` with the name.
    ///
    /// # Errors
    /// See [`Self::extract`].
    #[track_caller]
    pub fn extract_by_name<T: ?Sized + Send + Sync + 'static>(&self, name: impl Into<Cow<'static, str>>) -> Result<Arc<T>, ResolveErrorKind> {
        self.extract_single(&Key::named::<T>(name))
    }

    /// Members of the value group of `T`, in registration order. An empty group isn't an error.
    ///
    /// # Errors
    /// See [`Self::extract`].
    #[track_caller]
    pub fn extract_by_group<T: ?Sized + Send + Sync + 'static>(&self, group: impl Into<Cow<'static, str>>) -> Result<Vec<Arc<T>>, ResolveErrorKind> {
        let key = Key::grouped::<T>(group);
        let location = Location::caller();
        let span = info_span!("extract", %key, %location);
        let _guard = span.enter();

        let members = self
            .resolve_group(&key)
            .map_err(|err| err.with_caller(location))
            .and_then(|members| self.inject_with_caller(&key, location).map(|()| members))
            .inspect_err(|err| error!("{}", err))?;
        members.iter().map(downcast::<T>).collect()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use crate::{errors::ResolveErrorKind, inject::Inject, key::Key, options::ProvideOptions, Container};

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
    };
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
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

        let first = container.extract::<String>().unwrap();
        let second = container.extract::<String>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_extract_by_name() {
        let container = Container::new();
        container.supply_with_options(1i32, ProvideOptions::new().name("a")).unwrap();
        container.supply(2i32).unwrap();

        assert_eq!(*container.extract_by_name::<i32>("a").unwrap(), 1);
        assert_eq!(*container.extract::<i32>().unwrap(), 2);
        assert!(container.extract_by_name::<i32>("b").unwrap_err().is_missing_dependency());
    }

    #[test]
    #[traced_test]
    fn test_extract_annotates_caller() {
        let container = Container::new();
        container.provide(|Inject(value): Inject<u8>| Ok(i32::from(*value))).unwrap();

        let expected_line = line!() + 1;
        let err = container.extract::<i32>().unwrap_err();

        let ResolveErrorKind::ArgumentsFailed { location, source } = &err else {
            panic!("arguments should fail");
        };
        assert_eq!(location.line(), expected_line);
        assert_eq!(location.file(), file!());
        assert!(matches!(&**source, ResolveErrorKind::ArgumentsFailed { .. }));
        assert!(matches!(err.root_cause(), ResolveErrorKind::MissingDependency { key, .. } if *key == Key::of::<u8>()));
    }
}
