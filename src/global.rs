//! Process-wide container for ambient registration.
//!
//! The container is created on first use and lives until the process exits.
//! Register every provider during initialization, before the first [`invoke`] or [`extract`] call:
//! providers that have already been used can't be replaced.

use alloc::sync::Arc;
use parking_lot::{const_mutex, Mutex};

use crate::{
    component::Component, dependency_resolver::DependencyResolver, errors::InstantiateErrorKind, instantiator::Invocable, Container,
    Instantiator, ProvideInfo, ProvideOptions, ResolveErrorKind,
};

static GLOBAL: Mutex<Option<Container>> = const_mutex(None);

/// The process-wide container.
#[must_use]
pub fn container() -> Container {
    GLOBAL.lock().get_or_insert_with(Container::new).clone()
}

/// See [`Container::provide_with_options`].
///
/// # Panics
/// Panics if the registration fails.
#[track_caller]
pub fn provide<Inst, Deps>(instantiator: Inst, options: ProvideOptions) -> ProvideInfo
where
    Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
    Inst::Provides: Send + Sync,
    Deps: DependencyResolver + 'static,
{
    match container().provide_with_options(instantiator, options) {
        Ok(info) => info,
        Err(err) => panic!("{err}"),
    }
}

/// See [`Container::supply_with_options`].
///
/// # Panics
/// Panics if the registration fails.
#[track_caller]
pub fn supply<T: Send + Sync + 'static>(value: T, options: ProvideOptions) -> ProvideInfo {
    match container().supply_with_options(value, options) {
        Ok(info) => info,
        Err(err) => panic!("{err}"),
    }
}

/// See [`Container::provide_component_with_options`].
///
/// # Panics
/// Panics if the registration fails.
#[track_caller]
pub fn provide_component<C: Component>(options: ProvideOptions) -> ProvideInfo {
    match container().provide_component_with_options::<C>(options) {
        Ok(info) => info,
        Err(err) => panic!("{err}"),
    }
}

/// See [`Container::invoke`].
///
/// # Errors
/// Returns the resolution error or [`ResolveErrorKind::InvokeFailed`] if the function fails.
#[track_caller]
pub fn invoke<F, Deps>(function: F) -> Result<F::Output, ResolveErrorKind>
where
    F: Invocable<Deps, Error = InstantiateErrorKind>,
    Deps: DependencyResolver,
{
    container().invoke(function)
}

/// See [`Container::extract`].
///
/// # Errors
/// See [`Container::extract`].
#[track_caller]
pub fn extract<T: ?Sized + Send + Sync + 'static>() -> Result<Arc<T>, ResolveErrorKind> {
    container().extract::<T>()
}
