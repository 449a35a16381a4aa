use alloc::{boxed::Box, sync::Arc, vec, vec::Vec};
use core::panic::Location;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, error, info_span};

use crate::{
    any::{Instance, TypeInfo},
    component::{boxed_component, injector, Component},
    config::Config,
    dependency_resolver::DependencyResolver,
    errors::{CyclePath, InstantiateErrorKind, InstantiatorErrorKind, ProvideErrorKind, ResolveErrorKind},
    instantiator::{boxed_instantiator, boxed_outputs_instantiator, boxed_value, Instantiator, Invocable, Outputs},
    key::{Dependency, Key},
    options::ProvideOptions,
    pipeline,
    registry::{ProvideInfo, ProviderId, Registration, Registry},
};

/// Provider being constructed by the current resolution.
struct Frame {
    key: Key,
    id: ProviderId,
    location: &'static Location<'static>,
}

pub(crate) struct State {
    pub(crate) registry: Registry,
    resolving: Vec<Frame>,
}

pub(crate) struct ContainerInner {
    state: Mutex<State>,
    config: Config,
}

/// Registry of providers and the values they built.
///
/// Cloned containers share the same providers and values.
///
/// # Notes
/// Registration and resolution are synchronous, the state lock isn't held while a constructor runs,
/// so constructors may use the container too.
/// Resolutions from several threads must be serialized by the caller:
/// the set of providers being constructed is shared by the container.
/// The recommended usage is to register every provider first and resolve values after that.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    #[inline]
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                state: Mutex::new(State {
                    registry: Registry::new(),
                    resolving: Vec::new(),
                }),
                config,
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> Config {
        self.inner.config
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Registers a constructor of a single value.
    ///
    /// The constructor runs at most once, the first time its value is requested.
    ///
    /// # Errors
    /// Returns [`ProvideErrorKind::Conflict`] if the value is already provided
    /// and [`ProvideErrorKind::CycleDetected`] if the constructor introduces a dependency cycle.
    #[track_caller]
    pub fn provide<Inst, Deps>(&self, instantiator: Inst) -> Result<ProvideInfo, ProvideErrorKind>
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver + 'static,
    {
        self.provide_with_options(instantiator, ProvideOptions::new())
    }

    /// # Errors
    /// See [`Self::provide`] and [`ProvideOptions`].
    #[track_caller]
    pub fn provide_with_options<Inst, Deps>(&self, instantiator: Inst, options: ProvideOptions) -> Result<ProvideInfo, ProvideErrorKind>
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver + 'static,
    {
        let registration = Registration {
            constructor: boxed_instantiator(instantiator),
            dependencies: dependencies::<Deps>(),
            output_types: vec![TypeInfo::of::<Inst::Provides>()],
            injector: None,
            location: Location::caller(),
        };
        self.register(registration, options)
    }

    /// Registers a constructor returning several values as a tuple.
    /// Every element is bound to its own key.
    ///
    /// # Errors
    /// See [`Self::provide`].
    #[track_caller]
    pub fn provide_outputs<Inst, Deps>(&self, instantiator: Inst) -> Result<ProvideInfo, ProvideErrorKind>
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
        Inst::Provides: Outputs,
        Deps: DependencyResolver + 'static,
    {
        self.provide_outputs_with_options(instantiator, ProvideOptions::new())
    }

    /// # Errors
    /// See [`Self::provide`] and [`ProvideOptions`].
    #[track_caller]
    pub fn provide_outputs_with_options<Inst, Deps>(
        &self,
        instantiator: Inst,
        options: ProvideOptions,
    ) -> Result<ProvideInfo, ProvideErrorKind>
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
        Inst::Provides: Outputs,
        Deps: DependencyResolver + 'static,
    {
        let mut output_types = Vec::new();
        <Inst::Provides as Outputs>::type_infos(&mut output_types);

        let registration = Registration {
            constructor: boxed_outputs_instantiator(instantiator),
            dependencies: dependencies::<Deps>(),
            output_types,
            injector: None,
            location: Location::caller(),
        };
        self.register(registration, options)
    }

    /// Registers an already built value.
    ///
    /// # Errors
    /// See [`Self::provide`].
    #[track_caller]
    pub fn supply<T: Send + Sync + 'static>(&self, value: T) -> Result<ProvideInfo, ProvideErrorKind> {
        self.supply_with_options(value, ProvideOptions::new())
    }

    /// # Errors
    /// See [`Self::provide`] and [`ProvideOptions`].
    #[track_caller]
    pub fn supply_with_options<T: Send + Sync + 'static>(&self, value: T, options: ProvideOptions) -> Result<ProvideInfo, ProvideErrorKind> {
        let registration = Registration {
            constructor: boxed_value(value),
            dependencies: Arc::from([]),
            output_types: vec![TypeInfo::of::<T>()],
            injector: None,
            location: Location::caller(),
        };
        self.register(registration, options)
    }

    /// Registers a component, built from its resolved fields.
    ///
    /// # Errors
    /// See [`Self::provide`].
    #[track_caller]
    pub fn provide_component<C: Component>(&self) -> Result<ProvideInfo, ProvideErrorKind> {
        self.provide_component_with_options::<C>(ProvideOptions::new())
    }

    /// Registers a component. With [`ProvideOptions::resolve_cyclic`], its deferred fields
    /// are filled after it's built, so they may depend on the component itself.
    ///
    /// # Errors
    /// See [`Self::provide`] and [`ProvideOptions`].
    #[track_caller]
    pub fn provide_component_with_options<C: Component>(&self, options: ProvideOptions) -> Result<ProvideInfo, ProvideErrorKind> {
        let fields: Arc<[Dependency]> = C::fields().into();
        let registration = Registration {
            constructor: boxed_component::<C>(fields.clone(), options.is_resolve_cyclic()),
            dependencies: fields,
            output_types: vec![TypeInfo::of::<C>()],
            injector: Some(injector::<C>()),
            location: Location::caller(),
        };
        self.register(registration, options)
    }

    fn register(&self, registration: Registration, options: ProvideOptions) -> Result<ProvideInfo, ProvideErrorKind> {
        let span = info_span!("provide", location = %registration.location);
        let _guard = span.enter();

        let mut state = self.lock();
        pipeline::provide(&mut state.registry, &self.inner.config, registration, options).inspect_err(|err| error!("{}", err))
    }
}

impl Container {
    /// Resolves the arguments of the function and calls it.
    ///
    /// Deferred fields of the arguments are filled before the call.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::InvokeFailed`] if the function fails
    /// and the resolution error, annotated with the caller location, otherwise.
    #[track_caller]
    pub fn invoke<F, Deps>(&self, function: F) -> Result<F::Output, ResolveErrorKind>
    where
        F: Invocable<Deps, Error = InstantiateErrorKind>,
        Deps: DependencyResolver,
    {
        let location = Location::caller();
        let span = info_span!("invoke", %location);
        let _guard = span.enter();

        let arguments = match Deps::resolve(self) {
            Ok(arguments) => arguments,
            Err(err) => {
                let err: ResolveErrorKind = err.into();
                let err = err.with_caller(location);
                error!("{}", err);
                return Err(err);
            }
        };

        for dependency in dependencies::<Deps>().iter() {
            self.inject_with_caller(&dependency.key, location)
                .inspect_err(|err| error!("{}", err))?;
        }

        function.invoke(arguments).map_err(|err| {
            let err = ResolveErrorKind::InvokeFailed { location, source: err };
            error!("{}", err);
            err
        })
    }

    /// Information about the provider of the key.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::MissingDependency`] if the key isn't provided.
    #[track_caller]
    pub fn lookup(&self, key: &Key) -> Result<ProvideInfo, ResolveErrorKind> {
        let location = Location::caller();
        let state = self.lock();
        state
            .registry
            .bound(key)
            .first()
            .and_then(|id| state.registry.provider(*id))
            .map(|entry| entry.info())
            .ok_or_else(|| ResolveErrorKind::MissingDependency {
                key: key.clone(),
                requested_by: Some(location),
            })
    }
}

impl Container {
    /// Value of a non-group key, constructed if it isn't memoized yet.
    pub(crate) fn resolve_single(&self, key: &Key) -> Result<Instance, ResolveErrorKind> {
        let span = info_span!("resolve", %key);
        let _guard = span.enter();

        let id = {
            let state = self.lock();
            if let Some(instance) = state.registry.memo.get(key) {
                debug!("Found in cache");
                return Ok(instance);
            }
            debug!("Not found in cache");

            match state.registry.bound(key).first() {
                Some(id) => *id,
                None => {
                    let err = missing(key, &state);
                    error!("{}", err);
                    return Err(err);
                }
            }
        };

        self.run_provider(id, key)?;

        let state = self.lock();
        match state.registry.provider(id).and_then(|entry| entry.value(key)) {
            Some(instance) => Ok(instance),
            None => Err(missing(key, &state)),
        }
    }

    /// Values of all members of a group, in registration order.
    pub(crate) fn resolve_group(&self, key: &Key) -> Result<Vec<Instance>, ResolveErrorKind> {
        let span = info_span!("resolve_group", %key);
        let _guard = span.enter();

        let ids = self.lock().registry.bound(key).to_vec();
        let mut members = Vec::with_capacity(ids.len());
        for id in ids {
            self.run_provider(id, key)?;
            if let Some(member) = self.lock().registry.provider(id).and_then(|entry| entry.value(key)) {
                members.push(member);
            }
        }

        debug!(len = members.len(), "Group resolved");
        Ok(members)
    }

    /// Runs the constructor of the provider, unless it has already been called.
    fn run_provider(&self, id: ProviderId, key: &Key) -> Result<(), ResolveErrorKind> {
        let (constructor, location) = {
            let mut state = self.lock();
            let State { registry, resolving } = &mut *state;

            let Some(entry) = registry.provider(id) else {
                return Err(ResolveErrorKind::MissingDependency {
                    key: key.clone(),
                    requested_by: resolving.last().map(|frame| frame.location),
                });
            };
            if entry.values.is_some() {
                return Ok(());
            }
            if let Some(failure) = &entry.failure {
                let err = ResolveErrorKind::ConstructorFailed {
                    location: entry.location,
                    source: failure.clone(),
                };
                error!("{}", err);
                return Err(err);
            }
            if let Some(position) = resolving.iter().position(|frame| frame.id == id) {
                let mut path = resolving[position..].iter().map(|frame| frame.key.clone()).collect::<Vec<_>>();
                path.push(key.clone());

                let err = ResolveErrorKind::CycleDetected { path: CyclePath(path) };
                error!("{}", err);
                return Err(err);
            }

            resolving.push(Frame {
                key: key.clone(),
                id,
                location: entry.location,
            });
            (entry.constructor.clone(), entry.location)
        };

        let result = constructor(self);

        let mut state = self.lock();
        let State { registry, resolving } = &mut *state;
        if let Some(position) = resolving.iter().rposition(|frame| frame.id == id) {
            resolving.remove(position);
        }

        let Some(entry) = registry.provider_mut(id) else {
            return Err(ResolveErrorKind::MissingDependency {
                key: key.clone(),
                requested_by: resolving.last().map(|frame| frame.location),
            });
        };
        match result {
            Ok(raw) => {
                let mut values = Vec::with_capacity(entry.outputs.len());
                for output in &entry.outputs {
                    let value = raw.get(output.index).and_then(|value| match &output.cast {
                        Some(cast) => cast(value),
                        None => Some(value.clone()),
                    });
                    let Some(value) = value else {
                        let err = ResolveErrorKind::IncorrectType {
                            expected: output.key.type_info,
                            actual: raw.get(output.index).map_or(output.key.type_info, |value| value.type_info()),
                        };
                        error!("{}", err);
                        return Err(err);
                    };
                    values.push(value);
                }

                let memoized = entry
                    .outputs
                    .iter()
                    .zip(&values)
                    .filter(|(output, _)| !output.key.is_group())
                    .map(|(output, value)| (output.key.clone(), value.clone()))
                    .collect::<Vec<_>>();
                entry.called = true;
                entry.values = Some(values);
                entry.raw = Some(raw);

                for (key, value) in memoized {
                    registry.memo.insert(key, value);
                }
                debug!("Cached");
                Ok(())
            }
            Err(InstantiatorErrorKind::Deps(err)) => {
                let err = ResolveErrorKind::ArgumentsFailed {
                    location,
                    source: Box::new(err),
                };
                error!("{}", err);
                Err(err)
            }
            Err(InstantiatorErrorKind::Factory(err)) => {
                let failure = Arc::new(err);
                entry.called = true;
                entry.failure = Some(failure.clone());

                let err = ResolveErrorKind::ConstructorFailed { location, source: failure };
                error!("{}", err);
                Err(err)
            }
        }
    }
}

fn missing(key: &Key, state: &State) -> ResolveErrorKind {
    ResolveErrorKind::MissingDependency {
        key: key.clone(),
        requested_by: state.resolving.last().map(|frame| frame.location),
    }
}

fn dependencies<Deps: DependencyResolver>() -> Arc<[Dependency]> {
    let mut dependencies = Vec::new();
    Deps::dependencies(&mut dependencies);
    dependencies.into()
}
