use alloc::vec::Vec;
use tracing::debug;

use crate::{
    config::Config,
    cyclic::ResolveCyclicStage,
    errors::ProvideErrorKind,
    options::{Output, ProvideOptions},
    overriding::OverrideStage,
    registry::{PropertyInfo, ProvideInfo, ProviderEntry, Registration, Registry},
};

/// Registration in progress, passed through the stages and rewritten by them.
pub(crate) struct ProvideContext {
    pub(crate) registration: Registration,
    pub(crate) options: ProvideOptions,
    pub(crate) outputs: Vec<Output>,
    pub(crate) property: Option<PropertyInfo>,
}

/// Step of a registration. A stage either finishes the registration itself or calls `next`.
pub(crate) trait ProvideStage {
    fn provide(&self, registry: &mut Registry, context: ProvideContext, next: Next<'_>) -> Result<ProvideInfo, ProvideErrorKind>;
}

/// Rest of the pipeline, ending with the base registration.
pub(crate) struct Next<'a> {
    stages: &'a [&'a dyn ProvideStage],
    config: &'a Config,
}

impl<'a> Next<'a> {
    #[inline]
    #[must_use]
    pub(crate) const fn new(stages: &'a [&'a dyn ProvideStage], config: &'a Config) -> Self {
        Self { stages, config }
    }

    pub(crate) fn run(self, registry: &mut Registry, context: ProvideContext) -> Result<ProvideInfo, ProvideErrorKind> {
        match self.stages.split_first() {
            Some((stage, stages)) => stage.provide(registry, context, Next::new(stages, self.config)),
            None => register(registry, context, self.config),
        }
    }
}

/// Applies the options and registers the provider.
pub(crate) fn provide(
    registry: &mut Registry,
    config: &Config,
    registration: Registration,
    options: ProvideOptions,
) -> Result<ProvideInfo, ProvideErrorKind> {
    let outputs = options.outputs(&registration.output_types, registration.location)?;
    let context = ProvideContext {
        registration,
        options,
        outputs,
        property: None,
    };

    let stages: [&dyn ProvideStage; 2] = [&ResolveCyclicStage, &OverrideStage];
    Next::new(&stages, config).run(registry, context)
}

fn register(registry: &mut Registry, context: ProvideContext, config: &Config) -> Result<ProvideInfo, ProvideErrorKind> {
    let ProvideContext {
        registration,
        outputs,
        property,
        ..
    } = context;
    let location = registration.location;

    if let Some((key, existing)) = registry.conflict(&outputs) {
        return Err(ProvideErrorKind::Conflict { key, location, existing });
    }

    let property =
        property.unwrap_or_else(|| PropertyInfo::new(registration.dependencies.clone(), registration.injector.clone(), false));
    let entry = ProviderEntry {
        id: registry.next_id(),
        constructor: registration.constructor,
        dependencies: registration.dependencies,
        outputs,
        location,
        called: false,
        values: None,
        raw: None,
        failure: None,
        property,
    };
    let info = entry.info();
    registry.insert(entry);

    if !config.defer_acyclic_verification {
        if let Some(path) = registry.find_cycle(info.id) {
            registry.remove(info.id);
            return Err(ProvideErrorKind::CycleDetected { location, path });
        }
    }

    debug!(id = %info.id, "Registered");

    Ok(info)
}
