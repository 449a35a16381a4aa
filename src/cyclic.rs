use alloc::sync::Arc;
use core::panic::Location;
use tracing::{debug, error};

use crate::{
    errors::ProvideErrorKind,
    extract::Resolved,
    key::Key,
    pipeline::{Next, ProvideContext, ProvideStage},
    registry::{PropertyInfo, ProvideInfo, ProviderId, Registry},
    Container, ResolveErrorKind,
};

/// Attaches the deferred injection state to the registration.
pub(crate) struct ResolveCyclicStage;

impl ProvideStage for ResolveCyclicStage {
    fn provide(&self, registry: &mut Registry, mut context: ProvideContext, next: Next<'_>) -> Result<ProvideInfo, ProvideErrorKind> {
        let resolve_cyclic = context.options.is_resolve_cyclic();
        if resolve_cyclic && context.registration.injector.is_none() {
            return Err(ProvideErrorKind::ResolveCyclicUnsupported {
                location: context.registration.location,
            });
        }
        if resolve_cyclic {
            if let Some(dependency) = context
                .registration
                .dependencies
                .iter()
                .find(|dependency| dependency.deferred && dependency.key.is_group())
            {
                return Err(ProvideErrorKind::DeferredGroup {
                    key: dependency.key.clone(),
                    location: context.registration.location,
                });
            }
        }

        context.property = Some(PropertyInfo::new(
            context.registration.dependencies.clone(),
            context.registration.injector.clone(),
            resolve_cyclic,
        ));

        let info = next.run(registry, context)?;
        if resolve_cyclic {
            registry.has_cyclic = true;
            debug!(id = %info.id, "Deferred injection enabled");
        }
        Ok(info)
    }
}

impl Container {
    /// Fills deferred fields of the values bound to the key and, recursively, of their inputs.
    ///
    /// Every provider is walked at most once. A failed walk is recorded and returned again.
    pub(crate) fn inject_properties(&self, key: &Key) -> Result<(), ResolveErrorKind> {
        let ids = {
            let state = self.lock();
            if !state.registry.has_cyclic {
                return Ok(());
            }
            state.registry.bound(key).to_vec()
        };

        for id in ids {
            self.inject_provider(id, key)?;
        }
        Ok(())
    }

    fn inject_provider(&self, id: ProviderId, key: &Key) -> Result<(), ResolveErrorKind> {
        let (inputs, injector, target, location) = {
            let mut state = self.lock();
            let Some(entry) = state.registry.provider_mut(id) else {
                return Ok(());
            };
            let Some(target) = entry.raw.as_ref().and_then(|raw| raw.first().cloned()) else {
                return Ok(());
            };
            if entry.property.injected {
                return Ok(());
            }
            if let Some(err) = entry.property.error.clone() {
                return Err(ResolveErrorKind::PropertyInjectFailed {
                    key: key.clone(),
                    location: entry.location,
                    source: err,
                });
            }

            entry.property.injected = true;
            let injector = entry.property.injector.clone().filter(|_| entry.property.resolve_cyclic);
            (entry.property.inputs.clone(), injector, target, entry.location)
        };

        for (index, dependency) in inputs.iter().enumerate() {
            let resolved = match self.extract_instance(&dependency.key, location) {
                Ok(resolved) => resolved,
                Err(err) if dependency.optional && err.is_missing_dependency() => continue,
                Err(err) => return Err(self.fail_injection(id, key, location, err)),
            };

            let (Some(injector), true, Resolved::Single(value)) = (&injector, dependency.deferred, &resolved) else {
                continue;
            };
            if let Err(err) = injector(&target, index, value) {
                return Err(self.fail_injection(id, key, location, err));
            }
            debug!(key = %dependency.key, index, "Deferred field injected");
        }
        Ok(())
    }

    fn fail_injection(&self, id: ProviderId, key: &Key, location: &'static Location<'static>, err: ResolveErrorKind) -> ResolveErrorKind {
        let err = Arc::new(err);
        if let Some(entry) = self.lock().registry.provider_mut(id) {
            entry.property.injected = false;
            entry.property.error = Some(err.clone());
        }

        let err = ResolveErrorKind::PropertyInjectFailed {
            key: key.clone(),
            location,
            source: err,
        };
        error!("{}", err);
        err
    }
}
