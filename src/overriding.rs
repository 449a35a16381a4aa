use alloc::{collections::BTreeSet, vec::Vec};
use core::panic::Location;
use tracing::debug;

use crate::{
    errors::{KeyList, ProvideErrorKind},
    key::Key,
    pipeline::{Next, ProvideContext, ProvideStage},
    registry::{ProvideInfo, ProviderId, Registry},
};

/// Replaces a provider that hasn't been called yet with the submitted one.
///
/// The replaced provider must have exactly the same set of outputs.
/// If the rest of the registration fails, the replaced provider is restored.
pub(crate) struct OverrideStage;

impl ProvideStage for OverrideStage {
    fn provide(&self, registry: &mut Registry, context: ProvideContext, next: Next<'_>) -> Result<ProvideInfo, ProvideErrorKind> {
        if !context.options.is_override() {
            return next.run(registry, context);
        }

        let location = context.registration.location;
        if let Some(output) = context.outputs.iter().find(|output| output.key.is_group()) {
            return Err(ProvideErrorKind::InvalidOverride {
                key: output.key.clone(),
                location,
            });
        }

        let keys = context.outputs.iter().map(|output| output.key.clone()).collect::<BTreeSet<_>>();
        let id = find_target(registry, &keys, location)?;
        let Some(target) = registry.provider(id) else {
            return Err(no_target(keys, location));
        };
        if target.called {
            return Err(ProvideErrorKind::AlreadyCalled {
                location,
                existing: target.location,
            });
        }

        let Some(previous) = registry.remove(id) else {
            return Err(no_target(keys, location));
        };
        debug!(%id, existing = %previous.location, "Removed for override");

        match next.run(registry, context) {
            Ok(info) => {
                debug!(%id, "Overridden");
                Ok(info)
            }
            Err(err) => {
                registry.insert(previous);
                debug!(%id, "Override failed, restored");
                Err(err)
            }
        }
    }
}

/// Provider owning exactly the keys and nothing else.
fn find_target(registry: &Registry, keys: &BTreeSet<Key>, location: &'static Location<'static>) -> Result<ProviderId, ProvideErrorKind> {
    let matched = registry.providers().find(|entry| {
        entry.outputs.len() == keys.len()
            && entry.outputs.iter().all(|output| keys.contains(&output.key))
            && keys.iter().all(|key| registry.bound(key) == [entry.id])
    });
    if let Some(entry) = matched {
        return Ok(entry.id);
    }

    let all_bound = keys.iter().all(|key| !registry.bound(key).is_empty());
    let owners = keys
        .iter()
        .flat_map(|key| registry.bound(key).iter().copied())
        .collect::<BTreeSet<_>>();
    if all_bound && owners.len() > 1 {
        return Err(ProvideErrorKind::AmbiguousOverride {
            outputs: KeyList(keys.iter().cloned().collect()),
            location,
        });
    }

    Err(no_target(keys.clone(), location))
}

fn no_target(keys: BTreeSet<Key>, location: &'static Location<'static>) -> ProvideErrorKind {
    ProvideErrorKind::NoOverrideTarget {
        outputs: KeyList(keys.into_iter().collect::<Vec<_>>()),
        location,
    }
}
