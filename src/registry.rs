use alloc::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    vec,
    vec::Vec,
};
use core::{
    fmt::{self, Display, Formatter},
    panic::Location,
};

use crate::{
    any::{Instance, TypeInfo},
    cache::Cache,
    component::Injector,
    errors::{CyclePath, InstantiateErrorKind},
    instantiator::BoxedConstructor,
    key::{Dependency, Key},
    options::Output,
    ResolveErrorKind,
};

/// Identifier of a registered provider, increasing in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProviderId(u64);

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inputs and outputs of a registered provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvideInfo {
    pub id: ProviderId,
    pub inputs: Vec<Dependency>,
    pub outputs: Vec<Key>,
    pub location: &'static Location<'static>,
}

/// State of the deferred injection of a provider.
///
/// ## Fields
/// - `resolve_cyclic`:
///   If `true`, deferred inputs are assigned to the built value by `injector`.
/// - `injected`:
///   Set when the injection starts, reset if it fails.
/// - `error`:
///   Failure of the last injection, returned again on the next attempts.
pub(crate) struct PropertyInfo {
    pub(crate) resolve_cyclic: bool,
    pub(crate) inputs: Arc<[Dependency]>,
    pub(crate) injector: Option<Injector>,
    pub(crate) injected: bool,
    pub(crate) error: Option<Arc<ResolveErrorKind>>,
}

impl PropertyInfo {
    #[inline]
    #[must_use]
    pub(crate) fn new(inputs: Arc<[Dependency]>, injector: Option<Injector>, resolve_cyclic: bool) -> Self {
        Self {
            resolve_cyclic,
            inputs,
            injector,
            injected: false,
            error: None,
        }
    }
}

/// Submitted provider, before the options are applied.
pub(crate) struct Registration {
    pub(crate) constructor: BoxedConstructor,
    pub(crate) dependencies: Arc<[Dependency]>,
    pub(crate) output_types: Vec<TypeInfo>,
    pub(crate) injector: Option<Injector>,
    pub(crate) location: &'static Location<'static>,
}

pub(crate) struct ProviderEntry {
    pub(crate) id: ProviderId,
    pub(crate) constructor: BoxedConstructor,
    pub(crate) dependencies: Arc<[Dependency]>,
    pub(crate) outputs: Vec<Output>,
    pub(crate) location: &'static Location<'static>,
    pub(crate) called: bool,
    /// Values bound to `outputs`, after capability casts
    pub(crate) values: Option<Vec<Instance>>,
    /// Values returned by the constructor
    pub(crate) raw: Option<Vec<Instance>>,
    pub(crate) failure: Option<Arc<InstantiateErrorKind>>,
    pub(crate) property: PropertyInfo,
}

impl ProviderEntry {
    #[must_use]
    pub(crate) fn info(&self) -> ProvideInfo {
        ProvideInfo {
            id: self.id,
            inputs: self.dependencies.to_vec(),
            outputs: self.outputs.iter().map(|output| output.key.clone()).collect(),
            location: self.location,
        }
    }

    /// Dependencies resolved while the value is constructed.
    pub(crate) fn eager_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        let resolve_cyclic = self.property.resolve_cyclic;
        self.dependencies
            .iter()
            .filter(move |dependency| !(resolve_cyclic && dependency.deferred))
    }

    /// Value bound to the output key.
    #[must_use]
    pub(crate) fn value(&self, key: &Key) -> Option<Instance> {
        let values = self.values.as_ref()?;
        let position = self.outputs.iter().position(|output| output.key == *key)?;
        values.get(position).cloned()
    }
}

pub(crate) struct Registry {
    providers: Vec<ProviderEntry>,
    bindings: BTreeMap<Key, Vec<ProviderId>>,
    pub(crate) memo: Cache,
    /// Set once a provider with deferred injection is registered
    pub(crate) has_cyclic: bool,
    next_id: u64,
}

impl Registry {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            providers: Vec::new(),
            bindings: BTreeMap::new(),
            memo: Cache::new(),
            has_cyclic: false,
            next_id: 0,
        }
    }

    #[inline]
    pub(crate) fn next_id(&mut self) -> ProviderId {
        let id = ProviderId(self.next_id);
        self.next_id += 1;
        id
    }

    #[inline]
    pub(crate) fn providers(&self) -> impl Iterator<Item = &ProviderEntry> {
        self.providers.iter()
    }

    #[must_use]
    pub(crate) fn provider(&self, id: ProviderId) -> Option<&ProviderEntry> {
        let position = self.providers.binary_search_by_key(&id, |entry| entry.id).ok()?;
        self.providers.get(position)
    }

    #[must_use]
    pub(crate) fn provider_mut(&mut self, id: ProviderId) -> Option<&mut ProviderEntry> {
        let position = self.providers.binary_search_by_key(&id, |entry| entry.id).ok()?;
        self.providers.get_mut(position)
    }

    /// Providers bound to the key, in registration order.
    #[must_use]
    pub(crate) fn bound(&self, key: &Key) -> &[ProviderId] {
        self.bindings.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Keeps providers and bindings ordered by id, so a removed provider is restored at its position.
    pub(crate) fn insert(&mut self, entry: ProviderEntry) {
        let id = entry.id;
        for output in &entry.outputs {
            let ids = self.bindings.entry(output.key.clone()).or_default();
            let position = ids.partition_point(|other| *other < id);
            ids.insert(position, id);
        }

        let position = self.providers.partition_point(|other| other.id < id);
        self.providers.insert(position, entry);
    }

    pub(crate) fn remove(&mut self, id: ProviderId) -> Option<ProviderEntry> {
        let position = self.providers.binary_search_by_key(&id, |entry| entry.id).ok()?;
        let entry = self.providers.remove(position);
        for output in &entry.outputs {
            if let Some(ids) = self.bindings.get_mut(&output.key) {
                ids.retain(|other| *other != id);
                if ids.is_empty() {
                    self.bindings.remove(&output.key);
                }
            }
        }
        Some(entry)
    }

    /// First output key already bound to another provider and the location of that provider.
    /// Group keys never conflict.
    #[must_use]
    pub(crate) fn conflict(&self, outputs: &[Output]) -> Option<(Key, &'static Location<'static>)> {
        outputs.iter().filter(|output| !output.key.is_group()).find_map(|output| {
            let id = *self.bound(&output.key).first()?;
            Some((output.key.clone(), self.provider(id)?.location))
        })
    }

    /// Cycle of eager dependencies going through the provider, if there is one.
    #[must_use]
    pub(crate) fn find_cycle(&self, start: ProviderId) -> Option<CyclePath> {
        let entry = self.provider(start)?;
        let mut path = vec![entry.outputs.first()?.key.clone()];
        let mut visited = BTreeSet::new();

        self.visit(start, start, &mut visited, &mut path).then_some(CyclePath(path))
    }

    fn visit(&self, current: ProviderId, start: ProviderId, visited: &mut BTreeSet<ProviderId>, path: &mut Vec<Key>) -> bool {
        let Some(entry) = self.provider(current) else {
            return false;
        };
        for dependency in entry.eager_dependencies() {
            for id in self.bound(&dependency.key) {
                path.push(dependency.key.clone());
                if *id == start || (visited.insert(*id) && self.visit(*id, start, visited, path)) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::{PropertyInfo, ProviderEntry, ProviderId, Registry};
    use crate::{
        key::{Dependency, Key},
        options::Output,
    };

    use alloc::{string::ToString as _, sync::Arc, vec, vec::Vec};
    use core::panic::Location;

    fn entry(registry: &mut Registry, dependencies: Vec<Dependency>, outputs: Vec<Key>, resolve_cyclic: bool) -> ProviderEntry {
        let dependencies: Arc<[Dependency]> = dependencies.into();
        ProviderEntry {
            id: registry.next_id(),
            constructor: Arc::new(|_| Ok(vec![])),
            dependencies: dependencies.clone(),
            outputs: outputs
                .into_iter()
                .enumerate()
                .map(|(index, key)| Output { key, index, cast: None })
                .collect(),
            location: Location::caller(),
            called: false,
            values: None,
            raw: None,
            failure: None,
            property: PropertyInfo::new(dependencies, None, resolve_cyclic),
        }
    }

    #[test]
    fn test_insert_and_remove() {
        let mut registry = Registry::new();
        let first = entry(&mut registry, vec![], vec![Key::of::<i32>(), Key::grouped::<u8>("g")], false);
        let second = entry(&mut registry, vec![], vec![Key::grouped::<u8>("g")], false);
        let (first_id, second_id) = (first.id, second.id);

        registry.insert(second);
        registry.insert(first);

        assert_eq!(registry.bound(&Key::grouped::<u8>("g")), [first_id, second_id]);
        assert_eq!(registry.providers().map(|entry| entry.id).collect::<Vec<_>>(), [first_id, second_id]);
        assert_eq!(registry.provider(first_id).unwrap().info().outputs.len(), 2);

        let removed = registry.remove(first_id).unwrap();
        assert!(registry.bound(&Key::of::<i32>()).is_empty());
        assert_eq!(registry.bound(&Key::grouped::<u8>("g")), [second_id]);

        registry.insert(removed);
        assert_eq!(registry.bound(&Key::grouped::<u8>("g")), [first_id, second_id]);
        assert!(registry.remove(ProviderId(100)).is_none());
    }

    #[test]
    fn test_conflict_ignores_groups() {
        let mut registry = Registry::new();
        let first = entry(&mut registry, vec![], vec![Key::of::<i32>(), Key::grouped::<u8>("g")], false);
        let second = entry(&mut registry, vec![], vec![Key::grouped::<u8>("g")], false);
        let third = entry(&mut registry, vec![], vec![Key::grouped::<u8>("g"), Key::of::<i32>()], false);
        registry.insert(first);

        assert!(registry.conflict(&second.outputs).is_none());
        assert_eq!(registry.conflict(&third.outputs).unwrap().0, Key::of::<i32>());
    }

    #[test]
    fn test_find_cycle() {
        let mut registry = Registry::new();
        let int = entry(&mut registry, vec![Dependency::of::<bool>()], vec![Key::of::<i32>()], false);
        let flag = entry(&mut registry, vec![Dependency::of::<i32>()], vec![Key::of::<bool>()], false);
        let (int_id, flag_id) = (int.id, flag.id);

        registry.insert(int);
        assert!(registry.find_cycle(int_id).is_none());

        registry.insert(flag);
        assert_eq!(registry.find_cycle(flag_id).unwrap().to_string(), "bool -> i32 -> bool");
    }

    #[test]
    fn test_deferred_dependencies_arent_edges() {
        let mut registry = Registry::new();
        let first = entry(&mut registry, vec![Dependency::deferred::<bool>()], vec![Key::of::<i32>()], true);
        let second = entry(&mut registry, vec![Dependency::of::<i32>()], vec![Key::of::<bool>()], false);
        let second_id = second.id;

        registry.insert(first);
        registry.insert(second);

        assert!(registry.find_cycle(second_id).is_none());
    }
}
