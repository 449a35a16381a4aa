use alloc::collections::BTreeMap;

use crate::{any::Instance, key::Key};

/// Memo table of constructed values, one entry per non-group key, never evicted.
#[derive(Default)]
pub(crate) struct Cache {
    map: BTreeMap<Key, Instance>,
}

impl Cache {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self { map: BTreeMap::new() }
    }

    #[inline]
    pub(crate) fn insert(&mut self, key: Key, value: Instance) -> Option<Instance> {
        self.map.insert(key, value)
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, key: &Key) -> Option<Instance> {
        self.map.get(key).cloned()
    }

    #[inline]
    pub(crate) fn keys(&self) -> impl Iterator<Item = &Key> {
        self.map.keys()
    }
}
