use std::collections::{BTreeMap, BTreeSet};

use crate::{any::Value, key::Abstract};

#[derive(Default)]
pub(crate) struct Cache {
    map: BTreeMap<Abstract, Value>,
    /// Keys of instances put by hand, they outlive termination
    pinned: BTreeSet<Abstract>,
    resolved: BTreeSet<Abstract>,
}

impl Cache {
    #[inline]
    #[must_use]
    pub(crate) fn get(&self, abstract_: &Abstract) -> Option<Value> {
        self.map.get(abstract_).cloned()
    }

    #[inline]
    #[must_use]
    pub(crate) fn contains(&self, abstract_: &Abstract) -> bool {
        self.map.contains_key(abstract_)
    }

    #[inline]
    pub(crate) fn insert(&mut self, abstract_: Abstract, value: Value) {
        self.pinned.remove(&abstract_);
        self.map.insert(abstract_, value);
    }

    #[inline]
    pub(crate) fn pin(&mut self, abstract_: Abstract, value: Value) {
        self.map.insert(abstract_.clone(), value);
        self.resolved.insert(abstract_.clone());
        self.pinned.insert(abstract_);
    }

    #[inline]
    pub(crate) fn mark_resolved(&mut self, abstract_: Abstract) {
        self.resolved.insert(abstract_);
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_resolved(&self, abstract_: &Abstract) -> bool {
        self.resolved.contains(abstract_)
    }

    /// Forgets built instances, keeping the pinned ones
    pub(crate) fn clear_built(&mut self) {
        let pinned = &self.pinned;
        self.map.retain(|abstract_, _| pinned.contains(abstract_));
        self.resolved.retain(|abstract_| pinned.contains(abstract_));
    }
}
