//! Component override maps.
//!
//! A theme exposes named component slots. Callers customise them with an
//! override set that is either merged key by key or computed from the
//! current map. The merged map is passed on explicitly to whatever renders
//! with it.

use std::collections::BTreeMap;
use std::fmt;

/// Slot name to component override.
pub type ComponentMap<V> = BTreeMap<String, V>;

/// How to customise a [`ComponentMap`].
pub enum Overrides<V> {
    /// Shallow merge; these entries win over the base
    Merge(ComponentMap<V>),
    /// Compute the new map from the base; the result replaces it entirely
    Replace(Box<dyn FnOnce(&ComponentMap<V>) -> ComponentMap<V>>),
}

impl<V: fmt::Debug> fmt::Debug for Overrides<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge(map) => f.debug_tuple("Merge").field(map).finish(),
            Self::Replace(_) => f.write_str("Replace(..)"),
        }
    }
}

impl<V> From<ComponentMap<V>> for Overrides<V> {
    fn from(map: ComponentMap<V>) -> Self {
        Self::Merge(map)
    }
}

impl<V> Overrides<V> {
    pub fn replace<F>(f: F) -> Self
    where
        F: FnOnce(&ComponentMap<V>) -> ComponentMap<V> + 'static,
    {
        Self::Replace(Box::new(f))
    }
}

/// Apply `overrides` to `base`.
pub fn merge_components<V: Clone>(base: &ComponentMap<V>, overrides: Overrides<V>) -> ComponentMap<V> {
    match overrides {
        Overrides::Merge(extra) => {
            let mut merged = base.clone();
            merged.extend(extra);
            merged
        }
        Overrides::Replace(f) => f(base),
    }
}
