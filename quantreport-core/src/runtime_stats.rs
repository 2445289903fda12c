//! Runtime statistics — free-form label → display string pairs set by the
//! host algorithm and merged verbatim into reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RuntimeStatistics {
    entries: BTreeMap<String, String>,
}

impl RuntimeStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a label, replacing any previous value.
    pub fn set(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(label.into(), value.into());
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    /// Copy every entry of `other` into `self`; `other` wins on collisions.
    pub fn merge(&mut self, other: impl IntoIterator<Item = (String, String)>) {
        self.entries.extend(other);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for RuntimeStatistics {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
