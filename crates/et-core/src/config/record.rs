//! Key/value configuration record

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// String key/value record supplied by the cluster, read-only to the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigRecord(BTreeMap<String, String>);

impl ConfigRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// On-disk shape of a configuration record, modelled on a cluster config object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordFile {
    /// Object name, informational only
    #[serde(default)]
    pub name: Option<String>,

    /// Object namespace, informational only
    #[serde(default)]
    pub namespace: Option<String>,

    /// Record entries
    #[serde(default)]
    pub data: ConfigRecord,
}
