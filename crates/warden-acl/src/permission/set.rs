//! Flattened permission sets and the normalizer that builds them

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::permission::aggregate::merge_grants;
use crate::permission::models::{Grant, PermissionRecord};

/// Mapping from canonical permission key to its flag.
///
/// Keys are `record`, `record.action`, and either of those followed by a
/// `:model:reference_id` scope suffix. A missing key means deny.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    entries: BTreeMap<String, bool>,
}

impl PermissionSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag stored for a key, if any
    pub fn get(&self, key: &str) -> Option<bool> {
        self.entries.get(key).copied()
    }

    /// True only when the key is present and enabled
    pub fn allows(&self, key: &str) -> bool {
        self.get(key) == Some(true)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Whether any key belongs to the record `name`
    pub fn has_record(&self, name: &str) -> bool {
        self.entries.keys().any(|key| record_of(key) == name)
    }

    /// Names of the records that have at least one key in the set
    pub fn record_names(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self.entries.keys().map(|key| record_of(key)).collect();
        names.into_iter().collect()
    }

    /// Merge another set into this one.
    ///
    /// With `overwrite` false existing keys are kept and only new keys are
    /// added; with `overwrite` true the incoming flags replace existing ones.
    pub fn merge(&mut self, other: &PermissionSet, overwrite: bool) {
        for (key, enabled) in &other.entries {
            if overwrite {
                self.entries.insert(key.clone(), *enabled);
            } else {
                self.entries.entry(key.clone()).or_insert(*enabled);
            }
        }
    }

    /// Express every entry as a bare-flag record.
    ///
    /// Normalizing the result yields this set again.
    pub fn to_records(&self) -> Vec<PermissionRecord> {
        self.entries
            .iter()
            .map(|(key, enabled)| PermissionRecord::flag(key.clone(), *enabled))
            .collect()
    }
}

impl FromIterator<(String, bool)> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, bool)> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, bool)>>(iter: I) -> Self {
        iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

/// Record part of a canonical key (`post` for `post.edit:article:42`)
fn record_of(key: &str) -> &str {
    let unscoped = key.split(':').next().unwrap_or(key);
    unscoped.split('.').next().unwrap_or(unscoped)
}

/// Flatten grants into a permission set.
///
/// Bare flags produce one key named after the record, action maps produce one
/// `record.action` key per action, and scoped grants append their scope
/// suffix. Records sharing a name and target are OR-merged first, and so are
/// distinct records that flatten to the same key.
pub fn normalize<'a, I>(grants: I) -> PermissionSet
where
    I: IntoIterator<Item = &'a Grant>,
{
    let mut entries = BTreeMap::new();
    for grant in merge_grants(grants.into_iter().cloned()) {
        for (key, enabled) in grant.canonical_entries() {
            let slot = entries.entry(key).or_insert(false);
            *slot = *slot || enabled;
        }
    }
    PermissionSet { entries }
}

/// Flatten unscoped records into a permission set
pub fn normalize_records(records: &[PermissionRecord]) -> PermissionSet {
    let grants: Vec<Grant> = records.iter().cloned().map(Grant::global).collect();
    normalize(&grants)
}
