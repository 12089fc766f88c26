//! Permission data models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AclError, Result};

/// A single resource instance a grant can be narrowed to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Model type name (`article`, `project`, ...)
    pub model: String,
    /// Instance identifier
    pub reference_id: i64,
}

impl Target {
    /// Create a new target
    pub fn new(model: impl Into<String>, reference_id: i64) -> Self {
        Self {
            model: model.into(),
            reference_id,
        }
    }

    /// Suffix appended to a canonical key for lookups in this scope
    pub fn scope_suffix(&self) -> String {
        format!(":{}:{}", self.model, self.reference_id)
    }

    /// Canonical key for `key` narrowed to this target
    pub fn scoped_key(&self, key: &str) -> String {
        format!("{}{}", key, self.scope_suffix())
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.model, self.reference_id)
    }
}

/// Value of a permission record: a flag for the whole record or per-action flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionValue {
    /// Applies to the record as a whole
    Flag(bool),
    /// One flag per action name
    Actions(BTreeMap<String, bool>),
}

impl PermissionValue {
    /// Combine two values for the same record, granting whatever either grants.
    ///
    /// A `true` flag stands for every action and absorbs the other side.
    pub fn merge(self, other: PermissionValue) -> PermissionValue {
        match (self, other) {
            (PermissionValue::Flag(true), _) | (_, PermissionValue::Flag(true)) => {
                PermissionValue::Flag(true)
            }
            (PermissionValue::Flag(false), other) | (other, PermissionValue::Flag(false)) => other,
            (PermissionValue::Actions(mut left), PermissionValue::Actions(right)) => {
                for (action, enabled) in right {
                    let slot = left.entry(action).or_insert(false);
                    *slot = *slot || enabled;
                }
                PermissionValue::Actions(left)
            }
        }
    }
}

impl From<bool> for PermissionValue {
    fn from(flag: bool) -> Self {
        PermissionValue::Flag(flag)
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for PermissionValue {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        PermissionValue::Actions(iter.into_iter().map(|(a, v)| (a.into(), v)).collect())
    }
}

/// A named permission and its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub name: String,
    pub value: PermissionValue,
}

impl PermissionRecord {
    /// Create a record from anything convertible to a value
    pub fn new(name: impl Into<String>, value: impl Into<PermissionValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Record granting (or denying) the whole permission
    pub fn flag(name: impl Into<String>, enabled: bool) -> Self {
        Self::new(name, PermissionValue::Flag(enabled))
    }

    /// Record with per-action flags
    pub fn actions<S: Into<String>>(
        name: impl Into<String>,
        actions: impl IntoIterator<Item = (S, bool)>,
    ) -> Self {
        Self::new(name, actions.into_iter().collect::<PermissionValue>())
    }

    /// Build a record from raw persisted data.
    ///
    /// Only a boolean or an object whose values are all booleans is accepted;
    /// anything else is rejected with [`AclError::MalformedRecord`].
    pub fn from_json(name: impl Into<String>, raw: &serde_json::Value) -> Result<Self> {
        let name = name.into();
        let value = match raw {
            serde_json::Value::Bool(flag) => PermissionValue::Flag(*flag),
            serde_json::Value::Object(map) => {
                let mut actions = BTreeMap::new();
                for (action, enabled) in map {
                    let enabled = enabled.as_bool().ok_or_else(|| AclError::MalformedRecord {
                        name: name.clone(),
                        reason: format!("action \"{}\" is not a boolean", action),
                    })?;
                    actions.insert(action.clone(), enabled);
                }
                PermissionValue::Actions(actions)
            }
            other => {
                return Err(AclError::MalformedRecord {
                    name,
                    reason: format!("expected a boolean or an action map, found {}", other),
                })
            }
        };
        Ok(Self { name, value })
    }
}

/// A permission record held by a principal, optionally narrowed to a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub record: PermissionRecord,
    /// None means the grant is global
    pub target: Option<Target>,
}

impl Grant {
    /// Grant a record everywhere
    pub fn global(record: PermissionRecord) -> Self {
        Self {
            record,
            target: None,
        }
    }

    /// Grant a record for one target only
    pub fn scoped(record: PermissionRecord, target: Target) -> Self {
        Self {
            record,
            target: Some(target),
        }
    }

    /// Whether the grant is usable for the given lookup scope
    pub fn applies_to(&self, scope: Option<&Target>) -> bool {
        match (&self.target, scope) {
            (None, _) => true,
            (Some(target), Some(scope)) => target == scope,
            (Some(_), None) => false,
        }
    }

    /// Flattened canonical keys contributed by this grant
    pub fn canonical_entries(&self) -> Vec<(String, bool)> {
        let suffix = self
            .target
            .as_ref()
            .map(Target::scope_suffix)
            .unwrap_or_default();

        match &self.record.value {
            PermissionValue::Flag(enabled) => {
                vec![(format!("{}{}", self.record.name, suffix), *enabled)]
            }
            PermissionValue::Actions(actions) => actions
                .iter()
                .map(|(action, enabled)| {
                    (format!("{}.{}{}", self.record.name, action, suffix), *enabled)
                })
                .collect(),
        }
    }
}

impl From<PermissionRecord> for Grant {
    fn from(record: PermissionRecord) -> Self {
        Grant::global(record)
    }
}
