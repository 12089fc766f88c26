//! Merging grants inherited from several roles

use std::collections::BTreeMap;

use crate::permission::models::{Grant, PermissionRecord, PermissionValue, Target};

/// OR-merge grants that share a record name and target.
///
/// The result is ordered by `(name, target)`, so it does not depend on the
/// order the grants arrived in.
pub fn merge_grants<I>(grants: I) -> Vec<Grant>
where
    I: IntoIterator<Item = Grant>,
{
    let mut merged: BTreeMap<(String, Option<Target>), PermissionValue> = BTreeMap::new();

    for grant in grants {
        let key = (grant.record.name, grant.target);
        let value = match merged.remove(&key) {
            Some(existing) => existing.merge(grant.record.value),
            None => grant.record.value,
        };
        merged.insert(key, value);
    }

    merged
        .into_iter()
        .map(|((name, target), value)| Grant {
            record: PermissionRecord { name, value },
            target,
        })
        .collect()
}

/// Combine the grants of every role a principal holds.
///
/// Any role granting an action enables it; a bare `true` on one role covers
/// every action of that record. The outcome is the same for any role order.
pub fn aggregate<I, G>(role_grants: I) -> Vec<Grant>
where
    I: IntoIterator<Item = G>,
    G: IntoIterator<Item = Grant>,
{
    merge_grants(role_grants.into_iter().flatten())
}

/// Narrow grants reached through a role assignment to the assignment target.
///
/// Global grants inherit the target. Grants already scoped to a different
/// target cannot be reached through this assignment and are dropped.
pub fn scope_grants(grants: Vec<Grant>, assignment: Option<&Target>) -> Vec<Grant> {
    let Some(assignment) = assignment else {
        return grants;
    };

    grants
        .into_iter()
        .filter_map(|grant| match &grant.target {
            None => Some(Grant::scoped(grant.record, assignment.clone())),
            Some(target) if target == assignment => Some(grant),
            Some(_) => None,
        })
        .collect()
}
