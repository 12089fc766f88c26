//! Grant sources: where roles, grants, and assignments come from
//!
//! The persistence layer implements [`GrantSource`]; [`InMemoryGrantSource`]
//! backs tests and embedded use.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;
use crate::permission::{Grant, PermissionRecord, Target};
use crate::principal::{Role, RoleAssignment, RoleId, UserId};

/// A mutation that makes memoized permission sets stale
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantChange {
    /// Grants of a role changed; users holding it are affected too
    RoleGrants(RoleId),
    /// Direct grants or role assignments of a user changed
    UserGrants(UserId),
}

/// Repository trait for reading grants and role assignments
pub trait GrantSource: Send + Sync {
    /// Look up a role definition
    fn role(&self, id: RoleId) -> Result<Option<Role>>;

    /// Grants held directly by a role, in persisted order
    fn grants_for_role(&self, id: RoleId) -> Result<Vec<Grant>>;

    /// Grants held directly by a user, outside any role
    fn grants_for_user(&self, _id: UserId) -> Result<Vec<Grant>> {
        Ok(Vec::new())
    }

    /// Roles assigned to a user
    fn assignments_for_user(&self, id: UserId) -> Result<Vec<RoleAssignment>>;

    /// Users holding a role, used to fan out invalidation
    fn users_with_role(&self, id: RoleId) -> Result<Vec<UserId>>;
}

#[derive(Default)]
struct SourceState {
    roles: HashMap<RoleId, Role>,
    role_grants: HashMap<RoleId, Vec<Grant>>,
    user_grants: HashMap<UserId, Vec<Grant>>,
    assignments: HashMap<UserId, Vec<RoleAssignment>>,
}

/// In-memory grant source
#[derive(Default)]
pub struct InMemoryGrantSource {
    state: RwLock<SourceState>,
}

impl InMemoryGrantSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a role definition
    pub fn insert_role(&self, role: Role) -> GrantChange {
        let id = role.id;
        self.state.write().roles.insert(id, role);
        GrantChange::RoleGrants(id)
    }

    /// Add a grant to a role
    pub fn grant(&self, role: RoleId, grant: Grant) -> GrantChange {
        self.state
            .write()
            .role_grants
            .entry(role)
            .or_default()
            .push(grant);
        GrantChange::RoleGrants(role)
    }

    /// Replace every grant of a role
    pub fn sync_grants(&self, role: RoleId, grants: Vec<Grant>) -> GrantChange {
        self.state.write().role_grants.insert(role, grants);
        GrantChange::RoleGrants(role)
    }

    /// Remove every grant of a role for the named record in the given scope
    pub fn revoke(&self, role: RoleId, record: &str, target: Option<&Target>) -> GrantChange {
        if let Some(grants) = self.state.write().role_grants.get_mut(&role) {
            grants.retain(|g| !(g.record.name == record && g.target.as_ref() == target));
        }
        GrantChange::RoleGrants(role)
    }

    /// Add a grant directly to a user
    pub fn grant_to_user(&self, user: UserId, grant: Grant) -> GrantChange {
        self.state
            .write()
            .user_grants
            .entry(user)
            .or_default()
            .push(grant);
        GrantChange::UserGrants(user)
    }

    /// Assign a role to a user, optionally for one target only
    pub fn assign_role(&self, user: UserId, role: RoleId, target: Option<Target>) -> GrantChange {
        let assignment = RoleAssignment { role, target };
        let mut state = self.state.write();
        let assignments = state.assignments.entry(user).or_default();
        if !assignments.contains(&assignment) {
            assignments.push(assignment);
        }
        GrantChange::UserGrants(user)
    }

    /// Take every assignment of a role away from a user
    pub fn retract_role(&self, user: UserId, role: RoleId) -> GrantChange {
        if let Some(assignments) = self.state.write().assignments.get_mut(&user) {
            assignments.retain(|a| a.role != role);
        }
        GrantChange::UserGrants(user)
    }

    /// Convenience for seeding a role with unscoped records
    pub fn grant_records(&self, role: RoleId, records: Vec<PermissionRecord>) -> GrantChange {
        let mut state = self.state.write();
        state
            .role_grants
            .entry(role)
            .or_default()
            .extend(records.into_iter().map(Grant::global));
        GrantChange::RoleGrants(role)
    }
}

impl GrantSource for InMemoryGrantSource {
    fn role(&self, id: RoleId) -> Result<Option<Role>> {
        Ok(self.state.read().roles.get(&id).cloned())
    }

    fn grants_for_role(&self, id: RoleId) -> Result<Vec<Grant>> {
        Ok(self
            .state
            .read()
            .role_grants
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    fn grants_for_user(&self, id: UserId) -> Result<Vec<Grant>> {
        Ok(self
            .state
            .read()
            .user_grants
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    fn assignments_for_user(&self, id: UserId) -> Result<Vec<RoleAssignment>> {
        Ok(self
            .state
            .read()
            .assignments
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    fn users_with_role(&self, id: RoleId) -> Result<Vec<UserId>> {
        let state = self.state.read();
        let mut users: Vec<UserId> = state
            .assignments
            .iter()
            .filter(|(_, assignments)| assignments.iter().any(|a| a.role == id))
            .map(|(user, _)| *user)
            .collect();
        users.sort();
        Ok(users)
    }
}
