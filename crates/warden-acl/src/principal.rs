//! Principals whose access is evaluated: roles and the users that hold them

use serde::{Deserialize, Serialize};

use crate::permission::Target;

/// Identifier of a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(pub u64);

/// Identifier of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An entity whose permissions can be checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum Principal {
    /// A single role and its own grants
    Role(RoleId),
    /// A user aggregating the grants of every role assigned to it
    User(UserId),
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Principal::Role(id) => write!(f, "role:{}", id),
            Principal::User(id) => write!(f, "user:{}", id),
        }
    }
}

impl From<RoleId> for Principal {
    fn from(id: RoleId) -> Self {
        Principal::Role(id)
    }
}

impl From<UserId> for Principal {
    fn from(id: UserId) -> Self {
        Principal::User(id)
    }
}

/// A role definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// Human readable name
    pub name: String,
    /// Stable identifier used by role checks (`admin`, `editor`, ...)
    pub slug: String,
    pub description: Option<String>,
}

impl Role {
    /// Create a new role without a description
    pub fn new(id: RoleId, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            slug: slug.into(),
            description: None,
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A role held by a user, optionally limited to one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: RoleId,
    /// When set, every grant reached through this assignment is scoped to the target
    pub target: Option<Target>,
}

impl RoleAssignment {
    /// Assign a role everywhere
    pub fn global(role: RoleId) -> Self {
        Self { role, target: None }
    }

    /// Assign a role for a single target
    pub fn scoped(role: RoleId, target: Target) -> Self {
        Self {
            role,
            target: Some(target),
        }
    }
}
