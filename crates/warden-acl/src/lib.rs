//! Role-based permission resolution
//!
//! Decides whether a role or a user holds a permission expression such as
//! `post.view`, `post.view|post.edit`, or `post.view&post.delete`, globally or
//! for a single `(model, reference_id)` target. Grants are read through a
//! [`GrantSource`], flattened into a [`PermissionSet`], and memoized through a
//! [`CacheStore`].

pub mod cache;
pub mod config;
pub mod error;
pub mod permission;
pub mod principal;
pub mod resolver;
pub mod storage;

pub use cache::{CacheEntry, CacheStore, MemoryCacheStore};
pub use config::{AclConfig, MergePolicy};
pub use error::{AclError, Result};
pub use permission::{
    Combinator, Expression, Grant, Operator, PermissionQuery, PermissionRecord, PermissionSet,
    PermissionValue, Target,
};
pub use principal::{Principal, Role, RoleAssignment, RoleId, UserId};
pub use resolver::{PermissionResolver, PrincipalHandle};
pub use storage::{GrantChange, GrantSource, InMemoryGrantSource};
