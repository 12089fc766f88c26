//! Permission resolution with memoized effective sets
//!
//! A check runs the query through the expression parser, fetches the
//! principal's effective set (from the cache store or by aggregating and
//! normalizing its grants), merges any extra permissions, and evaluates the
//! atoms against the result.

use std::sync::Arc;

use crate::cache::CacheStore;
use crate::config::{AclConfig, MergePolicy};
use crate::error::Result;
use crate::permission::{
    aggregate, evaluate, normalize, normalize_records, resolve_atom, scope_grants, Expression,
    Grant, PermissionQuery, PermissionRecord, PermissionSet, Target,
};
use crate::principal::{Principal, Role, RoleId, UserId};
use crate::storage::{GrantChange, GrantSource};

/// Resolves permission checks for roles and users
pub struct PermissionResolver<S, C> {
    source: Arc<S>,
    cache: Arc<C>,
    config: AclConfig,
}

impl<S, C> PermissionResolver<S, C>
where
    S: GrantSource,
    C: CacheStore,
{
    /// Create a resolver over a grant source and a cache store
    pub fn new(source: Arc<S>, cache: Arc<C>, config: AclConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            cache,
            config,
        })
    }

    pub fn config(&self) -> &AclConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Bind the resolver to one principal
    pub fn principal(&self, principal: impl Into<Principal>) -> PrincipalHandle<'_, S, C> {
        PrincipalHandle {
            resolver: self,
            principal: principal.into(),
        }
    }

    /// Cache key of a principal's effective set
    pub fn cache_key(&self, principal: Principal) -> String {
        format!("{}:{}", self.config.cache_prefix, principal)
    }

    /// Check a permission expression against global grants only
    pub fn can(
        &self,
        principal: impl Into<Principal>,
        query: impl Into<PermissionQuery>,
        operator: Option<&str>,
        extra: Option<&[PermissionRecord]>,
    ) -> Result<bool> {
        self.check(principal.into(), query.into(), None, operator, extra)
    }

    /// Check a permission expression, optionally for one target
    pub fn able(
        &self,
        principal: impl Into<Principal>,
        query: impl Into<PermissionQuery>,
        scope: Option<&Target>,
        operator: Option<&str>,
        extra: Option<&[PermissionRecord]>,
    ) -> Result<bool> {
        self.check(principal.into(), query.into(), scope, operator, extra)
    }

    fn check(
        &self,
        principal: Principal,
        query: PermissionQuery,
        scope: Option<&Target>,
        operator: Option<&str>,
        extra: Option<&[PermissionRecord]>,
    ) -> Result<bool> {
        let expression = Expression::parse(query, operator)?;

        let mut set = self.effective_set(principal)?;
        if let Some(records) = extra.filter(|records| !records.is_empty()) {
            let overwrite = self.config.extra_merge == MergePolicy::PreferExtra;
            set.merge(&normalize_records(records), overwrite);
        }

        let granted = evaluate(&expression, |atom| resolve_atom(atom, &set, scope));

        tracing::debug!(
            principal = %principal,
            atoms = ?expression.atoms(),
            combinator = ?expression.combinator(),
            scope = ?scope,
            granted,
            "Resolved permission check"
        );
        Ok(granted)
    }

    /// Effective permission set of a principal, memoized for the configured TTL.
    ///
    /// Cache failures are logged and fall back to recomputation.
    pub fn effective_set(&self, principal: Principal) -> Result<PermissionSet> {
        let Some(ttl) = self.config.cache_ttl() else {
            return self.compute_set(principal);
        };

        let key = self.cache_key(principal);
        if let Some(set) = self.cached_set(&key) {
            tracing::debug!(principal = %principal, key = %key, "Permission set cache hit");
            return Ok(set);
        }

        tracing::debug!(principal = %principal, key = %key, "Permission set cache miss");
        let set = self.compute_set(principal)?;

        match serde_json::to_value(&set) {
            Ok(value) => {
                if let Err(e) = self.cache.put(&key, value, ttl) {
                    tracing::warn!(key = %key, error = %e, "Failed to store permission set");
                }
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "Failed to encode permission set"),
        }

        Ok(set)
    }

    fn cached_set(&self, key: &str) -> Option<PermissionSet> {
        let value = match self.cache.get(key) {
            Ok(value) => value?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache store unavailable, recomputing");
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(set) => Some(set),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cached permission set");
                None
            }
        }
    }

    /// Build a principal's effective set from the grant source, bypassing the cache
    pub fn compute_set(&self, principal: Principal) -> Result<PermissionSet> {
        let grants = self.collect_grants(principal)?;
        Ok(normalize(&grants))
    }

    fn collect_grants(&self, principal: Principal) -> Result<Vec<Grant>> {
        match principal {
            Principal::Role(id) => Ok(aggregate([self.source.grants_for_role(id)?])),
            Principal::User(id) => {
                let mut per_role = vec![self.source.grants_for_user(id)?];
                for assignment in self.source.assignments_for_user(id)? {
                    let grants = self.source.grants_for_role(assignment.role)?;
                    per_role.push(scope_grants(grants, assignment.target.as_ref()));
                }
                Ok(aggregate(per_role))
            }
        }
    }

    /// Drop a principal's memoized set
    pub fn invalidate(&self, principal: Principal) -> Result<()> {
        let key = self.cache_key(principal);
        let removed = self.cache.forget(&key)?;
        tracing::info!(principal = %principal, key = %key, removed, "Invalidated permission set");
        Ok(())
    }

    /// Invalidate everything a grant change makes stale.
    ///
    /// A role change also evicts the sets of every user holding the role.
    pub fn apply_change(&self, change: &GrantChange) -> Result<()> {
        match change {
            GrantChange::RoleGrants(role) => {
                self.invalidate(Principal::Role(*role))?;
                for user in self.source.users_with_role(*role)? {
                    self.invalidate(Principal::User(user))?;
                }
            }
            GrantChange::UserGrants(user) => self.invalidate(Principal::User(*user))?,
        }
        Ok(())
    }

    /// Roles assigned to a user, in assignment order
    pub fn roles_of(&self, user: UserId) -> Result<Vec<Role>> {
        let mut seen: Vec<RoleId> = Vec::new();
        let mut roles = Vec::new();
        for assignment in self.source.assignments_for_user(user)? {
            if seen.contains(&assignment.role) {
                continue;
            }
            seen.push(assignment.role);
            if let Some(role) = self.source.role(assignment.role)? {
                roles.push(role);
            }
        }
        Ok(roles)
    }

    /// Check a user's role slugs with the same `a|b` / `a&b` grammar as permissions
    pub fn has_role(
        &self,
        user: UserId,
        query: impl Into<PermissionQuery>,
        operator: Option<&str>,
    ) -> Result<bool> {
        let expression = Expression::parse(query, operator)?;
        let slugs: Vec<String> = self.roles_of(user)?.into_iter().map(|r| r.slug).collect();
        Ok(evaluate(&expression, |atom| slugs.iter().any(|slug| slug == atom)))
    }
}

/// A resolver bound to one principal
pub struct PrincipalHandle<'a, S, C> {
    resolver: &'a PermissionResolver<S, C>,
    principal: Principal,
}

impl<S, C> PrincipalHandle<'_, S, C>
where
    S: GrantSource,
    C: CacheStore,
{
    pub fn principal(&self) -> Principal {
        self.principal
    }

    pub fn can(
        &self,
        query: impl Into<PermissionQuery>,
        operator: Option<&str>,
        extra: Option<&[PermissionRecord]>,
    ) -> Result<bool> {
        self.resolver.can(self.principal, query, operator, extra)
    }

    pub fn able(
        &self,
        query: impl Into<PermissionQuery>,
        scope: Option<&Target>,
        operator: Option<&str>,
        extra: Option<&[PermissionRecord]>,
    ) -> Result<bool> {
        self.resolver.able(self.principal, query, scope, operator, extra)
    }

    pub fn permissions(&self) -> Result<PermissionSet> {
        self.resolver.effective_set(self.principal)
    }
}
