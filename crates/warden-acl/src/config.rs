//! Resolver configuration

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{AclError, Result};

/// Environment variable prefix (`WARDEN_ACL_CACHE_MINUTES`, ...)
pub const ENV_PREFIX: &str = "WARDEN_ACL";

/// Which side wins when caller-supplied extra permissions collide with persisted ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Persisted grants keep their value; extras only add new keys
    #[default]
    PreferPersisted,
    /// Extras replace persisted values for the same key
    PreferExtra,
}

/// Configuration for permission resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    /// Lifetime of a memoized permission set in minutes; 0 disables memoization
    pub cache_minutes: u64,
    /// Prefix of cache keys
    pub cache_prefix: String,
    /// Merge policy for extra permissions
    pub extra_merge: MergePolicy,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            cache_minutes: 1,
            cache_prefix: "acl.permissions".to_string(),
            extra_merge: MergePolicy::PreferPersisted,
        }
    }
}

impl AclConfig {
    /// Load configuration from an optional file and the environment.
    ///
    /// Environment variables take precedence over the file. Missing files are
    /// not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));

        let config: AclConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        tracing::debug!(
            cache_minutes = config.cache_minutes,
            cache_prefix = %config.cache_prefix,
            "Loaded permission resolver configuration"
        );
        Ok(config)
    }

    /// Check the configuration for unusable values
    pub fn validate(&self) -> Result<()> {
        if self.cache_prefix.trim().is_empty() {
            return Err(AclError::Validation(
                "Cache prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Time-to-live for memoized sets, or None when memoization is off
    pub fn cache_ttl(&self) -> Option<Duration> {
        match self.cache_minutes {
            0 => None,
            minutes => Some(Duration::from_secs(minutes.saturating_mul(60))),
        }
    }

    pub fn with_cache_minutes(mut self, minutes: u64) -> Self {
        self.cache_minutes = minutes;
        self
    }

    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    pub fn with_extra_merge(mut self, policy: MergePolicy) -> Self {
        self.extra_merge = policy;
        self
    }
}
