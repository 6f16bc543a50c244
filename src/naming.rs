// Copyright (c) 2025 - Cowboy AI, Inc.
//! Naming and tagging conventions
//!
//! Globally unique names (buckets) carry a time-derived suffix. The suffix is
//! an explicit input to synthesis so that two runs with the same seed emit the
//! same graph.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::config::ConfigError;

/// Value of the `Project` tag on every resource
pub const PROJECT: &str = "LLM-Proxy";

/// Prefix of every stack name
pub const STACK_PREFIX: &str = "LLMProxy";

/// Prefix of physical resource names
pub const RESOURCE_PREFIX: &str = "llm-proxy";

/// Value of the `ManagedBy` tag on every resource
pub const MANAGED_BY: &str = "proxy-infrastructure";

/// Tag keys of the tagging contract
pub const TAG_PROJECT: &str = "Project";
pub const TAG_ENVIRONMENT: &str = "Environment";
pub const TAG_MANAGED_BY: &str = "ManagedBy";

/// Suffix appended to globally unique resource names
///
/// # Invariants
/// - 1-16 characters
/// - Lowercase ASCII letters and digits only (valid in bucket names)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniquenessSeed(String);

impl UniquenessSeed {
    pub fn new(seed: impl Into<String>) -> Result<Self, ConfigError> {
        let seed = seed.into();

        if seed.is_empty() || seed.len() > 16 {
            return Err(ConfigError::InvalidSeed(format!(
                "{seed:?} must be 1-16 characters"
            )));
        }

        if !seed
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ConfigError::InvalidSeed(format!(
                "{seed:?} may only contain lowercase letters and digits"
            )));
        }

        Ok(Self(seed))
    }

    /// Epoch milliseconds of `at` with the six leading digits dropped
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        let millis = at.timestamp_millis().unsigned_abs().to_string();
        let suffix = millis.get(6..).filter(|s| !s.is_empty()).unwrap_or(&millis);
        Self(suffix.to_string())
    }

    /// Seed derived from the current time
    pub fn from_clock() -> Self {
        Self::from_timestamp(Utc::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniquenessSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Physical name `<prefix>-<purpose>-<env>`
pub fn physical_name(purpose: &str, env: &str) -> String {
    format!("{RESOURCE_PREFIX}-{purpose}-{env}")
}

/// Globally unique physical name `<prefix>-<purpose>-<env>-<seed>`
pub fn unique_name(purpose: &str, env: &str, seed: &UniquenessSeed) -> String {
    format!("{RESOURCE_PREFIX}-{purpose}-{env}-{seed}")
}
