// Copyright (c) 2025 - Cowboy AI, Inc.
//! Environment Configuration
//!
//! One immutable [`EnvironmentConfig`] is parsed per deployment and shared by
//! reference with every stack. Parsing goes through an all-`Option` raw shape
//! so that a missing field is reported by its dotted path before any resource
//! is declared.
//!
//! # File layout
//!
//! ```json
//! {
//!   "env": "dev",
//!   "region": "us-east-1",
//!   "vpc": { "maxAzs": 2, "natGateways": 1 },
//!   "rds": { "instanceClass": "burstable3", "instanceSize": "medium",
//!            "allocatedStorage": 20, "multiAz": false, "backupRetention": 7 },
//!   "redis": { "nodeType": "cache.t3.micro" },
//!   "ecs": { "cpu": 512, "memory": 1024, "desiredCount": 2, "maxCount": 4 },
//!   "cloudfront": { "enabled": false }
//! }
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::domain::Ipv4Cidr;

/// Region used when the configuration does not name one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Network block used when the configuration does not name one
pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";

/// Container image used when the configuration does not name one
pub const DEFAULT_IMAGE: &str = "ghcr.io/berriai/litellm:main-stable";

/// Environment name whose resources are retained and hardened
pub const PRODUCTION: &str = "prod";

/// Configuration error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Unparseable configuration: {0}")]
    Parse(String),

    #[error("Configuration is for environment {found}, but {expected} was selected")]
    EnvironmentMismatch { expected: String, found: String },

    #[error("Cannot read configuration {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Invalid uniqueness seed: {0}")]
    InvalidSeed(String),
}

fn require<T>(value: Option<T>, field: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::MissingField(field))
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidField {
        field,
        reason: reason.into(),
    }
}

// ============================================================================
// Value Objects
// ============================================================================

/// Environment name, embedded in stack and resource names
///
/// # Invariants
/// - Non-empty, at most 16 characters
/// - Lowercase ASCII letters, digits and `-`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentName(String);

impl EnvironmentName {
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();

        if name.is_empty() || name.len() > 16 {
            return Err(invalid("env", "must be 1-16 characters"));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(invalid(
                "env",
                format!("{name:?} may only contain lowercase letters, digits and '-'"),
            ));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Production environments retain stateful resources and redirect plaintext HTTP
    pub fn is_production(&self) -> bool {
        self.0 == PRODUCTION
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database instance family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceClass {
    Burstable3,
    Burstable4Graviton,
    Standard5,
    Standard6Graviton,
    Memory5,
    Memory6Graviton,
}

impl InstanceClass {
    /// Short family code used in instance type names
    pub fn code(&self) -> &'static str {
        match self {
            Self::Burstable3 => "t3",
            Self::Burstable4Graviton => "t4g",
            Self::Standard5 => "m5",
            Self::Standard6Graviton => "m6g",
            Self::Memory5 => "r5",
            Self::Memory6Graviton => "r6g",
        }
    }
}

impl FromStr for InstanceClass {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "burstable" | "burstable3" | "t3" => Ok(Self::Burstable3),
            "burstable4graviton" | "t4g" => Ok(Self::Burstable4Graviton),
            "standard" | "standard5" | "m5" => Ok(Self::Standard5),
            "standard6graviton" | "m6g" => Ok(Self::Standard6Graviton),
            "memory" | "memory5" | "r5" => Ok(Self::Memory5),
            "memory6graviton" | "r6g" => Ok(Self::Memory6Graviton),
            _ => Err(invalid(
                "rds.instanceClass",
                format!("unknown instance class {s:?}"),
            )),
        }
    }
}

/// Instance size within a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceSize {
    Micro,
    Small,
    Medium,
    Large,
    Xlarge,
    Xlarge2,
    Xlarge4,
    Xlarge8,
}

impl InstanceSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Micro => "micro",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Xlarge => "xlarge",
            Self::Xlarge2 => "2xlarge",
            Self::Xlarge4 => "4xlarge",
            Self::Xlarge8 => "8xlarge",
        }
    }
}

impl FromStr for InstanceSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "micro" => Ok(Self::Micro),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "xlarge" => Ok(Self::Xlarge),
            "2xlarge" | "xlarge2" => Ok(Self::Xlarge2),
            "4xlarge" | "xlarge4" => Ok(Self::Xlarge4),
            "8xlarge" | "xlarge8" => Ok(Self::Xlarge8),
            _ => Err(format!("unknown instance size {s:?}")),
        }
    }
}

// ============================================================================
// Sizing Records
// ============================================================================

/// Network sizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSizing {
    pub zone_count: u8,
    /// Zero is accepted: private-tier egress is then unavailable
    pub nat_gateway_count: u8,
    pub cidr: Ipv4Cidr,
}

/// Relational database sizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSizing {
    pub instance_class: InstanceClass,
    pub instance_size: InstanceSize,
    pub allocated_storage_gb: u32,
    pub multi_az: bool,
    pub backup_retention_days: u32,
}

impl DatabaseSizing {
    /// Instance type name, e.g. `db.t3.medium`
    pub fn instance_type(&self) -> String {
        format!(
            "db.{}.{}",
            self.instance_class.code(),
            self.instance_size.as_str()
        )
    }
}

/// Cache sizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSizing {
    /// Full node type name, e.g. `cache.t3.micro`
    pub node_type: String,
}

/// Target group health check tolerances
///
/// The defaults are lenient so a slow-starting application is not cycled
/// before it binds its port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckSettings {
    pub path: String,
    pub healthy_threshold: u32,
    pub unhealthy_threshold: u32,
    pub timeout_secs: u32,
    pub interval_secs: u32,
    pub healthy_http_codes: String,
    pub grace_period_secs: u32,
}

impl Default for HealthCheckSettings {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            healthy_threshold: 2,
            unhealthy_threshold: 10,
            timeout_secs: 30,
            interval_secs: 60,
            healthy_http_codes: "200-499".to_string(),
            grace_period_secs: 300,
        }
    }
}

/// Container compute sizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeSizing {
    pub cpu: u32,
    pub memory_mib: u32,
    pub desired_count: u32,
    pub max_count: u32,
    pub image: String,
    pub health_check: HealthCheckSettings,
}

/// Immutable per-deployment configuration
///
/// # Invariants
/// - Constructed once, validated, then only ever borrowed
/// - `compute.max_count >= compute.desired_count >= 1`
/// - `network.nat_gateway_count <= network.zone_count`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    pub env: EnvironmentName,
    pub region: String,
    pub network: NetworkSizing,
    pub database: DatabaseSizing,
    pub cache: CacheSizing,
    pub compute: ComputeSizing,
    pub edge_enabled: bool,
}

impl EnvironmentConfig {
    /// Whether this is the production environment
    pub fn is_production(&self) -> bool {
        self.env.is_production()
    }

    /// Parse a configuration document for the selected environment
    ///
    /// A document without an `env` field takes the selected name; a document
    /// naming a different environment is rejected.
    pub fn from_json_str(selected_env: &str, json: &str) -> Result<Self, ConfigError> {
        let mut raw: RawEnvironmentConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;

        match raw.env.as_deref() {
            Some(found) if found != selected_env => {
                return Err(ConfigError::EnvironmentMismatch {
                    expected: selected_env.to_string(),
                    found: found.to_string(),
                });
            }
            Some(_) => {}
            None => raw.env = Some(selected_env.to_string()),
        }

        Self::try_from(raw)
    }

    /// Load `<dir>/<env>.json`
    pub fn load(dir: impl AsRef<Path>, env: &str) -> Result<Self, ConfigError> {
        let path = dir.as_ref().join(format!("{env}.json"));
        debug!(path = %path.display(), "Loading environment configuration");

        let json = std::fs::read_to_string(&path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_json_str(env, &json)
    }
}

// ============================================================================
// Raw (unvalidated) shape
// ============================================================================

/// Configuration document as written on disk
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEnvironmentConfig {
    pub env: Option<String>,
    pub region: Option<String>,
    #[serde(default)]
    pub vpc: RawVpcConfig,
    #[serde(default)]
    pub rds: RawRdsConfig,
    #[serde(default)]
    pub redis: RawRedisConfig,
    #[serde(default)]
    pub ecs: RawEcsConfig,
    #[serde(default)]
    pub cloudfront: RawCloudFrontConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVpcConfig {
    pub max_azs: Option<u8>,
    pub nat_gateways: Option<u8>,
    pub cidr: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRdsConfig {
    pub instance_class: Option<String>,
    pub instance_size: Option<String>,
    pub allocated_storage: Option<u32>,
    pub multi_az: Option<bool>,
    pub backup_retention: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRedisConfig {
    pub node_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEcsConfig {
    pub cpu: Option<u32>,
    pub memory: Option<u32>,
    pub desired_count: Option<u32>,
    pub max_count: Option<u32>,
    pub image: Option<String>,
    #[serde(default)]
    pub health_check: RawHealthCheckConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHealthCheckConfig {
    pub path: Option<String>,
    pub healthy_threshold: Option<u32>,
    pub unhealthy_threshold: Option<u32>,
    pub timeout: Option<u32>,
    pub interval: Option<u32>,
    pub healthy_http_codes: Option<String>,
    pub grace_period: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCloudFrontConfig {
    pub enabled: Option<bool>,
}

impl TryFrom<RawEnvironmentConfig> for EnvironmentConfig {
    type Error = ConfigError;

    fn try_from(raw: RawEnvironmentConfig) -> Result<Self, Self::Error> {
        let env = EnvironmentName::new(require(raw.env, "env")?)?;
        let region = raw.region.unwrap_or_else(|| DEFAULT_REGION.to_string());
        if region.is_empty() {
            return Err(invalid("region", "must not be empty"));
        }

        Ok(Self {
            env,
            region,
            network: network_sizing(raw.vpc)?,
            database: database_sizing(raw.rds)?,
            cache: cache_sizing(raw.redis)?,
            compute: compute_sizing(raw.ecs)?,
            edge_enabled: raw.cloudfront.enabled.unwrap_or(false),
        })
    }
}

fn network_sizing(raw: RawVpcConfig) -> Result<NetworkSizing, ConfigError> {
    let zone_count = raw.max_azs.unwrap_or(2);
    if !(1..=6).contains(&zone_count) {
        return Err(invalid("vpc.maxAzs", format!("{zone_count} is outside 1-6")));
    }

    let nat_gateway_count = raw.nat_gateways.unwrap_or(1);
    if nat_gateway_count > zone_count {
        return Err(invalid(
            "vpc.natGateways",
            format!("{nat_gateway_count} exceeds the {zone_count} availability zones"),
        ));
    }

    let cidr_str = raw.cidr.unwrap_or_else(|| DEFAULT_VPC_CIDR.to_string());
    let cidr: Ipv4Cidr = cidr_str
        .parse()
        .map_err(|e: crate::domain::NetworkError| invalid("vpc.cidr", e.to_string()))?;

    // three tiers of /24 per zone
    if cidr.prefix_length() > 24 || cidr.size() < 3 * u64::from(zone_count) * 256 {
        return Err(invalid(
            "vpc.cidr",
            format!("{cidr} cannot hold three /24 subnets per zone"),
        ));
    }

    Ok(NetworkSizing {
        zone_count,
        nat_gateway_count,
        cidr,
    })
}

fn database_sizing(raw: RawRdsConfig) -> Result<DatabaseSizing, ConfigError> {
    let instance_class: InstanceClass =
        require(raw.instance_class, "rds.instanceClass")?.parse()?;
    let instance_size: InstanceSize = require(raw.instance_size, "rds.instanceSize")?
        .parse()
        .map_err(|e: String| invalid("rds.instanceSize", e))?;

    let allocated_storage_gb = require(raw.allocated_storage, "rds.allocatedStorage")?;
    if !(20..=65_536).contains(&allocated_storage_gb) {
        return Err(invalid(
            "rds.allocatedStorage",
            format!("{allocated_storage_gb} GiB is outside 20-65536"),
        ));
    }

    let backup_retention_days = require(raw.backup_retention, "rds.backupRetention")?;
    if backup_retention_days > 35 {
        return Err(invalid(
            "rds.backupRetention",
            format!("{backup_retention_days} days exceeds 35"),
        ));
    }

    Ok(DatabaseSizing {
        instance_class,
        instance_size,
        allocated_storage_gb,
        multi_az: raw.multi_az.unwrap_or(false),
        backup_retention_days,
    })
}

fn cache_sizing(raw: RawRedisConfig) -> Result<CacheSizing, ConfigError> {
    let node_type = require(raw.node_type, "redis.nodeType")?;

    // A bare size ("small") means the burstable family
    let node_type = if node_type.contains('.') {
        if !node_type.starts_with("cache.") {
            return Err(invalid(
                "redis.nodeType",
                format!("{node_type:?} is not a cache node type"),
            ));
        }
        node_type
    } else {
        let size: InstanceSize = node_type
            .parse()
            .map_err(|e: String| invalid("redis.nodeType", e))?;
        format!("cache.t3.{}", size.as_str())
    };

    Ok(CacheSizing { node_type })
}

fn compute_sizing(raw: RawEcsConfig) -> Result<ComputeSizing, ConfigError> {
    let cpu = require(raw.cpu, "ecs.cpu")?;
    if cpu == 0 {
        return Err(invalid("ecs.cpu", "must be greater than zero"));
    }

    let memory_mib = require(raw.memory, "ecs.memory")?;
    if memory_mib == 0 {
        return Err(invalid("ecs.memory", "must be greater than zero"));
    }

    let desired_count = require(raw.desired_count, "ecs.desiredCount")?;
    if desired_count == 0 {
        return Err(invalid("ecs.desiredCount", "must be at least 1"));
    }

    let max_count = require(raw.max_count, "ecs.maxCount")?;
    if max_count < desired_count {
        return Err(invalid(
            "ecs.maxCount",
            format!("{max_count} is below desiredCount {desired_count}"),
        ));
    }

    let image = raw.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string());
    if image.is_empty() {
        return Err(invalid("ecs.image", "must not be empty"));
    }

    Ok(ComputeSizing {
        cpu,
        memory_mib,
        desired_count,
        max_count,
        image,
        health_check: health_check_settings(raw.health_check)?,
    })
}

fn health_check_settings(raw: RawHealthCheckConfig) -> Result<HealthCheckSettings, ConfigError> {
    let defaults = HealthCheckSettings::default();
    let settings = HealthCheckSettings {
        path: raw.path.unwrap_or(defaults.path),
        healthy_threshold: raw.healthy_threshold.unwrap_or(defaults.healthy_threshold),
        unhealthy_threshold: raw
            .unhealthy_threshold
            .unwrap_or(defaults.unhealthy_threshold),
        timeout_secs: raw.timeout.unwrap_or(defaults.timeout_secs),
        interval_secs: raw.interval.unwrap_or(defaults.interval_secs),
        healthy_http_codes: raw.healthy_http_codes.unwrap_or(defaults.healthy_http_codes),
        grace_period_secs: raw.grace_period.unwrap_or(defaults.grace_period_secs),
    };

    if !settings.path.starts_with('/') {
        return Err(invalid("ecs.healthCheck.path", "must start with '/'"));
    }
    if !(2..=10).contains(&settings.healthy_threshold) {
        return Err(invalid("ecs.healthCheck.healthyThreshold", "must be 2-10"));
    }
    if !(2..=10).contains(&settings.unhealthy_threshold) {
        return Err(invalid("ecs.healthCheck.unhealthyThreshold", "must be 2-10"));
    }
    if settings.timeout_secs == 0 || settings.timeout_secs >= settings.interval_secs {
        return Err(invalid(
            "ecs.healthCheck.timeout",
            "must be non-zero and shorter than the interval",
        ));
    }
    if settings.healthy_http_codes.is_empty() {
        return Err(invalid("ecs.healthCheck.healthyHttpCodes", "must not be empty"));
    }

    Ok(settings)
}
