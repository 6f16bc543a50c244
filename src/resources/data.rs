// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stateful resource specs: relational database, cache and object storage

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::graph::Reference;

/// Database engine and major version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseEngine {
    pub name: String,
    pub version: String,
}

impl DatabaseEngine {
    pub fn postgres(version: &str) -> Self {
        Self {
            name: "postgres".to_string(),
            version: version.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseParameterGroup {
    pub engine: DatabaseEngine,
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Gp2,
    Gp3,
    Io1,
}

/// Relational database instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInstance {
    pub engine: DatabaseEngine,
    pub instance_type: String,
    pub port: u16,
    pub subnets: Vec<Reference>,
    pub security_groups: Vec<Reference>,
    pub allocated_storage_gb: u32,
    pub storage_type: StorageType,
    pub storage_encrypted: bool,
    pub encryption_key: Reference,
    pub credentials: Reference,
    pub multi_az: bool,
    pub backup_retention_days: u32,
    pub preferred_backup_window: String,
    pub preferred_maintenance_window: String,
    pub parameter_group: Reference,
    pub deletion_protection: bool,
    pub monitoring_interval_secs: u32,
    pub enable_performance_insights: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSubnetGroup {
    pub description: String,
    pub subnets: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheParameterGroup {
    pub family: String,
    pub description: String,
    pub properties: BTreeMap<String, String>,
}

/// In-memory cache cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheCluster {
    pub engine: String,
    pub node_type: String,
    pub num_cache_nodes: u8,
    pub port: u16,
    pub subnet_group: Reference,
    pub parameter_group: Reference,
    pub security_groups: Vec<Reference>,
    pub preferred_maintenance_window: String,
    pub snapshot_retention_limit: u32,
    pub snapshot_window: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageClass {
    InfrequentAccess,
    GlacierInstantRetrieval,
    Glacier,
    DeepArchive,
}

impl StorageClass {
    /// Relative coldness; larger is cheaper and slower
    pub fn tier(&self) -> u8 {
        match self {
            Self::InfrequentAccess => 1,
            Self::GlacierInstantRetrieval => 2,
            Self::Glacier => 3,
            Self::DeepArchive => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub storage_class: StorageClass,
    pub after_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleRule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Transition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub noncurrent_version_transitions: Vec<Transition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noncurrent_version_expiration_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_days: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Head,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsRule {
    pub allowed_headers: Vec<String>,
    pub allowed_methods: Vec<HttpMethod>,
    pub allowed_origins: Vec<String>,
    pub max_age_secs: u32,
}

/// Object storage bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub name: String,
    pub encryption_key: Reference,
    pub versioned: bool,
    pub block_public_access: bool,
    pub auto_delete_objects: bool,
    pub lifecycle_rules: Vec<LifecycleRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cors: Vec<CorsRule>,
}
