// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for proxy-infrastructure
//!
//! Deterministic configurations and seeds shared by the integration suites.
//! The seed is a fixed constant so that bucket names never depend on the clock.

#![allow(dead_code)]

use proxy_infrastructure::domain::ResourceType;
use proxy_infrastructure::graph::{Resource, ResourceSpec, Stack};
use proxy_infrastructure::{Deployment, EnvironmentConfig, UniquenessSeed};

/// Fixed uniqueness seed (timestamp-shaped, leading digits dropped)
pub const FIXED_SEED: &str = "4021337";

/// Development environment without an edge
pub const DEV_CONFIG: &str = r#"{
    "env": "dev",
    "vpc": { "maxAzs": 2, "natGateways": 1 },
    "rds": { "instanceClass": "burstable", "instanceSize": "medium",
             "allocatedStorage": 20, "multiAz": false, "backupRetention": 7 },
    "redis": { "nodeType": "small" },
    "ecs": { "cpu": 512, "memory": 1024, "desiredCount": 2, "maxCount": 4 },
    "cloudfront": { "enabled": false }
}"#;

/// Production environment behind the edge
pub const PROD_CONFIG: &str = r#"{
    "env": "prod",
    "vpc": { "maxAzs": 3, "natGateways": 2 },
    "rds": { "instanceClass": "burstable", "instanceSize": "large",
             "allocatedStorage": 100, "multiAz": true, "backupRetention": 14 },
    "redis": { "nodeType": "cache.t3.medium" },
    "ecs": { "cpu": 1024, "memory": 2048, "desiredCount": 3, "maxCount": 12 },
    "cloudfront": { "enabled": true }
}"#;

pub fn seed() -> UniquenessSeed {
    UniquenessSeed::new(FIXED_SEED).expect("Invalid seed in test fixture")
}

pub fn dev_config() -> EnvironmentConfig {
    EnvironmentConfig::from_json_str("dev", DEV_CONFIG).expect("Invalid dev fixture")
}

pub fn prod_config() -> EnvironmentConfig {
    EnvironmentConfig::from_json_str("prod", PROD_CONFIG).expect("Invalid prod fixture")
}

/// Configuration with the knobs the property suites vary
pub fn config_with(
    env: &str,
    zones: u8,
    nat_gateways: u8,
    desired: u32,
    max: u32,
    edge: bool,
) -> EnvironmentConfig {
    let json = format!(
        r#"{{
            "vpc": {{ "maxAzs": {zones}, "natGateways": {nat_gateways} }},
            "rds": {{ "instanceClass": "t3", "instanceSize": "medium",
                      "allocatedStorage": 20, "backupRetention": 7 }},
            "redis": {{ "nodeType": "micro" }},
            "ecs": {{ "cpu": 512, "memory": 1024, "desiredCount": {desired}, "maxCount": {max} }},
            "cloudfront": {{ "enabled": {edge} }}
        }}"#
    );
    EnvironmentConfig::from_json_str(env, &json).expect("Invalid generated fixture")
}

pub fn synthesize(config: &EnvironmentConfig) -> Deployment {
    Deployment::synthesize(config, &seed()).expect("Fixture deployment must synthesize")
}

/// Resource by logical id, panicking with context when absent
pub fn resource<'a>(stack: &'a Stack, logical_id: &str) -> &'a Resource {
    stack
        .resource(logical_id)
        .unwrap_or_else(|| panic!("{} has no resource {}", stack.name, logical_id))
}

/// Specs of one type across a stack
pub fn specs_of(stack: &Stack, resource_type: ResourceType) -> Vec<&ResourceSpec> {
    stack.resources_of(resource_type).map(|r| &r.spec).collect()
}
