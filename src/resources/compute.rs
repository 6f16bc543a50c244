// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute resource specs: container platform, load balancing and autoscaling

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::graph::{Expr, Reference};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerCluster {
    pub name: String,
    pub vpc: Reference,
    pub container_insights: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagMutability {
    Mutable,
    Immutable,
}

/// Container image repository; images past `max_image_count` are pruned oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRepository {
    pub name: String,
    pub image_scan_on_push: bool,
    pub tag_mutability: TagMutability,
    pub max_image_count: u32,
}

/// Field of a secret injected into a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretField {
    pub secret: Reference,
    pub field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    pub container_port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    pub name: String,
    pub image: String,
    pub log_group: Reference,
    pub stream_prefix: String,
    pub environment: BTreeMap<String, Expr>,
    pub secrets: BTreeMap<String, SecretField>,
    pub port_mappings: Vec<PortMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub cpu: u32,
    pub memory_mib: u32,
    pub execution_role: Reference,
    pub task_role: Reference,
    pub containers: Vec<ContainerDefinition>,
}

/// Registration of service tasks in a target group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTarget {
    pub target_group: Reference,
    pub container_name: String,
    pub container_port: u16,
}

/// Long-running container service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerService {
    pub name: String,
    pub cluster: Reference,
    pub task_definition: Reference,
    pub desired_count: u32,
    pub assign_public_ip: bool,
    pub subnets: Vec<Reference>,
    pub security_groups: Vec<Reference>,
    pub health_check_grace_period_secs: u32,
    pub load_balancers: Vec<ServiceTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub name: String,
    pub internet_facing: bool,
    pub subnets: Vec<Reference>,
    pub security_groups: Vec<Reference>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationProtocol {
    Http,
    Https,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Ip,
    Instance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub path: String,
    pub port: u16,
    pub protocol: ApplicationProtocol,
    pub healthy_threshold: u32,
    pub unhealthy_threshold: u32,
    pub timeout_secs: u32,
    pub interval_secs: u32,
    pub healthy_http_codes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroup {
    pub vpc: Reference,
    pub port: u16,
    pub protocol: ApplicationProtocol,
    pub target_type: TargetType,
    pub health_check: HealthCheck,
    pub deregistration_delay_secs: u32,
}

/// What a listener does with a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListenerAction {
    Forward {
        target_groups: Vec<Reference>,
    },
    Redirect {
        protocol: ApplicationProtocol,
        port: u16,
        permanent: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    pub load_balancer: Reference,
    pub port: u16,
    pub protocol: ApplicationProtocol,
    pub default_action: ListenerAction,
}

/// Capacity bounds of a scalable service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalableTarget {
    pub service: Reference,
    pub dimension: String,
    pub min_capacity: u32,
    pub max_capacity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMetric {
    CpuUtilization,
    MemoryUtilization,
}

/// Target-tracking policy; scale-out and scale-in cooldowns are independent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingPolicy {
    pub scalable_target: Reference,
    pub metric: ScalingMetric,
    pub target_utilization_percent: u32,
    pub scale_out_cooldown_secs: u32,
    pub scale_in_cooldown_secs: u32,
}
