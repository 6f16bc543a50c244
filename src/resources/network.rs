// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network resource specs

use serde::{Deserialize, Serialize};

use crate::domain::{Ipv4Cidr, SubnetTier};
use crate::graph::{Expr, Reference};

/// Isolated virtual network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vpc {
    pub cidr: Ipv4Cidr,
    pub max_azs: u8,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternetGateway {
    pub vpc: Reference,
}

/// Default route of a subnet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "via", content = "target", rename_all = "snake_case")]
pub enum SubnetRoute {
    InternetGateway(Reference),
    NatGateway(Reference),
    /// No route beyond the network
    Local,
}

/// Subnet in one zone and one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub vpc: Reference,
    pub tier: SubnetTier,
    pub availability_zone: String,
    pub cidr: Ipv4Cidr,
    pub map_public_ip_on_launch: bool,
    pub default_route: SubnetRoute,
}

/// NAT gateway living in a public subnet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatGateway {
    pub subnet: Reference,
    pub allocate_elastic_ip: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrafficType {
    All,
    Accept,
    Reject,
}

/// Traffic audit log delivered to a log group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowLog {
    pub vpc: Reference,
    pub traffic_type: TrafficType,
    pub log_group: Reference,
}

/// Managed service reachable through a private endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointService {
    SecretsManager,
    EcrApi,
    EcrDocker,
    S3,
}

impl EndpointService {
    /// Regional service name
    pub fn service_name(&self, region: &str) -> String {
        let service = match self {
            Self::SecretsManager => "secretsmanager",
            Self::EcrApi => "ecr.api",
            Self::EcrDocker => "ecr.dkr",
            Self::S3 => "s3",
        };
        format!("com.amazonaws.{region}.{service}")
    }
}

/// Interface endpoint: private network interfaces in the given subnets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceEndpoint {
    pub vpc: Reference,
    pub service: EndpointService,
    pub service_name: String,
    pub subnets: Vec<Reference>,
    pub private_dns_enabled: bool,
}

/// Gateway endpoint: route-table entry for the given subnets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEndpoint {
    pub vpc: Reference,
    pub service: EndpointService,
    pub service_name: String,
    pub route_subnets: Vec<Reference>,
}

/// Log sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogGroup {
    pub name: Expr,
    /// `None` keeps events forever
    pub retention_days: Option<u32>,
}
