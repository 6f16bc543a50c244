// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioned Resource Type Domain Model
//!
//! Defines the taxonomy of resources a deployment can declare. This is the
//! vocabulary shared by the stacks, the graph validator and the manifest
//! projection handed to the provisioning engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provisioned resource type taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    // Network
    /// Isolated virtual network
    Vpc,
    /// Subnet in one zone and one tier
    Subnet,
    /// Internet gateway attached to the network
    InternetGateway,
    /// NAT gateway providing private-tier egress
    NatGateway,
    /// Traffic audit log
    FlowLog,
    /// Private interface endpoint for a managed service
    InterfaceEndpoint,
    /// Route-table gateway endpoint for a managed service
    GatewayEndpoint,

    // Security
    /// Directional allow-list bound to one tier
    SecurityGroup,
    /// Symmetric encryption key
    EncryptionKey,
    /// Secret store entry
    Secret,
    /// Identity with attached permissions
    Role,

    // Data
    /// Relational database parameter group
    DatabaseParameterGroup,
    /// Relational database instance
    DatabaseInstance,
    /// Cache subnet placement group
    CacheSubnetGroup,
    /// Cache engine parameter group
    CacheParameterGroup,
    /// In-memory cache cluster
    CacheCluster,
    /// Object storage bucket
    Bucket,

    // Compute
    /// Container cluster
    ContainerCluster,
    /// Container image repository
    ImageRepository,
    /// Container task definition
    TaskDefinition,
    /// Long-running container service
    ContainerService,
    /// Application load balancer
    LoadBalancer,
    /// Load balancer target group
    TargetGroup,
    /// Load balancer listener
    Listener,
    /// Autoscaling capacity bounds
    ScalableTarget,
    /// Target-tracking scaling policy
    ScalingPolicy,

    // Observability
    /// Log sink
    LogGroup,
    /// Notification channel for alarms
    AlertTopic,
    /// Metric threshold alarm
    Alarm,
    /// Metrics dashboard
    Dashboard,

    // Edge
    /// Web-request firewall
    WebAcl,
    /// Content delivery distribution
    Distribution,
}

/// Resource category for grouping and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Network,
    Security,
    Data,
    Compute,
    Observability,
    Edge,
}

impl ResourceType {
    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::InternetGateway => "internet_gateway",
            Self::NatGateway => "nat_gateway",
            Self::FlowLog => "flow_log",
            Self::InterfaceEndpoint => "interface_endpoint",
            Self::GatewayEndpoint => "gateway_endpoint",
            Self::SecurityGroup => "security_group",
            Self::EncryptionKey => "encryption_key",
            Self::Secret => "secret",
            Self::Role => "role",
            Self::DatabaseParameterGroup => "database_parameter_group",
            Self::DatabaseInstance => "database_instance",
            Self::CacheSubnetGroup => "cache_subnet_group",
            Self::CacheParameterGroup => "cache_parameter_group",
            Self::CacheCluster => "cache_cluster",
            Self::Bucket => "bucket",
            Self::ContainerCluster => "container_cluster",
            Self::ImageRepository => "image_repository",
            Self::TaskDefinition => "task_definition",
            Self::ContainerService => "container_service",
            Self::LoadBalancer => "load_balancer",
            Self::TargetGroup => "target_group",
            Self::Listener => "listener",
            Self::ScalableTarget => "scalable_target",
            Self::ScalingPolicy => "scaling_policy",
            Self::LogGroup => "log_group",
            Self::AlertTopic => "alert_topic",
            Self::Alarm => "alarm",
            Self::Dashboard => "dashboard",
            Self::WebAcl => "web_acl",
            Self::Distribution => "distribution",
        }
    }

    /// Type name understood by the provisioning engine
    pub fn provider_type(&self) -> &'static str {
        match self {
            Self::Vpc => "AWS::EC2::VPC",
            Self::Subnet => "AWS::EC2::Subnet",
            Self::InternetGateway => "AWS::EC2::InternetGateway",
            Self::NatGateway => "AWS::EC2::NatGateway",
            Self::FlowLog => "AWS::EC2::FlowLog",
            Self::InterfaceEndpoint | Self::GatewayEndpoint => "AWS::EC2::VPCEndpoint",
            Self::SecurityGroup => "AWS::EC2::SecurityGroup",
            Self::EncryptionKey => "AWS::KMS::Key",
            Self::Secret => "AWS::SecretsManager::Secret",
            Self::Role => "AWS::IAM::Role",
            Self::DatabaseParameterGroup => "AWS::RDS::DBParameterGroup",
            Self::DatabaseInstance => "AWS::RDS::DBInstance",
            Self::CacheSubnetGroup => "AWS::ElastiCache::SubnetGroup",
            Self::CacheParameterGroup => "AWS::ElastiCache::ParameterGroup",
            Self::CacheCluster => "AWS::ElastiCache::CacheCluster",
            Self::Bucket => "AWS::S3::Bucket",
            Self::ContainerCluster => "AWS::ECS::Cluster",
            Self::ImageRepository => "AWS::ECR::Repository",
            Self::TaskDefinition => "AWS::ECS::TaskDefinition",
            Self::ContainerService => "AWS::ECS::Service",
            Self::LoadBalancer => "AWS::ElasticLoadBalancingV2::LoadBalancer",
            Self::TargetGroup => "AWS::ElasticLoadBalancingV2::TargetGroup",
            Self::Listener => "AWS::ElasticLoadBalancingV2::Listener",
            Self::ScalableTarget => "AWS::ApplicationAutoScaling::ScalableTarget",
            Self::ScalingPolicy => "AWS::ApplicationAutoScaling::ScalingPolicy",
            Self::LogGroup => "AWS::Logs::LogGroup",
            Self::AlertTopic => "AWS::SNS::Topic",
            Self::Alarm => "AWS::CloudWatch::Alarm",
            Self::Dashboard => "AWS::CloudWatch::Dashboard",
            Self::WebAcl => "AWS::WAFv2::WebACL",
            Self::Distribution => "AWS::CloudFront::Distribution",
        }
    }

    /// Get the category of this resource type
    pub fn category(&self) -> ResourceCategory {
        match self {
            Self::Vpc
            | Self::Subnet
            | Self::InternetGateway
            | Self::NatGateway
            | Self::FlowLog
            | Self::InterfaceEndpoint
            | Self::GatewayEndpoint => ResourceCategory::Network,

            Self::SecurityGroup | Self::EncryptionKey | Self::Secret | Self::Role => {
                ResourceCategory::Security
            }

            Self::DatabaseParameterGroup
            | Self::DatabaseInstance
            | Self::CacheSubnetGroup
            | Self::CacheParameterGroup
            | Self::CacheCluster
            | Self::Bucket => ResourceCategory::Data,

            Self::ContainerCluster
            | Self::ImageRepository
            | Self::TaskDefinition
            | Self::ContainerService
            | Self::LoadBalancer
            | Self::TargetGroup
            | Self::Listener
            | Self::ScalableTarget
            | Self::ScalingPolicy => ResourceCategory::Compute,

            Self::LogGroup | Self::AlertTopic | Self::Alarm | Self::Dashboard => {
                ResourceCategory::Observability
            }

            Self::WebAcl | Self::Distribution => ResourceCategory::Edge,
        }
    }

    /// Whether the resource holds data that outlives its configuration
    pub fn is_stateful(&self) -> bool {
        matches!(
            self,
            Self::DatabaseInstance
                | Self::CacheCluster
                | Self::Bucket
                | Self::EncryptionKey
                | Self::Secret
                | Self::LogGroup
        )
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
