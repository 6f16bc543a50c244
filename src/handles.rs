// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cross-stack handles
//!
//! A handle is the typed, read-only view a stack exposes of the resources it
//! owns. Downstream stacks receive handles as constructor arguments and must
//! [`consume`](crate::graph::StackBuilder::consume) them, which records the
//! stack dependency and rejects handles from stacks they may not depend on.

use crate::domain::{Ipv4Cidr, SubnetTier};
use crate::graph::{Attribute, Reference, StackKind, StackName};

/// Typed view of resources owned by one stack
pub trait Handle {
    /// Kind of stack that produces this handle
    const PRODUCER: StackKind;

    /// Name of the stack that owns the referenced resources
    fn stack(&self) -> &StackName;
}

/// One subnet of a tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetHandle {
    pub subnet: Reference,
    pub cidr: Ipv4Cidr,
    pub availability_zone: String,
}

/// Subnets of one tier, in zone order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetGroup {
    pub tier: SubnetTier,
    pub subnets: Vec<SubnetHandle>,
}

impl SubnetGroup {
    pub fn new(tier: SubnetTier) -> Self {
        Self {
            tier,
            subnets: Vec::new(),
        }
    }

    pub fn references(&self) -> Vec<Reference> {
        self.subnets.iter().map(|s| s.subnet.clone()).collect()
    }

    pub fn cidrs(&self) -> Vec<Ipv4Cidr> {
        self.subnets.iter().map(|s| s.cidr).collect()
    }

    pub fn len(&self) -> usize {
        self.subnets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subnets.is_empty()
    }
}

/// The network and its three subnet tiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkHandle {
    pub stack: StackName,
    pub vpc: Reference,
    pub cidr: Ipv4Cidr,
    pub public: SubnetGroup,
    pub private_egress: SubnetGroup,
    pub isolated: SubnetGroup,
}

impl Handle for NetworkHandle {
    const PRODUCER: StackKind = StackKind::Network;

    fn stack(&self) -> &StackName {
        &self.stack
    }
}

/// Relational database and its generated credential secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseHandle {
    pub stack: StackName,
    pub instance: Reference,
    pub port: u16,
    pub credentials: Reference,
    pub security_group: Reference,
}

impl DatabaseHandle {
    pub fn endpoint_address(&self) -> Reference {
        self.instance.attr(Attribute::EndpointAddress)
    }

    pub fn credentials_arn(&self) -> Reference {
        self.credentials.attr(Attribute::Arn)
    }
}

impl Handle for DatabaseHandle {
    const PRODUCER: StackKind = StackKind::Data;

    fn stack(&self) -> &StackName {
        &self.stack
    }
}

/// Cache cluster endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHandle {
    pub stack: StackName,
    pub cluster: Reference,
    pub port: u16,
}

impl CacheHandle {
    pub fn endpoint_address(&self) -> Reference {
        self.cluster.attr(Attribute::EndpointAddress)
    }

    pub fn endpoint_port(&self) -> Reference {
        self.cluster.attr(Attribute::EndpointPort)
    }
}

impl Handle for CacheHandle {
    const PRODUCER: StackKind = StackKind::Data;

    fn stack(&self) -> &StackName {
        &self.stack
    }
}

/// Object storage buckets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageHandle {
    pub stack: StackName,
    pub live_bucket: Reference,
    pub backup_bucket: Reference,
    pub encryption_key: Reference,
}

impl StorageHandle {
    /// ARNs of both buckets
    pub fn bucket_arns(&self) -> Vec<Reference> {
        vec![
            self.live_bucket.attr(Attribute::Arn),
            self.backup_bucket.attr(Attribute::Arn),
        ]
    }
}

impl Handle for StorageHandle {
    const PRODUCER: StackKind = StackKind::Data;

    fn stack(&self) -> &StackName {
        &self.stack
    }
}

/// Public load balancer in front of the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerHandle {
    pub load_balancer: Reference,
    pub security_group: Reference,
    pub target_group: Reference,
}

impl LoadBalancerHandle {
    pub fn dns_name(&self) -> Reference {
        self.load_balancer.attr(Attribute::DnsName)
    }

    /// Metric dimension value of the balancer
    pub fn full_name(&self) -> Reference {
        self.load_balancer.attr(Attribute::FullName)
    }
}

/// Running service and its load balancer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeHandle {
    pub stack: StackName,
    pub cluster: Reference,
    pub service: Reference,
    pub load_balancer: LoadBalancerHandle,
}

impl ComputeHandle {
    pub fn cluster_name(&self) -> Reference {
        self.cluster.attr(Attribute::Name)
    }

    pub fn service_name(&self) -> Reference {
        self.service.attr(Attribute::Name)
    }
}

impl Handle for ComputeHandle {
    const PRODUCER: StackKind = StackKind::Compute;

    fn stack(&self) -> &StackName {
        &self.stack
    }
}

/// Alerting channel and dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringHandle {
    pub stack: StackName,
    pub alert_topic: Reference,
    pub dashboard: Reference,
}

impl Handle for MonitoringHandle {
    const PRODUCER: StackKind = StackKind::Monitoring;

    fn stack(&self) -> &StackName {
        &self.stack
    }
}

/// Public entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeHandle {
    pub stack: StackName,
    pub web_acl: Reference,
    pub distribution: Reference,
}

impl EdgeHandle {
    pub fn domain_name(&self) -> Reference {
        self.distribution.attr(Attribute::DomainName)
    }
}

impl Handle for EdgeHandle {
    const PRODUCER: StackKind = StackKind::Edge;

    fn stack(&self) -> &StackName {
        &self.stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subnet(id: &str, cidr: &str, zone: &str) -> SubnetHandle {
        SubnetHandle {
            subnet: Reference::new(StackName::new("Net"), id, Attribute::Id),
            cidr: cidr.parse().unwrap(),
            availability_zone: zone.to_string(),
        }
    }

    #[test]
    fn test_subnet_group_views() {
        let mut group = SubnetGroup::new(SubnetTier::PrivateEgress);
        assert!(group.is_empty());

        group.subnets.push(subnet("Private1", "10.0.2.0/24", "us-east-1a"));
        group.subnets.push(subnet("Private2", "10.0.3.0/24", "us-east-1b"));

        assert_eq!(group.len(), 2);
        assert_eq!(group.references()[1].logical_id(), "Private2");
        assert_eq!(group.cidrs()[0].to_string(), "10.0.2.0/24");
    }

    #[test]
    fn test_handle_attribute_views() {
        let stack = StackName::new("Data");
        let cache = CacheHandle {
            stack: stack.clone(),
            cluster: Reference::new(stack.clone(), "Cache", Attribute::Id),
            port: 6379,
        };
        assert_eq!(cache.endpoint_port().attribute(), Attribute::EndpointPort);
        assert!(cache.endpoint_address().same_resource(&cache.cluster));
        assert_eq!(CacheHandle::PRODUCER, StackKind::Data);
    }
}
