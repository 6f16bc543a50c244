// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network stack: segmented address space, flow logging and private endpoints

use tracing::{info, warn};

use super::Synthesized;
use crate::config::EnvironmentConfig;
use crate::domain::{availability_zones, Ipv4Cidr, SubnetTier};
use crate::errors::InfrastructureResult;
use crate::graph::{Expr, Reference, RemovalPolicy, StackBuilder, StackKind};
use crate::handles::{NetworkHandle, SubnetGroup, SubnetHandle};
use crate::naming::RESOURCE_PREFIX;
use crate::resources::{
    EndpointService, FlowLog, GatewayEndpoint, InterfaceEndpoint, InternetGateway, LogGroup,
    NatGateway, Subnet, SubnetRoute, TrafficType, Vpc,
};

/// Prefix length of every carved subnet
pub const SUBNET_PREFIX_LENGTH: u8 = 24;

/// Flow log retention
pub const FLOW_LOG_RETENTION_DAYS: u32 = 365;

const INTERFACE_ENDPOINTS: [(&str, EndpointService); 3] = [
    ("SecretsManagerEndpoint", EndpointService::SecretsManager),
    ("EcrEndpoint", EndpointService::EcrApi),
    ("EcrDockerEndpoint", EndpointService::EcrDocker),
];

/// Builds the network every other stack is placed into
pub struct NetworkStack;

impl NetworkStack {
    pub fn synthesize(config: &EnvironmentConfig) -> InfrastructureResult<Synthesized<NetworkHandle>> {
        let env = config.env.as_str();
        let sizing = &config.network;
        info!(
            "Synthesizing network stack for {}: {} zones, {} NAT gateways",
            env, sizing.zone_count, sizing.nat_gateway_count
        );

        let mut builder = StackBuilder::new(
            StackKind::Network,
            config,
            format!("Network infrastructure for the LLM proxy ({env})"),
        );
        let removal = RemovalPolicy::Destroy;

        let vpc = builder.add(
            "Vpc",
            Vpc {
                cidr: sizing.cidr,
                max_azs: sizing.zone_count,
                enable_dns_hostnames: true,
                enable_dns_support: true,
            },
            removal,
        )?;
        let internet_gateway = builder.add(
            "InternetGateway",
            InternetGateway { vpc: vpc.clone() },
            removal,
        )?;

        let zones = availability_zones(&config.region, sizing.zone_count);
        let carve = |tier: SubnetTier, zone: usize| -> InfrastructureResult<Ipv4Cidr> {
            let tier_offset = SubnetTier::ALL
                .iter()
                .position(|t| *t == tier)
                .unwrap_or_default();
            let index = tier_offset * zones.len() + zone;
            Ok(sizing.cidr.subnet(SUBNET_PREFIX_LENGTH, index as u32)?)
        };

        let mut public = SubnetGroup::new(SubnetTier::Public);
        for (i, zone) in zones.iter().enumerate() {
            let cidr = carve(SubnetTier::Public, i)?;
            let subnet = builder.add(
                &subnet_id(SubnetTier::Public, i),
                Subnet {
                    vpc: vpc.clone(),
                    tier: SubnetTier::Public,
                    availability_zone: zone.clone(),
                    cidr,
                    map_public_ip_on_launch: SubnetTier::Public.is_internet_routable(),
                    default_route: SubnetRoute::InternetGateway(internet_gateway.clone()),
                },
                removal,
            )?;
            public.subnets.push(SubnetHandle {
                subnet,
                cidr,
                availability_zone: zone.clone(),
            });
        }

        let mut nat_gateways: Vec<Reference> = Vec::new();
        for (i, host) in public
            .subnets
            .iter()
            .take(usize::from(sizing.nat_gateway_count))
            .enumerate()
        {
            nat_gateways.push(builder.add(
                &format!("NatGateway{}", i + 1),
                NatGateway {
                    subnet: host.subnet.clone(),
                    allocate_elastic_ip: true,
                },
                removal,
            )?);
        }

        if nat_gateways.is_empty() {
            warn!(
                "No NAT gateways for {}: private-egress subnets have no outbound internet route",
                env
            );
        }

        let mut private_egress = SubnetGroup::new(SubnetTier::PrivateEgress);
        for (i, zone) in zones.iter().enumerate() {
            let cidr = carve(SubnetTier::PrivateEgress, i)?;
            let default_route = match nat_gateways.get(i % nat_gateways.len().max(1)) {
                Some(nat) => SubnetRoute::NatGateway(nat.clone()),
                None => SubnetRoute::Local,
            };
            let subnet = builder.add(
                &subnet_id(SubnetTier::PrivateEgress, i),
                Subnet {
                    vpc: vpc.clone(),
                    tier: SubnetTier::PrivateEgress,
                    availability_zone: zone.clone(),
                    cidr,
                    map_public_ip_on_launch: SubnetTier::PrivateEgress.is_internet_routable(),
                    default_route,
                },
                removal,
            )?;
            private_egress.subnets.push(SubnetHandle {
                subnet,
                cidr,
                availability_zone: zone.clone(),
            });
        }

        let mut isolated = SubnetGroup::new(SubnetTier::Isolated);
        for (i, zone) in zones.iter().enumerate() {
            let cidr = carve(SubnetTier::Isolated, i)?;
            let subnet = builder.add(
                &subnet_id(SubnetTier::Isolated, i),
                Subnet {
                    vpc: vpc.clone(),
                    tier: SubnetTier::Isolated,
                    availability_zone: zone.clone(),
                    cidr,
                    map_public_ip_on_launch: SubnetTier::Isolated.is_internet_routable(),
                    default_route: SubnetRoute::Local,
                },
                removal,
            )?;
            isolated.subnets.push(SubnetHandle {
                subnet,
                cidr,
                availability_zone: zone.clone(),
            });
        }

        let flow_log_group = builder.add(
            "FlowLogGroup",
            LogGroup {
                name: Expr::literal(format!("/vpc/{RESOURCE_PREFIX}/{env}/flow-logs")),
                retention_days: Some(FLOW_LOG_RETENTION_DAYS),
            },
            RemovalPolicy::for_environment(config.is_production()),
        )?;
        builder.add(
            "FlowLog",
            FlowLog {
                vpc: vpc.clone(),
                traffic_type: TrafficType::All,
                log_group: flow_log_group,
            },
            removal,
        )?;

        let endpoint_subnets = private_egress.references();
        for (logical_id, service) in INTERFACE_ENDPOINTS {
            builder.add(
                logical_id,
                InterfaceEndpoint {
                    vpc: vpc.clone(),
                    service,
                    service_name: service.service_name(&config.region),
                    subnets: endpoint_subnets.clone(),
                    private_dns_enabled: true,
                },
                removal,
            )?;
        }
        builder.add(
            "S3Endpoint",
            GatewayEndpoint {
                vpc: vpc.clone(),
                service: EndpointService::S3,
                service_name: EndpointService::S3.service_name(&config.region),
                route_subnets: endpoint_subnets,
            },
            removal,
        )?;

        builder.output("VpcId", &vpc, "VPC ID");

        let handle = NetworkHandle {
            stack: builder.name().clone(),
            vpc,
            cidr: sizing.cidr,
            public,
            private_egress,
            isolated,
        };
        let stack = builder.build();
        info!(
            "Network stack {} synthesized with {} resources",
            stack.name,
            stack.resources.len()
        );

        Ok(Synthesized { stack, handle })
    }
}

/// Logical id of the `zone`-th subnet of a tier, counting from one
fn subnet_id(tier: SubnetTier, zone: usize) -> String {
    format!("{}Subnet{}", tier.label(), zone + 1)
}
