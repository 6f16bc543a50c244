// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Graph Synthesis
//!
//! Synthesis is a pure function of (configuration, seed). These properties
//! must hold for every configuration the validator accepts.

use proptest::prelude::*;

use crate::fixtures::config_with;
use proxy_infrastructure::domain::{ResourceType, SubnetTier};
use proxy_infrastructure::graph::ResourceSpec;
use proxy_infrastructure::resources::{Peer, SecurityTier};
use proxy_infrastructure::{Deployment, EnvironmentConfig, Manifest, UniquenessSeed};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Environment names, production included
fn environment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("prod".to_string()),
        Just("dev".to_string()),
        "[a-z][a-z0-9-]{0,10}",
    ]
}

/// Valid configurations: nat <= zones, 1 <= desired <= max
fn valid_config() -> impl Strategy<Value = EnvironmentConfig> {
    (environment(), 1u8..=6, 1u32..=10, 0u32..=20, any::<bool>())
        .prop_flat_map(|(env, zones, desired, headroom, edge)| {
            (0u8..=zones).prop_map(move |nat| {
                config_with(&env, zones, nat, desired, desired + headroom, edge)
            })
        })
}

fn seed() -> impl Strategy<Value = UniquenessSeed> {
    "[a-z0-9]{1,16}".prop_map(|s| UniquenessSeed::new(s).unwrap())
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: Synthesis is deterministic
    ///
    /// The same configuration and seed yield the same graph and manifest.
    #[test]
    fn prop_synthesis_is_deterministic(config in valid_config(), seed in seed()) {
        let first = Deployment::synthesize(&config, &seed).unwrap();
        let second = Deployment::synthesize(&config, &seed).unwrap();
        prop_assert_eq!(&first, &second);

        let first_json = Manifest::from_deployment(&first).unwrap().to_json_pretty().unwrap();
        let second_json = Manifest::from_deployment(&second).unwrap().to_json_pretty().unwrap();
        prop_assert_eq!(first_json, second_json);
    }

    /// Property: Isolated tiers never admit the internet or the load balancer
    ///
    /// Every database and cache ingress range lies inside a private-egress subnet.
    #[test]
    fn prop_isolated_tiers_stay_private(config in valid_config()) {
        let deployment = Deployment::synthesize(&config, &UniquenessSeed::new("p").unwrap()).unwrap();
        let private: Vec<_> = deployment
            .network
            .resources
            .iter()
            .filter_map(|r| match &r.spec {
                ResourceSpec::Subnet(subnet) if subnet.tier == SubnetTier::PrivateEgress => Some(subnet.cidr),
                _ => None,
            })
            .collect();

        for stack in deployment.stacks() {
            for resource in &stack.resources {
                let ResourceSpec::SecurityGroup(group) = &resource.spec else { continue };
                for rule in &group.ingress {
                    match group.tier {
                        SecurityTier::Database | SecurityTier::Cache => {
                            let Peer::Cidr(cidr) = &rule.peer else {
                                prop_assert!(false, "{} admits {}", resource.logical_id, rule.peer);
                                continue;
                            };
                            prop_assert!(
                                private.iter().any(|range| range.contains(cidr)),
                                "{} admits {} outside the private ranges", resource.logical_id, cidr
                            );
                        }
                        SecurityTier::Compute => {
                            prop_assert!(matches!(rule.peer, Peer::SecurityGroup(_)), "compute admits {}", rule.peer);
                        }
                        SecurityTier::LoadBalancer => {}
                    }
                }
            }
        }
    }

    /// Property: Autoscaling capacity is pinned to configured task counts
    #[test]
    fn prop_scaling_bounds_are_monotonic(config in valid_config()) {
        let deployment = Deployment::synthesize(&config, &UniquenessSeed::new("p").unwrap()).unwrap();

        let targets: Vec<_> = deployment
            .compute
            .resources
            .iter()
            .filter_map(|r| match &r.spec {
                ResourceSpec::ScalableTarget(target) => Some(target),
                _ => None,
            })
            .collect();

        prop_assert_eq!(targets.len(), 1);
        prop_assert_eq!(targets[0].min_capacity, config.compute.desired_count);
        prop_assert_eq!(targets[0].max_capacity, config.compute.max_count);
        prop_assert!(targets[0].max_capacity >= targets[0].min_capacity);
    }

    /// Property: Edge resources exist exactly when the edge is enabled
    #[test]
    fn prop_edge_is_conditional(config in valid_config()) {
        let deployment = Deployment::synthesize(&config, &UniquenessSeed::new("p").unwrap()).unwrap();
        let expected = usize::from(config.edge_enabled);

        prop_assert_eq!(deployment.edge.is_present(), config.edge_enabled);
        prop_assert_eq!(deployment.count_of(ResourceType::WebAcl), expected);
        prop_assert_eq!(deployment.count_of(ResourceType::Distribution), expected);
    }

    /// Property: Subnet layout follows zones and NAT placement
    #[test]
    fn prop_network_layout_follows_config(config in valid_config()) {
        let deployment = Deployment::synthesize(&config, &UniquenessSeed::new("p").unwrap()).unwrap();
        let zones = usize::from(config.network.zone_count);

        prop_assert_eq!(deployment.network.count_of(ResourceType::Subnet), 3 * zones);
        prop_assert_eq!(
            deployment.network.count_of(ResourceType::NatGateway),
            usize::from(config.network.nat_gateway_count)
        );
    }
}
