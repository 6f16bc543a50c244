// Copyright (c) 2025 - Cowboy AI, Inc.
//! End-to-end Scenario Tests
//!
//! Synthesizes whole deployments from fixture configurations and checks the
//! resulting graph the way an operator would read it.

mod fixtures;

use std::collections::BTreeSet;
use test_case::test_case;

use fixtures::*;
use proxy_infrastructure::domain::ResourceType;
use proxy_infrastructure::graph::{RemovalPolicy, ResourceSpec};
use proxy_infrastructure::resources::{
    ApplicationProtocol, ListenerAction, RuleStatement, ViewerProtocolPolicy,
};
use proxy_infrastructure::{EdgeStage, StackKind};

#[test]
fn test_dev_scenario() {
    let deployment = synthesize(&dev_config());

    // Network spans two zones
    let zones: BTreeSet<_> = deployment
        .network
        .resources
        .iter()
        .filter_map(|r| match &r.spec {
            ResourceSpec::Subnet(subnet) => Some(subnet.availability_zone.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(zones.len(), 2);
    assert_eq!(deployment.count_of(ResourceType::Vpc), 1);
    assert_eq!(deployment.count_of(ResourceType::NatGateway), 1);

    // Single-node cache
    let ResourceSpec::CacheCluster(cache) = &resource(&deployment.data, "Cache").spec else {
        panic!("Cache is not a cache cluster");
    };
    assert_eq!(cache.num_cache_nodes, 1);
    assert_eq!(cache.node_type, "cache.t3.small");

    // Single-zone, destructible database
    let database = resource(&deployment.data, "Database");
    let ResourceSpec::DatabaseInstance(instance) = &database.spec else {
        panic!("Database is not a database instance");
    };
    assert!(!instance.multi_az);
    assert!(!instance.deletion_protection);
    assert_eq!(database.removal_policy, RemovalPolicy::Destroy);

    // Two tasks, HTTP forwarded straight to the service
    let ResourceSpec::ContainerService(service) = &resource(&deployment.compute, "Service").spec
    else {
        panic!("Service is not a container service");
    };
    assert_eq!(service.desired_count, 2);

    let ResourceSpec::Listener(listener) = &resource(&deployment.compute, "HttpListener").spec
    else {
        panic!("HttpListener is not a listener");
    };
    assert!(matches!(listener.default_action, ListenerAction::Forward { .. }));

    // No edge
    assert_eq!(deployment.edge, EdgeStage::Absent);
    assert_eq!(deployment.count_of(ResourceType::WebAcl), 0);
    assert_eq!(deployment.count_of(ResourceType::Distribution), 0);
}

#[test]
fn test_prod_scenario() {
    let deployment = synthesize(&prod_config());
    let EdgeStage::Present(edge) = &deployment.edge else {
        panic!("prod fixture enables the edge");
    };

    // One firewall, rate limit evaluated first
    let acls = specs_of(edge, ResourceType::WebAcl);
    assert_eq!(acls.len(), 1);
    let ResourceSpec::WebAcl(acl) = acls[0] else {
        unreachable!()
    };
    let priority = |is_rate: bool| {
        acl.rules
            .iter()
            .find(|rule| matches!(rule.statement, RuleStatement::RateBased { .. }) == is_rate)
            .map(|rule| rule.priority)
            .unwrap()
    };
    assert!(priority(true) < priority(false));

    // One distribution forcing HTTPS
    let distributions = specs_of(edge, ResourceType::Distribution);
    assert_eq!(distributions.len(), 1);
    let ResourceSpec::Distribution(distribution) = distributions[0] else {
        unreachable!()
    };
    assert_eq!(
        distribution.default_behavior.viewer_protocol_policy,
        ViewerProtocolPolicy::RedirectToHttps
    );

    // Retained database, permanent redirect on plaintext HTTP
    let database = resource(&deployment.data, "Database");
    assert_eq!(database.removal_policy, RemovalPolicy::Retain);
    let ResourceSpec::DatabaseInstance(instance) = &database.spec else {
        panic!("Database is not a database instance");
    };
    assert!(instance.deletion_protection);
    assert!(instance.multi_az);

    let ResourceSpec::Listener(listener) = &resource(&deployment.compute, "HttpListener").spec
    else {
        panic!("HttpListener is not a listener");
    };
    assert_eq!(
        listener.default_action,
        ListenerAction::Redirect {
            protocol: ApplicationProtocol::Https,
            port: 443,
            permanent: true,
        }
    );
}

#[test_case("dev" => RemovalPolicy::Destroy ; "development database is destructible")]
#[test_case("staging" => RemovalPolicy::Destroy ; "staging database is destructible")]
#[test_case("prod" => RemovalPolicy::Retain ; "production database is retained")]
fn test_database_removal_policy(env: &str) -> RemovalPolicy {
    let deployment = synthesize(&config_with(env, 2, 1, 1, 2, false));
    resource(&deployment.data, "Database").removal_policy
}

#[test_case("dev", false ; "development forwards")]
#[test_case("qa", false ; "qa forwards")]
#[test_case("prod", true ; "production redirects")]
fn test_listener_branches_on_environment(env: &str, redirects: bool) {
    let deployment = synthesize(&config_with(env, 2, 1, 1, 2, false));
    let ResourceSpec::Listener(listener) = &resource(&deployment.compute, "HttpListener").spec
    else {
        panic!("HttpListener is not a listener");
    };

    assert_eq!(
        matches!(listener.default_action, ListenerAction::Redirect { .. }),
        redirects
    );
}

#[test]
fn test_stack_dependencies_follow_the_contract_table() {
    let deployment = synthesize(&prod_config());

    for stack in deployment.stacks() {
        for dependency in &stack.dependencies {
            let upstream = deployment.stack(dependency).unwrap();
            assert!(
                stack.kind.allowed_dependencies().contains(&upstream.kind),
                "{} may not depend on {}",
                stack.name,
                upstream.name
            );
        }
    }

    let edge = deployment.edge.stack().unwrap();
    assert_eq!(edge.kind, StackKind::Edge);
    assert_eq!(edge.dependencies, vec![deployment.compute.name.clone()]);
}

#[test]
fn test_every_resource_carries_the_tagging_contract() {
    let deployment = synthesize(&dev_config());

    for stack in deployment.stacks() {
        for resource in &stack.resources {
            assert_eq!(resource.tags["Environment"], "dev", "{}", resource.logical_id);
            assert_eq!(resource.tags["Project"], "LLM-Proxy");
            assert!(resource.tags.contains_key("ManagedBy"));
        }
    }
}
