// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment
//!
//! Wires the five stacks together in dependency order and validates the
//! resulting graph before handing it out. Synthesis is all-or-nothing: a
//! graph that breaks any contract or invariant is never returned.
//!
//! ```text
//! Network ──> Data ──> Compute ──> Monitoring
//!                         └──────> Edge (only when enabled)
//! ```

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::EnvironmentConfig;
use crate::domain::invariants::{
    validate_compute_ingress, validate_distribution_origin, validate_edge_cardinality,
    validate_isolated_ingress, validate_rule_order, validate_scaling_bounds,
};
use crate::domain::{Ipv4Cidr, ResourceType, SubnetTier};
use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::graph::{Attribute, Reference, ResourceSpec, Stack, StackKind, StackName};
use crate::naming::UniquenessSeed;
use crate::resources::SecurityTier;
use crate::stacks::{ComputeStack, DataStack, EdgeStack, MonitoringStack, NetworkStack};

/// Whether the edge stack is part of the deployment
///
/// Decided once from configuration; nothing downstream branches on it again.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeStage {
    Present(Stack),
    Absent,
}

impl EdgeStage {
    pub fn stack(&self) -> Option<&Stack> {
        match self {
            Self::Present(stack) => Some(stack),
            Self::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

/// A fully synthesized and validated resource graph
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    pub config: EnvironmentConfig,
    pub network: Stack,
    pub data: Stack,
    pub compute: Stack,
    pub monitoring: Stack,
    pub edge: EdgeStage,
}

impl Deployment {
    /// Synthesize every stack and validate the graph
    pub fn synthesize(
        config: &EnvironmentConfig,
        seed: &UniquenessSeed,
    ) -> InfrastructureResult<Self> {
        info!(
            "Synthesizing deployment for {} in {}",
            config.env, config.region
        );

        let network = NetworkStack::synthesize(config)?;
        let data = DataStack::synthesize(config, &network.handle, seed)?;
        let compute = ComputeStack::synthesize(
            config,
            &network.handle,
            &data.handle.database,
            &data.handle.cache,
            &data.handle.storage,
        )?;
        let monitoring =
            MonitoringStack::synthesize(config, &compute.handle, &data.handle.database)?;

        let edge = if config.edge_enabled {
            EdgeStage::Present(EdgeStack::synthesize(config, &compute.handle)?.stack)
        } else {
            info!("Edge stage disabled for {}", config.env);
            EdgeStage::Absent
        };

        let deployment = Self {
            config: config.clone(),
            network: network.stack,
            data: data.stack,
            compute: compute.stack,
            monitoring: monitoring.stack,
            edge,
        };

        deployment.validate()?;
        info!(
            "Deployment for {} synthesized: {} stacks, {} resources",
            config.env,
            deployment.stacks().count(),
            deployment.resource_count()
        );

        Ok(deployment)
    }

    /// Stacks in dependency order; every stack follows all of its dependencies
    pub fn stacks(&self) -> impl Iterator<Item = &Stack> {
        [&self.network, &self.data, &self.compute, &self.monitoring]
            .into_iter()
            .chain(self.edge.stack())
    }

    pub fn stack(&self, name: &StackName) -> Option<&Stack> {
        self.stacks().find(|stack| &stack.name == name)
    }

    pub fn resource_count(&self) -> usize {
        self.stacks().map(|stack| stack.resources.len()).sum()
    }

    /// Total number of resources of a type across every stack
    pub fn count_of(&self, resource_type: ResourceType) -> usize {
        self.stacks().map(|stack| stack.count_of(resource_type)).sum()
    }

    /// Check every contract and invariant of the graph
    pub fn validate(&self) -> InfrastructureResult<()> {
        self.validate_dependencies()?;
        self.validate_references()?;
        self.validate_security_tiers()?;
        self.validate_scaling()?;
        self.validate_edge()?;
        debug!("Deployment for {} passed validation", self.config.env);
        Ok(())
    }

    /// Declared dependencies must name earlier stacks of an allowed kind
    fn validate_dependencies(&self) -> InfrastructureResult<()> {
        let mut seen: HashMap<&StackName, StackKind> = HashMap::new();

        for stack in self.stacks() {
            for dependency in &stack.dependencies {
                let allowed = seen
                    .get(dependency)
                    .is_some_and(|kind| stack.kind.allowed_dependencies().contains(kind));
                if !allowed {
                    return Err(InfrastructureError::ContractViolation {
                        stack: stack.name.to_string(),
                        reference: dependency.to_string(),
                        reason: "is not an upstream stack this stack may depend on".to_string(),
                    });
                }
            }
            seen.insert(&stack.name, stack.kind);
        }

        Ok(())
    }

    /// Every reference resolves inside its own stack or a declared dependency
    fn validate_references(&self) -> InfrastructureResult<()> {
        let declared: HashMap<&StackName, HashSet<&str>> = self
            .stacks()
            .map(|stack| {
                let ids = stack.resources.iter().map(|r| r.logical_id.as_str()).collect();
                (&stack.name, ids)
            })
            .collect();

        for stack in self.stacks() {
            let mut references = Vec::new();
            for resource in &stack.resources {
                references.extend(resource.references()?);
            }
            for output in &stack.outputs {
                references.extend(output.value.references().into_iter().cloned());
            }

            for reference in references {
                let target = reference.stack();
                if target != &stack.name && !stack.depends_on(target) {
                    return Err(violation(stack, &reference, "targets an undeclared stack"));
                }

                let resolves = declared
                    .get(target)
                    .is_some_and(|ids| ids.contains(reference.logical_id()));
                if !resolves {
                    return Err(violation(stack, &reference, "names no declared resource"));
                }
            }
        }

        Ok(())
    }

    /// Isolated tiers admit only private ranges; compute admits only the load balancer
    fn validate_security_tiers(&self) -> InfrastructureResult<()> {
        let private_ranges: Vec<Ipv4Cidr> = self
            .network
            .resources
            .iter()
            .filter_map(|r| match &r.spec {
                ResourceSpec::Subnet(subnet) if subnet.tier == SubnetTier::PrivateEgress => {
                    Some(subnet.cidr)
                }
                _ => None,
            })
            .collect();

        let load_balancer_group = self.compute.resources.iter().find_map(|r| match &r.spec {
            ResourceSpec::SecurityGroup(group) if group.tier == SecurityTier::LoadBalancer => Some(
                Reference::new(self.compute.name.clone(), &r.logical_id, Attribute::Id),
            ),
            _ => None,
        });

        for stack in self.stacks() {
            for resource in &stack.resources {
                let ResourceSpec::SecurityGroup(group) = &resource.spec else {
                    continue;
                };

                match group.tier {
                    SecurityTier::Database | SecurityTier::Cache => {
                        validate_isolated_ingress(group, &private_ranges)?
                    }
                    SecurityTier::Compute => {
                        let Some(load_balancer_group) = &load_balancer_group else {
                            return Err(InfrastructureError::ContractViolation {
                                stack: stack.name.to_string(),
                                reference: resource.logical_id.clone(),
                                reason: "compute tier has no load balancer group to admit"
                                    .to_string(),
                            });
                        };
                        validate_compute_ingress(group, load_balancer_group)?
                    }
                    SecurityTier::LoadBalancer => {}
                }
            }
        }

        Ok(())
    }

    fn validate_scaling(&self) -> InfrastructureResult<()> {
        let desired = self.config.compute.desired_count;
        for resource in &self.compute.resources {
            if let ResourceSpec::ScalableTarget(target) = &resource.spec {
                validate_scaling_bounds(target, desired)?;
            }
        }
        Ok(())
    }

    /// Edge resources exist exactly when the edge stage is present
    fn validate_edge(&self) -> InfrastructureResult<()> {
        validate_edge_cardinality(
            self.edge.is_present(),
            self.count_of(ResourceType::WebAcl),
            self.count_of(ResourceType::Distribution),
        )?;

        let Some(edge) = self.edge.stack() else {
            return Ok(());
        };

        let load_balancer = self
            .compute
            .resources_of(ResourceType::LoadBalancer)
            .next()
            .map(|r| Reference::new(self.compute.name.clone(), &r.logical_id, Attribute::Id));

        for resource in &edge.resources {
            match &resource.spec {
                ResourceSpec::WebAcl(acl) => validate_rule_order(acl)?,
                ResourceSpec::Distribution(distribution) => match &load_balancer {
                    Some(load_balancer) => {
                        validate_distribution_origin(distribution, load_balancer)?
                    }
                    None => {
                        warn!("Distribution {} has no load balancer to front", resource.logical_id);
                        return Err(InfrastructureError::ContractViolation {
                            stack: edge.name.to_string(),
                            reference: resource.logical_id.clone(),
                            reason: "compute stack declares no load balancer".to_string(),
                        });
                    }
                },
                _ => {}
            }
        }

        Ok(())
    }
}

fn violation(stack: &Stack, reference: &Reference, reason: &str) -> InfrastructureError {
    InfrastructureError::ContractViolation {
        stack: stack.name.to_string(),
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}
