// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Graph Invariants
//!
//! Business rules every synthesized graph must satisfy before it is handed to
//! the provisioning engine. All functions are pure and return detailed
//! validation results.
//!
//! # Invariant Categories
//!
//! 1. **Tier Isolation**: database and cache ingress only from private-egress ranges
//! 2. **Trust Chain**: compute ingress only from the load balancer group
//! 3. **Scaling Bounds**: capacity pinned to the configured task counts
//! 4. **Edge Cardinality**: firewall and distribution emitted together, in front of the load balancer

use crate::domain::Ipv4Cidr;
use crate::graph::Reference;
use crate::resources::{
    Distribution, Peer, RuleStatement, ScalableTarget, SecurityGroup, SecurityTier, WebAcl,
};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Isolated tier reachable from outside the private-egress tier
    #[error("{tier} tier ingress from {peer} is not a private-egress subnet range")]
    IsolatedTierExposure { tier: SecurityTier, peer: String },

    /// Security group applied to a tier it does not guard
    #[error("Security group for {actual} tier used where {expected} tier is required")]
    TierMismatch {
        expected: SecurityTier,
        actual: SecurityTier,
    },

    /// Compute ingress not sourced from the load balancer group
    #[error("Compute tier ingress from {peer} bypasses the load balancer tier")]
    ComputeIngressBypass { peer: String },

    /// Autoscaling bounds inconsistent with the configured task counts
    #[error("Scaling bounds [{min}, {max}] inconsistent with desired count {desired}")]
    ScalingBounds { min: u32, max: u32, desired: u32 },

    /// Edge resources emitted in the wrong number
    #[error("Expected {expected} {resource} resource(s), found {found}")]
    EdgeCardinality {
        resource: &'static str,
        expected: usize,
        found: usize,
    },

    /// Distribution not fronting the compute load balancer
    #[error("Distribution origin {0} is not the compute load balancer")]
    ForeignOrigin(String),

    /// Firewall rules out of evaluation order
    #[error("Firewall rule order violated: {0}")]
    RuleOrder(String),
}

/// Validate ingress of a database or cache tier group
///
/// # Rules
/// - Group must guard an isolated tier
/// - Every source must be an address range inside a private-egress subnet
/// - At least one rule must exist, otherwise the tier is unreachable
pub fn validate_isolated_ingress(
    group: &SecurityGroup,
    private_ranges: &[Ipv4Cidr],
) -> ValidationResult {
    if !group.tier.is_isolated() {
        return Err(ValidationError::TierMismatch {
            expected: SecurityTier::Database,
            actual: group.tier,
        });
    }

    for rule in &group.ingress {
        let allowed = match &rule.peer {
            Peer::Cidr(cidr) => private_ranges.iter().any(|range| range.contains(cidr)),
            Peer::AnyIpv4 | Peer::SecurityGroup(_) => false,
        };
        if !allowed {
            return Err(ValidationError::IsolatedTierExposure {
                tier: group.tier,
                peer: rule.peer.to_string(),
            });
        }
    }

    if group.ingress.is_empty() {
        return Err(ValidationError::IsolatedTierExposure {
            tier: group.tier,
            peer: "nothing".to_string(),
        });
    }

    Ok(())
}

/// Validate ingress of the compute tier group
///
/// Every rule must name the load balancer group; never an address range.
pub fn validate_compute_ingress(
    group: &SecurityGroup,
    load_balancer_group: &Reference,
) -> ValidationResult {
    if group.tier != SecurityTier::Compute {
        return Err(ValidationError::TierMismatch {
            expected: SecurityTier::Compute,
            actual: group.tier,
        });
    }

    for rule in &group.ingress {
        match &rule.peer {
            Peer::SecurityGroup(source) if source.same_resource(load_balancer_group) => {}
            other => {
                return Err(ValidationError::ComputeIngressBypass {
                    peer: other.to_string(),
                })
            }
        }
    }

    Ok(())
}

/// Validate autoscaling capacity against configured task counts
///
/// # Rules
/// - `min_capacity == desired_count`
/// - `max_capacity >= min_capacity`
pub fn validate_scaling_bounds(target: &ScalableTarget, desired_count: u32) -> ValidationResult {
    if target.min_capacity != desired_count || target.max_capacity < target.min_capacity {
        return Err(ValidationError::ScalingBounds {
            min: target.min_capacity,
            max: target.max_capacity,
            desired: desired_count,
        });
    }
    Ok(())
}

/// Validate the number of edge resources
///
/// Zero of each when the edge is absent, exactly one of each when present.
pub fn validate_edge_cardinality(
    present: bool,
    firewalls: usize,
    distributions: usize,
) -> ValidationResult {
    let expected = usize::from(present);
    if firewalls != expected {
        return Err(ValidationError::EdgeCardinality {
            resource: "firewall",
            expected,
            found: firewalls,
        });
    }
    if distributions != expected {
        return Err(ValidationError::EdgeCardinality {
            resource: "distribution",
            expected,
            found: distributions,
        });
    }
    Ok(())
}

/// Validate that a distribution fronts the given load balancer
pub fn validate_distribution_origin(
    distribution: &Distribution,
    load_balancer: &Reference,
) -> ValidationResult {
    let origin = &distribution.default_behavior.origin.domain_name;
    if !origin.references().iter().any(|r| r.same_resource(load_balancer)) {
        return Err(ValidationError::ForeignOrigin(format!("{origin:?}")));
    }
    Ok(())
}

/// Validate firewall rule evaluation order
///
/// # Rules
/// - Priorities are unique
/// - Rate limiting is evaluated before injection detection
pub fn validate_rule_order(acl: &WebAcl) -> ValidationResult {
    let ordered = acl.ordered_rules();

    if ordered.windows(2).any(|pair| pair[0].priority == pair[1].priority) {
        return Err(ValidationError::RuleOrder(format!(
            "duplicate priorities in {}",
            acl.name
        )));
    }

    let rate = ordered
        .iter()
        .position(|rule| matches!(rule.statement, RuleStatement::RateBased { .. }));
    let injection = ordered
        .iter()
        .position(|rule| matches!(rule.statement, RuleStatement::SqlInjection { .. }));

    if let (Some(rate), Some(injection)) = (rate, injection) {
        if rate > injection {
            return Err(ValidationError::RuleOrder(
                "rate limit evaluated after injection detection".to_string(),
            ));
        }
    }

    Ok(())
}
