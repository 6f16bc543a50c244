// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security resource specs: tier security groups, keys, secrets and identities

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{Ipv4Cidr, Port};
use crate::graph::{Expr, Reference};

/// Resource tier a security group guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityTier {
    /// Internet-facing load balancer
    LoadBalancer,
    /// Container tasks
    Compute,
    /// Relational database
    Database,
    /// In-memory cache
    Cache,
}

impl SecurityTier {
    /// Tiers living in the isolated subnets
    pub fn is_isolated(&self) -> bool {
        matches!(self, Self::Database | Self::Cache)
    }
}

impl fmt::Display for SecurityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadBalancer => write!(f, "load-balancer"),
            Self::Compute => write!(f, "compute"),
            Self::Database => write!(f, "database"),
            Self::Cache => write!(f, "cache"),
        }
    }
}

/// Traffic source of an ingress rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "source", rename_all = "snake_case")]
pub enum Peer {
    /// Any IPv4 address
    AnyIpv4,
    /// An address range
    Cidr(Ipv4Cidr),
    /// Members of another security group
    SecurityGroup(Reference),
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyIpv4 => write!(f, "0.0.0.0/0"),
            Self::Cidr(cidr) => write!(f, "{cidr}"),
            Self::SecurityGroup(group) => write!(f, "sg:{group}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressRule {
    pub peer: Peer,
    pub port: Port,
    pub description: String,
}

/// Directional allow-list bound to one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroup {
    pub vpc: Reference,
    pub tier: SecurityTier,
    pub description: String,
    pub allow_all_outbound: bool,
    pub ingress: Vec<IngressRule>,
}

impl SecurityGroup {
    pub fn new(vpc: Reference, tier: SecurityTier, description: &str, allow_all_outbound: bool) -> Self {
        Self {
            vpc,
            tier,
            description: description.to_string(),
            allow_all_outbound,
            ingress: Vec::new(),
        }
    }

    pub fn allow(mut self, peer: Peer, port: Port, description: &str) -> Self {
        self.ingress.push(IngressRule {
            peer,
            port,
            description: description.to_string(),
        });
        self
    }
}

/// Symmetric encryption key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionKey {
    pub description: String,
    pub enable_key_rotation: bool,
}

/// Value generated by the secret store at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSecret {
    pub template: BTreeMap<String, String>,
    pub generate_key: String,
    pub exclude_characters: String,
    pub length: u32,
}

/// Secret store entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub description: String,
    pub contents: SecretContents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecretContents {
    /// Generated value bound to the consumer at creation
    Generated(GeneratedSecret),
    /// Named fields populated out of band after provisioning
    Fields { fields: Vec<String> },
}

impl Secret {
    /// Whether the secret exposes a field of that name
    pub fn has_field(&self, field: &str) -> bool {
        match &self.contents {
            SecretContents::Generated(generated) => {
                generated.generate_key == field || generated.template.contains_key(field)
            }
            SecretContents::Fields { fields } => fields.iter().any(|f| f == field),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<Expr>,
}

impl PolicyStatement {
    pub fn allow(actions: &[&str], resources: Vec<Expr>) -> Self {
        Self {
            effect: Effect::Allow,
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources,
        }
    }
}

/// Identity with attached permissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub description: String,
    pub assumed_by: String,
    pub managed_policies: Vec<String>,
    pub statements: Vec<PolicyStatement>,
}

impl Role {
    /// Every action granted by the inline statements
    pub fn granted_actions(&self) -> impl Iterator<Item = &str> {
        self.statements
            .iter()
            .filter(|s| s.effect == Effect::Allow)
            .flat_map(|s| s.actions.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Attribute, StackName};

    #[test]
    fn test_peer_wire_shape() {
        let peer = Peer::Cidr("10.0.2.0/24".parse().unwrap());
        assert_eq!(
            serde_json::to_value(&peer).unwrap(),
            serde_json::json!({ "kind": "cidr", "source": "10.0.2.0/24" })
        );
        assert_eq!(
            serde_json::to_value(Peer::AnyIpv4).unwrap(),
            serde_json::json!({ "kind": "any_ipv4" })
        );
    }

    #[test]
    fn test_security_group_builder() {
        let vpc = Reference::new(StackName::new("Net"), "Vpc", Attribute::Id);
        let group = SecurityGroup::new(vpc, SecurityTier::LoadBalancer, "lb", true)
            .allow(Peer::AnyIpv4, Port::tcp(80), "http")
            .allow(Peer::AnyIpv4, Port::tcp(443), "https");

        assert_eq!(group.ingress.len(), 2);
        assert!(!group.tier.is_isolated());
        assert!(SecurityTier::Cache.is_isolated());
    }

    #[test]
    fn test_secret_fields() {
        let generated = Secret {
            description: "db".into(),
            contents: SecretContents::Generated(GeneratedSecret {
                template: BTreeMap::from([("username".to_string(), "admin".to_string())]),
                generate_key: "password".into(),
                exclude_characters: "\"@/".into(),
                length: 32,
            }),
        };
        assert!(generated.has_field("password"));
        assert!(generated.has_field("username"));
        assert!(!generated.has_field("token"));

        let fields = Secret {
            description: "keys".into(),
            contents: SecretContents::Fields {
                fields: vec!["API_KEY".into()],
            },
        };
        assert!(fields.has_field("API_KEY"));
    }
}
