// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declared resources
//!
//! A [`Resource`] is one node of the graph: a logical id unique within its
//! stack, a typed [`ResourceSpec`], an explicit teardown policy and the tags
//! of the tagging contract.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::reference::{collect_references, Reference};
use crate::domain::ResourceType;
use crate::errors::InfrastructureResult;
use crate::resources::*;

/// What happens to a resource when its stack is torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalPolicy {
    /// Delete the resource together with the stack
    Destroy,
    /// Orphan the resource and keep its data
    Retain,
}

impl RemovalPolicy {
    /// Retain in production, destroy everywhere else
    pub fn for_environment(is_production: bool) -> Self {
        if is_production {
            Self::Retain
        } else {
            Self::Destroy
        }
    }

    /// Deletion policy understood by the provisioning engine
    pub fn deletion_policy(&self) -> &'static str {
        match self {
            Self::Destroy => "Delete",
            Self::Retain => "Retain",
        }
    }
}

/// Resource tags, ordered by key
pub type Tags = BTreeMap<String, String>;

/// Typed resource properties, one variant per resource kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "properties", rename_all = "snake_case")]
pub enum ResourceSpec {
    Vpc(Vpc),
    Subnet(Subnet),
    InternetGateway(InternetGateway),
    NatGateway(NatGateway),
    FlowLog(FlowLog),
    InterfaceEndpoint(InterfaceEndpoint),
    GatewayEndpoint(GatewayEndpoint),
    SecurityGroup(SecurityGroup),
    EncryptionKey(EncryptionKey),
    Secret(Secret),
    Role(Role),
    DatabaseParameterGroup(DatabaseParameterGroup),
    DatabaseInstance(DatabaseInstance),
    CacheSubnetGroup(CacheSubnetGroup),
    CacheParameterGroup(CacheParameterGroup),
    CacheCluster(CacheCluster),
    Bucket(Bucket),
    ContainerCluster(ContainerCluster),
    ImageRepository(ImageRepository),
    TaskDefinition(TaskDefinition),
    ContainerService(ContainerService),
    LoadBalancer(LoadBalancer),
    TargetGroup(TargetGroup),
    Listener(Listener),
    ScalableTarget(ScalableTarget),
    ScalingPolicy(ScalingPolicy),
    LogGroup(LogGroup),
    AlertTopic(AlertTopic),
    Alarm(Alarm),
    Dashboard(Dashboard),
    WebAcl(WebAcl),
    Distribution(Distribution),
}

macro_rules! resource_specs {
    ($($kind:ident),* $(,)?) => {
        impl ResourceSpec {
            /// Taxonomy entry of this spec
            pub fn resource_type(&self) -> ResourceType {
                match self {
                    $(Self::$kind(_) => ResourceType::$kind,)*
                }
            }
        }

        $(
            impl From<$kind> for ResourceSpec {
                fn from(spec: $kind) -> Self {
                    Self::$kind(spec)
                }
            }
        )*
    };
}

resource_specs!(
    Vpc,
    Subnet,
    InternetGateway,
    NatGateway,
    FlowLog,
    InterfaceEndpoint,
    GatewayEndpoint,
    SecurityGroup,
    EncryptionKey,
    Secret,
    Role,
    DatabaseParameterGroup,
    DatabaseInstance,
    CacheSubnetGroup,
    CacheParameterGroup,
    CacheCluster,
    Bucket,
    ContainerCluster,
    ImageRepository,
    TaskDefinition,
    ContainerService,
    LoadBalancer,
    TargetGroup,
    Listener,
    ScalableTarget,
    ScalingPolicy,
    LogGroup,
    AlertTopic,
    Alarm,
    Dashboard,
    WebAcl,
    Distribution,
);

impl ResourceSpec {
    /// Properties alone, without the type tag
    pub fn properties(&self) -> InfrastructureResult<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        Ok(value
            .get_mut("properties")
            .map(serde_json::Value::take)
            .unwrap_or(serde_json::Value::Null))
    }
}

/// One node of the resource graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub logical_id: String,
    pub spec: ResourceSpec,
    pub removal_policy: RemovalPolicy,
    pub tags: Tags,
}

impl Resource {
    pub fn resource_type(&self) -> ResourceType {
        self.spec.resource_type()
    }

    /// Every reference embedded in this resource's properties
    pub fn references(&self) -> InfrastructureResult<Vec<Reference>> {
        let mut found = Vec::new();
        collect_references(&serde_json::to_value(&self.spec)?, &mut found);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Attribute, StackName};

    #[test]
    fn test_spec_type_tag() {
        let spec = ResourceSpec::from(AlertTopic {
            display_name: "Alarms - dev".into(),
        });
        assert_eq!(spec.resource_type(), ResourceType::AlertTopic);

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["type"], "alert_topic");
        assert_eq!(
            spec.properties().unwrap(),
            serde_json::json!({ "displayName": "Alarms - dev" })
        );
    }

    #[test]
    fn test_resource_references() {
        let vpc = Reference::new(StackName::new("Net"), "Vpc", Attribute::Id);
        let resource = Resource {
            logical_id: "Igw".into(),
            spec: InternetGateway { vpc: vpc.clone() }.into(),
            removal_policy: RemovalPolicy::Destroy,
            tags: Tags::new(),
        };

        assert_eq!(resource.references().unwrap(), vec![vpc]);
    }

    #[test]
    fn test_removal_policy_for_environment() {
        assert_eq!(RemovalPolicy::for_environment(true), RemovalPolicy::Retain);
        assert_eq!(RemovalPolicy::for_environment(false), RemovalPolicy::Destroy);
        assert_eq!(RemovalPolicy::Destroy.deletion_policy(), "Delete");
    }
}
