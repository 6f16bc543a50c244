// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stacks: independently deployable units owning a disjoint set of resources

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use super::reference::{Attribute, Expr, Reference};
use super::resource::{RemovalPolicy, Resource, ResourceSpec, Tags};
use crate::config::EnvironmentConfig;
use crate::domain::ResourceType;
use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::handles::Handle;
use crate::naming::{MANAGED_BY, PROJECT, STACK_PREFIX, TAG_ENVIRONMENT, TAG_MANAGED_BY, TAG_PROJECT};

/// Unique name of a stack within a deployment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackName(String);

impl StackName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `<prefix>-<Kind>-<env>`
    pub fn for_kind(kind: StackKind, env: &str) -> Self {
        Self(format!("{}-{}-{}", STACK_PREFIX, kind.as_str(), env))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The five kinds of stack, in construction order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StackKind {
    Network,
    Data,
    Compute,
    Monitoring,
    Edge,
}

impl StackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "Network",
            Self::Data => "Data",
            Self::Compute => "Compute",
            Self::Monitoring => "Monitoring",
            Self::Edge => "Edge",
        }
    }

    /// Stack kinds this kind may reference
    pub fn allowed_dependencies(&self) -> &'static [StackKind] {
        match self {
            Self::Network => &[],
            Self::Data => &[Self::Network],
            Self::Compute => &[Self::Network, Self::Data],
            Self::Monitoring => &[Self::Compute, Self::Data],
            Self::Edge => &[Self::Compute],
        }
    }
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Human-readable result value for operators
///
/// Outputs are never consumed by other stacks; cross-stack data flows
/// through handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackOutput {
    pub name: String,
    pub value: Expr,
    pub description: String,
}

/// A finalized stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    pub name: StackName,
    pub kind: StackKind,
    pub description: String,
    pub dependencies: Vec<StackName>,
    pub resources: Vec<Resource>,
    pub outputs: Vec<StackOutput>,
}

impl Stack {
    /// Look up a resource by logical id
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.logical_id == logical_id)
    }

    /// All resources of a given type, in declaration order
    pub fn resources_of(&self, resource_type: ResourceType) -> impl Iterator<Item = &Resource> {
        self.resources
            .iter()
            .filter(move |r| r.resource_type() == resource_type)
    }

    /// Number of resources of a given type
    pub fn count_of(&self, resource_type: ResourceType) -> usize {
        self.resources_of(resource_type).count()
    }

    /// Look up an output by name
    pub fn output(&self, name: &str) -> Option<&StackOutput> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn depends_on(&self, name: &StackName) -> bool {
        self.dependencies.contains(name)
    }
}

/// Accumulates the resources of one stack
///
/// Applies the tagging contract to every resource, rejects duplicate logical
/// ids and hands back a [`Reference`] for each declared resource.
#[derive(Debug)]
pub struct StackBuilder {
    name: StackName,
    kind: StackKind,
    description: String,
    dependencies: Vec<StackName>,
    tags: Tags,
    resources: Vec<Resource>,
    logical_ids: HashSet<String>,
    outputs: Vec<StackOutput>,
}

impl StackBuilder {
    pub fn new(kind: StackKind, config: &EnvironmentConfig, description: impl Into<String>) -> Self {
        let mut tags = Tags::new();
        tags.insert(TAG_PROJECT.to_string(), PROJECT.to_string());
        tags.insert(TAG_ENVIRONMENT.to_string(), config.env.to_string());
        tags.insert(TAG_MANAGED_BY.to_string(), MANAGED_BY.to_string());

        Self {
            name: StackName::for_kind(kind, config.env.as_str()),
            kind,
            description: description.into(),
            dependencies: Vec::new(),
            tags,
            resources: Vec::new(),
            logical_ids: HashSet::new(),
            outputs: Vec::new(),
        }
    }

    pub fn name(&self) -> &StackName {
        &self.name
    }

    /// Declare a dependency on an upstream stack (idempotent)
    pub fn depends_on(&mut self, upstream: &StackName) -> &mut Self {
        if !self.dependencies.contains(upstream) {
            self.dependencies.push(upstream.clone());
        }
        self
    }

    /// Accept an upstream handle, recording the dependency on its stack
    ///
    /// Fails when this kind of stack may not depend on the handle's producer.
    pub fn consume<H: Handle>(&mut self, handle: &H) -> InfrastructureResult<()> {
        if !self.kind.allowed_dependencies().contains(&H::PRODUCER) {
            return Err(InfrastructureError::ContractViolation {
                stack: self.name.to_string(),
                reference: handle.stack().to_string(),
                reason: format!("{} stack does not consume {} handles", self.kind, H::PRODUCER),
            });
        }
        self.depends_on(handle.stack());
        Ok(())
    }

    /// Declare a resource; returns a reference to its `Id`
    pub fn add(
        &mut self,
        logical_id: &str,
        spec: impl Into<ResourceSpec>,
        removal_policy: RemovalPolicy,
    ) -> InfrastructureResult<Reference> {
        self.add_tagged(logical_id, spec, removal_policy, Tags::new())
    }

    /// Declare a resource with tags beyond the tagging contract
    pub fn add_tagged(
        &mut self,
        logical_id: &str,
        spec: impl Into<ResourceSpec>,
        removal_policy: RemovalPolicy,
        extra_tags: Tags,
    ) -> InfrastructureResult<Reference> {
        if !self.logical_ids.insert(logical_id.to_string()) {
            return Err(InfrastructureError::DuplicateResource {
                stack: self.name.to_string(),
                logical_id: logical_id.to_string(),
            });
        }

        let mut tags = self.tags.clone();
        tags.extend(extra_tags);

        let spec = spec.into();
        debug!(
            stack = %self.name,
            logical_id,
            resource_type = %spec.resource_type(),
            "Declared resource"
        );

        self.resources.push(Resource {
            logical_id: logical_id.to_string(),
            spec,
            removal_policy,
            tags,
        });

        Ok(Reference::new(self.name.clone(), logical_id, Attribute::Id))
    }

    /// Declare an operator-facing output
    pub fn output(&mut self, name: &str, value: impl Into<Expr>, description: &str) -> &mut Self {
        self.outputs.push(StackOutput {
            name: name.to_string(),
            value: value.into(),
            description: description.to_string(),
        });
        self
    }

    pub fn build(self) -> Stack {
        Stack {
            name: self.name,
            kind: self.kind,
            description: self.description,
            dependencies: self.dependencies,
            resources: self.resources,
            outputs: self.outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvironmentConfig;
    use crate::resources::AlertTopic;

    fn config() -> EnvironmentConfig {
        EnvironmentConfig::from_json_str(
            "qa",
            r#"{
                "rds": { "instanceClass": "t3", "instanceSize": "small",
                         "allocatedStorage": 20, "backupRetention": 1 },
                "redis": { "nodeType": "micro" },
                "ecs": { "cpu": 256, "memory": 512, "desiredCount": 1, "maxCount": 1 }
            }"#,
        )
        .unwrap()
    }

    fn topic() -> AlertTopic {
        AlertTopic {
            display_name: "t".into(),
        }
    }

    #[test]
    fn test_stack_name_convention() {
        assert_eq!(
            StackName::for_kind(StackKind::Compute, "prod").as_str(),
            "LLMProxy-Compute-prod"
        );
    }

    #[test]
    fn test_builder_applies_tagging_contract() {
        let mut builder = StackBuilder::new(StackKind::Monitoring, &config(), "test");
        builder.add("Topic", topic(), RemovalPolicy::Destroy).unwrap();
        let stack = builder.build();

        let tags = &stack.resource("Topic").unwrap().tags;
        assert_eq!(tags.get(TAG_PROJECT).map(String::as_str), Some(PROJECT));
        assert_eq!(tags.get(TAG_ENVIRONMENT).map(String::as_str), Some("qa"));
        assert_eq!(tags.get(TAG_MANAGED_BY).map(String::as_str), Some(MANAGED_BY));
    }

    #[test]
    fn test_builder_rejects_duplicate_ids() {
        let mut builder = StackBuilder::new(StackKind::Monitoring, &config(), "test");
        builder.add("Topic", topic(), RemovalPolicy::Destroy).unwrap();

        let result = builder.add("Topic", topic(), RemovalPolicy::Destroy);
        assert!(matches!(
            result,
            Err(InfrastructureError::DuplicateResource { .. })
        ));
    }

    #[test]
    fn test_extra_tags_merge() {
        let mut builder = StackBuilder::new(StackKind::Data, &config(), "test");
        let mut extra = Tags::new();
        extra.insert("Name".into(), "cache-qa".into());
        builder
            .add_tagged("Topic", topic(), RemovalPolicy::Destroy, extra)
            .unwrap();

        let stack = builder.build();
        let tags = &stack.resource("Topic").unwrap().tags;
        assert_eq!(tags.len(), 4);
        assert_eq!(tags["Name"], "cache-qa");
    }

    #[test]
    fn test_dependencies_are_deduplicated() {
        let upstream = StackName::for_kind(StackKind::Network, "qa");
        let mut builder = StackBuilder::new(StackKind::Data, &config(), "test");
        builder.depends_on(&upstream).depends_on(&upstream);

        let stack = builder.build();
        assert_eq!(stack.dependencies, vec![upstream.clone()]);
        assert!(stack.depends_on(&upstream));
    }

    #[test]
    fn test_consume_records_dependency() {
        let handle = crate::handles::CacheHandle {
            stack: StackName::for_kind(StackKind::Data, "qa"),
            cluster: Reference::new(StackName::for_kind(StackKind::Data, "qa"), "Cache", Attribute::Id),
            port: 6379,
        };

        let mut compute = StackBuilder::new(StackKind::Compute, &config(), "test");
        compute.consume(&handle).unwrap();
        assert_eq!(compute.build().dependencies, vec![handle.stack.clone()]);

        let mut data = StackBuilder::new(StackKind::Data, &config(), "test");
        let result = data.consume(&handle);
        assert!(matches!(
            result,
            Err(InfrastructureError::ContractViolation { .. })
        ));
    }

    #[test]
    fn test_allowed_dependencies_are_upstream_only() {
        assert!(StackKind::Network.allowed_dependencies().is_empty());
        assert!(StackKind::Edge
            .allowed_dependencies()
            .contains(&StackKind::Compute));
        assert!(!StackKind::Data
            .allowed_dependencies()
            .contains(&StackKind::Compute));
    }
}
