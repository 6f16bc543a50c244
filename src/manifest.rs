// Copyright (c) 2025 - Cowboy AI, Inc.
//! Manifest projection
//!
//! Pure projection of a [`Deployment`] into the document handed to the
//! provisioning engine. Resources and outputs are keyed by name in sorted
//! maps, so the same deployment always renders to the same bytes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::deployment::Deployment;
use crate::errors::InfrastructureResult;
use crate::graph::{Expr, Resource, Stack, StackName, Tags};
use crate::naming::PROJECT;

/// Whole-deployment document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub project: String,
    pub environment: String,
    pub region: String,
    pub stacks: Vec<StackManifest>,
}

/// One stack in deployment order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackManifest {
    pub name: StackName,
    pub depends_on: Vec<StackName>,
    pub description: String,
    pub resources: BTreeMap<String, ResourceManifest>,
    pub outputs: BTreeMap<String, OutputManifest>,
}

/// One resource, in the engine's vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceManifest {
    #[serde(rename = "Type")]
    pub resource_type: String,
    pub properties: serde_json::Value,
    pub deletion_policy: String,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutputManifest {
    pub value: Expr,
    pub description: String,
}

impl Manifest {
    pub fn from_deployment(deployment: &Deployment) -> InfrastructureResult<Self> {
        let stacks = deployment
            .stacks()
            .map(StackManifest::from_stack)
            .collect::<InfrastructureResult<Vec<_>>>()?;

        debug!(
            environment = %deployment.config.env,
            stacks = stacks.len(),
            "Projected deployment manifest"
        );

        Ok(Self {
            project: PROJECT.to_string(),
            environment: deployment.config.env.to_string(),
            region: deployment.config.region.clone(),
            stacks,
        })
    }

    pub fn to_json_pretty(&self) -> InfrastructureResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn stack(&self, name: &str) -> Option<&StackManifest> {
        self.stacks.iter().find(|s| s.name.as_str() == name)
    }
}

impl StackManifest {
    fn from_stack(stack: &Stack) -> InfrastructureResult<Self> {
        let resources = stack
            .resources
            .iter()
            .map(|resource| Ok((resource.logical_id.clone(), ResourceManifest::from_resource(resource)?)))
            .collect::<InfrastructureResult<BTreeMap<_, _>>>()?;

        let outputs = stack
            .outputs
            .iter()
            .map(|output| {
                (
                    output.name.clone(),
                    OutputManifest {
                        value: output.value.clone(),
                        description: output.description.clone(),
                    },
                )
            })
            .collect();

        Ok(Self {
            name: stack.name.clone(),
            depends_on: stack.dependencies.clone(),
            description: stack.description.clone(),
            resources,
            outputs,
        })
    }
}

impl ResourceManifest {
    fn from_resource(resource: &Resource) -> InfrastructureResult<Self> {
        Ok(Self {
            resource_type: resource.resource_type().provider_type().to_string(),
            properties: resource.spec.properties()?,
            deletion_policy: resource.removal_policy.deletion_policy().to_string(),
            tags: resource.tags.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvironmentConfig;
    use crate::naming::UniquenessSeed;

    fn manifest(env: &str) -> Manifest {
        let config = EnvironmentConfig::from_json_str(
            env,
            r#"{
                "rds": { "instanceClass": "t3", "instanceSize": "medium",
                         "allocatedStorage": 20, "backupRetention": 7 },
                "redis": { "nodeType": "cache.t3.micro" },
                "ecs": { "cpu": 512, "memory": 1024, "desiredCount": 1, "maxCount": 2 }
            }"#,
        )
        .unwrap();
        let deployment =
            Deployment::synthesize(&config, &UniquenessSeed::new("42").unwrap()).unwrap();
        Manifest::from_deployment(&deployment).unwrap()
    }

    #[test]
    fn test_manifest_shape() {
        let manifest = manifest("dev");
        assert_eq!(manifest.environment, "dev");
        assert_eq!(manifest.region, "us-east-1");
        assert_eq!(manifest.stacks.len(), 4);

        let network = manifest.stack("LLMProxy-Network-dev").unwrap();
        assert!(network.depends_on.is_empty());
        assert_eq!(network.resources["Vpc"].resource_type, "AWS::EC2::VPC");
        assert!(network.outputs.contains_key("VpcId"));
    }

    #[test]
    fn test_resource_entry_wire_keys() {
        let manifest = manifest("prod");
        let value = serde_json::to_value(&manifest).unwrap();
        let database = &value["stacks"][1]["resources"]["Database"];

        assert_eq!(database["Type"], "AWS::RDS::DBInstance");
        assert_eq!(database["DeletionPolicy"], "Retain");
        assert_eq!(database["Tags"]["Environment"], "prod");
        assert_eq!(value["stacks"][1]["dependsOn"][0], "LLMProxy-Network-prod");
    }

    #[test]
    fn test_rendering_is_stable() {
        assert_eq!(
            manifest("dev").to_json_pretty().unwrap(),
            manifest("dev").to_json_pretty().unwrap()
        );
    }
}
