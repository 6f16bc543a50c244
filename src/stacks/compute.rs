// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute stack: container service behind a public load balancer
//!
//! Trust chain: internet → load balancer tier → compute tier → data tier.
//! The compute group admits the load balancer group only; the data tier
//! admits the private-egress ranges the service runs in.

use std::collections::BTreeMap;
use tracing::{debug, info};

use super::Synthesized;
use crate::config::{EnvironmentConfig, HealthCheckSettings};
use crate::domain::Port;
use crate::errors::InfrastructureResult;
use crate::graph::{Attribute, Expr, Reference, RemovalPolicy, StackBuilder, StackKind};
use crate::handles::{
    CacheHandle, ComputeHandle, DatabaseHandle, LoadBalancerHandle, NetworkHandle, StorageHandle,
};
use crate::naming::{physical_name, RESOURCE_PREFIX};
use crate::resources::{
    ApplicationProtocol, ContainerCluster, ContainerDefinition, ContainerService, HealthCheck,
    ImageRepository, Listener, ListenerAction, LoadBalancer, LogGroup, Peer, PolicyStatement,
    PortMapping, Role, ScalableTarget, ScalingMetric, ScalingPolicy, Secret, SecretContents,
    SecretField, SecurityGroup, SecurityTier, ServiceTarget, TagMutability, TargetGroup,
    TargetType, TaskDefinition,
};

/// Port the application listens on
pub const APPLICATION_PORT: u16 = 4000;

pub const CONTAINER_NAME: &str = "llm-proxy";

/// Scale-out thresholds, percent
pub const CPU_TARGET_PERCENT: u32 = 70;
pub const MEMORY_TARGET_PERCENT: u32 = 75;

pub const SCALE_OUT_COOLDOWN_SECS: u32 = 60;
pub const SCALE_IN_COOLDOWN_SECS: u32 = 300;

const MAX_IMAGE_COUNT: u32 = 10;
const LOG_RETENTION_DAYS: u32 = 7;
const DEREGISTRATION_DELAY_SECS: u32 = 30;
const TASK_PRINCIPAL: &str = "ecs-tasks.amazonaws.com";
const EXECUTION_POLICY: &str = "service-role/AmazonECSTaskExecutionRolePolicy";

/// Fields of the provider key bundle, populated by operators after provisioning
const OPENAI_KEY: &str = "OPENAI_API_KEY";
const ANTHROPIC_KEY: &str = "ANTHROPIC_API_KEY";
const MASTER_KEY: &str = "LITELLM_MASTER_KEY";

/// Builds the stateless serving tier
pub struct ComputeStack;

impl ComputeStack {
    pub fn synthesize(
        config: &EnvironmentConfig,
        network: &NetworkHandle,
        database: &DatabaseHandle,
        cache: &CacheHandle,
        storage: &StorageHandle,
    ) -> InfrastructureResult<Synthesized<ComputeHandle>> {
        let env = config.env.as_str();
        let sizing = &config.compute;
        info!(
            "Synthesizing compute stack for {}: {} tasks (max {}), {} cpu / {} MiB",
            env, sizing.desired_count, sizing.max_count, sizing.cpu, sizing.memory_mib
        );

        let mut builder = StackBuilder::new(
            StackKind::Compute,
            config,
            format!("Compute infrastructure for the LLM proxy ({env})"),
        );
        builder.consume(network)?;
        builder.consume(database)?;
        builder.consume(cache)?;
        builder.consume(storage)?;
        let removal = RemovalPolicy::Destroy;

        let lb_group = builder.add(
            "LoadBalancerSecurityGroup",
            SecurityGroup::new(
                network.vpc.clone(),
                SecurityTier::LoadBalancer,
                "Security group for the application load balancer",
                true,
            )
            .allow(Peer::AnyIpv4, Port::tcp(80), "HTTP from anywhere")
            .allow(Peer::AnyIpv4, Port::tcp(443), "HTTPS from anywhere"),
            removal,
        )?;
        let service_group = builder.add(
            "ServiceSecurityGroup",
            SecurityGroup::new(
                network.vpc.clone(),
                SecurityTier::Compute,
                "Security group for the proxy tasks",
                true,
            )
            .allow(
                Peer::SecurityGroup(lb_group.clone()),
                Port::tcp(APPLICATION_PORT),
                "Application port from the load balancer",
            ),
            removal,
        )?;

        let cluster = builder.add(
            "Cluster",
            ContainerCluster {
                name: physical_name("cluster", env),
                vpc: network.vpc.clone(),
                container_insights: true,
            },
            removal,
        )?;
        let repository = builder.add(
            "Repository",
            ImageRepository {
                name: physical_name("proxy", env),
                image_scan_on_push: true,
                tag_mutability: TagMutability::Mutable,
                max_image_count: MAX_IMAGE_COUNT,
            },
            removal,
        )?;

        let api_keys = builder.add(
            "ApiKeysSecret",
            Secret {
                description: "API keys for upstream LLM providers".to_string(),
                contents: SecretContents::Fields {
                    fields: vec![
                        OPENAI_KEY.to_string(),
                        ANTHROPIC_KEY.to_string(),
                        MASTER_KEY.to_string(),
                    ],
                },
            },
            RemovalPolicy::for_environment(config.is_production()),
        )?;

        let (execution_role, task_role) =
            Self::roles(&mut builder, &api_keys, database, storage)?;

        let log_group = builder.add(
            "ServiceLogGroup",
            LogGroup {
                name: Expr::literal(format!("/ecs/{RESOURCE_PREFIX}/{env}")),
                retention_days: Some(LOG_RETENTION_DAYS),
            },
            removal,
        )?;

        let task_definition = builder.add(
            "TaskDefinition",
            TaskDefinition {
                cpu: sizing.cpu,
                memory_mib: sizing.memory_mib,
                execution_role,
                task_role,
                containers: vec![Self::container(config, cache, &api_keys, log_group)],
            },
            removal,
        )?;

        let load_balancer = builder.add(
            "LoadBalancer",
            LoadBalancer {
                name: physical_name("alb", env),
                internet_facing: true,
                subnets: network.public.references(),
                security_groups: vec![lb_group.clone()],
            },
            removal,
        )?;
        let target_group = builder.add(
            "TargetGroup",
            TargetGroup {
                vpc: network.vpc.clone(),
                port: APPLICATION_PORT,
                protocol: ApplicationProtocol::Http,
                target_type: TargetType::Ip,
                health_check: health_check(&sizing.health_check),
                deregistration_delay_secs: DEREGISTRATION_DELAY_SECS,
            },
            removal,
        )?;

        let service = builder.add(
            "Service",
            ContainerService {
                name: physical_name("service", env),
                cluster: cluster.clone(),
                task_definition,
                desired_count: sizing.desired_count,
                assign_public_ip: false,
                subnets: network.private_egress.references(),
                security_groups: vec![service_group],
                health_check_grace_period_secs: sizing.health_check.grace_period_secs,
                load_balancers: vec![ServiceTarget {
                    target_group: target_group.clone(),
                    container_name: CONTAINER_NAME.to_string(),
                    container_port: APPLICATION_PORT,
                }],
            },
            removal,
        )?;

        builder.add(
            "HttpListener",
            Listener {
                load_balancer: load_balancer.clone(),
                port: 80,
                protocol: ApplicationProtocol::Http,
                default_action: http_action(config.is_production(), &target_group),
            },
            removal,
        )?;

        Self::autoscaling(&mut builder, config, &service)?;

        let handle = ComputeHandle {
            stack: builder.name().clone(),
            cluster,
            service,
            load_balancer: LoadBalancerHandle {
                load_balancer,
                security_group: lb_group,
                target_group,
            },
        };

        builder
            .output(
                "LoadBalancerDns",
                handle.load_balancer.dns_name(),
                "Load balancer DNS name",
            )
            .output("ServiceName", handle.service_name(), "Service name")
            .output("ClusterName", handle.cluster_name(), "Cluster name")
            .output(
                "RepositoryUri",
                repository.attr(Attribute::Uri),
                "Image repository URI",
            );

        let stack = builder.build();
        info!(
            "Compute stack {} synthesized with {} resources",
            stack.name,
            stack.resources.len()
        );

        Ok(Synthesized { stack, handle })
    }

    /// Execution identity pulls secrets; task identity touches storage only
    fn roles(
        builder: &mut StackBuilder,
        api_keys: &Reference,
        database: &DatabaseHandle,
        storage: &StorageHandle,
    ) -> InfrastructureResult<(Reference, Reference)> {
        let execution_role = builder.add(
            "TaskExecutionRole",
            Role {
                description: "Starts proxy tasks and injects their secrets".to_string(),
                assumed_by: TASK_PRINCIPAL.to_string(),
                managed_policies: vec![EXECUTION_POLICY.to_string()],
                statements: vec![PolicyStatement::allow(
                    &["secretsmanager:GetSecretValue"],
                    vec![
                        api_keys.attr(Attribute::Arn).into(),
                        database.credentials_arn().into(),
                    ],
                )],
            },
            RemovalPolicy::Destroy,
        )?;

        let object_arns = storage
            .bucket_arns()
            .into_iter()
            .map(|arn| Expr::join([arn.into(), Expr::literal("/*")]))
            .collect();
        let task_role = builder.add(
            "TaskRole",
            Role {
                description: "Runtime identity of the proxy application".to_string(),
                assumed_by: TASK_PRINCIPAL.to_string(),
                managed_policies: Vec::new(),
                statements: vec![
                    PolicyStatement::allow(
                        &["s3:GetObject", "s3:PutObject", "s3:DeleteObject"],
                        object_arns,
                    ),
                    PolicyStatement::allow(
                        &["kms:Decrypt", "kms:GenerateDataKey"],
                        vec![storage.encryption_key.attr(Attribute::Arn).into()],
                    ),
                ],
            },
            RemovalPolicy::Destroy,
        )?;

        Ok((execution_role, task_role))
    }

    fn container(
        config: &EnvironmentConfig,
        cache: &CacheHandle,
        api_keys: &Reference,
        log_group: Reference,
    ) -> ContainerDefinition {
        let environment: BTreeMap<String, Expr> = [
            ("REDIS_HOST", Expr::from(cache.endpoint_address())),
            ("REDIS_PORT", Expr::from(cache.endpoint_port())),
            ("PORT", Expr::literal(APPLICATION_PORT.to_string())),
            ("LITELLM_TELEMETRY", Expr::literal("false")),
            ("LITELLM_MODE", Expr::literal("PRODUCTION")),
            ("UI_USERNAME", Expr::literal("admin")),
            ("STORE_MODEL_IN_DB", Expr::literal("False")),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();

        let secret = |field: &str| SecretField {
            secret: api_keys.clone(),
            field: field.to_string(),
        };
        let secrets = BTreeMap::from([
            (OPENAI_KEY.to_string(), secret(OPENAI_KEY)),
            (ANTHROPIC_KEY.to_string(), secret(ANTHROPIC_KEY)),
            (MASTER_KEY.to_string(), secret(MASTER_KEY)),
            ("UI_PASSWORD".to_string(), secret(MASTER_KEY)),
        ]);

        ContainerDefinition {
            name: CONTAINER_NAME.to_string(),
            image: config.compute.image.clone(),
            log_group,
            stream_prefix: RESOURCE_PREFIX.to_string(),
            environment,
            secrets,
            port_mappings: vec![PortMapping {
                container_port: APPLICATION_PORT,
            }],
        }
    }

    /// Capacity pinned to `[desiredCount, maxCount]`, quick to scale out, slow to scale in
    fn autoscaling(
        builder: &mut StackBuilder,
        config: &EnvironmentConfig,
        service: &Reference,
    ) -> InfrastructureResult<()> {
        let sizing = &config.compute;
        debug!(
            "Scaling bounds [{}, {}]",
            sizing.desired_count, sizing.max_count
        );

        let target = builder.add(
            "ScalableTarget",
            ScalableTarget {
                service: service.attr(Attribute::Name),
                dimension: "ecs:service:DesiredCount".to_string(),
                min_capacity: sizing.desired_count,
                max_capacity: sizing.max_count,
            },
            RemovalPolicy::Destroy,
        )?;

        for (logical_id, metric, percent) in [
            ("CpuScaling", ScalingMetric::CpuUtilization, CPU_TARGET_PERCENT),
            ("MemoryScaling", ScalingMetric::MemoryUtilization, MEMORY_TARGET_PERCENT),
        ] {
            builder.add(
                logical_id,
                ScalingPolicy {
                    scalable_target: target.clone(),
                    metric,
                    target_utilization_percent: percent,
                    scale_out_cooldown_secs: SCALE_OUT_COOLDOWN_SECS,
                    scale_in_cooldown_secs: SCALE_IN_COOLDOWN_SECS,
                },
                RemovalPolicy::Destroy,
            )?;
        }

        Ok(())
    }
}

/// Production redirects plaintext permanently; other environments forward it
fn http_action(production: bool, target_group: &Reference) -> ListenerAction {
    if production {
        ListenerAction::Redirect {
            protocol: ApplicationProtocol::Https,
            port: 443,
            permanent: true,
        }
    } else {
        ListenerAction::Forward {
            target_groups: vec![target_group.clone()],
        }
    }
}

fn health_check(settings: &HealthCheckSettings) -> HealthCheck {
    HealthCheck {
        path: settings.path.clone(),
        port: APPLICATION_PORT,
        protocol: ApplicationProtocol::Http,
        healthy_threshold: settings.healthy_threshold,
        unhealthy_threshold: settings.unhealthy_threshold,
        timeout_secs: settings.timeout_secs,
        interval_secs: settings.interval_secs,
        healthy_http_codes: settings.healthy_http_codes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceType;
    use crate::graph::{ResourceSpec, Stack};
    use crate::naming::UniquenessSeed;
    use crate::stacks::{DataStack, NetworkStack};

    fn synthesize(env: &str) -> Synthesized<ComputeHandle> {
        let config = EnvironmentConfig::from_json_str(
            env,
            r#"{
                "rds": { "instanceClass": "t3", "instanceSize": "medium",
                         "allocatedStorage": 20, "backupRetention": 7 },
                "redis": { "nodeType": "cache.t3.micro" },
                "ecs": { "cpu": 512, "memory": 1024, "desiredCount": 2, "maxCount": 4,
                         "healthCheck": { "unhealthyThreshold": 3 } }
            }"#,
        )
        .unwrap();
        let network = NetworkStack::synthesize(&config).unwrap().handle;
        let seed = UniquenessSeed::new("42").unwrap();
        let data = DataStack::synthesize(&config, &network, &seed).unwrap().handle;
        ComputeStack::synthesize(&config, &network, &data.database, &data.cache, &data.storage)
            .unwrap()
    }

    fn spec<'a>(stack: &'a Stack, id: &str) -> &'a ResourceSpec {
        &stack.resource(id).unwrap().spec
    }

    #[test]
    fn test_service_ingress_only_from_load_balancer() {
        let compute = synthesize("dev");
        let ResourceSpec::SecurityGroup(group) = spec(&compute.stack, "ServiceSecurityGroup")
        else {
            panic!("not a security group");
        };

        assert_eq!(group.ingress.len(), 1);
        assert_eq!(
            group.ingress[0].peer,
            Peer::SecurityGroup(compute.handle.load_balancer.security_group.clone())
        );
        assert!(group.ingress[0].port.covers(APPLICATION_PORT));
    }

    #[test]
    fn test_listener_forwards_outside_production() {
        let compute = synthesize("dev");
        let ResourceSpec::Listener(listener) = spec(&compute.stack, "HttpListener") else {
            panic!("not a listener");
        };
        assert_eq!(
            listener.default_action,
            ListenerAction::Forward {
                target_groups: vec![compute.handle.load_balancer.target_group.clone()]
            }
        );
    }

    #[test]
    fn test_listener_redirects_in_production() {
        let compute = synthesize("prod");
        let ResourceSpec::Listener(listener) = spec(&compute.stack, "HttpListener") else {
            panic!("not a listener");
        };
        assert!(matches!(
            listener.default_action,
            ListenerAction::Redirect {
                protocol: ApplicationProtocol::Https,
                port: 443,
                permanent: true
            }
        ));
    }

    #[test]
    fn test_scaling_policies_are_asymmetric() {
        let compute = synthesize("dev");
        let policies: Vec<_> = compute
            .stack
            .resources_of(ResourceType::ScalingPolicy)
            .filter_map(|r| match &r.spec {
                ResourceSpec::ScalingPolicy(policy) => Some(policy),
                _ => None,
            })
            .collect();

        assert_eq!(policies.len(), 2);
        for policy in policies {
            assert!(policy.scale_out_cooldown_secs < policy.scale_in_cooldown_secs);
        }

        let ResourceSpec::ScalableTarget(target) = spec(&compute.stack, "ScalableTarget") else {
            panic!("not a scalable target");
        };
        assert_eq!((target.min_capacity, target.max_capacity), (2, 4));
    }

    #[test]
    fn test_health_check_uses_configured_overrides() {
        let compute = synthesize("dev");
        let ResourceSpec::TargetGroup(group) = spec(&compute.stack, "TargetGroup") else {
            panic!("not a target group");
        };
        assert_eq!(group.health_check.unhealthy_threshold, 3);
        assert_eq!(group.health_check.healthy_http_codes, "200-499");
        assert_eq!(group.health_check.path, "/");
    }

    #[test]
    fn test_secrets_never_in_plain_environment() {
        let compute = synthesize("dev");
        let ResourceSpec::TaskDefinition(task) = spec(&compute.stack, "TaskDefinition") else {
            panic!("not a task definition");
        };
        let container = &task.containers[0];

        assert!(!container.environment.contains_key(MASTER_KEY));
        assert_eq!(container.secrets["UI_PASSWORD"].field, MASTER_KEY);
        assert_eq!(container.environment["PORT"], Expr::literal("4000"));
    }
}
