// Copyright (c) 2025 - Cowboy AI, Inc.
//! Data stack: database, cache, object storage and the secrets guarding them

use std::collections::BTreeMap;
use tracing::{debug, info};

use super::Synthesized;
use crate::config::EnvironmentConfig;
use crate::domain::Port;
use crate::errors::InfrastructureResult;
use crate::graph::{Attribute, Reference, RemovalPolicy, StackBuilder, StackKind, Tags};
use crate::handles::{CacheHandle, DatabaseHandle, NetworkHandle, StorageHandle};
use crate::naming::{physical_name, unique_name, UniquenessSeed};
use crate::resources::{
    Bucket, CacheCluster, CacheParameterGroup, CacheSubnetGroup, CorsRule, DatabaseEngine,
    DatabaseInstance, DatabaseParameterGroup, EncryptionKey, GeneratedSecret, HttpMethod,
    LifecycleRule, Peer, Secret, SecretContents, SecurityGroup, SecurityTier, StorageClass,
    StorageType, Transition,
};

pub const DATABASE_PORT: u16 = 5432;
pub const CACHE_PORT: u16 = 6379;

/// Master user name stored in the credential secret
pub const DATABASE_USERNAME: &str = "proxyadmin";

/// Characters the generated password never contains
pub const PASSWORD_EXCLUDED_CHARACTERS: &str = " %+~`#$&*()|[]{}:;<>?!'/@\"\\";

pub const PASSWORD_LENGTH: u32 = 32;

const POSTGRES_VERSION: &str = "14";
const BACKUP_WINDOW: &str = "03:00-04:00";
const DATABASE_MAINTENANCE_WINDOW: &str = "sun:04:00-sun:05:00";
const CACHE_MAINTENANCE_WINDOW: &str = "sun:05:00-sun:07:00";
const CACHE_SNAPSHOT_WINDOW: &str = "03:00-05:00";

/// Handles exposed by the data stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataHandles {
    pub database: DatabaseHandle,
    pub cache: CacheHandle,
    pub storage: StorageHandle,
}

/// Builds the stateful tier inside the isolated subnets
pub struct DataStack;

impl DataStack {
    pub fn synthesize(
        config: &EnvironmentConfig,
        network: &NetworkHandle,
        seed: &UniquenessSeed,
    ) -> InfrastructureResult<Synthesized<DataHandles>> {
        let env = config.env.as_str();
        let prod = config.is_production();
        info!("Synthesizing data stack for {}", env);

        let mut builder = StackBuilder::new(
            StackKind::Data,
            config,
            format!("Data infrastructure for the LLM proxy ({env})"),
        );
        builder.consume(network)?;
        let environment_policy = RemovalPolicy::for_environment(prod);

        // Isolated tiers admit the private-egress ranges and nothing else
        let mut database_group = SecurityGroup::new(
            network.vpc.clone(),
            SecurityTier::Database,
            "Security group for the PostgreSQL database",
            false,
        );
        let mut cache_group = SecurityGroup::new(
            network.vpc.clone(),
            SecurityTier::Cache,
            "Security group for the Redis cache",
            false,
        );
        for subnet in &network.private_egress.subnets {
            database_group = database_group.allow(
                Peer::Cidr(subnet.cidr),
                Port::tcp(DATABASE_PORT),
                &format!("PostgreSQL from private subnet in {}", subnet.availability_zone),
            );
            cache_group = cache_group.allow(
                Peer::Cidr(subnet.cidr),
                Port::tcp(CACHE_PORT),
                &format!("Redis from private subnet in {}", subnet.availability_zone),
            );
        }
        let database_group = builder.add(
            "DatabaseSecurityGroup",
            database_group,
            RemovalPolicy::Destroy,
        )?;
        let cache_group = builder.add("CacheSecurityGroup", cache_group, RemovalPolicy::Destroy)?;

        let encryption_key = builder.add(
            "DataEncryptionKey",
            EncryptionKey {
                description: format!("Encryption key for LLM proxy data ({env})"),
                enable_key_rotation: true,
            },
            RemovalPolicy::Retain,
        )?;

        let credentials = builder.add(
            "DatabaseSecret",
            Secret {
                description: "PostgreSQL master credentials".to_string(),
                contents: SecretContents::Generated(GeneratedSecret {
                    template: BTreeMap::from([(
                        "username".to_string(),
                        DATABASE_USERNAME.to_string(),
                    )]),
                    generate_key: "password".to_string(),
                    exclude_characters: PASSWORD_EXCLUDED_CHARACTERS.to_string(),
                    length: PASSWORD_LENGTH,
                }),
            },
            environment_policy,
        )?;

        let database = Self::database(
            &mut builder,
            config,
            network,
            &database_group,
            &encryption_key,
            &credentials,
        )?;
        let cache = Self::cache(&mut builder, config, network, &cache_group)?;
        let storage = Self::storage(&mut builder, config, seed, &encryption_key)?;

        builder
            .output(
                "DatabaseEndpoint",
                database.endpoint_address(),
                "Database endpoint address",
            )
            .output(
                "CacheEndpoint",
                cache.endpoint_address(),
                "Cache endpoint address",
            )
            .output(
                "StorageBucketName",
                storage.live_bucket.attr(Attribute::Name),
                "Storage bucket name",
            );

        let stack = builder.build();
        info!(
            "Data stack {} synthesized with {} resources",
            stack.name,
            stack.resources.len()
        );

        Ok(Synthesized {
            stack,
            handle: DataHandles {
                database,
                cache,
                storage,
            },
        })
    }

    fn database(
        builder: &mut StackBuilder,
        config: &EnvironmentConfig,
        network: &NetworkHandle,
        security_group: &Reference,
        encryption_key: &Reference,
        credentials: &Reference,
    ) -> InfrastructureResult<DatabaseHandle> {
        let sizing = &config.database;
        let prod = config.is_production();

        let parameter_group = builder.add(
            "DatabaseParameterGroup",
            DatabaseParameterGroup {
                engine: DatabaseEngine::postgres(POSTGRES_VERSION),
                parameters: BTreeMap::from([
                    (
                        "shared_preload_libraries".to_string(),
                        "pg_stat_statements".to_string(),
                    ),
                    ("log_statement".to_string(), "all".to_string()),
                    ("log_duration".to_string(), "1".to_string()),
                ]),
            },
            RemovalPolicy::Destroy,
        )?;

        debug!(
            "Database {} multi-az={} retention={}d",
            sizing.instance_type(),
            sizing.multi_az,
            sizing.backup_retention_days
        );
        let instance = builder.add(
            "Database",
            DatabaseInstance {
                engine: DatabaseEngine::postgres(POSTGRES_VERSION),
                instance_type: sizing.instance_type(),
                port: DATABASE_PORT,
                subnets: network.isolated.references(),
                security_groups: vec![security_group.clone()],
                allocated_storage_gb: sizing.allocated_storage_gb,
                storage_type: StorageType::Gp3,
                storage_encrypted: true,
                encryption_key: encryption_key.attr(Attribute::Arn),
                credentials: credentials.clone(),
                multi_az: sizing.multi_az,
                backup_retention_days: sizing.backup_retention_days,
                preferred_backup_window: BACKUP_WINDOW.to_string(),
                preferred_maintenance_window: DATABASE_MAINTENANCE_WINDOW.to_string(),
                parameter_group,
                deletion_protection: prod,
                monitoring_interval_secs: 60,
                enable_performance_insights: true,
            },
            RemovalPolicy::for_environment(prod),
        )?;

        Ok(DatabaseHandle {
            stack: builder.name().clone(),
            instance,
            port: DATABASE_PORT,
            credentials: credentials.clone(),
            security_group: security_group.clone(),
        })
    }

    fn cache(
        builder: &mut StackBuilder,
        config: &EnvironmentConfig,
        network: &NetworkHandle,
        security_group: &Reference,
    ) -> InfrastructureResult<CacheHandle> {
        let env = config.env.as_str();

        let subnet_group = builder.add(
            "CacheSubnetGroup",
            CacheSubnetGroup {
                description: "Subnet group for the Redis cache".to_string(),
                subnets: network.isolated.references(),
            },
            RemovalPolicy::Destroy,
        )?;
        let parameter_group = builder.add(
            "CacheParameterGroup",
            CacheParameterGroup {
                family: "redis7".to_string(),
                description: "Redis parameter group for the LLM proxy".to_string(),
                properties: BTreeMap::from([
                    ("maxmemory-policy".to_string(), "allkeys-lru".to_string()),
                    ("timeout".to_string(), "300".to_string()),
                ]),
            },
            RemovalPolicy::Destroy,
        )?;

        let mut name_tag = Tags::new();
        name_tag.insert("Name".to_string(), physical_name("redis", env));

        // The engine variant supports a single node only
        let cluster = builder.add_tagged(
            "Cache",
            CacheCluster {
                engine: "redis".to_string(),
                node_type: config.cache.node_type.clone(),
                num_cache_nodes: 1,
                port: CACHE_PORT,
                subnet_group,
                parameter_group,
                security_groups: vec![security_group.clone()],
                preferred_maintenance_window: CACHE_MAINTENANCE_WINDOW.to_string(),
                snapshot_retention_limit: if config.is_production() { 7 } else { 1 },
                snapshot_window: CACHE_SNAPSHOT_WINDOW.to_string(),
            },
            RemovalPolicy::Destroy,
            name_tag,
        )?;

        Ok(CacheHandle {
            stack: builder.name().clone(),
            cluster,
            port: CACHE_PORT,
        })
    }

    fn storage(
        builder: &mut StackBuilder,
        config: &EnvironmentConfig,
        seed: &UniquenessSeed,
        encryption_key: &Reference,
    ) -> InfrastructureResult<StorageHandle> {
        let env = config.env.as_str();
        let prod = config.is_production();

        let live_bucket = builder.add(
            "StorageBucket",
            Bucket {
                name: unique_name("storage", env, seed),
                encryption_key: encryption_key.attr(Attribute::Arn),
                versioned: true,
                block_public_access: true,
                auto_delete_objects: !prod,
                lifecycle_rules: vec![LifecycleRule {
                    id: "delete-old-versions".to_string(),
                    transitions: Vec::new(),
                    noncurrent_version_transitions: vec![Transition {
                        storage_class: StorageClass::InfrequentAccess,
                        after_days: 30,
                    }],
                    noncurrent_version_expiration_days: Some(90),
                    expiration_days: None,
                }],
                cors: vec![CorsRule {
                    allowed_headers: vec!["*".to_string()],
                    allowed_methods: vec![HttpMethod::Get, HttpMethod::Put, HttpMethod::Post],
                    allowed_origins: vec!["*".to_string()],
                    max_age_secs: 3000,
                }],
            },
            RemovalPolicy::for_environment(prod),
        )?;

        // Backups outlive the stack in every environment
        let backup_bucket = builder.add(
            "BackupBucket",
            Bucket {
                name: unique_name("backups", env, seed),
                encryption_key: encryption_key.attr(Attribute::Arn),
                versioned: true,
                block_public_access: true,
                auto_delete_objects: false,
                lifecycle_rules: vec![LifecycleRule {
                    id: "archive-old-backups".to_string(),
                    transitions: vec![
                        Transition {
                            storage_class: StorageClass::GlacierInstantRetrieval,
                            after_days: 30,
                        },
                        Transition {
                            storage_class: StorageClass::Glacier,
                            after_days: 180,
                        },
                    ],
                    noncurrent_version_transitions: Vec::new(),
                    noncurrent_version_expiration_days: None,
                    expiration_days: Some(365),
                }],
                cors: Vec::new(),
            },
            RemovalPolicy::Retain,
        )?;

        Ok(StorageHandle {
            stack: builder.name().clone(),
            live_bucket,
            backup_bucket,
            encryption_key: encryption_key.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceType;
    use crate::graph::{ResourceSpec, Stack};
    use crate::stacks::NetworkStack;

    fn config(env: &str) -> EnvironmentConfig {
        EnvironmentConfig::from_json_str(
            env,
            r#"{
                "rds": { "instanceClass": "burstable", "instanceSize": "medium",
                         "allocatedStorage": 20, "backupRetention": 7 },
                "redis": { "nodeType": "small" },
                "ecs": { "cpu": 512, "memory": 1024, "desiredCount": 2, "maxCount": 4 }
            }"#,
        )
        .unwrap()
    }

    fn synthesize(env: &str) -> (NetworkHandle, Synthesized<DataHandles>) {
        let config = config(env);
        let network = NetworkStack::synthesize(&config).unwrap().handle;
        let seed = UniquenessSeed::new("1234567").unwrap();
        let data = DataStack::synthesize(&config, &network, &seed).unwrap();
        (network, data)
    }

    fn spec<'a>(stack: &'a Stack, id: &str) -> &'a ResourceSpec {
        &stack.resource(id).unwrap().spec
    }

    #[test]
    fn test_isolated_groups_admit_only_private_ranges() {
        let (network, data) = synthesize("dev");

        for id in ["DatabaseSecurityGroup", "CacheSecurityGroup"] {
            let ResourceSpec::SecurityGroup(group) = spec(&data.stack, id) else {
                panic!("{id} is not a security group");
            };
            assert!(!group.allow_all_outbound);
            assert_eq!(group.ingress.len(), network.private_egress.len());
            for (rule, cidr) in group.ingress.iter().zip(network.private_egress.cidrs()) {
                assert_eq!(rule.peer, Peer::Cidr(cidr));
            }
        }
    }

    #[test]
    fn test_cache_is_single_node_with_lru_eviction() {
        let (_, data) = synthesize("dev");

        let ResourceSpec::CacheCluster(cluster) = spec(&data.stack, "Cache") else {
            panic!("Cache is not a cache cluster");
        };
        assert_eq!(cluster.num_cache_nodes, 1);
        assert_eq!(cluster.node_type, "cache.t3.small");
        assert_eq!(cluster.snapshot_retention_limit, 1);

        let ResourceSpec::CacheParameterGroup(params) = spec(&data.stack, "CacheParameterGroup")
        else {
            panic!("not a parameter group");
        };
        assert_eq!(params.properties["maxmemory-policy"], "allkeys-lru");
        assert_eq!(params.properties["timeout"], "300");

        let tags = &data.stack.resource("Cache").unwrap().tags;
        assert_eq!(tags["Name"], "llm-proxy-redis-dev");
    }

    #[test]
    fn test_database_follows_environment() {
        let (_, dev) = synthesize("dev");
        let (_, prod) = synthesize("prod");

        let dev_db = dev.stack.resource("Database").unwrap();
        let prod_db = prod.stack.resource("Database").unwrap();
        assert_eq!(dev_db.removal_policy, RemovalPolicy::Destroy);
        assert_eq!(prod_db.removal_policy, RemovalPolicy::Retain);

        let ResourceSpec::DatabaseInstance(instance) = &prod_db.spec else {
            panic!("not a database");
        };
        assert!(instance.deletion_protection);
        assert!(instance.storage_encrypted);
        assert_eq!(instance.instance_type, "db.t3.medium");
    }

    #[test]
    fn test_buckets_carry_seeded_names_and_lifecycle() {
        let (_, data) = synthesize("dev");

        let ResourceSpec::Bucket(live) = spec(&data.stack, "StorageBucket") else {
            panic!("not a bucket");
        };
        assert_eq!(live.name, "llm-proxy-storage-dev-1234567");
        assert!(live.auto_delete_objects);
        assert_eq!(live.lifecycle_rules[0].noncurrent_version_expiration_days, Some(90));

        let backup = data.stack.resource("BackupBucket").unwrap();
        assert_eq!(backup.removal_policy, RemovalPolicy::Retain);
        let ResourceSpec::Bucket(backup) = &backup.spec else {
            panic!("not a bucket");
        };
        let days: Vec<_> = backup.lifecycle_rules[0]
            .transitions
            .iter()
            .map(|t| t.after_days)
            .collect();
        assert_eq!(days, vec![30, 180]);
        assert_eq!(backup.lifecycle_rules[0].expiration_days, Some(365));
    }

    #[test]
    fn test_key_is_retained_and_stack_depends_on_network() {
        let (network, data) = synthesize("dev");
        assert_eq!(
            data.stack.resource("DataEncryptionKey").unwrap().removal_policy,
            RemovalPolicy::Retain
        );
        assert_eq!(data.stack.dependencies, vec![network.stack.clone()]);
        assert_eq!(data.stack.count_of(ResourceType::Bucket), 2);
    }
}
