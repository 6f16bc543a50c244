// Copyright (c) 2025 - Cowboy AI, Inc.
//! Monitoring stack: threshold alarms and a read-only dashboard
//!
//! Every alarm debounces over two consecutive periods, treats missing data as
//! breaching and notifies one shared topic.

use tracing::info;

use super::Synthesized;
use crate::config::EnvironmentConfig;
use crate::errors::InfrastructureResult;
use crate::graph::{Expr, Reference, RemovalPolicy, StackBuilder, StackKind};
use crate::handles::{ComputeHandle, DatabaseHandle, MonitoringHandle};
use crate::naming::physical_name;
use crate::resources::{
    AlertTopic, Alarm, Comparison, Dashboard, GraphWidget, Metric, Statistic, TreatMissingData,
};

/// Consecutive breaching periods before an alarm fires
pub const EVALUATION_PERIODS: u32 = 2;

const ECS_NAMESPACE: &str = "AWS/ECS";
const ELB_NAMESPACE: &str = "AWS/ApplicationELB";
const RDS_NAMESPACE: &str = "AWS/RDS";

/// One alarm to derive: logical id, metric, threshold and description
struct AlarmRule {
    logical_id: &'static str,
    metric: Metric,
    threshold: f64,
    description: &'static str,
}

/// Builds alarms over the metrics exposed by compute and data
pub struct MonitoringStack;

impl MonitoringStack {
    pub fn synthesize(
        config: &EnvironmentConfig,
        compute: &ComputeHandle,
        database: &DatabaseHandle,
    ) -> InfrastructureResult<Synthesized<MonitoringHandle>> {
        let env = config.env.as_str();
        info!("Synthesizing monitoring stack for {}", env);

        let mut builder = StackBuilder::new(
            StackKind::Monitoring,
            config,
            format!("Monitoring and alerting for the LLM proxy ({env})"),
        );
        builder.consume(compute)?;
        builder.consume(database)?;
        let removal = RemovalPolicy::Destroy;

        let topic = builder.add(
            "AlarmTopic",
            AlertTopic {
                display_name: format!("LLM Proxy Alarms - {env}"),
            },
            removal,
        )?;

        let metrics = ServiceMetrics::new(compute, database);
        let rules = [
            AlarmRule {
                logical_id: "HighCpuAlarm",
                metric: metrics.service_cpu(),
                threshold: 80.0,
                description: "Service CPU above 80%",
            },
            AlarmRule {
                logical_id: "HighMemoryAlarm",
                metric: metrics.service_memory(),
                threshold: 85.0,
                description: "Service memory above 85%",
            },
            AlarmRule {
                logical_id: "UnhealthyTargetsAlarm",
                metric: metrics.unhealthy_targets(),
                threshold: 0.5,
                description: "Load balancer reports unhealthy targets",
            },
            AlarmRule {
                logical_id: "DatabaseHighCpuAlarm",
                metric: metrics.database_cpu(),
                threshold: 75.0,
                description: "Database CPU above 75%",
            },
            AlarmRule {
                logical_id: "DatabaseConnectionAlarm",
                metric: metrics.database_connections(),
                threshold: 40.0,
                description: "Database connections above 40",
            },
        ];

        for rule in rules {
            builder.add(
                rule.logical_id,
                Alarm {
                    name: format!("{}-{}", physical_name("alarm", env), rule.logical_id),
                    description: rule.description.to_string(),
                    metric: rule.metric,
                    threshold: rule.threshold,
                    comparison: Comparison::GreaterThanThreshold,
                    evaluation_periods: EVALUATION_PERIODS,
                    datapoints_to_alarm: EVALUATION_PERIODS,
                    treat_missing_data: TreatMissingData::Breaching,
                    alarm_actions: vec![topic.clone()],
                },
                removal,
            )?;
        }

        let dashboard_name = physical_name("dashboard", env);
        let dashboard = builder.add(
            "Dashboard",
            Dashboard {
                name: dashboard_name.clone(),
                rows: vec![
                    vec![
                        widget("Service Metrics", vec![metrics.service_cpu()], vec![
                            metrics.service_memory(),
                        ]),
                        widget("Load Balancer Requests", vec![metrics.request_count()], vec![]),
                    ],
                    vec![
                        widget("Database Metrics", vec![metrics.database_cpu()], vec![
                            metrics.database_connections(),
                        ]),
                        widget("Target Response Time", vec![metrics.response_time()], vec![]),
                    ],
                ],
            },
            removal,
        )?;

        builder.output(
            "DashboardUrl",
            format!(
                "https://console.aws.amazon.com/cloudwatch/home?region={}#dashboards:name={}",
                config.region, dashboard_name
            ),
            "Dashboard URL",
        );

        let handle = MonitoringHandle {
            stack: builder.name().clone(),
            alert_topic: topic,
            dashboard,
        };
        let stack = builder.build();
        info!(
            "Monitoring stack {} synthesized with {} resources",
            stack.name,
            stack.resources.len()
        );

        Ok(Synthesized { stack, handle })
    }
}

fn widget(title: &str, left: Vec<Metric>, right: Vec<Metric>) -> GraphWidget {
    GraphWidget {
        title: title.to_string(),
        width: 12,
        height: 6,
        left,
        right,
    }
}

/// Metric series addressed through upstream handles
struct ServiceMetrics {
    cluster: Reference,
    service: Reference,
    load_balancer: Reference,
    database: Reference,
}

impl ServiceMetrics {
    fn new(compute: &ComputeHandle, database: &DatabaseHandle) -> Self {
        Self {
            cluster: compute.cluster_name(),
            service: compute.service_name(),
            load_balancer: compute.load_balancer.full_name(),
            database: database.instance.clone(),
        }
    }

    fn ecs(&self, name: &str) -> Metric {
        Metric::new(ECS_NAMESPACE, name, Statistic::Average)
            .dimension("ClusterName", &self.cluster)
            .dimension("ServiceName", &self.service)
    }

    fn elb(&self, name: &str, statistic: Statistic) -> Metric {
        Metric::new(ELB_NAMESPACE, name, statistic).dimension("LoadBalancer", &self.load_balancer)
    }

    fn rds(&self, name: &str) -> Metric {
        Metric::new(RDS_NAMESPACE, name, Statistic::Average)
            .dimension("DBInstanceIdentifier", Expr::from(&self.database))
    }

    fn service_cpu(&self) -> Metric {
        self.ecs("CPUUtilization")
    }

    fn service_memory(&self) -> Metric {
        self.ecs("MemoryUtilization")
    }

    fn unhealthy_targets(&self) -> Metric {
        self.elb("UnHealthyHostCount", Statistic::Average)
    }

    fn request_count(&self) -> Metric {
        self.elb("RequestCount", Statistic::Sum)
    }

    fn response_time(&self) -> Metric {
        self.elb("TargetResponseTime", Statistic::Average)
    }

    fn database_cpu(&self) -> Metric {
        self.rds("CPUUtilization")
    }

    fn database_connections(&self) -> Metric {
        self.rds("DatabaseConnections")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceType;
    use crate::graph::ResourceSpec;
    use crate::naming::UniquenessSeed;
    use crate::stacks::{ComputeStack, DataStack, NetworkStack};

    fn synthesize() -> (ComputeHandle, Synthesized<MonitoringHandle>) {
        let config = EnvironmentConfig::from_json_str(
            "staging",
            r#"{
                "region": "eu-west-1",
                "rds": { "instanceClass": "t3", "instanceSize": "medium",
                         "allocatedStorage": 20, "backupRetention": 7 },
                "redis": { "nodeType": "cache.t3.micro" },
                "ecs": { "cpu": 512, "memory": 1024, "desiredCount": 2, "maxCount": 4 }
            }"#,
        )
        .unwrap();
        let network = NetworkStack::synthesize(&config).unwrap().handle;
        let data = DataStack::synthesize(&config, &network, &UniquenessSeed::new("7").unwrap())
            .unwrap()
            .handle;
        let compute = ComputeStack::synthesize(
            &config,
            &network,
            &data.database,
            &data.cache,
            &data.storage,
        )
        .unwrap()
        .handle;
        let monitoring = MonitoringStack::synthesize(&config, &compute, &data.database).unwrap();
        (compute, monitoring)
    }

    #[test]
    fn test_alarms_debounce_and_fail_closed() {
        let (_, monitoring) = synthesize();
        let alarms: Vec<_> = monitoring
            .stack
            .resources_of(ResourceType::Alarm)
            .filter_map(|r| match &r.spec {
                ResourceSpec::Alarm(alarm) => Some(alarm),
                _ => None,
            })
            .collect();

        assert_eq!(alarms.len(), 5);
        for alarm in alarms {
            assert_eq!(alarm.evaluation_periods, 2);
            assert_eq!(alarm.datapoints_to_alarm, 2);
            assert_eq!(alarm.treat_missing_data, TreatMissingData::Breaching);
            assert_eq!(alarm.alarm_actions, vec![monitoring.handle.alert_topic.clone()]);
        }
    }

    #[test]
    fn test_unhealthy_target_alarm_watches_load_balancer() {
        let (compute, monitoring) = synthesize();
        let ResourceSpec::Alarm(alarm) = &monitoring
            .stack
            .resource("UnhealthyTargetsAlarm")
            .unwrap()
            .spec
        else {
            panic!("not an alarm");
        };

        assert_eq!(alarm.threshold, 0.5);
        assert_eq!(
            alarm.metric.dimensions["LoadBalancer"],
            Expr::from(compute.load_balancer.full_name())
        );
    }

    #[test]
    fn test_dashboard_layout_and_url() {
        let (_, monitoring) = synthesize();
        let ResourceSpec::Dashboard(dashboard) =
            &monitoring.stack.resource("Dashboard").unwrap().spec
        else {
            panic!("not a dashboard");
        };
        assert_eq!(dashboard.rows.len(), 2);
        assert_eq!(dashboard.widget_count(), 4);

        let url = monitoring.stack.output("DashboardUrl").unwrap();
        assert_eq!(
            url.value.as_literal().as_deref(),
            Some(
                "https://console.aws.amazon.com/cloudwatch/home?region=eu-west-1\
                 #dashboards:name=llm-proxy-dashboard-staging"
            )
        );
    }

    #[test]
    fn test_depends_on_compute_and_data() {
        let (compute, monitoring) = synthesize();
        assert!(monitoring.stack.depends_on(&compute.stack));
        assert_eq!(monitoring.stack.dependencies.len(), 2);
    }
}
