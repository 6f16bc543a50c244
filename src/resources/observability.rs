// Copyright (c) 2025 - Cowboy AI, Inc.
//! Alerting and dashboard resource specs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::graph::{Expr, Reference};

/// Shared notification channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertTopic {
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statistic {
    Average,
    Sum,
    Maximum,
}

/// A metric series, addressed by namespace, name and dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub namespace: String,
    pub name: String,
    pub dimensions: BTreeMap<String, Expr>,
    pub statistic: Statistic,
    pub period_secs: u32,
}

impl Metric {
    pub fn new(namespace: &str, name: &str, statistic: Statistic) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            dimensions: BTreeMap::new(),
            statistic,
            period_secs: 300,
        }
    }

    pub fn dimension(mut self, key: &str, value: impl Into<Expr>) -> Self {
        self.dimensions.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    GreaterThanThreshold,
    GreaterThanOrEqualToThreshold,
    LessThanThreshold,
}

/// How an alarm reads a period without data points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreatMissingData {
    Breaching,
    NotBreaching,
    Ignore,
    Missing,
}

/// Threshold alarm over one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub name: String,
    pub description: String,
    pub metric: Metric,
    pub threshold: f64,
    pub comparison: Comparison,
    pub evaluation_periods: u32,
    pub datapoints_to_alarm: u32,
    pub treat_missing_data: TreatMissingData,
    pub alarm_actions: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphWidget {
    pub title: String,
    pub width: u8,
    pub height: u8,
    pub left: Vec<Metric>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub right: Vec<Metric>,
}

/// Dashboard laid out as rows of graph widgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub name: String,
    pub rows: Vec<Vec<GraphWidget>>,
}

impl Dashboard {
    pub fn widget_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_dimensions_are_ordered() {
        let metric = Metric::new("AWS/ECS", "CPUUtilization", Statistic::Average)
            .dimension("ServiceName", "svc")
            .dimension("ClusterName", "cluster");

        let keys: Vec<_> = metric.dimensions.keys().cloned().collect();
        assert_eq!(keys, vec!["ClusterName", "ServiceName"]);
        assert_eq!(metric.period_secs, 300);
    }

    #[test]
    fn test_treat_missing_data_wire_value() {
        assert_eq!(
            serde_json::to_value(TreatMissingData::Breaching).unwrap(),
            serde_json::json!("breaching")
        );
    }
}
