// Copyright (c) 2025 - Cowboy AI, Inc.
//! Public entry point specs: web request firewall and content distribution

use serde::{Deserialize, Serialize};

use crate::graph::{Expr, Reference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FirewallScope {
    Cloudfront,
    Regional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Block,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextTransformation {
    UrlDecode,
    HtmlEntityDecode,
}

/// Request part a match statement inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldToMatch {
    AllQueryArguments,
    Body,
    UriPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleStatement {
    /// Requests per source address over the evaluation window
    RateBased { limit: u32, aggregate_key: String },
    /// Signature-based injection detection
    SqlInjection {
        field: FieldToMatch,
        transformations: Vec<TextTransformation>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
    pub metric_name: String,
    pub cloudwatch_metrics_enabled: bool,
    pub sampled_requests_enabled: bool,
}

impl Visibility {
    pub fn enabled(metric_name: &str) -> Self {
        Self {
            metric_name: metric_name.to_string(),
            cloudwatch_metrics_enabled: true,
            sampled_requests_enabled: true,
        }
    }
}

/// Firewall rule; lower priority numbers are evaluated first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAclRule {
    pub name: String,
    pub priority: u32,
    pub statement: RuleStatement,
    pub action: RuleAction,
    pub visibility: Visibility,
}

/// Web request firewall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAcl {
    pub name: String,
    pub scope: FirewallScope,
    pub default_action: RuleAction,
    pub rules: Vec<WebAclRule>,
    pub visibility: Visibility,
}

impl WebAcl {
    /// Rules in evaluation order
    pub fn ordered_rules(&self) -> Vec<&WebAclRule> {
        let mut rules: Vec<_> = self.rules.iter().collect();
        rules.sort_by_key(|rule| rule.priority);
        rules
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OriginProtocolPolicy {
    HttpOnly,
    HttpsOnly,
    MatchViewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewerProtocolPolicy {
    AllowAll,
    RedirectToHttps,
    HttpsOnly,
}

/// Origin reached over HTTP by domain name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpOrigin {
    pub domain_name: Expr,
    pub protocol_policy: OriginProtocolPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllowedMethods {
    GetHead,
    GetHeadOptions,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    CachingDisabled,
    CachingOptimized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginRequestPolicy {
    /// Every viewer header, cookie and query string
    AllViewer,
    CorsS3Origin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceClass {
    #[serde(rename = "PriceClass_100")]
    PriceClass100,
    #[serde(rename = "PriceClass_200")]
    PriceClass200,
    #[serde(rename = "PriceClass_All")]
    PriceClassAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpVersion {
    Http2,
    Http2And3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheBehavior {
    pub origin: HttpOrigin,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub allowed_methods: AllowedMethods,
    pub cache_policy: CachePolicy,
    pub origin_request_policy: OriginRequestPolicy,
}

/// Content delivery distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub comment: String,
    pub default_behavior: CacheBehavior,
    pub web_acl: Reference,
    pub price_class: PriceClass,
    pub http_version: HttpVersion,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, priority: u32) -> WebAclRule {
        WebAclRule {
            name: name.into(),
            priority,
            statement: RuleStatement::RateBased {
                limit: 100,
                aggregate_key: "IP".into(),
            },
            action: RuleAction::Block,
            visibility: Visibility::enabled(name),
        }
    }

    #[test]
    fn test_rules_ordered_by_priority() {
        let acl = WebAcl {
            name: "waf".into(),
            scope: FirewallScope::Cloudfront,
            default_action: RuleAction::Allow,
            rules: vec![rule("second", 2), rule("first", 1)],
            visibility: Visibility::enabled("waf"),
        };

        let names: Vec<_> = acl.ordered_rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_policy_wire_values() {
        assert_eq!(
            serde_json::to_value(ViewerProtocolPolicy::RedirectToHttps).unwrap(),
            serde_json::json!("redirect-to-https")
        );
        assert_eq!(
            serde_json::to_value(OriginProtocolPolicy::HttpOnly).unwrap(),
            serde_json::json!("http-only")
        );
    }
}
