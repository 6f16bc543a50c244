// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edge stack: firewall and content distribution in front of the load balancer

use tracing::info;

use super::Synthesized;
use crate::config::EnvironmentConfig;
use crate::errors::InfrastructureResult;
use crate::graph::{Attribute, Expr, RemovalPolicy, StackBuilder, StackKind};
use crate::handles::{ComputeHandle, EdgeHandle};
use crate::naming::physical_name;
use crate::resources::{
    AllowedMethods, CacheBehavior, CachePolicy, Distribution, FieldToMatch, FirewallScope,
    HttpOrigin, HttpVersion, OriginProtocolPolicy, OriginRequestPolicy, PriceClass, RuleAction,
    RuleStatement, TextTransformation, ViewerProtocolPolicy, Visibility, WebAcl, WebAclRule,
};

/// Requests per source address allowed in the evaluation window
pub const RATE_LIMIT: u32 = 2000;

/// Builds the public entry point
pub struct EdgeStack;

impl EdgeStack {
    pub fn synthesize(
        config: &EnvironmentConfig,
        compute: &ComputeHandle,
    ) -> InfrastructureResult<Synthesized<EdgeHandle>> {
        let env = config.env.as_str();
        info!("Synthesizing edge stack for {}", env);

        let mut builder = StackBuilder::new(
            StackKind::Edge,
            config,
            format!("Edge services for the LLM proxy ({env})"),
        );
        builder.consume(compute)?;
        let removal = RemovalPolicy::Destroy;

        // Rate limiting runs before injection detection
        let web_acl = builder.add(
            "WebAcl",
            WebAcl {
                name: physical_name("waf", env),
                scope: FirewallScope::Cloudfront,
                default_action: RuleAction::Allow,
                rules: vec![
                    WebAclRule {
                        name: "RateLimitRule".to_string(),
                        priority: 1,
                        statement: RuleStatement::RateBased {
                            limit: RATE_LIMIT,
                            aggregate_key: "IP".to_string(),
                        },
                        action: RuleAction::Block,
                        visibility: Visibility::enabled("RateLimitRule"),
                    },
                    WebAclRule {
                        name: "SqlInjectionRule".to_string(),
                        priority: 2,
                        statement: RuleStatement::SqlInjection {
                            field: FieldToMatch::AllQueryArguments,
                            transformations: vec![
                                TextTransformation::UrlDecode,
                                TextTransformation::HtmlEntityDecode,
                            ],
                        },
                        action: RuleAction::Block,
                        visibility: Visibility::enabled("SqlInjectionRule"),
                    },
                ],
                visibility: Visibility::enabled("ProxyWebAcl"),
            },
            removal,
        )?;

        // Responses are per request: no caching, viewer request forwarded as is
        let distribution = builder.add(
            "Distribution",
            Distribution {
                comment: format!("LLM Proxy CDN - {env}"),
                default_behavior: CacheBehavior {
                    origin: HttpOrigin {
                        domain_name: compute.load_balancer.dns_name().into(),
                        protocol_policy: OriginProtocolPolicy::HttpOnly,
                    },
                    viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
                    allowed_methods: AllowedMethods::All,
                    cache_policy: CachePolicy::CachingDisabled,
                    origin_request_policy: OriginRequestPolicy::AllViewer,
                },
                web_acl: web_acl.attr(Attribute::Arn),
                price_class: PriceClass::PriceClass100,
                http_version: HttpVersion::Http2And3,
                enabled: true,
            },
            removal,
        )?;

        let handle = EdgeHandle {
            stack: builder.name().clone(),
            web_acl,
            distribution,
        };
        builder
            .output(
                "DistributionUrl",
                Expr::join([Expr::literal("https://"), handle.domain_name().into()]),
                "Distribution URL",
            )
            .output(
                "DistributionId",
                &handle.distribution,
                "Distribution ID",
            );

        let stack = builder.build();
        info!(
            "Edge stack {} synthesized with {} resources",
            stack.name,
            stack.resources.len()
        );

        Ok(Synthesized { stack, handle })
    }
}
