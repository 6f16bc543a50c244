// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure synthesis for a containerized LLM proxy
//!
//! Derives a declarative resource graph from one environment configuration.
//! Five stacks (network, data, compute, monitoring and an optional edge)
//! own disjoint sets of resources and pass typed handles downstream; each
//! stack derives its internal policies purely from those handles and the
//! configuration.
//!
//! ```text
//! EnvironmentConfig ──> Deployment::synthesize ──> Deployment ──> Manifest (JSON)
//! ```

pub mod config;
pub mod deployment;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod handles;
pub mod manifest;
pub mod naming;
pub mod resources;
pub mod stacks;

// Re-export commonly used types
pub use config::{ConfigError, EnvironmentConfig, EnvironmentName};
pub use deployment::{Deployment, EdgeStage};
pub use errors::{InfrastructureError, InfrastructureResult};
pub use graph::{Reference, Resource, ResourceSpec, Stack, StackKind, StackName};
pub use manifest::Manifest;
pub use naming::UniquenessSeed;
