// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for deployment synthesis
//!
//! Synthesis is all-or-nothing: any of these errors aborts construction
//! before a graph is handed to the provisioning engine.

use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::{NetworkError, ValidationError};

/// Errors that can occur while synthesizing a deployment
#[derive(Debug, Error)]
pub enum InfrastructureError {
    /// Environment configuration missing, unparseable or out of range
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Address arithmetic failed while laying out the network
    #[error("Network layout error: {0}")]
    Network(#[from] NetworkError),

    /// A stack referenced a resource its declared dependencies do not expose
    #[error("Contract violation in stack {stack}: {reference} {reason}")]
    ContractViolation {
        stack: String,
        reference: String,
        reason: String,
    },

    /// A derived policy broke a graph invariant
    #[error("Invariant violated: {0}")]
    Invariant(#[from] ValidationError),

    /// Two resources in one stack share a logical id
    #[error("Duplicate resource {logical_id} in stack {stack}")]
    DuplicateResource { stack: String, logical_id: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Reading configuration or writing the manifest failed
    #[error("I/O error: {0}")]
    Io(String),
}

/// Result type for synthesis operations
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

impl From<serde_json::Error> for InfrastructureError {
    fn from(err: serde_json::Error) -> Self {
        InfrastructureError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for InfrastructureError {
    fn from(err: std::io::Error) -> Self {
        InfrastructureError::Io(err.to_string())
    }
}
