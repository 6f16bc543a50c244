// Copyright (c) 2025 - Cowboy AI, Inc.
//! Typed property records, one per resource kind
//!
//! Each record becomes a variant of [`crate::graph::ResourceSpec`].

pub mod compute;
pub mod data;
pub mod edge;
pub mod network;
pub mod observability;
pub mod security;

pub use compute::*;
pub use data::*;
pub use edge::*;
pub use network::*;
pub use observability::*;
pub use security::*;
