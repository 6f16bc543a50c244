// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack synthesizers
//!
//! Each stack is a pure function from (environment configuration, upstream
//! handles) to the stack it owns plus the handle it exposes downstream.
//!
//! ```text
//! Network ──> Data ──> Compute ──> Monitoring
//!    │          │         │
//!    └──────────┴────> Compute ──> Edge (optional)
//! ```

pub mod compute;
pub mod data;
pub mod edge;
pub mod monitoring;
pub mod network;

use crate::graph::Stack;

/// A finalized stack together with the handle it exposes
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesized<H> {
    pub stack: Stack,
    pub handle: H,
}

pub use compute::{ComputeStack, APPLICATION_PORT};
pub use data::{DataHandles, DataStack, CACHE_PORT, DATABASE_PORT};
pub use edge::EdgeStack;
pub use monitoring::MonitoringStack;
pub use network::NetworkStack;
