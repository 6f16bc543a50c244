// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Graph
//!
//! The declarative output of synthesis: stacks of typed resources connected
//! by typed references.
//!
//! ```text
//! Stack ──owns──> Resource ──Reference──> Resource (same stack or a declared dependency)
//! ```

pub mod reference;
pub mod resource;
pub mod stack;

pub use reference::{collect_references, Attribute, Expr, Join, Reference};
pub use resource::{RemovalPolicy, Resource, ResourceSpec, Tags};
pub use stack::{Stack, StackBuilder, StackKind, StackName, StackOutput};
