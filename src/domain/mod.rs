// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure Domain Models
//!
//! Value objects and rules shared by every stack.
//!
//! # Value Objects with Invariants
//!
//! - [`Ipv4Cidr`] - Network-aligned IPv4 address block
//! - [`SubnetTier`] - Public / private-egress / isolated segment
//! - [`Port`] - Port range on a transport protocol
//! - [`ResourceType`] - Infrastructure resource taxonomy
//!
//! # Invariants
//!
//! Pure validation functions over emitted resources live in [`invariants`].

pub mod invariants;
pub mod network;
pub mod resource_type;

pub use invariants::{ValidationError, ValidationResult};
pub use network::{availability_zones, Ipv4Cidr, NetworkError, Port, Protocol, SubnetTier};
pub use resource_type::{ResourceCategory, ResourceType};
