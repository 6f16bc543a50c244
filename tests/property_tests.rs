// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Entry Point
//!
//! This test suite uses proptest to verify properties of the synthesized
//! graph that must hold for every valid environment configuration.

mod fixtures;
mod property;
