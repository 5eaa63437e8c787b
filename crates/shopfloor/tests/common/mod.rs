//! Shared test utilities for shopfloor integration tests.
//!
//! This module provides:
//! - `TestHarness` wiring stores, a fixed clock and the orchestrator
//! - Builders for jobs, machines and configurations

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
