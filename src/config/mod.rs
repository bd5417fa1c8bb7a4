//! Configuration module for catalog ingestion
//!
//! This module provides the `IngestConfig` struct, its type-safe builder and
//! an environment loader for worker deployments.

// Sub-modules
pub mod builder;
pub mod env;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{IngestConfigBuilder, WithBaseUrl, WithDatabase};
pub use types::{BlockedResource, IngestConfig, PartialResultPolicy};
