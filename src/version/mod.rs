//! Metadata layer for mod compatibility checking
//!
//! This module provides the data model and the plumbing for fetching, throttling
//! and caching project metadata from the provider (Modrinth).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│    Cache    │◀────│   compat    │
//! │  (fetch)    │     │  (storage)  │     │  (resolve)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │ RateLimiter │                         │   semver    │
//! │ (throttle)  │                         │(version cmp)│
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: SQLite-based metadata cache with lazy TTL expiry
//! - [`error`]: Error types for cache and registry operations
//! - [`rate_limit`]: Advisory request throttling driven by provider headers
//! - [`registry`]: Registry trait for fetching project metadata
//! - [`registries`]: Concrete registry implementations (Modrinth)
//! - [`semver`]: Game version parsing and ordering
//! - [`store`]: Storage trait implemented by the cache
//! - [`types`]: Loaders, releases, project dumps and availability results

pub mod cache;
pub mod error;
pub mod rate_limit;
pub mod registries;
pub mod registry;
pub mod semver;
pub mod store;
pub mod types;
