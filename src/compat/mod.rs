//! Compatibility resolution layer
//!
//! Answers, for a list of packages, under which (game version, loader) pair
//! every package has a downloadable release, and expands resolved packages
//! into their required dependency closure.
//!
//! # Modules
//!
//! - [`availability`]: Per-package resolution for one (version, loader) pair
//! - [`search`]: Common version, next compatible version and best loader searches
//! - [`plan`]: Escalation through the searches when the requested pair fails
//! - [`closure`]: Depth-first walk over required dependencies
//! - [`download`]: Download collaborator for matched release files

pub mod availability;
pub mod closure;
pub mod download;
pub mod plan;
pub mod search;

pub use availability::AvailabilityResolver;
pub use closure::DependencyWalker;
pub use download::{Downloader, HttpDownloader};
pub use plan::{CheckOutcome, CheckRequest, Escalation, run_check};
