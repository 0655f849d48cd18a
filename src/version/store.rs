//! Storage abstraction for provider dumps and resolved availabilities

#[cfg(test)]
use mockall::automock;

use crate::version::error::CacheError;
use crate::version::types::{Availability, Loader, ProjectDump};

/// Trait for storing and retrieving cached provider metadata.
///
/// Entries are partitioned per package slug. Implementations treat expired or
/// unreadable entries as misses.
#[cfg_attr(test, automock)]
pub trait MetadataStore: Send + Sync + 'static {
    /// Get the raw provider dump for a package
    fn get_project(&self, slug: &str) -> Result<Option<ProjectDump>, CacheError>;

    /// Store the raw provider dump for a package
    fn put_project(&self, slug: &str, dump: &ProjectDump) -> Result<(), CacheError>;

    /// Get a previously resolved availability for a (version, loader) pair
    fn get_availability(
        &self,
        slug: &str,
        game_version: &str,
        loader: Loader,
    ) -> Result<Option<Availability>, CacheError>;

    /// Store a resolved availability for a (version, loader) pair
    fn put_availability(
        &self,
        slug: &str,
        game_version: &str,
        loader: Loader,
        availability: &Availability,
    ) -> Result<(), CacheError>;
}
