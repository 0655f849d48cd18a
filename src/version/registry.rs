//! Registry trait for fetching project metadata from the provider

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::ProjectDump;

/// Trait for fetching project metadata from a registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches the project's display metadata and every published release
    ///
    /// # Arguments
    /// * `slug` - The project slug or provider id (e.g., "sodium" or "AANobbMI")
    ///
    /// # Returns
    /// * `Ok(ProjectDump)` - Project info and releases, ordered from newest to oldest
    /// * `Err(RegistryError)` - If the fetch fails
    async fn fetch_project(&self, slug: &str) -> Result<ProjectDump, RegistryError>;
}
