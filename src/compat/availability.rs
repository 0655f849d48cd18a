//! Availability resolution for one package at one (version, loader) pair
//!
//! Lookups go through the metadata store first. A miss loads the project's
//! full release list (itself cached), scans it, and writes the result back.
//! Provider failures are turned into an unavailable result carrying the error;
//! nothing is propagated to the caller.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::config::SITE_MOD_URL;
use crate::version::error::RegistryError;
use crate::version::registry::Registry;
use crate::version::semver::sort_versions_desc;
use crate::version::store::MetadataStore;
use crate::version::types::{Availability, Dependency, Loader, MatchedRelease, ProjectDump};

/// Returns the project page URL for a slug
pub fn package_url(slug: &str) -> String {
    format!("{}/{}", SITE_MOD_URL, slug)
}

/// Scan a project's releases for the given pair.
///
/// The first release, in provider order, that lists both the loader and the
/// game version and has a downloadable file is the match. Versions and
/// loaders are collected from every release so the result always reports
/// what the package supports.
pub fn match_release(
    dump: &ProjectDump,
    slug: &str,
    game_version: &str,
    loader: Loader,
) -> Availability {
    let mut matched = None;
    let mut versions = Vec::new();
    let mut loaders = BTreeSet::new();

    for release in &dump.releases {
        if matched.is_none() && release.supports(game_version, loader) {
            matched = MatchedRelease::from_release(release);
            if matched.is_none() {
                debug!(
                    "Release {} of {} matches {} {} but has no file, skipping",
                    release.id, slug, game_version, loader
                );
            }
        }
        versions.extend(release.game_versions.iter().cloned());
        loaders.extend(release.loaders.iter().cloned());
    }

    // dependencies are looked up by project id; report the project's own slug
    let display_slug = match dump.project.slug.as_str() {
        "" => slug,
        project_slug => project_slug,
    };

    Availability {
        name: dump.project.title.clone(),
        slug: display_slug.to_string(),
        url: package_url(display_slug),
        project_id: Some(dump.project.id.clone()),
        versions: sort_versions_desc(versions),
        release: matched,
        loader_types: (!dump.releases.is_empty()).then_some(loaders),
        error: None,
    }
}

/// Resolves package availability against the provider, fronted by a metadata store
pub struct AvailabilityResolver<S: MetadataStore> {
    registry: Arc<dyn Registry>,
    store: Arc<S>,
}

impl<S: MetadataStore> AvailabilityResolver<S> {
    pub fn new(registry: Arc<dyn Registry>, store: Arc<S>) -> Self {
        Self { registry, store }
    }

    /// Resolve one package at one (version, loader) pair
    pub async fn resolve(&self, slug: &str, game_version: &str, loader: Loader) -> Availability {
        match self.store.get_availability(slug, game_version, loader) {
            Ok(Some(cached)) => {
                debug!("Cache hit for {} at {} {}", slug, game_version, loader);
                return cached;
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read cached availability for {}: {}", slug, e),
        }

        let dump = match self.project(slug).await {
            Ok(dump) => dump,
            Err(e) => {
                warn!("Failed to resolve {} at {} {}: {}", slug, game_version, loader, e);
                return Availability::failed(slug, &package_url(slug), e.to_string());
            }
        };

        let availability = match_release(&dump, slug, game_version, loader);
        debug!(
            "Resolved {} at {} {}: available={}",
            slug,
            game_version,
            loader,
            availability.is_available()
        );

        let _ = self
            .store
            .put_availability(slug, game_version, loader, &availability)
            .inspect_err(|e| error!("Failed to cache availability for {}: {}", slug, e));

        availability
    }

    /// Resolve every package at the same pair, keeping input order
    pub async fn resolve_all<'a, I>(
        &self,
        slugs: I,
        game_version: &str,
        loader: Loader,
    ) -> Vec<Availability>
    where
        I: IntoIterator<Item = &'a str>,
    {
        join_all(
            slugs
                .into_iter()
                .map(|slug| self.resolve(slug, game_version, loader)),
        )
        .await
    }

    /// Required dependencies declared by one release of a package.
    ///
    /// Dependencies without a project id cannot be resolved and are left out.
    /// A failed lookup yields no dependencies.
    pub async fn required_dependencies(&self, slug: &str, version_id: &str) -> Vec<Dependency> {
        let dump = match self.project(slug).await {
            Ok(dump) => dump,
            Err(e) => {
                warn!("Failed to load dependencies of {}: {}", slug, e);
                return Vec::new();
            }
        };

        let Some(release) = dump.release(version_id) else {
            warn!("Release {} of {} not found", version_id, slug);
            return Vec::new();
        };

        release
            .required_dependencies()
            .filter(|dep| dep.project_id.is_some())
            .cloned()
            .collect()
    }

    /// Cache-or-fetch the project's full release list
    async fn project(&self, slug: &str) -> Result<ProjectDump, RegistryError> {
        match self.store.get_project(slug) {
            Ok(Some(dump)) => {
                debug!("Using cached releases for {}", slug);
                return Ok(dump);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read cached releases for {}: {}", slug, e),
        }

        let dump = self.registry.fetch_project(slug).await?;
        info!("Fetched {} releases for {}", dump.releases.len(), slug);

        let _ = self
            .store
            .put_project(slug, &dump)
            .inspect_err(|e| error!("Failed to cache releases for {}: {}", slug, e));

        Ok(dump)
    }
}
