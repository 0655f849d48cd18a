//! Dependency closure walker
//!
//! Expands resolved packages into the flat list of their transitive required
//! dependencies. Traversal is depth-first pre-order over an explicit stack;
//! the visited set is owned by the caller and shared across roots so a
//! dependency declared by several packages, or reached through a cycle, is
//! resolved once.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use crate::compat::availability::AvailabilityResolver;
use crate::compat::download::Downloader;
use crate::version::store::MetadataStore;
use crate::version::types::{Availability, Loader};

pub struct DependencyWalker<'a, S: MetadataStore> {
    resolver: &'a AvailabilityResolver<S>,
    downloads: Option<(&'a dyn Downloader, &'a Path)>,
}

impl<'a, S: MetadataStore> DependencyWalker<'a, S> {
    pub fn new(resolver: &'a AvailabilityResolver<S>) -> Self {
        Self {
            resolver,
            downloads: None,
        }
    }

    /// Download every available dependency into `output_dir` as it is discovered
    pub fn with_downloads(mut self, downloader: &'a dyn Downloader, output_dir: &'a Path) -> Self {
        self.downloads = Some((downloader, output_dir));
        self
    }

    /// Expand one resolved package into its dependency closure.
    ///
    /// Returns every dependency discovered, available or not, in discovery
    /// order. The root itself is not part of the result. Unavailable
    /// dependencies are listed but not expanded further.
    pub async fn expand(
        &self,
        root: &Availability,
        game_version: &str,
        loader: Loader,
        visited: &mut HashSet<String>,
    ) -> Vec<Availability> {
        let Some(root_release) = root.version_id() else {
            return Vec::new();
        };
        visited.extend(root.identifiers().map(str::to_string));

        let mut pending = self.dependency_ids(&root.slug, root_release).await;
        pending.reverse();

        let mut closure = Vec::new();
        while let Some(id) = pending.pop() {
            if !visited.insert(id.clone()) {
                debug!("Dependency {} already visited", id);
                continue;
            }

            let dependency = self.resolver.resolve(&id, game_version, loader).await;
            visited.extend(dependency.identifiers().map(str::to_string));

            if let Some(release) = dependency.version_id() {
                info!("Found dependency {} of {}", dependency.name, root.name);
                if let Some((downloader, output_dir)) = self.downloads {
                    downloader.download(&dependency, output_dir).await;
                }

                let mut nested = self.dependency_ids(&id, release).await;
                nested.reverse();
                pending.extend(nested);
            } else {
                debug!(
                    "Dependency {} is not available for {} {}",
                    id, game_version, loader
                );
            }

            closure.push(dependency);
        }

        closure
    }

    /// Expand every available root, sharing one visited set.
    ///
    /// All roots are marked visited before any expansion, so a root that is
    /// also another root's dependency is never listed as a dependency.
    pub async fn expand_all(
        &self,
        roots: &[Availability],
        game_version: &str,
        loader: Loader,
    ) -> Vec<Availability> {
        let mut visited: HashSet<String> = roots
            .iter()
            .flat_map(|root| root.identifiers().map(str::to_string))
            .collect();

        let mut closure = Vec::new();
        for root in roots.iter().filter(|r| r.is_available()) {
            closure.extend(self.expand(root, game_version, loader, &mut visited).await);
        }
        closure
    }

    async fn dependency_ids(&self, slug: &str, version_id: &str) -> Vec<String> {
        self.resolver
            .required_dependencies(slug, version_id)
            .await
            .into_iter()
            .filter_map(|dep| dep.project_id)
            .collect()
    }
}
