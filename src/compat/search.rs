//! Version and loader search
//!
//! Higher-order searches built on [`AvailabilityResolver`]. Apart from the
//! cache entries the resolver writes, every function here is free of side
//! effects and deterministic.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::compat::availability::AvailabilityResolver;
use crate::parser::types::PackageRef;
use crate::version::semver::{compare_game_versions, is_snapshot, sort_versions_desc};
use crate::version::store::MetadataStore;
use crate::version::types::{Availability, Incompatibility, Loader, VersionCheck};

/// Result of [`find_next_compatible_version`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSearch {
    /// First candidate every package supports, if any
    pub version: Option<String>,
    /// Every probe made, in probe order
    pub checks: Vec<VersionCheck>,
}

/// Result of [`find_best_loader`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderChoice {
    pub loader: Loader,
    /// Per-package results for the chosen loader, in input order
    pub results: Vec<Availability>,
    /// Number of available packages per loader, in canonical loader order
    pub stats: IndexMap<Loader, usize>,
}

/// Probe one game version against every package
pub async fn check_version_compatibility<S: MetadataStore>(
    resolver: &AvailabilityResolver<S>,
    packages: &[PackageRef],
    game_version: &str,
    loader: Loader,
) -> VersionCheck {
    let results = resolver
        .resolve_all(packages.iter().map(|p| p.slug.as_str()), game_version, loader)
        .await;

    let incompatible: Vec<Incompatibility> = packages
        .iter()
        .zip(results)
        .filter(|(_, result)| !result.is_available())
        .map(|(package, result)| Incompatibility {
            name: package.name.clone(),
            available_versions: result.versions,
        })
        .collect();

    VersionCheck {
        version: game_version.to_string(),
        compatible: incompatible.is_empty(),
        incompatible,
    }
}

/// Oldest release version every package supports.
///
/// Packages that report no versions at all (failed lookups) are left out of
/// the intersection. Snapshot identifiers are never returned.
pub fn find_common_version(packages: &[Availability]) -> Option<String> {
    let mut version_sets = packages
        .iter()
        .filter(|p| !p.versions.is_empty())
        .map(|p| p.versions.iter().map(String::as_str).collect::<BTreeSet<_>>());

    let first = version_sets.next()?;
    let common = version_sets.fold(first, |acc, set| acc.intersection(&set).copied().collect());

    let sorted = sort_versions_desc(
        common
            .into_iter()
            .filter(|v| !is_snapshot(v))
            .map(str::to_string),
    );

    let oldest = sorted.last().cloned();
    debug!("Common version across {} packages: {:?}", packages.len(), oldest);
    oldest
}

/// Candidate versions for [`find_next_compatible_version`], in probe order
pub fn next_version_candidates(
    packages: &[Availability],
    current_version: &str,
    allow_downgrade: bool,
) -> Vec<String> {
    sort_versions_desc(packages.iter().flat_map(|p| p.versions.iter().cloned()))
        .into_iter()
        .filter(|v| {
            allow_downgrade || compare_game_versions(v, current_version) != Ordering::Less
        })
        .filter(|v| v != current_version)
        .collect()
}

/// Find the first candidate version at which every package is available.
///
/// Candidates are the union of all versions any package supports, newest
/// first; without `allow_downgrade` only versions at or above the current one
/// are considered. The search stops at the first fully compatible candidate.
pub async fn find_next_compatible_version<S: MetadataStore>(
    resolver: &AvailabilityResolver<S>,
    packages: &[Availability],
    current_version: &str,
    loader: Loader,
    allow_downgrade: bool,
) -> VersionSearch {
    let refs: Vec<PackageRef> = packages.iter().map(Availability::package_ref).collect();
    let candidates = next_version_candidates(packages, current_version, allow_downgrade);
    debug!(
        "Probing {} candidate versions from {} with {}",
        candidates.len(),
        current_version,
        loader
    );

    let mut checks = Vec::new();
    for candidate in candidates {
        let check = check_version_compatibility(resolver, &refs, &candidate, loader).await;
        let compatible = check.compatible;
        checks.push(check);
        if compatible {
            info!("All packages are available for {} {}", candidate, loader);
            return VersionSearch {
                version: Some(candidate),
                checks,
            };
        }
    }

    VersionSearch {
        version: None,
        checks,
    }
}

/// Pick a loader from per-loader counts.
///
/// Among loaders tied for the highest count, the current loader wins, then
/// the preferred one, then the first in canonical order.
pub fn pick_loader(
    stats: &IndexMap<Loader, usize>,
    current_loader: Loader,
    preferred_loader: Option<Loader>,
) -> Loader {
    let best = stats.values().copied().max().unwrap_or(0);
    let is_best = |loader: &Loader| stats.get(loader).copied().unwrap_or(0) == best;

    if is_best(&current_loader) {
        return current_loader;
    }
    if let Some(preferred) = preferred_loader.filter(is_best) {
        return preferred;
    }
    Loader::ALL
        .into_iter()
        .find(is_best)
        .unwrap_or(current_loader)
}

/// Find the loader under which the most packages are available at a fixed version
pub async fn find_best_loader<S: MetadataStore>(
    resolver: &AvailabilityResolver<S>,
    packages: &[PackageRef],
    game_version: &str,
    current_loader: Loader,
    preferred_loader: Option<Loader>,
) -> LoaderChoice {
    let mut stats = IndexMap::new();
    let mut per_loader = IndexMap::new();

    for loader in Loader::ALL {
        let results = resolver
            .resolve_all(packages.iter().map(|p| p.slug.as_str()), game_version, loader)
            .await;
        let count = results.iter().filter(|r| r.is_available()).count();
        debug!("{} of {} packages available for {} {}", count, packages.len(), game_version, loader);
        stats.insert(loader, count);
        per_loader.insert(loader, results);
    }

    let loader = pick_loader(&stats, current_loader, preferred_loader);
    let results = per_loader.swap_remove(&loader).unwrap_or_default();

    LoaderChoice {
        loader,
        results,
        stats,
    }
}

/// Loaders other than the current one under which every package is available
pub async fn check_alternative_loaders<S: MetadataStore>(
    resolver: &AvailabilityResolver<S>,
    packages: &[PackageRef],
    game_version: &str,
    current_loader: Loader,
) -> IndexMap<Loader, Vec<Availability>> {
    let mut satisfying = IndexMap::new();

    for loader in Loader::ALL.into_iter().filter(|l| *l != current_loader) {
        let results = resolver
            .resolve_all(packages.iter().map(|p| p.slug.as_str()), game_version, loader)
            .await;
        if results.iter().all(Availability::is_available) {
            info!("Every package is available for {} {}", game_version, loader);
            satisfying.insert(loader, results);
        }
    }

    satisfying
}
