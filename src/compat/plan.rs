//! Escalation planner
//!
//! Runs a batch check for the requested (version, loader) pair and, when some
//! packages are unavailable, escalates through the searches in a fixed order:
//! common version, next compatible version, alternative loader. The first
//! escalation that yields a pair is adopted without prompting.

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::compat::availability::AvailabilityResolver;
use crate::compat::search::{
    check_alternative_loaders, find_best_loader, find_common_version,
    find_next_compatible_version,
};
use crate::parser::types::PackageRef;
use crate::version::store::MetadataStore;
use crate::version::types::{Availability, Loader, VersionCheck};

/// Parameters of one compatibility run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    pub game_version: String,
    pub loader: Loader,
    /// Loader to favor over the canonical order when loaders tie
    pub preferred_loader: Option<Loader>,
    /// Whether the next-version search may go below the requested version
    pub allow_downgrade: bool,
}

/// How the planner arrived at the outcome's (version, loader) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Escalation {
    /// Every package was available for the requested pair
    None,
    /// Switched to the oldest version every package supports, with the best
    /// loader at that version
    CommonVersion { loader_stats: IndexMap<Loader, usize> },
    /// Switched to the first newer (or older, with downgrades) version where
    /// every package is available
    NextVersion,
    /// Kept the version and switched to the first loader that satisfies every
    /// package; `satisfying` lists every such loader in canonical order
    AlternativeLoader { satisfying: Vec<Loader> },
    /// No escalation produced a pair; results are for the requested pair
    Exhausted,
}

/// Outcome of [`run_check`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub game_version: String,
    pub loader: Loader,
    /// Per-package results for the final pair, in input order
    pub results: Vec<Availability>,
    /// Probe trail of the next-version search, empty when it did not run
    pub version_checks: Vec<VersionCheck>,
    pub escalation: Escalation,
}

impl CheckOutcome {
    pub fn all_available(&self) -> bool {
        self.results.iter().all(Availability::is_available)
    }

    pub fn unavailable(&self) -> impl Iterator<Item = &Availability> {
        self.results.iter().filter(|r| !r.is_available())
    }
}

/// Check every package against the requested pair, escalating on failure
pub async fn run_check<S: MetadataStore>(
    resolver: &AvailabilityResolver<S>,
    packages: &[PackageRef],
    request: &CheckRequest,
) -> CheckOutcome {
    let slugs = || packages.iter().map(|p| p.slug.as_str());

    let results = resolver
        .resolve_all(slugs(), &request.game_version, request.loader)
        .await;

    let outcome = |game_version: &str, loader, results, version_checks, escalation| CheckOutcome {
        game_version: game_version.to_string(),
        loader,
        results,
        version_checks,
        escalation,
    };

    if results.iter().all(Availability::is_available) {
        return outcome(
            &request.game_version,
            request.loader,
            results,
            Vec::new(),
            Escalation::None,
        );
    }

    warn!(
        "{} of {} packages are not available for {} {}",
        results.iter().filter(|r| !r.is_available()).count(),
        results.len(),
        request.game_version,
        request.loader
    );

    if let Some(common) = find_common_version(&results) {
        let choice = find_best_loader(
            resolver,
            packages,
            &common,
            request.loader,
            request.preferred_loader,
        )
        .await;
        info!("Switching to {} {}", common, choice.loader);
        return outcome(
            &common,
            choice.loader,
            choice.results,
            Vec::new(),
            Escalation::CommonVersion {
                loader_stats: choice.stats,
            },
        );
    }

    let search = find_next_compatible_version(
        resolver,
        &results,
        &request.game_version,
        request.loader,
        request.allow_downgrade,
    )
    .await;

    if let Some(next) = search.version {
        info!("Switching to {} {}", next, request.loader);
        let next_results = resolver.resolve_all(slugs(), &next, request.loader).await;
        return outcome(
            &next,
            request.loader,
            next_results,
            search.checks,
            Escalation::NextVersion,
        );
    }

    let mut alternatives =
        check_alternative_loaders(resolver, packages, &request.game_version, request.loader).await;
    let satisfying: Vec<Loader> = alternatives.keys().copied().collect();

    if let Some((loader, alt_results)) = alternatives.shift_remove_index(0) {
        info!("Switching to {} {}", request.game_version, loader);
        return outcome(
            &request.game_version,
            loader,
            alt_results,
            search.checks,
            Escalation::AlternativeLoader { satisfying },
        );
    }

    warn!(
        "No compatible version or loader found for {} {}",
        request.game_version, request.loader
    );
    outcome(
        &request.game_version,
        request.loader,
        results,
        search.checks,
        Escalation::Exhausted,
    )
}
