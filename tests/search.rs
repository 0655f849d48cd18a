//! Version and loader search tests against a mock registry

mod helper;

use indexmap::IndexMap;
use rstest::rstest;

use helper::{MockRegistry, create_test_resolver, package_refs, project};
use mod_checker::compat::search::{
    check_alternative_loaders, check_version_compatibility, find_best_loader,
    find_common_version, find_next_compatible_version,
};
use mod_checker::version::semver::compare_game_versions;
use mod_checker::version::types::{Incompatibility, Loader};

#[tokio::test]
async fn resolve_reports_supported_versions_for_missing_target() {
    let registry = MockRegistry::new().with_project(project("a").release(&["fabric"], &["1.20"]));
    let (_temp_dir, resolver) = create_test_resolver(registry);

    let result = resolver.resolve("a", "1.19", Loader::Fabric).await;

    assert!(!result.is_available());
    assert_eq!(result.versions, vec!["1.20"]);
}

#[tokio::test]
async fn find_common_version_picks_oldest_version_shared_by_resolved_packages() {
    let registry = MockRegistry::new()
        .with_project(project("a").release(&["fabric"], &["1.19", "1.18"]))
        .with_project(project("b").release(&["fabric"], &["1.19", "1.18"]));
    let (_temp_dir, resolver) = create_test_resolver(registry);

    let results = resolver.resolve_all(["a", "b"], "1.20", Loader::Fabric).await;

    assert_eq!(find_common_version(&results), Some("1.18".to_string()));
}

#[tokio::test]
async fn find_best_loader_switches_to_loader_with_more_packages() {
    let registry = MockRegistry::new().with_project(project("a").release(&["fabric"], &["1.20"]));
    let (_temp_dir, resolver) = create_test_resolver(registry);

    let choice = find_best_loader(&resolver, &package_refs(&["a"]), "1.20", Loader::Forge, None).await;

    assert_eq!(choice.loader, Loader::Fabric);
    assert_eq!(choice.results.len(), 1);
    assert!(choice.results[0].is_available());
    let expected: IndexMap<Loader, usize> = [
        (Loader::Fabric, 1),
        (Loader::Forge, 0),
        (Loader::Quilt, 0),
        (Loader::NeoForge, 0),
    ]
    .into_iter()
    .collect();
    assert_eq!(choice.stats, expected);
}

#[tokio::test]
async fn find_best_loader_keeps_current_loader_on_tie() {
    let registry = MockRegistry::new()
        .with_project(project("a").release(&["fabric", "forge"], &["1.20"]))
        .with_project(project("b").release(&["fabric"], &["1.20"]).release(&["forge"], &["1.20"]));
    let (_temp_dir, resolver) = create_test_resolver(registry);

    let choice = find_best_loader(
        &resolver,
        &package_refs(&["a", "b"]),
        "1.20",
        Loader::Forge,
        Some(Loader::Fabric),
    )
    .await;

    assert_eq!(choice.loader, Loader::Forge);
    assert_eq!(choice.stats[&Loader::Fabric], 2);
    assert_eq!(choice.stats[&Loader::Forge], 2);
    assert!(choice.results.iter().all(|r| r.is_available()));
}

#[rstest]
#[case(Some(Loader::NeoForge), Loader::NeoForge)]
#[case(None, Loader::Quilt)]
#[tokio::test]
async fn find_best_loader_breaks_ties_by_preference_then_canonical_order(
    #[case] preferred: Option<Loader>,
    #[case] expected: Loader,
) {
    let registry = MockRegistry::new()
        .with_project(project("a").release(&["neoforge", "quilt"], &["1.20.1"]));
    let (_temp_dir, resolver) = create_test_resolver(registry);

    let choice =
        find_best_loader(&resolver, &package_refs(&["a"]), "1.20.1", Loader::Fabric, preferred)
            .await;

    assert_eq!(choice.loader, expected);
}

#[tokio::test]
async fn check_version_compatibility_lists_blocking_packages() {
    let registry = MockRegistry::new()
        .with_project(project("a").release(&["fabric"], &["1.20.1"]))
        .with_project(project("b").release(&["fabric"], &["1.19.2", "1.19.4"]));
    let (_temp_dir, resolver) = create_test_resolver(registry);

    let check =
        check_version_compatibility(&resolver, &package_refs(&["a", "b"]), "1.20.1", Loader::Fabric)
            .await;

    assert_eq!(check.version, "1.20.1");
    assert!(!check.compatible);
    assert_eq!(
        check.incompatible,
        vec![Incompatibility {
            name: "B".to_string(),
            available_versions: vec!["1.19.4".to_string(), "1.19.2".to_string()],
        }]
    );
}

#[tokio::test]
async fn find_next_compatible_version_probes_newest_candidates_first() {
    let registry = MockRegistry::new()
        .with_project(project("a").release(&["fabric"], &["1.21", "1.20.4", "1.19.2"]))
        .with_project(project("b").release(&["fabric"], &["1.20.4", "1.20.1"]));
    let (_temp_dir, resolver) = create_test_resolver(registry);
    let current = resolver.resolve_all(["a", "b"], "1.20.1", Loader::Fabric).await;

    let search =
        find_next_compatible_version(&resolver, &current, "1.20.1", Loader::Fabric, false).await;

    assert_eq!(search.version.as_deref(), Some("1.20.4"));
    let probed: Vec<_> = search.checks.iter().map(|c| c.version.as_str()).collect();
    assert_eq!(probed, vec!["1.21", "1.20.4"]);
    assert!(!search.checks[0].compatible);
    assert_eq!(search.checks[0].incompatible[0].name, "B");
    assert!(search.checks[1].compatible);
}

#[tokio::test]
async fn find_next_compatible_version_never_returns_current_or_older_without_downgrade() {
    let registry = MockRegistry::new()
        .with_project(project("a").release(&["fabric"], &["1.20.1", "1.19.2", "1.18.2"]))
        .with_project(project("b").release(&["fabric"], &["1.20.1", "1.19.2", "1.18.2"]))
        .with_project(project("c").release(&["forge"], &["1.20.1"]));
    let (_temp_dir, resolver) = create_test_resolver(registry);
    let current = resolver
        .resolve_all(["a", "b", "c"], "1.19.2", Loader::Fabric)
        .await;

    let search =
        find_next_compatible_version(&resolver, &current, "1.19.2", Loader::Fabric, false).await;

    assert_eq!(search.version, None);
    for check in &search.checks {
        assert_ne!(check.version, "1.19.2");
        assert!(compare_game_versions(&check.version, "1.19.2").is_gt());
    }
    assert_eq!(search.checks.len(), 1);
}

#[tokio::test]
async fn find_next_compatible_version_with_downgrade_probes_older_versions() {
    let registry = MockRegistry::new()
        .with_project(project("a").release(&["fabric"], &["1.19.2", "1.18.2"]))
        .with_project(project("b").release(&["fabric"], &["1.18.2"]));
    let (_temp_dir, resolver) = create_test_resolver(registry);
    let current = resolver.resolve_all(["a", "b"], "1.20.1", Loader::Fabric).await;

    let without = find_next_compatible_version(&resolver, &current, "1.20.1", Loader::Fabric, false).await;
    let with = find_next_compatible_version(&resolver, &current, "1.20.1", Loader::Fabric, true).await;

    assert_eq!(without.version, None);
    assert!(without.checks.is_empty());
    assert_eq!(with.version.as_deref(), Some("1.18.2"));
    let probed: Vec<_> = with.checks.iter().map(|c| c.version.as_str()).collect();
    assert_eq!(probed, vec!["1.19.2", "1.18.2"]);
}

#[tokio::test]
async fn check_alternative_loaders_keeps_only_fully_satisfying_loaders() {
    let registry = MockRegistry::new()
        .with_project(project("a").release(&["fabric", "quilt"], &["1.20.1"]))
        .with_project(project("b").release(&["quilt", "forge"], &["1.20.1"]));
    let (_temp_dir, resolver) = create_test_resolver(registry);

    let alternatives =
        check_alternative_loaders(&resolver, &package_refs(&["a", "b"]), "1.20.1", Loader::Fabric)
            .await;

    let loaders: Vec<_> = alternatives.keys().copied().collect();
    assert_eq!(loaders, vec![Loader::Quilt]);
    assert_eq!(alternatives[&Loader::Quilt].len(), 2);
}

#[tokio::test]
async fn check_alternative_loaders_never_includes_current_loader() {
    let registry = MockRegistry::new()
        .with_project(project("a").release(&["fabric", "forge"], &["1.20.1"]));
    let (_temp_dir, resolver) = create_test_resolver(registry);

    let alternatives =
        check_alternative_loaders(&resolver, &package_refs(&["a"]), "1.20.1", Loader::Fabric).await;

    assert_eq!(alternatives.keys().copied().collect::<Vec<_>>(), vec![Loader::Forge]);
}
