//! Registry test utilities

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use mod_checker::compat::AvailabilityResolver;
use mod_checker::parser::PackageRef;
use mod_checker::version::cache::Cache;
use mod_checker::version::error::RegistryError;
use mod_checker::version::registry::Registry;
use mod_checker::version::types::{
    Dependency, DependencyType, ProjectDump, ProjectInfo, ReleaseRecord,
};

/// Builds a project dump; the provider id is `<slug>-id` and the title is
/// the upper-cased slug
pub struct ProjectBuilder {
    dump: ProjectDump,
}

pub fn project(slug: &str) -> ProjectBuilder {
    ProjectBuilder {
        dump: ProjectDump {
            project: ProjectInfo {
                id: format!("{slug}-id"),
                slug: slug.to_string(),
                title: slug.to_uppercase(),
            },
            releases: Vec::new(),
        },
    }
}

impl ProjectBuilder {
    /// Append a release (releases are listed newest first)
    pub fn release(self, loaders: &[&str], versions: &[&str]) -> Self {
        self.release_with_deps(loaders, versions, &[])
    }

    /// Append a release requiring the given provider ids
    pub fn release_with_deps(mut self, loaders: &[&str], versions: &[&str], deps: &[&str]) -> Self {
        let id = format!("{}-r{}", self.dump.project.slug, self.dump.releases.len() + 1);
        self.dump.releases.push(ReleaseRecord {
            download_url: Some(format!("https://cdn.modrinth.com/data/{id}.jar")),
            filename: Some(format!("{id}.jar")),
            id,
            loaders: loaders.iter().map(|l| l.to_string()).collect(),
            game_versions: versions.iter().map(|v| v.to_string()).collect(),
            dependencies: deps
                .iter()
                .map(|dep| Dependency {
                    project_id: Some(dep.to_string()),
                    version_id: None,
                    dependency_type: DependencyType::Required,
                })
                .collect(),
        });
        self
    }

    pub fn build(self) -> ProjectDump {
        self.dump
    }
}

/// Mock registry serving fixed project dumps by slug or provider id
pub struct MockRegistry {
    projects: HashMap<String, ProjectDump>,
    calls: Arc<AtomicUsize>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            projects: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_project(mut self, project: ProjectBuilder) -> Self {
        let dump = project.build();
        self.projects.insert(dump.project.id.clone(), dump.clone());
        self.projects.insert(dump.project.slug.clone(), dump);
        self
    }

    /// Shared counter of fetches made, usable after the registry is moved
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn fetch_project(&self, slug: &str) -> Result<ProjectDump, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.projects.get(slug) {
            Some(dump) => Ok(dump.clone()),
            None => Err(RegistryError::NotFound(slug.to_string())),
        }
    }
}

/// Create an empty test cache in a temporary directory
pub fn create_test_cache() -> (TempDir, Arc<Cache>) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let cache = Cache::new(&db_path, 3_600_000).unwrap();
    (temp_dir, Arc::new(cache))
}

/// Create a resolver over the mock registry and a fresh test cache
pub fn create_test_resolver(registry: MockRegistry) -> (TempDir, AvailabilityResolver<Cache>) {
    let (temp_dir, cache) = create_test_cache();
    (temp_dir, AvailabilityResolver::new(Arc::new(registry), cache))
}

pub fn package_refs(slugs: &[&str]) -> Vec<PackageRef> {
    slugs
        .iter()
        .map(|slug| {
            PackageRef::new(
                slug.to_uppercase(),
                *slug,
                format!("https://modrinth.com/mod/{slug}"),
            )
        })
        .collect()
}

pub fn fetch_count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
