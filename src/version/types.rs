//! Common types shared by the provider client, the cache and the resolution engine

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::types::PackageRef;

/// Mod loader a release is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    Fabric,
    Forge,
    Quilt,
    NeoForge,
}

impl Loader {
    /// Every loader, in canonical priority order.
    ///
    /// Loader searches iterate this list, and it is the last tie-breaker
    /// when two loaders satisfy the same number of packages.
    pub const ALL: [Loader; 4] = [Loader::Fabric, Loader::Forge, Loader::Quilt, Loader::NeoForge];

    /// Returns the identifier the provider uses for this loader
    pub fn as_str(&self) -> &'static str {
        match self {
            Loader::Fabric => "fabric",
            Loader::Forge => "forge",
            Loader::Quilt => "quilt",
            Loader::NeoForge => "neoforge",
        }
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown loader '{0}' (expected one of fabric, forge, quilt, neoforge)")]
pub struct UnknownLoader(pub String);

impl std::str::FromStr for Loader {
    type Err = UnknownLoader;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fabric" => Ok(Loader::Fabric),
            "forge" => Ok(Loader::Forge),
            "quilt" => Ok(Loader::Quilt),
            "neoforge" => Ok(Loader::NeoForge),
            _ => Err(UnknownLoader(s.to_string())),
        }
    }
}

/// Project metadata as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Provider-assigned project id (dependencies refer to projects by this id)
    pub id: String,
    pub slug: String,
    /// Display name
    pub title: String,
}

/// Kind of relationship a release declares on another project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Required,
    Optional,
    Incompatible,
    Embedded,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub version_id: Option<String>,
    pub dependency_type: DependencyType,
}

/// One published build of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub id: String,
    pub loaders: Vec<String>,
    pub game_versions: Vec<String>,
    /// URL of the release's primary file, if it has any file at all
    pub download_url: Option<String>,
    pub filename: Option<String>,
    pub dependencies: Vec<Dependency>,
}

impl ReleaseRecord {
    /// Whether this release targets the given game version with the given loader
    pub fn supports(&self, game_version: &str, loader: Loader) -> bool {
        self.loaders.iter().any(|l| l == loader.as_str())
            && self.game_versions.iter().any(|v| v == game_version)
    }

    /// Dependencies that must be installed alongside this release
    pub fn required_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies
            .iter()
            .filter(|dep| dep.dependency_type == DependencyType::Required)
    }
}

/// Everything the provider knows about one project, fetched and cached as a unit.
///
/// Releases keep the provider's order, which is newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDump {
    pub project: ProjectInfo,
    pub releases: Vec<ReleaseRecord>,
}

impl ProjectDump {
    pub fn release(&self, release_id: &str) -> Option<&ReleaseRecord> {
        self.releases.iter().find(|r| r.id == release_id)
    }
}

/// The downloadable release chosen for a (version, loader) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRelease {
    pub version_id: String,
    pub download_url: String,
    pub filename: String,
}

impl MatchedRelease {
    /// Returns None when the release has no downloadable file
    pub fn from_release(release: &ReleaseRecord) -> Option<Self> {
        Some(Self {
            version_id: release.id.clone(),
            download_url: release.download_url.clone()?,
            filename: release.filename.clone()?,
        })
    }
}

/// Resolution result for one package at one (version, loader) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub name: String,
    pub slug: String,
    pub url: String,
    /// Provider project id, absent when the lookup failed
    pub project_id: Option<String>,
    /// Every game version the package supports, newest first
    pub versions: Vec<String>,
    /// Matched release; `Some` exactly when the package is available
    pub release: Option<MatchedRelease>,
    /// Every loader the package supports
    pub loader_types: Option<BTreeSet<String>>,
    pub error: Option<String>,
}

impl Availability {
    /// Availability for a package whose metadata could not be obtained
    pub fn failed(slug: &str, url: &str, error: impl Into<String>) -> Self {
        Self {
            name: slug.to_string(),
            slug: slug.to_string(),
            url: url.to_string(),
            project_id: None,
            versions: Vec::new(),
            release: None,
            loader_types: None,
            error: Some(error.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.release.is_some()
    }

    pub fn version_id(&self) -> Option<&str> {
        self.release.as_ref().map(|r| r.version_id.as_str())
    }

    pub fn download_url(&self) -> Option<&str> {
        self.release.as_ref().map(|r| r.download_url.as_str())
    }

    pub fn filename(&self) -> Option<&str> {
        self.release.as_ref().map(|r| r.filename.as_str())
    }

    /// Every identifier this package can be referred to by (slug and provider id)
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.slug.as_str()).chain(self.project_id.as_deref())
    }

    pub fn package_ref(&self) -> PackageRef {
        PackageRef {
            name: self.name.clone(),
            slug: self.slug.clone(),
            url: self.url.clone(),
        }
    }
}

/// A package that blocked a probed version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incompatibility {
    pub name: String,
    pub available_versions: Vec<String>,
}

/// Outcome of probing one candidate game version against every package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCheck {
    pub version: String,
    pub compatible: bool,
    pub incompatible: Vec<Incompatibility>,
}
