//! Modrinth v2 API registry implementation

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{DEFAULT_API_BASE_URL, DEFAULT_RATE_LIMIT, USER_AGENT};
use crate::version::error::RegistryError;
use crate::version::rate_limit::{RateLimitInfo, RateLimiter};
use crate::version::registry::Registry;
use crate::version::types::{Dependency, ProjectDump, ProjectInfo, ReleaseRecord};

/// Response from `GET /project/{slug}`
#[derive(Debug, Deserialize)]
struct ModrinthProject {
    id: String,
    slug: String,
    title: String,
}

/// One element of the `GET /project/{slug}/version` response
#[derive(Debug, Deserialize)]
struct ModrinthVersion {
    id: String,
    #[serde(default)]
    loaders: Vec<String>,
    #[serde(default)]
    game_versions: Vec<String>,
    #[serde(default)]
    files: Vec<ModrinthFile>,
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
struct ModrinthFile {
    url: String,
    filename: String,
    #[serde(default)]
    primary: bool,
}

impl From<ModrinthVersion> for ReleaseRecord {
    fn from(version: ModrinthVersion) -> Self {
        let primary = version.files.iter().position(|f| f.primary).unwrap_or(0);
        let file = version.files.into_iter().nth(primary);

        Self {
            id: version.id,
            loaders: version.loaders,
            game_versions: version.game_versions,
            download_url: file.as_ref().map(|f| f.url.clone()),
            filename: file.map(|f| f.filename),
            dependencies: version.dependencies,
        }
    }
}

/// Registry implementation for the Modrinth v2 API
pub struct ModrinthRegistry {
    client: reqwest::Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl ModrinthRegistry {
    /// Creates a new ModrinthRegistry with a custom base URL
    pub fn new(base_url: &str, limiter: Arc<RateLimiter>) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter,
        })
    }

    /// Creates a ModrinthRegistry against the public API
    pub fn with_limiter(limiter: Arc<RateLimiter>) -> Result<Self, RegistryError> {
        Self::new(DEFAULT_API_BASE_URL, limiter)
    }

    /// Send one throttled GET request and decode its JSON body
    async fn get_json<T: DeserializeOwned>(&self, slug: &str, url: &str) -> Result<T, RegistryError> {
        let response = {
            let mut permit = self.limiter.acquire().await;
            debug!("Requesting {}", url);
            let response = self.client.get(url).send().await?;
            permit.record(rate_limit_info(response.headers()));
            response
        };

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(slug.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(RegistryError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            warn!("Modrinth API returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        response.json().await.map_err(|e| {
            warn!("Failed to parse Modrinth response from {}: {}", url, e);
            RegistryError::InvalidResponse(e.to_string())
        })
    }
}

/// Extract the request budget the provider reports in its response headers.
///
/// Missing or out-of-range values fall back to a full default budget with
/// no pending reset, so a stale low budget never outlives the response
/// that replaced it.
fn rate_limit_info(headers: &HeaderMap) -> RateLimitInfo {
    RateLimitInfo {
        limit: header_value(headers, "x-ratelimit-limit").unwrap_or(DEFAULT_RATE_LIMIT),
        remaining: header_value(headers, "x-ratelimit-remaining").unwrap_or(DEFAULT_RATE_LIMIT),
        reset_after: Duration::from_secs(header_value(headers, "x-ratelimit-reset").unwrap_or(0)),
    }
}

fn header_value<T: FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<T>().ok())
}

#[async_trait::async_trait]
impl Registry for ModrinthRegistry {
    async fn fetch_project(&self, slug: &str) -> Result<ProjectDump, RegistryError> {
        let versions_url = format!("{}/project/{}/version", self.base_url, slug);
        let versions: Vec<ModrinthVersion> = self.get_json(slug, &versions_url).await?;

        let project_url = format!("{}/project/{}", self.base_url, slug);
        let project: ModrinthProject = self.get_json(slug, &project_url).await?;

        debug!("Fetched {} releases for {}", versions.len(), slug);

        Ok(ProjectDump {
            project: ProjectInfo {
                id: project.id,
                slug: project.slug,
                title: project.title,
            },
            releases: versions.into_iter().map(ReleaseRecord::from).collect(),
        })
    }
}
