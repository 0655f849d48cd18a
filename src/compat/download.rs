//! Download collaborator
//!
//! Fetches the matched release file of an available package into a target
//! directory. Downloads are idempotent: an existing file is never fetched
//! again. Failures are reported as `false`, never as errors.

use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::USER_AGENT;
use crate::version::types::Availability;

#[derive(Debug, Error)]
enum DownloadError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(reqwest::StatusCode),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for downloading a package's matched release file
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    /// Download the package into `output_dir`
    ///
    /// # Returns
    /// * `true` - The file is present in `output_dir` (downloaded now or earlier)
    /// * `false` - The package is unavailable or the download failed
    async fn download(&self, availability: &Availability, output_dir: &Path) -> bool;
}

/// Downloader over plain HTTP(S)
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    async fn fetch_to(&self, url: &str, target: &Path) -> Result<(), DownloadError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status));
        }

        let partial = partial_path(target);
        let mut file = tokio::fs::File::create(&partial).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&partial, target).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, availability: &Availability, output_dir: &Path) -> bool {
        let Some(release) = availability.release.as_ref() else {
            debug!("Skipping download of unavailable package {}", availability.slug);
            return false;
        };

        let Some(filename) = Path::new(&release.filename).file_name() else {
            warn!(
                "Refusing to download {}: invalid filename {:?}",
                availability.slug, release.filename
            );
            return false;
        };
        let target = output_dir.join(filename);

        if target.exists() {
            debug!("{} already exists, skipping download", target.display());
            return true;
        }

        if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
            warn!("Failed to create {}: {}", output_dir.display(), e);
            return false;
        }

        match self.fetch_to(&release.download_url, &target).await {
            Ok(()) => {
                info!("Downloaded {} to {}", availability.name, target.display());
                true
            }
            Err(e) => {
                warn!("Failed to download {}: {}", availability.name, e);
                let _ = tokio::fs::remove_file(partial_path(&target)).await;
                false
            }
        }
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
