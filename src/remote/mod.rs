//! The remote metadata source.
//!
//! Commands consume the narrow [`RemoteSource`] contract: the latest
//! published version, a version's [`ContentSummary`], and the URL of its
//! package. [`HttpRemoteSource`] is the default implementation over a static
//! JSON layout; tests substitute in-memory sources.

pub mod summary;

pub use summary::{ContentFileEntry, ContentSummary};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::core::{UpdaterError, VersionId};

/// Source of version metadata for the updater.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// The most recently published version id.
    async fn latest_version_id(&self) -> Result<VersionId>;

    /// The content summary for `version`.
    ///
    /// Fails with [`UpdaterError::VersionNotFound`] when the version is
    /// unknown to the source.
    async fn content_summary(&self, version: VersionId) -> Result<ContentSummary>;

    /// URL of the downloadable package for `version`.
    fn package_url(&self, version: VersionId) -> String;
}

#[derive(Deserialize)]
struct LatestDocument {
    version_id: VersionId,
}

/// Remote source over a static HTTP JSON layout.
///
/// - `GET <base>/latest.json` → `{ "version_id": N }`
/// - `GET <base>/versions/<N>/summary.json` → [`ContentSummary`]
/// - package at `<base>/versions/<N>/package.zip`
pub struct HttpRemoteSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteSource {
    /// Creates a source reading from `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn latest_version_id(&self) -> Result<VersionId> {
        let url = format!("{}/latest.json", self.base_url);
        debug!(url = %url, "fetching latest version id");

        let response = self.client.get(&url).send().await.map_err(|e| {
            UpdaterError::NetworkError { operation: "fetch latest version".to_string(), reason: e.to_string() }
        })?;
        let response = response.error_for_status().map_err(|e| UpdaterError::NetworkError {
            operation: "fetch latest version".to_string(),
            reason: e.to_string(),
        })?;

        let document: LatestDocument =
            response.json().await.context("Failed to parse latest-version document")?;
        Ok(document.version_id)
    }

    async fn content_summary(&self, version: VersionId) -> Result<ContentSummary> {
        let url = format!("{}/versions/{version}/summary.json", self.base_url);
        debug!(url = %url, "fetching content summary");

        let response = self.client.get(&url).send().await.map_err(|e| {
            UpdaterError::NetworkError { operation: "fetch content summary".to_string(), reason: e.to_string() }
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(UpdaterError::VersionNotFound { version: version.value() }.into());
        }
        let response = response.error_for_status().map_err(|e| UpdaterError::NetworkError {
            operation: "fetch content summary".to_string(),
            reason: e.to_string(),
        })?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse content summary for version {version}"))
    }

    fn package_url(&self, version: VersionId) -> String {
        format!("{}/versions/{version}/package.zip", self.base_url)
    }
}
