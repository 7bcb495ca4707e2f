//! Package registry version lookup.
//!
//! Queries the NuGet flat-container listing (`{base}/{id}/index.json`) once and
//! classifies the answer. Lookup failures are reported as a
//! [`RegistryLookup::QueryFailed`] value rather than an error so the caller
//! decides whether a failed check stops the release.

use async_trait::async_trait;
use serde::Deserialize;

/// Flat-container base used by nuget.org
pub const NUGET_FLAT_CONTAINER_URL: &str = "https://api.nuget.org/v3-flatcontainer";

/// Marker nuget.org puts in the 404 body of a package that was never published
pub const BLOB_NOT_FOUND_MARKER: &str = "BlobNotFound";

/// Result of checking the registry for a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryLookup {
    /// The version is already published
    VersionExists,
    /// The package is known but this version is not
    VersionAbsentPackageKnown,
    /// The package has never been published
    VersionAbsentPackageUnknown,
    /// The listing could not be obtained or understood
    QueryFailed {
        /// HTTP status, absent for transport errors
        status: Option<u16>,
        /// Response body or error text
        body: String,
    },
}

/// Registry seam used by the pipeline.
#[async_trait]
pub trait VersionIndex: Send + Sync {
    /// Check whether `version` of `package` is already published
    async fn lookup(&self, package: &str, version: &str) -> RegistryLookup;
}

#[derive(Debug, Deserialize)]
struct VersionListing {
    versions: Vec<String>,
}

/// Classify a flat-container response.
pub fn classify_response(status: u16, body: &str, version: &str) -> RegistryLookup {
    if (200..300).contains(&status) {
        return match serde_json::from_str::<VersionListing>(body) {
            Ok(listing) if listing.versions.iter().any(|v| v == version) => {
                RegistryLookup::VersionExists
            }
            Ok(_) => RegistryLookup::VersionAbsentPackageKnown,
            Err(e) => RegistryLookup::QueryFailed {
                status: Some(status),
                body: format!("Invalid version listing: {}", e),
            },
        };
    }

    if status == 404 && body.contains(BLOB_NOT_FOUND_MARKER) {
        return RegistryLookup::VersionAbsentPackageUnknown;
    }

    RegistryLookup::QueryFailed {
        status: Some(status),
        body: body.to_string(),
    }
}

/// [`VersionIndex`] backed by a NuGet v3 flat container over HTTP.
#[derive(Debug, Clone)]
pub struct NugetRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NugetRegistry {
    /// Registry client for the flat container at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Listing URL for a package; the flat container only serves lowercase ids
    pub fn index_url(&self, package: &str) -> String {
        format!("{}/{}/index.json", self.base_url, package.to_lowercase())
    }
}

#[async_trait]
impl VersionIndex for NugetRegistry {
    async fn lookup(&self, package: &str, version: &str) -> RegistryLookup {
        let url = self.index_url(package);
        log::debug!("Querying {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                return RegistryLookup::QueryFailed {
                    status: None,
                    body: e.to_string(),
                };
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => classify_response(status, &body, version),
            Err(e) => RegistryLookup::QueryFailed {
                status: Some(status),
                body: format!("Failed to read response: {}", e),
            },
        }
    }
}
