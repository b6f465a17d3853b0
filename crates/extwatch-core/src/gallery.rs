//! Visual Studio Marketplace access.
//!
//! The latest published version is resolved through an ordered list of
//! tiers: the gallery query API first, then a scrape of the public listing
//! page. The first tier that yields a well-formed version wins.

use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifact::{DownloadError, download_file};
use crate::extension::ExtensionId;
use crate::version::ExtensionVersion;

pub const DEFAULT_MARKETPLACE_URL: &str = "https://marketplace.visualstudio.com";

const QUERY_ACCEPT: &str = "application/json;api-version=3.0-preview.1";
const QUERY_USER_AGENT: &str = concat!("extwatch/", env!("CARGO_PKG_VERSION"));
const PAGE_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
const DOWNLOAD_USER_AGENT: &str = "VSCode/1.85.0 (Windows NT 10.0; Win64; x64)";

/// Criteria filter matching the exact `publisher.name` identifier.
const FILTER_EXTENSION_NAME: u32 = 7;
/// Only include the latest version of each extension in the result.
const FLAG_INCLUDE_LATEST_VERSION_ONLY: u32 = 0x200;

static PAGE_VERSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""version":"([^"]+)""#,
        r"(?i)Version\s+([0-9]+\.[0-9]+\.[0-9]+)",
        r#""Version":"([^"]+)""#,
        r#"data-version="([^"]+)""#,
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("latest version unavailable after {} attempt(s): {}", .failures.len(), .failures.join("; "))]
    Unavailable { failures: Vec<String> },
}

/// Where versions and packages come from.
#[async_trait]
pub trait ExtensionSource: Send + Sync {
    async fn latest_version(
        &self,
        extension: &ExtensionId,
    ) -> Result<ExtensionVersion, GalleryError>;

    fn package_url(&self, extension: &ExtensionId, version: &ExtensionVersion) -> String;

    /// Write the package for `version` to `dest`, returning its size in bytes.
    async fn download_package(
        &self,
        extension: &ExtensionId,
        version: &ExtensionVersion,
        dest: &Path,
    ) -> Result<u64, DownloadError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    filters: Vec<QueryFilter>,
    asset_types: Vec<String>,
    flags: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryFilter {
    criteria: Vec<QueryCriterion>,
    page_number: u32,
    page_size: u32,
    sort_by: u32,
    sort_order: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryCriterion {
    filter_type: u32,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResult {
    #[serde(default)]
    extensions: Vec<GalleryExtension>,
}

#[derive(Debug, Default, Deserialize)]
struct GalleryExtension {
    #[serde(default)]
    versions: Vec<GalleryVersion>,
}

#[derive(Debug, Default, Deserialize)]
struct GalleryVersion {
    #[serde(default)]
    version: Option<String>,
}

fn query_request(extension: &ExtensionId) -> QueryRequest {
    QueryRequest {
        filters: vec![QueryFilter {
            criteria: vec![QueryCriterion {
                filter_type: FILTER_EXTENSION_NAME,
                value: extension.to_string(),
            }],
            page_number: 1,
            page_size: 1,
            sort_by: 0,
            sort_order: 0,
        }],
        asset_types: Vec::new(),
        flags: FLAG_INCLUDE_LATEST_VERSION_ONLY,
    }
}

fn parse_query_response(body: &str) -> Result<ExtensionVersion, String> {
    let response: QueryResponse =
        serde_json::from_str(body).map_err(|e| format!("malformed query response: {e}"))?;
    let raw = response
        .results
        .first()
        .and_then(|result| result.extensions.first())
        .and_then(|extension| extension.versions.first())
        .and_then(|version| version.version.as_deref())
        .ok_or_else(|| "query response contains no extension version".to_string())?;
    raw.parse()
        .map_err(|e: crate::version::VersionParseError| e.to_string())
}

/// Apply the page patterns in order and return the first well-formed match.
fn scrape_version(page: &str) -> Option<ExtensionVersion> {
    PAGE_VERSION_PATTERNS.iter().find_map(|pattern| {
        let raw = pattern.captures(page)?.get(1)?.as_str();
        match raw.parse() {
            Ok(version) => Some(version),
            Err(error) => {
                debug!("Ignoring page match '{raw}': {error}");
                None
            }
        }
    })
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}

/// One way of learning the latest published version.
#[async_trait]
trait VersionTier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn latest(&self, extension: &ExtensionId) -> Result<ExtensionVersion, String>;
}

async fn resolve_in_order(
    tiers: &[&dyn VersionTier],
    extension: &ExtensionId,
) -> Result<ExtensionVersion, GalleryError> {
    let mut failures = Vec::new();

    for tier in tiers {
        debug!("Resolving latest version of {extension} via {}", tier.name());
        match tier.latest(extension).await {
            Ok(version) => {
                info!("Latest version ({}): {version}", tier.name());
                return Ok(version);
            }
            Err(error) => {
                warn!("{} failed: {error}", tier.name());
                failures.push(format!("{}: {error}", tier.name()));
            }
        }
    }

    Err(GalleryError::Unavailable { failures })
}

#[derive(Clone)]
pub struct Marketplace {
    client: reqwest::Client,
    base_url: String,
}

impl Marketplace {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn query_url(&self) -> String {
        format!("{}/_apis/public/gallery/extensionquery", self.base_url)
    }

    fn item_url(&self, extension: &ExtensionId) -> String {
        format!("{}/items?itemName={extension}", self.base_url)
    }

    async fn fetch_text(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<String, String> {
        let response = request
            .send()
            .await
            .map_err(|e| format!("{what} request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_snippet = response
                .text()
                .await
                .ok()
                .map(|body| response_snippet(&body, 160))
                .unwrap_or_default();
            return Err(format!("{what} returned HTTP {status}{body_snippet}"));
        }

        response
            .text()
            .await
            .map_err(|e| format!("failed to read {what} response: {e}"))
    }
}

struct QueryTier<'a>(&'a Marketplace);

#[async_trait]
impl VersionTier for QueryTier<'_> {
    fn name(&self) -> &'static str {
        "gallery query"
    }

    async fn latest(&self, extension: &ExtensionId) -> Result<ExtensionVersion, String> {
        let request = self
            .0
            .client
            .post(self.0.query_url())
            .header(reqwest::header::ACCEPT, QUERY_ACCEPT)
            .header(reqwest::header::USER_AGENT, QUERY_USER_AGENT)
            .json(&query_request(extension));
        let body = self.0.fetch_text(request, "gallery query").await?;
        parse_query_response(&body)
    }
}

struct ScrapeTier<'a>(&'a Marketplace);

#[async_trait]
impl VersionTier for ScrapeTier<'_> {
    fn name(&self) -> &'static str {
        "listing page"
    }

    async fn latest(&self, extension: &ExtensionId) -> Result<ExtensionVersion, String> {
        let request = self
            .0
            .client
            .get(self.0.item_url(extension))
            .header(reqwest::header::USER_AGENT, PAGE_USER_AGENT);
        let page = self.0.fetch_text(request, "listing page").await?;
        scrape_version(&page).ok_or_else(|| "no version found in listing page".to_string())
    }
}

#[async_trait]
impl ExtensionSource for Marketplace {
    async fn latest_version(
        &self,
        extension: &ExtensionId,
    ) -> Result<ExtensionVersion, GalleryError> {
        info!("Fetching latest version of {extension} from the marketplace");
        resolve_in_order(&[&QueryTier(self), &ScrapeTier(self)], extension).await
    }

    fn package_url(&self, extension: &ExtensionId, version: &ExtensionVersion) -> String {
        format!(
            "{}/_apis/public/gallery/publishers/{}/vsextensions/{}/{version}/vspackage",
            self.base_url,
            extension.publisher(),
            extension.name(),
        )
    }

    async fn download_package(
        &self,
        extension: &ExtensionId,
        version: &ExtensionVersion,
        dest: &Path,
    ) -> Result<u64, DownloadError> {
        let url = self.package_url(extension, version);
        info!("Downloading {extension} {version} from {url}");
        let request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/octet-stream")
            .header(reqwest::header::USER_AGENT, DOWNLOAD_USER_AGENT);
        download_file(request, dest).await
    }
}
