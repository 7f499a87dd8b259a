//! Cache-first favicon resolution.
//!
//! ### Fallback chain
//! 1. Record store lookup by the exact target url
//! 2. Well-known paths on the storage domain
//! 3. `<link rel=...>` tags on the site's root page
//! 4. The configured default icon
//!
//! Whatever the chain settles on is downloaded, written to the blob store
//! under `favicons/{domain}.ico`, and its public URL is recorded for the
//! target url. A failure anywhere in that persistence step degrades to the
//! default icon URL; only a malformed target url is reported as an error.

mod page;
mod probe;


use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use url::Url;

use navhub_core::{AppConfig, BlobStore, Error, RecordStore, RecordWriteMode};

use crate::fetch::{IconFetcher, RequestOptions, UrlError, favicon_blob_key, parse_target, storage_domain};

pub use page::discover_from_page;
pub use probe::{probe_well_known, well_known_candidates};

/// Content type stored when the icon response does not declare an image type.
pub const DEFAULT_ICON_MIME: &str = "image/x-icon";

/// Cache-Control attached to stored favicon blobs.
pub const ICON_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Timeouts and thresholds used by [`FaviconResolver`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub probe_timeout: Duration,
    pub page_timeout: Duration,
    pub icon_timeout: Duration,
    pub store_timeout: Duration,
    /// A probe body must be strictly larger than this to be accepted.
    pub min_icon_bytes: usize,
    pub default_icon_url: Url,
    pub browser_user_agent: String,
    pub record_write: RecordWriteMode,
}

impl ResolverConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let default_icon_url = Url::parse(&config.default_icon_url)
            .map_err(|e| Error::InvalidUrl(format!("default_icon_url: {e}")))?;

        Ok(Self {
            probe_timeout: config.probe_timeout(),
            page_timeout: config.page_timeout(),
            icon_timeout: config.icon_timeout(),
            store_timeout: config.store_timeout(),
            min_icon_bytes: config.min_icon_bytes,
            default_icon_url,
            browser_user_agent: config.browser_user_agent.clone(),
            record_write: config.record_write,
        })
    }
}

/// Content type to store for an icon response.
///
/// Anything that is not `image/*` is stored as [`DEFAULT_ICON_MIME`], since
/// blobs are served from the service's own origin.
pub fn icon_content_type(reported: Option<&str>) -> String {
    match reported.map(str::trim) {
        Some(ct) if is_image_type(ct) => ct.to_string(),
        _ => DEFAULT_ICON_MIME.to_string(),
    }
}

fn is_image_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence
        .split_once('/')
        .is_some_and(|(kind, subtype)| kind.eq_ignore_ascii_case("image") && !subtype.is_empty())
}

/// Which step of the chain produced the returned URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconSource {
    /// Served from the record store without any fetch.
    Cache,
    /// A well-known path was stored.
    WellKnown,
    /// An icon declared in the page's HTML was stored.
    Html,
    /// The default icon was stored for the domain.
    Default,
    /// Persistence failed; the default icon URL is returned as-is.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFavicon {
    pub favicon_url: String,
    pub source: IconSource,
}

/// Resolves, stores and records favicons for arbitrary target urls.
///
/// Holds no mutable state; concurrent calls for the same url may repeat
/// work but converge on the same blob key and record.
#[derive(Clone)]
pub struct FaviconResolver {
    fetcher: Arc<dyn IconFetcher>,
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    config: ResolverConfig,
}

impl FaviconResolver {
    pub fn new(
        fetcher: Arc<dyn IconFetcher>, records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>,
        config: ResolverConfig,
    ) -> Self {
        Self { fetcher, records, blobs, config }
    }

    /// Resolve a favicon URL for `target_url`.
    ///
    /// Returns `Err` only for a missing or malformed url.
    pub async fn resolve(&self, target_url: &str) -> Result<ResolvedFavicon, Error> {
        let target = parse_target(target_url).map_err(|e| match e {
            UrlError::Empty => Error::InvalidInput("missing url".to_string()),
            other => Error::InvalidUrl(format!("{target_url}: {other}")),
        })?;
        let domain = storage_domain(&target).map_err(|e| Error::InvalidUrl(format!("{target_url}: {e}")))?;

        if let Some(icon) = self.cached_icon(target_url).await {
            tracing::debug!(url = target_url, "favicon cache hit");
            return Ok(ResolvedFavicon { favicon_url: icon, source: IconSource::Cache });
        }

        let (final_url, source) = match self.discover(&domain).await {
            Some(found) => found,
            None => {
                tracing::debug!(domain = %domain, "no favicon discovered, using default icon");
                (self.config.default_icon_url.clone(), IconSource::Default)
            }
        };

        match self.persist(target_url, &domain, &final_url).await {
            Ok(favicon_url) => Ok(ResolvedFavicon { favicon_url, source }),
            Err(e) => {
                tracing::warn!(url = target_url, domain = %domain, error = %e, "favicon persistence failed");
                Ok(ResolvedFavicon {
                    favicon_url: self.config.default_icon_url.to_string(),
                    source: IconSource::Fallback,
                })
            }
        }
    }

    async fn cached_icon(&self, target_url: &str) -> Option<String> {
        match self.bounded("find_icon", self.records.find_icon(target_url)).await {
            Ok(Some(icon)) if !icon.trim().is_empty() => Some(icon),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(url = target_url, error = %e, "favicon cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn discover(&self, domain: &str) -> Option<(Url, IconSource)> {
        if let Some(url) = probe_well_known(self.fetcher.as_ref(), domain, &self.config).await {
            tracing::debug!(domain, icon = %url, "well-known favicon found");
            return Some((url, IconSource::WellKnown));
        }

        if let Some(url) = discover_from_page(self.fetcher.as_ref(), domain, &self.config).await {
            tracing::debug!(domain, icon = %url, "favicon discovered from page");
            return Some((url, IconSource::Html));
        }

        None
    }

    /// Download `final_url`, store it for `domain` and record it for `target_url`.
    async fn persist(&self, target_url: &str, domain: &str, final_url: &Url) -> Result<String, Error> {
        let response = self
            .fetcher
            .get(final_url, &RequestOptions::new(self.config.icon_timeout))
            .await?;

        if !response.status.is_success() {
            tracing::debug!(icon = %final_url, status = response.status.as_u16(), "storing non-success icon response");
        }

        let content_type = icon_content_type(response.content_type.as_deref());

        let key = favicon_blob_key(domain);
        self.bounded(
            "put_blob",
            self.blobs
                .put_blob(&key, response.bytes.to_vec(), &content_type, ICON_CACHE_CONTROL),
        )
        .await?;

        let public_url = self.blobs.public_url(&key);

        let written = self
            .bounded(
                "write_icon",
                self.records
                    .write_icon(target_url, &public_url, self.config.record_write),
            )
            .await?;

        if !written {
            tracing::debug!(url = target_url, "no record for url, icon not recorded");
        }

        Ok(public_url)
    }

    /// Run a store call under the store timeout.
    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        match tokio::time::timeout(self.config.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::StoreTimeout(format!(
                "{op} exceeded {}ms",
                self.config.store_timeout.as_millis()
            ))),
        }
    }
}
