//! Outbound HTTP for favicon resolution, with SSRF protection.
//!
//! ### Target URLs
//! - Absolute `http`/`https` URLs with a host; the caller's string is the
//!   cache key and is never rewritten.
//! - Storage domain: host minus a leading `www.`.
//!
//! ### SSRF & Safety Gates
//! - Deny private ranges (RFC1918, link-local, localhost, CGNAT, etc.)
//! - Every hostname is resolved by `PublicResolver`; a private A/AAAA
//!   answer fails the connection, on redirect hops too.
//! - Each URL, redirect hops included, is checked against scheme, denylist
//!   and IP literals.
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//!
//! ### Status handling
//! Non-success statuses are returned, not raised. Callers decide whether a
//! 404 body is usable.

pub mod ssrf;
pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use reqwest::{Client, StatusCode, header};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use ssrf::{HostGuard, PublicResolver, SsrfError, validate_ip};
pub use self::url::{UrlError, favicon_blob_key, parse_target, storage_domain};

use navhub_core::{AppConfig, Error};

/// Accept header for favicon probes and downloads.
pub const ACCEPT_IMAGES: &str = "image/avif,image/webp,image/png,image/svg+xml,image/*,*/*;q=0.8";

/// Accept header for HTML page fetches.
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Default user agent string (default: "navhub/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Client-wide timeout; per-request timeouts are usually shorter (default: 10s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Skip the private-address check (default: false)
    pub allow_private_networks: bool,

    /// Hosts never fetched, with their subdomains
    pub denylist_domains: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "navhub/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_secs(10),
            max_redirects: 5,
            allow_private_networks: false,
            denylist_domains: Vec::new(),
        }
    }
}

impl FetchConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            max_redirects: config.max_redirects,
            allow_private_networks: config.allow_private_networks,
            denylist_domains: config.denylist_domains.clone(),
            ..Default::default()
        }
    }
}

/// Per-request settings.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub timeout: Duration,
    /// Overrides the client's default User-Agent.
    pub user_agent: Option<String>,
    pub accept: &'static str,
}

impl RequestOptions {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, user_agent: None, accept: ACCEPT_IMAGES }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_accept(mut self, accept: &'static str) -> Self {
        self.accept = accept;
        self
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// GET a URL and return its body regardless of status.
///
/// Errors are transport-level: blocked target, timeout, network failure,
/// or a body over the size limit.
#[async_trait]
pub trait IconFetcher: Send + Sync {
    async fn get(&self, url: &Url, options: &RequestOptions) -> Result<FetchResponse, Error>;
}

/// HTTP fetch client with safety checks.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
    guard: HostGuard,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    ///
    /// Unless `allow_private_networks` is set, hostnames are resolved
    /// through [`PublicResolver`].
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let guard = HostGuard::new(config.allow_private_networks, &config.denylist_domains);
        let resolver = (!config.allow_private_networks).then_some(PublicResolver);
        Self::with_guards(config, guard, resolver)
    }

    fn with_guards(config: FetchConfig, guard: HostGuard, resolver: Option<PublicResolver>) -> Result<Self, Error> {
        let redirect_guard = guard.clone();
        let max_redirects = config.max_redirects;
        let redirect_policy = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= max_redirects {
                attempt.error(format!("more than {max_redirects} redirects"))
            } else if let Err(e) = redirect_guard.check_static(attempt.url()) {
                attempt.error(e)
            } else {
                attempt.follow()
            }
        });

        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(redirect_policy)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(resolver) = resolver {
            builder = builder.dns_resolver(Arc::new(resolver));
        }

        let http = builder
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config, guard })
    }

    /// Fetch a URL, returning raw bytes and metadata.
    ///
    /// Performs the SSRF checks and respects redirect/byte limits. Any HTTP
    /// status is returned as a response.
    pub async fn fetch(&self, url: &Url, options: &RequestOptions) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        self.guard
            .check_static(url)
            .map_err(|e| Error::SsrfBlocked(format!("{url}: {e}")))?;

        let mut request = self
            .http
            .get(url.clone())
            .timeout(options.timeout)
            .header(header::ACCEPT, options.accept);

        if let Some(user_agent) = &options.user_agent {
            request = request.header(header::USER_AGENT, user_agent);
        }

        let response = request.send().await.map_err(|e| transport_error(url, e))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "{url}: {} bytes exceeds {}",
                len, self.config.max_bytes
            )));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await.map_err(|e| transport_error(url, e))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{url}: {} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} [{}] in {}ms ({} bytes)",
            url,
            final_url,
            status.as_u16(),
            fetch_ms,
            bytes.len()
        );

        Ok(FetchResponse { final_url, status, content_type, bytes, fetch_ms })
    }
}

#[async_trait]
impl IconFetcher for FetchClient {
    async fn get(&self, url: &Url, options: &RequestOptions) -> Result<FetchResponse, Error> {
        self.fetch(url, options).await
    }
}

fn transport_error(url: &Url, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        return Error::FetchTimeout(format!("{url}: {err}"));
    }

    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        if let Some(blocked) = cause.downcast_ref::<SsrfError>() {
            return Error::SsrfBlocked(format!("{url}: {blocked}"));
        }
        source = cause.source();
    }

    Error::HttpError(format!("{url}: network error: {err}"))
}
