//! Well-known favicon paths.

use url::Url;

use super::ResolverConfig;
use crate::fetch::{IconFetcher, RequestOptions};

/// Candidate URLs for `domain`, in probe order.
pub fn well_known_candidates(domain: &str) -> Vec<Url> {
    [
        format!("https://{domain}/favicon.ico"),
        format!("https://{domain}/favicon.png"),
        format!("https://www.{domain}/favicon.ico"),
    ]
    .iter()
    .filter_map(|raw| Url::parse(raw).ok())
    .collect()
}

/// First candidate answering 2xx with more than `min_icon_bytes` of body.
///
/// Failures are logged and skipped.
pub async fn probe_well_known(fetcher: &dyn IconFetcher, domain: &str, config: &ResolverConfig) -> Option<Url> {
    let options = RequestOptions::new(config.probe_timeout);

    for candidate in well_known_candidates(domain) {
        match fetcher.get(&candidate, &options).await {
            Ok(response) if response.status.is_success() && response.bytes.len() > config.min_icon_bytes => {
                tracing::debug!(candidate = %candidate, fetch_ms = response.fetch_ms, "favicon probe accepted");
                return Some(candidate);
            }
            Ok(response) => {
                tracing::debug!(
                    candidate = %candidate,
                    status = response.status.as_u16(),
                    bytes = response.bytes.len(),
                    fetch_ms = response.fetch_ms,
                    "favicon probe rejected"
                );
            }
            Err(e) if e.is_transient_fetch() => {
                tracing::debug!(candidate = %candidate, error = %e, "favicon probe failed");
            }
            Err(e) => {
                tracing::warn!(candidate = %candidate, error = %e, "favicon probe failed unexpectedly");
            }
        }
    }

    None
}
