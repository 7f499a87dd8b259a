//! Favicon discovery from a site's root page.

use url::Url;

use super::ResolverConfig;
use crate::extract::discover_icon;
use crate::fetch::{ACCEPT_HTML, IconFetcher, RequestOptions};

/// Fetch `https://{domain}` and return the icon its markup declares.
///
/// Hrefs resolve against the page's final URL after redirects. A failed
/// fetch, a non-success status or a page without icon tags yields `None`.
pub async fn discover_from_page(fetcher: &dyn IconFetcher, domain: &str, config: &ResolverConfig) -> Option<Url> {
    let page_url = Url::parse(&format!("https://{domain}")).ok()?;
    let options = RequestOptions::new(config.page_timeout)
        .with_user_agent(config.browser_user_agent.clone())
        .with_accept(ACCEPT_HTML);

    let response = match fetcher.get(&page_url, &options).await {
        Ok(response) => response,
        Err(e) if e.is_transient_fetch() => {
            tracing::debug!(page = %page_url, error = %e, "page fetch failed");
            return None;
        }
        Err(e) => {
            tracing::warn!(page = %page_url, error = %e, "page fetch failed unexpectedly");
            return None;
        }
    };

    if !response.status.is_success() {
        tracing::debug!(page = %page_url, status = response.status.as_u16(), "page fetch rejected");
        return None;
    }

    let html = String::from_utf8_lossy(&response.bytes);
    let icon = discover_icon(&html, &response.final_url);
    if icon.is_none() {
        tracing::debug!(page = %response.final_url, "no icon link tags");
    }
    icon
}
