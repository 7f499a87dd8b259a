//! Target URL parsing and storage-domain derivation.
//!
//! The favicon cache is keyed by the caller's exact URL string, so parsing
//! here never rewrites the input used as a key. Only the derived storage
//! domain is normalized.

use url::Url;

/// Error type for target URL failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse a caller-supplied target URL.
///
/// The URL must be absolute, use `http` or `https`, and have a host.
pub fn parse_target(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(UrlError::MissingHost),
    }
}

/// Hostname of `url` with one leading `www.` removed.
///
/// `https://www.example.com/page` and `https://example.com/other` share
/// the storage domain `example.com`.
pub fn storage_domain(url: &Url) -> Result<String, UrlError> {
    let host = url.host_str().ok_or(UrlError::MissingHost)?;
    let host = host.to_ascii_lowercase();
    let domain = host.strip_prefix("www.").unwrap_or(&host);
    if domain.is_empty() {
        return Err(UrlError::MissingHost);
    }
    Ok(domain.to_string())
}

/// Blob key under which a domain's favicon is stored.
pub fn favicon_blob_key(domain: &str) -> String {
    format!("favicons/{domain}.ico")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_basic() {
        let url = parse_target("https://example.com/page?x=1").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/page");
    }

    #[test]
    fn test_parse_target_empty() {
        assert!(matches!(parse_target(""), Err(UrlError::Empty)));
        assert!(matches!(parse_target("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_parse_target_requires_absolute() {
        assert!(matches!(parse_target("example.com"), Err(UrlError::InvalidUrl(_))));
        assert!(matches!(parse_target("/favicon.ico"), Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_target_unsupported_scheme() {
        assert!(matches!(parse_target("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(parse_target("mailto:ops@example.com"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_storage_domain_strips_www() {
        let with_www = parse_target("https://www.example.com/page").unwrap();
        let without = parse_target("https://example.com/page").unwrap();
        assert_eq!(storage_domain(&with_www).unwrap(), "example.com");
        assert_eq!(storage_domain(&without).unwrap(), "example.com");
    }

    #[test]
    fn test_storage_domain_only_leading_www() {
        let url = parse_target("https://www.www.example.com").unwrap();
        assert_eq!(storage_domain(&url).unwrap(), "www.example.com");

        let url = parse_target("https://wwwexample.com").unwrap();
        assert_eq!(storage_domain(&url).unwrap(), "wwwexample.com");
    }

    #[test]
    fn test_storage_domain_lowercase_and_port() {
        let url = parse_target("http://WWW.Example.COM:8080/x").unwrap();
        assert_eq!(storage_domain(&url).unwrap(), "example.com");
    }

    #[test]
    fn test_favicon_blob_key() {
        assert_eq!(favicon_blob_key("example.com"), "favicons/example.com.ico");
    }
}
