//! SSRF (Server-Side Request Forgery) protection.
//!
//! Validates that URLs and resolved IP addresses are not pointing to
//! private, internal, or reserved addresses. Favicon targets come straight
//! from user input, so every outbound URL passes through `HostGuard` and
//! every hostname the client connects to is resolved by `PublicResolver`.
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use ipnet::Ipv4Net;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use url::{Host, Url};

/// Additional IPv4 ranges that std's predicates don't cover.
const EXTRA_BLOCKED_V4: &[(Ipv4Addr, u8)] = &[
    // Carrier-grade NAT (RFC 6598)
    (Ipv4Addr::new(100, 64, 0, 0), 10),
    // Benchmarking (RFC 2544)
    (Ipv4Addr::new(198, 18, 0, 0), 15),
    // IETF protocol assignments (RFC 6890)
    (Ipv4Addr::new(192, 0, 0, 0), 24),
];

/// Error type for SSRF validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SsrfError {
    #[error("blocked scheme: {0}")]
    BlockedScheme(String),

    #[error("blocked IP: {0} (private/reserved)")]
    BlockedIp(IpAddr),

    #[error("blocked host: {0}")]
    BlockedHost(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("DNS resolution failed: {0}")]
    DnsError(String),
}

/// Check if an IP address is private, reserved, or otherwise blocked.
///
/// This covers:
/// - Loopback addresses (127.0.0.0/8, ::1)
/// - RFC 1918 private ranges (10/8, 172.16/12, 192.168/16)
/// - Link-local addresses (169.254/16 incl. cloud metadata, fe80::/10)
/// - Carrier-grade NAT (100.64/10) and benchmarking (198.18/15)
/// - Multicast addresses (224/4, ff00::/8)
/// - Unspecified addresses (0.0.0.0/8, ::)
/// - IPv6 unique local (fc00::/7)
/// - IPv4-mapped IPv6 forms of all of the above
pub fn is_private_or_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_multicast()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || v4.octets()[0] == 0
                || EXTRA_BLOCKED_V4
                    .iter()
                    .any(|(addr, prefix)| Ipv4Net::new(*addr, *prefix).is_ok_and(|net| net.contains(&v4)))
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_or_reserved(IpAddr::V4(v4));
            }
            v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Validate that an IP address is not private or reserved.
///
/// Returns an error if the IP is blocked.
pub fn validate_ip(ip: IpAddr) -> Result<(), SsrfError> {
    if is_private_or_reserved(ip) { Err(SsrfError::BlockedIp(ip)) } else { Ok(()) }
}

/// Gate applied to every outbound URL.
#[derive(Debug, Clone, Default)]
pub struct HostGuard {
    allow_private: bool,
    denylist: Vec<String>,
}

impl HostGuard {
    pub fn new<I, S>(allow_private: bool, denylist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let denylist = denylist
            .into_iter()
            .map(|d| d.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self { allow_private, denylist }
    }

    fn is_denied(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.denylist
            .iter()
            .any(|d| host == *d || host.strip_suffix(d.as_str()).is_some_and(|rest| rest.ends_with('.')))
    }

    /// Checks that need no I/O: scheme, denylist, and IP-literal hosts.
    ///
    /// Runs on the first URL and on every redirect hop. Hostnames are left
    /// to `PublicResolver` at connect time.
    pub fn check_static(&self, url: &Url) -> Result<(), SsrfError> {
        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(SsrfError::BlockedScheme(scheme.to_string())),
        }

        match url.host() {
            None => Err(SsrfError::MissingHost),
            Some(Host::Domain(domain)) if self.is_denied(domain) => Err(SsrfError::BlockedHost(domain.to_string())),
            Some(Host::Domain(_)) => Ok(()),
            Some(Host::Ipv4(v4)) if !self.allow_private => validate_ip(IpAddr::V4(v4)),
            Some(Host::Ipv6(v6)) if !self.allow_private => validate_ip(IpAddr::V6(v6)),
            Some(_) => Ok(()),
        }
    }
}

/// Resolve `host` and require every address to be public.
pub async fn resolve_public(host: &str) -> Result<Vec<SocketAddr>, SsrfError> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|e| SsrfError::DnsError(format!("{host}: {e}")))?
        .collect();

    if addrs.is_empty() {
        return Err(SsrfError::DnsError(format!("{host}: no addresses")));
    }

    for addr in &addrs {
        validate_ip(addr.ip())?;
    }

    Ok(addrs)
}

/// DNS resolver for the HTTP client that refuses private answers.
///
/// Installed on the connector, so it applies to the first request, every
/// redirect hop and every reconnect. The connector uses the addresses
/// validated here, leaving no window between check and connect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicResolver;

impl Resolve for PublicResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = name.as_str().to_string();
        Box::pin(async move {
            let addrs = resolve_public(&host).await.map_err(|e| {
                tracing::debug!(host = %host, error = %e, "refused to resolve host");
                Box::new(e) as Box<dyn std::error::Error + Send + Sync>
            })?;
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}
