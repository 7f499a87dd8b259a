//! Client code for navhub.
//!
//! This crate provides the guarded outbound HTTP client, favicon link-tag
//! extraction, and the cache-first favicon resolver used by the server.

pub mod extract;
pub mod favicon;
pub mod fetch;

pub use extract::{IconLink, IconRel, discover_icon};
pub use favicon::{FaviconResolver, IconSource, ResolvedFavicon, ResolverConfig};
pub use fetch::{FetchClient, FetchConfig, FetchResponse, IconFetcher, RequestOptions};
