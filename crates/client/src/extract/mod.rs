//! HTML extraction for favicon discovery.
//!
//! Parses a page with `scraper` and reports the icons it declares through
//! `<link rel=...>` tags, resolved against the page (or `<base href>`) URL.

pub mod icons;

pub use icons::{IconLink, IconRel, discover_icon, extract_icon_links};
