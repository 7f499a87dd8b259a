//! Favicon hints from `<link>` tags.

use scraper::{Html, Selector};
use url::Url;

/// The `rel` values that name a favicon, in the order they are preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconRel {
    Icon,
    ShortcutIcon,
    AppleTouchIcon,
    AppleTouchIconPrecomposed,
}

impl IconRel {
    /// Preference order when a page declares several icons.
    pub const PRIORITY: [IconRel; 4] =
        [IconRel::Icon, IconRel::ShortcutIcon, IconRel::AppleTouchIcon, IconRel::AppleTouchIconPrecomposed];

    /// Match a `rel` attribute value.
    ///
    /// Matching is ASCII case-insensitive and whitespace-normalized, but
    /// otherwise exact: `rel="icon preload"` is not an icon.
    pub fn parse(rel: &str) -> Option<Self> {
        let normalized = rel
            .split_ascii_whitespace()
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "icon" => Some(IconRel::Icon),
            "shortcut icon" => Some(IconRel::ShortcutIcon),
            "apple-touch-icon" => Some(IconRel::AppleTouchIcon),
            "apple-touch-icon-precomposed" => Some(IconRel::AppleTouchIconPrecomposed),
            _ => None,
        }
    }
}

/// An icon `<link>` with its href resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconLink {
    pub rel: IconRel,
    pub href: Url,
}

/// Base URL for resolving relative hrefs: the document's `<base href>`
/// if present and valid, else the page URL.
fn document_base(document: &Html, page_url: &Url) -> Url {
    let selector = Selector::parse("base[href]").expect("invalid selector");
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Extract icon links in document order.
///
/// Tags with an empty href, an href that does not resolve, or one that
/// resolves to a non-http(s) URL (e.g. `data:`) are skipped.
pub fn extract_icon_links(html: &str, page_url: &Url) -> Vec<IconLink> {
    let document = Html::parse_document(html);
    let base = document_base(&document, page_url);
    let selector = Selector::parse("link[rel][href]").expect("invalid selector");

    document
        .select(&selector)
        .filter_map(|element| {
            let rel = IconRel::parse(element.value().attr("rel")?)?;
            let href = element.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }

            let resolved = base.join(href).ok()?;
            matches!(resolved.scheme(), "http" | "https").then_some(IconLink { rel, href: resolved })
        })
        .collect()
}

/// Pick the preferred favicon URL declared by a page.
pub fn discover_icon(html: &str, page_url: &Url) -> Option<Url> {
    let links = extract_icon_links(html, page_url);

    IconRel::PRIORITY
        .iter()
        .find_map(|rel| links.iter().find(|link| link.rel == *rel))
        .map(|link| link.href.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_parse_rel() {
        assert_eq!(IconRel::parse("icon"), Some(IconRel::Icon));
        assert_eq!(IconRel::parse("Shortcut  Icon"), Some(IconRel::ShortcutIcon));
        assert_eq!(IconRel::parse(" apple-touch-icon "), Some(IconRel::AppleTouchIcon));
        assert_eq!(IconRel::parse("apple-touch-icon-precomposed"), Some(IconRel::AppleTouchIconPrecomposed));
        assert_eq!(IconRel::parse("stylesheet"), None);
        assert_eq!(IconRel::parse("icon preload"), None);
    }

    #[test]
    fn test_discover_shortcut_icon_relative() {
        let html = r#"
            <html>
                <head>
                    <link rel="stylesheet" href="/style.css">
                    <link rel="shortcut icon" href="/assets/icon.png">
                </head>
            </html>
        "#;

        let icon = discover_icon(html, &base()).unwrap();
        assert_eq!(icon.as_str(), "https://example.com/assets/icon.png");
    }

    #[test]
    fn test_discover_priority_over_document_order() {
        let html = r#"
            <html>
                <head>
                    <link rel="apple-touch-icon" href="/touch.png">
                    <link rel="shortcut icon" href="/shortcut.ico">
                    <link rel="icon" href="/icon.svg">
                </head>
            </html>
        "#;

        let icon = discover_icon(html, &base()).unwrap();
        assert_eq!(icon.as_str(), "https://example.com/icon.svg");
    }

    #[test]
    fn test_discover_first_of_same_rel() {
        let html = r#"
            <link rel="icon" href="/first.png" sizes="16x16">
            <link rel="icon" href="/second.png" sizes="32x32">
        "#;

        let icon = discover_icon(html, &base()).unwrap();
        assert_eq!(icon.as_str(), "https://example.com/first.png");
    }

    #[test]
    fn test_discover_absolute_and_protocol_relative() {
        let html = r#"<link rel="icon" href="https://cdn.example.net/fav.ico">"#;
        assert_eq!(discover_icon(html, &base()).unwrap().as_str(), "https://cdn.example.net/fav.ico");

        let html = r#"<link rel="icon" href="//static.example.net/fav.ico">"#;
        assert_eq!(discover_icon(html, &base()).unwrap().as_str(), "https://static.example.net/fav.ico");
    }

    #[test]
    fn test_discover_relative_to_page_path() {
        let html = r#"<link rel="icon" href="img/fav.png">"#;
        let page = Url::parse("https://example.com/blog/").unwrap();
        assert_eq!(discover_icon(html, &page).unwrap().as_str(), "https://example.com/blog/img/fav.png");
    }

    #[test]
    fn test_discover_honors_base_tag() {
        let html = r#"
            <head>
                <base href="https://static.example.com/v2/">
                <link rel="icon" href="fav.ico">
            </head>
        "#;
        assert_eq!(discover_icon(html, &base()).unwrap().as_str(), "https://static.example.com/v2/fav.ico");
    }

    #[test]
    fn test_discover_skips_empty_and_data_hrefs() {
        let html = r#"
            <link rel="icon" href="">
            <link rel="icon" href="data:image/png;base64,iVBORw0KGgo=">
            <link rel="apple-touch-icon" href="/touch.png">
        "#;
        assert_eq!(discover_icon(html, &base()).unwrap().as_str(), "https://example.com/touch.png");
    }

    #[test]
    fn test_discover_none() {
        let html = r#"<html><head><title>No icons</title></head><body></body></html>"#;
        assert!(discover_icon(html, &base()).is_none());
        assert!(discover_icon("", &base()).is_none());
    }

    #[test]
    fn test_extract_icon_links_document_order() {
        let html = r#"
            <link rel="apple-touch-icon-precomposed" href="/pre.png">
            <link rel="ICON" href="/a.ico">
        "#;
        let links = extract_icon_links(html, &base());
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].rel, IconRel::AppleTouchIconPrecomposed);
        assert_eq!(links[1].rel, IconRel::Icon);
        assert_eq!(links[1].href.as_str(), "https://example.com/a.ico");
    }
}
